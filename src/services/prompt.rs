// src/services/prompt.rs
//! Prompt templates and the renderer that fills them.
//!
//! Templates use `{{field}}` placeholders and are compiled once at startup
//! against the fields their context record declares, so a typo in a template
//! stops the server from booting instead of leaking braces into a prompt.
//! Rendering is a single pass: substituted values are never re-scanned.

use std::marker::PhantomData;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("template '{template}' references undeclared field '{field}'")]
    UnknownField { template: &'static str, field: String },
    #[error("template '{template}' has an unterminated placeholder at byte {offset}")]
    Unterminated { template: &'static str, offset: usize },
}

/// The placeholder names a family of templates may use.
pub trait PromptFields {
    const FIELDS: &'static [&'static str];
}

/// A typed record whose fields can be substituted into a template.
pub trait PromptContext {
    type Fields: PromptFields;

    /// Value of `Self::Fields::FIELDS[index]`.
    fn value(&self, index: usize) -> &str;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Field(usize),
}

#[derive(Debug, Clone)]
pub struct PromptTemplate<F> {
    segments: Vec<Segment>,
    _fields: PhantomData<F>,
}

impl<F: PromptFields> PromptTemplate<F> {
    pub fn compile(name: &'static str, text: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut rest = text;
        let mut offset = 0;

        while let Some(open) = rest.find("{{") {
            if open > 0 {
                segments.push(Segment::Text(rest[..open].to_string()));
            }
            let after_open = &rest[open + 2..];
            let close = after_open.find("}}").ok_or(TemplateError::Unterminated {
                template: name,
                offset: offset + open,
            })?;
            let field = after_open[..close].trim();
            let index = F::FIELDS
                .iter()
                .position(|f| *f == field)
                .ok_or_else(|| TemplateError::UnknownField {
                    template: name,
                    field: field.to_string(),
                })?;
            segments.push(Segment::Field(index));

            let consumed = open + 2 + close + 2;
            offset += consumed;
            rest = &rest[consumed..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Text(rest.to_string()));
        }

        Ok(Self { segments, _fields: PhantomData })
    }

    pub fn render<C: PromptContext<Fields = F>>(&self, ctx: &C) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Field(index) => out.push_str(ctx.value(*index)),
            }
        }
        out
    }
}

pub const CHAT_PROMPT_NAME: &str = "financialLiteracyChatbotPrompt";
pub const TIPS_PROMPT_NAME: &str = "generateFinancialTipsPrompt";
pub const SUMMARY_PROMPT_NAME: &str = "summarizeFinancialArticlePrompt";

const CHAT_TEMPLATE: &str = "You are a multilingual financial literacy assistant named MoneyBot. Respond in simple and understandable language based on the user's selected language: Tamil, Telugu, Malayalam, Kannada, Hindi, or English.

Always use the user's name ({{username}}) while greeting or personalizing messages.

Your main goal is to help low-income users understand finance basics such as investment, SIP, insurance, stock market, UPI, budgeting, savings, secure digital transactions, and fraud prevention.

If the user asks who created you, or who built this chatbot, or who are the developers, respond with:
- Project by: Team Raptors - Mathan Kumar
- Institution: Takshashila

If a user greets you, reply with a warm, friendly tone using the selected language. If they ask random or off-topic questions, gently bring them back to financial topics.

Make sure to keep your answers short, clear, and supportive. Always encourage the user to ask more questions related to finance.

Example Questions You Might Get:
- What is investment?
- Define insurance
- What is SIP?
- How to invest in stock market?
- What is UPI?
- Who built this chatbot?
- Who are the developers?
- What is your name?
- Where are you from?

If the user asks about the app, say: 'This app is developed by Team Raptors from Takshashila College to educate and empower users like you in financial literacy.'

Reply only in the selected language: {{language}}.
Question: {{question}}";

const TIPS_HEAD_TEMPLATE: &str = "You are a financial advisor. Please provide personalized financial tips on the following topic:

Topic: {{topic}}

";

const TIPS_CONTEXT_TEMPLATE: &str = "User Context: {{userContext}}

";

// Ends with "Tips:" so the model continues with the list.
const TIPS_TAIL: &str = "Tips:\n";

const SUMMARY_TEMPLATE: &str = "You are a financial expert. Please summarize the key points of the financial article at the following URL in a simple, easy-to-understand way.

Article URL: {{articleUrl}}";

pub struct ChatPrompt<'a> {
    pub username: &'a str,
    /// Display name of the language the model should reply in.
    pub language: &'a str,
    pub question: &'a str,
}

pub struct ChatFields;

impl PromptFields for ChatFields {
    const FIELDS: &'static [&'static str] = &["username", "language", "question"];
}

impl PromptContext for ChatPrompt<'_> {
    type Fields = ChatFields;

    fn value(&self, index: usize) -> &str {
        match index {
            0 => self.username,
            1 => self.language,
            _ => self.question,
        }
    }
}

pub struct TipsPrompt<'a> {
    pub topic: &'a str,
    pub user_context: Option<&'a str>,
}

pub struct TipsFields;

impl PromptFields for TipsFields {
    const FIELDS: &'static [&'static str] = &["topic", "userContext"];
}

impl PromptContext for TipsPrompt<'_> {
    type Fields = TipsFields;

    fn value(&self, index: usize) -> &str {
        match index {
            0 => self.topic,
            _ => self.user_context.unwrap_or_default(),
        }
    }
}

pub struct SummaryPrompt<'a> {
    pub article_url: &'a str,
}

pub struct SummaryFields;

impl PromptFields for SummaryFields {
    const FIELDS: &'static [&'static str] = &["articleUrl"];
}

impl PromptContext for SummaryPrompt<'_> {
    type Fields = SummaryFields;

    fn value(&self, _index: usize) -> &str {
        self.article_url
    }
}

/// All compiled prompt templates, built once at startup.
pub struct Prompts {
    chat: PromptTemplate<ChatFields>,
    tips_head: PromptTemplate<TipsFields>,
    tips_context: PromptTemplate<TipsFields>,
    summary: PromptTemplate<SummaryFields>,
}

impl Prompts {
    pub fn compile() -> Result<Self, TemplateError> {
        Ok(Self {
            chat: PromptTemplate::compile(CHAT_PROMPT_NAME, CHAT_TEMPLATE)?,
            tips_head: PromptTemplate::compile(TIPS_PROMPT_NAME, TIPS_HEAD_TEMPLATE)?,
            tips_context: PromptTemplate::compile(TIPS_PROMPT_NAME, TIPS_CONTEXT_TEMPLATE)?,
            summary: PromptTemplate::compile(SUMMARY_PROMPT_NAME, SUMMARY_TEMPLATE)?,
        })
    }

    pub fn chat(&self, ctx: &ChatPrompt<'_>) -> String {
        self.chat.render(ctx)
    }

    pub fn tips(&self, ctx: &TipsPrompt<'_>) -> String {
        let mut prompt = self.tips_head.render(ctx);
        if ctx.user_context.is_some() {
            prompt.push_str(&self.tips_context.render(ctx));
        }
        prompt.push_str(TIPS_TAIL);
        prompt
    }

    pub fn summary(&self, ctx: &SummaryPrompt<'_>) -> String {
        self.summary.render(ctx)
    }
}
