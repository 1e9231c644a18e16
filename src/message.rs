// src/message.rs
use reqwest::Url;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::error::FlowError;
use crate::language::Language;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub question: String,
    pub language: String,
    pub username: String,
}

impl ChatRequest {
    /// Checks the required fields and resolves the language code.
    pub fn validate(&self) -> Result<Language, FlowError> {
        require("question", &self.question)?;
        require("username", &self.username)?;
        require("language", &self.language)?;
        Language::from_code(&self.language).ok_or_else(|| {
            FlowError::InvalidInput(format!("unsupported language '{}'", self.language))
        })
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ChatResponse {
    /// The answer from the AI chatbot.
    pub answer: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TipsRequest {
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_context: Option<String>,
}

impl TipsRequest {
    pub fn validate(&self) -> Result<(), FlowError> {
        require("topic", &self.topic)
    }

    /// The user context, if present and not blank.
    pub fn context(&self) -> Option<&str> {
        self.user_context
            .as_deref()
            .filter(|c| !c.trim().is_empty())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct TipsResponse {
    /// A list of personalized financial tips related to the topic.
    pub tips: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRequest {
    pub article_url: String,
}

impl SummaryRequest {
    pub fn validate(&self) -> Result<Url, FlowError> {
        require("articleUrl", &self.article_url)?;
        let url = Url::parse(self.article_url.trim())
            .map_err(|e| FlowError::InvalidInput(format!("articleUrl is not a valid URL: {e}")))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(FlowError::InvalidInput(format!(
                "articleUrl must use http or https, got '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SummaryResponse {
    /// A summary of the key points in the financial article.
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TranslationPair {
    pub from: String,
    pub to: String,
}

impl TranslationPair {
    pub fn new(from: Language, to: Language) -> Self {
        Self { from: from.code().to_string(), to: to.code().to_string() }
    }

    pub fn is_identity(&self) -> bool {
        self.from.eq_ignore_ascii_case(&self.to)
    }
}

/// A structured record the model must produce. Parsing is strict; `check`
/// covers what the JSON shape alone cannot express.
pub trait ModelOutput: DeserializeOwned + JsonSchema + Send {
    fn check(&self) -> Result<(), String>;
}

impl ModelOutput for ChatResponse {
    fn check(&self) -> Result<(), String> {
        if self.answer.trim().is_empty() {
            return Err("answer is empty".to_string());
        }
        Ok(())
    }
}

impl ModelOutput for TipsResponse {
    fn check(&self) -> Result<(), String> {
        if self.tips.is_empty() {
            return Err("tips list is empty".to_string());
        }
        if let Some(i) = self.tips.iter().position(|t| t.trim().is_empty()) {
            return Err(format!("tip {i} is empty"));
        }
        Ok(())
    }
}

impl ModelOutput for SummaryResponse {
    fn check(&self) -> Result<(), String> {
        if self.summary.trim().is_empty() {
            return Err("summary is empty".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub language: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LanguageUpdate {
    pub language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub session_id: String,
    pub name: String,
    pub language: String,
}

fn require(field: &str, value: &str) -> Result<(), FlowError> {
    if value.trim().is_empty() {
        return Err(FlowError::InvalidInput(format!("{field} is required")));
    }
    Ok(())
}
