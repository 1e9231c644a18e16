// src/services/flows.rs
use std::str::FromStr;
use std::sync::Arc;

use crate::error::FlowError;
use crate::language::DEFAULT_LANGUAGE;
use crate::message::{
    ChatRequest, ChatResponse, SummaryRequest, SummaryResponse, TipsRequest, TipsResponse,
    TranslationPair,
};
use crate::services::model::ModelInvoker;
use crate::services::prompt::{
    CHAT_PROMPT_NAME, ChatPrompt, Prompts, SUMMARY_PROMPT_NAME, SummaryPrompt, TIPS_PROMPT_NAME,
    TipsPrompt,
};
use crate::services::translate::Translator;

/// How the chatbot gets an answer into the user's language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LanguageStrategy {
    /// The model answers in English; non-English answers are translated once.
    #[default]
    Translate,
    /// The model is asked to answer in the user's language directly.
    Native,
}

impl FromStr for LanguageStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "translate" => Ok(LanguageStrategy::Translate),
            "native" => Ok(LanguageStrategy::Native),
            other => Err(format!("unknown language strategy '{other}'")),
        }
    }
}

/// The user-facing flows. Cheap to share behind an `Arc`; holds no per-request state.
pub struct Flows {
    prompts: Prompts,
    model: ModelInvoker,
    translator: Arc<dyn Translator>,
    strategy: LanguageStrategy,
}

impl Flows {
    pub fn new(
        prompts: Prompts,
        model: ModelInvoker,
        translator: Arc<dyn Translator>,
        strategy: LanguageStrategy,
    ) -> Self {
        Self { prompts, model, translator, strategy }
    }

    pub async fn financial_literacy_chatbot(&self, req: &ChatRequest) -> Result<ChatResponse, FlowError> {
        let language = req.validate()?;
        tracing::info!(flow = "chatbot", language = language.code(), "handling question");

        let reply_language = match self.strategy {
            LanguageStrategy::Translate => DEFAULT_LANGUAGE,
            LanguageStrategy::Native => language,
        };
        let prompt = self.prompts.chat(&ChatPrompt {
            username: req.username.trim(),
            language: reply_language.name(),
            question: &req.question,
        });

        let output: ChatResponse = self.model.generate(CHAT_PROMPT_NAME, &prompt).await?;

        if reply_language == language {
            return Ok(output);
        }

        let pair = TranslationPair::new(reply_language, language);
        let answer = self
            .translator
            .translate(&output.answer, &pair)
            .await
            .inspect_err(|e| tracing::error!(flow = "chatbot", to = %pair.to, "translation failed: {e}"))?;
        tracing::info!(flow = "chatbot", to = %pair.to, "answer translated");
        Ok(ChatResponse { answer })
    }

    pub async fn generate_financial_tips(&self, req: &TipsRequest) -> Result<TipsResponse, FlowError> {
        req.validate()?;
        tracing::info!(flow = "tips", topic = %req.topic, "generating tips");

        let prompt = self.prompts.tips(&TipsPrompt {
            topic: req.topic.trim(),
            user_context: req.context(),
        });
        let output: TipsResponse = self.model.generate(TIPS_PROMPT_NAME, &prompt).await?;
        tracing::info!(flow = "tips", count = output.tips.len(), "tips generated");
        Ok(output)
    }

    pub async fn summarize_financial_article(
        &self,
        req: &SummaryRequest,
    ) -> Result<SummaryResponse, FlowError> {
        req.validate()?;
        let article_url = req.article_url.trim();
        tracing::info!(flow = "summary", url = article_url, "summarizing article");

        let prompt = self.prompts.summary(&SummaryPrompt { article_url });
        self.model.generate(SUMMARY_PROMPT_NAME, &prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_parses_case_insensitively() {
        assert_eq!("Translate".parse::<LanguageStrategy>(), Ok(LanguageStrategy::Translate));
        assert_eq!(" native ".parse::<LanguageStrategy>(), Ok(LanguageStrategy::Native));
        assert!("both".parse::<LanguageStrategy>().is_err());
    }
}
