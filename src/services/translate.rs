// src/services/translate.rs
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tokio::time::timeout;

use crate::error::TranslationError;
use crate::message::TranslationPair;

pub const GOOGLE_TRANSLATE_ENDPOINT: &str =
    "https://translation.googleapis.com/language/translate/v2";

#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, pair: &TranslationPair) -> Result<String, TranslationError>;
}

/// Stand-in provider: tags the text with the target language.
#[derive(Debug, Default, Clone)]
pub struct EchoTranslator;

#[async_trait]
impl Translator for EchoTranslator {
    async fn translate(&self, text: &str, pair: &TranslationPair) -> Result<String, TranslationError> {
        if pair.is_identity() {
            return Ok(text.to_string());
        }
        Ok(format!("Translated to {}: {}", pair.to, text))
    }
}

/// Google Cloud Translation (v2 REST API).
pub struct GoogleTranslator {
    client: Client,
    endpoint: String,
    api_key: String,
    call_timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct TranslateEnvelope {
    data: TranslateData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslateData {
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Translation {
    translated_text: String,
}

impl GoogleTranslator {
    pub fn new(endpoint: String, api_key: String, call_timeout: Duration) -> Self {
        Self { client: Client::new(), endpoint, api_key, call_timeout }
    }

    async fn request(&self, text: &str, pair: &TranslationPair) -> Result<String, TranslationError> {
        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({
                "q": text,
                "source": pair.from,
                "target": pair.to,
                "format": "text",
            }))
            .send()
            .await
            .map_err(|e| TranslationError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TranslationError::Status { status: status.as_u16(), body });
        }

        let body = response
            .text()
            .await
            .map_err(|e| TranslationError::Transport(e.to_string()))?;
        extract_translation(&body)
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(&self, text: &str, pair: &TranslationPair) -> Result<String, TranslationError> {
        if pair.is_identity() {
            return Ok(text.to_string());
        }
        tracing::debug!(from = %pair.from, to = %pair.to, "translating {} bytes", text.len());
        timeout(self.call_timeout, self.request(text, pair))
            .await
            .map_err(|_| TranslationError::Timeout(self.call_timeout))?
    }
}

fn extract_translation(body: &str) -> Result<String, TranslationError> {
    let envelope: TranslateEnvelope =
        serde_json::from_str(body).map_err(|e| TranslationError::Malformed(format!("{e}: {body}")))?;
    envelope
        .data
        .translations
        .into_iter()
        .next()
        .map(|t| t.translated_text)
        .ok_or_else(|| TranslationError::Malformed("no translations in response".to_string()))
}
