#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use finlit_backend::error::{ProviderError, TranslationError};
use finlit_backend::message::TranslationPair;
use finlit_backend::retry::RetryPolicy;
use finlit_backend::services::flows::{Flows, LanguageStrategy};
use finlit_backend::services::model::{
    CompletionRequest, CompletionResponse, ModelInvoker, ModelTransport,
};
use finlit_backend::services::prompt::Prompts;
use finlit_backend::services::translate::Translator;

/// Replies with the same content on every call and records each request.
pub struct FixedModel {
    reply: Result<String, u16>,
    pub requests: Mutex<Vec<CompletionRequest>>,
}

impl FixedModel {
    pub fn replying(content: &str) -> Arc<Self> {
        Arc::new(Self { reply: Ok(content.to_string()), requests: Mutex::new(Vec::new()) })
    }

    /// Every call fails with the given HTTP status.
    pub fn failing(status: u16) -> Arc<Self> {
        Arc::new(Self { reply: Err(status), requests: Mutex::new(Vec::new()) })
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// The user prompt of the last request.
    pub fn last_prompt(&self) -> String {
        let requests = self.requests.lock().unwrap();
        let last = requests.last().expect("model was never called");
        last.messages.last().unwrap().content.clone()
    }
}

#[async_trait]
impl ModelTransport for FixedModel {
    async fn complete(&self, req: &CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        self.requests.lock().unwrap().push(req.clone());
        match &self.reply {
            Ok(content) => Ok(CompletionResponse::with_content(content.clone())),
            Err(status) => Err(ProviderError::Status { status: *status, body: "provider down".into() }),
        }
    }
}

/// Records every translation request; optionally fails.
#[derive(Default)]
pub struct CountingTranslator {
    pub calls: Mutex<Vec<(String, TranslationPair)>>,
    pub fail: bool,
}

impl CountingTranslator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self { fail: true, ..Self::default() })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Translator for CountingTranslator {
    async fn translate(&self, text: &str, pair: &TranslationPair) -> Result<String, TranslationError> {
        self.calls.lock().unwrap().push((text.to_string(), pair.clone()));
        if self.fail {
            return Err(TranslationError::Status { status: 403, body: "quota exceeded".into() });
        }
        Ok(format!("[{}] {}", pair.to, text))
    }
}

pub fn flows(
    model: Arc<FixedModel>,
    translator: Arc<CountingTranslator>,
    strategy: LanguageStrategy,
) -> Flows {
    let invoker = ModelInvoker::new(
        model,
        "fake-model".to_string(),
        0.0,
        Duration::from_secs(1),
        RetryPolicy { max_attempts: 2, initial_delay: Duration::ZERO, max_delay: Duration::ZERO },
    );
    Flows::new(Prompts::compile().unwrap(), invoker, translator, strategy)
}
