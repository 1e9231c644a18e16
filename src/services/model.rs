// src/services/model.rs
//! Generative model invocation: an OpenAI-compatible chat completions transport
//! and the invoker that turns a rendered prompt into a validated record.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::time::{sleep, timeout};

use crate::error::{FlowError, ProviderError};
use crate::message::ModelOutput;
use crate::retry::RetryPolicy;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CompletionResponse {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Choice {
    pub message: ChatMessage,
}

impl CompletionResponse {
    /// Convenience for fakes: a response with a single assistant message.
    pub fn with_content(content: impl Into<String>) -> Self {
        Self {
            choices: vec![Choice {
                message: ChatMessage { role: "assistant".to_string(), content: content.into() },
            }],
        }
    }
}

#[async_trait]
pub trait ModelTransport: Send + Sync {
    async fn complete(&self, req: &CompletionRequest) -> Result<CompletionResponse, ProviderError>;
}

pub struct OpenAiTransport {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl OpenAiTransport {
    pub fn new(api_base: &str, api_key: String, request_timeout: Duration) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", api_base.trim_end_matches('/')),
            api_key,
        })
    }
}

#[async_trait]
impl ModelTransport for OpenAiTransport {
    async fn complete(&self, req: &CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(req)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ProviderError::Status { status: status.as_u16(), body });
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::Transport(format!("failed to decode completion: {e}")))
    }
}

/// Sends rendered prompts to the model and validates what comes back.
pub struct ModelInvoker {
    transport: Arc<dyn ModelTransport>,
    model: String,
    temperature: f32,
    call_timeout: Duration,
    retry: RetryPolicy,
}

impl ModelInvoker {
    pub fn new(
        transport: Arc<dyn ModelTransport>,
        model: String,
        temperature: f32,
        call_timeout: Duration,
        retry: RetryPolicy,
    ) -> Self {
        Self { transport, model, temperature, call_timeout, retry }
    }

    /// Runs `prompt` and parses the reply into `O`.
    ///
    /// Provider failures are retried per the retry policy; a reply that does not
    /// match `O` fails immediately with `SchemaValidation`.
    pub async fn generate<O: ModelOutput>(
        &self,
        prompt_name: &'static str,
        prompt: &str,
    ) -> Result<O, FlowError> {
        let request = CompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(output_instructions::<O>()),
                ChatMessage::user(prompt),
            ],
            temperature: self.temperature,
            response_format: Some(serde_json::json!({"type": "json_object"})),
        };
        tracing::debug!(prompt = prompt_name, "prompt text:\n{}", prompt);

        let response = self.call_with_retry(prompt_name, &request).await?;
        let content = response
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| FlowError::SchemaValidation {
                prompt: prompt_name,
                reason: "model returned no choices".to_string(),
            })?;

        parse_output(prompt_name, content)
    }

    async fn call_with_retry(
        &self,
        prompt_name: &'static str,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            let outcome = match timeout(self.call_timeout, self.transport.complete(request)).await {
                Ok(result) => result,
                Err(_) => Err(ProviderError::Timeout(self.call_timeout)),
            };

            match outcome {
                Ok(response) => return Ok(response),
                Err(e) if attempt < max_attempts => {
                    let delay = self.retry.delay_for(attempt);
                    tracing::warn!(
                        prompt = prompt_name,
                        attempt,
                        ?delay,
                        "model call failed, retrying: {e}"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(prompt = prompt_name, attempt, "model call failed: {e}");
                    return Err(e);
                }
            }
        }
    }
}

fn output_instructions<O: ModelOutput>() -> String {
    let schema = schemars::schema_for!(O);
    format!(
        "Output format: reply with a single JSON object that conforms to the following JSON schema. \
         Do not add any other fields or any text outside the JSON object.\n{}",
        schema.as_value()
    )
}

/// Parses raw model output strictly into `O`. A surrounding markdown code
/// fence is tolerated; nothing else is.
pub fn parse_output<O: ModelOutput>(prompt_name: &'static str, raw: &str) -> Result<O, FlowError> {
    let body = strip_code_fence(raw);
    let output: O = serde_json::from_str(body).map_err(|e| FlowError::SchemaValidation {
        prompt: prompt_name,
        reason: format!("{e}; raw output: {raw}"),
    })?;
    output
        .check()
        .map_err(|reason| FlowError::SchemaValidation { prompt: prompt_name, reason })?;
    Ok(output)
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{ChatResponse, TipsResponse};
    use std::sync::Mutex;

    // Scripted transport: pops one outcome per call and records requests.
    struct ScriptedTransport {
        outcomes: Mutex<Vec<Result<CompletionResponse, ProviderError>>>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedTransport {
        fn new(mut outcomes: Vec<Result<CompletionResponse, ProviderError>>) -> Self {
            outcomes.reverse();
            Self { outcomes: Mutex::new(outcomes), requests: Mutex::new(Vec::new()) }
        }

        fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ModelTransport for ScriptedTransport {
        async fn complete(&self, req: &CompletionRequest) -> Result<CompletionResponse, ProviderError> {
            self.requests.lock().unwrap().push(req.clone());
            self.outcomes
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(ProviderError::Transport("script exhausted".into())))
        }
    }

    struct StalledTransport;

    #[async_trait]
    impl ModelTransport for StalledTransport {
        async fn complete(&self, _req: &CompletionRequest) -> Result<CompletionResponse, ProviderError> {
            sleep(Duration::from_secs(5)).await;
            Ok(CompletionResponse::with_content(r#"{"answer": "late"}"#))
        }
    }

    fn invoker(transport: Arc<dyn ModelTransport>, attempts: u32) -> ModelInvoker {
        ModelInvoker::new(
            transport,
            "test-model".to_string(),
            0.0,
            Duration::from_millis(50),
            RetryPolicy {
                max_attempts: attempts,
                initial_delay: Duration::ZERO,
                max_delay: Duration::ZERO,
            },
        )
    }

    #[tokio::test]
    async fn generate_parses_structured_output() {
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(CompletionResponse::with_content(
            r#"{"answer": "SIP is a systematic investment plan."}"#,
        ))]));
        let out: ChatResponse = invoker(transport.clone(), 3)
            .generate("chat", "What is SIP?")
            .await
            .unwrap();
        assert_eq!(out.answer, "SIP is a systematic investment plan.");

        let requests = transport.requests.lock().unwrap();
        let req = &requests[0];
        assert_eq!(req.model, "test-model");
        assert_eq!(req.messages[0].role, "system");
        assert!(req.messages[0].content.contains("\"answer\""));
        assert_eq!(req.messages[1], ChatMessage::user("What is SIP?"));
    }

    #[tokio::test]
    async fn generate_accepts_fenced_json() {
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(CompletionResponse::with_content(
            "```json\n{\"tips\": [\"Pay yourself first\", \"Track spending\"]}\n```",
        ))]));
        let out: TipsResponse = invoker(transport, 1).generate("tips", "saving").await.unwrap();
        assert_eq!(out.tips.len(), 2);
    }

    #[tokio::test]
    async fn schema_mismatch_is_not_retried() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            Ok(CompletionResponse::with_content(r#"{"reply": "wrong field"}"#)),
            Ok(CompletionResponse::with_content(r#"{"answer": "never reached"}"#)),
        ]));
        let err = invoker(transport.clone(), 3)
            .generate::<ChatResponse>("chat", "q")
            .await
            .unwrap_err();
        assert!(matches!(err, FlowError::SchemaValidation { prompt: "chat", .. }));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn prose_output_is_a_schema_failure() {
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(CompletionResponse::with_content(
            "Sure! SIP means systematic investment plan.",
        ))]));
        let err = invoker(transport, 1)
            .generate::<ChatResponse>("chat", "q")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "schema_validation");
    }

    #[tokio::test]
    async fn empty_choices_is_a_schema_failure() {
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(CompletionResponse { choices: vec![] })]));
        let err = invoker(transport, 1)
            .generate::<ChatResponse>("chat", "q")
            .await
            .unwrap_err();
        assert!(matches!(err, FlowError::SchemaValidation { .. }));
    }

    #[tokio::test]
    async fn provider_errors_are_retried_until_success() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            Err(ProviderError::Status { status: 503, body: "busy".into() }),
            Err(ProviderError::Transport("connection reset".into())),
            Ok(CompletionResponse::with_content(r#"{"answer": "ok"}"#)),
        ]));
        let out: ChatResponse = invoker(transport.clone(), 3).generate("chat", "q").await.unwrap();
        assert_eq!(out.answer, "ok");
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test]
    async fn provider_errors_stop_at_the_attempt_bound() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            Err(ProviderError::Status { status: 500, body: "a".into() }),
            Err(ProviderError::Status { status: 500, body: "b".into() }),
            Ok(CompletionResponse::with_content(r#"{"answer": "too late"}"#)),
        ]));
        let err = invoker(transport.clone(), 2)
            .generate::<ChatResponse>("chat", "q")
            .await
            .unwrap_err();
        assert!(matches!(err, FlowError::Provider(ProviderError::Status { status: 500, .. })));
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn stalled_provider_times_out() {
        let err = invoker(Arc::new(StalledTransport), 1)
            .generate::<ChatResponse>("chat", "q")
            .await
            .unwrap_err();
        assert!(matches!(err, FlowError::Provider(ProviderError::Timeout(_))));
    }

    #[test]
    fn code_fence_is_stripped() {
        assert_eq!(strip_code_fence("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("  {}  "), "{}");
    }
}
