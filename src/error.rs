// src/error.rs
use std::time::Duration;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Shown to the user in place of an answer whenever a flow fails.
pub const FALLBACK_MESSAGE: &str = "Sorry, I am unable to process your request at the moment.";

/// Failures talking to the generative model. These are transient and may be retried.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request to model provider failed: {0}")]
    Transport(String),
    #[error("model provider returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("model provider did not answer within {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("request to translation provider failed: {0}")]
    Transport(String),
    #[error("translation provider returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("translation provider returned an unexpected body: {0}")]
    Malformed(String),
    #[error("translation provider did not answer within {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("output of {prompt} failed schema validation: {reason}")]
    SchemaValidation { prompt: &'static str, reason: String },
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Translation(#[from] TranslationError),
}

impl FlowError {
    pub fn kind(&self) -> &'static str {
        match self {
            FlowError::InvalidInput(_) => "invalid_input",
            FlowError::SchemaValidation { .. } => "schema_validation",
            FlowError::Provider(_) => "provider_error",
            FlowError::Translation(_) => "translation_error",
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Flow(#[from] FlowError),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Flow(FlowError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            AppError::Flow(FlowError::Provider(ProviderError::Timeout(_))) => {
                StatusCode::GATEWAY_TIMEOUT
            }
            AppError::Flow(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "bad_request",
            AppError::NotFound(_) => "not_found",
            AppError::Flow(e) => e.kind(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(kind = self.kind(), "request failed: {}", self);
        } else {
            tracing::debug!(kind = self.kind(), "request rejected: {}", self);
        }

        let body = Json(json!({
            "error": self.kind(),
            "message": self.to_string(),
            "fallback": FALLBACK_MESSAGE,
        }));
        (status, body).into_response()
    }
}
