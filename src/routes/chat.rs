use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};

use crate::{
    error::{AppError, FlowError},
    language::Language,
    message::{ChatRequest, ChatResponse, SummaryRequest, SummaryResponse, TipsRequest, TipsResponse},
    services::metrics_manager::{MetricsData, MetricsManager},
    state::SharedState,
};

pub async fn chat_handler(
    State(state): State<SharedState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let Json(req) = payload.map_err(invalid_body)?;

    state.metrics.increment_flow("chatbot").await;
    if let Some(language) = Language::from_code(&req.language) {
        state.metrics.increment_language(language.code()).await;
    }

    let result = state.flows.financial_literacy_chatbot(&req).await;
    record(&state.metrics, result).await.map(Json)
}

pub async fn tips_handler(
    State(state): State<SharedState>,
    payload: Result<Json<TipsRequest>, JsonRejection>,
) -> Result<Json<TipsResponse>, AppError> {
    let Json(req) = payload.map_err(invalid_body)?;
    state.metrics.increment_flow("tips").await;

    let result = state.flows.generate_financial_tips(&req).await;
    record(&state.metrics, result).await.map(Json)
}

pub async fn summary_handler(
    State(state): State<SharedState>,
    payload: Result<Json<SummaryRequest>, JsonRejection>,
) -> Result<Json<SummaryResponse>, AppError> {
    let Json(req) = payload.map_err(invalid_body)?;
    state.metrics.increment_flow("summary").await;

    let result = state.flows.summarize_financial_article(&req).await;
    record(&state.metrics, result).await.map(Json)
}

pub async fn get_metrics_handler(State(state): State<SharedState>) -> Json<MetricsData> {
    Json(state.metrics.get_metrics().await)
}

async fn record<T>(metrics: &MetricsManager, result: Result<T, FlowError>) -> Result<T, AppError> {
    if let Err(e) = &result {
        metrics.increment_failure(e.kind()).await;
    }
    result.map_err(AppError::from)
}

/// A body that is not valid JSON or lacks a required field is invalid input.
pub(crate) fn invalid_body(rejection: JsonRejection) -> AppError {
    AppError::Flow(FlowError::InvalidInput(rejection.body_text()))
}
