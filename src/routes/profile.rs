// src/routes/profile.rs
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};

use crate::{
    error::{AppError, FlowError},
    language::{Language, LanguageInfo, supported_languages},
    message::{LanguageUpdate, SignupRequest, UserProfile},
    routes::chat::invalid_body,
    state::SharedState,
};

pub async fn signup_handler(
    State(state): State<SharedState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<Json<UserProfile>, AppError> {
    let Json(req) = payload.map_err(invalid_body)?;

    if req.name.trim().is_empty() {
        return Err(FlowError::InvalidInput("name is required".to_string()).into());
    }
    let language = parse_language(&req.language)?;

    let session = state.sessions.create_session(&req.name, language).await;
    tracing::info!(session = %session.id, language = language.code(), "user signed up");
    Ok(Json(session.profile()))
}

pub async fn get_profile_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<UserProfile>, AppError> {
    state
        .sessions
        .get_session(&id)
        .await
        .map(|s| Json(s.profile()))
        .ok_or_else(|| unknown_session(&id))
}

pub async fn update_language_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    payload: Result<Json<LanguageUpdate>, JsonRejection>,
) -> Result<Json<UserProfile>, AppError> {
    let Json(req) = payload.map_err(invalid_body)?;
    let language = parse_language(&req.language)?;

    let session = state
        .sessions
        .set_language(&id, language)
        .await
        .ok_or_else(|| unknown_session(&id))?;
    tracing::info!(session = %session.id, language = language.code(), "language changed");
    Ok(Json(session.profile()))
}

/// Sign-out: forgets the profile so the id can no longer be loaded.
pub async fn delete_profile_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if !state.sessions.remove_session(&id).await {
        return Err(unknown_session(&id));
    }
    tracing::info!(session = %id, "user signed out");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn languages_handler() -> Json<Vec<LanguageInfo>> {
    Json(supported_languages())
}

fn parse_language(code: &str) -> Result<Language, AppError> {
    Language::from_code(code)
        .ok_or_else(|| FlowError::InvalidInput(format!("unsupported language '{code}'")).into())
}

fn unknown_session(id: &str) -> AppError {
    AppError::NotFound(format!("no session with id '{id}'"))
}
