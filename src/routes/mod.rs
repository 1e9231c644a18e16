// src/routes/mod.rs
pub mod chat;
pub mod profile;

use crate::state::SharedState;
use axum::{
    Router,
    routing::{get, post, put},
};
use chat::{chat_handler, get_metrics_handler, summary_handler, tips_handler};
use profile::{
    delete_profile_handler, get_profile_handler, languages_handler, signup_handler,
    update_language_handler,
};
use tower_http::trace::TraceLayer;

pub fn create_router() -> Router<SharedState> {
    Router::new()
        .route("/chat", post(chat_handler))
        .route("/tips", post(tips_handler))
        .route("/summary", post(summary_handler))
        .route("/signup", post(signup_handler))
        .route("/profile/{id}", get(get_profile_handler).delete(delete_profile_handler))
        .route("/profile/{id}/language", put(update_language_handler))
        .route("/languages", get(languages_handler))
        .route("/metrics", get(get_metrics_handler))
        .route("/health", get(|| async { "OK" }))
        .layer(TraceLayer::new_for_http())
}
