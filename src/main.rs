use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{Router, routing::get};
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

use finlit_backend::{
    config::{Config, TranslatorKind},
    routes,
    services::{
        flows::Flows,
        model::{ModelInvoker, OpenAiTransport},
        prompt::Prompts,
        translate::{EchoTranslator, GoogleTranslator, Translator},
    },
    state::{AppState, SharedState},
};

const PURGE_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env().context("invalid configuration")?;
    let flows = build_flows(&config)?;
    let state: SharedState = Arc::new(AppState::new(flows, config.session_ttl));

    let sessions = state.sessions.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(PURGE_INTERVAL);
        loop {
            ticker.tick().await;
            let removed = sessions.purge_expired().await;
            if removed > 0 {
                tracing::debug!(removed, "purged idle sessions");
            }
        }
    });

    let cors = CorsLayer::very_permissive();

    let app: Router = routes::create_router()
        .route("/", get(|| async { "FinLit Buddy backend" }))
        .with_state(state)
        .layer(cors);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;

    tracing::info!(
        bind = %config.bind,
        model = %config.model.model,
        translator = ?config.translator.kind,
        strategy = ?config.language_strategy,
        "FinLit Buddy backend running"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

fn build_flows(config: &Config) -> anyhow::Result<Flows> {
    let prompts = Prompts::compile().context("prompt templates failed to compile")?;

    let transport = OpenAiTransport::new(
        &config.model.api_base,
        config.model.api_key.clone(),
        config.call_timeout,
    )
    .context("failed to build model client")?;
    let model = ModelInvoker::new(
        Arc::new(transport),
        config.model.model.clone(),
        config.model.temperature,
        config.call_timeout,
        config.retry.clone(),
    );

    let translator: Arc<dyn Translator> = match config.translator.kind {
        TranslatorKind::Echo => Arc::new(EchoTranslator),
        TranslatorKind::Google => Arc::new(GoogleTranslator::new(
            config.translator.endpoint.clone(),
            config.translator.api_key.clone().unwrap_or_default(),
            config.call_timeout,
        )),
    };

    Ok(Flows::new(prompts, model, translator, config.language_strategy))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
