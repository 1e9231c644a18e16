// src/state.rs
use std::sync::Arc;
use std::time::Duration;

use crate::services::flows::Flows;
use crate::services::metrics_manager::MetricsManager;
use crate::services::session_manager::SessionManager;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub flows: Arc<Flows>,
    pub sessions: SessionManager,
    pub metrics: MetricsManager,
}

impl AppState {
    pub fn new(flows: Flows, session_ttl: Duration) -> Self {
        Self {
            flows: Arc::new(flows),
            sessions: SessionManager::new(session_ttl),
            metrics: MetricsManager::new(),
        }
    }
}
