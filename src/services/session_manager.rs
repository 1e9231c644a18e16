// src/services/session_manager.rs
use std::{
    collections::HashMap,
    fmt::Debug,
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::language::Language;
use crate::message::UserProfile;

/// What the sign-up screen captures: a display name and a preferred language.
#[derive(Clone, Debug)]
pub struct Session {
    pub id: String,
    pub name: String,
    pub language: Language,
    pub last_active: Instant,
}

impl Session {
    pub fn new(id: impl Into<String>, name: impl Into<String>, language: Language) -> Self {
        Self { id: id.into(), name: name.into(), language, last_active: Instant::now() }
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            session_id: self.id.clone(),
            name: self.name.clone(),
            language: self.language.code().to_string(),
        }
    }
}

#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<RwLock<HashMap<String, Session>>>,
    ttl: Duration,
}

impl Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl SessionManager {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    // Sign up: create a session holding the user's name and language.
    pub async fn create_session(&self, name: &str, language: Language) -> Session {
        let id = Uuid::new_v4().to_string();
        let session = Session::new(id.clone(), name.trim(), language);

        let mut guard = self.inner.write().await;
        guard.insert(id, session.clone());
        session
    }

    /// Look up a live session and touch it. Expired sessions are treated as absent.
    pub async fn get_session(&self, id: &str) -> Option<Session> {
        let mut guard = self.inner.write().await;
        let ttl = self.ttl;
        let session = guard.get_mut(id)?;
        if session.last_active.elapsed() >= ttl {
            guard.remove(id);
            return None;
        }
        session.last_active = Instant::now();
        Some(session.clone())
    }

    pub async fn set_language(&self, id: &str, language: Language) -> Option<Session> {
        let mut guard = self.inner.write().await;
        let session = guard.get_mut(id)?;
        if session.last_active.elapsed() >= self.ttl {
            guard.remove(id);
            return None;
        }
        session.language = language;
        session.last_active = Instant::now();
        Some(session.clone())
    }

    /// Remove a session by id
    pub async fn remove_session(&self, session_id: &str) -> bool {
        let mut guard = self.inner.write().await;
        guard.remove(session_id).is_some()
    }

    /// Remove sessions idle longer than ttl. Returns number removed.
    pub async fn purge_expired(&self) -> usize {
        let mut guard = self.inner.write().await;
        let now = Instant::now();
        let before = guard.len();
        guard.retain(|_, s| now.duration_since(s.last_active) < self.ttl);
        before - guard.len()
    }

    /// Number of sessions
    pub async fn len(&self) -> usize {
        let guard = self.inner.read().await;
        guard.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
