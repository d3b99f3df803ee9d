//! Server-side session records keyed by an opaque cookie value.
use crate::{Clock, Role};
use async_trait::async_trait;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

const SESSION_ID_BYTES: usize = 32;

/// What a login leaves behind for the session channel.
///
/// `role` is kept as the raw stored string; the resolver validates it.
/// A record stops resolving once `expires_at <= now`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub subject: String,
    pub role: String,
    pub expires_at: i64,
}

impl SessionRecord {
    pub fn new(subject: impl Into<String>, role: Role, expires_at: i64) -> Self {
        Self {
            subject: subject.into(),
            role: role.to_string(),
            expires_at,
        }
    }

    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at <= now
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}

pub type SessionResult<T> = Result<T, SessionError>;

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Live record for `session_id`; expired records read as `None`.
    async fn get(&self, session_id: &str) -> SessionResult<Option<SessionRecord>>;
    async fn insert(&self, session_id: String, record: SessionRecord) -> SessionResult<()>;
    /// Returns whether a record was removed.
    async fn remove(&self, session_id: &str) -> SessionResult<bool>;
    fn backend_name(&self) -> &'static str;
}

/// Map-backed store. Expired entries are evicted when read and swept on
/// every insert, so the map holds at most the sessions still alive.
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, SessionRecord>>,
    clock: Arc<dyn Clock>,
}

impl InMemorySessionStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            clock,
        }
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, session_id: &str) -> SessionResult<Option<SessionRecord>> {
        let now = self.clock.now_epoch_seconds();
        {
            let sessions = self.sessions.read().await;
            match sessions.get(session_id) {
                None => return Ok(None),
                Some(record) if !record.is_expired(now) => return Ok(Some(record.clone())),
                Some(_) => {}
            }
        }
        let mut sessions = self.sessions.write().await;
        if sessions
            .get(session_id)
            .is_some_and(|record| record.is_expired(now))
        {
            sessions.remove(session_id);
            tracing::debug!("expired session evicted");
        }
        Ok(None)
    }

    async fn insert(&self, session_id: String, record: SessionRecord) -> SessionResult<()> {
        let now = self.clock.now_epoch_seconds();
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, existing| !existing.is_expired(now));
        sessions.insert(session_id, record);
        Ok(())
    }

    async fn remove(&self, session_id: &str) -> SessionResult<bool> {
        Ok(self.sessions.write().await.remove(session_id).is_some())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

/// Fresh random session identifier, hex encoded.
pub fn new_session_id() -> String {
    let mut bytes = [0u8; SESSION_ID_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
