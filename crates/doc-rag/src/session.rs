//! Per-client retrieval state
//!
//! Each session holds at most one document index. Idle sessions are evicted
//! by a background sweep.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::pipeline::IndexedDocument;
use crate::retrieval::VectorIndex;
use crate::types::{SessionStatus, SessionSummary};

/// What a session can answer from
#[derive(Debug, Clone)]
pub enum SessionState {
    /// Nothing uploaded yet
    NoDocument,
    /// Questions run against this index
    DocumentIndexed {
        index: Arc<VectorIndex>,
        filename: String,
        indexed_at: DateTime<Utc>,
    },
}

impl SessionState {
    /// Current index, if any
    pub fn index(&self) -> Option<Arc<VectorIndex>> {
        match self {
            Self::NoDocument => None,
            Self::DocumentIndexed { index, .. } => Some(Arc::clone(index)),
        }
    }
}

/// One client's session
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub state: SessionState,
    pub created_at: DateTime<Utc>,
    last_active: Instant,
}

impl Session {
    fn new(id: Uuid) -> Self {
        Self {
            id,
            state: SessionState::NoDocument,
            created_at: Utc::now(),
            last_active: Instant::now(),
        }
    }

    fn summary(&self) -> SessionSummary {
        let (status, filename, chunks, indexed_at) = match &self.state {
            SessionState::NoDocument => (SessionStatus::NoDocument, None, 0, None),
            SessionState::DocumentIndexed {
                index,
                filename,
                indexed_at,
            } => (
                SessionStatus::DocumentIndexed,
                Some(filename.clone()),
                index.len(),
                Some(*indexed_at),
            ),
        };
        SessionSummary {
            session_id: self.id,
            status,
            filename,
            chunks,
            indexed_at,
            created_at: self.created_at,
        }
    }
}

/// Concurrent map of live sessions
pub struct SessionStore {
    sessions: DashMap<Uuid, Session>,
    idle_ttl: Duration,
    max_sessions: usize,
}

impl SessionStore {
    /// Create an empty store
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            sessions: DashMap::new(),
            idle_ttl: Duration::from_secs(config.idle_ttl_secs),
            max_sessions: config.max_sessions,
        }
    }

    /// Open a new session with no document
    pub fn create(&self) -> Result<Uuid> {
        if self.sessions.len() >= self.max_sessions {
            return Err(Error::SessionLimit(self.max_sessions));
        }
        let id = Uuid::new_v4();
        self.sessions.insert(id, Session::new(id));
        tracing::info!("Created session {} ({} live)", id, self.sessions.len());
        Ok(id)
    }

    /// Index to answer from, marking the session active
    pub fn current_index(&self, id: Uuid) -> Result<Option<Arc<VectorIndex>>> {
        let mut session = self.sessions.get_mut(&id).ok_or(Error::SessionNotFound(id))?;
        session.last_active = Instant::now();
        Ok(session.state.index())
    }

    /// Replace the session's index with a freshly built one
    pub fn install(&self, id: Uuid, document: &IndexedDocument) -> Result<SessionSummary> {
        let mut session = self.sessions.get_mut(&id).ok_or(Error::SessionNotFound(id))?;
        if let SessionState::DocumentIndexed { filename, .. } = &session.state {
            tracing::info!("Session {} replacing index of '{}'", id, filename);
        }
        session.state = SessionState::DocumentIndexed {
            index: Arc::clone(&document.index),
            filename: document.filename.clone(),
            indexed_at: Utc::now(),
        };
        session.last_active = Instant::now();
        Ok(session.summary())
    }

    /// Session status
    pub fn summary(&self, id: Uuid) -> Result<SessionSummary> {
        self.sessions
            .get(&id)
            .map(|s| s.summary())
            .ok_or(Error::SessionNotFound(id))
    }

    /// Drop a session and its index
    pub fn remove(&self, id: Uuid) -> Result<()> {
        match self.sessions.remove(&id) {
            Some(_) => {
                tracing::info!("Removed session {}", id);
                Ok(())
            }
            None => Err(Error::SessionNotFound(id)),
        }
    }

    /// Evict sessions idle longer than the TTL
    pub fn evict_idle(&self) -> usize {
        self.evict_idle_at(Instant::now())
    }

    fn evict_idle_at(&self, now: Instant) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, s| now.saturating_duration_since(s.last_active) <= self.idle_ttl);
        let evicted = before.saturating_sub(self.sessions.len());
        if evicted > 0 {
            tracing::info!("Evicted {} idle sessions ({} live)", evicted, self.sessions.len());
        }
        evicted
    }

    /// Live session count
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Run the eviction sweep every `interval` until the task is aborted
    pub fn spawn_sweeper(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // First tick fires immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                self.evict_idle();
            }
        })
    }
}
