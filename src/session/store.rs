//! Session storage
//!
//! In-memory, bounded session table with TTL. Each session remembers which
//! books its reader has passed the quiz for; that set lives and dies with the
//! session.

use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::types::BookwormError;

/// Stored session entry with expiry
#[derive(Debug, Clone)]
struct SessionEntry {
    user_id: i64,
    /// Books this session has passed the quiz for
    verified: HashSet<i64>,
    /// When this session expires (absolute time)
    expires_at: Instant,
    /// Exempt from capacity eviction
    pinned: bool,
}

impl SessionEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// Session store with concurrent access
pub struct SessionStore {
    sessions: DashMap<String, SessionEntry>,
    ttl: Duration,
    max_sessions: usize,
}

impl SessionStore {
    /// Create a new session store
    pub fn new(ttl: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
            max_sessions: max_sessions.max(1),
        }
    }

    /// Open a session for a user, returning the new session id.
    ///
    /// At capacity, the unpinned session closest to expiry is evicted first.
    pub fn open(&self, user_id: i64) -> String {
        self.insert(user_id, false)
    }

    /// Open a session that is evicted only when no unpinned session is
    /// left. Used for administrators.
    pub fn open_pinned(&self, user_id: i64) -> String {
        self.insert(user_id, true)
    }

    fn insert(&self, user_id: i64, pinned: bool) -> String {
        if self.sessions.len() >= self.max_sessions {
            self.cleanup();
        }
        if self.sessions.len() >= self.max_sessions {
            self.evict_oldest();
        }

        let session_id = Uuid::new_v4().to_string();
        self.sessions.insert(
            session_id.clone(),
            SessionEntry {
                user_id,
                verified: HashSet::new(),
                expires_at: Instant::now() + self.ttl,
                pinned,
            },
        );
        debug!("Opened session for user {}", user_id);
        session_id
    }

    /// Whether the session exists and has not expired.
    /// Expired sessions are dropped on access.
    pub fn is_active(&self, session_id: &str) -> bool {
        let now = Instant::now();
        self.sessions
            .remove_if(session_id, |_, entry| !entry.is_live(now));
        self.sessions.contains_key(session_id)
    }

    /// User owning a live session
    pub fn user_id(&self, session_id: &str) -> Option<i64> {
        let now = Instant::now();
        self.sessions
            .get(session_id)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.user_id)
    }

    /// Record that this session passed the quiz for `book_id`.
    ///
    /// Fails with `Unauthorized` if the session is gone.
    pub fn mark_verified(&self, session_id: &str, book_id: i64) -> Result<(), BookwormError> {
        let now = Instant::now();
        if let Some(mut entry) = self.sessions.get_mut(session_id) {
            if entry.is_live(now) {
                entry.verified.insert(book_id);
                return Ok(());
            }
        }
        Err(BookwormError::Unauthorized("Session expired".into()))
    }

    /// Whether this session has passed the quiz for `book_id`
    pub fn is_verified(&self, session_id: &str, book_id: i64) -> bool {
        let now = Instant::now();
        self.sessions
            .get(session_id)
            .map(|entry| entry.is_live(now) && entry.verified.contains(&book_id))
            .unwrap_or(false)
    }

    /// End a session, discarding its verification state
    pub fn destroy(&self, session_id: &str) -> bool {
        self.sessions.remove(session_id).is_some()
    }

    /// End every session of a user, returning how many were closed
    pub fn destroy_user(&self, user_id: i64) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, entry| entry.user_id != user_id);
        before.saturating_sub(self.sessions.len())
    }

    /// Cleanup expired entries
    pub fn cleanup(&self) -> usize {
        let now = Instant::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, entry| entry.is_live(now));
        before.saturating_sub(self.sessions.len())
    }

    /// Evict the unpinned session closest to expiry. Only when every
    /// session is pinned does a pinned one go.
    fn evict_oldest(&self) {
        let oldest = self
            .sessions
            .iter()
            .min_by_key(|entry| (entry.pinned, entry.expires_at))
            .map(|entry| entry.key().clone());

        if let Some(session_id) = oldest {
            self.sessions.remove(&session_id);
            warn!("Session store full, evicted oldest session");
        }
    }

    /// Get stats about the store
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            active_sessions: self.sessions.len(),
            verified_books: self
                .sessions
                .iter()
                .map(|entry| entry.verified.len())
                .sum(),
        }
    }
}

/// Statistics about the session store
#[derive(Debug, Clone)]
pub struct SessionStats {
    pub active_sessions: usize,
    pub verified_books: usize,
}

/// Spawn a background task to periodically cleanup expired sessions
pub fn spawn_cleanup_task(store: Arc<SessionStore>, interval: Duration) {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;
            let removed = store.cleanup();
            if removed > 0 {
                debug!("Session cleanup: removed {} expired sessions", removed);
            }
            let stats = store.stats();
            debug!(
                "Session stats: {} sessions, {} verified books",
                stats.active_sessions, stats.verified_books
            );
        }
    });
    info!("Session cleanup task started");
}
