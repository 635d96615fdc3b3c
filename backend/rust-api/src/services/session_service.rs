use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::metrics::SESSIONS_ACTIVE;
use crate::models::session::QuizSession;

pub const DEFAULT_SESSION_TTL_SECS: u64 = 2 * 60 * 60;
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

/// Per-browser quiz state, keyed by the session cookie value.
///
/// Sessions idle for longer than the TTL are evicted, and the store never
/// holds more than `max_sessions` entries: creating one past the cap evicts
/// the least recently seen. Nothing is shared between sessions apart from
/// the read-only question bank.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, QuizSession>>,
    ttl: Duration,
    max_sessions: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TTL_SECS, DEFAULT_MAX_SESSIONS)
    }
}

impl SessionStore {
    pub fn new(ttl_secs: u64, max_sessions: usize) -> Self {
        let ttl_secs = i64::try_from(ttl_secs)
            .unwrap_or(i64::MAX)
            .min(i64::MAX / 1000);
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl: Duration::seconds(ttl_secs),
            max_sessions: max_sessions.max(1),
        }
    }

    /// Registers a fresh session and returns its id.
    pub async fn create(&self) -> String {
        let session_id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let mut sessions = self.sessions.write().await;
        let evicted = if sessions.len() >= self.max_sessions {
            Self::evict(&mut sessions, now, self.ttl, self.max_sessions - 1)
        } else {
            0
        };
        sessions.insert(session_id.clone(), QuizSession::default());
        SESSIONS_ACTIVE.inc();
        drop(sessions);

        if evicted > 0 {
            tracing::debug!("Evicted {} sessions to make room", evicted);
        }
        tracing::debug!("Session created: {}", session_id);
        session_id
    }

    /// Marks a known, live session as seen. Returns `false` for ids this
    /// store never issued or has already expired; those must not be adopted.
    pub async fn touch(&self, session_id: &str) -> bool {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;

        let idle = match sessions.get_mut(session_id) {
            None => return false,
            Some(session) if session.is_idle(now, self.ttl) => true,
            Some(session) => {
                session.touch(now);
                false
            }
        };

        if idle {
            sessions.remove(session_id);
            SESSIONS_ACTIVE.dec();
            tracing::debug!("Session expired: {}", session_id);
        }
        !idle
    }

    pub async fn contains(&self, session_id: &str) -> bool {
        self.sessions.read().await.contains_key(session_id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Removes sessions idle at `now`. Returns how many were removed.
    pub async fn evict_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;
        Self::evict(&mut sessions, now, self.ttl, usize::MAX)
    }

    pub async fn evict_expired(&self) -> usize {
        self.evict_expired_at(Utc::now()).await
    }

    /// Drops idle sessions, then the least recently seen ones until at most
    /// `keep` remain.
    fn evict(
        sessions: &mut HashMap<String, QuizSession>,
        now: DateTime<Utc>,
        ttl: Duration,
        keep: usize,
    ) -> usize {
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_idle(now, ttl));

        if sessions.len() > keep {
            let mut by_age: Vec<(DateTime<Utc>, String)> = sessions
                .iter()
                .map(|(id, session)| (session.last_seen(), id.clone()))
                .collect();
            by_age.sort();
            let excess = sessions.len() - keep;
            for (_, id) in by_age.into_iter().take(excess) {
                sessions.remove(&id);
            }
        }

        let removed = before - sessions.len();
        SESSIONS_ACTIVE.sub(removed as i64);
        removed
    }

    /// Runs `f` against the session. The middleware only lets issued ids
    /// through, so a missing entry here was evicted mid-request and is
    /// recreated empty.
    pub async fn with_session<T, F>(&self, session_id: &str, f: F) -> T
    where
        F: FnOnce(&mut QuizSession) -> T,
    {
        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(session_id.to_string()).or_insert_with(|| {
            SESSIONS_ACTIVE.inc();
            QuizSession::default()
        });
        f(session)
    }

    pub async fn is_authenticated(&self, session_id: &str) -> bool {
        self.sessions
            .read()
            .await
            .get(session_id)
            .map(|session| session.authenticated)
            .unwrap_or(false)
    }

    pub async fn set_authenticated(&self, session_id: &str, authenticated: bool) {
        self.with_session(session_id, |session| session.authenticated = authenticated)
            .await;
    }

    /// Forgets the active question set so the next render samples anew.
    pub async fn refresh(&self, session_id: &str) {
        self.with_session(session_id, QuizSession::clear_quiz).await;
        tracing::info!("Quiz refreshed for session: {}", session_id);
    }

    pub async fn logout(&self, session_id: &str) {
        self.with_session(session_id, QuizSession::logout).await;
        tracing::info!("Session logged out: {}", session_id);
    }
}

/// Periodically evicts idle sessions.
pub fn spawn_session_sweeper(
    sessions: Arc<SessionStore>,
    period: std::time::Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            let evicted = sessions.evict_expired().await;
            if evicted > 0 {
                tracing::info!("Evicted {} idle sessions", evicted);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn created_sessions_start_unauthenticated() {
        let store = SessionStore::default();
        let id = store.create().await;
        assert!(store.contains(&id).await);
        assert!(!store.is_authenticated(&id).await);
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let store = SessionStore::default();
        let a = store.create().await;
        let b = store.create().await;

        store.set_authenticated(&a, true).await;
        assert!(store.is_authenticated(&a).await);
        assert!(!store.is_authenticated(&b).await);

        store.logout(&a).await;
        assert!(!store.is_authenticated(&a).await);
    }

    #[tokio::test]
    async fn unknown_ids_are_not_adopted() {
        let store = SessionStore::default();
        assert!(!store.touch("forged-id").await);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn idle_sessions_are_evicted() {
        let store = SessionStore::new(60, 100);
        let idle = store.create().await;
        store.create().await;

        assert_eq!(store.evict_expired_at(Utc::now()).await, 0);
        let later = Utc::now() + Duration::seconds(61);
        assert_eq!(store.evict_expired_at(later).await, 2);
        assert!(!store.contains(&idle).await);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn capacity_evicts_least_recently_seen() {
        let store = SessionStore::new(3600, 3);
        let oldest = store.create().await;
        let second = store.create().await;
        let third = store.create().await;

        // Seeing the oldest again makes `second` the eviction candidate
        let t0 = Utc::now();
        store.with_session(&second, |s| s.touch(t0)).await;
        store.with_session(&third, |s| s.touch(t0 + Duration::seconds(1))).await;
        store.with_session(&oldest, |s| s.touch(t0 + Duration::seconds(2))).await;
        let fourth = store.create().await;

        assert_eq!(store.len().await, 3);
        assert!(store.contains(&oldest).await);
        assert!(!store.contains(&second).await);
        assert!(store.contains(&third).await);
        assert!(store.contains(&fourth).await);
    }
}
