//! Cache-aside session store with per-session turn guards

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::warn;

use support_agent_config::SessionConfig;
use support_agent_core::{DurableStore, PersistedSession, SessionState};

/// In-process session cache over a durable store.
///
/// The cache map and the guard map are both sharded (`DashMap`), so
/// distinct sessions never contend. The turn guard for a session is a
/// `tokio::sync::Mutex` the engine holds across a whole turn, which
/// serializes same-session turns without blocking the runtime.
pub struct SessionStore {
    cache: DashMap<String, Arc<RwLock<SessionState>>>,
    guards: DashMap<String, Arc<tokio::sync::Mutex<()>>>,
    durable: Arc<dyn DurableStore>,
    config: SessionConfig,
}

impl SessionStore {
    pub fn new(durable: Arc<dyn DurableStore>, config: SessionConfig) -> Self {
        Self {
            cache: DashMap::new(),
            guards: DashMap::new(),
            durable,
            config,
        }
    }

    /// Bound applied to per-session turn history on commit.
    pub fn history_limit(&self) -> usize {
        self.config.history_limit
    }

    /// Per-session turn serialization lock. Stable for the lifetime of
    /// the session entry.
    pub fn turn_guard(&self, session_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        self.guards
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    /// Working copy of the session, creating it if unknown.
    ///
    /// Cache miss falls through to the durable store; a load error
    /// degrades to cache-only operation rather than failing the turn.
    pub async fn get(&self, session_id: &str, now: DateTime<Utc>) -> SessionState {
        if let Some(entry) = self.cache.get(session_id) {
            return entry.read().clone();
        }

        let loaded = match self.durable.load(session_id).await {
            Ok(record) => record.map(PersistedSession::into_session_state),
            Err(err) => {
                warn!(session_id, error = %err, "durable load failed, degrading to cache-only");
                metrics::counter!("session_load_failures").increment(1);
                None
            }
        };

        let state = loaded.unwrap_or_else(|| SessionState::new(session_id, now));
        let entry = self
            .cache
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(RwLock::new(state)));
        let snapshot = entry.read().clone();
        snapshot
    }

    /// Commit a turn's session state: synchronous cache update, then an
    /// async durable save that is allowed to fail (last-write-wins means
    /// the next successful save supersedes it).
    pub fn put(&self, session_id: &str, state: SessionState) {
        let record = PersistedSession::from(&state);

        match self.cache.entry(session_id.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(entry) => {
                *entry.get().write() = state;
            }
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                entry.insert(Arc::new(RwLock::new(state)));
            }
        }

        let durable = Arc::clone(&self.durable);
        let session_id = session_id.to_string();
        tokio::spawn(async move {
            if let Err(err) = durable.save(&record).await {
                warn!(session_id = %session_id, error = %err, "durable save failed");
                metrics::counter!("session_save_failures").increment(1);
            }
        });
    }

    /// End-of-session archival: final synchronous durable save, then
    /// cache and guard eviction.
    pub async fn remove(&self, session_id: &str) {
        if let Some((_, entry)) = self.cache.remove(session_id) {
            let record = PersistedSession::from(&*entry.read());
            if let Err(err) = self.durable.save(&record).await {
                warn!(session_id, error = %err, "final archive save failed");
                metrics::counter!("session_save_failures").increment(1);
            }
        }
        self.guards.remove(session_id);
    }

    /// Ids of cached sessions with no activity since `cutoff`. Used by
    /// the engine's inactivity sweeper.
    pub fn idle_session_ids(&self, cutoff: DateTime<Utc>) -> Vec<String> {
        self.cache
            .iter()
            .filter(|entry| entry.value().read().last_activity_at < cutoff)
            .map(|entry| entry.key().clone())
            .collect()
    }

    pub fn cached_sessions(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::durable::InMemoryDurableStore;
    use async_trait::async_trait;
    use chrono::Duration;
    use support_agent_core::{CoreError, Result};

    fn store() -> (SessionStore, Arc<InMemoryDurableStore>) {
        let durable = Arc::new(InMemoryDurableStore::new());
        (
            SessionStore::new(durable.clone(), SessionConfig::default()),
            durable,
        )
    }

    #[tokio::test]
    async fn test_get_creates_fresh_session() {
        let (store, _) = store();
        let now = Utc::now();
        let state = store.get("s1", now).await;
        assert_eq!(state.id, "s1");
        assert_eq!(state.turn_count, 0);
        assert_eq!(store.cached_sessions(), 1);
    }

    #[tokio::test]
    async fn test_put_then_get_round_trips_through_cache() {
        let (store, _) = store();
        let now = Utc::now();
        let mut state = store.get("s1", now).await;
        state.turn_count = 3;
        store.put("s1", state);

        let reread = store.get("s1", now).await;
        assert_eq!(reread.turn_count, 3);
    }

    #[tokio::test]
    async fn test_cache_miss_loads_from_durable() {
        let durable = Arc::new(InMemoryDurableStore::new());
        let now = Utc::now();

        let mut state = SessionState::new("s1", now);
        state.turn_count = 5;
        durable.save(&PersistedSession::from(&state)).await.unwrap();

        let store = SessionStore::new(durable, SessionConfig::default());
        let loaded = store.get("s1", now).await;
        assert_eq!(loaded.turn_count, 5);
    }

    struct BrokenStore;

    #[async_trait]
    impl support_agent_core::DurableStore for BrokenStore {
        async fn load(&self, _session_id: &str) -> Result<Option<PersistedSession>> {
            Err(CoreError::store("disk on fire"))
        }
        async fn save(&self, _record: &PersistedSession) -> Result<()> {
            Err(CoreError::store("disk on fire"))
        }
    }

    #[tokio::test]
    async fn test_load_failure_degrades_to_fresh_session() {
        let store = SessionStore::new(Arc::new(BrokenStore), SessionConfig::default());
        let state = store.get("s1", Utc::now()).await;
        assert_eq!(state.id, "s1");
        assert_eq!(state.turn_count, 0);
    }

    #[tokio::test]
    async fn test_remove_archives_and_evicts() {
        let (store, durable) = store();
        let now = Utc::now();
        let mut state = store.get("s1", now).await;
        state.turn_count = 2;
        store.put("s1", state);

        store.remove("s1").await;
        assert_eq!(store.cached_sessions(), 0);
        let archived = durable.load("s1").await.unwrap().unwrap();
        assert_eq!(archived.turn_count, 2);
    }

    #[tokio::test]
    async fn test_turn_guard_is_stable_per_session() {
        let (store, _) = store();
        let a = store.turn_guard("s1");
        let b = store.turn_guard("s1");
        let other = store.turn_guard("s2");
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &other));
    }

    #[tokio::test]
    async fn test_idle_session_ids() {
        let (store, _) = store();
        let now = Utc::now();
        store.get("old", now - Duration::hours(2)).await;
        store.get("fresh", now).await;

        let idle = store.idle_session_ids(now - Duration::hours(1));
        assert_eq!(idle, vec!["old".to_string()]);
    }
}
