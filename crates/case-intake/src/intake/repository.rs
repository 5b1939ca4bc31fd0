use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};

use super::domain::{CaseState, SessionId};

/// Storage abstraction for per-session case state.
///
/// Implementations must offer read-your-writes consistency for a single session; the intake
/// service provides mutual exclusion per session key on top of it.
pub trait SessionStore: Send + Sync {
    fn get(&self, session_id: &SessionId) -> Result<Option<CaseState>, StoreError>;
    fn put(&self, state: CaseState) -> Result<(), StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}

type SessionMap = HashMap<SessionId, CaseState>;

/// Process-local store keyed by session id.
#[derive(Debug, Default, Clone)]
pub struct InMemorySessionStore {
    sessions: Arc<Mutex<SessionMap>>,
}

impl InMemorySessionStore {
    fn lock(&self) -> Result<MutexGuard<'_, SessionMap>, StoreError> {
        self.sessions
            .lock()
            .map_err(|_| StoreError::Unavailable("session mutex poisoned".into()))
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.lock()?.is_empty())
    }

    /// Drops sessions whose last activity is older than `max_age`, returning how many went.
    pub fn purge_inactive(
        &self,
        now: DateTime<Utc>,
        max_age: Duration,
    ) -> Result<usize, StoreError> {
        let cutoff = now - max_age;
        let mut guard = self.lock()?;
        let before = guard.len();
        guard.retain(|_, state| state.last_activity >= cutoff);
        Ok(before - guard.len())
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, session_id: &SessionId) -> Result<Option<CaseState>, StoreError> {
        Ok(self.lock()?.get(session_id).cloned())
    }

    fn put(&self, state: CaseState) -> Result<(), StoreError> {
        self.lock()?.insert(state.session_id.clone(), state);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn time(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, day, 9, 0, 0)
            .single()
            .expect("time")
    }

    #[test]
    fn put_then_get_returns_latest_state() {
        let store = InMemorySessionStore::default();
        let mut state = CaseState::new(SessionId::new("abc"), time(1));
        store.put(state.clone()).expect("put");
        state.current_score = Some(42.0);
        store.put(state.clone()).expect("put");

        let fetched = store.get(&SessionId::new("abc")).expect("get");
        assert_eq!(fetched, Some(state));
        assert_eq!(store.len().expect("len"), 1);
        assert!(!store.is_empty().expect("is_empty"));
    }

    #[test]
    fn purge_drops_sessions_past_inactivity_window() {
        let store = InMemorySessionStore::default();
        let now = time(2);
        let stale = CaseState::new(SessionId::new("stale"), now - Duration::hours(30));
        let fresh = CaseState::new(SessionId::new("fresh"), now - Duration::hours(2));
        store.put(stale).expect("put");
        store.put(fresh).expect("put");

        let purged = store
            .purge_inactive(now, Duration::hours(24))
            .expect("purge");

        assert_eq!(purged, 1);
        assert!(store.get(&SessionId::new("stale")).expect("get").is_none());
        assert!(store.get(&SessionId::new("fresh")).expect("get").is_some());
    }

    #[test]
    fn poisoned_mutex_reports_unavailable() {
        let store = InMemorySessionStore::default();
        let sessions = Arc::clone(&store.sessions);
        let _ = std::thread::spawn(move || {
            let _guard = sessions.lock().expect("first lock");
            panic!("poison the session map");
        })
        .join();

        assert!(matches!(store.len(), Err(StoreError::Unavailable(_))));
        assert!(store.is_empty().is_err());
        assert!(store.get(&SessionId::new("abc")).is_err());
    }
}
