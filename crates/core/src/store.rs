//! Store module - keyed collection of sessions with per-session locking
//!
//! Each session sits behind its own mutex, so requests against one session id
//! are processed one at a time while different sessions proceed in parallel.
//! The map lock is only held long enough to look up or insert an entry.
//!
//! Capacity is bounded: inserting past `max_sessions` evicts the entry that
//! was touched least recently. Requests for an evicted id fail with
//! [`GameError::NotFound`].

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use crate::error::GameError;

/// Key of a session in the store
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// 16 lowercase hex digits
    pub fn from_u64(value: u64) -> Self {
        Self(format!("{:016x}", value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

struct StoreEntry<S> {
    session: Arc<Mutex<S>>,
    last_touched: AtomicU64,
}

/// Bounded map from [`SessionId`] to a lockable session
pub struct SessionStore<S> {
    sessions: RwLock<HashMap<SessionId, StoreEntry<S>>>,
    clock: AtomicU64,
    max_sessions: usize,
}

impl<S> SessionStore<S> {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            clock: AtomicU64::new(0),
            max_sessions: max_sessions.max(1),
        }
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Insert or replace the session under `id`
    ///
    /// Returns the id evicted to make room, if any.
    pub fn insert(&self, id: SessionId, session: S) -> Result<Option<SessionId>, GameError> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| GameError::Internal("session store lock poisoned".to_string()))?;

        let mut evicted = None;
        if !sessions.contains_key(&id) && sessions.len() >= self.max_sessions {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, entry)| entry.last_touched.load(Ordering::Relaxed))
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                sessions.remove(&oldest);
                evicted = Some(oldest);
            }
        }

        sessions.insert(
            id,
            StoreEntry {
                session: Arc::new(Mutex::new(session)),
                last_touched: AtomicU64::new(self.tick()),
            },
        );
        Ok(evicted)
    }

    /// Look up a session handle, marking it as recently used
    pub fn get(&self, id: &SessionId) -> Result<Arc<Mutex<S>>, GameError> {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| GameError::Internal("session store lock poisoned".to_string()))?;
        let entry = sessions
            .get(id)
            .ok_or_else(|| GameError::NotFound(id.to_string()))?;
        entry.last_touched.store(self.tick(), Ordering::Relaxed);
        Ok(Arc::clone(&entry.session))
    }

    /// Run `f` with exclusive access to the session under `id`
    pub fn with_session<T>(
        &self,
        id: &SessionId,
        f: impl FnOnce(&mut S) -> Result<T, GameError>,
    ) -> Result<T, GameError> {
        let handle = self.get(id)?;
        self.with_handle(id, &handle, f)
    }

    /// Lock `handle`, then confirm it is still the entry stored under `id`
    ///
    /// A session evicted or replaced while this call waited for its lock is
    /// reported as [`GameError::NotFound`] and left unmodified.
    fn with_handle<T>(
        &self,
        id: &SessionId,
        handle: &Arc<Mutex<S>>,
        f: impl FnOnce(&mut S) -> Result<T, GameError>,
    ) -> Result<T, GameError> {
        let mut session = handle
            .lock()
            .map_err(|_| GameError::Internal(format!("session {} lock poisoned", id)))?;

        let current = self
            .sessions
            .read()
            .map_err(|_| GameError::Internal("session store lock poisoned".to_string()))?
            .get(id)
            .is_some_and(|entry| Arc::ptr_eq(&entry.session, handle));
        if !current {
            return Err(GameError::NotFound(id.to_string()));
        }
        f(&mut session)
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        self.sessions
            .read()
            .map(|sessions| sessions.contains_key(id))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S> Default for SessionStore<S> {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_session_is_not_found() {
        let store: SessionStore<u32> = SessionStore::new(4);
        let err = store
            .with_session(&SessionId::new("nope"), |_| Ok(()))
            .unwrap_err();
        assert_eq!(err, GameError::NotFound("nope".to_string()));
    }

    #[test]
    fn test_with_session_mutates_in_place() {
        let store = SessionStore::new(4);
        let id = SessionId::new("a");
        store.insert(id.clone(), 1u32).unwrap();
        store
            .with_session(&id, |n| {
                *n += 41;
                Ok(())
            })
            .unwrap();
        assert_eq!(store.with_session(&id, |n| Ok(*n)).unwrap(), 42);
    }

    #[test]
    fn test_evicts_least_recently_touched() {
        let store = SessionStore::new(2);
        let (a, b, c) = (SessionId::new("a"), SessionId::new("b"), SessionId::new("c"));
        store.insert(a.clone(), 0u8).unwrap();
        store.insert(b.clone(), 0u8).unwrap();
        // Touch `a` so `b` becomes the oldest.
        store.get(&a).unwrap();

        let evicted = store.insert(c.clone(), 0u8).unwrap();
        assert_eq!(evicted, Some(b.clone()));
        assert!(store.contains(&a));
        assert!(!store.contains(&b));
        assert!(store.contains(&c));
    }

    #[test]
    fn test_replaced_session_is_not_mutated_through_stale_handle() {
        let store = SessionStore::new(4);
        let id = SessionId::new("a");
        store.insert(id.clone(), 1u32).unwrap();
        let stale = store.get(&id).unwrap();

        // `init` with the same id lands between lookup and lock.
        store.insert(id.clone(), 100u32).unwrap();

        let err = store
            .with_handle(&id, &stale, |n| {
                *n += 1;
                Ok(())
            })
            .unwrap_err();
        assert_eq!(err, GameError::NotFound("a".to_string()));
        assert_eq!(*stale.lock().unwrap(), 1);
        assert_eq!(store.with_session(&id, |n| Ok(*n)).unwrap(), 100);
    }

    #[test]
    fn test_evicted_session_is_not_mutated_through_stale_handle() {
        let store = SessionStore::new(1);
        let (a, b) = (SessionId::new("a"), SessionId::new("b"));
        store.insert(a.clone(), 0u8).unwrap();
        let stale = store.get(&a).unwrap();
        store.insert(b, 0u8).unwrap();

        let err = store.with_handle(&a, &stale, |_| Ok(())).unwrap_err();
        assert_eq!(err, GameError::NotFound("a".to_string()));
    }

    #[test]
    fn test_session_id_from_u64_is_fixed_width_hex() {
        assert_eq!(SessionId::from_u64(255).as_str(), "00000000000000ff");
    }
}
