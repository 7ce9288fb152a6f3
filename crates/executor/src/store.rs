//! Keyed registry of sessions.
//!
//! Each session lives behind its own mutex so that operations on one
//! session are serialized while different sessions proceed in parallel.

use crate::session::SessionState;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

/// Sessions by key
#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<String, Arc<Mutex<SessionState>>>,
}

impl SessionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle to the session under `key`, creating an uninitialized
    /// one if absent.
    pub fn get_or_create(&self, key: &str) -> Arc<Mutex<SessionState>> {
        if let Some(existing) = self.sessions.get(key) {
            return Arc::clone(existing.value());
        }
        Arc::clone(
            self.sessions
                .entry(key.to_owned())
                .or_insert_with(|| Arc::new(Mutex::new(SessionState::new())))
                .value(),
        )
    }

    /// Run `f` on the session under `key` with the session lock held.
    ///
    /// The session is initialized over `item_count` items on first use. If
    /// the index was rebuilt since the session last saw it (`generation`
    /// differs), the session's caches are reset first.
    pub fn with_session<R>(
        &self,
        key: &str,
        item_count: usize,
        generation: u64,
        f: impl FnOnce(&mut SessionState) -> R,
    ) -> R {
        let handle = self.get_or_create(key);
        let mut session = handle.lock();
        if !session.is_initialized() {
            session.initialize(item_count);
            session.generation = generation;
        } else if session.generation != generation {
            debug!(
                target: "quarry::session",
                session = key,
                from = session.generation,
                to = generation,
                items = item_count,
                "Resetting session after rebuild"
            );
            session.reset_for_rebuild(item_count);
            session.generation = generation;
        }
        f(&mut session)
    }

    /// Drop the session under `key`. Returns true if it existed.
    pub fn remove(&self, key: &str) -> bool {
        self.sessions.remove(key).is_some()
    }

    /// Number of sessions
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// True if there are no sessions
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
