use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError, RwLock},
};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

/// In-process map from user id to that user's session.
///
/// Entries live as long as the store. A missing entry is the "no history"
/// state; `put` overwrites unconditionally and never merges.
pub struct SessionStore<S> {
    sessions: RwLock<HashMap<String, S>>,
    user_locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl<S: Clone> SessionStore<S> {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            user_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, user_id: &str) -> Option<S> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(user_id)
            .cloned()
    }

    pub fn put(&self, user_id: impl Into<String>, session: S) {
        let user_id = user_id.into();
        debug!("Storing session for user: {}", user_id);
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(user_id, session);
    }

    pub fn remove(&self, user_id: &str) -> Option<S> {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(user_id)
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(user_id)
    }

    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Serializes read-modify-write transactions for one user.
    ///
    /// Holders for different users never contend on the same lock. The lock
    /// entry is dropped again once no holder or waiter is left.
    pub async fn lock_user(&self, user_id: &str) -> UserGuard<'_, S> {
        let lock = {
            let mut locks = self
                .user_locks
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(user_id.to_string()).or_default())
        };
        UserGuard {
            store: self,
            user_id: user_id.to_string(),
            guard: Some(lock.lock_owned().await),
        }
    }

    fn release_lock(&self, user_id: &str) {
        let mut locks = self
            .user_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // Clones are only taken under this map lock, so the count is stable here.
        if locks
            .get(user_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(user_id);
        }
    }
}

/// Exclusive access to one user's session, held until dropped.
pub struct UserGuard<'a, S: Clone> {
    store: &'a SessionStore<S>,
    user_id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl<S: Clone> Drop for UserGuard<'_, S> {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.store.release_lock(&self.user_id);
    }
}

impl<S: Clone> Default for SessionStore<S> {
    fn default() -> Self {
        Self::new()
    }
}
