//! Change-tracking session container

use parking_lot::RwLock;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::SessionError;

/// Depot key the request's session is stored under
pub(crate) const SESSION_KEY: &str = "salvo.cookie.session";

/// The key/value contents of a session.
///
/// Keeps insertion order, so payloads list entries in the order they were set.
pub type SessionItems = Map<String, Value>;

/// Session wrapper that tracks modifications.
///
/// Clones share the same items and change flag, so a handler can take a clone
/// out of the `Depot` and the after-request hook still sees its writes.
///
/// Every mutating call marks the session as changed, whether or not the
/// contents actually differ afterwards. Loading is not a change.
#[derive(Clone, Default)]
pub struct Session {
    items: Arc<RwLock<SessionItems>>,
    changed: Arc<AtomicBool>,
}

impl Session {
    /// Create an empty session
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session holding previously stored items, not marked as changed
    pub fn from_items(items: SessionItems) -> Self {
        Self {
            items: Arc::new(RwLock::new(items)),
            changed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Check if the session has been modified during this request
    pub fn has_changed(&self) -> bool {
        self.changed.load(Ordering::SeqCst)
    }

    fn mark_changed(&self) {
        self.changed.store(true, Ordering::SeqCst);
    }

    /// Get a value from the session, deserialized into `T`
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.items
            .read()
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Get the raw value stored under `key`
    pub fn get_value(&self, key: &str) -> Option<Value> {
        self.items.read().get(key).cloned()
    }

    /// Set a value in the session
    pub fn set<K: Into<String>, T: Serialize>(&self, key: K, value: T) -> Result<(), SessionError> {
        let value = serde_json::to_value(value)?;
        self.set_value(key, value);
        Ok(())
    }

    /// Set a raw value in the session
    pub fn set_value<K: Into<String>>(&self, key: K, value: Value) {
        self.items.write().insert(key.into(), value);
        self.mark_changed();
    }

    /// Remove a value from the session. Marks the session as changed even if
    /// the key was absent.
    pub fn remove(&self, key: &str) -> Option<Value> {
        let removed = self.items.write().remove(key);
        self.mark_changed();
        removed
    }

    /// Check if a key exists in the session
    pub fn contains(&self, key: &str) -> bool {
        self.items.read().contains_key(key)
    }

    /// Clear all session data
    pub fn clear(&self) {
        self.items.write().clear();
        self.mark_changed();
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    pub fn keys(&self) -> Vec<String> {
        self.items.read().keys().cloned().collect()
    }

    /// Snapshot of the current contents, as handed to the session store
    pub fn items(&self) -> SessionItems {
        self.items.read().clone()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("items", &*self.items.read())
            .field("changed", &self.has_changed())
            .finish()
    }
}
