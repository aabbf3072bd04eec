//! In-memory session table
//!
//! This is primarily for development and single-node deployments.
//! Sessions are lost on restart and are never evicted.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use super::IdBackingStore;
use crate::error::SessionError;
use crate::session::SessionItems;

/// Process-local session table keyed by session id.
///
/// Clones share the same table: build one at startup and hand clones to every
/// store that needs it. Each lookup and upsert is atomic; a load followed by a
/// save from two concurrent requests for the same id is last-write-wins.
#[derive(Clone, Default)]
pub struct MemoryStore {
    sessions: Arc<RwLock<HashMap<String, SessionItems>>>,
}

impl MemoryStore {
    /// Create a new, empty memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove the session stored under `id`
    pub fn remove(&self, id: &str) -> Option<SessionItems> {
        self.sessions.write().remove(id)
    }

    /// Drop every stored session
    pub fn clear(&self) {
        self.sessions.write().clear();
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sessions.read().contains_key(id)
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("sessions", &self.len())
            .finish()
    }
}

#[async_trait]
impl IdBackingStore for MemoryStore {
    async fn try_load(&self, id: &str) -> Result<Option<SessionItems>, SessionError> {
        Ok(self.sessions.read().get(id).cloned())
    }

    async fn save(&self, id: &str, items: &SessionItems) -> Result<(), SessionError> {
        self.sessions.write().insert(id.to_string(), items.clone());
        Ok(())
    }
}
