//! Redis backing store for id-based sessions
//!
//! - Key: `prefix + session_id` (default prefix: "sess:")
//! - Value: JSON object of the session items
//! - No TTL: entries live until removed

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::sync::Arc;

use super::IdBackingStore;
use crate::error::SessionError;
use crate::session::SessionItems;

/// Redis-backed session table, shareable across processes and nodes.
///
/// # Example
///
/// ```rust,ignore
/// use salvo_cookie_sessions::{IdBasedSessionStore, RedisStore};
///
/// let backing = RedisStore::from_url("redis://127.0.0.1/").await?;
/// let store = IdBasedSessionStore::new(crypto, backing);
/// ```
#[derive(Clone)]
pub struct RedisStore {
    conn: Arc<ConnectionManager>,
    prefix: String,
}

impl RedisStore {
    /// Create a new Redis store with the default "sess:" prefix
    pub async fn new(client: redis::Client) -> Result<Self, SessionError> {
        let conn = ConnectionManager::new(client).await?;
        Ok(Self::from_connection_manager(conn))
    }

    /// Create a new Redis store from a connection string
    pub async fn from_url(url: &str) -> Result<Self, SessionError> {
        let client = redis::Client::open(url)
            .map_err(|e| SessionError::StoreError(format!("Failed to create Redis client: {}", e)))?;
        Self::new(client).await
    }

    /// Create a new Redis store from an existing connection manager
    pub fn from_connection_manager(conn: ConnectionManager) -> Self {
        Self {
            conn: Arc::new(conn),
            prefix: "sess:".to_string(),
        }
    }

    /// Build with custom key prefix
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = prefix.to_string();
        self
    }

    fn make_key(&self, id: &str) -> String {
        format!("{}{}", self.prefix, id)
    }

    /// Remove the session stored under `id`
    pub async fn remove(&self, id: &str) -> Result<(), SessionError> {
        let mut conn = (*self.conn).clone();
        conn.del::<_, ()>(self.make_key(id)).await?;
        Ok(())
    }

    /// Remove every session under this store's prefix
    pub async fn clear(&self) -> Result<(), SessionError> {
        let mut conn = (*self.conn).clone();

        let pattern = format!("{}*", self.prefix);
        let keys: Vec<String> = redis::cmd("KEYS")
            .arg(&pattern)
            .query_async(&mut conn)
            .await?;

        if !keys.is_empty() {
            conn.del::<_, ()>(keys).await?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl IdBackingStore for RedisStore {
    async fn try_load(&self, id: &str) -> Result<Option<SessionItems>, SessionError> {
        let mut conn = (*self.conn).clone();

        let data: Option<String> = conn.get(self.make_key(id)).await?;
        match data {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, id: &str, items: &SessionItems) -> Result<(), SessionError> {
        let mut conn = (*self.conn).clone();

        let json = serde_json::to_string(items)?;
        conn.set::<_, _, ()>(self.make_key(id), json).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    // Tests require a running Redis instance
    // Run with: cargo test --features redis-store -- --ignored

    use super::*;
    use serde_json::json;

    #[tokio::test]
    #[ignore]
    async fn test_redis_store_basic() {
        let store = RedisStore::from_url("redis://127.0.0.1/")
            .await
            .unwrap()
            .with_prefix("sess-test:");
        store.clear().await.unwrap();

        let mut items = SessionItems::new();
        items.insert("user".to_string(), json!("alice"));
        store.save("test-id", &items).await.unwrap();

        assert_eq!(store.try_load("test-id").await.unwrap(), Some(items));
        assert_eq!(store.try_load("other-id").await.unwrap(), None);

        store.remove("test-id").await.unwrap();
        assert_eq!(store.try_load("test-id").await.unwrap(), None);
    }
}
