//! Self-contained session store
//!
//! The whole session travels in the cookie: every entry is serialized, the
//! entries are joined as `key=value;` pairs, and the result is encrypted and
//! HMAC-tagged. Nothing is kept on the server.

use async_trait::async_trait;
use salvo_core::http::cookie::{Cookie, CookieJar};
use salvo_core::Response;
use std::sync::Arc;

use super::SessionStore;
use crate::cookie_codec::CookieCodec;
use crate::crypto::CryptographyConfig;
use crate::error::SessionError;
use crate::serializer::{JsonSerializer, ObjectSerializer};
use crate::session::SessionItems;

/// Name of the cookie holding the encrypted session contents
pub const SELF_CONTAINED_COOKIE_NAME: &str = "_nc";

/// Session store that encrypts the serialized items into the cookie itself.
#[derive(Clone)]
pub struct CookieStore {
    codec: CookieCodec,
    serializer: Arc<dyn ObjectSerializer>,
}

impl CookieStore {
    /// Create a store using the JSON serializer for values
    pub fn new(crypto: CryptographyConfig) -> Self {
        Self::with_serializer(crypto, JsonSerializer)
    }

    /// Create a store with a custom value serializer
    pub fn with_serializer<S: ObjectSerializer + 'static>(crypto: CryptographyConfig, serializer: S) -> Self {
        Self {
            codec: CookieCodec::new(crypto),
            serializer: Arc::new(serializer),
        }
    }

    /// Name of the cookie this store reads and writes
    pub fn cookie_name() -> &'static str {
        SELF_CONTAINED_COOKIE_NAME
    }

    /// Build the `key=value;` payload. Keys and serialized values are URL
    /// encoded, so neither contains a literal `=` or `;`.
    fn encode_items(&self, items: &SessionItems) -> Result<String, SessionError> {
        let mut payload = String::new();
        for (key, value) in items {
            let data = self.serializer.serialize(value)?;
            payload.push_str(&urlencoding::encode(key));
            payload.push('=');
            payload.push_str(&urlencoding::encode(&data));
            payload.push(';');
        }
        Ok(payload)
    }

    fn decode_items(&self, payload: &str) -> Result<SessionItems, SessionError> {
        let mut items = SessionItems::new();
        for entry in payload.split(';').filter(|entry| !entry.is_empty()) {
            let (key, data) = entry.split_once('=').ok_or_else(|| {
                SessionError::SerializationError(format!("session entry without '=': {}", entry))
            })?;
            let key = url_decode(key)?;
            let value = self.serializer.deserialize(&url_decode(data)?)?;
            items.insert(key, value);
        }
        Ok(items)
    }
}

fn url_decode(s: &str) -> Result<String, SessionError> {
    urlencoding::decode(s)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| SessionError::SerializationError(format!("invalid url encoding: {}", e)))
}

impl std::fmt::Debug for CookieStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieStore")
            .field("codec", &self.codec)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SessionStore for CookieStore {
    async fn try_load_session(&self, cookies: &CookieJar) -> Result<Option<SessionItems>, SessionError> {
        let Some(cookie) = cookies.get(SELF_CONTAINED_COOKIE_NAME) else {
            return Ok(None);
        };

        match self.codec.decode(cookie.value())? {
            Some(payload) => self.decode_items(&payload).map(Some),
            None => {
                tracing::warn!("discarding session cookie that failed authentication");
                Ok(None)
            }
        }
    }

    async fn save_session(
        &self,
        _cookies: &CookieJar,
        res: &mut Response,
        items: &SessionItems,
    ) -> Result<(), SessionError> {
        let payload = self.encode_items(items)?;
        let value = self.codec.encode(&payload)?;
        tracing::debug!(entries = items.len(), bytes = value.len(), "writing session cookie");

        let cookie = Cookie::build((SELF_CONTAINED_COOKIE_NAME, value))
            .http_only(true)
            .build();
        res.add_cookie(cookie);
        Ok(())
    }
}
