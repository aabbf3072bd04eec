//! Session store that keeps an encrypted session id in the cookie
//!
//! The cookie only identifies the session; the items live in an
//! [`IdBackingStore`]. The id is encrypted so clients cannot read it, and
//! HMAC-tagged so they cannot swap in another visitor's id.

use async_trait::async_trait;
use salvo_core::http::cookie::{Cookie, CookieJar};
use salvo_core::Response;
use uuid::Uuid;

use super::{IdBackingStore, SessionStore};
use crate::cookie_codec::CookieCodec;
use crate::crypto::CryptographyConfig;
use crate::error::SessionError;
use crate::session::SessionItems;

/// Name of the cookie holding the encrypted session id
pub const ID_COOKIE_NAME: &str = "_nsid";

/// Session store pairing the id cookie protocol with a backing store.
pub struct IdBasedSessionStore<B> {
    codec: CookieCodec,
    backing: B,
}

impl<B: IdBackingStore> IdBasedSessionStore<B> {
    pub fn new(crypto: CryptographyConfig, backing: B) -> Self {
        Self {
            codec: CookieCodec::new(crypto),
            backing,
        }
    }

    /// Name of the cookie this store reads and writes
    pub fn cookie_name() -> &'static str {
        ID_COOKIE_NAME
    }

    /// The backing store holding session items
    pub fn backing(&self) -> &B {
        &self.backing
    }

    /// Extract and verify the session id carried by the request, if any
    fn session_id(&self, cookies: &CookieJar) -> Result<Option<String>, SessionError> {
        let Some(cookie) = cookies.get(ID_COOKIE_NAME) else {
            return Ok(None);
        };

        let value = cookie.value();
        if value.is_empty() {
            return Ok(None);
        }

        match self.codec.decode(value)? {
            Some(id) if !id.is_empty() => Ok(Some(id)),
            Some(_) => Ok(None),
            None => {
                tracing::warn!("ignoring session id cookie that failed authentication");
                Ok(None)
            }
        }
    }

    fn generate_session_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Session-lifetime cookie: HttpOnly, no expiry, path or domain
    fn session_cookie(value: String) -> Cookie<'static> {
        Cookie::build((ID_COOKIE_NAME, value)).http_only(true).build()
    }
}

impl<B: std::fmt::Debug> std::fmt::Debug for IdBasedSessionStore<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdBasedSessionStore")
            .field("backing", &self.backing)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<B: IdBackingStore> SessionStore for IdBasedSessionStore<B> {
    async fn try_load_session(&self, cookies: &CookieJar) -> Result<Option<SessionItems>, SessionError> {
        let Some(id) = self.session_id(cookies)? else {
            return Ok(None);
        };

        let items = self.backing.try_load(&id).await?;
        if items.is_none() {
            tracing::debug!("authentic session id has no stored session");
        }
        Ok(items)
    }

    async fn save_session(
        &self,
        cookies: &CookieJar,
        res: &mut Response,
        items: &SessionItems,
    ) -> Result<(), SessionError> {
        let id = match self.session_id(cookies)? {
            Some(id) => id,
            None => {
                let id = Self::generate_session_id();
                let value = self.codec.encode(&id)?;
                res.add_cookie(Self::session_cookie(value));
                tracing::debug!("issued new session id cookie");
                id
            }
        };

        self.backing.save(&id, items).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookie_codec::test_support::{fake_crypto, real_crypto};
    use crate::store::MemoryStore;
    use base64::{engine::general_purpose::STANDARD, Engine};
    use parking_lot::Mutex;
    use serde_json::json;
    use std::collections::HashMap;

    /// Backing store whose contents tests can seed and inspect
    #[derive(Default)]
    struct FakeBacking {
        items: Mutex<HashMap<String, SessionItems>>,
    }

    #[async_trait]
    impl IdBackingStore for FakeBacking {
        async fn try_load(&self, id: &str) -> Result<Option<SessionItems>, SessionError> {
            Ok(self.items.lock().get(id).cloned())
        }

        async fn save(&self, id: &str, items: &SessionItems) -> Result<(), SessionError> {
            self.items.lock().insert(id.to_string(), items.clone());
            Ok(())
        }
    }

    fn hello_world() -> SessionItems {
        let mut items = SessionItems::new();
        items.insert("Hello".to_string(), json!("World"));
        items
    }

    fn fake_store() -> IdBasedSessionStore<FakeBacking> {
        let (crypto, _) = fake_crypto();
        IdBasedSessionStore::new(crypto, FakeBacking::default())
    }

    /// A cookie value the fake providers accept, carrying `id`
    fn fake_cookie_value(id: &str) -> String {
        let ciphertext = format!("enc:{}", id);
        let tag = [ciphertext.len() as u8, b'A', b'S', b'H'];
        format!("{}{}", STANDARD.encode(tag), ciphertext)
    }

    fn jar_with(value: String) -> CookieJar {
        let mut jar = CookieJar::new();
        jar.add_original(Cookie::new(ID_COOKIE_NAME, value));
        jar
    }

    #[tokio::test]
    async fn test_generates_correctly_configured_cookie() {
        let store = fake_store();
        let mut res = Response::new();

        store
            .save_session(&CookieJar::new(), &mut res, &hello_world())
            .await
            .unwrap();

        assert_eq!(res.cookies().iter().count(), 1);
        let cookie = res.cookies().get(ID_COOKIE_NAME).unwrap();
        assert_eq!(cookie.http_only(), Some(true));
        assert!(cookie.expires().is_none());
        assert!(cookie.path().is_none());
        assert!(cookie.domain().is_none());
    }

    #[tokio::test]
    async fn test_encrypts_and_tags_the_session_id() {
        let store = fake_store();
        let mut res = Response::new();

        store
            .save_session(&CookieJar::new(), &mut res, &hello_world())
            .await
            .unwrap();

        let stored = store.backing().items.lock().clone();
        assert_eq!(stored.len(), 1);
        let (id, items) = stored.into_iter().next().unwrap();
        assert_eq!(items, hello_world());

        let cookie = res.cookies().get(ID_COOKIE_NAME).unwrap();
        assert_eq!(cookie.value(), fake_cookie_value(&id));
    }

    #[tokio::test]
    async fn test_keeps_existing_session_id() {
        let store = fake_store();
        let mut res = Response::new();
        let jar = jar_with(fake_cookie_value("54321"));

        store.save_session(&jar, &mut res, &hello_world()).await.unwrap();

        assert_eq!(res.cookies().iter().count(), 0);
        assert_eq!(
            store.backing().items.lock().get("54321"),
            Some(&hello_world())
        );
    }

    #[tokio::test]
    async fn test_replaces_invalid_session_id() {
        let store = fake_store();
        let mut res = Response::new();
        let forged = format!("{}enc:54321", STANDARD.encode(b"HSAH"));

        store
            .save_session(&jar_with(forged), &mut res, &hello_world())
            .await
            .unwrap();

        assert_eq!(res.cookies().iter().count(), 1);
        let items = store.backing().items.lock();
        assert!(!items.contains_key("54321"));
        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn test_no_cookie_is_not_found() {
        let store = fake_store();
        let loaded = store.try_load_session(&CookieJar::new()).await.unwrap();
        assert_eq!(loaded, None);
    }

    #[tokio::test]
    async fn test_empty_cookie_is_not_found() {
        let store = fake_store();
        let loaded = store.try_load_session(&jar_with(String::new())).await.unwrap();
        assert_eq!(loaded, None);
    }

    #[tokio::test]
    async fn test_loads_a_valid_session() {
        let store = fake_store();
        store
            .backing()
            .items
            .lock()
            .insert("54321".to_string(), hello_world());

        let loaded = store
            .try_load_session(&jar_with(fake_cookie_value("54321")))
            .await
            .unwrap();
        assert_eq!(loaded, Some(hello_world()));
    }

    #[tokio::test]
    async fn test_authentic_id_without_stored_session_is_not_found() {
        let store = fake_store();
        let loaded = store
            .try_load_session(&jar_with(fake_cookie_value("54321")))
            .await
            .unwrap();
        assert_eq!(loaded, None);
    }

    #[tokio::test]
    async fn test_undecryptable_authentic_cookie_is_an_error() {
        let store = fake_store();
        let tag = STANDARD.encode([5u8, b'A', b'S', b'H']);
        let jar = jar_with(format!("{}xxxxx", tag));

        assert!(matches!(
            store.try_load_session(&jar).await,
            Err(SessionError::EncryptionError(_))
        ));
    }

    #[tokio::test]
    async fn test_save_then_load_round_trip() {
        let store = IdBasedSessionStore::new(real_crypto(), MemoryStore::new());
        let mut res = Response::new();

        store
            .save_session(&CookieJar::new(), &mut res, &hello_world())
            .await
            .unwrap();

        let cookie = res.cookies().get(ID_COOKIE_NAME).unwrap().clone();
        let jar = jar_with(cookie.value().to_string());
        assert_eq!(
            store.try_load_session(&jar).await.unwrap(),
            Some(hello_world())
        );

        // The next save reuses the id and emits no cookie
        let mut next = Response::new();
        let mut updated = hello_world();
        updated.insert("views".to_string(), json!(2));
        store.save_session(&jar, &mut next, &updated).await.unwrap();

        assert_eq!(next.cookies().iter().count(), 0);
        assert_eq!(store.try_load_session(&jar).await.unwrap(), Some(updated));
        assert_eq!(store.backing().len(), 1);
    }

    #[tokio::test]
    async fn test_percent_bearing_cookie_value_is_used_verbatim() {
        let store = fake_store();
        store
            .backing()
            .items
            .lock()
            .insert("a%2Fb".to_string(), hello_world());
        let jar = jar_with(fake_cookie_value("a%2Fb"));

        assert_eq!(
            store.try_load_session(&jar).await.unwrap(),
            Some(hello_world())
        );

        let mut res = Response::new();
        store.save_session(&jar, &mut res, &hello_world()).await.unwrap();
        assert_eq!(res.cookies().iter().count(), 0);
        assert!(!store.backing().items.lock().contains_key("a/b"));
    }

    #[tokio::test]
    async fn test_tampered_cookie_is_not_found() {
        let store = IdBasedSessionStore::new(real_crypto(), MemoryStore::new());
        let mut res = Response::new();
        store
            .save_session(&CookieJar::new(), &mut res, &hello_world())
            .await
            .unwrap();
        let value = res.cookies().get(ID_COOKIE_NAME).unwrap().value().to_string();

        for idx in [0, 5, 44, 60, value.len() - 2] {
            let mut chars: Vec<char> = value.chars().collect();
            chars[idx] = if chars[idx] == 'A' { 'B' } else { 'A' };
            let tampered: String = chars.into_iter().collect();

            assert_eq!(
                store.try_load_session(&jar_with(tampered)).await.unwrap(),
                None,
                "index {}",
                idx
            );
        }
    }

    #[tokio::test]
    async fn test_new_sessions_get_distinct_ids() {
        let store = IdBasedSessionStore::new(real_crypto(), MemoryStore::new());

        for _ in 0..10 {
            let mut res = Response::new();
            store
                .save_session(&CookieJar::new(), &mut res, &hello_world())
                .await
                .unwrap();
        }

        assert_eq!(store.backing().len(), 10);
    }
}
