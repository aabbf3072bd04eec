//! Session store traits

use async_trait::async_trait;
use salvo_core::http::cookie::CookieJar;
use salvo_core::Response;

use crate::error::SessionError;
use crate::session::SessionItems;

/// A strategy for finding and persisting the session of a request.
///
/// Implemented by [`IdBasedSessionStore`](super::IdBasedSessionStore), which
/// keeps items server-side behind an encrypted id cookie, and by
/// [`CookieStore`](super::CookieStore), which keeps them in the cookie itself.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Load the session belonging to the request carrying `cookies`.
    ///
    /// Returns None when there is no trustworthy session: no cookie, a
    /// malformed or tampered cookie, or an id the backing store does not know.
    async fn try_load_session(&self, cookies: &CookieJar) -> Result<Option<SessionItems>, SessionError>;

    /// Persist `items`, replacing whatever the session held before.
    ///
    /// `cookies` are the current request's cookies; any cookie the client
    /// must store is added to `res`.
    async fn save_session(
        &self,
        cookies: &CookieJar,
        res: &mut Response,
        items: &SessionItems,
    ) -> Result<(), SessionError>;
}

/// Server-side storage for [`IdBasedSessionStore`](super::IdBasedSessionStore),
/// keyed by session id.
#[async_trait]
pub trait IdBackingStore: Send + Sync + 'static {
    /// Load the items saved under `id`, or None if there are none
    async fn try_load(&self, id: &str) -> Result<Option<SessionItems>, SessionError>;

    /// Save `items` under `id`, replacing any previous entry
    async fn save(&self, id: &str, items: &SessionItems) -> Result<(), SessionError>;
}
