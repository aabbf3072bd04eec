//! Session middleware for Salvo
//!
//! [`load_session`] runs before the rest of the handler chain and places a
//! [`Session`] in the `Depot`. [`save_session`] runs afterwards and hands the
//! session back to the store, but only if handler code changed it.

use salvo_core::http::cookie::CookieJar;
use salvo_core::http::StatusCode;
use salvo_core::prelude::*;
use std::sync::Arc;

use crate::depot_ext::SessionDepotExt;
use crate::error::SessionError;
use crate::session::Session;
use crate::store::SessionStore;

/// Before-request hook: load the request's session into `depot`.
///
/// Does nothing without a store. A request with no usable session gets an
/// empty one.
pub async fn load_session(
    store: Option<&dyn SessionStore>,
    cookies: &CookieJar,
    depot: &mut Depot,
) -> Result<(), SessionError> {
    let Some(store) = store else {
        return Ok(());
    };

    let session = match store.try_load_session(cookies).await? {
        Some(items) => {
            tracing::debug!(entries = items.len(), "loaded session");
            Session::from_items(items)
        }
        None => Session::new(),
    };
    depot.set_session(session);
    Ok(())
}

/// After-request hook: persist the session in `depot` if it changed.
///
/// An unchanged session never reaches the store, so no cookie is written and
/// nothing is saved.
pub async fn save_session(
    store: Option<&dyn SessionStore>,
    cookies: &CookieJar,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<(), SessionError> {
    let Some(store) = store else {
        return Ok(());
    };
    let Some(session) = depot.session().cloned() else {
        return Ok(());
    };
    if !session.has_changed() {
        return Ok(());
    }

    let items = session.items();
    tracing::debug!(entries = items.len(), "saving changed session");
    store.save_session(cookies, res, &items).await
}

/// Session middleware for Salvo.
///
/// Wraps the rest of the chain with [`load_session`] and [`save_session`].
/// A failing store or cryptography provider turns the response into a 500.
#[derive(Clone, Default)]
pub struct SessionHandler {
    store: Option<Arc<dyn SessionStore>>,
}

impl SessionHandler {
    /// Create a new session handler
    pub fn new<S: SessionStore>(store: S) -> Self {
        Self {
            store: Some(Arc::new(store)),
        }
    }

    /// Create a session handler over a store shared with other code
    pub fn shared(store: Arc<dyn SessionStore>) -> Self {
        Self { store: Some(store) }
    }

    /// A handler with no store; sessions are neither loaded nor saved
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn store(&self) -> Option<&dyn SessionStore> {
        self.store.as_deref()
    }
}

impl std::fmt::Debug for SessionHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandler")
            .field("enabled", &self.store.is_some())
            .finish()
    }
}

#[async_trait]
impl Handler for SessionHandler {
    async fn handle(&self, req: &mut Request, depot: &mut Depot, res: &mut Response, ctrl: &mut FlowCtrl) {
        if let Err(e) = load_session(self.store(), req.cookies(), depot).await {
            tracing::error!("Failed to load session: {}", e);
            res.status_code(StatusCode::INTERNAL_SERVER_ERROR);
            ctrl.skip_rest();
            return;
        }

        ctrl.call_next(req, depot, res).await;

        if let Err(e) = save_session(self.store(), req.cookies(), depot, res).await {
            tracing::error!("Failed to save session: {}", e);
            res.status_code(StatusCode::INTERNAL_SERVER_ERROR);
        }
    }
}
