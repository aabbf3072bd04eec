//! Extension trait for Depot to easily access sessions

use salvo_core::Depot;

use crate::session::{Session, SESSION_KEY};

/// Extension trait for Salvo's Depot to provide easy session access
pub trait SessionDepotExt {
    /// Get the request's session, if the session middleware loaded one
    fn session(&self) -> Option<&Session>;

    /// Get a mutable reference to the request's session
    fn session_mut(&mut self) -> Option<&mut Session>;

    /// Attach a session to the request, replacing any existing one
    fn set_session(&mut self, session: Session);
}

impl SessionDepotExt for Depot {
    fn session(&self) -> Option<&Session> {
        self.get::<Session>(SESSION_KEY).ok()
    }

    fn session_mut(&mut self) -> Option<&mut Session> {
        self.get_mut::<Session>(SESSION_KEY).ok()
    }

    fn set_session(&mut self, session: Session) {
        self.insert(SESSION_KEY, session);
    }
}
