//! Extension trait for Depot to easily access sessions

use salvo_core::Depot;

use crate::error::SessionError;
use crate::session::Session;

pub(crate) const SESSION_KEY: &str = "salvo.sql.session";

/// Extension trait for Salvo's Depot to provide easy session access
pub trait SessionDepotExt {
    /// Get a reference to the session
    fn session(&self) -> Option<&Session>;

    /// Get a mutable session (returns a clone with shared state)
    fn session_mut(&mut self) -> Option<Session>;

    /// Get the session, failing if the session middleware did not run for this request
    fn require_session(&self) -> Result<&Session, SessionError>;
}

impl SessionDepotExt for Depot {
    fn session(&self) -> Option<&Session> {
        self.get::<Session>(SESSION_KEY).ok()
    }

    fn session_mut(&mut self) -> Option<Session> {
        self.get::<Session>(SESSION_KEY).ok().cloned()
    }

    fn require_session(&self) -> Result<&Session, SessionError> {
        self.session().ok_or(SessionError::MissingSessionContext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_depot_has_no_session_context() {
        let depot = Depot::new();
        assert!(depot.session().is_none());
        assert!(matches!(
            depot.require_session(),
            Err(SessionError::MissingSessionContext)
        ));
    }
}
