//! Per-request session lifecycle
//!
//! A request calls [`SessionManager::get_session`] before its handlers run
//! and [`SessionManager::set_session`] once they finish. The handle returned
//! by the first call is threaded through to the second, so no lookup is
//! repeated and no ambient request storage is involved.

use std::sync::Arc;
use uuid::Uuid;

use crate::error::SessionError;
use crate::session::SessionData;
use crate::store::{SessionRecord, SessionStore};

const MAX_SESSION_ID_LEN: usize = 255;

/// Generate a new unguessable session ID (32 lowercase hex characters)
pub fn generate_session_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Check that a session ID is usable as a cookie value and a row key
pub fn is_valid_session_id(session_id: &str) -> bool {
    !session_id.is_empty()
        && session_id.len() <= MAX_SESSION_ID_LEN
        && session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
}

/// Opaque reference to the record loaded by `get_session`
#[derive(Debug, Clone)]
pub struct SessionHandle {
    record: Arc<SessionRecord>,
    is_new: bool,
}

impl SessionHandle {
    pub(crate) fn new(record: SessionRecord, is_new: bool) -> Self {
        Self {
            record: Arc::new(record),
            is_new,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.record.session_id
    }

    /// Whether the record was created by the `get_session` call that produced this handle
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn record(&self) -> &SessionRecord {
        &self.record
    }
}

/// Find-or-create the record for `session_id`.
///
/// Shared with the legacy session wrapper.
pub(crate) async fn load_or_create<S: SessionStore + ?Sized>(
    store: &S,
    session_id: &str,
) -> Result<(SessionRecord, bool), SessionError> {
    match store.find_session(session_id).await? {
        Some(record) => {
            tracing::debug!("Loaded session {}", session_id);
            Ok((record, false))
        }
        None => {
            let record = store.create_session(session_id).await?;
            tracing::debug!("Created session {}", session_id);
            Ok((record, true))
        }
    }
}

/// Two-call session protocol on top of a [`SessionStore`]
pub struct SessionManager<S: SessionStore> {
    store: Arc<S>,
}

impl<S: SessionStore> SessionManager<S> {
    pub fn new(store: S) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Build a manager sharing an existing store
    pub fn from_arc(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Load the session, creating an empty record if none exists.
    ///
    /// A new ID is generated when `session_id` is `None`. The returned data
    /// is the request's working copy.
    pub async fn get_session(
        &self,
        session_id: Option<&str>,
    ) -> Result<(SessionHandle, SessionData), SessionError> {
        let session_id = match session_id {
            Some(sid) if is_valid_session_id(sid) => sid.to_string(),
            Some(sid) => return Err(SessionError::InvalidSessionId(sid.to_string())),
            None => generate_session_id(),
        };

        let (record, is_new) = load_or_create(&*self.store, &session_id).await?;
        let data = record.data.clone();
        Ok((SessionHandle::new(record, is_new), data))
    }

    /// Write the working copy back to the record behind `handle`
    pub async fn set_session(
        &self,
        handle: &SessionHandle,
        session_id: &str,
        data: &SessionData,
    ) -> Result<(), SessionError> {
        if handle.session_id() != session_id {
            return Err(SessionError::MissingSessionContext);
        }
        self.store.update_session(handle.record(), data).await?;
        tracing::debug!("Updated session {}", session_id);
        Ok(())
    }

    /// Delete the record behind `handle`
    pub async fn destroy_session(&self, handle: &SessionHandle) -> Result<(), SessionError> {
        self.store.destroy(handle.record()).await
    }
}

impl<S: SessionStore> Clone for SessionManager<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}
