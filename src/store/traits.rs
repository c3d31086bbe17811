//! Session store trait

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::SessionError;
use crate::session::SessionData;

/// A durable session row
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    /// Primary key of the backing row
    pub id: i64,
    /// External session token
    pub session_id: String,
    /// Payload as of the last load or write
    pub data: SessionData,
    pub updated_at: DateTime<Utc>,
}

/// Trait for session storage backends
///
/// Implementations keep at most one record per `session_id` and replace
/// `data` wholesale on every update. `update_session` and `destroy` succeed
/// when the row is already gone.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Look up a session by its external ID
    ///
    /// Returns None if the session doesn't exist
    async fn find_session(&self, session_id: &str) -> Result<Option<SessionRecord>, SessionError>;

    /// Insert a new record with empty data
    ///
    /// Fails with `DuplicateKey` if a record for this ID already exists
    async fn create_session(&self, session_id: &str) -> Result<SessionRecord, SessionError>;

    /// Replace the stored payload of `record`
    async fn update_session(&self, record: &SessionRecord, data: &SessionData) -> Result<(), SessionError>;

    /// Delete the record's row
    async fn destroy(&self, record: &SessionRecord) -> Result<(), SessionError>;

    /// Look up a session, treating absence as an error
    async fn fetch_session(&self, session_id: &str) -> Result<SessionRecord, SessionError> {
        self.find_session(session_id)
            .await?
            .ok_or(SessionError::NotFound)
    }

    /// Delete records not written since `cutoff`, returning how many were removed (optional)
    async fn delete_stale(&self, _cutoff: DateTime<Utc>) -> Result<u64, SessionError> {
        Err(SessionError::StorageUnavailable("delete_stale not implemented".to_string()))
    }

    /// Clear all sessions (optional)
    async fn clear(&self) -> Result<(), SessionError> {
        Err(SessionError::StorageUnavailable("clear not implemented".to_string()))
    }

    /// Get the count of all sessions (optional)
    async fn length(&self) -> Result<usize, SessionError> {
        Err(SessionError::StorageUnavailable("length not implemented".to_string()))
    }

    /// Get all session IDs (optional)
    async fn ids(&self) -> Result<Vec<String>, SessionError> {
        Err(SessionError::StorageUnavailable("ids not implemented".to_string()))
    }
}
