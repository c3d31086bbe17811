//! Session error types

use std::fmt;

/// Errors that can occur during session operations
#[derive(Debug)]
pub enum SessionError {
    /// No record exists for the requested session ID
    NotFound,
    /// A record for this session ID already exists
    DuplicateKey(String),
    /// The backing store could not complete the operation
    StorageUnavailable(String),
    /// `set_session` was called without a matching `get_session`
    MissingSessionContext,
    /// The legacy session object no longer holds a record
    Detached,
    /// Error during serialization/deserialization
    SerializationError(String),
    /// Invalid session ID format
    InvalidSessionId(String),
    /// Table name is not a plain SQL identifier
    InvalidTableName(String),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::NotFound => write!(f, "Session not found"),
            SessionError::DuplicateKey(sid) => write!(f, "Session already exists: {}", sid),
            SessionError::StorageUnavailable(msg) => write!(f, "Session storage unavailable: {}", msg),
            SessionError::MissingSessionContext => {
                write!(f, "No session context: get_session must precede set_session")
            }
            SessionError::Detached => write!(f, "Session is detached from its record"),
            SessionError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            SessionError::InvalidSessionId(msg) => write!(f, "Invalid session ID: {}", msg),
            SessionError::InvalidTableName(name) => write!(f, "Invalid table name: {}", name),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        SessionError::SerializationError(err.to_string())
    }
}

impl From<sqlx::Error> for SessionError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                SessionError::DuplicateKey(db.message().to_string())
            }
            sqlx::Error::RowNotFound => SessionError::NotFound,
            other => SessionError::StorageUnavailable(other.to_string()),
        }
    }
}
