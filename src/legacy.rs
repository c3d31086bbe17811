//! Object-style session wrapper
//!
//! One [`LegacySession`] represents one session for the lifetime of the
//! object: it is attached to a record when initialized and detached by
//! [`close`](LegacySession::close) or [`delete`](LegacySession::delete).
//! Once detached, `update` and `restore` do nothing and `id` fails.

use std::sync::Arc;

use crate::error::SessionError;
use crate::manager::load_or_create;
use crate::session::SessionData;
use crate::store::{SessionRecord, SessionStore};

enum Attachment {
    Attached {
        record: SessionRecord,
        data: SessionData,
    },
    Detached,
}

pub struct LegacySession<S: SessionStore> {
    store: Arc<S>,
    session_id: String,
    state: Attachment,
}

impl<S: SessionStore> LegacySession<S> {
    /// Find or create the record for `session_id` and attach to it
    pub async fn initialize(store: Arc<S>, session_id: impl Into<String>) -> Result<Self, SessionError> {
        let session_id = session_id.into();
        let (record, _) = load_or_create(&*store, &session_id).await?;
        let data = record.data.clone();

        Ok(Self {
            store,
            session_id,
            state: Attachment::Attached { record, data },
        })
    }

    /// External session ID, available in either state
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn is_attached(&self) -> bool {
        matches!(self.state, Attachment::Attached { .. })
    }

    /// Internal record ID
    pub fn id(&self) -> Result<i64, SessionError> {
        match &self.state {
            Attachment::Attached { record, .. } => Ok(record.id),
            Attachment::Detached => Err(SessionError::Detached),
        }
    }

    /// Local working copy, None once detached
    pub fn data(&self) -> Option<&SessionData> {
        match &self.state {
            Attachment::Attached { data, .. } => Some(data),
            Attachment::Detached => None,
        }
    }

    pub fn data_mut(&mut self) -> Option<&mut SessionData> {
        match &mut self.state {
            Attachment::Attached { data, .. } => Some(data),
            Attachment::Detached => None,
        }
    }

    /// Save the local data to the record
    pub async fn update(&mut self) -> Result<(), SessionError> {
        if let Attachment::Attached { record, data } = &mut self.state {
            self.store.update_session(record, data).await?;
            record.data = data.clone();
        }
        Ok(())
    }

    /// Discard local edits, going back to the record's payload
    pub fn restore(&mut self) {
        if let Attachment::Attached { record, data } = &mut self.state {
            *data = record.data.clone();
        }
    }

    /// Save and detach
    pub async fn close(&mut self) -> Result<(), SessionError> {
        if self.is_attached() {
            self.update().await?;
            self.state = Attachment::Detached;
            tracing::debug!("Closed session {}", self.session_id);
        }
        Ok(())
    }

    /// Destroy the record and detach
    pub async fn delete(&mut self) -> Result<(), SessionError> {
        if let Attachment::Attached { record, .. } = &self.state {
            self.store.destroy(record).await?;
            self.state = Attachment::Detached;
            tracing::debug!("Deleted session {}", self.session_id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_initialize_creates_then_loads() {
        let store = Arc::new(MemoryStore::new());

        let mut session = LegacySession::initialize(Arc::clone(&store), "abc123").await.unwrap();
        assert!(session.data().unwrap().is_empty());
        session.data_mut().unwrap().set("user", "alice");
        session.close().await.unwrap();

        let session = LegacySession::initialize(store, "abc123").await.unwrap();
        assert_eq!(
            session.data().unwrap().get::<String>("user"),
            Some("alice".to_string())
        );
    }

    #[tokio::test]
    async fn test_restore_discards_local_edits() {
        let store = Arc::new(MemoryStore::new());
        let mut session = LegacySession::initialize(store, "abc123").await.unwrap();

        session.data_mut().unwrap().set("views", 1);
        session.update().await.unwrap();
        session.data_mut().unwrap().set("views", 2);
        session.restore();

        assert_eq!(session.data().unwrap().get::<i32>("views"), Some(1));
    }

    #[tokio::test]
    async fn test_close_detaches() {
        let store = Arc::new(MemoryStore::new());
        let mut session = LegacySession::initialize(Arc::clone(&store), "abc123").await.unwrap();
        let id = session.id().unwrap();
        session.close().await.unwrap();

        assert!(!session.is_attached());
        assert!(matches!(session.id(), Err(SessionError::Detached)));
        assert!(session.data_mut().is_none());
        session.update().await.unwrap();
        session.restore();
        session.close().await.unwrap();
        session.delete().await.unwrap();

        // delete after close must not have touched the row
        let record = store.find_session("abc123").await.unwrap().unwrap();
        assert_eq!(record.id, id);
    }

    #[tokio::test]
    async fn test_delete_destroys_and_detaches() {
        let store = Arc::new(MemoryStore::new());
        let mut session = LegacySession::initialize(Arc::clone(&store), "abc123").await.unwrap();

        session.delete().await.unwrap();
        assert!(store.find_session("abc123").await.unwrap().is_none());
        assert!(matches!(session.id(), Err(SessionError::Detached)));
        assert_eq!(session.session_id(), "abc123");

        session.update().await.unwrap();
        assert!(store.find_session("abc123").await.unwrap().is_none());
    }
}
