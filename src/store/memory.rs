//! In-memory session store
//!
//! This is primarily for development and testing.
//! For production, use SqlSessionStore.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use super::{SessionRecord, SessionStore};
use crate::error::SessionError;
use crate::session::SessionData;

struct StoredRow {
    id: i64,
    data: SessionData,
    updated_at: DateTime<Utc>,
}

#[derive(Default)]
struct Table {
    rows: HashMap<String, StoredRow>,
    next_id: i64,
}

/// In-memory session store
///
/// Behaves like a table with a unique `session_id` column: IDs are assigned
/// sequentially and duplicate inserts are rejected.
///
/// Warning: This store is not suitable for production use because:
/// - Sessions are lost on server restart
/// - Sessions are not shared across multiple server instances
#[derive(Clone, Default)]
pub struct MemoryStore {
    table: Arc<RwLock<Table>>,
}

impl MemoryStore {
    /// Create a new memory store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn find_session(&self, session_id: &str) -> Result<Option<SessionRecord>, SessionError> {
        let table = self.table.read();
        Ok(table.rows.get(session_id).map(|row| SessionRecord {
            id: row.id,
            session_id: session_id.to_string(),
            data: row.data.clone(),
            updated_at: row.updated_at,
        }))
    }

    async fn create_session(&self, session_id: &str) -> Result<SessionRecord, SessionError> {
        let mut table = self.table.write();
        if table.rows.contains_key(session_id) {
            return Err(SessionError::DuplicateKey(session_id.to_string()));
        }

        table.next_id += 1;
        let row = StoredRow {
            id: table.next_id,
            data: SessionData::new(),
            updated_at: Utc::now(),
        };
        let record = SessionRecord {
            id: row.id,
            session_id: session_id.to_string(),
            data: row.data.clone(),
            updated_at: row.updated_at,
        };
        table.rows.insert(session_id.to_string(), row);
        Ok(record)
    }

    async fn update_session(&self, record: &SessionRecord, data: &SessionData) -> Result<(), SessionError> {
        let mut table = self.table.write();
        match table.rows.get_mut(&record.session_id) {
            Some(row) if row.id == record.id => {
                row.data = data.clone();
                row.updated_at = Utc::now();
            }
            _ => tracing::warn!("Session {} no longer exists, update skipped", record.session_id),
        }
        Ok(())
    }

    async fn destroy(&self, record: &SessionRecord) -> Result<(), SessionError> {
        let mut table = self.table.write();
        let matches = table
            .rows
            .get(&record.session_id)
            .is_some_and(|row| row.id == record.id);
        if matches {
            table.rows.remove(&record.session_id);
        }
        Ok(())
    }

    async fn delete_stale(&self, cutoff: DateTime<Utc>) -> Result<u64, SessionError> {
        let mut table = self.table.write();
        let before = table.rows.len();
        table.rows.retain(|_, row| row.updated_at >= cutoff);
        Ok((before - table.rows.len()) as u64)
    }

    async fn clear(&self) -> Result<(), SessionError> {
        self.table.write().rows.clear();
        Ok(())
    }

    async fn length(&self) -> Result<usize, SessionError> {
        Ok(self.table.read().rows.len())
    }

    async fn ids(&self) -> Result<Vec<String>, SessionError> {
        Ok(self.table.read().rows.keys().cloned().collect())
    }
}
