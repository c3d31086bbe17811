//! SQL session store
//!
//! Sessions live in a single table:
//!
//! ```sql
//! CREATE TABLE sessions (
//!     id         INTEGER PRIMARY KEY AUTOINCREMENT,
//!     session_id TEXT NOT NULL UNIQUE,
//!     data       TEXT NOT NULL,
//!     updated_at TEXT NOT NULL
//! );
//! ```
//!
//! `data` holds the session payload as a JSON object and `updated_at` a
//! fixed-width RFC 3339 timestamp, so rows sort by age as plain text.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use sqlx::SqlitePool;

use super::{SessionRecord, SessionStore};
use crate::error::SessionError;
use crate::session::SessionData;

const DEFAULT_TABLE_NAME: &str = "sessions";

#[derive(sqlx::FromRow)]
struct SessionRow {
    id: i64,
    session_id: String,
    data: String,
    updated_at: String,
}

impl SessionRow {
    fn into_record(self) -> Result<SessionRecord, SessionError> {
        let data = SessionData::from_json(&self.data)?;
        let updated_at = DateTime::parse_from_rfc3339(&self.updated_at)
            .map_err(|e| SessionError::SerializationError(format!("updated_at: {}", e)))?
            .with_timezone(&Utc);

        Ok(SessionRecord {
            id: self.id,
            session_id: self.session_id,
            data,
            updated_at,
        })
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn is_valid_table_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    name.len() <= 63 && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// SQLite-backed session store
///
/// # Example
///
/// ```rust,ignore
/// use salvo_sql_session::SqlSessionStore;
///
/// let store = SqlSessionStore::connect("sqlite://sessions.db?mode=rwc").await?;
/// store.migrate().await?;
/// ```
#[derive(Clone)]
pub struct SqlSessionStore {
    pool: SqlitePool,
    table_name: String,
}

impl SqlSessionStore {
    /// Create a store on top of an existing pool, using the `sessions` table
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            table_name: DEFAULT_TABLE_NAME.to_string(),
        }
    }

    /// Open a pool for `url` with default options
    pub async fn connect(url: &str) -> Result<Self, SessionError> {
        let pool = SqlitePool::connect(url).await?;
        Ok(Self::new(pool))
    }

    /// Use a different table (default: "sessions")
    pub fn with_table_name(mut self, table_name: &str) -> Result<Self, SessionError> {
        if !is_valid_table_name(table_name) {
            return Err(SessionError::InvalidTableName(table_name.to_string()));
        }
        self.table_name = table_name.to_string();
        Ok(self)
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the sessions table and its index if they don't exist yet
    pub async fn migrate(&self) -> Result<(), SessionError> {
        let create_table = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL UNIQUE,
                data TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
            table = self.table_name
        );
        sqlx::query(&create_table).execute(&self.pool).await?;

        let create_index = format!(
            "CREATE INDEX IF NOT EXISTS {table}_updated_at_idx ON {table} (updated_at)",
            table = self.table_name
        );
        sqlx::query(&create_index).execute(&self.pool).await?;

        tracing::debug!("Session table {} ready", self.table_name);
        Ok(())
    }
}

#[async_trait]
impl SessionStore for SqlSessionStore {
    async fn find_session(&self, session_id: &str) -> Result<Option<SessionRecord>, SessionError> {
        let sql = format!(
            "SELECT id, session_id, data, updated_at FROM {} WHERE session_id = ?",
            self.table_name
        );
        let row = sqlx::query_as::<_, SessionRow>(&sql)
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(SessionRow::into_record).transpose()
    }

    async fn create_session(&self, session_id: &str) -> Result<SessionRecord, SessionError> {
        let data = SessionData::new();
        // Match the microsecond precision of the stored text
        let updated_at = Utc::now().trunc_subsecs(6);
        let sql = format!(
            "INSERT INTO {} (session_id, data, updated_at) VALUES (?, ?, ?)",
            self.table_name
        );
        let result = sqlx::query(&sql)
            .bind(session_id)
            .bind(data.to_json()?)
            .bind(timestamp(updated_at))
            .execute(&self.pool)
            .await?;

        let record = SessionRecord {
            id: result.last_insert_rowid(),
            session_id: session_id.to_string(),
            data,
            updated_at,
        };
        tracing::debug!("Created session row {} for {}", record.id, session_id);
        Ok(record)
    }

    async fn update_session(&self, record: &SessionRecord, data: &SessionData) -> Result<(), SessionError> {
        let sql = format!(
            "UPDATE {} SET data = ?, updated_at = ? WHERE id = ?",
            self.table_name
        );
        let result = sqlx::query(&sql)
            .bind(data.to_json()?)
            .bind(timestamp(Utc::now()))
            .bind(record.id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            tracing::warn!("Session {} no longer exists, update skipped", record.session_id);
        }
        Ok(())
    }

    async fn destroy(&self, record: &SessionRecord) -> Result<(), SessionError> {
        let sql = format!("DELETE FROM {} WHERE id = ?", self.table_name);
        let result = sqlx::query(&sql)
            .bind(record.id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() > 0 {
            tracing::debug!("Destroyed session {}", record.session_id);
        } else {
            tracing::debug!("Session {} was already destroyed", record.session_id);
        }
        Ok(())
    }

    async fn delete_stale(&self, cutoff: DateTime<Utc>) -> Result<u64, SessionError> {
        let sql = format!("DELETE FROM {} WHERE updated_at < ?", self.table_name);
        let result = sqlx::query(&sql)
            .bind(timestamp(cutoff))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn clear(&self) -> Result<(), SessionError> {
        let sql = format!("DELETE FROM {}", self.table_name);
        sqlx::query(&sql).execute(&self.pool).await?;
        Ok(())
    }

    async fn length(&self) -> Result<usize, SessionError> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.table_name);
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(count as usize)
    }

    async fn ids(&self) -> Result<Vec<String>, SessionError> {
        let sql = format!("SELECT session_id FROM {} ORDER BY id", self.table_name);
        let ids: Vec<String> = sqlx::query_scalar(&sql).fetch_all(&self.pool).await?;
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn memory_store() -> SqlSessionStore {
        // A single long-lived connection keeps the in-memory database alive.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let store = SqlSessionStore::new(pool);
        store.migrate().await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_create_find_update_destroy() {
        let store = memory_store().await;

        assert!(store.find_session("abc123").await.unwrap().is_none());

        let record = store.create_session("abc123").await.unwrap();
        assert!(record.id > 0);

        let found = store.find_session("abc123").await.unwrap().unwrap();
        assert_eq!(found.id, record.id);
        assert!(found.data.is_empty());

        let mut data = SessionData::new();
        data.set("user", "alice");
        store.update_session(&record, &data).await.unwrap();

        let found = store.find_session("abc123").await.unwrap().unwrap();
        assert_eq!(found.data, data);
        assert!(found.updated_at >= record.updated_at);

        store.destroy(&record).await.unwrap();
        assert!(store.find_session("abc123").await.unwrap().is_none());
        assert!(matches!(
            store.fetch_session("abc123").await,
            Err(SessionError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_duplicate_create_fails() {
        let store = memory_store().await;
        store.create_session("dup").await.unwrap();

        let err = store.create_session("dup").await.unwrap_err();
        assert!(matches!(err, SessionError::DuplicateKey(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_destroy_twice_and_update_after_destroy() {
        let store = memory_store().await;
        let record = store.create_session("gone").await.unwrap();

        store.destroy(&record).await.unwrap();
        store.destroy(&record).await.unwrap();

        let mut data = SessionData::new();
        data.set("user", "bob");
        store.update_session(&record, &data).await.unwrap();
        assert!(store.find_session("gone").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_closed_pool_is_storage_unavailable() {
        let store = memory_store().await;
        store.pool().close().await;

        let err = store.find_session("abc123").await.unwrap_err();
        assert!(matches!(err, SessionError::StorageUnavailable(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_writes_on_closed_pool_are_storage_unavailable() {
        let store = memory_store().await;
        let record = store.create_session("abc123").await.unwrap();
        store.pool().close().await;

        let mut data = SessionData::new();
        data.set("user", "alice");
        let err = store.update_session(&record, &data).await.unwrap_err();
        assert!(matches!(err, SessionError::StorageUnavailable(_)), "got {:?}", err);

        let err = store.create_session("other").await.unwrap_err();
        assert!(matches!(err, SessionError::StorageUnavailable(_)), "got {:?}", err);

        let err = store.destroy(&record).await.unwrap_err();
        assert!(matches!(err, SessionError::StorageUnavailable(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_created_record_matches_stored_row() {
        let store = memory_store().await;
        let created = store.create_session("abc123").await.unwrap();

        let found = store.find_session("abc123").await.unwrap().unwrap();
        assert_eq!(created, found);
    }

    #[tokio::test]
    async fn test_corrupt_payload_is_serialization_error() {
        let store = memory_store().await;
        sqlx::query("INSERT INTO sessions (session_id, data, updated_at) VALUES (?, ?, ?)")
            .bind("broken")
            .bind("not json")
            .bind(timestamp(Utc::now()))
            .execute(store.pool())
            .await
            .unwrap();

        let err = store.find_session("broken").await.unwrap_err();
        assert!(matches!(err, SessionError::SerializationError(_)));
    }

    #[tokio::test]
    async fn test_custom_table_name() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let store = SqlSessionStore::new(pool)
            .with_table_name("web_sessions")
            .unwrap();
        store.migrate().await.unwrap();

        store.create_session("abc").await.unwrap();
        assert_eq!(store.ids().await.unwrap(), vec!["abc".to_string()]);
        assert_eq!(store.length().await.unwrap(), 1);

        store.clear().await.unwrap();
        assert_eq!(store.length().await.unwrap(), 0);
    }

    #[test]
    fn test_table_name_validation() {
        assert!(is_valid_table_name("sessions"));
        assert!(is_valid_table_name("_app_sessions2"));
        assert!(!is_valid_table_name(""));
        assert!(!is_valid_table_name("2sessions"));
        assert!(!is_valid_table_name("sessions; DROP TABLE users"));
    }

    #[tokio::test]
    async fn test_delete_stale() {
        let store = memory_store().await;
        let old = store.create_session("old").await.unwrap();
        sqlx::query("UPDATE sessions SET updated_at = ? WHERE id = ?")
            .bind(timestamp(Utc::now() - chrono::Duration::days(30)))
            .bind(old.id)
            .execute(store.pool())
            .await
            .unwrap();
        store.create_session("fresh").await.unwrap();

        let removed = store
            .delete_stale(Utc::now() - chrono::Duration::days(7))
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.ids().await.unwrap(), vec!["fresh".to_string()]);
    }
}
