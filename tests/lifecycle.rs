use std::sync::Arc;

use serde_json::json;
use sqlx::sqlite::SqlitePoolOptions;

use salvo_sql_session::{
    LegacySession, SessionData, SessionError, SessionManager, SessionStore, SqlSessionStore,
};

async fn store() -> SqlSessionStore {
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
async fn test_login_scenario() {
    let manager = SessionManager::new(store().await);

    let (handle, mut data) = manager.get_session(Some("abc123")).await.unwrap();
    assert_eq!(handle.session_id(), "abc123");
    assert!(data.is_empty());

    data.set("user", "alice");
    manager.set_session(&handle, "abc123", &data).await.unwrap();

    // next request
    let (handle, data) = manager.get_session(Some("abc123")).await.unwrap();
    assert_eq!(handle.session_id(), "abc123");
    assert_eq!(data.get_value("user"), Some(&json!("alice")));
    assert_eq!(data.len(), 1);
}

#[tokio::test]
async fn test_duplicate_create() {
    let store = store().await;
    store.create_session("dup").await.unwrap();
    assert!(matches!(
        store.create_session("dup").await,
        Err(SessionError::DuplicateKey(_))
    ));
}

#[tokio::test]
async fn test_last_write_wins() {
    let manager = SessionManager::new(store().await);

    let (first, mut first_data) = manager.get_session(Some("shared")).await.unwrap();
    let (second, mut second_data) = manager.get_session(Some("shared")).await.unwrap();

    first_data.set("cart", vec!["apple"]);
    second_data.set("theme", "dark");
    manager.set_session(&first, "shared", &first_data).await.unwrap();
    manager.set_session(&second, "shared", &second_data).await.unwrap();

    let (_, data) = manager.get_session(Some("shared")).await.unwrap();
    assert_eq!(data, second_data);
    assert!(!data.contains("cart"));
}

#[tokio::test]
async fn test_write_back_after_destroy_does_not_resurrect() {
    let manager = SessionManager::new(store().await);
    let (handle, mut data) = manager.get_session(Some("gone")).await.unwrap();

    manager.destroy_session(&handle).await.unwrap();
    data.set("user", "mallory");
    manager.set_session(&handle, "gone", &data).await.unwrap();

    assert!(manager.store().find_session("gone").await.unwrap().is_none());
}

#[tokio::test]
async fn test_legacy_session_against_sql_store() {
    let store = Arc::new(store().await);

    let mut session = LegacySession::initialize(Arc::clone(&store), "legacy").await.unwrap();
    let id = session.id().unwrap();
    session.data_mut().unwrap().set("user", "alice");
    session.close().await.unwrap();
    assert!(matches!(session.id(), Err(SessionError::Detached)));

    let record = store.fetch_session("legacy").await.unwrap();
    assert_eq!(record.id, id);
    assert_eq!(record.data.get::<String>("user"), Some("alice".to_string()));

    let mut session = LegacySession::initialize(Arc::clone(&store), "legacy").await.unwrap();
    session.delete().await.unwrap();
    assert!(matches!(
        store.fetch_session("legacy").await,
        Err(SessionError::NotFound)
    ));
    session.restore();
    assert!(session.data().is_none());
}

#[tokio::test]
async fn test_payload_is_replaced_wholesale() {
    let manager = SessionManager::new(store().await);
    let (handle, mut data) = manager.get_session(Some("swap")).await.unwrap();
    data.set("a", 1);
    data.set("b", 2);
    manager.set_session(&handle, "swap", &data).await.unwrap();

    let replacement: SessionData = [("c".to_string(), json!(3))].into_iter().collect();
    manager.set_session(&handle, "swap", &replacement).await.unwrap();

    let (_, loaded) = manager.get_session(Some("swap")).await.unwrap();
    assert_eq!(loaded, replacement);
}
