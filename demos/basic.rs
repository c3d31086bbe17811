//! Basic example using a SQLite session store

use std::sync::Arc;

use salvo::prelude::*;
use salvo_sql_session::{
    LegacySession, SessionConfig, SessionDepotExt, SessionHandler, SessionStore, SqlSessionStore,
};

#[handler]
async fn index(depot: &mut Depot) -> String {
    let session = depot.session_mut().expect("Session not found");

    let views: i32 = session.get("views").unwrap_or(0);
    session.set("views", views + 1);

    format!(
        "Hello! You have viewed this page {} time(s).\nSession ID: {}",
        views + 1,
        session.id()
    )
}

#[handler]
async fn get_user(depot: &mut Depot) -> String {
    let session = depot.session_mut().expect("Session not found");

    match session.get::<String>("user") {
        Some(user) => format!("Logged in as: {}", user),
        None => "Not logged in".to_string(),
    }
}

#[handler]
async fn set_user(req: &mut Request, depot: &mut Depot) -> String {
    let session = depot.session_mut().expect("Session not found");

    let username = req.query::<String>("name").unwrap_or_else(|| "anonymous".to_string());
    session.set("user", &username);

    format!("User set to: {}", username)
}

#[handler]
async fn destroy_session(depot: &mut Depot) -> &'static str {
    let session = depot.session_mut().expect("Session not found");
    session.destroy();
    "Session destroyed"
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let store = SqlSessionStore::connect("sqlite://sessions.db?mode=rwc").await?;
    store.migrate().await?;

    // Drop sessions nobody has written to for a week
    let removed = store
        .delete_stale(chrono::Utc::now() - chrono::Duration::days(7))
        .await?;
    tracing::info!("Removed {} stale sessions", removed);

    // Object-style access outside of a request
    let mut maintenance = LegacySession::initialize(Arc::new(store.clone()), "maintenance").await?;
    if let Some(data) = maintenance.data_mut() {
        data.set("last_boot", chrono::Utc::now().to_rfc3339());
    }
    maintenance.close().await?;

    let config = SessionConfig::new("your-super-secret-key-change-in-production")
        .with_max_age(3600)
        .with_resave(false);

    let session_handler = SessionHandler::new(store, config);

    let router = Router::new()
        .hoop(session_handler)
        .get(index)
        .push(Router::with_path("user").get(get_user))
        .push(Router::with_path("login").get(set_user))
        .push(Router::with_path("destroy").get(destroy_session));

    let acceptor = TcpListener::new("127.0.0.1:5800").bind().await;
    println!("Server running at http://127.0.0.1:5800");
    println!("Try these endpoints:");
    println!("  GET /           - View counter");
    println!("  GET /user       - Get current user");
    println!("  GET /login?name=alice - Set user");
    println!("  GET /destroy    - Destroy session");

    Server::new(acceptor).serve(router).await;
    Ok(())
}
