//! # salvo-sql-session
//!
//! SQL-backed session storage and session middleware for the Salvo web framework.
//!
//! Each session is one row in a relational table keyed by an opaque session
//! ID, with the session payload stored as JSON. A request loads the row (or
//! creates an empty one), handlers mutate an in-memory working copy, and the
//! row is written back or deleted when the request completes. Concurrent
//! requests on the same session race at the database; the last write wins.
//!
//! ## Features
//!
//! - **SQLite storage through sqlx**: one row per session, unique on `session_id`
//! - **Two-call protocol**: [`SessionManager::get_session`] / [`SessionManager::set_session`]
//!   with an explicit [`SessionHandle`] carried between them
//! - **Object-style wrapper**: [`LegacySession`] for code that keeps one session object alive
//! - **Signed session cookies**: HMAC-SHA256 with secret rotation
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use salvo::prelude::*;
//! use salvo_sql_session::{SessionConfig, SessionDepotExt, SessionHandler, SqlSessionStore};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = SqlSessionStore::connect("sqlite://sessions.db?mode=rwc").await.unwrap();
//!     store.migrate().await.unwrap();
//!
//!     let session_handler = SessionHandler::new(store, SessionConfig::new("your-secret-key"));
//!
//!     let router = Router::new()
//!         .hoop(session_handler)
//!         .get(index);
//!
//!     let acceptor = TcpListener::new("127.0.0.1:5800").bind().await;
//!     Server::new(acceptor).serve(router).await;
//! }
//!
//! #[handler]
//! async fn index(depot: &mut Depot) -> &'static str {
//!     let session = depot.session_mut().unwrap();
//!     let views: i32 = session.get("views").unwrap_or(0);
//!     session.set("views", views + 1);
//!     "Hello, World!"
//! }
//! ```

pub mod config;
pub mod cookie_signature;
pub mod error;
pub mod handler;
pub mod legacy;
pub mod manager;
pub mod session;
pub mod store;

pub use config::SessionConfig;
pub use error::SessionError;
pub use handler::SessionHandler;
pub use legacy::LegacySession;
pub use manager::{generate_session_id, SessionHandle, SessionManager};
pub use session::{Session, SessionData};
pub use store::{MemoryStore, SessionRecord, SessionStore, SqlSessionStore};

/// Extension trait for Depot to easily access session
pub mod depot_ext;
pub use depot_ext::SessionDepotExt;
