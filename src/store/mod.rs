//! Session store implementations

mod memory;
mod sql;
mod traits;

pub use memory::MemoryStore;
pub use sql::SqlSessionStore;
pub use traits::{SessionRecord, SessionStore};
