//! Session payload and the per-request working copy

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::manager::SessionHandle;

/// Key-value session payload.
///
/// Serialized as a plain JSON object; this is what lands in the `data`
/// column of the sessions table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionData {
    values: HashMap<String, Value>,
}

impl SessionData {
    /// Create an empty payload
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a value from session data
    pub fn get<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Option<T> {
        self.values
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Get the raw JSON value stored under `key`
    pub fn get_value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Set a value in session data
    ///
    /// Values that cannot be represented as JSON are dropped.
    pub fn set<T: Serialize>(&mut self, key: &str, value: T) {
        match serde_json::to_value(value) {
            Ok(v) => {
                self.values.insert(key.to_string(), v);
            }
            Err(e) => tracing::warn!("Dropping unserializable session value {}: {}", key, e),
        }
    }

    /// Remove a value from session data
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    /// Check if a key exists
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Clear all session data
    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Iterate over the keys present in the session
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Encode for storage
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decode from storage
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl FromIterator<(String, Value)> for SessionData {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Working copy of a session for the duration of one request.
///
/// Clones share the same state, so a handler can take a copy out of the
/// `Depot` and the middleware sees its edits when the request completes.
pub struct Session {
    handle: SessionHandle,

    data: Arc<RwLock<SessionData>>,

    /// Whether the session has been modified
    modified: Arc<AtomicBool>,

    /// Whether the session should be destroyed
    destroy: Arc<AtomicBool>,
}

impl Session {
    /// Wrap a freshly loaded session
    pub fn new(handle: SessionHandle, data: SessionData) -> Self {
        Self {
            handle,
            data: Arc::new(RwLock::new(data)),
            modified: Arc::new(AtomicBool::new(false)),
            destroy: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get the external session ID
    pub fn id(&self) -> &str {
        self.handle.session_id()
    }

    /// Handle for writing this session back through the manager
    pub fn handle(&self) -> &SessionHandle {
        &self.handle
    }

    /// Check if the record was created during this request
    pub fn is_new(&self) -> bool {
        self.handle.is_new()
    }

    pub fn is_modified(&self) -> bool {
        self.modified.load(Ordering::SeqCst)
    }

    pub fn should_destroy(&self) -> bool {
        self.destroy.load(Ordering::SeqCst)
    }

    /// Get a value from the session
    pub fn get<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Option<T> {
        self.data.read().get(key)
    }

    /// Set a value in the session
    pub fn set<T: Serialize>(&self, key: &str, value: T) {
        self.data.write().set(key, value);
        self.modified.store(true, Ordering::SeqCst);
    }

    /// Remove a value from the session
    pub fn remove(&self, key: &str) -> Option<Value> {
        let result = self.data.write().remove(key);
        if result.is_some() {
            self.modified.store(true, Ordering::SeqCst);
        }
        result
    }

    pub fn contains(&self, key: &str) -> bool {
        self.data.read().contains(key)
    }

    /// Clear all session data
    pub fn clear(&self) {
        self.data.write().clear();
        self.modified.store(true, Ordering::SeqCst);
    }

    /// Mark the session for destruction once the request completes
    pub fn destroy(&self) {
        self.destroy.store(true, Ordering::SeqCst);
    }

    /// Get a copy of the session data
    pub fn data(&self) -> SessionData {
        self.data.read().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

impl Clone for Session {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone(),
            data: Arc::clone(&self.data),
            modified: Arc::clone(&self.modified),
            destroy: Arc::clone(&self.destroy),
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id())
            .field("data", &*self.data.read())
            .field("modified", &self.modified.load(Ordering::SeqCst))
            .field("is_new", &self.is_new())
            .finish()
    }
}
