//! Token storage seam.
//!
//! The session token lives in the host's persistent key-value store. This
//! crate only ever reads it, through [`TokenStore`], so clients can be built
//! against an in-memory map in tests or a host callback across the FFI.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Storage key under which the session token is kept.
pub const TOKEN_KEY: &str = "token";

/// Read-only view of a synchronous key-value store.
pub trait TokenStore {
    fn get(&self, key: &str) -> Option<String>;

    /// The session token, treating an empty value as absent.
    fn token(&self) -> Option<String> {
        self.get(TOKEN_KEY).filter(|t| !t.is_empty())
    }
}

impl<S: TokenStore + ?Sized> TokenStore for &S {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }
}

impl<S: TokenStore + ?Sized> TokenStore for Arc<S> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }
}

/// A store that never holds anything: every request goes out unauthenticated.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoToken;

impl TokenStore for NoToken {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }
}

/// Thread-safe in-memory store. Writes come from the owner (login flow,
/// tests); the client only reads.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        let store = Self::new();
        store.set(TOKEN_KEY, token);
        store
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.into(), value.into());
    }

    pub fn remove(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.remove(key)
    }
}

impl TokenStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(key).cloned()
    }
}
