//! Credential storage.
//!
//! Freebooter doesn't ship a database client. The server only needs four
//! operations from a key/field store with sets, captured by the
//! [`CredentialStore`] trait. A Redis-backed implementation lives outside
//! this workspace; [`MemoryStore`] covers development and tests.
//!
//! Layout:
//!
//! ```text
//! user:<username>   hash   { auth_token: <token> }
//! users             set    { <username>, ... }
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::StoreError;

/// Hash field holding a user's registered token.
pub const AUTH_TOKEN_FIELD: &str = "auth_token";

/// Set of every registered username.
pub const USERS_SET: &str = "users";

/// The store key for a user's credential record.
pub fn user_key(username: &str) -> String {
    format!("user:{username}")
}

/// The store operations the authentication flow consumes.
///
/// Calls are synchronous and made from the main thread during login, so
/// implementations should answer quickly.
pub trait CredentialStore: Send + Sync {
    /// Sets `field` of the hash at `key`, creating the hash if needed.
    fn set_hash_field(&self, key: &str, field: &str, value: &str) -> Result<(), StoreError>;

    /// Reads `field` of the hash at `key`. `Ok(None)` if either is absent.
    fn get_hash_field(&self, key: &str, field: &str) -> Result<Option<String>, StoreError>;

    /// Adds `value` to the set at `key`. Returns whether it was new.
    fn add_to_set(&self, key: &str, value: &str) -> Result<bool, StoreError>;

    /// Whether anything is stored under `key`.
    fn key_exists(&self, key: &str) -> Result<bool, StoreError>;
}

#[derive(Debug, Default)]
struct Tables {
    hashes: HashMap<String, HashMap<String, String>>,
    sets: HashMap<String, HashSet<String>>,
}

/// In-process [`CredentialStore`].
///
/// Contents are lost when the process exits. [`set_failing`] makes every
/// call return [`StoreError::Unavailable`], which is how tests exercise
/// the infrastructure-failure paths.
///
/// [`set_failing`]: MemoryStore::set_failing
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggles simulated backend failure.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }

    /// Members of the set at `key`, sorted.
    pub fn set_members(&self, key: &str) -> Vec<String> {
        let mut members: Vec<_> = self
            .lock()
            .sets
            .get(key)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        members.sort();
        members
    }

    fn check(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        if self.failing.load(Ordering::Relaxed) {
            return Err(StoreError::Unavailable("memory store switched off".into()));
        }
        Ok(self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CredentialStore for MemoryStore {
    fn set_hash_field(&self, key: &str, field: &str, value: &str) -> Result<(), StoreError> {
        self.check()?
            .hashes
            .entry(key.to_owned())
            .or_default()
            .insert(field.to_owned(), value.to_owned());
        Ok(())
    }

    fn get_hash_field(&self, key: &str, field: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .check()?
            .hashes
            .get(key)
            .and_then(|hash| hash.get(field))
            .cloned())
    }

    fn add_to_set(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        Ok(self
            .check()?
            .sets
            .entry(key.to_owned())
            .or_default()
            .insert(value.to_owned()))
    }

    fn key_exists(&self, key: &str) -> Result<bool, StoreError> {
        let tables = self.check()?;
        Ok(tables.hashes.contains_key(key) || tables.sets.contains_key(key))
    }
}
