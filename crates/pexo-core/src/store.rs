//! Key–value persisted state for the auth core.
//!
//! Each key is one JSON file under the application state directory.
//! Values are written pretty-printed; the last writer wins. A record
//! that fails to parse is removed on read, so the key reads as absent
//! afterwards.

use std::path::PathBuf;

use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;

use crate::error::AuthError;

/// Key holding the ordered account list.
pub const KEY_USER_DATABASE: &str = "userDatabase";

/// Key holding the active session; absent when signed out.
pub const KEY_SESSION: &str = "user";

#[derive(Debug, Clone)]
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, AuthError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Read the value stored under `key`, `None` when absent.
    ///
    /// A corrupt record is discarded before `MalformedState` is
    /// returned, so the failure surfaces exactly once.
    pub fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, AuthError> {
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)?;
        match serde_json::from_str(&contents) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(key, error = %e, "Discarding persisted record that failed to parse");
                let _ = std::fs::remove_file(&path);
                Err(AuthError::MalformedState {
                    key: key.to_string(),
                })
            }
        }
    }

    pub fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<(), AuthError> {
        let contents = serde_json::to_string_pretty(value)?;
        std::fs::write(self.key_path(key), contents)?;
        Ok(())
    }

    /// Remove `key`. Removing an absent key is a no-op.
    pub fn remove(&self, key: &str) -> Result<(), AuthError> {
        let path = self.key_path(key);
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.key_path(key).exists()
    }
}
