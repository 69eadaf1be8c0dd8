//! Durable profile store backing session and cache persistence.
//!
//! The store is a single JSON document of string keys and values, the native
//! counterpart of the browser `localStorage` the key names come from. Reads
//! degrade to "absent" on any fault; only writes surface errors.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::warn;

use crate::error::{ClientError, ClientResult};

/// Storage key holding the bearer token.
pub const TOKEN_KEY: &str = "access_token";
/// Storage key holding the last-active watchlist id.
pub const ACTIVE_WATCHLIST_KEY: &str = "activeWatchlist";
/// Storage key holding the theme preference.
pub const THEME_KEY: &str = "bytecast-theme";

const PROFILE_FILE: &str = "profile.json";

/// JSON-file-backed key/value store for durable client-side state.
///
/// Single writer per process; concurrent processes each layer an independent
/// in-memory view over the same file and no cross-process invalidation is
/// provided.
#[derive(Debug)]
pub struct ProfileStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl ProfileStore {
    /// Open (or create) the profile store under `dir`.
    ///
    /// # Errors
    /// Returns [`ClientError::Storage`] when the profile directory cannot be
    /// created. An unreadable or unparsable profile file is treated as empty.
    pub fn open(dir: &Path) -> ClientResult<Self> {
        fs::create_dir_all(dir).map_err(|source| ClientError::Storage {
            operation: "create profile directory",
            source,
        })?;
        let path = dir.join(PROFILE_FILE);
        let values = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|error| {
                warn!(path = %path.display(), %error, "profile file unparsable; starting empty");
                BTreeMap::new()
            }),
            Err(error) if error.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(error) => {
                warn!(path = %path.display(), %error, "profile file unreadable; starting empty");
                BTreeMap::new()
            }
        };
        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    /// Read a value by key. Absent keys and read faults both yield `None`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .expect("profile store mutex poisoned")
            .get(key)
            .cloned()
    }

    /// Persist a value under `key`, replacing any previous value.
    ///
    /// # Errors
    /// Returns [`ClientError::Storage`] when the profile file cannot be
    /// written.
    pub fn set(&self, key: &str, value: impl Into<String>) -> ClientResult<()> {
        let mut values = self.values.lock().expect("profile store mutex poisoned");
        values.insert(key.to_string(), value.into());
        Self::flush(&self.path, &values)
    }

    /// Remove a key. Removing an absent key is a no-op.
    ///
    /// # Errors
    /// Returns [`ClientError::Storage`] when the profile file cannot be
    /// written.
    pub fn remove(&self, key: &str) -> ClientResult<()> {
        let mut values = self.values.lock().expect("profile store mutex poisoned");
        if values.remove(key).is_none() {
            return Ok(());
        }
        Self::flush(&self.path, &values)
    }

    fn flush(path: &Path, values: &BTreeMap<String, String>) -> ClientResult<()> {
        let content = serde_json::to_string_pretty(values).map_err(|source| {
            ClientError::Storage {
                operation: "encode profile file",
                source: io::Error::other(source),
            }
        })?;
        fs::write(path, content).map_err(|source| ClientError::Storage {
            operation: "write profile file",
            source,
        })
    }
}
