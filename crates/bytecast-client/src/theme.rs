//! Theme preference persisted through the profile store.
//!
//! Outside the sync core proper, but it shares the durable storage mechanism
//! and its key is part of the stable storage contract.

use crate::error::ClientResult;
use crate::storage::{ProfileStore, THEME_KEY};

/// Theme preference for client front-ends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ThemeMode {
    /// Always light.
    Light,
    /// Always dark.
    Dark,
    /// Follow the platform preference.
    #[default]
    System,
}

impl ThemeMode {
    /// Stored string value for this mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::System => "system",
        }
    }

    /// Parse a stored value; anything unrecognised falls back to `System`.
    #[must_use]
    pub fn from_value(value: &str) -> Self {
        match value {
            "light" => Self::Light,
            "dark" => Self::Dark,
            _ => Self::System,
        }
    }
}

/// Load the persisted theme preference, defaulting to `System`.
#[must_use]
pub fn load_theme(store: &ProfileStore) -> ThemeMode {
    store
        .get(THEME_KEY)
        .map_or(ThemeMode::System, |value| ThemeMode::from_value(&value))
}

/// Persist a theme preference.
///
/// # Errors
/// Returns a storage error when the preference cannot be written.
pub fn store_theme(store: &ProfileStore, mode: ThemeMode) -> ClientResult<()> {
    store.set(THEME_KEY, mode.as_str())
}
