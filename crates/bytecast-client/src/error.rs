//! Error types for the sync core.

use std::io;

use thiserror::Error;

/// Registration field that collided with an existing account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictField {
    /// The email address is already registered.
    Email,
    /// The username is already taken.
    Username,
    /// The server did not identify the colliding field.
    Unknown,
}

/// Primary error type for client operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Credentials are missing or expired and the refresh protocol could not
    /// recover the session.
    #[error("{message}")]
    Unauthorized {
        /// Server-provided or generic failure message.
        message: String,
    },
    /// Registration collided with an existing account.
    #[error("{message}")]
    Conflict {
        /// Field the collision was attributed to.
        field: ConflictField,
        /// Server-provided conflict message.
        message: String,
    },
    /// The server rejected the request with a non-auth error.
    #[error("{message}")]
    Api {
        /// HTTP status code of the response.
        status: u16,
        /// Translated failure message.
        message: String,
    },
    /// The request never produced a usable response.
    #[error("request failed")]
    Transport {
        /// Source transport error.
        #[from]
        source: reqwest::Error,
    },
    /// Refusing to delete the only remaining watchlist.
    #[error("cannot delete the last remaining watchlist")]
    LastWatchlist,
    /// The watchlist id is not present in the cached collection.
    #[error("watchlist {id} is not in the cached collection")]
    UnknownWatchlist {
        /// Identifier that failed the lookup.
        id: u64,
    },
    /// The channel record id is not present in the active channel view.
    #[error("channel {id} is not in the active watchlist")]
    UnknownChannel {
        /// Record identifier that failed the lookup.
        id: u64,
    },
    /// Profile storage write failed.
    #[error("profile storage operation failed")]
    Storage {
        /// Operation identifier.
        operation: &'static str,
        /// Source IO error.
        source: io::Error,
    },
}

/// Convenience alias for sync-core results.
pub type ClientResult<T> = Result<T, ClientError>;
