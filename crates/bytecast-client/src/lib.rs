#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Client-side session and watchlist sync core for ByteCast.
//!
//! Layout: `storage.rs` (durable profile store), `token.rs` (bearer-token
//! lifecycle + derived authentication state), `gateway.rs` (authenticated
//! transport with the single-flight refresh protocol), `watchlists.rs`
//! (watchlist/channel cache and its consistency rules), `theme.rs` (theme
//! preference sharing the profile store).

pub mod error;
pub mod gateway;
pub mod storage;
pub mod theme;
pub mod token;
pub mod watchlists;

pub use error::{ClientError, ClientResult, ConflictField};
pub use gateway::AuthGateway;
pub use storage::{ACTIVE_WATCHLIST_KEY, ProfileStore, THEME_KEY, TOKEN_KEY};
pub use theme::ThemeMode;
pub use token::TokenStore;
pub use watchlists::{CacheSnapshot, WatchlistCache};
