//! Bearer-token lifecycle and derived authentication state.

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::error::ClientResult;
use crate::storage::{ProfileStore, TOKEN_KEY};

/// Owns the bearer token: persistence, validity, and the derived
/// authenticated-state observable. Purely local; never touches the network.
#[derive(Debug)]
pub struct TokenStore {
    store: Arc<ProfileStore>,
    authenticated: watch::Sender<bool>,
}

impl TokenStore {
    /// Construct the store, seeding the authenticated observable from the
    /// persisted token's structural validity and expiry.
    #[must_use]
    pub fn new(store: Arc<ProfileStore>) -> Self {
        let initial = store
            .get(TOKEN_KEY)
            .is_some_and(|token| token_is_current(&token));
        let (authenticated, _) = watch::channel(initial);
        Self {
            store,
            authenticated,
        }
    }

    /// The persisted token verbatim. No validation; this is the cheap read
    /// used to attach credentials to outbound requests.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.store.get(TOKEN_KEY)
    }

    /// Persist a freshly-issued token and mark the session authenticated.
    ///
    /// Callers are trusted to pass a token a successful auth call just
    /// returned, so no re-validation happens here.
    ///
    /// # Errors
    /// Returns a storage error when the token cannot be persisted.
    pub fn set_token(&self, token: &str) -> ClientResult<()> {
        self.store.set(TOKEN_KEY, token)?;
        self.authenticated.send_replace(true);
        Ok(())
    }

    /// Erase the persisted token and mark the session signed out.
    ///
    /// # Errors
    /// Returns a storage error when the token cannot be erased.
    pub fn clear_token(&self) -> ClientResult<()> {
        self.store.remove(TOKEN_KEY)?;
        self.authenticated.send_replace(false);
        Ok(())
    }

    /// Current authenticated state.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        *self.authenticated.borrow()
    }

    /// Subscribe to authenticated-state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.authenticated.subscribe()
    }

    /// Authenticated-state changes as a stream, for reactive consumers.
    #[must_use]
    pub fn authenticated_stream(&self) -> WatchStream<bool> {
        WatchStream::new(self.authenticated.subscribe())
    }
}

/// Whether `token` looks like a JWT that has not expired yet: three
/// dot-separated non-empty segments, and a base64url payload whose `exp`
/// claim (unix seconds) lies in the future. Any parse failure means invalid;
/// nothing here ever errors out to the caller.
#[must_use]
pub fn token_is_current(token: &str) -> bool {
    let mut segments = token.split('.');
    let (Some(header), Some(payload), Some(signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return false;
    };
    if header.is_empty() || payload.is_empty() || signature.is_empty() {
        return false;
    }
    let Ok(decoded) = URL_SAFE_NO_PAD.decode(payload) else {
        return false;
    };
    let Ok(claims) = serde_json::from_slice::<serde_json::Value>(&decoded) else {
        return false;
    };
    let Some(exp) = claims.get("exp").and_then(serde_json::Value::as_i64) else {
        return false;
    };
    exp > Utc::now().timestamp()
}
