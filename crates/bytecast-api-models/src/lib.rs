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
    clippy::cargo,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
//! Shared HTTP DTOs for the ByteCast public API.
//!
//! These types are re-used by the client library and the CLI for
//! request/response encoding so the wire contract lives in a single place.
//! Field names follow the server's JSON exactly; anything the server omits
//! (`omitempty`) is optional here.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Structured error body returned by the API on failures.
///
/// Current servers respond with `{status, message, details}`; older releases
/// used a bare `{error}` payload. Both shapes decode into this type.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ApiErrorBody {
    /// Coarse status label (e.g. `"Conflict"`), when provided.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Human-readable message describing the failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Optional field-level diagnostic detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Legacy message field kept for older server releases.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiErrorBody {
    /// Best human-readable message in the body: `message` wins over the
    /// legacy `error` field; `None` when the body carries neither.
    #[must_use]
    pub fn resolve_message(&self) -> Option<&str> {
        self.message
            .as_deref()
            .or(self.error.as_deref())
            .filter(|text| !text.trim().is_empty())
    }
}

/// Response payload of every successful auth call that issues a token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthResponse {
    /// Bearer token to attach to subsequent authenticated requests.
    pub access_token: String,
}

/// Request payload for `POST /auth/register`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegisterRequest {
    /// Account email address.
    pub email: String,
    /// Account username (3-24 alphanumeric characters server-side).
    pub username: String,
    /// Account password.
    pub password: String,
}

/// Request payload for `POST /auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginRequest {
    /// Username or email address.
    pub identifier: String,
    /// Account password.
    pub password: String,
}

/// A named, colored collection of YouTube channels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Watchlist {
    /// Server-assigned identifier.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Display tag as a `#RRGGBB` hex color.
    pub color: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Request payload for creating or updating a watchlist.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WatchlistDraft {
    /// Display name (1-255 characters server-side).
    pub name: String,
    /// Free-form description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Display tag as a `#RRGGBB` hex color.
    pub color: String,
}

/// Envelope around the watchlist collection returned by `GET /watchlists`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WatchlistsEnvelope {
    /// Watchlists in server order.
    pub watchlists: Vec<Watchlist>,
}

/// A YouTube channel as stored by the server or surfaced by search.
///
/// `id` is the server-side record id; `youtube_id` is the external platform
/// id. Membership bookkeeping uses the former, external links and removal
/// paths use the latter. Search results are not persisted, so their record id
/// defaults to zero.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Channel {
    /// Server-side record identifier.
    #[serde(default)]
    pub id: u64,
    /// External YouTube channel identifier.
    pub youtube_id: String,
    /// Channel title.
    pub title: String,
    /// Channel description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Thumbnail image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    /// User-defined display alias.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_name: Option<String>,
}

impl Channel {
    /// Name shown to the user: the custom alias when set, else the title.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.custom_name.as_deref().unwrap_or(&self.title)
    }
}

/// Envelope around the channel list returned by
/// `GET /watchlists/{id}/channels`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelsEnvelope {
    /// Channels in the watchlist, in server order.
    pub channels: Vec<Channel>,
}

/// Request payload for `POST /watchlists/{id}/channels`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AddChannelRequest {
    /// YouTube channel id or channel URL to attach.
    pub channel_id: String,
}

static HEX_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^#[a-fA-F0-9]{6}$").expect("hex color pattern is valid"));

/// Whether `value` is a 6-digit hex color the server will accept.
#[must_use]
pub fn color_is_valid(value: &str) -> bool {
    HEX_COLOR.is_match(value)
}

impl WatchlistDraft {
    /// Validate the draft against the server's binding rules, returning a
    /// user-facing message on failure.
    ///
    /// # Errors
    /// Returns a description of the first violated rule.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("watchlist name cannot be empty".to_string());
        }
        if self.name.len() > 255 {
            return Err("watchlist name must be at most 255 characters".to_string());
        }
        if !color_is_valid(&self.color) {
            return Err("color must be a 6-digit hex code such as #FF0000".to_string());
        }
        Ok(())
    }
}
