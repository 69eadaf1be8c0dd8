//! Shared context, error types, and profile wiring for CLI commands.

use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;
use url::Url;

use bytecast_client::{
    AuthGateway, ClientError, ConflictField, ProfileStore, TokenStore, WatchlistCache,
};

use crate::cli::{Cli, OutputFormat};

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

/// Application context passed to command handlers.
pub(crate) struct AppContext {
    pub(crate) store: Arc<ProfileStore>,
    pub(crate) tokens: Arc<TokenStore>,
    pub(crate) gateway: Arc<AuthGateway>,
    pub(crate) cache: WatchlistCache,
    pub(crate) format: OutputFormat,
}

impl AppContext {
    /// Wire the sync core against the configured server and profile dir.
    pub(crate) fn from_cli(cli: &Cli) -> CliResult<Self> {
        let profile_dir = cli
            .profile_dir
            .clone()
            .map_or_else(default_profile_dir, Ok)?;
        debug!(path = %profile_dir.display(), "using profile directory");
        let store =
            Arc::new(ProfileStore::open(&profile_dir).map_err(CliError::failure)?);
        let tokens = Arc::new(TokenStore::new(store.clone()));
        let gateway = Arc::new(
            AuthGateway::new(
                cli.api_url.as_str(),
                Duration::from_secs(cli.timeout),
                tokens.clone(),
            )
            .map_err(CliError::failure)?,
        );
        let cache = WatchlistCache::new(gateway.clone(), store.clone());
        Ok(Self {
            store,
            tokens,
            gateway,
            cache,
            format: cli.format,
        })
    }
}

/// Parse the API URL provided to the CLI.
pub(crate) fn parse_url(input: &str) -> Result<Url, String> {
    input
        .parse::<Url>()
        .map_err(|err| format!("invalid URL '{input}': {err}"))
}

fn default_profile_dir() -> CliResult<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join("bytecast"))
        .ok_or_else(|| {
            CliError::validation(
                "could not determine a profile directory; pass --profile-dir",
            )
        })
}

/// Map a sync-core error onto the CLI error taxonomy: local guards and auth
/// problems are validation errors, everything else is operational.
pub(crate) fn classify_client(error: ClientError) -> CliError {
    match error {
        ClientError::Conflict { field, message } => {
            let field = match field {
                ConflictField::Email => "email",
                ConflictField::Username => "username",
                ConflictField::Unknown => "account",
            };
            CliError::validation(format!("{field} conflict: {message}"))
        }
        ClientError::Unauthorized { message } => {
            CliError::validation(format!("{message} (run `bytecast login`)"))
        }
        guard @ (ClientError::LastWatchlist
        | ClientError::UnknownWatchlist { .. }
        | ClientError::UnknownChannel { .. }) => CliError::validation(guard.to_string()),
        other => CliError::failure(other),
    }
}
