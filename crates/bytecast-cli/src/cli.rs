//! Argument parsing and command dispatch for the ByteCast CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use url::Url;

use crate::client::{AppContext, CliResult, parse_url};
use crate::commands::{auth, channels, theme, watchlists};

const DEFAULT_API_URL: &str = "http://127.0.0.1:8080";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Parser)]
#[command(
    name = "bytecast",
    about = "Command-line client for the ByteCast watchlist service"
)]
pub(crate) struct Cli {
    /// Base URL of the ByteCast API server.
    #[arg(
        long,
        global = true,
        env = "BYTECAST_API_URL",
        value_parser = parse_url,
        default_value = DEFAULT_API_URL
    )]
    pub(crate) api_url: Url,
    /// Directory holding the durable client profile.
    #[arg(long, global = true, env = "BYTECAST_PROFILE_DIR")]
    pub(crate) profile_dir: Option<PathBuf>,
    /// HTTP timeout in seconds.
    #[arg(
        long,
        global = true,
        env = "BYTECAST_HTTP_TIMEOUT_SECS",
        default_value_t = DEFAULT_TIMEOUT_SECS
    )]
    pub(crate) timeout: u64,
    /// Output format for rendered results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub(crate) format: OutputFormat,
    #[command(subcommand)]
    pub(crate) command: Command,
}

/// Rendering style for command output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable columns.
    Table,
    /// Pretty-printed JSON.
    Json,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Create a new account and sign in.
    Register(RegisterArgs),
    /// Sign in with an existing account.
    Login(LoginArgs),
    /// Sign out and clear the local session.
    Logout,
    /// Show the local session state.
    Status,
    /// Manage watchlists.
    #[command(subcommand)]
    Watchlist(WatchlistCommand),
    /// Show the active watchlist's channels.
    Channels,
    /// Search channels and manage watchlist membership.
    #[command(subcommand)]
    Channel(ChannelCommand),
    /// Inspect or set the theme preference.
    #[command(subcommand)]
    Theme(ThemeCommand),
}

#[derive(Args)]
pub(crate) struct RegisterArgs {
    /// Account email address.
    #[arg(long)]
    pub(crate) email: String,
    /// Account username.
    #[arg(long)]
    pub(crate) username: String,
    /// Password; prompted for when omitted.
    #[arg(long, env = "BYTECAST_PASSWORD")]
    pub(crate) password: Option<String>,
}

#[derive(Args)]
pub(crate) struct LoginArgs {
    /// Username or email address.
    pub(crate) identifier: String,
    /// Password; prompted for when omitted.
    #[arg(long, env = "BYTECAST_PASSWORD")]
    pub(crate) password: Option<String>,
}

#[derive(Subcommand)]
pub(crate) enum WatchlistCommand {
    /// List watchlists with channel counts.
    Ls,
    /// Create a watchlist.
    Create(WatchlistDraftArgs),
    /// Update a watchlist's name, description, or color.
    Update(WatchlistUpdateArgs),
    /// Delete a watchlist.
    Rm(WatchlistIdArgs),
    /// Select the active watchlist.
    Use(WatchlistIdArgs),
}

#[derive(Args)]
pub(crate) struct WatchlistDraftArgs {
    /// Display name.
    #[arg(long)]
    pub(crate) name: String,
    /// Free-form description.
    #[arg(long)]
    pub(crate) description: Option<String>,
    /// Display color as a 6-digit hex code, e.g. #FF0000.
    #[arg(long)]
    pub(crate) color: String,
}

#[derive(Args)]
pub(crate) struct WatchlistUpdateArgs {
    /// Watchlist id.
    pub(crate) id: u64,
    #[command(flatten)]
    pub(crate) draft: WatchlistDraftArgs,
}

#[derive(Args)]
pub(crate) struct WatchlistIdArgs {
    /// Watchlist id.
    pub(crate) id: u64,
}

#[derive(Subcommand)]
pub(crate) enum ChannelCommand {
    /// Search YouTube channels.
    Search(SearchArgs),
    /// Add a channel to a watchlist.
    Add(ChannelAddArgs),
    /// Remove a channel from the active watchlist.
    Rm(ChannelRmArgs),
}

#[derive(Args)]
pub(crate) struct SearchArgs {
    /// Search query.
    pub(crate) query: String,
}

#[derive(Args)]
pub(crate) struct ChannelAddArgs {
    /// YouTube channel id or channel URL.
    pub(crate) channel: String,
    /// Target watchlist id; defaults to the active watchlist.
    #[arg(long)]
    pub(crate) watchlist: Option<u64>,
}

#[derive(Args)]
pub(crate) struct ChannelRmArgs {
    /// Record id of the channel, as shown by `bytecast channels`.
    pub(crate) id: u64,
}

#[derive(Subcommand)]
pub(crate) enum ThemeCommand {
    /// Print the stored preference.
    Get,
    /// Persist a preference.
    Set(ThemeSetArgs),
}

#[derive(Args)]
pub(crate) struct ThemeSetArgs {
    /// Theme to persist.
    #[arg(value_enum)]
    pub(crate) mode: ThemeArg,
}

/// Theme preference accepted on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum ThemeArg {
    /// Always light.
    Light,
    /// Always dark.
    Dark,
    /// Follow the platform preference.
    System,
}

/// Parses CLI arguments, executes the requested command, and reports the
/// outcome. Returns the process exit code.
pub async fn run() -> i32 {
    init_tracing();
    let cli = Cli::parse();
    match dispatch(cli).await {
        Ok(()) => 0,
        Err(error) => {
            eprintln!("error: {}", error.display_message());
            error.exit_code()
        }
    }
}

async fn dispatch(cli: Cli) -> CliResult<()> {
    let ctx = AppContext::from_cli(&cli)?;
    match cli.command {
        Command::Register(args) => auth::handle_register(&ctx, args).await,
        Command::Login(args) => auth::handle_login(&ctx, args).await,
        Command::Logout => auth::handle_logout(&ctx).await,
        Command::Status => auth::handle_status(&ctx),
        Command::Watchlist(command) => match command {
            WatchlistCommand::Ls => watchlists::handle_list(&ctx).await,
            WatchlistCommand::Create(args) => watchlists::handle_create(&ctx, args).await,
            WatchlistCommand::Update(args) => watchlists::handle_update(&ctx, args).await,
            WatchlistCommand::Rm(args) => watchlists::handle_remove(&ctx, args).await,
            WatchlistCommand::Use(args) => watchlists::handle_select(&ctx, args).await,
        },
        Command::Channels => channels::handle_active_channels(&ctx).await,
        Command::Channel(command) => match command {
            ChannelCommand::Search(args) => channels::handle_search(&ctx, args).await,
            ChannelCommand::Add(args) => channels::handle_add(&ctx, args).await,
            ChannelCommand::Rm(args) => channels::handle_remove(&ctx, args).await,
        },
        Command::Theme(command) => match command {
            ThemeCommand::Get => theme::handle_get(&ctx),
            ThemeCommand::Set(args) => theme::handle_set(&ctx, args),
        },
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
