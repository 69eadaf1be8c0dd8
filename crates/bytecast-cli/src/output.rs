//! Output renderers and formatting helpers for CLI commands.

use serde_json::json;

use bytecast_api_models::{Channel, Watchlist};
use bytecast_client::CacheSnapshot;

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult};

pub(crate) fn render_watchlists(snapshot: &CacheSnapshot, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => {
            let payload = json!({
                "watchlists": snapshot.watchlists,
                "active_id": snapshot.active_id,
                "channel_counts": snapshot
                    .channel_counts
                    .iter()
                    .map(|(id, count)| (id.to_string(), json!(count)))
                    .collect::<serde_json::Map<String, serde_json::Value>>(),
            });
            print_json(&payload)?;
        }
        OutputFormat::Table => {
            println!("{:<6} {:<24} {:<8} {:>8}  ACTIVE", "ID", "NAME", "COLOR", "CHANNELS");
            for watchlist in &snapshot.watchlists {
                let count = snapshot
                    .channel_counts
                    .get(&watchlist.id)
                    .copied()
                    .unwrap_or(0);
                let marker = if snapshot.active_id == Some(watchlist.id) {
                    "*"
                } else {
                    ""
                };
                println!(
                    "{:<6} {:<24} {:<8} {:>8}  {}",
                    watchlist.id, watchlist.name, watchlist.color, count, marker
                );
            }
        }
    }
    Ok(())
}

pub(crate) fn render_channels(
    watchlist: &Watchlist,
    channels: &[Channel],
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => {
            let payload = json!({
                "watchlist": watchlist,
                "channels": channels,
            });
            print_json(&payload)?;
        }
        OutputFormat::Table => {
            println!("Channels in '{}' ({}):", watchlist.name, channels.len());
            println!("{:<6} {:<26} NAME", "ID", "YOUTUBE_ID");
            for channel in channels {
                println!(
                    "{:<6} {:<26} {}",
                    channel.id,
                    channel.youtube_id,
                    channel.display_name()
                );
            }
        }
    }
    Ok(())
}

pub(crate) fn render_search(results: &[Channel], format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(&json!({ "results": results }))?,
        OutputFormat::Table => {
            if results.is_empty() {
                println!("No channels matched.");
                return Ok(());
            }
            println!("{:<26} TITLE", "YOUTUBE_ID");
            for channel in results {
                println!("{:<26} {}", channel.youtube_id, channel.title);
            }
        }
    }
    Ok(())
}

fn print_json(payload: &serde_json::Value) -> CliResult<()> {
    let text = serde_json::to_string_pretty(payload)
        .map_err(|err| CliError::failure(anyhow::anyhow!("failed to format JSON: {err}")))?;
    println!("{text}");
    Ok(())
}
