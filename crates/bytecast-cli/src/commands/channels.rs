//! Channel search and watchlist membership commands.

use crate::cli::{ChannelAddArgs, ChannelRmArgs, SearchArgs};
use crate::client::{AppContext, CliError, CliResult, classify_client};
use crate::output::{render_channels, render_search};

pub(crate) async fn handle_active_channels(ctx: &AppContext) -> CliResult<()> {
    let snapshot = ctx.cache.hydrate().await.map_err(classify_client)?;
    let Some(active) = snapshot.active_watchlist() else {
        return Err(CliError::validation(
            "no active watchlist; run `bytecast watchlist use <id>` first",
        ));
    };
    render_channels(active, &snapshot.channels, ctx.format)
}

pub(crate) async fn handle_search(ctx: &AppContext, args: SearchArgs) -> CliResult<()> {
    let results = ctx
        .cache
        .search_channels(&args.query)
        .await
        .map_err(classify_client)?;
    render_search(&results, ctx.format)
}

pub(crate) async fn handle_add(ctx: &AppContext, args: ChannelAddArgs) -> CliResult<()> {
    let snapshot = ctx.cache.hydrate().await.map_err(classify_client)?;
    let watchlist_id = match args.watchlist {
        Some(id) => {
            if !snapshot.watchlists.iter().any(|watchlist| watchlist.id == id) {
                return Err(CliError::validation(format!("watchlist {id} not found")));
            }
            id
        }
        None => snapshot.active_id.ok_or_else(|| {
            CliError::validation("no watchlist given and none is active; pass --watchlist")
        })?,
    };
    ctx.cache
        .add_channel(watchlist_id, &args.channel)
        .await
        .map_err(classify_client)?;
    let count = ctx
        .cache
        .snapshot()
        .channel_counts
        .get(&watchlist_id)
        .copied()
        .unwrap_or(0);
    println!("Added channel to watchlist {watchlist_id} ({count} channels).");
    Ok(())
}

pub(crate) async fn handle_remove(ctx: &AppContext, args: ChannelRmArgs) -> CliResult<()> {
    let snapshot = ctx.cache.hydrate().await.map_err(classify_client)?;
    let watchlist_id = snapshot.active_id.ok_or_else(|| {
        CliError::validation("no active watchlist; run `bytecast watchlist use <id>` first")
    })?;
    ctx.cache
        .remove_channel(args.id, watchlist_id)
        .await
        .map_err(classify_client)?;
    println!("Removed channel {} from watchlist {watchlist_id}.", args.id);
    Ok(())
}
