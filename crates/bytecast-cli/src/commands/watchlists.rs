//! Watchlist management commands.

use bytecast_api_models::WatchlistDraft;

use crate::cli::{WatchlistDraftArgs, WatchlistIdArgs, WatchlistUpdateArgs};
use crate::client::{AppContext, CliError, CliResult, classify_client};
use crate::output::render_watchlists;

pub(crate) async fn handle_list(ctx: &AppContext) -> CliResult<()> {
    let snapshot = ctx.cache.hydrate().await.map_err(classify_client)?;
    render_watchlists(&snapshot, ctx.format)
}

pub(crate) async fn handle_create(ctx: &AppContext, args: WatchlistDraftArgs) -> CliResult<()> {
    let draft = draft_from(args)?;
    let created = ctx
        .cache
        .create_watchlist(&draft)
        .await
        .map_err(classify_client)?;
    println!("Created watchlist '{}' (id {}).", created.name, created.id);
    Ok(())
}

pub(crate) async fn handle_update(ctx: &AppContext, args: WatchlistUpdateArgs) -> CliResult<()> {
    let draft = draft_from(args.draft)?;
    let updated = ctx
        .cache
        .update_watchlist(args.id, &draft)
        .await
        .map_err(classify_client)?;
    println!("Updated watchlist '{}' (id {}).", updated.name, updated.id);
    Ok(())
}

pub(crate) async fn handle_remove(ctx: &AppContext, args: WatchlistIdArgs) -> CliResult<()> {
    ctx.cache.hydrate().await.map_err(classify_client)?;
    ctx.cache
        .delete_watchlist(args.id)
        .await
        .map_err(classify_client)?;
    println!("Deleted watchlist {}.", args.id);
    Ok(())
}

pub(crate) async fn handle_select(ctx: &AppContext, args: WatchlistIdArgs) -> CliResult<()> {
    let snapshot = ctx.cache.hydrate().await.map_err(classify_client)?;
    let target = snapshot
        .watchlists
        .iter()
        .find(|watchlist| watchlist.id == args.id)
        .ok_or_else(|| CliError::validation(format!("watchlist {} not found", args.id)))?;
    ctx.cache
        .select_watchlist(Some(target))
        .await
        .map_err(classify_client)?;
    let count = ctx
        .cache
        .snapshot()
        .channel_counts
        .get(&args.id)
        .copied()
        .unwrap_or(0);
    println!("Active watchlist is now '{}' ({count} channels).", target.name);
    Ok(())
}

fn draft_from(args: WatchlistDraftArgs) -> CliResult<WatchlistDraft> {
    let draft = WatchlistDraft {
        name: args.name,
        description: args.description,
        color: args.color,
    };
    draft.validate().map_err(CliError::validation)?;
    Ok(draft)
}
