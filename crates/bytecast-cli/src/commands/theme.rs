//! Theme preference commands.

use bytecast_client::{ThemeMode, theme};

use crate::cli::{ThemeArg, ThemeSetArgs};
use crate::client::{AppContext, CliError, CliResult};

pub(crate) fn handle_get(ctx: &AppContext) -> CliResult<()> {
    println!("{}", theme::load_theme(&ctx.store).as_str());
    Ok(())
}

pub(crate) fn handle_set(ctx: &AppContext, args: ThemeSetArgs) -> CliResult<()> {
    let mode = match args.mode {
        ThemeArg::Light => ThemeMode::Light,
        ThemeArg::Dark => ThemeMode::Dark,
        ThemeArg::System => ThemeMode::System,
    };
    theme::store_theme(&ctx.store, mode).map_err(CliError::failure)?;
    println!("Theme preference set to {}.", mode.as_str());
    Ok(())
}
