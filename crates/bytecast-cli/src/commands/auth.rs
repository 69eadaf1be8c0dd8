//! Session commands: register, login, logout, status.

use std::io::{self, IsTerminal};

use bytecast_api_models::{LoginRequest, RegisterRequest};

use crate::cli::{LoginArgs, RegisterArgs};
use crate::client::{AppContext, CliError, CliResult, classify_client};

pub(crate) async fn handle_register(ctx: &AppContext, args: RegisterArgs) -> CliResult<()> {
    let password = resolve_password(args.password)?;
    ctx.gateway
        .register(&RegisterRequest {
            email: args.email,
            username: args.username.clone(),
            password,
        })
        .await
        .map_err(classify_client)?;
    println!("Account '{}' created; you are signed in.", args.username);
    Ok(())
}

pub(crate) async fn handle_login(ctx: &AppContext, args: LoginArgs) -> CliResult<()> {
    let password = resolve_password(args.password)?;
    ctx.gateway
        .login(&LoginRequest {
            identifier: args.identifier.clone(),
            password,
        })
        .await
        .map_err(classify_client)?;
    println!("Signed in as '{}'.", args.identifier);
    Ok(())
}

pub(crate) async fn handle_logout(ctx: &AppContext) -> CliResult<()> {
    ctx.gateway.logout().await.map_err(CliError::failure)?;
    println!("Signed out.");
    Ok(())
}

pub(crate) fn handle_status(ctx: &AppContext) -> CliResult<()> {
    if ctx.tokens.is_authenticated() {
        println!("Signed in; the stored token is current.");
    } else if ctx.tokens.token().is_some() {
        println!("Signed out; the stored token is expired or malformed.");
    } else {
        println!("Signed out.");
    }
    Ok(())
}

fn resolve_password(provided: Option<String>) -> CliResult<String> {
    if let Some(value) = provided {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(CliError::validation("password cannot be empty"));
        }
        return Ok(trimmed.to_string());
    }

    if io::stdin().is_terminal() {
        let pass = rpassword::prompt_password("Password: ")
            .map_err(|err| CliError::failure(anyhow::anyhow!("failed to read password: {err}")))?;
        let trimmed = pass.trim();
        if trimmed.is_empty() {
            return Err(CliError::validation("password cannot be empty"));
        }
        Ok(trimmed.to_string())
    } else {
        Err(CliError::validation(
            "password required; supply via --password when running non-interactively",
        ))
    }
}
