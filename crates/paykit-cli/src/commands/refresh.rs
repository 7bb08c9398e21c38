//! Refresh command implementation.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use paykit_http::AuthenticatedClient;

use crate::output;

#[derive(Args, Debug)]
pub struct RefreshArgs {}

pub async fn run(_args: RefreshArgs, client: &AuthenticatedClient) -> Result<()> {
    if !client.has_session().await? {
        anyhow::bail!("No active session. Run 'paykit login' first.");
    }

    eprintln!("{}", "Refreshing session...".dimmed());

    client
        .refresh()
        .await
        .context("Failed to refresh session")?;

    output::success("Session refreshed successfully");

    Ok(())
}
