//! Logout command implementation.

use anyhow::{Context, Result};
use clap::Args;

use paykit_core::CredentialStore;

use crate::output;

#[derive(Args, Debug)]
pub struct LogoutArgs {}

pub async fn run(_args: LogoutArgs, store: &dyn CredentialStore) -> Result<()> {
    store
        .clear_all()
        .await
        .context("Failed to clear stored credentials")?;

    output::success("Logged out");

    Ok(())
}
