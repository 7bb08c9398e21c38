//! Status command implementation.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;

use paykit_core::{CredentialKey, CredentialStore};
use paykit_store::FileCredentialStore;

use crate::cli::GlobalArgs;
use crate::output;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Print the status as JSON
    #[arg(long)]
    pub json: bool,
}

/// What is stored for the session. Never includes token values.
#[derive(Debug, Serialize)]
struct StatusReport {
    api_url: Option<String>,
    credentials_file: String,
    access_token: bool,
    refresh_token: bool,
    updated_at: Option<DateTime<Utc>>,
}

pub async fn run(args: StatusArgs, global: &GlobalArgs, store: &FileCredentialStore) -> Result<()> {
    let report = StatusReport {
        api_url: global.api_url.clone(),
        credentials_file: store.path().display().to_string(),
        access_token: stored(store, CredentialKey::AccessToken).await?,
        refresh_token: stored(store, CredentialKey::RefreshToken).await?,
        updated_at: store
            .updated_at()
            .context("Failed to read credential file")?,
    };

    if args.json {
        return output::json_pretty(&report);
    }

    output::field("API", report.api_url.as_deref().unwrap_or("(not set)"));
    output::field("Credentials", &report.credentials_file);
    output::field("Access token", output::presence(report.access_token));
    output::field("Refresh token", output::presence(report.refresh_token));
    output::field(
        "Updated",
        &report
            .updated_at
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "never".to_string()),
    );

    if !report.refresh_token {
        output::hint("No active session. Run 'paykit login' first.");
    }

    Ok(())
}

async fn stored(store: &FileCredentialStore, key: CredentialKey) -> Result<bool> {
    Ok(store
        .get(key)
        .await
        .context("Failed to read credential file")?
        .is_some_and(|v| !v.is_empty()))
}
