//! Login command implementation.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use paykit_core::Credentials;
use paykit_http::AuthenticatedClient;

use crate::output;

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Account identifier (email or phone)
    #[arg(long)]
    pub identifier: String,

    /// Account password
    #[arg(long, env = "PAYKIT_PASSWORD", hide_env_values = true)]
    pub password: String,
}

pub async fn run(args: LoginArgs, client: &AuthenticatedClient) -> Result<()> {
    let credentials = Credentials::new(&args.identifier, &args.password);

    eprintln!("{}", "Logging in...".dimmed());

    client
        .login(&credentials)
        .await
        .context("Failed to login")?;

    output::success("Logged in successfully");
    output::field("Identifier", &args.identifier);
    output::field("API", client.config().base_url.as_str());

    Ok(())
}
