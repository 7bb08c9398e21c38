//! Subcommand implementations.

pub mod login;
pub mod logout;
pub mod refresh;
pub mod request;
pub mod status;

use std::future::Future;

use anyhow::{Result, anyhow};
use tracing::debug;

use paykit_http::{AuthenticatedClient, SessionEndReason, SessionEvent};

use crate::cli::{Cli, Commands};
use crate::output;
use crate::session;

pub async fn handle(cli: Cli) -> Result<()> {
    let global = cli.global;
    let store = session::open_store(&global)?;
    debug!(path = %store.path().display(), "Using credential file");

    match cli.command {
        Commands::Login(args) => {
            let client = session::client(&global, store)?;
            login::run(args, &client).await
        }
        Commands::Request(args) => {
            let client = session::client(&global, store)?;
            watch_session(&client, request::run(args, &client)).await
        }
        Commands::Refresh(args) => {
            let client = session::client(&global, store)?;
            watch_session(&client, refresh::run(args, &client)).await
        }
        Commands::Logout(args) => logout::run(args, store.as_ref()).await,
        Commands::Status(args) => status::run(args, &global, store.as_ref()).await,
    }
}

/// Run a command, telling the user to log in again if the session ends.
async fn watch_session<F>(client: &AuthenticatedClient, command: F) -> Result<()>
where
    F: Future<Output = Result<()>>,
{
    let mut events = client.subscribe();
    let result = command.await;

    while let Ok(event) = events.try_recv() {
        if let SessionEvent::Ended {
            reason: SessionEndReason::RefreshFailed(failure),
        } = event
        {
            output::error(&format!("Session ended: {}", failure));
            output::hint("Run 'paykit login' to sign in again.");
            return Err(result.err().unwrap_or_else(|| anyhow!("session ended")));
        }
    }

    result
}
