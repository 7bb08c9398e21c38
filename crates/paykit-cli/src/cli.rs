//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::commands::{login, logout, refresh, request, status};

/// Command-line client for a bearer-token API.
#[derive(Parser, Debug)]
#[command(name = "paykit")]
#[command(author, version = env!("PAYKIT_VERSION"), about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// API base URL
    #[arg(long, env = "PAYKIT_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, env = "PAYKIT_TIMEOUT_SECS", global = true)]
    pub timeout_secs: Option<u64>,

    /// Directory holding the stored credentials
    #[arg(long, env = "PAYKIT_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Exchange credentials for a token pair
    Login(login::LoginArgs),

    /// Send an authenticated request
    Request(request::RequestArgs),

    /// Refresh the access token now
    Refresh(refresh::RefreshArgs),

    /// Forget the stored tokens
    Logout(logout::LogoutArgs),

    /// Show what is stored for the session
    Status(status::StatusArgs),
}
