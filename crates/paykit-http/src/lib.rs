//! paykit-http - Authenticated HTTP client with single-flight token refresh.
//!
//! [`AuthenticatedClient`] attaches the stored access token to every request.
//! When the backend answers 401 it renews the token exactly once, no matter
//! how many requests were rejected at the same time, and replays each of them
//! once. If the token cannot be renewed the stored credentials are cleared
//! and a [`SessionEvent::Ended`] is broadcast.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use paykit_core::{ApiRequest, ApiUrl};
//! use paykit_http::{AuthenticatedClient, ClientConfig};
//! use paykit_store::MemoryCredentialStore;
//!
//! # async fn example() -> paykit_core::Result<()> {
//! let config = ClientConfig::new(ApiUrl::new("https://api.example.com")?);
//! let client = AuthenticatedClient::with_reqwest(config, Arc::new(MemoryCredentialStore::new()))?;
//!
//! let response = client.request(ApiRequest::get("/transactions")).await?;
//! println!("{}", response.text());
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod endpoints;
mod events;
mod refresh;
mod transport;

pub use client::AuthenticatedClient;
pub use config::{
    ClientConfig, DEFAULT_LOGIN_PATH, DEFAULT_REFRESH_PATH, DEFAULT_REFRESH_TIMEOUT,
    DEFAULT_REQUEST_TIMEOUT,
};
pub use events::{SessionEndReason, SessionEvent};
pub use transport::ReqwestTransport;
