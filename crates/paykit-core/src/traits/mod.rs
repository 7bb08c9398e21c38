//! Core traits for credential storage and transport.

mod store;
mod transport;

pub use store::{CredentialKey, CredentialStore};
pub use transport::Transport;
