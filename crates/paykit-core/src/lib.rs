//! paykit-core - Core types and traits for the paykit API client.
//!
//! The client itself lives in `paykit-http`; this crate defines the seams it
//! is built around: a [`CredentialStore`] holding the token pair and a
//! [`Transport`] that moves bytes to the backend.

pub mod credentials;
pub mod error;
pub mod request;
pub mod tokens;
pub mod traits;
pub mod types;

pub use credentials::Credentials;
pub use error::Error;
pub use request::{ApiRequest, ApiResponse, Method, TransportRequest, TransportResponse};
pub use tokens::{AccessToken, CredentialPair, RefreshToken};
pub use traits::{CredentialKey, CredentialStore, Transport};
pub use types::ApiUrl;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
