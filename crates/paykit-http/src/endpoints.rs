//! Auth endpoint request/response types.

use serde::{Deserialize, Serialize};

/// Response from the token refresh endpoint.
///
/// Both fields are optional on the wire; a missing `access_token` is a
/// refresh failure even on HTTP 200.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RefreshResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    /// Present when the backend rotates refresh tokens.
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Request body for the login endpoint.
#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub identifier: &'a str,
    pub password: &'a str,
}

/// Response from the login endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
}
