//! Client configuration.

use std::time::Duration;

use paykit_core::ApiUrl;

/// Default timeout for ordinary requests.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default upper bound for a whole refresh sequence.
pub const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_secs(15);

/// Default token refresh endpoint.
pub const DEFAULT_REFRESH_PATH: &str = "/auth/refresh";

/// Default login endpoint.
pub const DEFAULT_LOGIN_PATH: &str = "/auth/login";

/// Configuration for an [`AuthenticatedClient`](crate::AuthenticatedClient).
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// use paykit_core::ApiUrl;
/// use paykit_http::ClientConfig;
///
/// let config = ClientConfig::new(ApiUrl::new("https://api.example.com").unwrap())
///     .with_refresh_path("/v2/token/refresh")
///     .with_refresh_timeout(Duration::from_secs(5));
/// assert_eq!(config.refresh_path, "/v2/token/refresh");
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL; request paths are resolved against it.
    pub base_url: ApiUrl,
    /// Timeout applied to every request, including login.
    pub request_timeout: Duration,
    /// Bound on the refresh sequence, store access included.
    pub refresh_timeout: Duration,
    /// Path of the token refresh endpoint.
    pub refresh_path: String,
    /// Path of the login endpoint.
    pub login_path: String,
    /// `User-Agent` sent by [`ReqwestTransport`](crate::ReqwestTransport).
    pub user_agent: String,
}

impl ClientConfig {
    pub fn new(base_url: ApiUrl) -> Self {
        Self {
            base_url,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            refresh_timeout: DEFAULT_REFRESH_TIMEOUT,
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            user_agent: concat!("paykit/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout = timeout;
        self
    }

    pub fn with_refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = path.into();
        self
    }

    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}
