//! Authenticated API client.

use std::sync::Arc;

use reqwest::header::{HeaderName, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

use paykit_core::error::{AuthError, HttpError, InvalidInputError, RefreshFailure};
use paykit_core::{
    AccessToken, ApiRequest, ApiResponse, CredentialKey, CredentialPair, CredentialStore,
    Credentials, Error, Method, Result, Transport, TransportRequest, TransportResponse,
};

use crate::config::ClientConfig;
use crate::endpoints::{LoginRequest, LoginResponse, RefreshResponse};
use crate::events::{SessionEndReason, SessionEvent};
use crate::refresh::{self, RefreshCoordinator, Ticket};
use crate::transport::ReqwestTransport;

/// Capacity of the session event channel.
const EVENT_CAPACITY: usize = 16;

/// HTTP client that attaches bearer tokens and recovers from token expiry.
///
/// The client never caches tokens: the access token is read from the
/// [`CredentialStore`] before every attempt and written back after a
/// successful refresh.
///
/// # Thread Safety
///
/// Clients are cheap to clone (they use internal `Arc`) and are safe to share
/// across tasks. All clones share one refresh coordinator, so concurrent
/// requests rejected with 401 trigger a single refresh.
#[derive(Clone)]
pub struct AuthenticatedClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    store: Arc<dyn CredentialStore>,
    refresh: RefreshCoordinator,
    events: broadcast::Sender<SessionEvent>,
}

impl AuthenticatedClient {
    /// Create a client over an arbitrary transport and store.
    pub fn new(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        store: Arc<dyn CredentialStore>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(ClientInner {
                config,
                transport,
                store,
                refresh: RefreshCoordinator::default(),
                events,
            }),
        }
    }

    /// Create a client using [`ReqwestTransport`].
    pub fn with_reqwest(config: ClientConfig, store: Arc<dyn CredentialStore>) -> Result<Self> {
        let transport = ReqwestTransport::new(&config.user_agent)?;
        Ok(Self::new(config, Arc::new(transport), store))
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Returns the credential store backing this client.
    pub fn store(&self) -> &dyn CredentialStore {
        self.inner.store.as_ref()
    }

    /// Subscribe to session lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Returns true while a token refresh is in flight.
    pub fn is_refreshing(&self) -> bool {
        self.inner.refresh.is_refreshing()
    }

    /// Returns true if a refresh token is stored.
    pub async fn has_session(&self) -> Result<bool> {
        Ok(self
            .inner
            .store
            .get(CredentialKey::RefreshToken)
            .await?
            .is_some())
    }

    // ========================================================================
    // Requests
    // ========================================================================

    /// Execute a request with the stored access token.
    ///
    /// A 401 is recovered once: the token is refreshed (or an in-flight
    /// refresh is awaited) and the request is replayed. A second 401 is
    /// returned as [`Error::Http`]. Failure to refresh ends the session and
    /// returns [`AuthError::SessionExpired`]. Transport errors and every
    /// other status are returned unchanged and never touch the credentials.
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn request(&self, request: ApiRequest) -> Result<ApiResponse> {
        validate_headers(&request)?;

        let mut retried = false;
        loop {
            let generation = self.inner.refresh.generation();
            let token = self.access_token().await?;

            let response = self.send(&request, token.as_ref()).await?;

            if response.status != 401 || retried {
                return into_result(response);
            }

            retried = true;
            debug!("Access token rejected, recovering");
            self.recover(Some(generation)).await?;
            debug!("Replaying request");
        }
    }

    /// GET `path` and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request(ApiRequest::get(path)).await?.json()
    }

    /// POST `body` as JSON to `path` and decode the JSON response.
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(ApiRequest::post(path).json(body)?)
            .await?
            .json()
    }

    /// PUT `body` as JSON to `path` and decode the JSON response.
    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(ApiRequest::put(path).json(body)?)
            .await?
            .json()
    }

    /// DELETE `path`, ignoring any response body.
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.request(ApiRequest::delete(path)).await.map(|_| ())
    }

    // ========================================================================
    // Session management
    // ========================================================================

    /// Exchange credentials for a token pair and store it.
    #[instrument(skip(self, credentials), fields(identifier = %credentials.identifier()))]
    pub async fn login(&self, credentials: &Credentials) -> Result<()> {
        info!("Logging in");

        let body = serde_json::to_value(LoginRequest {
            identifier: credentials.identifier(),
            password: credentials.password(),
        })
        .map_err(|e| InvalidInputError::Body {
            reason: e.to_string(),
        })?;

        let response = self
            .inner
            .transport
            .send(TransportRequest {
                method: Method::Post,
                url: self.inner.config.base_url.endpoint(&self.inner.config.login_path),
                query: Vec::new(),
                headers: Vec::new(),
                body: Some(body),
                timeout: self.inner.config.request_timeout,
            })
            .await?;

        if matches!(response.status, 401 | 403) {
            let error = HttpError::new(response.status, lossy(&response.body));
            return Err(AuthError::InvalidCredentials(
                error.message().unwrap_or_else(|| error.to_string()),
            )
            .into());
        }
        if !(200..300).contains(&response.status) {
            return Err(HttpError::new(response.status, lossy(&response.body)).into());
        }

        let tokens: LoginResponse =
            serde_json::from_slice(&response.body).map_err(|e| Error::Decode {
                message: format!("login response: {}", e),
            })?;

        self.inner
            .store
            .save_pair(&CredentialPair::new(tokens.access_token, tokens.refresh_token))
            .await?;

        debug!("Login succeeded");
        Ok(())
    }

    /// Refresh the access token now.
    ///
    /// Joins a refresh that is already running instead of starting another.
    pub async fn refresh(&self) -> Result<()> {
        self.recover(None).await
    }

    /// Clear stored credentials and announce the end of the session.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<()> {
        info!("Logging out");
        self.inner.store.clear_all().await?;
        self.emit(SessionEvent::Ended {
            reason: SessionEndReason::LoggedOut,
        });
        Ok(())
    }

    // ========================================================================
    // Internals
    // ========================================================================

    async fn access_token(&self) -> Result<Option<AccessToken>> {
        Ok(self
            .inner
            .store
            .get(CredentialKey::AccessToken)
            .await?
            .filter(|t| !t.is_empty())
            .map(AccessToken::new))
    }

    async fn send(
        &self,
        request: &ApiRequest,
        token: Option<&AccessToken>,
    ) -> Result<TransportResponse> {
        let mut headers: Vec<(String, String)> = request
            .headers
            .iter()
            .filter(|(name, _)| token.is_none() || !name.eq_ignore_ascii_case("authorization"))
            .cloned()
            .collect();
        if let Some(token) = token {
            headers.push(("Authorization".to_string(), token.bearer()));
        }

        let transport_request = TransportRequest {
            method: request.method,
            url: self.inner.config.base_url.endpoint(&request.path),
            query: request.query.clone(),
            headers,
            body: request.body.clone(),
            timeout: self.inner.config.request_timeout,
        };

        Ok(self.inner.transport.send(transport_request).await?)
    }

    /// Wait for, or perform, a token refresh.
    ///
    /// A waiter whose leader was cancelled rejoins the coordinator and may
    /// become the next leader, so an interrupted refresh never reaches the
    /// caller as an expired session.
    async fn recover(&self, seen_generation: Option<u64>) -> Result<()> {
        loop {
            match self.inner.refresh.join(seen_generation) {
                Ticket::Stale => {
                    debug!("Token was refreshed since this request was sent");
                    return Ok(());
                }
                Ticket::Follower(rx) => {
                    debug!("Refresh already in flight, waiting");
                    match refresh::wait(rx).await {
                        Ok(()) => return Ok(()),
                        Err(RefreshFailure::Interrupted) => {
                            debug!("Refresh leader went away, rejoining");
                        }
                        Err(failure) => return Err(failure.into()),
                    }
                }
                Ticket::Leader(guard) => {
                    let outcome = self.run_refresh().await;
                    if let Err(failure) = &outcome {
                        self.clear_credentials(failure).await;
                    }

                    return match guard.finish(outcome) {
                        Ok(()) => {
                            self.emit(SessionEvent::Refreshed);
                            Ok(())
                        }
                        Err(failure) => {
                            self.emit(SessionEvent::Ended {
                                reason: SessionEndReason::RefreshFailed(failure.clone()),
                            });
                            Err(failure.into())
                        }
                    };
                }
            }
        }
    }

    /// The refresh sequence, bounded by `refresh_timeout`.
    async fn run_refresh(&self) -> std::result::Result<(), RefreshFailure> {
        let limit = self.inner.config.refresh_timeout;
        match tokio::time::timeout(limit, self.refresh_sequence()).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(timeout_ms = limit.as_millis() as u64, "Token refresh timed out");
                Err(RefreshFailure::TimedOut {
                    duration_ms: limit.as_millis() as u64,
                })
            }
        }
    }

    #[instrument(skip(self))]
    async fn refresh_sequence(&self) -> std::result::Result<(), RefreshFailure> {
        info!("Refreshing access token");

        let refresh_token = self
            .inner
            .store
            .get(CredentialKey::RefreshToken)
            .await
            .map_err(store_failure)?
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                warn!("No refresh token stored");
                RefreshFailure::MissingRefreshToken
            })?;

        let response = self
            .inner
            .transport
            .send(TransportRequest {
                method: Method::Post,
                url: self
                    .inner
                    .config
                    .base_url
                    .endpoint(&self.inner.config.refresh_path),
                query: Vec::new(),
                headers: Vec::new(),
                body: Some(json!({ "refresh_token": refresh_token })),
                timeout: self.inner.config.refresh_timeout,
            })
            .await
            .map_err(|e| {
                warn!(error = %e, "Refresh request failed");
                RefreshFailure::Transport {
                    message: e.to_string(),
                }
            })?;

        if !(200..300).contains(&response.status) {
            warn!(status = response.status, "Refresh rejected");
            return Err(RefreshFailure::Rejected {
                status: response.status,
            });
        }

        let tokens: RefreshResponse = serde_json::from_slice(&response.body).unwrap_or_default();
        let access_token = tokens
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                warn!("Refresh response carried no access token");
                RefreshFailure::MissingAccessToken
            })?;

        self.inner
            .store
            .set(CredentialKey::AccessToken, &access_token)
            .await
            .map_err(store_failure)?;

        if let Some(rotated) = tokens.refresh_token.filter(|t| !t.is_empty()) {
            debug!("Storing rotated refresh token");
            self.inner
                .store
                .set(CredentialKey::RefreshToken, &rotated)
                .await
                .map_err(store_failure)?;
        }

        info!("Access token refreshed");
        Ok(())
    }

    async fn clear_credentials(&self, failure: &RefreshFailure) {
        info!(reason = %failure, "Ending session");
        if let Err(e) = self.inner.store.clear_all().await {
            warn!(error = %e, "Failed to clear stored credentials");
        }
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.inner.events.send(event);
    }
}

fn store_failure(err: Error) -> RefreshFailure {
    RefreshFailure::Store {
        message: err.to_string(),
    }
}

fn lossy(body: &[u8]) -> String {
    String::from_utf8_lossy(body).into_owned()
}

fn into_result(response: TransportResponse) -> Result<ApiResponse> {
    if response.is_success() {
        Ok(response.into())
    } else {
        Err(HttpError::new(response.status, lossy(&response.body)).into())
    }
}

fn validate_headers(request: &ApiRequest) -> Result<()> {
    for (name, value) in &request.headers {
        HeaderName::from_bytes(name.as_bytes()).map_err(|e| InvalidInputError::Header {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        HeaderValue::from_str(value).map_err(|e| InvalidInputError::Header {
            name: name.clone(),
            reason: e.to_string(),
        })?;
    }
    Ok(())
}

// Custom Debug impl that hides sensitive data
impl std::fmt::Debug for AuthenticatedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticatedClient")
            .field("base_url", &self.inner.config.base_url.as_str())
            .field("refreshing", &self.is_refreshing())
            .finish()
    }
}
