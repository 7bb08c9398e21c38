//! Shared fixtures: a scripted transport and client constructors.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use paykit_core::error::TransportError;
use paykit_core::{
    ApiUrl, CredentialPair, Transport, TransportRequest, TransportResponse,
};
use paykit_http::{AuthenticatedClient, ClientConfig};
use paykit_store::MemoryCredentialStore;

pub const REFRESH_PATH: &str = "/auth/refresh";

/// How the scripted backend answers the refresh endpoint.
#[derive(Debug, Clone)]
pub enum RefreshScript {
    /// 200 with this access token; the API accepts it afterwards.
    Issue(String),
    /// Arbitrary status and JSON body.
    Respond(u16, Value),
    /// Transport failure.
    NetworkError,
    /// Never answers.
    Hang,
}

/// How the scripted backend answers ordinary API calls.
#[derive(Debug, Clone)]
pub enum ApiScript {
    /// 200 if the bearer token is the currently valid one, else 401.
    RequireValidToken,
    /// Always this status.
    Status(u16),
    /// Always a transport timeout.
    NetworkError,
}

/// In-process backend with call counters.
pub struct ScriptedTransport {
    valid_token: Mutex<String>,
    api: Mutex<ApiScript>,
    refresh: Mutex<RefreshScript>,
    refresh_delay: Duration,
    refresh_calls: AtomicUsize,
    api_calls: AtomicUsize,
    seen_auth: Mutex<Vec<Option<String>>>,
    refresh_bodies: Mutex<Vec<TransportRequest>>,
}

impl ScriptedTransport {
    pub fn new(valid_token: &str, refresh: RefreshScript) -> Self {
        Self {
            valid_token: Mutex::new(valid_token.to_string()),
            api: Mutex::new(ApiScript::RequireValidToken),
            refresh: Mutex::new(refresh),
            refresh_delay: Duration::ZERO,
            refresh_calls: AtomicUsize::new(0),
            api_calls: AtomicUsize::new(0),
            seen_auth: Mutex::new(Vec::new()),
            refresh_bodies: Mutex::new(Vec::new()),
        }
    }

    pub fn with_refresh_delay(mut self, delay: Duration) -> Self {
        self.refresh_delay = delay;
        self
    }

    pub fn with_api(self, script: ApiScript) -> Self {
        *self.api.lock().unwrap() = script;
        self
    }

    /// Change how later refresh calls are answered.
    pub fn set_refresh(&self, script: RefreshScript) {
        *self.refresh.lock().unwrap() = script;
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn api_calls(&self) -> usize {
        self.api_calls.load(Ordering::SeqCst)
    }

    pub fn seen_auth(&self) -> Vec<Option<String>> {
        self.seen_auth.lock().unwrap().clone()
    }

    pub fn refresh_requests(&self) -> Vec<TransportRequest> {
        self.refresh_bodies.lock().unwrap().clone()
    }

    async fn answer_refresh(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        self.refresh_bodies.lock().unwrap().push(request);

        if !self.refresh_delay.is_zero() {
            tokio::time::sleep(self.refresh_delay).await;
        }

        let script = self.refresh.lock().unwrap().clone();
        match script {
            RefreshScript::Issue(token) => {
                *self.valid_token.lock().unwrap() = token.clone();
                Ok(TransportResponse::json(200, &json!({ "access_token": token })))
            }
            RefreshScript::Respond(status, body) => Ok(TransportResponse::json(status, &body)),
            RefreshScript::NetworkError => Err(TransportError::Connection {
                message: "connection reset".to_string(),
            }),
            RefreshScript::Hang => std::future::pending().await,
        }
    }

    fn answer_api(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError> {
        self.api_calls.fetch_add(1, Ordering::SeqCst);
        let auth = request.header("authorization").map(str::to_string);
        self.seen_auth.lock().unwrap().push(auth.clone());

        let script = self.api.lock().unwrap().clone();
        match script {
            ApiScript::RequireValidToken => {
                let expected = format!("Bearer {}", self.valid_token.lock().unwrap());
                if auth.as_deref() == Some(expected.as_str()) {
                    Ok(TransportResponse::json(200, &json!({ "ok": true })))
                } else {
                    Ok(TransportResponse::json(401, &json!({ "error": "ExpiredToken" })))
                }
            }
            ApiScript::Status(status) => Ok(TransportResponse::new(status, "scripted")),
            ApiScript::NetworkError => Err(TransportError::Timeout {
                duration_ms: request.timeout.as_millis() as u64,
            }),
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(
        &self,
        request: TransportRequest,
    ) -> Result<TransportResponse, TransportError> {
        if request.url.ends_with(REFRESH_PATH) {
            self.answer_refresh(request).await
        } else {
            self.answer_api(&request)
        }
    }
}

pub fn config() -> ClientConfig {
    ClientConfig::new(ApiUrl::new("https://api.example.com").unwrap())
        .with_refresh_path(REFRESH_PATH)
}

/// Client whose store holds ("stale", "refresh-1").
pub fn client_with(
    transport: ScriptedTransport,
) -> (AuthenticatedClient, Arc<ScriptedTransport>, Arc<MemoryCredentialStore>) {
    let store = Arc::new(MemoryCredentialStore::with_pair(&CredentialPair::new(
        "stale",
        "refresh-1",
    )));
    client_with_store(transport, store)
}

pub fn client_with_store(
    transport: ScriptedTransport,
    store: Arc<MemoryCredentialStore>,
) -> (AuthenticatedClient, Arc<ScriptedTransport>, Arc<MemoryCredentialStore>) {
    let transport = Arc::new(transport);
    let client = AuthenticatedClient::new(config(), transport.clone(), store.clone());
    (client, transport, store)
}
