//! reqwest-backed transport.

use std::error::Error as _;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, instrument, trace};

use paykit_core::error::TransportError;
use paykit_core::{Method, Transport, TransportRequest, TransportResponse};

/// HTTP transport built on a shared [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport sending the given `User-Agent`.
    pub fn new(user_agent: &str) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| TransportError::Http {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self { client })
    }

    /// Wrap an already configured client.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, reqwest::Error> {
        let mut builder = self
            .client
            .request(method(request.method), &request.url)
            .timeout(request.timeout);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await?.to_vec();

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    async fn send(
        &self,
        request: TransportRequest,
    ) -> Result<TransportResponse, TransportError> {
        let timeout = request.timeout;
        let host = reqwest::Url::parse(&request.url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_default();

        debug!("Sending request");
        let response = self
            .execute(request)
            .await
            .map_err(|e| transport_error(&e, timeout, host))?;

        trace!(status = response.status, "Received response");
        Ok(response)
    }
}

fn method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

/// Classify a reqwest failure.
fn transport_error(err: &reqwest::Error, timeout: Duration, host: String) -> TransportError {
    if err.is_timeout() {
        return TransportError::Timeout {
            duration_ms: timeout.as_millis() as u64,
        };
    }

    let chain = error_chain(err);
    let lower = chain.to_ascii_lowercase();

    if err.is_connect() {
        if lower.contains("dns") || lower.contains("failed to lookup address") {
            TransportError::Dns { host }
        } else if lower.contains("certificate") || lower.contains("tls") {
            TransportError::Tls { message: chain }
        } else {
            TransportError::Connection { message: chain }
        }
    } else {
        TransportError::Http { message: chain }
    }
}

fn error_chain(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
