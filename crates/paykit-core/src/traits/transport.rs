//! Transport trait.

use async_trait::async_trait;

use crate::error::TransportError;
use crate::request::{TransportRequest, TransportResponse};

/// Sends a resolved request and returns the raw response.
///
/// Any response the server produced, including 4xx/5xx, is `Ok`; `Err` is
/// reserved for failures to get a response at all. Implementations must
/// honour [`TransportRequest::timeout`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: TransportRequest)
    -> Result<TransportResponse, TransportError>;
}
