//! Error types for paykit.
//!
//! This module provides a unified error type with explicit variants for
//! transport, HTTP, authentication, storage and input validation errors.
//! Callers can tell "the network failed" ([`Error::Transport`]) apart from
//! "the server rejected this request" ([`Error::Http`]) and "the user must log
//! in again" ([`AuthError::SessionExpired`]).

use std::fmt;
use thiserror::Error;

/// The unified error type for paykit operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Network transport errors (DNS, TLS, connection, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A non-success HTTP response that was not recovered locally.
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    /// Authentication errors (rejected login, expired session).
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Credential store errors.
    #[error("credential store error: {0}")]
    Store(#[from] StoreError),

    /// A successful response body could not be decoded.
    #[error("failed to decode response: {message}")]
    Decode { message: String },

    /// Input validation errors (invalid URL, header, body).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),
}

impl Error {
    /// Returns true if the caller has to route the user back to login.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Error::Auth(AuthError::SessionExpired(_)))
    }

    /// Returns the HTTP status for [`Error::Http`] errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Http(err) => Some(err.status),
            _ => None,
        }
    }
}

/// Transport-level errors.
///
/// These never invalidate the session.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// DNS resolution failed.
    #[error("DNS resolution failed: {host}")]
    Dns { host: String },

    /// TLS/SSL error.
    #[error("TLS error: {message}")]
    Tls { message: String },

    /// Request timed out.
    #[error("request timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },
}

/// A non-success response passed through to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpError {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body, lossily decoded as UTF-8.
    pub body: String,
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(message) = self.message() {
            write!(f, ": {}", message)?;
        } else if !self.body.is_empty() {
            write!(f, ": {}", truncate(&self.body, 200))?;
        }
        Ok(())
    }
}

impl std::error::Error for HttpError {}

impl HttpError {
    /// Create a new HTTP error.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Check if this is an authentication rejection.
    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    /// Returns the `message` (or `error`) field of a JSON error body, if any.
    pub fn message(&self) -> Option<String> {
        let value: serde_json::Value = serde_json::from_str(&self.body).ok()?;
        value
            .get("message")
            .or_else(|| value.get("error"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Authentication-related errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Login was rejected by the server.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// The access token could not be renewed; the session is over.
    #[error("session expired: {0}")]
    SessionExpired(RefreshFailure),
}

/// Why a token refresh failed.
///
/// Every request waiting on the refresh receives its own copy.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RefreshFailure {
    /// No refresh token in the store; no network call was made.
    #[error("no refresh token available")]
    MissingRefreshToken,

    /// The refresh endpoint answered with a non-success status.
    #[error("refresh rejected with HTTP {status}")]
    Rejected { status: u16 },

    /// The refresh endpoint answered 2xx without an access token.
    #[error("refresh response did not contain an access token")]
    MissingAccessToken,

    /// The refresh call failed at the transport level.
    #[error("refresh request failed: {message}")]
    Transport { message: String },

    /// The refresh sequence did not finish in time.
    #[error("refresh timed out after {duration_ms}ms")]
    TimedOut { duration_ms: u64 },

    /// Reading or writing the credential store failed.
    #[error("credential store failed during refresh: {message}")]
    Store { message: String },

    /// The task running the refresh went away before finishing.
    #[error("refresh was interrupted")]
    Interrupted,
}

impl From<RefreshFailure> for Error {
    fn from(failure: RefreshFailure) -> Self {
        Error::Auth(AuthError::SessionExpired(failure))
    }
}

/// Credential store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem error.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Stored data could not be (de)serialized.
    #[error("corrupt credential data: {message}")]
    Corrupt { message: String },

    /// Backend-specific failure.
    #[error("{message}")]
    Other { message: String },
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid API base URL.
    #[error("invalid API URL '{value}': {reason}")]
    ApiUrl { value: String, reason: String },

    /// Invalid header name or value.
    #[error("invalid header '{name}': {reason}")]
    Header { name: String, reason: String },

    /// Request body could not be serialized.
    #[error("invalid request body: {reason}")]
    Body { reason: String },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}
