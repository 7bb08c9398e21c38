//! Session lifecycle notifications.

use paykit_core::error::RefreshFailure;

/// Broadcast to every [`subscribe`](crate::AuthenticatedClient::subscribe)r.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A new access token was stored.
    Refreshed,
    /// Stored credentials were cleared; the user has to log in again.
    Ended { reason: SessionEndReason },
}

/// Why a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEndReason {
    /// The access token could not be renewed.
    RefreshFailed(RefreshFailure),
    /// The application logged out explicitly.
    LoggedOut,
}
