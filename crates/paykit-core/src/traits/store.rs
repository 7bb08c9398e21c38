//! Credential store trait.

use std::fmt;

use async_trait::async_trait;

use crate::Result;
use crate::tokens::CredentialPair;

/// Key under which a token is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialKey {
    AccessToken,
    RefreshToken,
}

impl CredentialKey {
    /// Storage key name.
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialKey::AccessToken => "access_token",
            CredentialKey::RefreshToken => "refresh_token",
        }
    }
}

impl fmt::Display for CredentialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Secure storage for the access/refresh token pair.
///
/// The store is the single source of truth for tokens: the client reads the
/// access token before every request and never keeps its own copy.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Read a stored value.
    async fn get(&self, key: CredentialKey) -> Result<Option<String>>;

    /// Store a value, replacing any previous one.
    async fn set(&self, key: CredentialKey, value: &str) -> Result<()>;

    /// Remove a value. Removing a missing key is not an error.
    async fn clear(&self, key: CredentialKey) -> Result<()>;

    /// Read both tokens; `None` unless both are present.
    async fn load_pair(&self) -> Result<Option<CredentialPair>> {
        let access = self.get(CredentialKey::AccessToken).await?;
        let refresh = self.get(CredentialKey::RefreshToken).await?;
        Ok(match (access, refresh) {
            (Some(access), Some(refresh)) => Some(CredentialPair::new(access, refresh)),
            _ => None,
        })
    }

    /// Store both tokens.
    async fn save_pair(&self, pair: &CredentialPair) -> Result<()> {
        self.set(CredentialKey::AccessToken, pair.access_token.as_str())
            .await?;
        self.set(CredentialKey::RefreshToken, pair.refresh_token.as_str())
            .await
    }

    /// Remove both tokens.
    ///
    /// Both keys are attempted even if the first removal fails; the first
    /// error is returned.
    async fn clear_all(&self) -> Result<()> {
        let access = self.clear(CredentialKey::AccessToken).await;
        let refresh = self.clear(CredentialKey::RefreshToken).await;
        access.and(refresh)
    }
}
