//! In-memory credential store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use paykit_core::{CredentialKey, CredentialPair, CredentialStore, Result};

/// Process-local credential store.
///
/// Tokens are lost when the process exits. Useful for tests and for hosts
/// that keep their own secure storage and seed the client at startup.
#[derive(Default)]
pub struct MemoryCredentialStore {
    values: RwLock<HashMap<CredentialKey, String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with a token pair.
    pub fn with_pair(pair: &CredentialPair) -> Self {
        let mut values = HashMap::new();
        values.insert(
            CredentialKey::AccessToken,
            pair.access_token.as_str().to_string(),
        );
        values.insert(
            CredentialKey::RefreshToken,
            pair.refresh_token.as_str().to_string(),
        );
        Self {
            values: RwLock::new(values),
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get(&self, key: CredentialKey) -> Result<Option<String>> {
        Ok(self.values.read().await.get(&key).cloned())
    }

    async fn set(&self, key: CredentialKey, value: &str) -> Result<()> {
        self.values.write().await.insert(key, value.to_string());
        Ok(())
    }

    async fn clear(&self, key: CredentialKey) -> Result<()> {
        self.values.write().await.remove(&key);
        Ok(())
    }
}

impl std::fmt::Debug for MemoryCredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCredentialStore")
            .field("values", &"[REDACTED]")
            .finish()
    }
}
