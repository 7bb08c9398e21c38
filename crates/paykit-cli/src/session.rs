//! Credential file location and client construction.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;

use paykit_core::ApiUrl;
use paykit_http::{AuthenticatedClient, ClientConfig};
use paykit_store::FileCredentialStore;

use crate::cli::GlobalArgs;

const CREDENTIALS_FILE: &str = "credentials.json";

/// Get the credential file path.
pub fn credentials_path(global: &GlobalArgs) -> Result<PathBuf> {
    let data_dir = match &global.data_dir {
        Some(dir) => dir.clone(),
        None => ProjectDirs::from("", "", "paykit")
            .context("Could not determine data directory")?
            .data_dir()
            .to_path_buf(),
    };

    Ok(data_dir.join(CREDENTIALS_FILE))
}

/// Open the credential store. The file is created on first write.
pub fn open_store(global: &GlobalArgs) -> Result<Arc<FileCredentialStore>> {
    Ok(Arc::new(FileCredentialStore::new(credentials_path(global)?)))
}

/// Build a client for the configured API over the given store.
pub fn client(global: &GlobalArgs, store: Arc<FileCredentialStore>) -> Result<AuthenticatedClient> {
    let api_url = global
        .api_url
        .as_deref()
        .context("No API URL. Pass --api-url or set PAYKIT_API_URL.")?;
    let base_url = ApiUrl::new(api_url).context("Invalid API URL")?;

    let mut config = ClientConfig::new(base_url);
    if let Some(secs) = global.timeout_secs {
        config = config.with_request_timeout(Duration::from_secs(secs));
    }

    AuthenticatedClient::with_reqwest(config, store).context("Failed to create HTTP client")
}
