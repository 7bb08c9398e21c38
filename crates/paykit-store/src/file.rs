//! File-backed credential store.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use paykit_core::error::StoreError;
use paykit_core::{CredentialKey, CredentialStore, Error, Result};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

fn map_io(path: &Path) -> impl FnOnce(std::io::Error) -> Error + '_ {
    move |source| {
        Error::Store(StoreError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}

/// On-disk document.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredCredentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
}

impl StoredCredentials {
    fn slot(&mut self, key: CredentialKey) -> &mut Option<String> {
        match key {
            CredentialKey::AccessToken => &mut self.access_token,
            CredentialKey::RefreshToken => &mut self.refresh_token,
        }
    }

    fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }
}

/// Credential store persisted as a JSON file.
///
/// Writes hold an exclusive lock on a sibling `.lock` file, go through a
/// temporary file and are renamed into place, so readers never observe a
/// half-written document. On Unix the file is created with mode `0600`.
/// Clearing the last token removes the file.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Create a store backed by the given file. The file need not exist.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Get the credential file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// When the tokens were last written, if any are stored.
    pub fn updated_at(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self.read()?.updated_at)
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "credentials".into());
        name.push(".lock");
        self.path.with_file_name(name)
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "credentials".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn read(&self) -> Result<StoredCredentials> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(StoredCredentials::default());
            }
            Err(e) => return Err(map_io(&self.path)(e)),
        };

        serde_json::from_str(&content).map_err(|e| {
            Error::Store(StoreError::Corrupt {
                message: format!("{}: {}", self.path.display(), e),
            })
        })
    }

    /// Apply `mutate` to the stored document under the write lock.
    fn update(&self, mutate: impl FnOnce(&mut StoredCredentials)) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(map_io(parent))?;
        }

        let lock_path = self.lock_path();
        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(map_io(&lock_path))?;

        lock_file.lock_exclusive().map_err(map_io(&lock_path))?;
        let result = self.update_locked(mutate);
        lock_file.unlock().map_err(map_io(&lock_path))?;

        result
    }

    fn update_locked(&self, mutate: impl FnOnce(&mut StoredCredentials)) -> Result<()> {
        let mut doc = self.read()?;
        mutate(&mut doc);

        if doc.is_empty() {
            match fs::remove_file(&self.path) {
                Ok(()) => debug!(path = %self.path.display(), "Removed credential file"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(map_io(&self.path)(e)),
            }
            return Ok(());
        }

        doc.updated_at = Some(Utc::now());
        let json = serde_json::to_string_pretty(&doc).map_err(|e| {
            Error::Store(StoreError::Corrupt {
                message: e.to_string(),
            })
        })?;

        let tmp_path = self.tmp_path();
        {
            let mut options = OpenOptions::new();
            options.create(true).write(true).truncate(true);
            #[cfg(unix)]
            {
                use std::os::unix::fs::OpenOptionsExt;
                options.mode(0o600);
            }
            let mut file = options.open(&tmp_path).map_err(map_io(&tmp_path))?;
            file.write_all(json.as_bytes())
                .map_err(map_io(&tmp_path))?;
            file.sync_data().map_err(map_io(&tmp_path))?;
        }

        // The mode passed to open() is masked by umask; pin it explicitly.
        #[cfg(unix)]
        {
            let mut perms = fs::metadata(&tmp_path)
                .map_err(map_io(&tmp_path))?
                .permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&tmp_path, perms).map_err(map_io(&tmp_path))?;
        }

        fs::rename(&tmp_path, &self.path).map_err(map_io(&self.path))?;
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn get(&self, key: CredentialKey) -> Result<Option<String>> {
        let mut doc = self.read()?;
        Ok(doc.slot(key).take())
    }

    #[instrument(skip(self, value), fields(path = %self.path.display()))]
    async fn set(&self, key: CredentialKey, value: &str) -> Result<()> {
        debug!(%key, "Storing credential");
        self.update(|doc| *doc.slot(key) = Some(value.to_string()))
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn clear(&self, key: CredentialKey) -> Result<()> {
        debug!(%key, "Clearing credential");
        self.update(|doc| *doc.slot(key) = None)
    }
}
