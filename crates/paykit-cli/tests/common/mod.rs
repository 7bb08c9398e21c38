use std::path::PathBuf;
use std::process::Output;

use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::process::Command;

/// Isolated HOME and data directory for one CLI test.
pub struct TestEnv {
    home: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            home: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn data_dir(&self) -> PathBuf {
        self.home.path().join("paykit")
    }

    pub fn credentials_path(&self) -> PathBuf {
        self.data_dir().join("credentials.json")
    }

    /// Seed the credential file as if a previous login had stored it.
    pub fn write_credentials(&self, access_token: &str, refresh_token: &str) {
        std::fs::create_dir_all(self.data_dir()).unwrap();
        let doc = json!({
            "access_token": access_token,
            "refresh_token": refresh_token,
        });
        std::fs::write(self.credentials_path(), doc.to_string()).unwrap();
    }

    /// The stored credential document, if the file exists.
    pub fn read_credentials(&self) -> Option<Value> {
        let content = std::fs::read_to_string(self.credentials_path()).ok()?;
        Some(serde_json::from_str(&content).unwrap())
    }

    /// Run the CLI binary against `api_url`.
    pub async fn run(&self, api_url: Option<&str>, args: &[&str]) -> Output {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_paykit"));
        cmd.args(args);
        cmd.env("HOME", self.home.path());
        cmd.env("XDG_DATA_HOME", self.home.path().join("data"));
        cmd.env("PAYKIT_DATA_DIR", self.data_dir());
        cmd.env("NO_COLOR", "1");
        cmd.env_remove("PAYKIT_TIMEOUT_SECS");
        cmd.env_remove("PAYKIT_PASSWORD");
        cmd.env_remove("RUST_LOG");
        match api_url {
            Some(url) => cmd.env("PAYKIT_API_URL", url),
            None => cmd.env_remove("PAYKIT_API_URL"),
        };
        cmd.output().await.expect("Failed to execute CLI")
    }
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

/// Panic with the captured stderr unless the command succeeded.
pub fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "CLI command failed\nstderr: {}",
        stderr(output)
    );
}
