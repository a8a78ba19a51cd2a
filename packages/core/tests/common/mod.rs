//! Common testing utilities for hachivsd integration tests.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN: &str = "test-token";
pub const ENGINE: &str = "kv";

/// Test context that manages the output directory and config file.
pub struct TestContext {
    /// Path to temporary directory
    pub temp_path: PathBuf,
    /// The temporary directory (kept to prevent early deletion)
    _temp_dir: TempDir,
}

impl TestContext {
    /// Create a new test context with a temporary directory.
    pub fn new() -> anyhow::Result<Self> {
        let temp_dir = TempDir::new()?;
        let temp_path = temp_dir.path().to_path_buf();

        Ok(Self {
            temp_path,
            _temp_dir: temp_dir,
        })
    }

    /// Base directory secrets are written under.
    pub fn basepath(&self) -> PathBuf {
        self.temp_path.join("out")
    }

    /// Write a config file pointing at `vault_url`, with extra `output`
    /// lines appended verbatim.
    pub fn create_config(&self, vault_url: &str, output_extra: &str) -> anyhow::Result<PathBuf> {
        let content = format!(
            "vault:\n  url: {}\n  token: {}\n  engine: {}\n  timeout-secs: 5\noutput:\n  basepath: {}\n{}",
            vault_url,
            TOKEN,
            ENGINE,
            self.basepath().display(),
            output_extra
        );

        let file_path = self.temp_path.join("config.yml");
        fs::write(&file_path, content)?;
        Ok(file_path)
    }

    /// Every regular file under the base path, relative to it, sorted.
    #[allow(dead_code)]
    pub fn written_files(&self) -> Vec<String> {
        let mut files = Vec::new();
        collect_files(&self.basepath(), &self.basepath(), &mut files);
        files.sort();
        files
    }
}

fn collect_files(root: &Path, dir: &Path, out: &mut Vec<String>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files(root, &path, out);
        } else if let Ok(rel) = path.strip_prefix(root) {
            out.push(rel.to_string_lossy().into_owned());
        }
    }
}

/// Mock Vault KV v2 engine.
pub struct MockVault {
    pub server: MockServer,
}

impl MockVault {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Answer the metadata LIST with `keys`.
    pub async fn with_keys(&self, keys: &[&str]) {
        Mock::given(method("LIST"))
            .and(path(format!("/v1/{}/metadata", ENGINE)))
            .and(header("x-vault-token", TOKEN))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": { "keys": keys }
            })))
            .mount(&self.server)
            .await;
    }

    /// Answer the metadata LIST with a status code and an empty error list.
    #[allow(dead_code)]
    pub async fn with_list_status(&self, status: u16) {
        Mock::given(method("LIST"))
            .and(path(format!("/v1/{}/metadata", ENGINE)))
            .respond_with(
                ResponseTemplate::new(status).set_body_json(serde_json::json!({ "errors": [] })),
            )
            .mount(&self.server)
            .await;
    }

    /// Answer the data GET for `name` with `data`.
    pub async fn with_secret(&self, name: &str, data: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(format!("/v1/{}/data/{}", ENGINE, name)))
            .and(header("x-vault-token", TOKEN))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": { "data": data, "metadata": { "version": 1 } }
            })))
            .mount(&self.server)
            .await;
    }

    /// Answer the data GET for `name` with a bare status code.
    #[allow(dead_code)]
    pub async fn with_status(&self, name: &str, status: u16) {
        Mock::given(method("GET"))
            .and(path(format!("/v1/{}/data/{}", ENGINE, name)))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }
}
