//! HashiCorp Vault KV v2 client for listing and reading whole secrets.
//!
//! Only two endpoints are used:
//!
//! - `LIST {url}/v1/{engine}/metadata` for the secret names
//! - `GET {url}/v1/{engine}/data/{name}` for each secret's payload
//!
//! Secret values are never logged.

use reqwest::Method;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::config::VaultSettings;

/// Key/value payload of a single secret, in the order Vault returned it.
pub type Secret = serde_json::Map<String, serde_json::Value>;

/// Vault API error types. Raw API responses are never exposed.
#[derive(Debug, thiserror::Error)]
pub enum VaultApiError {
    #[error("network error communicating with Vault")]
    Network(#[source] reqwest::Error),

    #[error("Vault authentication failed (check token permissions)")]
    Unauthorized,

    #[error("Vault resource not found: {0}")]
    NotFound(String),

    #[error("Vault API rate limit exceeded")]
    RateLimited,

    #[error("Vault API server error")]
    ServerError,

    #[error("unexpected Vault API response: status {0}")]
    UnexpectedStatus(u16),

    #[error("malformed Vault API response: {0}")]
    Malformed(String),
}

#[derive(Deserialize)]
struct ListResponse {
    data: ListData,
}

#[derive(Deserialize)]
struct ListData {
    keys: Vec<String>,
}

#[derive(Deserialize)]
struct ReadResponse {
    data: ReadData,
}

#[derive(Deserialize)]
struct ReadData {
    data: Secret,
}

/// Percent-encode a single URL path component.
fn percent_encode_component(input: &str) -> String {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";

    let mut out = String::with_capacity(input.len());
    for b in input.bytes() {
        let safe = b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~');
        if safe {
            out.push(b as char);
        } else {
            out.push('%');
            out.push(HEX[(b >> 4) as usize] as char);
            out.push(HEX[(b & 0x0F) as usize] as char);
        }
    }
    out
}

/// Percent-encode each segment of a slash-delimited Vault path.
fn encode_vault_path(path: &str) -> String {
    path.split('/')
        .map(percent_encode_component)
        .collect::<Vec<_>>()
        .join("/")
}

/// Vault REST API client bound to one engine and token.
#[derive(Debug, Clone)]
pub struct VaultClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    engine: String,
}

impl VaultClient {
    /// Build the user-agent string from crate version.
    fn user_agent() -> String {
        format!("hachivsd/{}", env!("CARGO_PKG_VERSION"))
    }

    /// Create a client for the configured Vault.
    pub fn new(settings: &VaultSettings) -> Result<Self, VaultApiError> {
        let http = reqwest::Client::builder()
            .user_agent(Self::user_agent())
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(VaultApiError::Network)?;

        Ok(Self {
            http,
            base_url: settings.url.trim_end_matches('/').to_owned(),
            token: settings.token.clone(),
            engine: encode_vault_path(settings.engine.trim_matches('/')),
        })
    }

    /// Send an authenticated request and map non-2xx statuses to errors.
    async fn send(
        &self,
        method: Method,
        url: &str,
        what: &str,
    ) -> Result<reqwest::Response, VaultApiError> {
        let resp = self
            .http
            .request(method, url)
            .header("X-Vault-Token", &self.token)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(VaultApiError::Network)?;

        match resp.status().as_u16() {
            200..=299 => Ok(resp),
            401 | 403 => Err(VaultApiError::Unauthorized),
            404 => Err(VaultApiError::NotFound(what.to_owned())),
            429 => Err(VaultApiError::RateLimited),
            500..=599 => Err(VaultApiError::ServerError),
            other => Err(VaultApiError::UnexpectedStatus(other)),
        }
    }

    /// List the names of every secret in the engine.
    ///
    /// The names are returned exactly as Vault sent them. Entries ending in
    /// `/` are sub-folders. An empty engine yields an empty list.
    pub async fn list_secrets(&self) -> Result<Vec<String>, VaultApiError> {
        debug!("Requesting secrets list");

        let url = format!("{}/v1/{}/metadata", self.base_url, self.engine);
        let list =
            Method::from_bytes(b"LIST").map_err(|e| VaultApiError::Malformed(e.to_string()))?;
        // Vault answers 404 when the engine holds no secrets.
        let resp = match self.send(list, &url, &format!("engine '{}'", self.engine)).await {
            Ok(resp) => resp,
            Err(VaultApiError::NotFound(_)) => {
                debug!("Engine '{}' is empty", self.engine);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        let body = resp.bytes().await.map_err(VaultApiError::Network)?;
        let parsed: ListResponse = serde_json::from_slice(&body)
            .map_err(|e| VaultApiError::Malformed(format!("secret list: {e}")))?;

        Ok(parsed.data.keys)
    }

    /// Read the key/value payload of one secret.
    pub async fn read_secret(&self, name: &str) -> Result<Secret, VaultApiError> {
        let url = format!(
            "{}/v1/{}/data/{}",
            self.base_url,
            self.engine,
            encode_vault_path(name)
        );
        let resp = self
            .send(Method::GET, &url, &format!("secret '{name}'"))
            .await?;

        let body = resp.bytes().await.map_err(VaultApiError::Network)?;
        let parsed: ReadResponse = serde_json::from_slice(&body)
            .map_err(|e| VaultApiError::Malformed(format!("secret '{name}': {e}")))?;

        Ok(parsed.data.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> VaultClient {
        VaultClient::new(&VaultSettings {
            url: server.uri(),
            token: "vault-token".into(),
            engine: "secret".into(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn user_agent_contains_version() {
        assert!(VaultClient::user_agent().starts_with("hachivsd/"));
    }

    #[test]
    fn percent_encode_path_component() {
        assert_eq!(percent_encode_component("my app"), "my%20app");
        assert_eq!(percent_encode_component("A_B-1.2~x"), "A_B-1.2~x");
        assert_eq!(percent_encode_component("a?b"), "a%3Fb");
    }

    #[test]
    fn encode_vault_path_keeps_slashes() {
        assert_eq!(encode_vault_path("team/my app"), "team/my%20app");
    }

    #[tokio::test]
    async fn list_secrets_returns_keys_in_order() {
        let server = MockServer::start().await;

        Mock::given(method("LIST"))
            .and(path("/v1/secret/metadata"))
            .and(header("x-vault-token", "vault-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": { "keys": ["zeta", "alpha", "team/", "mid"] }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let keys = client_for(&server).list_secrets().await.unwrap();
        assert_eq!(keys, vec!["zeta", "alpha", "team/", "mid"]);
    }

    #[tokio::test]
    async fn list_secrets_maps_forbidden() {
        let server = MockServer::start().await;

        Mock::given(method("LIST"))
            .and(path("/v1/secret/metadata"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let err = client_for(&server).list_secrets().await.unwrap_err();
        assert!(matches!(err, VaultApiError::Unauthorized));
    }

    #[tokio::test]
    async fn list_secrets_empty_engine_is_empty_list() {
        let server = MockServer::start().await;

        Mock::given(method("LIST"))
            .and(path("/v1/secret/metadata"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(serde_json::json!({ "errors": [] })),
            )
            .mount(&server)
            .await;

        let keys = client_for(&server).list_secrets().await.unwrap();
        assert!(keys.is_empty());
    }

    #[tokio::test]
    async fn list_secrets_rejects_malformed_body() {
        let server = MockServer::start().await;

        Mock::given(method("LIST"))
            .and(path("/v1/secret/metadata"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": { "names": [] }
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).list_secrets().await.unwrap_err();
        assert!(matches!(err, VaultApiError::Malformed(_)));
    }

    #[tokio::test]
    async fn read_secret_preserves_key_order() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/secret/data/db"))
            .and(header("x-vault-token", "vault-token"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"data":{"data":{"user":"a","pass":"b","port":5432},"metadata":{"version":3}}}"#,
            ))
            .mount(&server)
            .await;

        let secret = client_for(&server).read_secret("db").await.unwrap();
        let keys: Vec<&str> = secret.keys().map(String::as_str).collect();

        assert_eq!(keys, vec!["user", "pass", "port"]);
        assert_eq!(secret["port"], 5432);
    }

    #[tokio::test]
    async fn read_secret_maps_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/secret/data/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = client_for(&server).read_secret("gone").await.unwrap_err();
        assert!(matches!(err, VaultApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn read_secret_maps_server_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/secret/data/db"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client_for(&server).read_secret("db").await.unwrap_err();
        assert!(matches!(err, VaultApiError::ServerError));
    }
}
