// hachivsd Configuration Module
//
// This module locates, parses and validates the YAML configuration file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::SyncError;

/// Directories searched for a configuration file, in order.
///
/// A leading `~/` is expanded to the user's home directory.
pub const CONFIG_DIRS: &[&str] = &["./", "/etc/hachivsd/", "~/.config/hachivsd/"];

/// File names tried in each directory, in order.
pub const CONFIG_FILES: &[&str] = &[
    ".config.yml",
    "config.yml",
    "config.yaml",
    "cfg.yml",
    "cfg.yaml",
    "hachivsd.yml",
    "hachivsd.yaml",
];

fn default_timeout_secs() -> u64 {
    30
}

/// Vault connection settings (`vault` section).
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct VaultConfig {
    /// Vault address, e.g. `https://vault.example.com:8200`
    pub url: Option<String>,

    /// Token sent as `X-Vault-Token`
    pub token: Option<String>,

    /// KV v2 mount to sync from
    pub engine: Option<String>,

    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            url: None,
            token: None,
            engine: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Output settings (`output` section).
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Root directory all secrets are written under
    pub basepath: Option<String>,

    /// Sub-directory that replaces any `__path__` hint
    pub path_override: Option<String>,

    /// Format that replaces any `__type__` hint
    pub mode_override: Option<String>,

    pub name_prefix: Option<String>,

    pub name_suffix: Option<String>,
}

/// Main configuration structure
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub vault: VaultConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Vault settings after mandatory-field checks.
#[derive(Debug, Clone)]
pub struct VaultSettings {
    pub url: String,
    pub token: String,
    pub engine: String,
    pub timeout_secs: u64,
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SyncError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SyncError::ConfigUnavailable(format!("failed to read {}: {}", path.display(), e))
        })?;

        serde_yaml::from_str(&content).map_err(|e| {
            SyncError::ConfigUnavailable(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    /// Load the first readable and parseable file among the default
    /// candidates.
    pub fn discover() -> Result<(Self, PathBuf), SyncError> {
        let candidates = candidate_paths(dirs::home_dir().as_deref());
        Self::discover_in(&candidates)
    }

    /// Load the first readable and parseable file among `candidates`.
    pub fn discover_in(candidates: &[PathBuf]) -> Result<(Self, PathBuf), SyncError> {
        debug!("Loading config");

        for path in candidates {
            if !path.is_file() {
                continue;
            }
            match Self::from_file(path) {
                Ok(config) => {
                    info!("Config loaded from {}", path.display());
                    return Ok((config, path.clone()));
                }
                Err(e) => warn!("Skipping config candidate: {}", e),
            }
        }

        Err(SyncError::ConfigUnavailable(format!(
            "no readable config file among {} candidates",
            candidates.len()
        )))
    }

    /// Load from an explicit path, or discover one when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, SyncError> {
        match path {
            Some(path) => {
                let config = Self::from_file(path)?;
                info!("Config loaded from {}", path.display());
                Ok(config)
            }
            None => Self::discover().map(|(config, _)| config),
        }
    }

    /// Check the mandatory `vault` fields and return them unwrapped.
    pub fn vault_settings(&self) -> Result<VaultSettings, SyncError> {
        let url = required(self.vault.url.as_deref(), "vault.url")?;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(SyncError::InvalidConfig(format!(
                "vault.url must start with http:// or https://, got '{}'",
                url
            )));
        }

        if self.vault.timeout_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "vault.timeout-secs must be greater than 0".to_string(),
            ));
        }

        Ok(VaultSettings {
            url: url.trim_end_matches('/').to_string(),
            token: required(self.vault.token.as_deref(), "vault.token")?.to_string(),
            engine: required(self.vault.engine.as_deref(), "vault.engine")?
                .trim_matches('/')
                .to_string(),
            timeout_secs: self.vault.timeout_secs,
        })
    }

    /// Mandatory `output.basepath`.
    pub fn basepath(&self) -> Result<&str, SyncError> {
        required(self.output.basepath.as_deref(), "output.basepath")
    }

    /// Validate every mandatory field.
    pub fn validate(&self) -> Result<(), SyncError> {
        self.vault_settings()?;
        self.basepath()?;
        Ok(())
    }
}

fn required<'a>(value: Option<&'a str>, field: &'static str) -> Result<&'a str, SyncError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(SyncError::MissingField(field)),
    }
}

/// Every directory × file name combination, in search order.
///
/// Home-relative directories are dropped when `home` is unknown.
pub fn candidate_paths(home: Option<&Path>) -> Vec<PathBuf> {
    let mut paths = Vec::with_capacity(CONFIG_DIRS.len() * CONFIG_FILES.len());

    for dir in CONFIG_DIRS {
        let dir = match dir.strip_prefix("~/") {
            Some(rest) => match home {
                Some(home) => home.join(rest),
                None => continue,
            },
            None => PathBuf::from(dir),
        };
        for file in CONFIG_FILES {
            paths.push(dir.join(file));
        }
    }

    paths
}
