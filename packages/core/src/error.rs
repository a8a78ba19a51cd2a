//! Error taxonomy for a sync run.
//!
//! Every pipeline stage maps its own failures into exactly one variant of
//! [`SyncError`], and each variant carries a distinct process exit code.

use std::path::PathBuf;

use crate::vault::VaultApiError;

/// A fatal failure in one stage of the sync pipeline.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// No candidate configuration file could be read and parsed.
    #[error("configuration unavailable: {0}")]
    ConfigUnavailable(String),

    /// A mandatory configuration field is absent or empty.
    #[error("mandatory option {0} not defined in config")]
    MissingField(&'static str),

    /// A configuration field is present but unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The secret list could not be retrieved from Vault.
    #[error("unable to retrieve secrets list from vault")]
    EnumerationFailed(#[source] VaultApiError),

    /// A single secret could not be retrieved; the run stops before writing.
    #[error("unable to retrieve secret '{name}'")]
    FetchFailed {
        name: String,
        #[source]
        source: VaultApiError,
    },

    /// A secret payload could not be serialized.
    #[error("unable to render secret '{name}'")]
    RenderFailed {
        name: String,
        #[source]
        source: RenderError,
    },

    /// A payload routing hint would place the file outside the base path.
    #[error("secret '{name}' has unsafe {key} '{value}'")]
    UnsafeHint {
        name: String,
        key: String,
        value: String,
    },

    #[error("unable to create directory {}", path.display())]
    DirectoryCreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to save secret to {}", path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SyncError {
    /// Process exit code for this failure class.
    pub fn exit_code(&self) -> i32 {
        match self {
            SyncError::ConfigUnavailable(_) => 2,
            SyncError::MissingField(_) | SyncError::InvalidConfig(_) => 3,
            SyncError::EnumerationFailed(_) => 4,
            SyncError::FetchFailed { .. } => 5,
            SyncError::RenderFailed { .. } => 6,
            SyncError::DirectoryCreateFailed { .. } => 7,
            SyncError::WriteFailed { .. } => 8,
            SyncError::UnsafeHint { .. } => 9,
        }
    }
}

/// Serializer failure while rendering a payload.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("JSON serialization failed")]
    Json(#[from] serde_json::Error),

    #[error("YAML serialization failed")]
    Yaml(#[from] serde_yaml::Error),
}
