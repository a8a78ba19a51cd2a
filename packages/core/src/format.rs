//! Rendering of secret payloads into file contents.
//!
//! # Supported Formats
//!
//! - JSON (pretty-printed, 4-space indent)
//! - YAML (block style)
//! - ENV (`key=value` lines, the fallback for any unknown selector)
//!
//! Reserved routing keys are stripped before rendering, and key order is the
//! order Vault returned.

use serde::Serialize;
use serde_json::Value;

use crate::error::RenderError;
use crate::vault::Secret;

/// Payload key naming the output file.
pub const FILENAME_KEY: &str = "__filename__";
/// Payload key naming the sub-directory under the base path.
pub const PATH_KEY: &str = "__path__";
/// Payload key naming the output format.
pub const TYPE_KEY: &str = "__type__";

/// Keys that carry routing hints rather than secret data.
pub const RESERVED_KEYS: [&str; 3] = [FILENAME_KEY, PATH_KEY, TYPE_KEY];

/// Output format of a rendered secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    Json,
    Yaml,
    #[default]
    Env,
}

impl OutputFormat {
    /// Map a format selector to a format. Unknown selectors fall back to
    /// [`OutputFormat::Env`].
    pub fn from_selector(selector: &str) -> Self {
        match selector.trim().to_ascii_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "yml" | "yaml" => OutputFormat::Yaml,
            _ => OutputFormat::Env,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Yaml => "yaml",
            OutputFormat::Env => "env",
        }
    }
}

/// Remove the reserved routing keys from a payload.
pub fn strip_reserved(secret: &mut Secret) {
    for key in RESERVED_KEYS {
        secret.shift_remove(key);
    }
}

/// Render a payload in the given format. Reserved keys are never emitted.
pub fn render(secret: &Secret, format: OutputFormat) -> Result<String, RenderError> {
    let mut data = secret.clone();
    strip_reserved(&mut data);

    match format {
        OutputFormat::Json => render_json(&data),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(&data)?),
        OutputFormat::Env => Ok(render_env(&data)),
    }
}

fn render_json(data: &Secret) -> Result<String, RenderError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    data.serialize(&mut ser)?;
    // serde_json only ever writes valid UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn render_env(data: &Secret) -> String {
    let mut output = String::new();
    for (key, value) in data {
        output.push_str(key);
        output.push('=');
        match value {
            Value::String(s) => output.push_str(s),
            other => output.push_str(&other.to_string()),
        }
        output.push('\n');
    }
    output
}
