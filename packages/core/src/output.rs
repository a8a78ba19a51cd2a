//! Output routing and file writing.
//!
//! Each secret is written to `{basepath}/{path}/{prefix}{filename}{suffix}`.
//! Where `path`, `filename` and the format come from is decided by
//! [`resolve_target`]:
//!
//! | Field    | 1st                 | 2nd              | default       |
//! |----------|---------------------|------------------|---------------|
//! | path     | `path-override`     | `__path__`       | empty         |
//! | format   | `mode-override`     | `__type__`       | env           |
//! | filename | `__filename__`      | secret name      |               |

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::OutputConfig;
use crate::error::SyncError;
use crate::format::{self, OutputFormat, FILENAME_KEY, PATH_KEY, TYPE_KEY};
use crate::vault::Secret;

/// Where and how a single secret will be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    pub directory: PathBuf,
    pub file_path: PathBuf,
    pub format: OutputFormat,
}

/// Return the first present candidate, in priority order.
pub fn first_present<'a, const N: usize>(candidates: [Option<&'a str>; N]) -> Option<&'a str> {
    candidates.into_iter().flatten().next()
}

/// Collapse runs of `/` into a single separator.
pub fn collapse_separators(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut prev_slash = false;
    for c in path.chars() {
        if c == '/' {
            if !prev_slash {
                out.push(c);
            }
            prev_slash = true;
        } else {
            out.push(c);
            prev_slash = false;
        }
    }
    out
}

/// Read a routing hint from a payload. Non-string hints are ignored.
fn hint<'a>(secret: &'a Secret, key: &str) -> Option<&'a str> {
    secret.get(key).and_then(|v| v.as_str())
}

/// Reject a payload routing hint that would climb out of the base path.
fn checked_hint<'a>(
    name: &str,
    secret: &'a Secret,
    key: &str,
) -> Result<Option<&'a str>, SyncError> {
    match hint(secret, key) {
        Some(value) if value.split('/').any(|segment| segment == "..") => {
            Err(SyncError::UnsafeHint {
                name: name.to_string(),
                key: key.to_string(),
                value: value.to_string(),
            })
        }
        other => Ok(other),
    }
}

/// Resolve the output directory, file path and format for one secret.
///
/// A `__path__` or `__filename__` hint that would be used and contains a
/// `..` segment is rejected.
pub fn resolve_target(
    name: &str,
    secret: &Secret,
    basepath: &str,
    output: &OutputConfig,
) -> Result<OutputTarget, SyncError> {
    // An overridden `__path__` is never used, so it is not checked.
    let path_hint = match output.path_override {
        Some(_) => hint(secret, PATH_KEY),
        None => checked_hint(name, secret, PATH_KEY)?,
    };
    let filename_hint = checked_hint(name, secret, FILENAME_KEY)?;

    if output.path_override.is_some() && path_hint.is_some() {
        debug!("Path of '{}' overridden by local config", name);
    }
    let path = first_present([output.path_override.as_deref(), path_hint]).unwrap_or("");

    if output.mode_override.is_some() && hint(secret, TYPE_KEY).is_some() {
        debug!("Output format of '{}' overridden by local config", name);
    }
    let format = first_present([output.mode_override.as_deref(), hint(secret, TYPE_KEY)])
        .map(OutputFormat::from_selector)
        .unwrap_or_default();

    let filename = first_present([filename_hint, Some(name)]).unwrap_or(name);
    let filename = format!(
        "{}{}{}",
        output.name_prefix.as_deref().unwrap_or(""),
        filename,
        output.name_suffix.as_deref().unwrap_or("")
    );

    let directory = collapse_separators(&format!("{}/{}", basepath, path));
    let file_path = collapse_separators(&format!("{}/{}", directory, filename));

    Ok(OutputTarget {
        directory: PathBuf::from(directory),
        file_path: PathBuf::from(file_path),
        format,
    })
}

/// Render a secret and write it to its resolved target, overwriting any
/// existing file.
pub fn save_secret(
    name: &str,
    secret: &Secret,
    basepath: &str,
    output: &OutputConfig,
) -> Result<PathBuf, SyncError> {
    let target = resolve_target(name, secret, basepath, output)?;

    let content = format::render(secret, target.format).map_err(|source| {
        SyncError::RenderFailed {
            name: name.to_string(),
            source,
        }
    })?;
    debug!("Formatted '{}' as {}", name, target.format.as_str());

    write_file(&target.directory, &target.file_path, &content)?;
    info!("{} saved", target.file_path.display());

    Ok(target.file_path)
}

fn write_file(directory: &Path, file_path: &Path, content: &str) -> Result<(), SyncError> {
    fs::create_dir_all(directory).map_err(|source| SyncError::DirectoryCreateFailed {
        path: directory.to_path_buf(),
        source,
    })?;

    fs::write(file_path, content).map_err(|source| SyncError::WriteFailed {
        path: file_path.to_path_buf(),
        source,
    })
}
