//! The sync pipeline: list → fetch → render → write.
//!
//! Every stage runs to completion before the next one starts, and a failure
//! in any stage stops the run. In particular all secrets are fetched before
//! the first file is written, so a failed fetch never leaves a partial sync
//! behind.

use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::config::{Config, OutputConfig};
use crate::error::SyncError;
use crate::output::{resolve_target, save_secret};
use crate::vault::{Secret, VaultClient};

/// Knobs for a single run.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Resolve targets but write nothing.
    pub dry_run: bool,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Names returned by the engine listing, folders included
    pub listed: usize,
    /// Sub-folder entries that were not fetched
    pub skipped: Vec<String>,
    /// Files written, or that would be written in a dry run
    pub files: Vec<PathBuf>,
}

/// Fetch every named secret, in order. Folder entries are skipped.
pub async fn fetch_secrets(
    client: &VaultClient,
    names: &[String],
) -> Result<(Vec<(String, Secret)>, Vec<String>), SyncError> {
    info!("Getting secrets contents");

    let mut secrets = Vec::with_capacity(names.len());
    let mut skipped = Vec::new();

    for (i, name) in names.iter().enumerate() {
        if name.ends_with('/') {
            warn!("Skipping sub-folder '{}'", name);
            skipped.push(name.clone());
            continue;
        }

        let secret = client
            .read_secret(name)
            .await
            .map_err(|source| SyncError::FetchFailed {
                name: name.clone(),
                source,
            })?;
        secrets.push((name.clone(), secret));
        debug!("Got {} of {} secrets", i + 1, names.len());
    }

    Ok((secrets, skipped))
}

/// Write every fetched secret under `basepath`.
pub fn write_secrets(
    secrets: &[(String, Secret)],
    basepath: &str,
    output: &OutputConfig,
    options: SyncOptions,
) -> Result<Vec<PathBuf>, SyncError> {
    info!("Saving {} secrets", secrets.len());

    let mut files = Vec::with_capacity(secrets.len());
    for (name, secret) in secrets {
        let path = if options.dry_run {
            let target = resolve_target(name, secret, basepath, output)?;
            info!(
                "Would save {} as {}",
                target.file_path.display(),
                target.format.as_str()
            );
            target.file_path
        } else {
            save_secret(name, secret, basepath, output)?
        };
        files.push(path);
    }

    Ok(files)
}

/// Run the whole pipeline against a loaded configuration.
pub async fn run(config: &Config, options: SyncOptions) -> Result<SyncReport, SyncError> {
    let settings = config.vault_settings()?;
    let basepath = config.basepath()?;

    let client = VaultClient::new(&settings).map_err(SyncError::EnumerationFailed)?;

    let names = client
        .list_secrets()
        .await
        .map_err(SyncError::EnumerationFailed)?;
    debug!("Secrets list retrieved: {} entries", names.len());

    let (secrets, skipped) = fetch_secrets(&client, &names).await?;
    debug!("Secrets data retrieved");

    let files = write_secrets(&secrets, basepath, &config.output, options)?;
    debug!("Secrets saved");

    Ok(SyncReport {
        listed: names.len(),
        skipped,
        files,
    })
}
