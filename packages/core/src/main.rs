// hachivsd - sync HashiCorp Vault KV secrets to local files
//
// This is the main entry point for the application.

use anyhow::Result;
use clap::{Parser, Subcommand};
use hachivsd::config::Config;
use hachivsd::doctor::run_checks;
use hachivsd::error::SyncError;
use hachivsd::sync::{self, SyncOptions};
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// hachivsd - download every secret of a Vault KV engine to files
#[derive(Parser, Debug)]
#[command(name = "hachivsd")]
#[command(version)]
#[command(about = "Download every secret of a Vault KV engine to local files", long_about = None)]
struct Cli {
    /// Configuration file (default: first match in ./, /etc/hachivsd/, ~/.config/hachivsd/)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Log errors only
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch all secrets and write them to disk (default)
    Sync {
        /// Show what would be written without touching the filesystem
        #[arg(long, default_value = "false")]
        dry_run: bool,
    },

    /// Check configuration and Vault access
    Doctor,
}

fn init_logging(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run_sync(config_path: Option<&Path>, dry_run: bool) -> Result<(), SyncError> {
    let config = Config::load(config_path)?;
    config.validate()?;
    info!("Config loaded successfully");

    let report = sync::run(&config, SyncOptions { dry_run }).await?;

    if !report.skipped.is_empty() {
        info!("Skipped {} sub-folder(s)", report.skipped.len());
    }
    if dry_run {
        info!("Dry run: {} secret(s) would be saved", report.files.len());
    } else {
        info!("Saved {} of {} listed secret(s)", report.files.len(), report.listed);
    }
    Ok(())
}

async fn run_doctor(config_path: Option<&Path>) -> Result<()> {
    println!("hachivsd doctor");
    println!("Checking prerequisites...\n");

    let checks = run_checks(config_path).await;
    for (i, check) in checks.iter().enumerate() {
        let mark = if check.passed { "✓" } else { "✗" };
        println!("{}. {} {}", i + 1, check.name, mark);
        println!("   {}", check.detail);
    }

    println!();
    if checks.iter().all(|c| c.passed) {
        println!("All checks passed! Ready to sync.");
        Ok(())
    } else {
        println!("Some checks failed. Please fix the issues above.");
        Err(anyhow::anyhow!("Doctor checks failed"))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let runtime = tokio::runtime::Runtime::new()?;
    let config_path = cli.config.as_deref();

    match cli.command.unwrap_or(Commands::Sync { dry_run: false }) {
        Commands::Sync { dry_run } => {
            if let Err(e) = runtime.block_on(run_sync(config_path, dry_run)) {
                error!("Error: {}", e);
                if let Some(source) = std::error::Error::source(&e) {
                    error!("Caused by: {}", source);
                }
                std::process::exit(e.exit_code());
            }
        }
        Commands::Doctor => {
            if let Err(e) = runtime.block_on(run_doctor(config_path)) {
                eprintln!("\nError: {}", e);
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
