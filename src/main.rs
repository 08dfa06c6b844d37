//! Binary entry point for repovault.
//!
//! This binary provides the CLI for the repovault backup pipeline.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr/print_stdout in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use anyhow::Context;
use clap::{Parser, Subcommand};
use repovault::config::VaultConfig;
use repovault::models::{BackupRun, RecordStatus};
use repovault::provider::{GhCliProvider, GitWorkingCopySink};
use repovault::services::{BackupProgress, BackupService, PublishService, RepositoryEnumerator};
use repovault::store::BackupStore;
use repovault::{observability, RetentionManager};
use std::path::PathBuf;
use std::process::ExitCode;

/// Repovault - scheduled, verifiable backups for a repository fleet.
#[derive(Parser)]
#[command(name = "repovault")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Organization whose fleet is backed up.
    #[arg(short, long, global = true)]
    organization: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline: backup, log, prune, publish.
    Run {
        /// Skip the retention pruning stage.
        #[arg(long)]
        skip_prune: bool,

        /// Skip the publication stage.
        #[arg(long)]
        skip_publish: bool,
    },

    /// Prune archives older than the retention window.
    Prune {
        /// Retention window in days.
        #[arg(long)]
        retention_days: Option<u32>,
    },

    /// Publish the local store's artifacts for a run.
    Publish {
        /// Run id whose artifacts to publish.
        #[arg(long)]
        run_id: String,
    },

    /// List the enumerated repository fleet.
    List,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    observability::init(cli.verbose);

    match dispatch(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Loads configuration and routes to the selected command.
fn dispatch(cli: Cli) -> anyhow::Result<()> {
    let mut config = match cli.config.as_deref() {
        Some(path) => {
            VaultConfig::load_from_file(path).context("failed to load configuration")?
        }
        None => VaultConfig::load_default(),
    };
    if let Some(organization) = cli.organization {
        config = config.with_organization(organization);
    }

    match cli.command {
        Commands::Run {
            skip_prune,
            skip_publish,
        } => cmd_run(config, skip_prune, skip_publish),
        Commands::Prune { retention_days } => cmd_prune(config, retention_days),
        Commands::Publish { run_id } => cmd_publish(config, &run_id),
        Commands::List => cmd_list(config),
    }
}

/// Full pipeline: backup all repositories, save the run log, prune the
/// store, publish to the durable sink, print the summary.
fn cmd_run(config: VaultConfig, skip_prune: bool, skip_publish: bool) -> anyhow::Result<()> {
    let service = BackupService::new(config.clone(), GhCliProvider::new());
    let run = service.run_with_observer(|progress| match progress {
        BackupProgress::Started { name } => println!("Backing up {name}..."),
        BackupProgress::Finished(record) => {
            if record.status == RecordStatus::Success {
                println!("  ✓ Success: {} bytes", record.size_bytes);
            } else {
                println!("  ✗ Failed");
            }
        }
    })?;

    let store = BackupStore::open(&config.backup_dir)?;
    let log_path = store
        .write_run_log(&run)
        .context("failed to save run log")?;
    println!("\nBackup log saved: {}", log_path.display());

    if !skip_prune {
        let manager = RetentionManager::new(store, config.retention_days);
        let stats = manager.prune()?;
        for removed in &stats.removed {
            println!("Removed old backup: {}", removed.display());
        }
    }

    if !skip_publish {
        let publisher = PublishService::new(config, GitWorkingCopySink::new());
        match publisher.publish(&run.run_id) {
            Ok(()) => println!("✓ Backup published to durable sink"),
            // Publish failure does not constitute backup failure: the
            // artifacts already exist locally.
            Err(e) => println!("✗ Failed to publish backup: {e}"),
        }
    }

    print_summary(&run);
    Ok(())
}

/// Retention pass only.
fn cmd_prune(config: VaultConfig, retention_days: Option<u32>) -> anyhow::Result<()> {
    let days = retention_days.unwrap_or(config.retention_days);
    let store = BackupStore::open(&config.backup_dir)?;
    let stats = RetentionManager::new(store, days).prune()?;

    for removed in &stats.removed {
        println!("Removed old backup: {}", removed.display());
    }
    println!(
        "Examined {} archives, removed {}, {} failed",
        stats.examined,
        stats.removed.len(),
        stats.failed
    );
    Ok(())
}

/// Publish pass only.
fn cmd_publish(config: VaultConfig, run_id: &str) -> anyhow::Result<()> {
    let publisher = PublishService::new(config, GitWorkingCopySink::new());
    publisher.publish(run_id)?;
    println!("✓ Backup published to durable sink");
    Ok(())
}

/// Prints the enumerated fleet (debug aid).
fn cmd_list(config: VaultConfig) -> anyhow::Result<()> {
    let provider = GhCliProvider::new();
    let enumerator = RepositoryEnumerator::new(&provider, &config);
    let mut errors = Vec::new();
    for name in enumerator.list(&mut errors) {
        println!("{name}");
    }
    for error in errors {
        eprintln!("warning: {error}");
    }
    Ok(())
}

/// Prints the final summary block for a run.
fn print_summary(run: &BackupRun) {
    println!("\n{}", "=".repeat(80));
    println!("BACKUP SUMMARY");
    println!("{}", "=".repeat(80));
    println!("Total repositories: {}", run.summary.total);
    println!("Successful backups: {}", run.summary.success);
    println!("Failed backups: {}", run.summary.failed);
    println!("Status: {}", run.status.as_str().to_uppercase());

    if !run.errors.is_empty() {
        println!("\nErrors: {}", run.errors.len());
        for error in run.errors.iter().take(5) {
            println!("  - {error}");
        }
    }

    println!("\n✓ Backup process completed");
}
