//! Run command
//!
//! Usage: idmigrate run [--dry-run] [--continue-on-error] [--report <PATH>]

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use idmigrate_core::ExError;
use idmigrate_engine::{run_migration_cycle, CommandRunner, HttpSourceClient};
use idmigrate_store::FsSnapshotStore;

use crate::settings::{load_settings, SettingsArgs};

#[derive(Debug, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub settings: SettingsArgs,

    /// Write the run report as JSON to this path
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,
}

/// Execute one migration cycle
pub async fn execute(args: RunArgs) -> Result<()> {
    let settings = load_settings(&args.settings)?;
    let config = settings.into_config().map_err(ExError::from)?;

    let source = HttpSourceClient::new(&config.source)?;
    let snapshots = FsSnapshotStore::new(&config.snapshots.dir);
    let runner = CommandRunner::new(&config.procedures);

    tracing::info!(
        source = %source.base_url(),
        snapshot_dir = %config.snapshots.dir.display(),
        dry_run = config.cycle.dry_run,
        halt_on_error = config.cycle.halt_on_error,
        "Starting migration"
    );

    let report = run_migration_cycle(&config, &source, &snapshots, &runner).await?;

    if let Some(path) = &args.report {
        let json = serde_json::to_string_pretty(&report)?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("writing report to {}", path.display()))?;
    }

    println!("{}", report.summary());
    for failure in &report.failed_organizations {
        println!(
            "  failed: organization {} (#{}): {}",
            failure.organization_id.as_deref().unwrap_or("<no id>"),
            failure.position + 1,
            failure.message
        );
    }
    for snapshot in &report.snapshot_failures {
        println!("  snapshot not written: {}", snapshot);
    }

    if !report.is_success() {
        bail!(
            "{} of {} organizations failed to migrate",
            report.failed_organizations.len(),
            report.organizations_fetched
        );
    }
    Ok(())
}
