//! Check command
//!
//! Resolves the configuration exactly as `run` would and applies the
//! credential guard. Makes no network call and starts no procedure.

use anyhow::Result;
use idmigrate_core::ExError;

use crate::settings::{load_settings, SettingsArgs};

pub fn execute(args: SettingsArgs) -> Result<()> {
    let settings = load_settings(&args)?;
    let config = settings.into_config().map_err(ExError::from)?;
    let environment = config
        .credentials
        .validate()
        .map_err(ExError::from)?;

    let procedures = &config.procedures;
    let launcher = std::iter::once(procedures.launcher.as_str())
        .chain(procedures.launcher_args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ");

    println!("environment: {}", environment);
    println!("source: {}", config.source.base_url);
    println!(
        "pagination: limit {}, {}{}",
        config.source.page_limit,
        if config.source.follow_pagination {
            "all pages"
        } else {
            "first page only"
        },
        config
            .source
            .max_pages
            .map(|max| format!(" (at most {} pages)", max))
            .unwrap_or_default()
    );
    println!(
        "snapshots: {} ({:?})",
        config.snapshots.dir.display(),
        config.snapshots.policy
    );
    println!(
        "procedures: {} {{{}, {}, {}}}",
        launcher,
        procedures.names.users,
        procedures.names.organizations,
        procedures.names.memberships
    );
    println!(
        "halt on error: {}, dry run: {}",
        config.cycle.halt_on_error, config.cycle.dry_run
    );
    Ok(())
}
