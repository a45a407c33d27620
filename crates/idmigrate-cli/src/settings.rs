//! Configuration layering
//!
//! Precedence, lowest first: built-in defaults, `idmigrate.toml` (or
//! `--config`), `IDMIGRATE_*` variables, `CLERK_SECRET_KEY` /
//! `WORKOS_SECRET_KEY`, command-line flags.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use config::{Config, Environment, File};
use idmigrate_core::MigrationSettings;

pub const DEFAULT_CONFIG_FILE: &str = "idmigrate";
pub const ENV_PREFIX: &str = "IDMIGRATE";
pub const SOURCE_KEY_VAR: &str = "CLERK_SECRET_KEY";
pub const DESTINATION_KEY_VAR: &str = "WORKOS_SECRET_KEY";

#[derive(Debug, Clone, Default, Args)]
pub struct SettingsArgs {
    /// Configuration file [default: ./idmigrate.toml when present]
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory receiving the snapshot files
    #[arg(long, value_name = "DIR")]
    pub snapshot_dir: Option<PathBuf>,

    /// Source API base URL
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Fetch only the first page of each collection
    #[arg(long)]
    pub single_page: bool,

    /// Fetch and snapshot, but invoke no migration procedure
    #[arg(long)]
    pub dry_run: bool,

    /// Record failing organizations and carry on with the next one
    #[arg(long)]
    pub continue_on_error: bool,
}

/// Resolve settings from every layer, reading the process environment
///
/// # Errors
///
/// Fails when the configuration file is unreadable or a value has the
/// wrong type.
pub fn load_settings(args: &SettingsArgs) -> Result<MigrationSettings> {
    let env: HashMap<String, String> = std::env::vars().collect();
    settings_from(args, env)
}

fn settings_from(args: &SettingsArgs, env: HashMap<String, String>) -> Result<MigrationSettings> {
    let file = match &args.config {
        Some(path) => File::from(path.as_path()).required(true),
        None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
    };

    let source_key = env.get(SOURCE_KEY_VAR).cloned();
    let destination_key = env.get(DESTINATION_KEY_VAR).cloned();

    let settings = Config::builder()
        .add_source(file)
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("launcher_args")
                .source(Some(env.into_iter().collect())),
        )
        .set_override_option("source_secret_key", source_key)?
        .set_override_option("destination_secret_key", destination_key)?
        .set_override_option(
            "snapshot_dir",
            args.snapshot_dir
                .as_ref()
                .map(|dir| dir.to_string_lossy().into_owned()),
        )?
        .set_override_option("source_base_url", args.base_url.clone())?
        .set_override_option("follow_pagination", args.single_page.then_some(false))?
        .set_override_option("dry_run", args.dry_run.then_some(true))?
        .set_override_option("halt_on_error", args.continue_on_error.then_some(false))?
        .build()
        .context("loading configuration")?
        .try_deserialize::<MigrationSettings>()
        .context("reading configuration values")?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use idmigrate_core::snapshot::SnapshotPolicy;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_canonical_key_variables() {
        let settings = settings_from(
            &SettingsArgs::default(),
            env(&[
                ("CLERK_SECRET_KEY", "sk_test_src"),
                ("WORKOS_SECRET_KEY", "sk_test_dst"),
            ]),
        )
        .unwrap();

        assert_eq!(settings.source_secret_key.unwrap().expose(), "sk_test_src");
        assert_eq!(
            settings.destination_secret_key.unwrap().expose(),
            "sk_test_dst"
        );
        assert_eq!(settings.page_limit, 500);
        assert!(settings.halt_on_error);
    }

    #[test]
    fn test_prefixed_variables_and_canonical_precedence() {
        let settings = settings_from(
            &SettingsArgs::default(),
            env(&[
                ("IDMIGRATE_SOURCE_SECRET_KEY", "sk_test_prefixed"),
                ("CLERK_SECRET_KEY", "sk_test_canonical"),
                ("IDMIGRATE_DESTINATION_SECRET_KEY", "sk_test_dst"),
                ("IDMIGRATE_PAGE_LIMIT", "50"),
                ("IDMIGRATE_LAUNCHER_ARGS", "--yes,--quiet"),
            ]),
        )
        .unwrap();

        assert_eq!(
            settings.source_secret_key.unwrap().expose(),
            "sk_test_canonical"
        );
        assert_eq!(
            settings.destination_secret_key.unwrap().expose(),
            "sk_test_dst"
        );
        assert_eq!(settings.page_limit, 50);
        assert_eq!(settings.launcher_args, vec!["--yes", "--quiet"]);
    }

    #[test]
    fn test_missing_keys_stay_unset() {
        let settings = settings_from(&SettingsArgs::default(), HashMap::new()).unwrap();
        assert!(settings.source_secret_key.is_none());
        assert!(settings.into_config().is_err());
    }

    #[test]
    fn test_file_then_flags() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "snapshot_dir = \"from-file\"\nsnapshot_policy = \"required\"\nmax_pages = 3\nhalt_on_error = true"
        )
        .unwrap();

        let args = SettingsArgs {
            config: Some(file.path().to_path_buf()),
            base_url: Some("http://127.0.0.1:8080/v1".to_string()),
            single_page: true,
            continue_on_error: true,
            ..SettingsArgs::default()
        };
        let settings = settings_from(&args, HashMap::new()).unwrap();

        assert_eq!(settings.snapshot_dir, PathBuf::from("from-file"));
        assert_eq!(settings.snapshot_policy, SnapshotPolicy::Required);
        assert_eq!(settings.max_pages, Some(3));
        assert_eq!(settings.source_base_url, "http://127.0.0.1:8080/v1");
        assert!(!settings.follow_pagination);
        assert!(!settings.halt_on_error);
        assert!(!settings.dry_run);
    }

    #[test]
    fn test_explicit_config_must_exist() {
        let args = SettingsArgs {
            config: Some(PathBuf::from("/nonexistent/idmigrate.toml")),
            ..SettingsArgs::default()
        };
        assert!(settings_from(&args, HashMap::new()).is_err());
    }
}
