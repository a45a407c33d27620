//! Run configuration
//!
//! `MigrationSettings` is the flat, deserializable shape that configuration
//! layers (file, environment, flags) merge into. `into_config` validates it
//! once into the `MigrationConfig` the engine consumes. Nothing below this
//! point reads the process environment.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::credentials::{Credentials, SecretKey};
use crate::errors::MigrateError;
use crate::model::MAX_PAGE_LIMIT;
use crate::procedure::ProcedureNames;
use crate::snapshot::SnapshotPolicy;

/// Flat settings as read from configuration sources
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MigrationSettings {
    pub source_secret_key: Option<SecretKey>,
    pub destination_secret_key: Option<SecretKey>,

    pub source_base_url: String,
    pub page_limit: u32,
    pub follow_pagination: bool,
    pub max_pages: Option<u32>,
    pub request_timeout_secs: u64,

    pub snapshot_dir: PathBuf,
    pub snapshot_policy: SnapshotPolicy,

    pub launcher: String,
    pub launcher_args: Vec<String>,
    pub user_procedure: String,
    pub organization_procedure: String,
    pub membership_procedure: String,
    pub users_output_path: PathBuf,
    pub organizations_output_path: PathBuf,

    pub halt_on_error: bool,
    pub dry_run: bool,
}

impl Default for MigrationSettings {
    fn default() -> Self {
        let names = ProcedureNames::default();
        Self {
            source_secret_key: None,
            destination_secret_key: None,
            source_base_url: defaults::SOURCE_BASE_URL.to_string(),
            page_limit: MAX_PAGE_LIMIT,
            follow_pagination: true,
            max_pages: None,
            request_timeout_secs: defaults::REQUEST_TIMEOUT_SECS,
            snapshot_dir: PathBuf::from(defaults::SNAPSHOT_DIR),
            snapshot_policy: SnapshotPolicy::default(),
            launcher: defaults::LAUNCHER.to_string(),
            launcher_args: Vec::new(),
            user_procedure: names.users,
            organization_procedure: names.organizations,
            membership_procedure: names.memberships,
            users_output_path: PathBuf::from(defaults::USERS_OUTPUT_PATH),
            organizations_output_path: PathBuf::from(defaults::ORGANIZATIONS_OUTPUT_PATH),
            halt_on_error: true,
            dry_run: false,
        }
    }
}

mod defaults {
    pub const SOURCE_BASE_URL: &str = "https://api.clerk.com/v1";
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;
    pub const SNAPSHOT_DIR: &str = "files";
    pub const LAUNCHER: &str = "npx";
    pub const USERS_OUTPUT_PATH: &str = "./users_output.json";
    pub const ORGANIZATIONS_OUTPUT_PATH: &str = "./orgs_output.json";
}

impl MigrationSettings {
    /// Validate into a `MigrationConfig`
    ///
    /// # Errors
    ///
    /// `MissingCredential` when a key is absent, `InvalidConfig` for
    /// out-of-range values. Environment-class agreement is checked later, by
    /// the cycle itself.
    pub fn into_config(self) -> Result<MigrationConfig, MigrateError> {
        let credentials =
            Credentials::from_parts(self.source_secret_key, self.destination_secret_key)?;

        if self.page_limit == 0 || self.page_limit > MAX_PAGE_LIMIT {
            return Err(invalid(
                "page_limit",
                format!("must be between 1 and {}", MAX_PAGE_LIMIT),
            ));
        }
        if self.max_pages == Some(0) {
            return Err(invalid("max_pages", "must be at least 1"));
        }
        if self.request_timeout_secs == 0 {
            return Err(invalid("request_timeout_secs", "must be at least 1"));
        }
        let base_url = self.source_base_url.trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(invalid("source_base_url", "must be an http(s) URL"));
        }
        if self.launcher.trim().is_empty() {
            return Err(invalid("launcher", "must not be empty"));
        }
        for (field, name) in [
            ("user_procedure", &self.user_procedure),
            ("organization_procedure", &self.organization_procedure),
            ("membership_procedure", &self.membership_procedure),
        ] {
            if name.trim().is_empty() {
                return Err(invalid(field, "must not be empty"));
            }
        }

        Ok(MigrationConfig {
            credentials,
            source: SourceConfig {
                base_url,
                page_limit: self.page_limit,
                follow_pagination: self.follow_pagination,
                max_pages: self.max_pages,
                request_timeout: Duration::from_secs(self.request_timeout_secs),
            },
            snapshots: SnapshotConfig {
                dir: self.snapshot_dir,
                policy: self.snapshot_policy,
            },
            procedures: ProcedureConfig {
                launcher: self.launcher,
                launcher_args: self.launcher_args,
                names: ProcedureNames {
                    users: self.user_procedure,
                    organizations: self.organization_procedure,
                    memberships: self.membership_procedure,
                },
                users_output_path: self.users_output_path,
                organizations_output_path: self.organizations_output_path,
            },
            cycle: CycleOptions {
                halt_on_error: self.halt_on_error,
                dry_run: self.dry_run,
            },
        })
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> MigrateError {
    MigrateError::InvalidConfig {
        field: field.to_string(),
        reason: reason.into(),
    }
}

/// Validated configuration for one run
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    pub credentials: Credentials,
    pub source: SourceConfig,
    pub snapshots: SnapshotConfig,
    pub procedures: ProcedureConfig,
    pub cycle: CycleOptions,
}

#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Base URL without trailing slash
    pub base_url: String,
    pub page_limit: u32,
    pub follow_pagination: bool,
    pub max_pages: Option<u32>,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct SnapshotConfig {
    pub dir: PathBuf,
    pub policy: SnapshotPolicy,
}

#[derive(Debug, Clone)]
pub struct ProcedureConfig {
    /// Program that resolves procedure names (e.g. `npx`)
    pub launcher: String,
    pub launcher_args: Vec<String>,
    pub names: ProcedureNames,
    pub users_output_path: PathBuf,
    pub organizations_output_path: PathBuf,
}

/// Behaviour switches for the cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleOptions {
    /// Abort the whole run on the first per-organization failure
    pub halt_on_error: bool,
    /// Fetch and snapshot, but invoke no procedure
    pub dry_run: bool,
}

impl Default for CycleOptions {
    fn default() -> Self {
        Self {
            halt_on_error: true,
            dry_run: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_with_keys() -> MigrationSettings {
        MigrationSettings {
            source_secret_key: Some(SecretKey::new("sk_test_src")),
            destination_secret_key: Some(SecretKey::new("sk_test_dst")),
            ..MigrationSettings::default()
        }
    }

    #[test]
    fn test_defaults_validate() {
        let config = settings_with_keys().into_config().unwrap();
        assert_eq!(config.source.page_limit, 500);
        assert_eq!(config.source.base_url, "https://api.clerk.com/v1");
        assert!(config.cycle.halt_on_error);
        assert!(!config.cycle.dry_run);
        assert_eq!(config.procedures.names.users, "migrate-clerk-users");
        assert_eq!(config.snapshots.policy, SnapshotPolicy::BestEffort);
    }

    #[test]
    fn test_missing_destination_key() {
        let settings = MigrationSettings {
            destination_secret_key: None,
            ..settings_with_keys()
        };
        assert!(matches!(
            settings.into_config(),
            Err(MigrateError::MissingCredential { .. })
        ));
    }

    #[test]
    fn test_page_limit_range() {
        for limit in [0, 501] {
            let settings = MigrationSettings {
                page_limit: limit,
                ..settings_with_keys()
            };
            assert!(matches!(
                settings.into_config(),
                Err(MigrateError::InvalidConfig { ref field, .. }) if field == "page_limit"
            ));
        }
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let settings = MigrationSettings {
            source_base_url: "http://localhost:8080/v1/".to_string(),
            ..settings_with_keys()
        };
        let config = settings.into_config().unwrap();
        assert_eq!(config.source.base_url, "http://localhost:8080/v1");
    }

    #[test]
    fn test_non_http_base_url_rejected() {
        let settings = MigrationSettings {
            source_base_url: "ftp://example".to_string(),
            ..settings_with_keys()
        };
        assert!(settings.into_config().is_err());
    }

    #[test]
    fn test_settings_deserialize_with_defaults() {
        let settings: MigrationSettings = serde_json::from_str(
            r#"{"source_secret_key": "sk_test_a", "halt_on_error": false, "snapshot_policy": "required"}"#,
        )
        .unwrap();
        assert!(!settings.halt_on_error);
        assert_eq!(settings.snapshot_policy, SnapshotPolicy::Required);
        assert_eq!(settings.launcher, "npx");
        assert_eq!(
            settings.source_secret_key.map(|k| k.expose().to_string()),
            Some("sk_test_a".to_string())
        );
    }
}
