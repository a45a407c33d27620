//! Migration procedure contract
//!
//! The destination side is written by three external, independently
//! versioned tools. Each is modelled as one variant of `MigrationProcedure`
//! with a typed argument record; the argv is derived from it, never
//! assembled from free text.

use std::path::PathBuf;

use async_trait::async_trait;
use idmigrate_core_types::sensitive::REDACTED;

use crate::credentials::SecretKey;
use crate::errors::Result;
use crate::model::{OrganizationId, ResourceKind};

/// Arguments of the user migration procedure
#[derive(Debug, Clone)]
pub struct UserMigrationArgs {
    pub output_path: PathBuf,
    pub destination_key: SecretKey,
}

/// Arguments of the organization migration procedure
#[derive(Debug, Clone)]
pub struct OrgMigrationArgs {
    pub output_path: PathBuf,
    pub destination_key: SecretKey,
}

/// Arguments of the membership migration procedure
#[derive(Debug, Clone)]
pub struct MembershipMigrationArgs {
    pub organization_id: OrganizationId,
    pub destination_key: SecretKey,
}

/// One invocation of an external migration procedure
#[derive(Debug, Clone)]
pub enum MigrationProcedure {
    UserMigration(UserMigrationArgs),
    OrgMigration(OrgMigrationArgs),
    MembershipMigration(MembershipMigrationArgs),
}

/// Variant tag, for naming and logging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcedureKind {
    UserMigration,
    OrgMigration,
    MembershipMigration,
}

impl ProcedureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcedureKind::UserMigration => "user_migration",
            ProcedureKind::OrgMigration => "org_migration",
            ProcedureKind::MembershipMigration => "membership_migration",
        }
    }

    pub fn resource(&self) -> ResourceKind {
        match self {
            ProcedureKind::UserMigration => ResourceKind::Users,
            ProcedureKind::OrgMigration => ResourceKind::Organizations,
            ProcedureKind::MembershipMigration => ResourceKind::Memberships,
        }
    }
}

impl std::fmt::Display for ProcedureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Executable names of the three procedures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcedureNames {
    pub users: String,
    pub organizations: String,
    pub memberships: String,
}

impl Default for ProcedureNames {
    fn default() -> Self {
        Self {
            users: "migrate-clerk-users".to_string(),
            organizations: "migrate-clerk-orgs".to_string(),
            memberships: "migrate-clerk-org-memberships".to_string(),
        }
    }
}

impl ProcedureNames {
    pub fn for_kind(&self, kind: ProcedureKind) -> &str {
        match kind {
            ProcedureKind::UserMigration => &self.users,
            ProcedureKind::OrgMigration => &self.organizations,
            ProcedureKind::MembershipMigration => &self.memberships,
        }
    }
}

/// Value of one named argument
#[derive(Debug, Clone)]
pub enum ArgValue<'a> {
    Plain(String),
    Secret(&'a SecretKey),
}

/// One `--flag=value` argument
#[derive(Debug, Clone)]
pub struct ProcedureArg<'a> {
    pub flag: &'static str,
    pub value: ArgValue<'a>,
}

impl ProcedureArg<'_> {
    /// The argv element handed to the child process
    pub fn render(&self) -> String {
        match &self.value {
            ArgValue::Plain(v) => format!("{}={}", self.flag, v),
            ArgValue::Secret(key) => format!("{}={}", self.flag, key.expose()),
        }
    }

    /// The same element with secrets masked, for logs
    pub fn render_redacted(&self) -> String {
        match &self.value {
            ArgValue::Plain(v) => format!("{}={}", self.flag, v),
            ArgValue::Secret(_) => format!("{}={}", self.flag, REDACTED),
        }
    }
}

pub const FLAG_OUTPUT: &str = "--output";
pub const FLAG_ORGANIZATION_ID: &str = "--clerkOrgId";
pub const FLAG_DESTINATION_KEY: &str = "--WORKOS_SECRET_KEY";

impl MigrationProcedure {
    pub fn kind(&self) -> ProcedureKind {
        match self {
            MigrationProcedure::UserMigration(_) => ProcedureKind::UserMigration,
            MigrationProcedure::OrgMigration(_) => ProcedureKind::OrgMigration,
            MigrationProcedure::MembershipMigration(_) => ProcedureKind::MembershipMigration,
        }
    }

    /// Organization scope of a membership migration
    pub fn organization_id(&self) -> Option<&OrganizationId> {
        match self {
            MigrationProcedure::MembershipMigration(args) => Some(&args.organization_id),
            _ => None,
        }
    }

    /// Named arguments, in argv order
    pub fn arguments(&self) -> Vec<ProcedureArg<'_>> {
        match self {
            MigrationProcedure::UserMigration(args) => vec![
                ProcedureArg {
                    flag: FLAG_OUTPUT,
                    value: ArgValue::Plain(args.output_path.display().to_string()),
                },
                ProcedureArg {
                    flag: FLAG_DESTINATION_KEY,
                    value: ArgValue::Secret(&args.destination_key),
                },
            ],
            MigrationProcedure::OrgMigration(args) => vec![
                ProcedureArg {
                    flag: FLAG_OUTPUT,
                    value: ArgValue::Plain(args.output_path.display().to_string()),
                },
                ProcedureArg {
                    flag: FLAG_DESTINATION_KEY,
                    value: ArgValue::Secret(&args.destination_key),
                },
            ],
            MigrationProcedure::MembershipMigration(args) => vec![
                ProcedureArg {
                    flag: FLAG_ORGANIZATION_ID,
                    value: ArgValue::Plain(args.organization_id.to_string()),
                },
                ProcedureArg {
                    flag: FLAG_DESTINATION_KEY,
                    value: ArgValue::Secret(&args.destination_key),
                },
            ],
        }
    }
}

/// Captured streams of a finished procedure
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcedureOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Executes migration procedures
#[async_trait]
pub trait ProcedureRunner: Send + Sync {
    /// Run the procedure to completion.
    ///
    /// # Errors
    ///
    /// `ExErrorKind::ProcedureLaunch` if it cannot be started,
    /// `ExErrorKind::ProcedureFailed` if it exits unsuccessfully.
    async fn run(&self, procedure: &MigrationProcedure) -> Result<ProcedureOutput>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn membership(org: &str) -> MigrationProcedure {
        MigrationProcedure::MembershipMigration(MembershipMigrationArgs {
            organization_id: OrganizationId::parse(org).unwrap(),
            destination_key: SecretKey::new("sk_test_dest"),
        })
    }

    #[test]
    fn test_membership_argv() {
        let procedure = membership("org_1");
        let argv: Vec<String> = procedure.arguments().iter().map(|a| a.render()).collect();
        assert_eq!(
            argv,
            vec!["--clerkOrgId=org_1", "--WORKOS_SECRET_KEY=sk_test_dest"]
        );
        assert_eq!(procedure.organization_id().unwrap().as_str(), "org_1");
    }

    #[test]
    fn test_redacted_rendering_hides_secret() {
        let procedure = MigrationProcedure::UserMigration(UserMigrationArgs {
            output_path: PathBuf::from("./users_output.json"),
            destination_key: SecretKey::new("sk_live_secret"),
        });
        let logged: Vec<String> = procedure
            .arguments()
            .iter()
            .map(|a| a.render_redacted())
            .collect();
        assert_eq!(logged[0], "--output=./users_output.json");
        assert!(!logged.join(" ").contains("sk_live_secret"));
    }

    #[test]
    fn test_kind_and_names() {
        let names = ProcedureNames::default();
        assert_eq!(
            names.for_kind(membership("o").kind()),
            "migrate-clerk-org-memberships"
        );
        assert_eq!(
            ProcedureKind::OrgMigration.resource(),
            ResourceKind::Organizations
        );
    }
}
