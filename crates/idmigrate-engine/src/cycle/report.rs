use chrono::{DateTime, Utc};
use idmigrate_core::ExError;
use serde::Serialize;

/// One organization that could not be migrated in a continue-on-error run
#[derive(Debug, Clone, Serialize)]
pub struct OrganizationFailure {
    /// Position in the fetched organization list
    pub position: usize,
    /// `None` when the record had no usable id
    pub organization_id: Option<String>,
    pub code: String,
    pub message: String,
}

impl OrganizationFailure {
    pub fn from_error(position: usize, organization_id: Option<String>, err: &ExError) -> Self {
        Self {
            position,
            organization_id,
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

/// Outcome of a completed migration cycle
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub dry_run: bool,

    pub users_fetched: usize,
    pub organizations_fetched: usize,
    pub memberships_fetched: usize,
    pub organizations_migrated: usize,

    pub procedures_run: usize,
    pub procedures_skipped: usize,

    pub snapshots_written: usize,
    /// Relative paths of snapshots that failed under the best-effort policy
    pub snapshot_failures: Vec<String>,
    pub failed_organizations: Vec<OrganizationFailure>,
}

impl CycleReport {
    pub fn new(run_id: impl Into<String>, dry_run: bool) -> Self {
        Self {
            run_id: run_id.into(),
            started_at: Utc::now(),
            finished_at: None,
            dry_run,
            users_fetched: 0,
            organizations_fetched: 0,
            memberships_fetched: 0,
            organizations_migrated: 0,
            procedures_run: 0,
            procedures_skipped: 0,
            snapshots_written: 0,
            snapshot_failures: Vec::new(),
            failed_organizations: Vec::new(),
        }
    }

    /// True when every organization was migrated
    pub fn is_success(&self) -> bool {
        self.failed_organizations.is_empty()
    }

    pub fn duration_ms(&self) -> Option<i64> {
        self.finished_at
            .map(|end| (end - self.started_at).num_milliseconds())
    }

    /// One-line human summary
    pub fn summary(&self) -> String {
        let mut line = format!(
            "run {}: {} users, {} organizations, {} memberships fetched; {}/{} organizations migrated",
            self.run_id,
            self.users_fetched,
            self.organizations_fetched,
            self.memberships_fetched,
            self.organizations_migrated,
            self.organizations_fetched,
        );
        if self.dry_run {
            line.push_str(&format!(
                " (dry run, {} procedures skipped)",
                self.procedures_skipped
            ));
        }
        if !self.failed_organizations.is_empty() {
            line.push_str(&format!(
                "; {} organizations failed",
                self.failed_organizations.len()
            ));
        }
        if !self.snapshot_failures.is_empty() {
            line.push_str(&format!(
                "; {} snapshots not written",
                self.snapshot_failures.len()
            ));
        }
        line
    }
}
