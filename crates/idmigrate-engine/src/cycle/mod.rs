//! The migration cycle.
//!
//! One run validates the credential pair, fetches users and organizations,
//! snapshots and migrates both, then walks the organizations in source
//! order: fetch memberships, snapshot, migrate. Every step completes before
//! the next one starts, and a snapshot is on disk before the procedure for
//! the same collection is launched.
//!
//! The cycle reads nothing from the process environment; everything it
//! needs arrives through `MigrationConfig` and the three seams.

mod report;

pub use report::{CycleReport, OrganizationFailure};

use std::time::Instant;

use chrono::Utc;
use idmigrate_core::config::MigrationConfig;
use idmigrate_core::core_types::RunContext;
use idmigrate_core::errors::{ExError, Result};
use idmigrate_core::model::{
    CyclePhase, MembershipRecord, OrganizationId, OrganizationRecord, PageCursor, ResourceKind,
    UserRecord,
};
use idmigrate_core::procedure::{
    MembershipMigrationArgs, MigrationProcedure, OrgMigrationArgs, UserMigrationArgs,
};
use idmigrate_core::snapshot::{SnapshotPolicy, SnapshotSink, SnapshotTarget};
use idmigrate_core::{log_op_end, log_op_error, log_op_start, ProcedureRunner, SourceApi};
use serde::Serialize;
use tracing::Instrument;

use crate::source::collect_pages;

const SNAPSHOT_PREPARATION: &str = "snapshot preparation";

/// Run one migration cycle with a fresh run id.
///
/// # Errors
///
/// The first fatal error, tagged with the phase it occurred in. With
/// `halt_on_error = false` per-organization failures are reported in the
/// returned `CycleReport` instead.
pub async fn run_migration_cycle(
    config: &MigrationConfig,
    source: &dyn SourceApi,
    snapshots: &dyn SnapshotSink,
    runner: &dyn ProcedureRunner,
) -> Result<CycleReport> {
    MigrationCycle::new(config, source, snapshots, runner)
        .run()
        .await
}

/// A single run of the cycle state machine
pub struct MigrationCycle<'a> {
    config: &'a MigrationConfig,
    source: &'a dyn SourceApi,
    snapshots: &'a dyn SnapshotSink,
    runner: &'a dyn ProcedureRunner,
    context: RunContext,
    phase: CyclePhase,
    report: CycleReport,
}

impl<'a> MigrationCycle<'a> {
    pub fn new(
        config: &'a MigrationConfig,
        source: &'a dyn SourceApi,
        snapshots: &'a dyn SnapshotSink,
        runner: &'a dyn ProcedureRunner,
    ) -> Self {
        let context = RunContext::new();
        let report = CycleReport::new(context.run_id.as_str(), config.cycle.dry_run);
        Self {
            config,
            source,
            snapshots,
            runner,
            context,
            phase: CyclePhase::Init,
            report,
        }
    }

    /// Use a caller-supplied correlation context
    pub fn with_context(mut self, context: RunContext) -> Self {
        self.report.run_id = context.run_id.to_string();
        self.context = context;
        self
    }

    pub fn context(&self) -> &RunContext {
        &self.context
    }

    pub fn phase(&self) -> &CyclePhase {
        &self.phase
    }

    /// Drive the cycle to `Done` or `Failed`.
    ///
    /// # Errors
    ///
    /// See [`run_migration_cycle`].
    pub async fn run(mut self) -> Result<CycleReport> {
        let span = tracing::info_span!(
            "migration_cycle",
            run_id = %self.context.run_id,
            label = self.context.label.as_deref(),
        );

        async move {
            let started = Instant::now();
            log_op_start!(
                "migration_cycle",
                dry_run = self.config.cycle.dry_run,
                halt_on_error = self.config.cycle.halt_on_error
            );

            match self.drive().await {
                Ok(()) => {
                    self.transition(CyclePhase::Done);
                    self.report.finished_at = Some(Utc::now());
                    log_op_end!(
                        "migration_cycle",
                        duration_ms = elapsed_ms(started),
                        organizations_migrated = self.report.organizations_migrated,
                        organizations_failed = self.report.failed_organizations.len()
                    );
                    Ok(self.report)
                }
                Err(err) => {
                    let err = err.with_run_id(self.context.run_id.clone());
                    self.transition(CyclePhase::Failed);
                    log_op_error!(
                        "migration_cycle",
                        err.clone(),
                        duration_ms = elapsed_ms(started),
                        phase = err.phase()
                    );
                    Err(err)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn drive(&mut self) -> Result<()> {
        let config = self.config;

        let class = config
            .credentials
            .validate()
            .map_err(|e| ExError::from(e).with_phase(CyclePhase::Validated))?;
        tracing::info!(environment = %class, "Credentials validated");
        self.transition(CyclePhase::Validated);

        self.prepare_snapshots().await?;

        let users = self
            .fetch_users()
            .await
            .map_err(|e| e.with_phase(CyclePhase::UsersFetched))?;
        self.report.users_fetched = users.len();
        self.transition(CyclePhase::UsersFetched);

        let organizations = self
            .fetch_organizations()
            .await
            .map_err(|e| e.with_phase(CyclePhase::OrgsFetched))?;
        self.report.organizations_fetched = organizations.len();
        self.transition(CyclePhase::OrgsFetched);

        self.snapshot_and_invoke(
            SnapshotTarget::Users,
            &users,
            MigrationProcedure::UserMigration(UserMigrationArgs {
                output_path: config.procedures.users_output_path.clone(),
                destination_key: config.credentials.destination.clone(),
            }),
        )
        .await
        .map_err(|e| e.with_phase(CyclePhase::UsersMigrated))?;
        self.transition(CyclePhase::UsersMigrated);

        self.snapshot_and_invoke(
            SnapshotTarget::Organizations,
            &organizations,
            MigrationProcedure::OrgMigration(OrgMigrationArgs {
                output_path: config.procedures.organizations_output_path.clone(),
                destination_key: config.credentials.destination.clone(),
            }),
        )
        .await
        .map_err(|e| e.with_phase(CyclePhase::OrgsMigrated))?;
        self.transition(CyclePhase::OrgsMigrated);

        let total = organizations.len();
        for (position, organization) in organizations.iter().enumerate() {
            let started = Instant::now();
            match self.migrate_organization(position, total, organization).await {
                Ok(()) => self.report.organizations_migrated += 1,
                Err(err) if config.cycle.halt_on_error => return Err(err),
                Err(err) => {
                    log_op_error!(
                        "migrate_organization",
                        err.clone(),
                        duration_ms = elapsed_ms(started),
                        position = position
                    );
                    self.report
                        .failed_organizations
                        .push(OrganizationFailure::from_error(
                            position,
                            err.organization_id().map(str::to_string),
                            &err,
                        ));
                }
            }
        }

        Ok(())
    }

    async fn migrate_organization(
        &mut self,
        position: usize,
        total: usize,
        organization: &OrganizationRecord,
    ) -> Result<()> {
        let organization_id = organization.id().map_err(|e| {
            ExError::from(e).with_phase(format!("memberships of organization #{}", position + 1))
        })?;

        let phase = CyclePhase::Memberships(organization_id.clone());
        self.transition(phase.clone());
        tracing::info!(
            organization_id = organization_id.as_str(),
            "Migrating memberships for organization {} of {}",
            position + 1,
            total
        );

        self.migrate_memberships(&organization_id)
            .await
            .map_err(|e| {
                e.with_organization_id(organization_id.as_str())
                    .with_phase(&phase)
            })
    }

    async fn migrate_memberships(&mut self, organization_id: &OrganizationId) -> Result<()> {
        let memberships = self.fetch_memberships(organization_id).await?;
        self.report.memberships_fetched += memberships.len();

        self.snapshot_and_invoke(
            SnapshotTarget::Memberships(organization_id.clone()),
            &memberships,
            MigrationProcedure::MembershipMigration(MembershipMigrationArgs {
                organization_id: organization_id.clone(),
                destination_key: self.config.credentials.destination.clone(),
            }),
        )
        .await
    }

    /// Snapshot a fetched collection, then hand it to its procedure
    async fn snapshot_and_invoke<T: Serialize>(
        &mut self,
        target: SnapshotTarget,
        records: &[T],
        procedure: MigrationProcedure,
    ) -> Result<()> {
        self.write_snapshot(target, records).await?;
        self.invoke(procedure).await
    }

    fn transition(&mut self, next: CyclePhase) {
        tracing::debug!(
            from = self.phase.name(),
            to = next.name(),
            "Cycle phase transition"
        );
        self.phase = next;
    }

    fn cursor(&self) -> PageCursor {
        let source = &self.config.source;
        PageCursor::new(
            source.page_limit,
            source.follow_pagination,
            source.max_pages,
        )
    }

    async fn fetch_users(&self) -> Result<Vec<UserRecord>> {
        let op = ResourceKind::Users.fetch_op();
        let started = Instant::now();
        log_op_start!(op);

        let source = self.source;
        let key = &self.config.credentials.source;
        let users = collect_pages(ResourceKind::Users, self.cursor(), |page| {
            source.fetch_users_page(key, page)
        })
        .await?;

        log_op_end!(
            op,
            duration_ms = elapsed_ms(started),
            record_count = users.len()
        );
        tracing::info!("Fetched {} users", users.len());
        Ok(users)
    }

    async fn fetch_organizations(&self) -> Result<Vec<OrganizationRecord>> {
        let op = ResourceKind::Organizations.fetch_op();
        let started = Instant::now();
        log_op_start!(op);

        let source = self.source;
        let key = &self.config.credentials.source;
        let organizations = collect_pages(ResourceKind::Organizations, self.cursor(), |page| {
            source.fetch_organizations_page(key, page)
        })
        .await?;

        log_op_end!(
            op,
            duration_ms = elapsed_ms(started),
            record_count = organizations.len()
        );
        tracing::info!("Fetched {} organizations", organizations.len());
        Ok(organizations)
    }

    async fn fetch_memberships(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<MembershipRecord>> {
        let op = ResourceKind::Memberships.fetch_op();
        let started = Instant::now();
        log_op_start!(op, organization_id = organization_id.as_str());

        let source = self.source;
        let key = &self.config.credentials.source;
        let memberships = collect_pages(ResourceKind::Memberships, self.cursor(), |page| {
            source.fetch_memberships_page(key, organization_id, page)
        })
        .await?;

        log_op_end!(
            op,
            duration_ms = elapsed_ms(started),
            organization_id = organization_id.as_str(),
            record_count = memberships.len()
        );
        Ok(memberships)
    }

    async fn prepare_snapshots(&mut self) -> Result<()> {
        match self.snapshots.prepare().await {
            Ok(()) => Ok(()),
            Err(err) => match self.config.snapshots.policy {
                SnapshotPolicy::Required => Err(err.with_phase(SNAPSHOT_PREPARATION)),
                SnapshotPolicy::BestEffort => {
                    tracing::warn!(error = %err, "Snapshot directories not prepared; continuing");
                    Ok(())
                }
            },
        }
    }

    async fn write_snapshot<T: Serialize>(
        &mut self,
        target: SnapshotTarget,
        records: &[T],
    ) -> Result<()> {
        let outcome = match serde_json::to_value(records) {
            Ok(document) => self.snapshots.write(&target, &document).await,
            Err(e) => Err(ExError::from(e)),
        };

        match outcome {
            Ok(()) => {
                self.report.snapshots_written += 1;
                tracing::debug!(
                    snapshot = %target,
                    record_count = records.len(),
                    "Snapshot written"
                );
                Ok(())
            }
            Err(err) => match self.config.snapshots.policy {
                SnapshotPolicy::Required => Err(err),
                SnapshotPolicy::BestEffort => {
                    tracing::warn!(snapshot = %target, error = %err, "Snapshot not written; continuing");
                    self.report.snapshot_failures.push(target.to_string());
                    Ok(())
                }
            },
        }
    }

    async fn invoke(&mut self, procedure: MigrationProcedure) -> Result<()> {
        let config = self.config;
        let name = config.procedures.names.for_kind(procedure.kind());
        let organization_id = procedure.organization_id().map(|id| id.as_str());

        if config.cycle.dry_run {
            tracing::info!(
                procedure = name,
                organization_id = organization_id,
                "Dry run; procedure not invoked"
            );
            self.report.procedures_skipped += 1;
            return Ok(());
        }

        let started = Instant::now();
        log_op_start!(
            "run_procedure",
            procedure = name,
            organization_id = organization_id
        );
        self.runner.run(&procedure).await?;
        log_op_end!(
            "run_procedure",
            duration_ms = elapsed_ms(started),
            procedure = name
        );
        self.report.procedures_run += 1;
        Ok(())
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
