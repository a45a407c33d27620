//! In-memory seams for driving the cycle in tests.
//!
//! All three fakes append to one shared event log so ordering across
//! fetches, snapshot writes and procedure runs can be asserted directly.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use idmigrate_core::config::{
    CycleOptions, MigrationConfig, ProcedureConfig, SnapshotConfig, SourceConfig,
};
use idmigrate_core::errors::{ExError, ExErrorKind, MigrateError, Result};
use idmigrate_core::model::{
    MembershipRecord, OrganizationId, OrganizationRecord, Page, PageRequest, ResourceKind,
    UserRecord,
};
use idmigrate_core::procedure::{MigrationProcedure, ProcedureNames, ProcedureOutput};
use idmigrate_core::snapshot::{SnapshotPolicy, SnapshotTarget};
use idmigrate_core::{Credentials, ProcedureRunner, SecretKey, SnapshotSink, SourceApi};
use serde_json::{json, Value};

pub type EventLog = Arc<Mutex<Vec<String>>>;

pub fn event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn events(log: &EventLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

pub fn position(log: &EventLog, event: &str) -> usize {
    events(log)
        .iter()
        .position(|e| e == event)
        .unwrap_or_else(|| panic!("event {} not recorded in {:?}", event, events(log)))
}

pub fn config(source_key: &str, destination_key: &str) -> MigrationConfig {
    MigrationConfig {
        credentials: Credentials {
            source: SecretKey::new(source_key),
            destination: SecretKey::new(destination_key),
        },
        source: SourceConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            page_limit: 500,
            follow_pagination: true,
            max_pages: None,
            request_timeout: std::time::Duration::from_secs(5),
        },
        snapshots: SnapshotConfig {
            dir: PathBuf::from("files"),
            policy: SnapshotPolicy::BestEffort,
        },
        procedures: ProcedureConfig {
            launcher: "npx".to_string(),
            launcher_args: Vec::new(),
            names: ProcedureNames::default(),
            users_output_path: PathBuf::from("./users_output.json"),
            organizations_output_path: PathBuf::from("./orgs_output.json"),
        },
        cycle: CycleOptions::default(),
    }
}

pub fn test_config() -> MigrationConfig {
    config("sk_test_source", "sk_test_destination")
}

/// Source serving fixed collections, one page at a time
#[derive(Default)]
pub struct FakeSource {
    pub users: Vec<Value>,
    pub organizations: Vec<Value>,
    pub memberships: HashMap<String, Vec<Value>>,
    /// Organization whose membership fetch fails
    pub failing_organization: Option<String>,
    pub log: EventLog,
    calls: Mutex<Vec<String>>,
}

impl FakeSource {
    pub fn new(log: &EventLog) -> Self {
        Self {
            log: log.clone(),
            ..Self::default()
        }
    }

    pub fn with_users(mut self, count: usize) -> Self {
        self.users = (0..count)
            .map(|i| json!({"id": format!("user_{}", i + 1), "first_name": "Test"}))
            .collect();
        self
    }

    pub fn with_organization(mut self, id: &str, memberships: usize) -> Self {
        self.organizations
            .push(json!({"id": id, "name": format!("Org {}", id)}));
        self.memberships.insert(
            id.to_string(),
            (0..memberships)
                .map(|i| json!({"id": format!("mem_{}_{}", id, i + 1), "role": "basic_member"}))
                .collect(),
        );
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls().len()
    }

    pub fn calls_to(&self, call: &str) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call.clone());
        self.log.lock().unwrap().push(format!("fetch:{}", call));
    }
}

fn page_of<T: From<Value>>(all: &[Value], page: PageRequest) -> Page<T> {
    let start = (page.offset as usize).min(all.len());
    let end = (start + page.limit as usize).min(all.len());
    Page::new(
        all[start..end].iter().cloned().map(T::from).collect(),
        Some(all.len() as u64),
    )
}

#[async_trait]
impl SourceApi for FakeSource {
    async fn fetch_users_page(
        &self,
        _key: &SecretKey,
        page: PageRequest,
    ) -> Result<Page<UserRecord>> {
        self.record("users".to_string());
        Ok(page_of(&self.users, page))
    }

    async fn fetch_organizations_page(
        &self,
        _key: &SecretKey,
        page: PageRequest,
    ) -> Result<Page<OrganizationRecord>> {
        self.record("organizations".to_string());
        Ok(page_of(&self.organizations, page))
    }

    async fn fetch_memberships_page(
        &self,
        _key: &SecretKey,
        organization_id: &OrganizationId,
        page: PageRequest,
    ) -> Result<Page<MembershipRecord>> {
        self.record(format!("memberships({})", organization_id));
        if self.failing_organization.as_deref() == Some(organization_id.as_str()) {
            return Err(MigrateError::Fetch {
                resource: ResourceKind::Memberships,
                organization_id: Some(organization_id.to_string()),
                status: Some(500),
                reason: "status 500".to_string(),
            }
            .into());
        }
        let all = self
            .memberships
            .get(organization_id.as_str())
            .cloned()
            .unwrap_or_default();
        Ok(page_of(&all, page))
    }
}

/// Snapshot sink keeping documents in memory
#[derive(Default)]
pub struct MemorySink {
    pub documents: Mutex<HashMap<String, Value>>,
    pub fail_writes: bool,
    pub fail_prepare: bool,
    pub log: EventLog,
}

impl MemorySink {
    pub fn new(log: &EventLog) -> Self {
        Self {
            log: log.clone(),
            ..Self::default()
        }
    }

    pub fn document(&self, path: &str) -> Option<Value> {
        self.documents.lock().unwrap().get(path).cloned()
    }

    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.documents.lock().unwrap().keys().cloned().collect();
        paths.sort();
        paths
    }
}

#[async_trait]
impl SnapshotSink for MemorySink {
    async fn prepare(&self) -> Result<()> {
        self.log.lock().unwrap().push("prepare".to_string());
        if self.fail_prepare {
            return Err(ExError::new(ExErrorKind::Snapshot).with_message("read-only"));
        }
        Ok(())
    }

    async fn write(&self, target: &SnapshotTarget, document: &Value) -> Result<()> {
        self.log.lock().unwrap().push(format!("snapshot:{}", target));
        if self.fail_writes {
            return Err(MigrateError::SnapshotWrite {
                path: target.to_string(),
                reason: "disk full".to_string(),
            }
            .into());
        }
        self.documents
            .lock()
            .unwrap()
            .insert(target.to_string(), document.clone());
        Ok(())
    }
}

/// Runner recording every invocation, failing on demand
#[derive(Default)]
pub struct RecordingRunner {
    pub failing_organizations: Vec<String>,
    pub fail_organization_migration: bool,
    pub log: EventLog,
    invocations: Mutex<Vec<String>>,
}

impl RecordingRunner {
    pub fn new(log: &EventLog) -> Self {
        Self {
            log: log.clone(),
            ..Self::default()
        }
    }

    pub fn failing_for(mut self, organization_id: &str) -> Self {
        self.failing_organizations.push(organization_id.to_string());
        self
    }

    pub fn invocations(&self) -> Vec<String> {
        self.invocations.lock().unwrap().clone()
    }
}

pub fn invocation_label(procedure: &MigrationProcedure) -> String {
    match procedure.organization_id() {
        Some(org) => format!("{}({})", procedure.kind(), org),
        None => procedure.kind().to_string(),
    }
}

#[async_trait]
impl ProcedureRunner for RecordingRunner {
    async fn run(&self, procedure: &MigrationProcedure) -> Result<ProcedureOutput> {
        let label = invocation_label(procedure);
        self.invocations.lock().unwrap().push(label.clone());
        self.log.lock().unwrap().push(format!("invoke:{}", label));

        let fails = match procedure {
            MigrationProcedure::OrgMigration(_) => self.fail_organization_migration,
            _ => procedure
                .organization_id()
                .is_some_and(|org| self.failing_organizations.iter().any(|f| f == org.as_str())),
        };
        if fails {
            return Err(MigrateError::ProcedureFailed {
                procedure: procedure.kind().to_string(),
                status: "exit status: 1".to_string(),
                exit_code: Some(1),
                organization_id: procedure.organization_id().map(|id| id.to_string()),
                stderr: "destination rejected the batch".to_string(),
            }
            .into());
        }
        Ok(ProcedureOutput::default())
    }
}
