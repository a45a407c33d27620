//! Snapshot sink interface
//!
//! A snapshot is a point-in-time JSON copy of one fetched collection,
//! written for audit and debugging. The cycle never reads it back.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::errors::Result;
use crate::model::{OrganizationId, ResourceKind};

/// Directory (under the snapshot root) holding per-organization memberships
pub const MEMBERSHIPS_DIR: &str = "memberships";

/// Which collection a snapshot holds
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SnapshotTarget {
    Users,
    Organizations,
    Memberships(OrganizationId),
}

impl SnapshotTarget {
    /// Path relative to the snapshot root. Stable across runs.
    pub fn relative_path(&self) -> PathBuf {
        match self {
            SnapshotTarget::Users => PathBuf::from("users.json"),
            SnapshotTarget::Organizations => PathBuf::from("organizations.json"),
            SnapshotTarget::Memberships(org) => {
                PathBuf::from(MEMBERSHIPS_DIR).join(format!("{}.json", org))
            }
        }
    }

    pub fn resource(&self) -> ResourceKind {
        match self {
            SnapshotTarget::Users => ResourceKind::Users,
            SnapshotTarget::Organizations => ResourceKind::Organizations,
            SnapshotTarget::Memberships(_) => ResourceKind::Memberships,
        }
    }
}

impl std::fmt::Display for SnapshotTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.relative_path().display())
    }
}

/// What a failed snapshot write does to the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotPolicy {
    /// Log the failure and keep going
    #[default]
    BestEffort,
    /// Abort the run
    Required,
}

/// Destination for snapshot documents
#[async_trait]
pub trait SnapshotSink: Send + Sync {
    /// Create the snapshot root and the memberships directory.
    ///
    /// Called once per run, before any per-organization write.
    ///
    /// # Errors
    ///
    /// `ExErrorKind::Snapshot` when a directory cannot be created.
    async fn prepare(&self) -> Result<()>;

    /// Write `document` for `target`, replacing any previous content.
    ///
    /// # Errors
    ///
    /// `ExErrorKind::Snapshot` on I/O failure, `ExErrorKind::Serialization`
    /// if the document cannot be rendered.
    async fn write(&self, target: &SnapshotTarget, document: &Value) -> Result<()>;
}
