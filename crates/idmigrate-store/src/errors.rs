//! Error handling for idmigrate-store
//!
//! Wraps idmigrate-core ExError with store-specific helpers

use std::path::Path;

use idmigrate_core::errors::{ExError, ExErrorKind, MigrateError};
use idmigrate_core::snapshot::SnapshotTarget;

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create a snapshot write error for a target
pub fn snapshot_write_error(target: &SnapshotTarget, path: &Path, err: std::io::Error) -> ExError {
    let ex: ExError = MigrateError::SnapshotWrite {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
    .into();
    let ex = ex.with_resource(target.resource());
    match target {
        SnapshotTarget::Memberships(org) => ex.with_organization_id(org.as_str()),
        _ => ex,
    }
}

/// Create a directory preparation error
pub fn prepare_error(path: &Path, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Snapshot)
        .with_op("prepare_snapshot_dir")
        .with_message(format!(
            "Failed to create snapshot directory {}: {}",
            path.display(),
            err
        ))
}

/// Create a serialization error for a target
pub fn serialization_error(target: &SnapshotTarget, err: serde_json::Error) -> ExError {
    ExError::new(ExErrorKind::Serialization)
        .with_op("write_snapshot")
        .with_resource(target.resource())
        .with_message(format!("Failed to serialize snapshot {}: {}", target, err))
}
