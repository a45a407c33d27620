//! Filesystem snapshot store
//!
//! Layout under the root:
//!
//! ```text
//! <root>/users.json
//! <root>/organizations.json
//! <root>/memberships/<org_id>.json
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use idmigrate_core::snapshot::{SnapshotSink, SnapshotTarget, MEMBERSHIPS_DIR};
use serde_json::Value;

use crate::errors::{prepare_error, serialization_error, snapshot_write_error, Result};

/// Snapshot store rooted at a directory
pub struct FsSnapshotStore {
    root: PathBuf,
}

impl FsSnapshotStore {
    /// Create a store at the given root directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of a target's document
    pub fn path_for(&self, target: &SnapshotTarget) -> PathBuf {
        self.root.join(target.relative_path())
    }
}

#[async_trait]
impl SnapshotSink for FsSnapshotStore {
    async fn prepare(&self) -> Result<()> {
        let memberships = self.root.join(MEMBERSHIPS_DIR);
        tokio::fs::create_dir_all(&memberships)
            .await
            .map_err(|e| prepare_error(&memberships, e))?;
        tracing::debug!(root = %self.root.display(), "Prepared snapshot directories");
        Ok(())
    }

    /// Truncates and rewrites the document in place. Parent directories are
    /// not created here; `prepare` owns that.
    async fn write(&self, target: &SnapshotTarget, document: &Value) -> Result<()> {
        let mut json =
            serde_json::to_string_pretty(document).map_err(|e| serialization_error(target, e))?;
        json.push('\n');

        let path = self.path_for(target);
        tokio::fs::write(&path, json.as_bytes())
            .await
            .map_err(|e| snapshot_write_error(target, &path, e))?;

        tracing::debug!(
            path = %path.display(),
            size_bytes = json.len(),
            "Wrote snapshot"
        );
        Ok(())
    }
}
