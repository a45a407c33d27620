//! idmigrate Store - snapshot persistence
//!
//! Provides:
//! - Filesystem snapshot store (`FsSnapshotStore`) behind `SnapshotSink`
//! - Store-specific error helpers

pub mod errors;
pub mod snapshot;

// Re-export key types
pub use errors::Result;
pub use snapshot::FsSnapshotStore;
