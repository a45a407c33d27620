//! Snapshot persistence
//!
//! Provides:
//! - Filesystem layout under one snapshot root
//! - Pretty JSON documents, overwritten on every run

mod fs_store;

pub use fs_store::FsSnapshotStore;
