//! idmigrate Core - domain model and seams of the identity migration cycle
//!
//! This crate provides the I/O-free half of idmigrate:
//! - Opaque user, organization and membership records
//! - The paginated collection model (`PageCursor`)
//! - Credentials and the cross-environment guard
//! - Validated run configuration
//! - The three seams the cycle drives: `SourceApi`, `SnapshotSink`,
//!   `ProcedureRunner`
//! - Error and logging facilities shared by every crate

pub mod config;
pub mod credentials;
pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod procedure;
pub mod snapshot;
pub mod source;

pub use idmigrate_core_types as core_types;

// Re-export commonly used types
pub use config::{CycleOptions, MigrationConfig, MigrationSettings};
pub use credentials::{Credentials, EnvironmentClass, SecretKey};
pub use errors::{ExError, ExErrorKind, MigrateError, Result};
pub use model::{
    CyclePhase, MembershipRecord, OrganizationId, OrganizationRecord, Page, PageCursor,
    PageRequest, ResourceKind, UserRecord,
};
pub use procedure::{MigrationProcedure, ProcedureKind, ProcedureOutput, ProcedureRunner};
pub use snapshot::{SnapshotPolicy, SnapshotSink, SnapshotTarget};
pub use source::SourceApi;
