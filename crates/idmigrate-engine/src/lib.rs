//! idmigrate Engine - I/O adapters and cycle orchestration
//!
//! Provides the concrete source client and procedure runner, and the
//! migration cycle that drives them through the core seams.

pub mod cycle;
pub mod procedure;
pub mod source;

pub use cycle::{run_migration_cycle, CycleReport, MigrationCycle, OrganizationFailure};
pub use procedure::CommandRunner;
pub use source::HttpSourceClient;
