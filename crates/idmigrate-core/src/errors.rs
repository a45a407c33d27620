use idmigrate_core_types::RunId;
use thiserror::Error;

use crate::model::ResourceKind;

/// Result type alias using the structured error facility
pub type Result<T> = std::result::Result<T, ExError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code used in logs, tests and the
/// single failure line printed by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Configuration
    MissingCredential,
    EnvironmentMismatch,
    InvalidConfig,

    // Source API
    Fetch,
    Decode,

    // Records
    InvalidInput,

    // Snapshot store
    Snapshot,
    Serialization,

    // Migration procedures
    ProcedureLaunch,
    ProcedureFailed,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::MissingCredential => "ERR_MISSING_CREDENTIAL",
            ExErrorKind::EnvironmentMismatch => "ERR_ENVIRONMENT_MISMATCH",
            ExErrorKind::InvalidConfig => "ERR_INVALID_CONFIG",
            ExErrorKind::Fetch => "ERR_FETCH",
            ExErrorKind::Decode => "ERR_DECODE",
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::Snapshot => "ERR_SNAPSHOT",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::ProcedureLaunch => "ERR_PROCEDURE_LAUNCH",
            ExErrorKind::ProcedureFailed => "ERR_PROCEDURE_FAILED",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }

    /// Configuration errors are raised before any network activity
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ExErrorKind::MissingCredential
                | ExErrorKind::EnvironmentMismatch
                | ExErrorKind::InvalidConfig
        )
    }
}

/// Canonical structured error type
///
/// Carries the classification plus enough context (operation, resource,
/// organization, cycle phase) for the one-line failure report.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    resource: Option<ResourceKind>,
    organization_id: Option<String>,
    phase: Option<String>,
    exit_code: Option<i32>,
    run_id: Option<RunId>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            resource: None,
            organization_id: None,
            phase: None,
            exit_code: None,
            run_id: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add resource kind context
    pub fn with_resource(mut self, resource: ResourceKind) -> Self {
        self.resource = Some(resource);
        self
    }

    /// Add organization context
    pub fn with_organization_id(mut self, id: impl Into<String>) -> Self {
        self.organization_id = Some(id.into());
        self
    }

    /// Add cycle phase context. An existing phase is kept: the innermost
    /// phase is the one that failed.
    pub fn with_phase(mut self, phase: impl std::fmt::Display) -> Self {
        if self.phase.is_none() {
            self.phase = Some(phase.to_string());
        }
        self
    }

    /// Add the exit code of a failed procedure
    pub fn with_exit_code(mut self, code: i32) -> Self {
        self.exit_code = Some(code);
        self
    }

    /// Add run correlation
    pub fn with_run_id(mut self, run_id: RunId) -> Self {
        self.run_id = Some(run_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the resource kind, if any
    pub fn resource(&self) -> Option<ResourceKind> {
        self.resource
    }

    /// Get the organization context, if any
    pub fn organization_id(&self) -> Option<&str> {
        self.organization_id.as_deref()
    }

    /// Get the cycle phase, if any
    pub fn phase(&self) -> Option<&str> {
        self.phase.as_deref()
    }

    /// Get the procedure exit code, if any
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// Get the run id, if any
    pub fn run_id(&self) -> Option<&RunId> {
        self.run_id.as_ref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(phase) = &self.phase {
            write!(f, " during {}", phase)?;
        }
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(resource) = self.resource {
            write!(f, " (resource: {})", resource)?;
        }
        if let Some(org) = &self.organization_id {
            write!(f, " (organization_id: {})", org)?;
        }
        if let Some(code) = self.exit_code {
            write!(f, " (exit_code: {})", code)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Domain error taxonomy for a migration run
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MigrateError {
    /// A required secret key was not configured
    #[error("Missing required credential: {name}")]
    MissingCredential { name: String },

    /// Source and destination keys belong to different environment classes
    #[error(
        "Credential environment mismatch: source is {source_class}, destination is {destination_class}; refusing to migrate across environments"
    )]
    EnvironmentMismatch {
        source_class: String,
        destination_class: String,
    },

    /// A configuration value is out of range or malformed
    #[error("Invalid configuration for {field}: {reason}")]
    InvalidConfig { field: String, reason: String },

    /// The source API request failed (transport or non-success status)
    #[error("Failed to fetch {resource}: {reason}")]
    Fetch {
        resource: ResourceKind,
        organization_id: Option<String>,
        status: Option<u16>,
        reason: String,
    },

    /// The source API returned a body we could not decode
    #[error("Unexpected {resource} response: {reason}")]
    Decode {
        resource: ResourceKind,
        organization_id: Option<String>,
        reason: String,
    },

    /// Organization record without a usable id
    #[error("Invalid organization id: {reason}")]
    InvalidOrganizationId { reason: String },

    /// Snapshot write failed
    #[error("Failed to write snapshot {path}: {reason}")]
    SnapshotWrite { path: String, reason: String },

    /// Migration procedure could not be started
    #[error("Failed to launch procedure {procedure}: {reason}")]
    ProcedureLaunch { procedure: String, reason: String },

    /// Migration procedure ran and exited unsuccessfully
    #[error("Procedure {procedure} exited with status {status}")]
    ProcedureFailed {
        procedure: String,
        status: String,
        exit_code: Option<i32>,
        organization_id: Option<String>,
        stderr: String,
    },
}

impl From<MigrateError> for ExError {
    fn from(err: MigrateError) -> Self {
        let message = err.to_string();
        match err {
            MigrateError::MissingCredential { .. } => {
                ExError::new(ExErrorKind::MissingCredential).with_message(message)
            }

            MigrateError::EnvironmentMismatch { .. } => {
                ExError::new(ExErrorKind::EnvironmentMismatch)
                    .with_op("validate_credentials")
                    .with_message(message)
            }

            MigrateError::InvalidConfig { .. } => {
                ExError::new(ExErrorKind::InvalidConfig).with_message(message)
            }

            MigrateError::Fetch {
                resource,
                organization_id,
                ..
            } => {
                let err = ExError::new(ExErrorKind::Fetch)
                    .with_op(resource.fetch_op())
                    .with_resource(resource)
                    .with_message(message);
                match organization_id {
                    Some(id) => err.with_organization_id(id),
                    None => err,
                }
            }

            MigrateError::Decode {
                resource,
                organization_id,
                ..
            } => {
                let err = ExError::new(ExErrorKind::Decode)
                    .with_op(resource.fetch_op())
                    .with_resource(resource)
                    .with_message(message);
                match organization_id {
                    Some(id) => err.with_organization_id(id),
                    None => err,
                }
            }

            MigrateError::InvalidOrganizationId { .. } => {
                ExError::new(ExErrorKind::InvalidInput)
                    .with_resource(ResourceKind::Organizations)
                    .with_message(message)
            }

            MigrateError::SnapshotWrite { .. } => ExError::new(ExErrorKind::Snapshot)
                .with_op("write_snapshot")
                .with_message(message),

            MigrateError::ProcedureLaunch { .. } => {
                ExError::new(ExErrorKind::ProcedureLaunch)
                    .with_op("run_procedure")
                    .with_message(message)
            }

            MigrateError::ProcedureFailed {
                exit_code,
                organization_id,
                stderr,
                ..
            } => {
                let detail = stderr.trim();
                let message = if detail.is_empty() {
                    message
                } else {
                    format!("{}: {}", message, detail)
                };
                let mut err = ExError::new(ExErrorKind::ProcedureFailed)
                    .with_op("run_procedure")
                    .with_message(message);
                if let Some(code) = exit_code {
                    err = err.with_exit_code(code);
                }
                if let Some(id) = organization_id {
                    err = err.with_organization_id(id);
                }
                err
            }
        }
    }
}

impl From<serde_json::Error> for ExError {
    fn from(err: serde_json::Error) -> Self {
        ExError::new(ExErrorKind::Serialization).with_message(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_codes() {
        let cases = [
            (ExErrorKind::MissingCredential, "ERR_MISSING_CREDENTIAL"),
            (ExErrorKind::EnvironmentMismatch, "ERR_ENVIRONMENT_MISMATCH"),
            (ExErrorKind::Fetch, "ERR_FETCH"),
            (ExErrorKind::Snapshot, "ERR_SNAPSHOT"),
            (ExErrorKind::ProcedureFailed, "ERR_PROCEDURE_FAILED"),
        ];
        for (kind, expected_code) in cases {
            assert_eq!(kind.code(), expected_code, "Wrong code for {:?}", kind);
        }
    }

    #[test]
    fn test_configuration_kinds() {
        assert!(ExErrorKind::MissingCredential.is_configuration());
        assert!(ExErrorKind::EnvironmentMismatch.is_configuration());
        assert!(!ExErrorKind::Fetch.is_configuration());
    }

    #[test]
    fn test_phase_keeps_innermost() {
        let err = ExError::new(ExErrorKind::Fetch)
            .with_phase("memberships(org_1)")
            .with_phase("cycle");
        assert_eq!(err.phase(), Some("memberships(org_1)"));
    }

    #[test]
    fn test_procedure_failed_appends_stderr() {
        let err: ExError = MigrateError::ProcedureFailed {
            procedure: "migrate-clerk-orgs".to_string(),
            status: "exit status: 2".to_string(),
            exit_code: Some(2),
            organization_id: None,
            stderr: "boom\n".to_string(),
        }
        .into();
        assert_eq!(err.exit_code(), Some(2));
        assert!(err.message().ends_with(": boom"));
    }
}
