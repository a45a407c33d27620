//! Child-process procedure runner.
//!
//! Each procedure is started as `<launcher> [launcher args] <name> <args>`
//! with an explicit argv. No shell is involved, so identifiers and keys are
//! never re-parsed. The run waits for the child to exit.

use std::process::Stdio;

use async_trait::async_trait;
use idmigrate_core::config::ProcedureConfig;
use idmigrate_core::errors::{MigrateError, Result};
use idmigrate_core::procedure::{MigrationProcedure, ProcedureNames, ProcedureOutput};
use idmigrate_core::ProcedureRunner;
use tokio::process::Command;

/// Lines of stderr kept in a failure report
const STDERR_TAIL_LINES: usize = 20;

/// Runs procedures as child processes
#[derive(Debug, Clone)]
pub struct CommandRunner {
    launcher: String,
    launcher_args: Vec<String>,
    names: ProcedureNames,
}

impl CommandRunner {
    pub fn new(config: &ProcedureConfig) -> Self {
        Self {
            launcher: config.launcher.clone(),
            launcher_args: config.launcher_args.clone(),
            names: config.names.clone(),
        }
    }

    /// Arguments after the launcher, secrets included
    fn argv(&self, procedure: &MigrationProcedure) -> Vec<String> {
        let mut argv = self.launcher_args.clone();
        argv.push(self.names.for_kind(procedure.kind()).to_string());
        argv.extend(procedure.arguments().iter().map(|arg| arg.render()));
        argv
    }

    /// The full command line with secrets masked
    pub fn display_command(&self, procedure: &MigrationProcedure) -> String {
        let mut parts = vec![self.launcher.clone()];
        parts.extend(self.launcher_args.iter().cloned());
        parts.push(self.names.for_kind(procedure.kind()).to_string());
        parts.extend(procedure.arguments().iter().map(|arg| arg.render_redacted()));
        parts.join(" ")
    }
}

#[async_trait]
impl ProcedureRunner for CommandRunner {
    async fn run(&self, procedure: &MigrationProcedure) -> Result<ProcedureOutput> {
        let name = self.names.for_kind(procedure.kind());
        let organization_id = procedure.organization_id().map(|id| id.to_string());

        tracing::info!(
            procedure = name,
            command = %self.display_command(procedure),
            "Starting procedure"
        );

        let output = Command::new(&self.launcher)
            .args(self.argv(procedure))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| MigrateError::ProcedureLaunch {
                procedure: name.to_string(),
                reason: format!("{}: {}", self.launcher, e),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
            tracing::info!(procedure = name, "{}", line);
        }
        for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
            tracing::warn!(procedure = name, "{}", line);
        }

        if !output.status.success() {
            return Err(MigrateError::ProcedureFailed {
                procedure: name.to_string(),
                status: output.status.to_string(),
                exit_code: output.status.code(),
                organization_id,
                stderr: tail_lines(&stderr, STDERR_TAIL_LINES),
            }
            .into());
        }

        Ok(ProcedureOutput { stdout, stderr })
    }
}

fn tail_lines(text: &str, count: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(count);
    lines[start..].join("\n")
}
