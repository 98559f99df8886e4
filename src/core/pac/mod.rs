//! Optional pre-resolution of PipelineRuns before validation.
//!
//! Pipelines-as-Code keeps tasks in separate files under `.tekton/` and
//! inlines them at trigger time; `tkn pac resolve` performs the same inlining
//! locally so the embedded pipeline can be validated.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

pub const DEFAULT_PAC_COMMAND: &str = "tkn";

#[derive(Debug, thiserror::Error)]
pub enum ResolverError {
    #[error("failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("pac resolve exited with status {status}: {stderr}")]
    Failed { status: i32, stderr: String },
    #[error("pac resolve output {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Turns a run document into the document that is actually validated.
#[async_trait]
pub trait RunPreResolver: Send + Sync {
    async fn resolve(&self, path: &Path, data: Vec<u8>) -> Result<Vec<u8>, ResolverError>;
}

/// Validates the run exactly as written.
pub struct PassthroughResolver;

#[async_trait]
impl RunPreResolver for PassthroughResolver {
    async fn resolve(&self, _path: &Path, data: Vec<u8>) -> Result<Vec<u8>, ResolverError> {
        Ok(data)
    }
}

/// Runs `<command> pac resolve -f <path> --no-generate-name -o <tmpfile>`.
pub struct PacResolver {
    command: String,
}

impl PacResolver {
    /// `command` may carry leading arguments, e.g. `"kubectl tkn"`.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl Default for PacResolver {
    fn default() -> Self {
        Self::new(DEFAULT_PAC_COMMAND)
    }
}

#[async_trait]
impl RunPreResolver for PacResolver {
    async fn resolve(&self, path: &Path, _data: Vec<u8>) -> Result<Vec<u8>, ResolverError> {
        let output_file = tempfile::NamedTempFile::new().map_err(|source| ResolverError::Io {
            path: std::env::temp_dir(),
            source,
        })?;
        let output_path = output_file.path().to_path_buf();

        let mut parts = self.command.split_whitespace();
        let program = parts.next().ok_or_else(|| ResolverError::Spawn {
            command: self.command.clone(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "command is empty"),
        })?;
        let mut command = Command::new(program);
        command
            .args(parts)
            .args(["pac", "resolve", "-f"])
            .arg(path)
            .args(["--no-generate-name", "-o"])
            .arg(&output_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            command.current_dir(dir);
        }

        tracing::debug!(command = %self.command, file = %path.display(), "running pac resolve");
        let output = command.output().await.map_err(|source| ResolverError::Spawn {
            command: self.command.clone(),
            source,
        })?;
        if !output.status.success() {
            return Err(ResolverError::Failed {
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        tokio::fs::read(&output_path)
            .await
            .map_err(|source| ResolverError::Io {
                path: output_path,
                source,
            })
    }
}
