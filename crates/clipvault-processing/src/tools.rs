//! External tool execution.
//!
//! Everything that shells out goes through [`ToolRunner`], so the pipeline can be driven
//! by a fake in tests.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::ProcessingError;

/// Captured result of one tool invocation.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Turn a non-zero exit into [`ProcessingError::ToolFailed`].
    pub fn into_success(self, tool: &str) -> Result<Self, ProcessingError> {
        if self.success() {
            return Ok(self);
        }
        Err(ProcessingError::ToolFailed {
            tool: tool.to_string(),
            status: self
                .exit_code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string()),
            stderr: String::from_utf8_lossy(&self.stderr).trim().to_string(),
        })
    }
}

#[async_trait]
pub trait ToolRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[String]) -> Result<ToolOutput, ProcessingError>;
}

/// Display name for a tool path (`/usr/bin/ffprobe` -> `ffprobe`).
pub fn tool_name(program: &str) -> &str {
    Path::new(program)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(program)
}

/// Runs tools as child processes.
///
/// Children are killed when the invocation is dropped or exceeds the timeout.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    timeout: Option<Duration>,
}

impl ProcessRunner {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl ToolRunner for ProcessRunner {
    #[tracing::instrument(skip(self, args), fields(tool = %tool_name(program)))]
    async fn run(&self, program: &str, args: &[String]) -> Result<ToolOutput, ProcessingError> {
        let tool = tool_name(program).to_string();
        let start = std::time::Instant::now();

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, cmd.output())
                .await
                .map_err(|_| {
                    tracing::warn!(tool = %tool, timeout_secs = limit.as_secs(), "Tool timed out");
                    ProcessingError::ToolTimeout {
                        tool: tool.clone(),
                        timeout_secs: limit.as_secs(),
                    }
                })?,
            None => cmd.output().await,
        }
        .map_err(|source| ProcessingError::ToolLaunch {
            tool: tool.clone(),
            source,
        })?;

        tracing::debug!(
            tool = %tool,
            exit_code = ?output.status.code(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Tool finished"
        );

        Ok(ToolOutput {
            exit_code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}
