use clipvault_core::AppError;

/// Failures while running or interpreting external media tools.
#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("Failed to launch {tool}: {source}")]
    ToolLaunch {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with status {status}: {stderr}")]
    ToolFailed {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("{tool} timed out after {timeout_secs}s")]
    ToolTimeout { tool: String, timeout_secs: u64 },

    #[error("Malformed ffprobe output: {0}")]
    MalformedOutput(String),

    #[error("No video streams found")]
    NoVideoStreams,

    #[error("Video stream has no dimensions")]
    MissingDimensions,

    #[error("Remuxed output is missing or empty")]
    EmptyOutput,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ProcessingError> for AppError {
    fn from(err: ProcessingError) -> Self {
        AppError::Processing(err.to_string())
    }
}
