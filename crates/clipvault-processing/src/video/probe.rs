//! Stream geometry extraction via ffprobe.

use std::path::Path;
use std::sync::Arc;

use clipvault_core::models::ProbeResult;
use serde::Deserialize;

use crate::error::ProcessingError;
use crate::tools::{tool_name, ToolRunner};

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

/// Extract the first video stream's dimensions from ffprobe JSON.
pub fn parse_probe_output(stdout: &[u8]) -> Result<ProbeResult, ProcessingError> {
    let output: FfprobeOutput = serde_json::from_slice(stdout)
        .map_err(|e| ProcessingError::MalformedOutput(e.to_string()))?;

    let stream = output
        .streams
        .into_iter()
        .find(|s| s.codec_type.as_deref().map_or(true, |t| t == "video"))
        .ok_or(ProcessingError::NoVideoStreams)?;

    match (stream.width, stream.height) {
        (Some(width), Some(height)) if width > 0 && height > 0 => {
            Ok(ProbeResult { width, height })
        }
        _ => Err(ProcessingError::MissingDimensions),
    }
}

pub struct Prober {
    runner: Arc<dyn ToolRunner>,
    ffprobe_path: String,
}

impl Prober {
    pub fn new(runner: Arc<dyn ToolRunner>, ffprobe_path: impl Into<String>) -> Self {
        Self {
            runner,
            ffprobe_path: ffprobe_path.into(),
        }
    }

    #[tracing::instrument(skip(self), fields(path = %path.display()))]
    pub async fn probe(&self, path: &Path) -> Result<ProbeResult, ProcessingError> {
        let args = vec![
            "-v".to_string(),
            "error".to_string(),
            "-print_format".to_string(),
            "json".to_string(),
            "-show_streams".to_string(),
            "-select_streams".to_string(),
            "v".to_string(),
            path.display().to_string(),
        ];

        let output = self
            .runner
            .run(&self.ffprobe_path, &args)
            .await?
            .into_success(tool_name(&self.ffprobe_path))?;

        let result = parse_probe_output(&output.stdout)?;
        tracing::debug!(width = result.width, height = result.height, "Probed video geometry");
        Ok(result)
    }
}
