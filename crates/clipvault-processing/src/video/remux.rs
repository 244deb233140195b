//! Fast-start remuxing via ffmpeg.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempPath;

use crate::error::ProcessingError;
use crate::tools::{tool_name, ToolRunner};

/// `<input>.processing`
fn output_path_for(input: &Path) -> PathBuf {
    let mut path: OsString = input.as_os_str().to_owned();
    path.push(".processing");
    PathBuf::from(path)
}

pub struct Remuxer {
    runner: Arc<dyn ToolRunner>,
    ffmpeg_path: String,
}

impl Remuxer {
    pub fn new(runner: Arc<dyn ToolRunner>, ffmpeg_path: impl Into<String>) -> Self {
        Self {
            runner,
            ffmpeg_path: ffmpeg_path.into(),
        }
    }

    /// Copy the streams of `input` into a new MP4 with the index moved to the front.
    ///
    /// The returned path deletes the file when dropped; on failure the output is removed
    /// before returning.
    #[tracing::instrument(skip(self), fields(input = %input.display()))]
    pub async fn remux(&self, input: &Path) -> Result<TempPath, ProcessingError> {
        let output = TempPath::from_path(output_path_for(input));

        let args = vec![
            "-y".to_string(),
            "-v".to_string(),
            "error".to_string(),
            "-i".to_string(),
            input.display().to_string(),
            "-movflags".to_string(),
            "faststart".to_string(),
            "-codec".to_string(),
            "copy".to_string(),
            "-f".to_string(),
            "mp4".to_string(),
            output.display().to_string(),
        ];

        self.runner
            .run(&self.ffmpeg_path, &args)
            .await?
            .into_success(tool_name(&self.ffmpeg_path))?;

        let size = match tokio::fs::metadata(&output).await {
            Ok(meta) if meta.is_file() => meta.len(),
            _ => 0,
        };
        if size == 0 {
            return Err(ProcessingError::EmptyOutput);
        }

        tracing::debug!(size_bytes = size, "Remuxed for progressive playback");
        Ok(output)
    }
}
