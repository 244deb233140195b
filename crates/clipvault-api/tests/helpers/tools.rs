//! Fake ffprobe/ffmpeg.

use async_trait::async_trait;
use clipvault_processing::{ProcessingError, ToolOutput, ToolRunner};

/// Prefix the fake remux prepends to the staged bytes.
pub const REMUX_MARKER: &[u8] = b"faststart:";

/// `ffprobe` reports fixed dimensions; `ffmpeg` copies `-i <input>` to the last argument
/// with [`REMUX_MARKER`] prepended.
pub struct FakeTools {
    pub width: u32,
    pub height: u32,
    pub probe_fails: bool,
}

impl FakeTools {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            probe_fails: false,
        }
    }

    pub fn landscape() -> Self {
        Self::new(1920, 1080)
    }

    pub fn unreadable() -> Self {
        Self {
            probe_fails: true,
            ..Self::landscape()
        }
    }
}

#[async_trait]
impl ToolRunner for FakeTools {
    async fn run(&self, program: &str, args: &[String]) -> Result<ToolOutput, ProcessingError> {
        if program == "ffprobe" {
            if self.probe_fails {
                return Ok(ToolOutput {
                    exit_code: Some(1),
                    stdout: Vec::new(),
                    stderr: b"moov atom not found".to_vec(),
                });
            }
            let json = format!(
                r#"{{"streams":[{{"codec_type":"video","width":{},"height":{}}}]}}"#,
                self.width, self.height
            );
            return Ok(ToolOutput {
                exit_code: Some(0),
                stdout: json.into_bytes(),
                stderr: Vec::new(),
            });
        }

        let input = args
            .iter()
            .position(|a| a == "-i")
            .and_then(|i| args.get(i + 1))
            .cloned()
            .unwrap_or_default();
        let output = args.last().cloned().unwrap_or_default();

        let mut data = REMUX_MARKER.to_vec();
        data.extend(tokio::fs::read(&input).await?);
        tokio::fs::write(&output, data).await?;

        Ok(ToolOutput {
            exit_code: Some(0),
            ..Default::default()
        })
    }
}
