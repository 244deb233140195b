//! Clipvault Processing Library
//!
//! External tool execution and the video ingestion pipeline: staging, probing,
//! orientation classification, fast-start remuxing, publishing and the orphan sweep.

pub mod error;
pub mod tools;
pub mod validator;
pub mod video;

pub use error::ProcessingError;
pub use tools::{ProcessRunner, ToolOutput, ToolRunner};
pub use validator::{UploadValidator, ValidationError};
pub use video::{
    classify, IngestConfig, IngestService, OrphanSweeper, Prober, Remuxer, SweepReport,
    UploadRequest, VideoLocks,
};
