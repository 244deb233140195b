//! Video ingestion pipeline

pub mod ingest;
pub mod locks;
pub mod orientation;
pub mod probe;
pub mod reconcile;
pub mod remux;

pub use ingest::{IngestConfig, IngestService, UploadRequest};
pub use locks::VideoLocks;
pub use orientation::classify;
pub use probe::Prober;
pub use reconcile::{OrphanSweeper, SweepReport};
pub use remux::Remuxer;
