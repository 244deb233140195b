//! Data models for the application
//!
//! Video metadata records, storage locators and the geometry values produced while
//! inspecting an upload.

mod storage;
mod video;

pub use storage::*;
pub use video::*;
