//! Request-independent application services.
//!
//! Keeps handler logic thin and allows unit testing without HTTP.

pub mod thumbnails;
pub mod videos;

pub use thumbnails::{Thumbnail, ThumbnailService};
pub use videos::VideoCatalog;
