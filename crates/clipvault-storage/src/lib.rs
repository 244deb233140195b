//! Clipvault Storage Library
//!
//! This crate provides the object storage abstraction used to publish ingested videos,
//! with S3 and local filesystem backends, object key generation and signed retrieval
//! links.
//!
//! # Storage key format
//!
//! Published videos live under `<orientation>/<id>.<ext>`, where `orientation` is one of
//! `landscape`, `portrait` or `other` and `id` is 32 random bytes encoded as unpadded
//! base64url. Keys must not contain `..` or a leading `/`.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod signing;
pub mod traits;

// Re-export commonly used types
pub use clipvault_core::StorageBackend;
pub use factory::create_storage;
pub use keys::generate_object_key;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use signing::{sign_locator, sign_video_record, verify_local_link};
pub use traits::{Storage, StorageError, StorageResult, StoredObject};
