//! Object key generation shared by all backends.
//!
//! Key format: `<orientation>/<base64url(32 random bytes)>.<ext>`.

use base64::Engine;
use clipvault_core::models::OrientationClass;
use rand::RngCore;

use crate::traits::{StorageError, StorageResult};

const KEY_ID_BYTES: usize = 32;

/// Extension derived from a media type: its subtype, or `bin` when the type is not of the
/// form `type/subtype`.
fn extension_for(content_type: &str) -> &str {
    let mut parts = content_type.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(subtype), None) if !subtype.is_empty() => subtype,
        _ => "bin",
    }
}

/// Generate a fresh object key for an upload of `content_type` classified as `class`.
pub fn generate_object_key(content_type: &str, class: OrientationClass) -> String {
    let mut id = [0u8; KEY_ID_BYTES];
    rand::rng().fill_bytes(&mut id);
    let id = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(id);

    format!("{}/{}.{}", class.as_str(), id, extension_for(content_type))
}

/// Reject keys that could escape a backend's namespace.
pub fn ensure_safe_key(storage_key: &str) -> StorageResult<()> {
    if storage_key.is_empty() || storage_key.contains("..") || storage_key.starts_with('/') {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }
    Ok(())
}
