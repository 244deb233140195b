//! Time-limited retrieval links for published objects.
//!
//! Locators are never handed to clients. Every read path swaps the stored locator for a
//! link computed here, so links are never persisted.
//!
//! The local backend signs links itself: `<base_url>/<key>?expires=<unix>&signature=<hex>`
//! where the signature is HMAC-SHA256 over `<key>:<expires>`.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use clipvault_core::models::{StorageLocator, VideoRecord};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::traits::{Storage, StorageError, StorageResult};

type HmacSha256 = Hmac<Sha256>;

/// Produce a signed GET link for `locator`, valid for `ttl`.
///
/// Fails when the locator points at a bucket other than the one `storage` publishes to.
pub async fn sign_locator(
    storage: &dyn Storage,
    locator: &StorageLocator,
    ttl: Duration,
) -> StorageResult<String> {
    if locator.bucket != storage.bucket() {
        return Err(StorageError::BucketMismatch {
            expected: storage.bucket().to_string(),
            actual: locator.bucket.clone(),
        });
    }

    storage.get_presigned_url(&locator.key, ttl).await
}

/// Return `record` with its stored locator replaced by a freshly signed link.
///
/// Records without a published video pass through unchanged.
pub async fn sign_video_record(
    storage: &dyn Storage,
    mut record: VideoRecord,
    ttl: Duration,
) -> StorageResult<VideoRecord> {
    let locator = match record.locator() {
        None => return Ok(record),
        Some(parsed) => parsed.map_err(|e| StorageError::SigningFailed(e.to_string()))?,
    };

    let url = sign_locator(storage, &locator, ttl).await?;
    record.video_url = Some(url);
    Ok(record)
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn link_mac(secret: &[u8], storage_key: &str, expires: u64) -> StorageResult<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| StorageError::SigningFailed(e.to_string()))?;
    mac.update(storage_key.as_bytes());
    mac.update(b":");
    mac.update(expires.to_string().as_bytes());
    Ok(mac)
}

/// Expiry timestamp and hex signature for a local link.
pub(crate) fn local_link_params(
    secret: &[u8],
    storage_key: &str,
    ttl: Duration,
) -> StorageResult<(u64, String)> {
    let expires = unix_now().saturating_add(ttl.as_secs());
    let tag = link_mac(secret, storage_key, expires)?.finalize().into_bytes();
    Ok((expires, hex::encode(tag)))
}

/// Check a local link's query parameters against `secret`.
pub fn verify_local_link(
    secret: &[u8],
    storage_key: &str,
    expires: u64,
    signature: &str,
) -> StorageResult<()> {
    let tag = hex::decode(signature).map_err(|_| StorageError::InvalidSignature)?;
    link_mac(secret, storage_key, expires)?
        .verify_slice(&tag)
        .map_err(|_| StorageError::InvalidSignature)?;

    if unix_now() > expires {
        return Err(StorageError::LinkExpired);
    }

    Ok(())
}
