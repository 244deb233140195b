//! API constants

/// API base path prefix
pub const API_PREFIX: &str = "/api";

/// Route prefix for locally stored objects served through signed links.
pub const MEDIA_PREFIX: &str = "/media";

/// Body limit for JSON routes.
pub const MAX_JSON_BODY_BYTES: usize = 64 * 1024;

/// Allowance for multipart boundaries, part headers and small extra fields on upload
/// routes, on top of the file cap.
pub const MULTIPART_OVERHEAD_BYTES: u64 = 64 * 1024;

/// Seconds allowed for each readiness dependency check.
pub const READINESS_TIMEOUT_SECS: u64 = 5;
