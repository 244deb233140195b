//! Application-wide constants.

/// Maximum video upload size (1 GiB).
pub const DEFAULT_MAX_VIDEO_SIZE_MB: u64 = 1024;

/// Maximum thumbnail upload size.
pub const DEFAULT_MAX_THUMBNAIL_SIZE_MB: u64 = 10;

/// The single container type accepted for video ingestion.
pub const DEFAULT_VIDEO_CONTENT_TYPE: &str = "video/mp4";

/// Lifetime of a signed retrieval link.
pub const DEFAULT_SIGNED_URL_TTL_SECS: u64 = 5 * 60;

/// Upper bound for a single ffprobe/ffmpeg invocation.
pub const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 600;

/// Multipart field carrying the video file.
pub const VIDEO_FORM_FIELD: &str = "video";

/// Multipart field carrying the thumbnail image.
pub const THUMBNAIL_FORM_FIELD: &str = "thumbnail";

/// Expected `iss` claim on access tokens.
pub const DEFAULT_JWT_ISSUER: &str = "clipvault-access";
