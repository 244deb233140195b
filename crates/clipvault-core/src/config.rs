//! Configuration module
//!
//! This module provides configuration structures for the ingestion service, including
//! server, authentication, storage, external tool and sweeper settings. Values are read
//! from the environment (and an optional `.env` file).

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{
    DEFAULT_JWT_ISSUER, DEFAULT_MAX_THUMBNAIL_SIZE_MB, DEFAULT_MAX_VIDEO_SIZE_MB,
    DEFAULT_SIGNED_URL_TTL_SECS, DEFAULT_TOOL_TIMEOUT_SECS, DEFAULT_VIDEO_CONTENT_TYPE,
};
use crate::storage_types::StorageBackend;

const DEFAULT_PORT: u16 = 8091;
const MAX_CONNECTIONS: u32 = 10;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const MAX_CONCURRENT_PROCESSING: usize = 2;
const ORPHAN_SWEEP_MIN_AGE_SECS: u64 = 3600;

/// Server-level settings
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub environment: String,
    pub public_base_url: String,
    /// `json` switches the log formatter to structured JSON.
    pub log_format: String,
}

/// Ingestion service configuration
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub base: BaseConfig,
    /// Unset means the in-memory metadata store.
    pub database_url: Option<String>,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, etc.)
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub link_signing_secret: String,
    pub signed_url_ttl_secs: u64,
    // Ingestion limits
    pub max_video_size_bytes: u64,
    pub max_thumbnail_size_bytes: u64,
    pub video_content_type: String,
    // External tools
    pub ffprobe_path: String,
    pub ffmpeg_path: String,
    /// 0 disables the timeout.
    pub tool_timeout_secs: u64,
    pub max_concurrent_processing: usize,
    pub temp_dir: Option<PathBuf>,
    /// Interval in seconds between orphan sweeps. 0 = disabled.
    pub orphan_sweep_interval_secs: u64,
    /// Objects younger than this are never swept.
    pub orphan_sweep_min_age_secs: u64,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<ServiceConfig>);

impl Config {
    fn inner(&self) -> &ServiceConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production_env(&self.inner().base.environment)
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = ServiceConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    // Convenience getters for common fields
    pub fn server_port(&self) -> u16 {
        self.inner().base.server_port
    }

    pub fn jwt_secret(&self) -> &str {
        &self.inner().base.jwt_secret
    }

    pub fn jwt_issuer(&self) -> &str {
        &self.inner().base.jwt_issuer
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.inner().base.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.inner().base.environment
    }

    pub fn public_base_url(&self) -> &str {
        &self.inner().base.public_base_url
    }

    pub fn log_json(&self) -> bool {
        self.inner().base.log_format.eq_ignore_ascii_case("json")
    }

    pub fn db_max_connections(&self) -> u32 {
        self.inner().base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.inner().base.db_timeout_seconds
    }

    pub fn database_url(&self) -> Option<&str> {
        self.inner().database_url.as_deref()
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.inner().storage_backend
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.inner().s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.inner().s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.inner().s3_endpoint.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.inner().local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.inner().local_storage_base_url.as_deref()
    }

    pub fn link_signing_secret(&self) -> &str {
        &self.inner().link_signing_secret
    }

    pub fn signed_url_ttl(&self) -> Duration {
        Duration::from_secs(self.inner().signed_url_ttl_secs)
    }

    pub fn max_video_size_bytes(&self) -> u64 {
        self.inner().max_video_size_bytes
    }

    pub fn max_thumbnail_size_bytes(&self) -> u64 {
        self.inner().max_thumbnail_size_bytes
    }

    pub fn video_content_type(&self) -> &str {
        &self.inner().video_content_type
    }

    pub fn ffprobe_path(&self) -> &str {
        &self.inner().ffprobe_path
    }

    pub fn ffmpeg_path(&self) -> &str {
        &self.inner().ffmpeg_path
    }

    /// `None` when tool invocations may run unbounded.
    pub fn tool_timeout(&self) -> Option<Duration> {
        match self.inner().tool_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn max_concurrent_processing(&self) -> usize {
        self.inner().max_concurrent_processing
    }

    pub fn temp_dir(&self) -> PathBuf {
        self.inner()
            .temp_dir
            .clone()
            .unwrap_or_else(env::temp_dir)
    }

    pub fn orphan_sweep_interval(&self) -> Option<Duration> {
        match self.inner().orphan_sweep_interval_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn orphan_sweep_min_age(&self) -> Duration {
        Duration::from_secs(self.inner().orphan_sweep_min_age_secs)
    }
}

fn is_production_env(environment: &str) -> bool {
    let env = environment.to_lowercase();
    env == "production" || env == "prod"
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        if is_production_env(&environment) && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let server_port: u16 = env::var("PORT")
            .unwrap_or_else(|_| DEFAULT_PORT.to_string())
            .parse()
            .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set for authentication"))?;

        let base = BaseConfig {
            server_port,
            cors_origins,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            jwt_secret: jwt_secret.clone(),
            jwt_issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| DEFAULT_JWT_ISSUER.to_string()),
            environment,
            public_base_url: optional_var("PUBLIC_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| format!("http://localhost:{}", server_port)),
            log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string()),
        };

        let storage_backend = match optional_var("STORAGE_BACKEND") {
            Some(value) => value.parse()?,
            None => StorageBackend::S3,
        };

        let max_video_size_mb = env::var("MAX_VIDEO_SIZE_MB")
            .unwrap_or_else(|_| DEFAULT_MAX_VIDEO_SIZE_MB.to_string())
            .parse::<u64>()
            .unwrap_or(DEFAULT_MAX_VIDEO_SIZE_MB);

        let max_thumbnail_size_mb = env::var("MAX_THUMBNAIL_SIZE_MB")
            .unwrap_or_else(|_| DEFAULT_MAX_THUMBNAIL_SIZE_MB.to_string())
            .parse::<u64>()
            .unwrap_or(DEFAULT_MAX_THUMBNAIL_SIZE_MB);

        let config = ServiceConfig {
            base,
            database_url: optional_var("DATABASE_URL"),
            storage_backend,
            s3_bucket: optional_var("S3_BUCKET"),
            s3_region: optional_var("S3_REGION").or_else(|| optional_var("AWS_REGION")),
            s3_endpoint: optional_var("S3_ENDPOINT"),
            local_storage_path: optional_var("LOCAL_STORAGE_PATH"),
            local_storage_base_url: optional_var("LOCAL_STORAGE_BASE_URL"),
            link_signing_secret: optional_var("LINK_SIGNING_SECRET").unwrap_or(jwt_secret),
            signed_url_ttl_secs: env::var("SIGNED_URL_TTL_SECS")
                .unwrap_or_else(|_| DEFAULT_SIGNED_URL_TTL_SECS.to_string())
                .parse()
                .unwrap_or(DEFAULT_SIGNED_URL_TTL_SECS),
            max_video_size_bytes: max_video_size_mb * 1024 * 1024,
            max_thumbnail_size_bytes: max_thumbnail_size_mb * 1024 * 1024,
            video_content_type: env::var("VIDEO_CONTENT_TYPE")
                .unwrap_or_else(|_| DEFAULT_VIDEO_CONTENT_TYPE.to_string())
                .trim()
                .to_lowercase(),
            ffprobe_path: env::var("FFPROBE_PATH").unwrap_or_else(|_| "ffprobe".to_string()),
            ffmpeg_path: env::var("FFMPEG_PATH").unwrap_or_else(|_| "ffmpeg".to_string()),
            tool_timeout_secs: env::var("TOOL_TIMEOUT_SECS")
                .unwrap_or_else(|_| DEFAULT_TOOL_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(DEFAULT_TOOL_TIMEOUT_SECS),
            max_concurrent_processing: env::var("MAX_CONCURRENT_PROCESSING")
                .unwrap_or_else(|_| MAX_CONCURRENT_PROCESSING.to_string())
                .parse()
                .unwrap_or(MAX_CONCURRENT_PROCESSING),
            temp_dir: optional_var("TEMP_DIR").map(PathBuf::from),
            orphan_sweep_interval_secs: env::var("ORPHAN_SWEEP_INTERVAL_SECS")
                .unwrap_or_else(|_| "0".to_string())
                .parse()
                .unwrap_or(0),
            orphan_sweep_min_age_secs: env::var("ORPHAN_SWEEP_MIN_AGE_SECS")
                .unwrap_or_else(|_| ORPHAN_SWEEP_MIN_AGE_SECS.to_string())
                .parse()
                .unwrap_or(ORPHAN_SWEEP_MIN_AGE_SECS),
        };

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.base.jwt_secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least 32 characters long"
            ));
        }

        if let Some(url) = &self.database_url {
            if !url.starts_with("postgres://") && !url.starts_with("postgresql://") {
                return Err(anyhow::anyhow!(
                    "DATABASE_URL must be a valid PostgreSQL connection string"
                ));
            }
        }

        if self.video_content_type.split('/').count() != 2 {
            return Err(anyhow::anyhow!(
                "VIDEO_CONTENT_TYPE must be a media type such as video/mp4"
            ));
        }

        if self.max_video_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_VIDEO_SIZE_MB must be greater than 0"));
        }

        if self.max_concurrent_processing == 0 {
            return Err(anyhow::anyhow!(
                "MAX_CONCURRENT_PROCESSING must be greater than 0"
            ));
        }

        if self.signed_url_ttl_secs == 0 {
            return Err(anyhow::anyhow!("SIGNED_URL_TTL_SECS must be greater than 0"));
        }

        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ServiceConfig {
        ServiceConfig {
            base: BaseConfig {
                server_port: DEFAULT_PORT,
                cors_origins: vec!["*".to_string()],
                db_max_connections: MAX_CONNECTIONS,
                db_timeout_seconds: CONNECTION_TIMEOUT_SECS,
                jwt_secret: "a".repeat(32),
                jwt_issuer: DEFAULT_JWT_ISSUER.to_string(),
                environment: "development".to_string(),
                public_base_url: "http://localhost:8091".to_string(),
                log_format: "text".to_string(),
            },
            database_url: None,
            storage_backend: StorageBackend::Local,
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            local_storage_path: Some("/tmp/clipvault".to_string()),
            local_storage_base_url: Some("http://localhost:8091/media".to_string()),
            link_signing_secret: "b".repeat(32),
            signed_url_ttl_secs: DEFAULT_SIGNED_URL_TTL_SECS,
            max_video_size_bytes: DEFAULT_MAX_VIDEO_SIZE_MB * 1024 * 1024,
            max_thumbnail_size_bytes: DEFAULT_MAX_THUMBNAIL_SIZE_MB * 1024 * 1024,
            video_content_type: DEFAULT_VIDEO_CONTENT_TYPE.to_string(),
            ffprobe_path: "ffprobe".to_string(),
            ffmpeg_path: "ffmpeg".to_string(),
            tool_timeout_secs: 0,
            max_concurrent_processing: 2,
            temp_dir: None,
            orphan_sweep_interval_secs: 0,
            orphan_sweep_min_age_secs: ORPHAN_SWEEP_MIN_AGE_SECS,
        }
    }

    #[test]
    fn test_valid_local_config() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_short_jwt_secret_rejected() {
        let mut config = sample();
        config.base.jwt_secret = "short".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_s3_requires_bucket_and_region() {
        let mut config = sample();
        config.storage_backend = StorageBackend::S3;
        assert!(config.validate().is_err());

        config.s3_bucket = Some("videos".to_string());
        assert!(config.validate().is_err());

        config.s3_region = Some("us-east-1".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_durations_disable_features() {
        let config = Config(Box::new(sample()));
        assert!(config.tool_timeout().is_none());
        assert!(config.orphan_sweep_interval().is_none());
        assert_eq!(config.signed_url_ttl(), Duration::from_secs(300));
    }

    #[test]
    fn test_production_detection() {
        let mut inner = sample();
        inner.base.environment = "PROD".to_string();
        assert!(Config(Box::new(inner)).is_production());
    }
}
