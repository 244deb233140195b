//! Wiring of repositories, storage and processing services into [`AppState`].

use crate::auth::JwtService;
use crate::services::{ThumbnailService, VideoCatalog};
use crate::state::AppState;
use anyhow::{Context, Result};
use clipvault_core::Config;
use clipvault_db::{InMemoryVideoRepository, PgVideoRepository, VideoRepository};
use clipvault_processing::{
    IngestConfig, IngestService, OrphanSweeper, ProcessRunner, Prober, Remuxer, ToolRunner,
    VideoLocks,
};
use clipvault_storage::Storage;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Everything [`build_state`] needs besides configuration.
pub struct ServiceDeps {
    pub db_pool: Option<PgPool>,
    pub repository: Arc<dyn VideoRepository>,
    pub storage: Arc<dyn Storage>,
    pub tools: Arc<dyn ToolRunner>,
}

/// Production wiring: Postgres (or in-memory) records and subprocess tools.
pub async fn initialize_services(
    config: &Config,
    pool: Option<PgPool>,
    storage: Arc<dyn Storage>,
) -> Result<Arc<AppState>> {
    let temp_dir = config.temp_dir();
    tokio::fs::create_dir_all(&temp_dir)
        .await
        .with_context(|| format!("Failed to create temp dir {}", temp_dir.display()))?;

    let repository: Arc<dyn VideoRepository> = match &pool {
        Some(pool) => Arc::new(PgVideoRepository::new(pool.clone())),
        None => Arc::new(InMemoryVideoRepository::new()),
    };

    let tools: Arc<dyn ToolRunner> = Arc::new(ProcessRunner::new(config.tool_timeout()));

    Ok(build_state(
        config,
        ServiceDeps {
            db_pool: pool,
            repository,
            storage,
            tools,
        },
    ))
}

pub fn build_state(config: &Config, deps: ServiceDeps) -> Arc<AppState> {
    let ServiceDeps {
        db_pool,
        repository,
        storage,
        tools,
    } = deps;

    let locks = Arc::new(VideoLocks::new());

    let ingest = Arc::new(IngestService::new(
        repository.clone(),
        storage.clone(),
        Prober::new(tools.clone(), config.ffprobe_path()),
        Remuxer::new(tools, config.ffmpeg_path()),
        locks.clone(),
        IngestConfig {
            max_video_size_bytes: config.max_video_size_bytes(),
            video_content_type: config.video_content_type().to_string(),
            signed_url_ttl: config.signed_url_ttl(),
            temp_dir: config.temp_dir(),
            max_concurrent_processing: config.max_concurrent_processing(),
        },
    ));

    let thumbnails = Arc::new(ThumbnailService::new(
        repository.clone(),
        locks.clone(),
        config.public_base_url(),
    ));

    let catalog = VideoCatalog::new(
        repository.clone(),
        storage.clone(),
        thumbnails.clone(),
        locks,
        config.signed_url_ttl(),
    );

    let sweeper = Arc::new(OrphanSweeper::new(
        repository.clone(),
        storage.clone(),
        config.orphan_sweep_min_age(),
    ));

    tracing::info!(
        max_video_mb = config.max_video_size_bytes() / 1024 / 1024,
        max_concurrent_processing = config.max_concurrent_processing(),
        ffprobe_path = %config.ffprobe_path(),
        ffmpeg_path = %config.ffmpeg_path(),
        "Services initialized"
    );

    Arc::new(AppState {
        config: config.clone(),
        jwt: Arc::new(JwtService::new(config.jwt_secret(), config.jwt_issuer())),
        db_pool,
        repository,
        storage,
        ingest,
        catalog,
        thumbnails,
        sweeper,
    })
}

/// Start the periodic orphan sweep when `ORPHAN_SWEEP_INTERVAL_SECS` is non-zero.
pub fn spawn_sweeper(config: &Config, state: &AppState) -> Option<JoinHandle<()>> {
    let interval = config.orphan_sweep_interval()?;
    tracing::info!(
        interval_secs = interval.as_secs(),
        min_age_secs = config.orphan_sweep_min_age().as_secs(),
        "Orphan sweep scheduled"
    );
    Some(state.sweeper.clone().spawn(interval))
}
