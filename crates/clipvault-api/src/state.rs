//! Application state shared by every handler.

use crate::auth::JwtService;
use crate::services::{ThumbnailService, VideoCatalog};
use clipvault_core::Config;
use clipvault_db::VideoRepository;
use clipvault_processing::{IngestService, OrphanSweeper};
use clipvault_storage::Storage;
use sqlx::PgPool;
use std::sync::Arc;

pub struct AppState {
    pub config: Config,
    pub jwt: Arc<JwtService>,
    /// `None` when running on the in-memory metadata store.
    pub db_pool: Option<PgPool>,
    pub repository: Arc<dyn VideoRepository>,
    pub storage: Arc<dyn Storage>,
    pub ingest: Arc<IngestService>,
    pub catalog: VideoCatalog,
    pub thumbnails: Arc<ThumbnailService>,
    pub sweeper: Arc<OrphanSweeper>,
}
