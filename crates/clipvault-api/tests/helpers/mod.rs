//! Test helpers: build AppState and router for integration tests.
//!
//! Records live in memory, objects in a temp directory behind the local backend, and
//! ffprobe/ffmpeg are replaced by [`tools::FakeTools`].

#![allow(dead_code)]

pub mod auth;
pub mod fixtures;
pub mod tools;

use axum_test::TestServer;
use clipvault_api::setup::routes;
use clipvault_api::setup::services::{build_state, ServiceDeps};
use clipvault_api::state::AppState;
use clipvault_core::{BaseConfig, Config, ServiceConfig, StorageBackend};
use clipvault_db::InMemoryVideoRepository;
use clipvault_storage::{LocalStorage, Storage};
use std::sync::Arc;
use tempfile::TempDir;

pub const TEST_JWT_SECRET: &str = "test-secret-key-min-32-characters-long-for-testing";
pub const TEST_LINK_SECRET: &str = "test-link-signing-secret-32-characters";
pub const TEST_BASE_URL: &str = "http://localhost:8091";

/// Test application: server, state, and owned resources.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub temp_dir: TempDir,
    pub _media_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Entries currently in the staging directory.
    pub fn staged_files(&self) -> usize {
        std::fs::read_dir(self.temp_dir.path())
            .expect("Failed to read temp dir")
            .count()
    }
}

pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(tools::FakeTools::landscape(), |_| {}).await
}

/// Setup a test app with custom fake tools and config overrides.
pub async fn setup_test_app_with(
    fake_tools: tools::FakeTools,
    customize: impl FnOnce(&mut ServiceConfig),
) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let media_dir = tempfile::tempdir().expect("Failed to create media directory");

    let mut service_config = create_test_config(&temp_dir, &media_dir);
    customize(&mut service_config);
    let config = Config(Box::new(service_config));

    let storage: Arc<dyn Storage> = Arc::new(
        LocalStorage::new(
            media_dir.path(),
            format!("{}/media", TEST_BASE_URL),
            TEST_LINK_SECRET.as_bytes(),
        )
        .await
        .expect("Failed to create local storage"),
    );

    let state = build_state(
        &config,
        ServiceDeps {
            db_pool: None,
            repository: Arc::new(InMemoryVideoRepository::new()),
            storage,
            tools: Arc::new(fake_tools),
        },
    );

    let app = routes::setup_routes(&config, state.clone()).expect("Failed to setup routes");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        state,
        temp_dir,
        _media_dir: media_dir,
    }
}

fn create_test_config(temp_dir: &TempDir, media_dir: &TempDir) -> ServiceConfig {
    ServiceConfig {
        base: BaseConfig {
            server_port: 8091,
            cors_origins: vec!["*".to_string()],
            db_max_connections: 5,
            db_timeout_seconds: 30,
            jwt_secret: TEST_JWT_SECRET.to_string(),
            jwt_issuer: "clipvault-access".to_string(),
            environment: "development".to_string(),
            public_base_url: TEST_BASE_URL.to_string(),
            log_format: "text".to_string(),
        },
        database_url: None,
        storage_backend: StorageBackend::Local,
        s3_bucket: None,
        s3_region: None,
        s3_endpoint: None,
        local_storage_path: Some(media_dir.path().display().to_string()),
        local_storage_base_url: Some(format!("{}/media", TEST_BASE_URL)),
        link_signing_secret: TEST_LINK_SECRET.to_string(),
        signed_url_ttl_secs: 300,
        max_video_size_bytes: 1024 * 1024,
        max_thumbnail_size_bytes: 64 * 1024,
        video_content_type: "video/mp4".to_string(),
        ffprobe_path: "ffprobe".to_string(),
        ffmpeg_path: "ffmpeg".to_string(),
        tool_timeout_secs: 0,
        max_concurrent_processing: 2,
        temp_dir: Some(temp_dir.path().to_path_buf()),
        orphan_sweep_interval_secs: 0,
        orphan_sweep_min_age_secs: 0,
    }
}

/// Split a signed link into its path and `(expires, signature)` query values.
pub fn split_signed_link(link: &str) -> (String, String, String) {
    let rest = link
        .strip_prefix(TEST_BASE_URL)
        .expect("Signed link should use the test base URL");
    let (path, query) = rest.split_once('?').expect("Signed link should have a query");

    let mut expires = String::new();
    let mut signature = String::new();
    for pair in query.split('&') {
        match pair.split_once('=') {
            Some(("expires", v)) => expires = v.to_string(),
            Some(("signature", v)) => signature = v.to_string(),
            _ => {}
        }
    }
    (path.to_string(), expires, signature)
}
