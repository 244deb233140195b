//! Video ingestion: stage → probe → classify → remux → publish → record → sign.
//!
//! Every local file created here is owned by a guard that deletes it on drop, so a
//! failure at any step, or the caller dropping the future, leaves no temporary files
//! behind. A failure after publishing leaves the remote object in place; the orphan sweep
//! reclaims it.

use std::fmt::Display;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use clipvault_core::models::{StorageLocator, VideoRecord};
use clipvault_core::AppError;
use clipvault_db::VideoRepository;
use clipvault_storage::{generate_object_key, sign_video_record, Storage};
use futures::{Stream, StreamExt};
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tokio::sync::Semaphore;
use uuid::Uuid;

use super::locks::VideoLocks;
use super::orientation::classify;
use super::probe::Prober;
use super::remux::Remuxer;
use crate::validator::UploadValidator;

const STAGING_PREFIX: &str = "clipvault-upload-";
const STAGING_SUFFIX: &str = ".mp4";

#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub max_video_size_bytes: u64,
    pub video_content_type: String,
    pub signed_url_ttl: Duration,
    pub temp_dir: PathBuf,
    pub max_concurrent_processing: usize,
}

/// One upload as handed over by the HTTP layer.
pub struct UploadRequest<S> {
    pub owner: Uuid,
    pub video_id: Uuid,
    pub content_type: Option<String>,
    pub declared_length: Option<u64>,
    pub body: S,
}

pub struct IngestService {
    repo: Arc<dyn VideoRepository>,
    storage: Arc<dyn Storage>,
    prober: Prober,
    remuxer: Remuxer,
    locks: Arc<VideoLocks>,
    slots: Semaphore,
    validator: UploadValidator,
    config: IngestConfig,
}

impl IngestService {
    pub fn new(
        repo: Arc<dyn VideoRepository>,
        storage: Arc<dyn Storage>,
        prober: Prober,
        remuxer: Remuxer,
        locks: Arc<VideoLocks>,
        config: IngestConfig,
    ) -> Self {
        Self {
            repo,
            storage,
            prober,
            remuxer,
            locks,
            slots: Semaphore::new(config.max_concurrent_processing.max(1)),
            validator: UploadValidator::new(
                config.max_video_size_bytes,
                config.video_content_type.clone(),
            ),
            config,
        }
    }

    /// Load the record and check that `owner` may modify it.
    pub async fn authorize(&self, owner: Uuid, video_id: Uuid) -> Result<VideoRecord, AppError> {
        let record = self
            .repo
            .get(video_id)
            .await?
            .ok_or_else(|| AppError::InvalidInput("Couldn't find video".to_string()))?;

        if !record.is_owned_by(owner) {
            tracing::warn!(video_id = %video_id, user_id = %owner, "Upload rejected for non-owner");
            return Err(AppError::Forbidden(
                "You are not the owner of this video".to_string(),
            ));
        }

        Ok(record)
    }

    /// Run the full publish sequence and return the record with a signed `video_url`.
    #[tracing::instrument(skip(self, request), fields(video_id = %request.video_id, user_id = %request.owner))]
    pub async fn ingest<S, E>(&self, request: UploadRequest<S>) -> Result<VideoRecord, AppError>
    where
        S: Stream<Item = Result<Bytes, E>> + Send,
        E: Display,
    {
        let start = std::time::Instant::now();
        let UploadRequest {
            owner,
            video_id,
            content_type,
            declared_length,
            body,
        } = request;

        self.authorize(owner, video_id).await?;
        let content_type = self
            .validator
            .validate_content_type(content_type.as_deref())?;
        self.validator.validate_declared_length(declared_length)?;

        let staged = self.stage(body).await?;

        let (class, remuxed) = {
            let _slot = self
                .slots
                .acquire()
                .await
                .map_err(|_| AppError::Internal("Processing slots closed".to_string()))?;

            let geometry = self.prober.probe(staged.path()).await?;
            let class = classify(geometry);
            tracing::info!(
                width = geometry.width,
                height = geometry.height,
                orientation = %class,
                "Classified upload"
            );

            let remuxed = self.remuxer.remux(staged.path()).await?;
            (class, remuxed)
        };
        drop(staged);

        let key = generate_object_key(&content_type, class);
        let published = self.storage.upload_file(&key, &remuxed, &content_type).await;
        drop(remuxed);
        published?;

        let locator = StorageLocator::new(self.storage.bucket(), key);
        let updated = self.record_locator(video_id, &locator).await?;

        let signed =
            sign_video_record(self.storage.as_ref(), updated, self.config.signed_url_ttl).await?;

        tracing::info!(
            locator = %locator,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Video ingested"
        );

        Ok(signed)
    }

    /// Write the upload to a fresh temporary file, enforcing the size cap per chunk.
    async fn stage<S, E>(&self, body: S) -> Result<NamedTempFile, AppError>
    where
        S: Stream<Item = Result<Bytes, E>> + Send,
        E: Display,
    {
        let staged = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .suffix(STAGING_SUFFIX)
            .tempfile_in(&self.config.temp_dir)?;
        let mut file = tokio::fs::File::from_std(staged.reopen()?);

        let mut body = std::pin::pin!(body);
        let mut total: u64 = 0;
        while let Some(chunk) = body.next().await {
            let chunk = chunk
                .map_err(|e| AppError::InvalidInput(format!("Failed to read upload: {}", e)))?;
            total += chunk.len() as u64;
            self.validator.validate_running_total(total)?;
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        self.validator.validate_not_empty(total)?;

        tracing::debug!(path = %staged.path().display(), size_bytes = total, "Upload staged");
        Ok(staged)
    }

    /// Re-read the record under its lock and store the new locator.
    async fn record_locator(
        &self,
        video_id: Uuid,
        locator: &StorageLocator,
    ) -> Result<VideoRecord, AppError> {
        let _guard = self.locks.lock(video_id).await;

        let mut record = self.repo.get(video_id).await?.ok_or_else(|| {
            tracing::error!(video_id = %video_id, locator = %locator, "Record vanished after publish");
            AppError::Storage(format!("Video {} was removed during upload", video_id))
        })?;

        record.set_locator(locator);
        self.repo.update(&record).await.map_err(|e| {
            tracing::error!(video_id = %video_id, locator = %locator, error = %e, "Failed to record published video");
            match e {
                AppError::Database(_) | AppError::Storage(_) => e,
                other => AppError::Storage(other.to_string()),
            }
        })?;

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProcessingError;
    use crate::tools::{ToolOutput, ToolRunner};
    use async_trait::async_trait;
    use clipvault_core::ErrorCategory;
    use clipvault_db::InMemoryVideoRepository;
    use clipvault_storage::{LocalStorage, StorageBackend, StorageError, StorageResult, StoredObject};
    use std::convert::Infallible;
    use std::path::Path;
    use std::pin::Pin;
    use tempfile::TempDir;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    /// Emulates ffprobe (fixed geometry) and ffmpeg (copies input to the last argument).
    struct FakeTools {
        width: u32,
        height: u32,
        ffprobe_fails: bool,
        ffmpeg_writes_empty: bool,
    }

    impl FakeTools {
        fn new(width: u32, height: u32) -> Self {
            Self {
                width,
                height,
                ffprobe_fails: false,
                ffmpeg_writes_empty: false,
            }
        }
    }

    #[async_trait]
    impl ToolRunner for FakeTools {
        async fn run(&self, program: &str, args: &[String]) -> Result<ToolOutput, ProcessingError> {
            if program == "ffprobe" {
                if self.ffprobe_fails {
                    return Ok(ToolOutput {
                        exit_code: Some(1),
                        stdout: Vec::new(),
                        stderr: b"Invalid data found when processing input".to_vec(),
                    });
                }
                let json = format!(
                    r#"{{"streams":[{{"codec_type":"video","width":{},"height":{}}}]}}"#,
                    self.width, self.height
                );
                return Ok(ToolOutput {
                    exit_code: Some(0),
                    stdout: json.into_bytes(),
                    stderr: Vec::new(),
                });
            }

            let input = args
                .iter()
                .position(|a| a == "-i")
                .and_then(|i| args.get(i + 1))
                .cloned()
                .unwrap_or_default();
            let output = args.last().cloned().unwrap_or_default();
            if self.ffmpeg_writes_empty {
                tokio::fs::write(&output, b"").await?;
            } else {
                let mut data = b"faststart:".to_vec();
                data.extend(tokio::fs::read(&input).await?);
                tokio::fs::write(&output, data).await?;
            }
            Ok(ToolOutput {
                exit_code: Some(0),
                ..Default::default()
            })
        }
    }

    struct Harness {
        service: IngestService,
        repo: Arc<InMemoryVideoRepository>,
        storage: Arc<LocalStorage>,
        temp_dir: TempDir,
        _media_dir: TempDir,
    }

    async fn harness(tools: FakeTools, max_size: u64) -> Harness {
        harness_with(tools, max_size, |storage| storage, |repo| repo).await
    }

    /// Build a service whose storage and repository may be wrapped to inject failures.
    async fn harness_with(
        tools: FakeTools,
        max_size: u64,
        wrap_storage: impl FnOnce(Arc<LocalStorage>) -> Arc<dyn Storage>,
        wrap_repo: impl FnOnce(Arc<InMemoryVideoRepository>) -> Arc<dyn VideoRepository>,
    ) -> Harness {
        let temp_dir = TempDir::new().unwrap();
        let media_dir = TempDir::new().unwrap();
        let repo = Arc::new(InMemoryVideoRepository::new());
        let storage = Arc::new(
            LocalStorage::new(
                media_dir.path(),
                "http://localhost:8091/media".to_string(),
                SECRET,
            )
            .await
            .unwrap(),
        );
        let runner: Arc<dyn ToolRunner> = Arc::new(tools);

        let service = IngestService::new(
            wrap_repo(repo.clone()),
            wrap_storage(storage.clone()),
            Prober::new(runner.clone(), "ffprobe"),
            Remuxer::new(runner, "ffmpeg"),
            Arc::new(VideoLocks::new()),
            IngestConfig {
                max_video_size_bytes: max_size,
                video_content_type: "video/mp4".to_string(),
                signed_url_ttl: Duration::from_secs(300),
                temp_dir: temp_dir.path().to_path_buf(),
                max_concurrent_processing: 2,
            },
        );

        Harness {
            service,
            repo,
            storage,
            temp_dir,
            _media_dir: media_dir,
        }
    }

    /// Local storage whose publish step always fails.
    struct RejectingStorage(Arc<LocalStorage>);

    #[async_trait]
    impl Storage for RejectingStorage {
        async fn upload_file(
            &self,
            _storage_key: &str,
            _local_path: &Path,
            _content_type: &str,
        ) -> StorageResult<()> {
            Err(StorageError::UploadFailed("connection reset by peer".to_string()))
        }

        async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
            self.0.download(storage_key).await
        }

        async fn download_stream(
            &self,
            storage_key: &str,
        ) -> StorageResult<Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>> {
            self.0.download_stream(storage_key).await
        }

        async fn delete(&self, storage_key: &str) -> StorageResult<()> {
            self.0.delete(storage_key).await
        }

        async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
            self.0.exists(storage_key).await
        }

        async fn content_type(&self, storage_key: &str) -> StorageResult<Option<String>> {
            self.0.content_type(storage_key).await
        }

        async fn list(&self, prefix: &str) -> StorageResult<Vec<StoredObject>> {
            self.0.list(prefix).await
        }

        async fn get_presigned_url(
            &self,
            storage_key: &str,
            expires_in: Duration,
        ) -> StorageResult<String> {
            self.0.get_presigned_url(storage_key, expires_in).await
        }

        fn bucket(&self) -> &str {
            self.0.bucket()
        }

        fn backend_type(&self) -> StorageBackend {
            self.0.backend_type()
        }
    }

    /// In-memory repository whose updates always fail.
    struct ReadOnlyRepository(Arc<InMemoryVideoRepository>);

    #[async_trait]
    impl VideoRepository for ReadOnlyRepository {
        async fn get(&self, id: Uuid) -> Result<Option<VideoRecord>, AppError> {
            self.0.get(id).await
        }

        async fn create(&self, record: &VideoRecord) -> Result<(), AppError> {
            self.0.create(record).await
        }

        async fn update(&self, _record: &VideoRecord) -> Result<(), AppError> {
            Err(AppError::Internal("connection closed".to_string()))
        }

        async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
            self.0.delete(id).await
        }

        async fn list_by_owner(&self, user_id: Uuid) -> Result<Vec<VideoRecord>, AppError> {
            self.0.list_by_owner(user_id).await
        }

        async fn video_locators(&self) -> Result<Vec<String>, AppError> {
            self.0.video_locators().await
        }
    }

    fn body(chunks: Vec<&'static [u8]>) -> impl Stream<Item = Result<Bytes, Infallible>> + Send {
        futures::stream::iter(chunks.into_iter().map(|c| Ok(Bytes::from_static(c))))
    }

    async fn create_video(repo: &InMemoryVideoRepository, owner: Uuid) -> VideoRecord {
        let record = VideoRecord::new(owner, "Clip".to_string(), String::new());
        repo.create(&record).await.unwrap();
        record
    }

    fn temp_files(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[tokio::test]
    async fn test_landscape_upload_is_published_and_signed() {
        let h = harness(FakeTools::new(1920, 1080), 1024).await;
        let owner = Uuid::new_v4();
        let video = create_video(&h.repo, owner).await;

        let result = h
            .service
            .ingest(UploadRequest {
                owner,
                video_id: video.id,
                content_type: Some("video/mp4".to_string()),
                declared_length: None,
                body: body(vec![b"raw ", b"video"]),
            })
            .await
            .unwrap();

        let signed = result.video_url.unwrap();
        assert!(signed.starts_with("http://localhost:8091/media/landscape/"));
        assert!(signed.contains("signature="));

        let stored = h.repo.get(video.id).await.unwrap().unwrap();
        let locator: StorageLocator = stored.video_url.unwrap().parse().unwrap();
        assert_eq!(locator.bucket, "local");
        assert!(locator.key.starts_with("landscape/") && locator.key.ends_with(".mp4"));
        assert_eq!(
            h.storage.download(&locator.key).await.unwrap(),
            b"faststart:raw video".to_vec()
        );
        assert_eq!(temp_files(h.temp_dir.path()), 0);
    }

    #[tokio::test]
    async fn test_non_owner_never_stages() {
        let h = harness(FakeTools::new(1920, 1080), 1024).await;
        let video = create_video(&h.repo, Uuid::new_v4()).await;

        let err = h
            .service
            .ingest(UploadRequest {
                owner: Uuid::new_v4(),
                video_id: video.id,
                content_type: Some("video/mp4".to_string()),
                declared_length: None,
                body: body(vec![b"data"]),
            })
            .await
            .unwrap_err();

        assert_eq!(err.category(), ErrorCategory::Authorization);
        assert_eq!(temp_files(h.temp_dir.path()), 0);
        assert!(h.repo.get(video.id).await.unwrap().unwrap().video_url.is_none());
    }

    #[tokio::test]
    async fn test_missing_video_is_validation_error() {
        let h = harness(FakeTools::new(1920, 1080), 1024).await;
        let err = h
            .service
            .ingest(UploadRequest {
                owner: Uuid::new_v4(),
                video_id: Uuid::new_v4(),
                content_type: Some("video/mp4".to_string()),
                declared_length: None,
                body: body(vec![b"data"]),
            })
            .await
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Validation);
    }

    #[tokio::test]
    async fn test_wrong_content_type_rejected_before_staging() {
        let h = harness(FakeTools::new(1920, 1080), 1024).await;
        let owner = Uuid::new_v4();
        let video = create_video(&h.repo, owner).await;

        let err = h
            .service
            .ingest(UploadRequest {
                owner,
                video_id: video.id,
                content_type: Some("video/quicktime".to_string()),
                declared_length: None,
                body: body(vec![b"data"]),
            })
            .await
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Validation);
        assert_eq!(temp_files(h.temp_dir.path()), 0);
    }

    #[tokio::test]
    async fn test_oversized_stream_aborts_and_cleans_up() {
        let h = harness(FakeTools::new(1920, 1080), 8).await;
        let owner = Uuid::new_v4();
        let video = create_video(&h.repo, owner).await;

        let err = h
            .service
            .ingest(UploadRequest {
                owner,
                video_id: video.id,
                content_type: Some("video/mp4".to_string()),
                declared_length: None,
                body: body(vec![b"12345", b"67890"]),
            })
            .await
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::ResourceLimit);
        assert_eq!(temp_files(h.temp_dir.path()), 0);
    }

    #[tokio::test]
    async fn test_declared_length_over_cap_rejected() {
        let h = harness(FakeTools::new(1920, 1080), 8).await;
        let owner = Uuid::new_v4();
        let video = create_video(&h.repo, owner).await;

        let err = h
            .service
            .ingest(UploadRequest {
                owner,
                video_id: video.id,
                content_type: Some("video/mp4".to_string()),
                declared_length: Some(9),
                body: body(vec![b"1"]),
            })
            .await
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::ResourceLimit);
    }

    #[tokio::test]
    async fn test_probe_failure_is_processing_and_cleans_up() {
        let mut tools = FakeTools::new(1920, 1080);
        tools.ffprobe_fails = true;
        let h = harness(tools, 1024).await;
        let owner = Uuid::new_v4();
        let video = create_video(&h.repo, owner).await;

        let err = h
            .service
            .ingest(UploadRequest {
                owner,
                video_id: video.id,
                content_type: Some("video/mp4".to_string()),
                declared_length: None,
                body: body(vec![b"garbage"]),
            })
            .await
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Processing);
        assert_eq!(temp_files(h.temp_dir.path()), 0);
        assert!(h.storage.list("").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_remux_output_is_processing_and_cleans_up() {
        let mut tools = FakeTools::new(1080, 1920);
        tools.ffmpeg_writes_empty = true;
        let h = harness(tools, 1024).await;
        let owner = Uuid::new_v4();
        let video = create_video(&h.repo, owner).await;

        let err = h
            .service
            .ingest(UploadRequest {
                owner,
                video_id: video.id,
                content_type: Some("video/mp4".to_string()),
                declared_length: None,
                body: body(vec![b"video"]),
            })
            .await
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Processing);
        assert_eq!(temp_files(h.temp_dir.path()), 0);
        assert!(h.repo.get(video.id).await.unwrap().unwrap().video_url.is_none());
    }

    #[tokio::test]
    async fn test_portrait_and_other_prefixes() {
        for (width, height, prefix) in [(1080, 1920, "portrait/"), (1000, 1000, "other/")] {
            let h = harness(FakeTools::new(width, height), 1024).await;
            let owner = Uuid::new_v4();
            let video = create_video(&h.repo, owner).await;

            h.service
                .ingest(UploadRequest {
                    owner,
                    video_id: video.id,
                    content_type: Some("video/mp4".to_string()),
                    declared_length: None,
                    body: body(vec![b"v"]),
                })
                .await
                .unwrap();

            let stored = h.repo.get(video.id).await.unwrap().unwrap();
            let locator: StorageLocator = stored.video_url.unwrap().parse().unwrap();
            assert!(locator.key.starts_with(prefix));
        }
    }

    #[tokio::test]
    async fn test_publish_failure_is_storage_and_cleans_up() {
        let h = harness_with(
            FakeTools::new(1920, 1080),
            1024,
            |storage| Arc::new(RejectingStorage(storage)),
            |repo| repo,
        )
        .await;
        let owner = Uuid::new_v4();
        let video = create_video(&h.repo, owner).await;

        let err = h
            .service
            .ingest(UploadRequest {
                owner,
                video_id: video.id,
                content_type: Some("video/mp4".to_string()),
                declared_length: None,
                body: body(vec![b"video"]),
            })
            .await
            .unwrap_err();

        assert_eq!(err.category(), ErrorCategory::Storage);
        assert_eq!(temp_files(h.temp_dir.path()), 0);
        assert!(h.repo.get(video.id).await.unwrap().unwrap().video_url.is_none());
        assert!(h.storage.list("").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_record_failure_keeps_published_object() {
        let h = harness_with(
            FakeTools::new(1920, 1080),
            1024,
            |storage| storage,
            |repo| Arc::new(ReadOnlyRepository(repo)),
        )
        .await;
        let owner = Uuid::new_v4();
        let video = create_video(&h.repo, owner).await;

        let err = h
            .service
            .ingest(UploadRequest {
                owner,
                video_id: video.id,
                content_type: Some("video/mp4".to_string()),
                declared_length: None,
                body: body(vec![b"video"]),
            })
            .await
            .unwrap_err();

        assert_eq!(err.category(), ErrorCategory::Storage);
        assert_eq!(temp_files(h.temp_dir.path()), 0);

        let stored = h.repo.get(video.id).await.unwrap().unwrap();
        assert!(stored.video_url.is_none());
        assert_eq!(stored.updated_at, video.updated_at);

        let objects = h.storage.list("landscape/").await.unwrap();
        assert_eq!(objects.len(), 1);
        assert_eq!(
            h.storage.download(&objects[0].key).await.unwrap(),
            b"faststart:video".to_vec()
        );
    }

    #[tokio::test]
    async fn test_interrupted_stream_cleans_up() {
        let h = harness(FakeTools::new(1920, 1080), 1024).await;
        let owner = Uuid::new_v4();
        let video = create_video(&h.repo, owner).await;

        let interrupted = futures::stream::iter(vec![
            Ok(Bytes::from_static(b"partial ")),
            Err("client disconnected".to_string()),
        ]);

        let err = h
            .service
            .ingest(UploadRequest {
                owner,
                video_id: video.id,
                content_type: Some("video/mp4".to_string()),
                declared_length: None,
                body: interrupted,
            })
            .await
            .unwrap_err();

        assert_eq!(err.category(), ErrorCategory::Validation);
        assert_eq!(temp_files(h.temp_dir.path()), 0);
        assert!(h.storage.list("").await.unwrap().is_empty());
        assert!(h.repo.get(video.id).await.unwrap().unwrap().video_url.is_none());
    }
}
