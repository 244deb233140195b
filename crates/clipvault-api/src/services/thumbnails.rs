//! Thumbnail images, held in process memory and served from a public route.

use bytes::Bytes;
use chrono::Utc;
use clipvault_core::models::VideoRecord;
use clipvault_core::AppError;
use clipvault_db::VideoRepository;
use clipvault_processing::VideoLocks;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Thumbnail {
    pub content_type: String,
    pub data: Bytes,
}

pub struct ThumbnailService {
    images: RwLock<HashMap<Uuid, Thumbnail>>,
    repository: Arc<dyn VideoRepository>,
    locks: Arc<VideoLocks>,
    public_base_url: String,
}

impl ThumbnailService {
    pub fn new(
        repository: Arc<dyn VideoRepository>,
        locks: Arc<VideoLocks>,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            images: RwLock::new(HashMap::new()),
            repository,
            locks,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn public_url(&self, video_id: Uuid) -> String {
        format!("{}/api/thumbnails/{}", self.public_base_url, video_id)
    }

    /// Store `thumbnail` for `video_id` and point the record's `thumbnail_url` at it.
    #[tracing::instrument(skip(self, thumbnail), fields(size_bytes = thumbnail.data.len()))]
    pub async fn attach(
        &self,
        video_id: Uuid,
        thumbnail: Thumbnail,
    ) -> Result<VideoRecord, AppError> {
        let _guard = self.locks.lock(video_id).await;

        let mut record = self
            .repository
            .get(video_id)
            .await?
            .ok_or_else(|| AppError::InvalidInput("Couldn't find video".to_string()))?;

        record.thumbnail_url = Some(self.public_url(video_id));
        record.updated_at = Utc::now();
        self.repository.update(&record).await?;

        self.images.write().await.insert(video_id, thumbnail);

        tracing::info!(video_id = %video_id, "Thumbnail stored");
        Ok(record)
    }

    pub async fn get(&self, video_id: Uuid) -> Option<Thumbnail> {
        self.images.read().await.get(&video_id).cloned()
    }

    pub async fn remove(&self, video_id: Uuid) -> bool {
        self.images.write().await.remove(&video_id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipvault_db::InMemoryVideoRepository;

    fn service(repo: Arc<InMemoryVideoRepository>) -> ThumbnailService {
        ThumbnailService::new(repo, Arc::new(VideoLocks::new()), "http://localhost:8091/")
    }

    fn png() -> Thumbnail {
        Thumbnail {
            content_type: "image/png".to_string(),
            data: Bytes::from_static(b"\x89PNG"),
        }
    }

    #[tokio::test]
    async fn test_attach_sets_public_url() {
        let repo = Arc::new(InMemoryVideoRepository::new());
        let record = VideoRecord::new(Uuid::new_v4(), "Clip".to_string(), String::new());
        repo.create(&record).await.unwrap();
        let thumbnails = service(repo.clone());

        let updated = thumbnails.attach(record.id, png()).await.unwrap();
        let expected = format!("http://localhost:8091/api/thumbnails/{}", record.id);
        assert_eq!(updated.thumbnail_url.as_deref(), Some(expected.as_str()));

        let stored = repo.get(record.id).await.unwrap().unwrap();
        assert_eq!(stored.thumbnail_url, updated.thumbnail_url);
        assert_eq!(
            thumbnails.get(record.id).await.unwrap().data,
            Bytes::from_static(b"\x89PNG")
        );
    }

    #[tokio::test]
    async fn test_attach_to_missing_video_stores_nothing() {
        let thumbnails = service(Arc::new(InMemoryVideoRepository::new()));
        let id = Uuid::new_v4();
        assert!(thumbnails.attach(id, png()).await.is_err());
        assert!(thumbnails.get(id).await.is_none());
    }

    #[tokio::test]
    async fn test_remove() {
        let repo = Arc::new(InMemoryVideoRepository::new());
        let record = VideoRecord::new(Uuid::new_v4(), "Clip".to_string(), String::new());
        repo.create(&record).await.unwrap();
        let thumbnails = service(repo);

        thumbnails.attach(record.id, png()).await.unwrap();
        assert!(thumbnails.remove(record.id).await);
        assert!(!thumbnails.remove(record.id).await);
    }

    struct FailingUpdates(Arc<InMemoryVideoRepository>);

    #[async_trait::async_trait]
    impl VideoRepository for FailingUpdates {
        async fn get(&self, id: Uuid) -> Result<Option<VideoRecord>, AppError> {
            self.0.get(id).await
        }

        async fn create(&self, record: &VideoRecord) -> Result<(), AppError> {
            self.0.create(record).await
        }

        async fn update(&self, _record: &VideoRecord) -> Result<(), AppError> {
            Err(AppError::Storage("metadata store unavailable".to_string()))
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

    #[tokio::test]
    async fn test_failed_update_stores_no_image() {
        let repo = Arc::new(InMemoryVideoRepository::new());
        let record = VideoRecord::new(Uuid::new_v4(), "Clip".to_string(), String::new());
        repo.create(&record).await.unwrap();
        let thumbnails = ThumbnailService::new(
            Arc::new(FailingUpdates(repo.clone())),
            Arc::new(VideoLocks::new()),
            "http://localhost:8091",
        );

        assert!(thumbnails.attach(record.id, png()).await.is_err());
        assert!(thumbnails.get(record.id).await.is_none());
        assert!(repo.get(record.id).await.unwrap().unwrap().thumbnail_url.is_none());
    }
}
