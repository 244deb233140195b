//! Read path and lifecycle of video records.

use clipvault_core::models::{CreateVideoRequest, VideoRecord};
use clipvault_core::AppError;
use clipvault_db::VideoRepository;
use clipvault_processing::VideoLocks;
use clipvault_storage::{sign_video_record, Storage};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use super::thumbnails::ThumbnailService;

const MAX_TITLE_LEN: usize = 200;

pub struct VideoCatalog {
    repository: Arc<dyn VideoRepository>,
    storage: Arc<dyn Storage>,
    thumbnails: Arc<ThumbnailService>,
    locks: Arc<VideoLocks>,
    signed_url_ttl: Duration,
}

impl VideoCatalog {
    pub fn new(
        repository: Arc<dyn VideoRepository>,
        storage: Arc<dyn Storage>,
        thumbnails: Arc<ThumbnailService>,
        locks: Arc<VideoLocks>,
        signed_url_ttl: Duration,
    ) -> Self {
        Self {
            repository,
            storage,
            thumbnails,
            locks,
            signed_url_ttl,
        }
    }

    /// Create an empty record owned by `owner`.
    pub async fn create(
        &self,
        owner: Uuid,
        request: CreateVideoRequest,
    ) -> Result<VideoRecord, AppError> {
        let title = request.title.trim();
        if title.is_empty() {
            return Err(AppError::InvalidInput("Title must not be empty".to_string()));
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(AppError::InvalidInput(format!(
                "Title must be at most {} characters",
                MAX_TITLE_LEN
            )));
        }

        let record = VideoRecord::new(owner, title.to_string(), request.description);
        self.repository.create(&record).await?;
        tracing::info!(video_id = %record.id, user_id = %owner, "Video record created");
        Ok(record)
    }

    /// Fetch a record the caller owns, with a freshly signed `video_url`.
    pub async fn get(&self, owner: Uuid, video_id: Uuid) -> Result<VideoRecord, AppError> {
        let record = self.owned(owner, video_id).await?;
        self.sign(record).await
    }

    /// All records owned by `owner`, newest first, each signed.
    pub async fn list(&self, owner: Uuid) -> Result<Vec<VideoRecord>, AppError> {
        let records = self.repository.list_by_owner(owner).await?;
        let mut signed = Vec::with_capacity(records.len());
        for record in records {
            signed.push(self.sign(record).await?);
        }
        Ok(signed)
    }

    /// Delete the record and its thumbnail. The published object is left for the sweeper.
    pub async fn delete(&self, owner: Uuid, video_id: Uuid) -> Result<(), AppError> {
        let _guard = self.locks.lock(video_id).await;
        self.owned(owner, video_id).await?;

        if !self.repository.delete(video_id).await? {
            return Err(AppError::NotFound(format!("Video {} not found", video_id)));
        }
        self.thumbnails.remove(video_id).await;

        tracing::info!(video_id = %video_id, user_id = %owner, "Video record deleted");
        Ok(())
    }

    async fn owned(&self, owner: Uuid, video_id: Uuid) -> Result<VideoRecord, AppError> {
        let record = self
            .repository
            .get(video_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Video {} not found", video_id)))?;
        if !record.is_owned_by(owner) {
            return Err(AppError::Forbidden(
                "You are not the owner of this video".to_string(),
            ));
        }
        Ok(record)
    }

    /// Swap the stored locator for a link valid for the configured TTL.
    pub async fn sign(&self, record: VideoRecord) -> Result<VideoRecord, AppError> {
        Ok(sign_video_record(self.storage.as_ref(), record, self.signed_url_ttl).await?)
    }
}
