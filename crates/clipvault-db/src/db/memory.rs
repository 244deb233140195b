//! In-memory video repository, used when no `DATABASE_URL` is configured.

use std::collections::HashMap;

use async_trait::async_trait;
use clipvault_core::models::VideoRecord;
use clipvault_core::AppError;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::video::VideoRepository;

#[derive(Default)]
pub struct InMemoryVideoRepository {
    records: RwLock<HashMap<Uuid, VideoRecord>>,
}

impl InMemoryVideoRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VideoRepository for InMemoryVideoRepository {
    async fn get(&self, id: Uuid) -> Result<Option<VideoRecord>, AppError> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn create(&self, record: &VideoRecord) -> Result<(), AppError> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.id) {
            return Err(AppError::InvalidInput(format!(
                "Video {} already exists",
                record.id
            )));
        }
        records.insert(record.id, record.clone());
        Ok(())
    }

    async fn update(&self, record: &VideoRecord) -> Result<(), AppError> {
        let mut records = self.records.write().await;
        match records.get_mut(&record.id) {
            Some(existing) => {
                *existing = record.clone();
                Ok(())
            }
            None => Err(AppError::NotFound(format!("Video {} not found", record.id))),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.records.write().await.remove(&id).is_some())
    }

    async fn list_by_owner(&self, user_id: Uuid) -> Result<Vec<VideoRecord>, AppError> {
        let mut owned: Vec<VideoRecord> = self
            .records
            .read()
            .await
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn video_locators(&self) -> Result<Vec<String>, AppError> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .filter_map(|r| r.video_url.clone())
            .collect())
    }
}
