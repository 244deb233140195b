//! Video metadata repository: trait plus PostgreSQL implementation for the videos table.

use async_trait::async_trait;
use clipvault_core::models::VideoRecord;
use clipvault_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Persistence for video metadata records.
#[async_trait]
pub trait VideoRepository: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<VideoRecord>, AppError>;

    async fn create(&self, record: &VideoRecord) -> Result<(), AppError>;

    /// Overwrite every mutable field of an existing record.
    async fn update(&self, record: &VideoRecord) -> Result<(), AppError>;

    /// Returns `false` when no record had that id.
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;

    /// Records owned by `user_id`, newest first.
    async fn list_by_owner(&self, user_id: Uuid) -> Result<Vec<VideoRecord>, AppError>;

    /// Every stored `video_url` locator string.
    async fn video_locators(&self) -> Result<Vec<String>, AppError>;
}

const SELECT_COLUMNS: &str =
    "SELECT id, user_id, title, description, created_at, updated_at, thumbnail_url, video_url FROM videos";

#[derive(Clone)]
pub struct PgVideoRepository {
    pool: PgPool,
}

impl PgVideoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VideoRepository for PgVideoRepository {
    #[tracing::instrument(skip(self), fields(db.table = "videos", db.record_id = %id))]
    async fn get(&self, id: Uuid) -> Result<Option<VideoRecord>, AppError> {
        let row = sqlx::query_as::<Postgres, VideoRecord>(&format!(
            "{} WHERE id = $1",
            SELECT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    #[tracing::instrument(skip(self, record), fields(db.table = "videos", db.record_id = %record.id))]
    async fn create(&self, record: &VideoRecord) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO videos (id, user_id, title, description, created_at, updated_at, thumbnail_url, video_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(record.id)
        .bind(record.user_id)
        .bind(&record.title)
        .bind(&record.description)
        .bind(record.created_at)
        .bind(record.updated_at)
        .bind(&record.thumbnail_url)
        .bind(&record.video_url)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self, record), fields(db.table = "videos", db.record_id = %record.id))]
    async fn update(&self, record: &VideoRecord) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE videos
            SET title = $2, description = $3, updated_at = $4, thumbnail_url = $5, video_url = $6
            WHERE id = $1
            "#,
        )
        .bind(record.id)
        .bind(&record.title)
        .bind(&record.description)
        .bind(record.updated_at)
        .bind(&record.thumbnail_url)
        .bind(&record.video_url)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Video {} not found", record.id)));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.record_id = %id))]
    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM videos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", user_id = %user_id))]
    async fn list_by_owner(&self, user_id: Uuid) -> Result<Vec<VideoRecord>, AppError> {
        let rows = sqlx::query_as::<Postgres, VideoRecord>(&format!(
            "{} WHERE user_id = $1 ORDER BY created_at DESC",
            SELECT_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos"))]
    async fn video_locators(&self) -> Result<Vec<String>, AppError> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT video_url FROM videos WHERE video_url IS NOT NULL")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|(url,)| url).collect())
    }
}
