//! Database repositories for data access layer
//
// Repository trait and implementations
pub mod memory;
pub mod video;
//
pub use memory::InMemoryVideoRepository;
pub use video::{PgVideoRepository, VideoRepository};

use sqlx::PgPool;

/// Apply the embedded schema migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), anyhow::Error> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database migrations applied");
    Ok(())
}
