//! Orphan sweep: delete published objects that no video record references.
//!
//! Objects become orphans when a publish succeeds but the record update fails, when a
//! later upload replaces an earlier one, or when a record is deleted.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use clipvault_core::models::{OrientationClass, StorageLocator};
use clipvault_core::AppError;
use clipvault_db::VideoRepository;
use clipvault_storage::Storage;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub scanned: usize,
    pub referenced: usize,
    pub too_recent: usize,
    pub deleted: Vec<String>,
    pub failed: usize,
}

pub struct OrphanSweeper {
    repo: Arc<dyn VideoRepository>,
    storage: Arc<dyn Storage>,
    min_age: Duration,
}

impl OrphanSweeper {
    pub fn new(repo: Arc<dyn VideoRepository>, storage: Arc<dyn Storage>, min_age: Duration) -> Self {
        Self {
            repo,
            storage,
            min_age,
        }
    }

    /// Run one sweep. With `dry_run` the report lists what would be deleted.
    #[tracing::instrument(skip(self))]
    pub async fn sweep(&self, dry_run: bool) -> Result<SweepReport, AppError> {
        let bucket = self.storage.bucket().to_string();
        let referenced: HashSet<String> = self
            .repo
            .video_locators()
            .await?
            .into_iter()
            .filter_map(|raw| raw.parse::<StorageLocator>().ok())
            .filter(|locator| locator.bucket == bucket)
            .map(|locator| locator.key)
            .collect();

        let min_age = chrono::Duration::from_std(self.min_age)
            .map_err(|e| AppError::Internal(format!("Invalid sweep age: {}", e)))?;
        let cutoff = Utc::now() - min_age;

        let mut report = SweepReport::default();
        for class in OrientationClass::ALL {
            let objects = self.storage.list(&format!("{}/", class)).await?;
            for object in objects {
                report.scanned += 1;

                if referenced.contains(&object.key) {
                    report.referenced += 1;
                    continue;
                }
                if object.last_modified > cutoff {
                    report.too_recent += 1;
                    continue;
                }

                if dry_run {
                    report.deleted.push(object.key);
                    continue;
                }

                match self.storage.delete(&object.key).await {
                    Ok(()) => report.deleted.push(object.key),
                    Err(e) => {
                        tracing::warn!(key = %object.key, error = %e, "Failed to delete orphaned object");
                        report.failed += 1;
                    }
                }
            }
        }

        tracing::info!(
            bucket = %bucket,
            dry_run,
            scanned = report.scanned,
            deleted = report.deleted.len(),
            failed = report.failed,
            "Orphan sweep finished"
        );

        Ok(report)
    }

    /// Sweep every `interval` until the task is aborted.
    pub fn spawn(self: Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // First tick fires immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = self.sweep(false).await {
                    tracing::error!(error = %e, "Orphan sweep failed");
                }
            }
        })
    }
}
