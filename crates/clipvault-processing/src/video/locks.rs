use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

/// Per-video async locks serializing read-modify-write of a video record.
#[derive(Default)]
pub struct VideoLocks {
    locks: Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
}

impl VideoLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `video_id`'s record.
    pub async fn lock(&self, video_id: Uuid) -> OwnedMutexGuard<()> {
        let entry = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            // Drop entries nobody holds or waits on.
            locks.retain(|id, lock| *id == video_id || Arc::strong_count(lock) > 1);
            locks.entry(video_id).or_default().clone()
        };
        entry.lock_owned().await
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_video_is_serialized() {
        let locks = Arc::new(VideoLocks::new());
        let id = Uuid::new_v4();

        let guard = locks.lock(id).await;
        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.lock(id).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!contender.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_different_videos_do_not_block() {
        let locks = VideoLocks::new();
        let _a = locks.lock(Uuid::new_v4()).await;
        let _b = tokio::time::timeout(Duration::from_secs(1), locks.lock(Uuid::new_v4()))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_idle_entries_are_pruned() {
        let locks = VideoLocks::new();
        for _ in 0..10 {
            drop(locks.lock(Uuid::new_v4()).await);
        }
        drop(locks.lock(Uuid::new_v4()).await);
        assert!(locks.tracked() <= 1);
    }
}
