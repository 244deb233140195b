use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::error::AppError;

/// Where a published object lives: bucket plus key.
///
/// Persisted on the video record as `"<bucket>,<key>"`. This is not a resolvable URL;
/// readers receive a signed link derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageLocator {
    pub bucket: String,
    pub key: String,
}

impl StorageLocator {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

impl Display for StorageLocator {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{},{}", self.bucket, self.key)
    }
}

impl FromStr for StorageLocator {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(',') {
            Some((bucket, key)) if !bucket.is_empty() && !key.is_empty() && !key.contains(',') => {
                Ok(StorageLocator::new(bucket, key))
            }
            _ => Err(AppError::Storage(format!(
                "malformed storage locator: {}",
                s
            ))),
        }
    }
}
