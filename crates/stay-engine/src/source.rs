//! Feed sources: the "fetch bytes" boundary.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::{Result, SyncError};
use crate::model::Source;

/// One booking feed. Implementations perform I/O only; parsing happens later.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Stable identifier used in logs and error reports.
    fn id(&self) -> &str;

    fn source(&self) -> Source;

    /// # Errors
    /// Returns `SyncError::Fetch` on any transport failure.
    async fn fetch(&self) -> Result<Vec<u8>>;
}

/// A feed read from the local filesystem (exported or mirrored calendars).
#[derive(Debug, Clone)]
pub struct FileFeed {
    id: String,
    source: Source,
    path: PathBuf,
}

impl FileFeed {
    pub fn new(source: Source, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            id: format!("{}:{}", source, path.display()),
            source,
            path,
        }
    }
}

#[async_trait]
impl FeedSource for FileFeed {
    fn id(&self) -> &str {
        &self.id
    }

    fn source(&self) -> Source {
        self.source.clone()
    }

    async fn fetch(&self) -> Result<Vec<u8>> {
        tokio::fs::read(&self.path)
            .await
            .map_err(|e| SyncError::Fetch {
                source_id: self.id.clone(),
                message: e.to_string(),
            })
    }
}
