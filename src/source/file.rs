use async_trait::async_trait;
use std::path::PathBuf;

use super::PayloadSource;
use crate::error::LoadError;

/// Saved payload on disk, for offline replay of a captured snapshot.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl PayloadSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch_body(&self) -> Result<Vec<u8>, LoadError> {
        tokio::fs::read(&self.path).await.map_err(|source| LoadError::Io {
            path: self.path.display().to_string(),
            source,
        })
    }
}
