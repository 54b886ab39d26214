use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::repository::{EntitlementRepository, ScoreHistoryRepository, Storage};

mod entitlement_repo;
mod json;
mod score_repo;

/// File name of the persisted entitlement list inside the data directory.
pub const ENTITLEMENTS_FILE: &str = "SavedBookStatus";
/// File name of the persisted score history inside the data directory.
pub const SCORES_FILE: &str = "SavedScores";

/// JSON-file backed repository rooted in an application-private directory.
#[derive(Clone, Debug)]
pub struct FileRepository {
    dir: PathBuf,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FileInitError {
    #[error("data path {0} exists and is not a directory")]
    NotADirectory(PathBuf),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FileRepository {
    /// Open the data directory, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns `FileInitError` if the directory cannot be created or the path
    /// points at a regular file.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, FileInitError> {
        let dir = dir.into();
        match tokio::fs::metadata(&dir).await {
            Ok(meta) if !meta.is_dir() => return Err(FileInitError::NotADirectory(dir)),
            Ok(_) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tokio::fs::create_dir_all(&dir).await?;
            }
            Err(err) => return Err(err.into()),
        }
        Ok(Self { dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub(crate) fn path_for(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }
}

impl Storage {
    /// Build a `Storage` backed by JSON files in `dir`.
    ///
    /// # Errors
    ///
    /// Returns `FileInitError` if the data directory cannot be prepared.
    pub async fn files(dir: impl Into<PathBuf>) -> Result<Self, FileInitError> {
        let repo = FileRepository::open(dir).await?;
        let entitlements: Arc<dyn EntitlementRepository> = Arc::new(repo.clone());
        let scores: Arc<dyn ScoreHistoryRepository> = Arc::new(repo);
        Ok(Self {
            entitlements,
            scores,
        })
    }
}
