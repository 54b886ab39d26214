use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use trivia_core::model::{Entitlements, ScoreHistory};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("resource missing: {0}")]
    ResourceMissing(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("io error: {0}")]
    Io(String),

    #[error("connection error: {0}")]
    Connection(String),
}

/// Repository contract for the per-book entitlement list.
#[async_trait]
pub trait EntitlementRepository: Send + Sync {
    /// Load the persisted entitlement list.
    ///
    /// Returns `Ok(None)` when nothing has been saved yet.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Parse` for corrupt data, or other storage errors.
    async fn load_entitlements(&self) -> Result<Option<Entitlements>, StorageError>;

    /// Persist the full entitlement list, replacing the previous one.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the list cannot be stored.
    async fn save_entitlements(&self, entitlements: &Entitlements) -> Result<(), StorageError>;
}

/// Repository contract for the recent-scores history.
#[async_trait]
pub trait ScoreHistoryRepository: Send + Sync {
    /// Load the persisted history.
    ///
    /// Returns `Ok(None)` when nothing has been saved yet.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Parse` for corrupt data, or other storage errors.
    async fn load_scores(&self) -> Result<Option<ScoreHistory>, StorageError>;

    /// Persist the history, replacing the previous one.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the history cannot be stored.
    async fn save_scores(&self, history: &ScoreHistory) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    entitlements: Arc<Mutex<Option<Entitlements>>>,
    scores: Arc<Mutex<Option<ScoreHistory>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EntitlementRepository for InMemoryRepository {
    async fn load_entitlements(&self) -> Result<Option<Entitlements>, StorageError> {
        let guard = self
            .entitlements
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }

    async fn save_entitlements(&self, entitlements: &Entitlements) -> Result<(), StorageError> {
        let mut guard = self
            .entitlements
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = Some(entitlements.clone());
        Ok(())
    }
}

#[async_trait]
impl ScoreHistoryRepository for InMemoryRepository {
    async fn load_scores(&self) -> Result<Option<ScoreHistory>, StorageError> {
        let guard = self
            .scores
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(*guard)
    }

    async fn save_scores(&self, history: &ScoreHistory) -> Result<(), StorageError> {
        let mut guard = self
            .scores
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = Some(*history);
        Ok(())
    }
}

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub entitlements: Arc<dyn EntitlementRepository>,
    pub scores: Arc<dyn ScoreHistoryRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let entitlements: Arc<dyn EntitlementRepository> = Arc::new(repo.clone());
        let scores: Arc<dyn ScoreHistoryRepository> = Arc::new(repo);
        Self {
            entitlements,
            scores,
        }
    }
}
