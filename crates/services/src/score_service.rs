use std::sync::Arc;

use storage::repository::ScoreHistoryRepository;
use tracing::{debug, warn};
use trivia_core::model::ScoreHistory;

/// Keeps the last three session scores and persists them on every change.
pub struct ScoreHistoryService {
    repo: Arc<dyn ScoreHistoryRepository>,
    history: ScoreHistory,
}

impl ScoreHistoryService {
    #[must_use]
    pub fn new(repo: Arc<dyn ScoreHistoryRepository>) -> Self {
        Self {
            repo,
            history: ScoreHistory::default(),
        }
    }

    #[must_use]
    pub fn history(&self) -> &ScoreHistory {
        &self.history
    }

    /// Replace the in-memory history with the persisted one.
    ///
    /// Any failure, including nothing saved yet, leaves a zeroed history.
    pub async fn load(&mut self) {
        self.history = match self.repo.load_scores().await {
            Ok(Some(history)) => history,
            Ok(None) => {
                debug!("no saved scores, starting from zero");
                ScoreHistory::default()
            }
            Err(err) => {
                warn!(error = %err, "could not load scores, resetting history");
                ScoreHistory::default()
            }
        };
    }

    /// Push a finished session's score and persist the history.
    pub async fn record_session(&mut self, score: i32) {
        self.history.record(score);
        if let Err(err) = self.repo.save_scores(&self.history).await {
            warn!(error = %err, "unable to save scores");
        }
    }
}
