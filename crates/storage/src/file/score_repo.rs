use async_trait::async_trait;
use trivia_core::model::ScoreHistory;

use crate::repository::{ScoreHistoryRepository, StorageError};

use super::json::{read_json, write_json};
use super::{FileRepository, SCORES_FILE};

#[async_trait]
impl ScoreHistoryRepository for FileRepository {
    async fn load_scores(&self) -> Result<Option<ScoreHistory>, StorageError> {
        read_json(&self.path_for(SCORES_FILE)).await
    }

    async fn save_scores(&self, history: &ScoreHistory) -> Result<(), StorageError> {
        write_json(&self.path_for(SCORES_FILE), history).await
    }
}
