use async_trait::async_trait;
use trivia_core::model::Entitlements;

use crate::repository::{EntitlementRepository, StorageError};

use super::json::{read_json, write_json};
use super::{ENTITLEMENTS_FILE, FileRepository};

#[async_trait]
impl EntitlementRepository for FileRepository {
    async fn load_entitlements(&self) -> Result<Option<Entitlements>, StorageError> {
        read_json(&self.path_for(ENTITLEMENTS_FILE)).await
    }

    async fn save_entitlements(&self, entitlements: &Entitlements) -> Result<(), StorageError> {
        write_json(&self.path_for(ENTITLEMENTS_FILE), entitlements).await
    }
}
