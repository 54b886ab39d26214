use async_trait::async_trait;
use tokio::sync::broadcast;
use trivia_core::model::{ProductId, PurchaseRecord};

use crate::error::PurchaseApiError;

/// A product as listed by the purchase platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: ProductId,
    pub display_name: String,
    pub display_price: String,
}

/// Immediate answer of the platform to a purchase request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseResult {
    /// Payment went through; the transaction still has to pass verification.
    Success(PurchaseRecord),
    /// Waiting for approval (e.g. a parent approving a child's request).
    Pending,
    UserCancelled,
}

/// Emitted whenever a transaction changes outside a direct purchase call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionUpdate {
    pub product_id: ProductId,
}

/// Contract of the platform in-app purchase service.
#[async_trait]
pub trait PurchaseApi: Send + Sync {
    /// Fetch store metadata for `ids`. Order is not guaranteed.
    ///
    /// # Errors
    ///
    /// Returns `PurchaseApiError` if the platform cannot be reached.
    async fn list_products(&self, ids: &[ProductId]) -> Result<Vec<Product>, PurchaseApiError>;

    /// Start a purchase flow for `product`.
    ///
    /// # Errors
    ///
    /// Returns `PurchaseApiError` if the purchase could not be started.
    async fn purchase(&self, product: &Product) -> Result<PurchaseResult, PurchaseApiError>;

    /// Latest entitlement for `product`, `None` if it was never bought.
    async fn current_entitlement(&self, product: &ProductId) -> Option<PurchaseRecord>;

    /// Subscribe to transaction updates.
    fn transaction_updates(&self) -> broadcast::Receiver<TransactionUpdate>;
}
