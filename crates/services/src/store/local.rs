use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use trivia_core::model::{ProductId, PurchaseRecord, Verification};

use super::purchase_api::{Product, PurchaseApi, PurchaseResult, TransactionUpdate};
use super::service::purchasable_products;
use crate::error::PurchaseApiError;

const UPDATE_CAPACITY: usize = 16;

/// How `LocalPurchaseApi` answers purchase requests until told otherwise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LocalResponse {
    #[default]
    Approve,
    Pending,
    Cancel,
    /// Payment succeeds but the transaction fails verification.
    Unverified,
    /// Every call fails as if the platform were offline.
    Unreachable,
}

/// In-process purchase platform.
///
/// Approves purchases by default and lets callers simulate refunds, purchases
/// made outside the app, and the other platform responses.
pub struct LocalPurchaseApi {
    products: Vec<Product>,
    entitlements: Mutex<HashMap<ProductId, PurchaseRecord>>,
    response: Mutex<LocalResponse>,
    updates: broadcast::Sender<TransactionUpdate>,
}

impl Default for LocalPurchaseApi {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalPurchaseApi {
    /// A platform listing the four book products.
    #[must_use]
    pub fn new() -> Self {
        let products = purchasable_products()
            .into_iter()
            .map(|id| Product {
                display_name: id
                    .book()
                    .map_or_else(|| id.to_string(), |book| format!("Book {book}")),
                display_price: "$1.99".to_owned(),
                id,
            })
            .collect();
        Self::with_products(products)
    }

    #[must_use]
    pub fn with_products(products: Vec<Product>) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CAPACITY);
        Self {
            products,
            entitlements: Mutex::new(HashMap::new()),
            response: Mutex::new(LocalResponse::default()),
            updates,
        }
    }

    /// Answer subsequent requests with `response`.
    pub fn respond_with(&self, response: LocalResponse) {
        *self.response.lock().unwrap_or_else(PoisonError::into_inner) = response;
    }

    /// Record a purchase made outside the app and announce it.
    pub fn grant(&self, product: &ProductId) {
        self.entitlements
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(product.clone(), PurchaseRecord::verified(product.clone()));
        self.announce(product);
    }

    /// Refund a purchase and announce it.
    pub fn revoke(&self, product: &ProductId, at: DateTime<Utc>) {
        if let Some(record) = self
            .entitlements
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(product)
        {
            record.revoked_at = Some(at);
        }
        self.announce(product);
    }

    fn announce(&self, product: &ProductId) {
        // No subscribers is fine.
        let _ = self.updates.send(TransactionUpdate {
            product_id: product.clone(),
        });
    }

    fn response(&self) -> LocalResponse {
        *self.response.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl PurchaseApi for LocalPurchaseApi {
    async fn list_products(&self, ids: &[ProductId]) -> Result<Vec<Product>, PurchaseApiError> {
        if self.response() == LocalResponse::Unreachable {
            return Err(PurchaseApiError::Unreachable("local store offline".into()));
        }
        Ok(self
            .products
            .iter()
            .filter(|product| ids.contains(&product.id))
            .cloned()
            .collect())
    }

    async fn purchase(&self, product: &Product) -> Result<PurchaseResult, PurchaseApiError> {
        if !self.products.iter().any(|p| p.id == product.id) {
            return Err(PurchaseApiError::ProductUnavailable(product.id.clone()));
        }
        match self.response() {
            LocalResponse::Approve => {
                let record = PurchaseRecord::verified(product.id.clone());
                self.entitlements
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(product.id.clone(), record.clone());
                Ok(PurchaseResult::Success(record))
            }
            LocalResponse::Unverified => Ok(PurchaseResult::Success(PurchaseRecord {
                product_id: product.id.clone(),
                verification: Verification::Unverified {
                    reason: "signature mismatch".into(),
                },
                revoked_at: None,
            })),
            LocalResponse::Pending => Ok(PurchaseResult::Pending),
            LocalResponse::Cancel => Ok(PurchaseResult::UserCancelled),
            LocalResponse::Unreachable => {
                Err(PurchaseApiError::Unreachable("local store offline".into()))
            }
        }
    }

    async fn current_entitlement(&self, product: &ProductId) -> Option<PurchaseRecord> {
        self.entitlements
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(product)
            .cloned()
    }

    fn transaction_updates(&self) -> broadcast::Receiver<TransactionUpdate> {
        self.updates.subscribe()
    }
}
