//! Shared error types for the services crate.

use thiserror::Error;

use trivia_core::model::{BookId, EntitlementError, ProductId};

/// Errors emitted by a `PurchaseApi` implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PurchaseApiError {
    #[error("product {0} is not available")]
    ProductUnavailable(ProductId),
    #[error("purchase service unreachable: {0}")]
    Unreachable(String),
}

/// Errors emitted by `EntitlementStore`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    #[error("book {book} is locked until it is purchased")]
    Locked { book: BookId },
    #[error("book {book} cannot be purchased")]
    NotPurchasable { book: BookId },
    #[error(transparent)]
    Entitlement(#[from] EntitlementError),
}
