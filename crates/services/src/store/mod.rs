mod listener;
mod local;
mod purchase_api;
mod service;

pub use local::{LocalPurchaseApi, LocalResponse};
pub use purchase_api::{Product, PurchaseApi, PurchaseResult, TransactionUpdate};
pub use service::{
    EntitlementStore, PurchaseOutcome, StoreEvent, is_purchasable, purchasable_products,
};
