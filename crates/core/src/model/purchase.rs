use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::model::ids::{BookId, ProductId};

//
// ─── PURCHASE RECORD ───────────────────────────────────────────────────────────
//

/// Result of the platform's signature check on a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    Verified,
    Unverified { reason: String },
}

/// Latest entitlement the purchase platform reports for a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseRecord {
    pub product_id: ProductId,
    pub verification: Verification,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl PurchaseRecord {
    #[must_use]
    pub fn verified(product_id: ProductId) -> Self {
        Self {
            product_id,
            verification: Verification::Verified,
            revoked_at: None,
        }
    }

    #[must_use]
    pub fn is_verified(&self) -> bool {
        matches!(self.verification, Verification::Verified)
    }
}

//
// ─── OWNED PRODUCTS ────────────────────────────────────────────────────────────
//

/// What reconciling one record did to the owned set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
    Granted,
    Revoked,
    /// Unverified record, the set was left alone.
    Ignored,
}

/// Product ids the player currently owns. Rebuilt from purchase history, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnedProducts(BTreeSet<ProductId>);

impl OwnedProducts {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, product: &ProductId) -> bool {
        self.0.contains(product)
    }

    #[must_use]
    pub fn owns_book(&self, book: BookId) -> bool {
        self.contains(&ProductId::for_book(book))
    }

    /// Returns true if the product was not owned before.
    pub fn insert(&mut self, product: ProductId) -> bool {
        self.0.insert(product)
    }

    /// Returns true if the product was owned before.
    pub fn remove(&mut self, product: &ProductId) -> bool {
        self.0.remove(product)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProductId> {
        self.0.iter()
    }

    /// Folds one entitlement record into the set.
    ///
    /// Verified and not revoked grants ownership, verified and revoked takes
    /// it away, unverified leaves the set untouched. Idempotent.
    pub fn reconcile(&mut self, record: &PurchaseRecord) -> Reconciled {
        if !record.is_verified() {
            return Reconciled::Ignored;
        }
        if record.revoked_at.is_none() {
            self.0.insert(record.product_id.clone());
            Reconciled::Granted
        } else {
            self.0.remove(&record.product_id);
            Reconciled::Revoked
        }
    }
}
