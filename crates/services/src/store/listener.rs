use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};
use trivia_core::model::{OwnedProducts, PurchaseRecord, Reconciled, Verification};

use super::purchase_api::{PurchaseApi, TransactionUpdate};
use super::service::{StoreEvent, is_purchasable, purchasable_products};

/// Fold `records` into `owned`. Returns true if ownership changed.
pub(crate) fn reconcile_into(owned: &Mutex<OwnedProducts>, records: &[PurchaseRecord]) -> bool {
    let mut owned = owned.lock().unwrap_or_else(PoisonError::into_inner);
    let mut changed = false;
    for record in records {
        if !is_purchasable(&record.product_id) {
            debug!(product = %record.product_id, "ignoring record for unknown product");
            continue;
        }
        let before = owned.contains(&record.product_id);
        match owned.reconcile(record) {
            Reconciled::Ignored => {
                if let Verification::Unverified { reason } = &record.verification {
                    warn!(product = %record.product_id, reason = %reason, "unverified transaction");
                }
            }
            Reconciled::Granted | Reconciled::Revoked => {
                changed |= before != owned.contains(&record.product_id);
            }
        }
    }
    changed
}

/// Ask the platform for the current entitlement of every book product.
pub(crate) async fn refresh_owned(
    api: &dyn PurchaseApi,
    owned: &Mutex<OwnedProducts>,
    events: &broadcast::Sender<StoreEvent>,
) {
    let mut records = Vec::new();
    for product in purchasable_products() {
        if let Some(record) = api.current_entitlement(&product).await {
            records.push(record);
        }
    }
    if reconcile_into(owned, &records) {
        let _ = events.send(StoreEvent::OwnedChanged);
    }
}

/// Reconcile on every transaction update until the platform closes the stream.
pub(crate) async fn watch_for_updates(
    api: Arc<dyn PurchaseApi>,
    mut updates: broadcast::Receiver<TransactionUpdate>,
    owned: Arc<Mutex<OwnedProducts>>,
    events: broadcast::Sender<StoreEvent>,
) {
    loop {
        match updates.recv().await {
            Ok(update) => {
                debug!(product = %update.product_id, "transaction update");
            }
            Err(RecvError::Lagged(skipped)) => {
                debug!(skipped, "transaction updates lagged");
            }
            Err(RecvError::Closed) => break,
        }
        refresh_owned(api.as_ref(), &owned, &events).await;
    }
    debug!("transaction update stream closed");
}
