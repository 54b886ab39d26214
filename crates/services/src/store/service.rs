use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};

use storage::repository::EntitlementRepository;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use trivia_core::model::{
    BOOK_COUNT, BookId, BookStatus, EntitlementError, Entitlements, OwnedProducts, ProductId,
    PurchaseRecord, Verification,
};

use super::listener::{reconcile_into, refresh_owned, watch_for_updates};
use super::purchase_api::{Product, PurchaseApi, PurchaseResult};
use crate::error::StoreError;

/// Books before this index are free.
const FIRST_PURCHASABLE_INDEX: usize = 3;
const EVENT_CAPACITY: usize = 32;

/// Product ids of every purchasable book, in book order.
#[must_use]
pub fn purchasable_products() -> Vec<ProductId> {
    (FIRST_PURCHASABLE_INDEX..BOOK_COUNT)
        .filter_map(BookId::from_index)
        .map(ProductId::for_book)
        .collect()
}

/// True for the products that unlock a purchasable book.
#[must_use]
pub fn is_purchasable(product: &ProductId) -> bool {
    product
        .book()
        .and_then(|book| book.index())
        .is_some_and(|index| (FIRST_PURCHASABLE_INDEX..BOOK_COUNT).contains(&index))
}

//
// ─── EVENTS & OUTCOMES ─────────────────────────────────────────────────────────
//

/// Change notifications for whoever renders the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    StatusChanged { book: BookId, status: BookStatus },
    OwnedChanged,
    ProductsLoaded,
}

/// What a purchase attempt ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseOutcome {
    OwnedNow,
    PendingApproval,
    Cancelled,
    VerificationFailed,
    /// The platform call itself failed.
    Failed,
}

//
// ─── STORE ─────────────────────────────────────────────────────────────────────
//

/// Book entitlements plus the set of products the player owns.
///
/// `Entitlements` is only touched from the caller's control flow. The owned
/// set is shared with a background task that follows the platform's
/// transaction updates; that task is stopped by [`EntitlementStore::shutdown`]
/// or when the store is dropped.
pub struct EntitlementStore {
    entitlements: Entitlements,
    repo: Arc<dyn EntitlementRepository>,
    api: Arc<dyn PurchaseApi>,
    owned: Arc<Mutex<OwnedProducts>>,
    products: Vec<Product>,
    events: broadcast::Sender<StoreEvent>,
    listener: Option<JoinHandle<()>>,
}

impl EntitlementStore {
    /// Create a store with default entitlements and start the update listener.
    ///
    /// Outside a tokio runtime the listener is not started.
    #[must_use]
    pub fn new(repo: Arc<dyn EntitlementRepository>, api: Arc<dyn PurchaseApi>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let owned = Arc::new(Mutex::new(OwnedProducts::new()));

        let listener = match Handle::try_current() {
            Ok(handle) => Some(handle.spawn(watch_for_updates(
                Arc::clone(&api),
                api.transaction_updates(),
                Arc::clone(&owned),
                events.clone(),
            ))),
            Err(_) => {
                warn!("no async runtime, purchase updates will not be observed");
                None
            }
        };

        Self {
            entitlements: Entitlements::default(),
            repo,
            api,
            owned,
            products: Vec::new(),
            events,
            listener,
        }
    }

    // ─── Queries ───────────────────────────────────────────────────────────────

    #[must_use]
    pub fn entitlements(&self) -> &Entitlements {
        &self.entitlements
    }

    #[must_use]
    pub fn status(&self, index: usize) -> Option<BookStatus> {
        self.entitlements.status(index)
    }

    #[must_use]
    pub fn active_books(&self) -> BTreeSet<BookId> {
        self.entitlements.active_books()
    }

    #[must_use]
    pub fn has_active_book(&self) -> bool {
        self.entitlements.has_active()
    }

    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    #[must_use]
    pub fn product_for_book(&self, book: BookId) -> Option<&Product> {
        let id = ProductId::for_book(book);
        self.products.iter().find(|product| product.id == id)
    }

    /// Snapshot of the owned product set.
    #[must_use]
    pub fn owned_products(&self) -> OwnedProducts {
        self.owned
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn owns_book(&self, book: BookId) -> bool {
        self.owned
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .owns_book(book)
    }

    /// True for a locked book whose product is owned.
    #[must_use]
    pub fn is_unlockable(&self, index: usize) -> bool {
        match (self.status(index), BookId::from_index(index)) {
            (Some(BookStatus::Locked), Some(book)) => self.owns_book(book),
            _ => false,
        }
    }

    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.listener
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    // ─── Entitlement mutation ──────────────────────────────────────────────────

    /// Set the status of the book at `index` and persist it.
    ///
    /// Moving a book out of `Locked` is not checked here; the purchase flow
    /// confirms ownership first.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Entitlement` if `index` is out of range.
    pub async fn set_status(&mut self, index: usize, status: BookStatus) -> Result<(), StoreError> {
        self.entitlements.set(index, status)?;
        self.save().await;
        if let Some(book) = BookId::from_index(index) {
            let _ = self.events.send(StoreEvent::StatusChanged { book, status });
        }
        Ok(())
    }

    /// Flip a book between active and inactive.
    ///
    /// A locked book becomes active only once its product is owned.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Locked` for a locked book that is not owned, and
    /// `StoreError::Entitlement` if `index` is out of range.
    pub async fn toggle(&mut self, index: usize) -> Result<BookStatus, StoreError> {
        let current = self
            .entitlements
            .status(index)
            .ok_or(EntitlementError::OutOfRange { index })?;
        let book = BookId::from_index(index).ok_or(EntitlementError::OutOfRange { index })?;

        let next = match current {
            BookStatus::Active => BookStatus::Inactive,
            BookStatus::Inactive => BookStatus::Active,
            BookStatus::Locked if self.owns_book(book) => BookStatus::Active,
            BookStatus::Locked => return Err(StoreError::Locked { book }),
        };
        self.set_status(index, next).await?;
        Ok(next)
    }

    /// Switch on every locked book whose product is owned.
    ///
    /// Returns the books that changed.
    pub async fn unlock_owned(&mut self) -> Vec<BookId> {
        let owned = self.owned_products();
        let unlocked: Vec<BookId> = self
            .entitlements
            .iter()
            .filter(|(book, status)| *status == BookStatus::Locked && owned.owns_book(*book))
            .map(|(book, _)| book)
            .collect();
        if unlocked.is_empty() {
            return unlocked;
        }

        for book in &unlocked {
            if let Some(index) = book.index() {
                // Indices come from `iter()`, so they are in range.
                let _ = self.entitlements.set(index, BookStatus::Active);
            }
        }
        self.save().await;
        for book in &unlocked {
            let _ = self.events.send(StoreEvent::StatusChanged {
                book: *book,
                status: BookStatus::Active,
            });
        }
        info!(books = ?unlocked, "unlocked purchased books");
        unlocked
    }

    // ─── Persistence ───────────────────────────────────────────────────────────

    /// Persist the entitlement list. Failures are logged and dropped.
    pub async fn save(&self) {
        if let Err(err) = self.repo.save_entitlements(&self.entitlements).await {
            warn!(error = %err, "unable to save book status");
        }
    }

    /// Replace the in-memory entitlements with the persisted ones.
    ///
    /// Missing or corrupt data keeps the current state.
    pub async fn load(&mut self) {
        match self.repo.load_entitlements().await {
            Ok(Some(entitlements)) => self.entitlements = entitlements,
            Ok(None) => debug!("no saved book status, keeping defaults"),
            Err(err) => warn!(error = %err, "couldn't load book status"),
        }
    }

    // ─── Purchases ─────────────────────────────────────────────────────────────

    /// Fetch the book products, sorted by id.
    pub async fn load_products(&mut self) {
        match self.api.list_products(&purchasable_products()).await {
            Ok(mut products) => {
                products.sort_by(|a, b| a.id.cmp(&b.id));
                self.products = products;
                let _ = self.events.send(StoreEvent::ProductsLoaded);
            }
            Err(err) => warn!(error = %err, "couldn't fetch the products"),
        }
    }

    /// Rebuild the owned set from the platform's current entitlements.
    pub async fn refresh_purchases(&self) {
        refresh_owned(self.api.as_ref(), &self.owned, &self.events).await;
    }

    /// Fold purchase records into the owned set.
    ///
    /// Returns true if ownership changed.
    pub fn reconcile_purchases(&self, records: &[PurchaseRecord]) -> bool {
        let changed = reconcile_into(&self.owned, records);
        if changed {
            let _ = self.events.send(StoreEvent::OwnedChanged);
        }
        changed
    }

    /// Buy `product_id`. Failures are logged and reported through the outcome.
    pub async fn purchase(&self, product_id: &ProductId) -> PurchaseOutcome {
        let Some(product) = self.products.iter().find(|p| &p.id == product_id) else {
            warn!(product = %product_id, "product not loaded, cannot purchase");
            return PurchaseOutcome::Failed;
        };

        match self.api.purchase(product).await {
            Ok(PurchaseResult::Success(record)) => match record.verification {
                Verification::Verified if !is_purchasable(&record.product_id) => {
                    warn!(product = %record.product_id, "purchase returned an unknown product");
                    PurchaseOutcome::Failed
                }
                Verification::Verified => {
                    self.owned
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .insert(record.product_id.clone());
                    let _ = self.events.send(StoreEvent::OwnedChanged);
                    info!(product = %record.product_id, "purchase completed");
                    PurchaseOutcome::OwnedNow
                }
                Verification::Unverified { reason } => {
                    warn!(
                        product = %record.product_id,
                        reason = %reason,
                        "purchase failed verification"
                    );
                    PurchaseOutcome::VerificationFailed
                }
            },
            Ok(PurchaseResult::Pending) => PurchaseOutcome::PendingApproval,
            Ok(PurchaseResult::UserCancelled) => PurchaseOutcome::Cancelled,
            Err(err) => {
                warn!(product = %product_id, error = %err, "couldn't purchase the product");
                PurchaseOutcome::Failed
            }
        }
    }

    /// Buy the product that unlocks the book at `index`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotPurchasable` for free books and
    /// `StoreError::Entitlement` if `index` is out of range.
    pub async fn purchase_book(&self, index: usize) -> Result<PurchaseOutcome, StoreError> {
        let book = BookId::from_index(index)
            .filter(|_| index < BOOK_COUNT)
            .ok_or(EntitlementError::OutOfRange { index })?;
        if index < FIRST_PURCHASABLE_INDEX {
            return Err(StoreError::NotPurchasable { book });
        }
        Ok(self.purchase(&ProductId::for_book(book)).await)
    }

    /// Stop the background listener.
    pub fn shutdown(&mut self) {
        if let Some(handle) = self.listener.take() {
            handle.abort();
        }
    }
}

impl Drop for EntitlementStore {
    fn drop(&mut self) {
        self.shutdown();
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::local::{LocalPurchaseApi, LocalResponse};
    use async_trait::async_trait;
    use std::time::Duration;
    use storage::StorageError;
    use storage::repository::InMemoryRepository;
    use trivia_core::time::fixed_now;

    struct CorruptRepo;

    #[async_trait]
    impl EntitlementRepository for CorruptRepo {
        async fn load_entitlements(&self) -> Result<Option<Entitlements>, StorageError> {
            Err(StorageError::Parse("expected array".into()))
        }

        async fn save_entitlements(&self, _e: &Entitlements) -> Result<(), StorageError> {
            Err(StorageError::Io("read-only".into()))
        }
    }

    fn hp(n: u8) -> ProductId {
        ProductId::for_book(BookId::new(n))
    }

    async fn build_store() -> (EntitlementStore, InMemoryRepository, Arc<LocalPurchaseApi>) {
        let repo = InMemoryRepository::new();
        let api = Arc::new(LocalPurchaseApi::new());
        let mut store = EntitlementStore::new(Arc::new(repo.clone()), api.clone());
        store.load_products().await;
        (store, repo, api)
    }

    async fn wait_for_owned_change(events: &mut broadcast::Receiver<StoreEvent>) {
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                if let Ok(StoreEvent::OwnedChanged) = events.recv().await {
                    break;
                }
            }
        })
        .await
        .expect("owned set should change");
    }

    #[test]
    fn purchasable_products_cover_books_four_to_seven() {
        let ids: Vec<String> = purchasable_products()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(ids, vec!["hp4", "hp5", "hp6", "hp7"]);
    }

    #[tokio::test]
    async fn corrupt_storage_keeps_default_status() {
        let api = Arc::new(LocalPurchaseApi::new());
        let mut store = EntitlementStore::new(Arc::new(CorruptRepo), api);
        store.load().await;
        assert_eq!(store.entitlements(), &Entitlements::default());
    }

    #[tokio::test]
    async fn set_status_persists_immediately() {
        let (mut store, repo, _api) = build_store().await;
        store.set_status(2, BookStatus::Active).await.unwrap();

        let saved = repo.load_entitlements().await.unwrap().unwrap();
        assert_eq!(saved.status(2), Some(BookStatus::Active));
        assert!(store.active_books().contains(&BookId::new(3)));
    }

    #[tokio::test]
    async fn set_status_out_of_range_changes_nothing() {
        let (mut store, repo, _api) = build_store().await;
        let err = store.set_status(7, BookStatus::Active).await.unwrap_err();
        assert!(matches!(err, StoreError::Entitlement(_)));
        assert!(repo.load_entitlements().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn load_replaces_defaults() {
        let (mut store, repo, _api) = build_store().await;
        let mut saved = Entitlements::default();
        saved.set(0, BookStatus::Inactive).unwrap();
        repo.save_entitlements(&saved).await.unwrap();

        store.load().await;
        assert_eq!(store.entitlements(), &saved);
    }

    #[tokio::test]
    async fn locked_book_cannot_be_toggled_without_purchase() {
        let (mut store, _repo, _api) = build_store().await;
        let err = store.toggle(4).await.unwrap_err();
        assert!(matches!(err, StoreError::Locked { book } if book == BookId::new(5)));
        assert_eq!(store.status(4), Some(BookStatus::Locked));
    }

    #[tokio::test]
    async fn toggle_flips_free_books() {
        let (mut store, _repo, _api) = build_store().await;
        assert_eq!(store.toggle(0).await.unwrap(), BookStatus::Inactive);
        assert_eq!(store.toggle(0).await.unwrap(), BookStatus::Active);
        assert_eq!(store.toggle(2).await.unwrap(), BookStatus::Active);
    }

    #[tokio::test]
    async fn approved_purchase_unlocks_book() {
        let (mut store, _repo, _api) = build_store().await;
        assert_eq!(store.products().len(), 4);

        let outcome = store.purchase_book(3).await.unwrap();
        assert_eq!(outcome, PurchaseOutcome::OwnedNow);
        assert!(store.is_unlockable(3));

        assert_eq!(store.toggle(3).await.unwrap(), BookStatus::Active);
        assert!(!store.is_unlockable(3));
    }

    #[tokio::test]
    async fn unverified_purchase_stays_locked() {
        let (store, _repo, api) = build_store().await;
        api.respond_with(LocalResponse::Unverified);
        assert_eq!(
            store.purchase(&hp(6)).await,
            PurchaseOutcome::VerificationFailed
        );
        assert!(!store.owns_book(BookId::new(6)));
    }

    #[tokio::test]
    async fn pending_cancelled_and_failed_outcomes() {
        let (store, _repo, api) = build_store().await;
        api.respond_with(LocalResponse::Pending);
        assert_eq!(store.purchase(&hp(4)).await, PurchaseOutcome::PendingApproval);
        api.respond_with(LocalResponse::Cancel);
        assert_eq!(store.purchase(&hp(4)).await, PurchaseOutcome::Cancelled);
        api.respond_with(LocalResponse::Unreachable);
        assert_eq!(store.purchase(&hp(4)).await, PurchaseOutcome::Failed);
        assert!(store.owned_products().is_empty());
    }

    #[tokio::test]
    async fn free_books_are_not_purchasable() {
        let (store, _repo, _api) = build_store().await;
        let err = store.purchase_book(1).await.unwrap_err();
        assert!(matches!(err, StoreError::NotPurchasable { .. }));
        assert!(store.purchase_book(9).await.is_err());
    }

    #[tokio::test]
    async fn purchase_without_products_fails() {
        let api = Arc::new(LocalPurchaseApi::new());
        let store = EntitlementStore::new(Arc::new(InMemoryRepository::new()), api);
        assert_eq!(store.purchase(&hp(4)).await, PurchaseOutcome::Failed);
    }

    #[tokio::test]
    async fn reconcile_purchases_marks_books_unlockable() {
        let (store, _repo, _api) = build_store().await;
        let changed = store.reconcile_purchases(&[
            PurchaseRecord::verified(hp(5)),
            PurchaseRecord {
                product_id: hp(7),
                verification: Verification::Verified,
                revoked_at: Some(fixed_now()),
            },
        ]);
        assert!(changed);
        assert!(store.is_unlockable(4));
        assert!(!store.is_unlockable(6));

        // Same records again change nothing.
        assert!(!store.reconcile_purchases(&[PurchaseRecord::verified(hp(5))]));
    }

    #[test]
    fn only_book_four_to_seven_products_are_purchasable() {
        assert!(is_purchasable(&hp(4)));
        assert!(is_purchasable(&hp(7)));
        for id in ["hp0", "hp1", "hp3", "hp8", "hp99", "gold"] {
            assert!(!is_purchasable(&ProductId::new(id)), "{id}");
        }
    }

    #[tokio::test]
    async fn reconcile_ignores_free_and_unknown_products() {
        let (mut store, _repo, _api) = build_store().await;
        let changed = store.reconcile_purchases(&[
            PurchaseRecord::verified(hp(1)),
            PurchaseRecord::verified(hp(99)),
        ]);
        assert!(!changed);
        assert!(store.owned_products().is_empty());

        store.set_status(0, BookStatus::Locked).await.unwrap();
        assert!(!store.is_unlockable(0));
        let err = store.toggle(0).await.unwrap_err();
        assert!(matches!(err, StoreError::Locked { book } if book == BookId::new(1)));
    }

    #[tokio::test]
    async fn listener_follows_external_grants_and_refunds() {
        let (store, _repo, api) = build_store().await;
        let mut events = store.subscribe();
        assert!(store.is_listening());

        api.grant(&hp(4));
        wait_for_owned_change(&mut events).await;
        assert!(store.owns_book(BookId::new(4)));

        api.revoke(&hp(4), fixed_now());
        wait_for_owned_change(&mut events).await;
        assert!(!store.owns_book(BookId::new(4)));
    }

    #[tokio::test]
    async fn shutdown_stops_listener() {
        let (mut store, _repo, api) = build_store().await;
        store.shutdown();
        assert!(!store.is_listening());

        api.grant(&hp(7));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!store.owns_book(BookId::new(7)));
    }

    #[tokio::test]
    async fn unlock_owned_activates_purchased_books() {
        let (mut store, repo, _api) = build_store().await;
        store.reconcile_purchases(&[PurchaseRecord::verified(hp(6))]);

        let unlocked = store.unlock_owned().await;
        assert_eq!(unlocked, vec![BookId::new(6)]);
        assert_eq!(store.status(5), Some(BookStatus::Active));
        let saved = repo.load_entitlements().await.unwrap().unwrap();
        assert_eq!(saved.status(5), Some(BookStatus::Active));

        assert!(store.unlock_owned().await.is_empty());
    }

    #[tokio::test]
    async fn refresh_purchases_reads_current_entitlements() {
        let (store, _repo, api) = build_store().await;
        api.grant(&hp(5));
        store.refresh_purchases().await;
        assert!(store.owns_book(BookId::new(5)));
    }
}
