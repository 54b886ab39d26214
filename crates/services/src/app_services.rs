use std::path::Path;
use std::sync::Arc;

use storage::catalog;
use storage::{ResourceBundle, Storage};
use tracing::{info, warn};
use trivia_core::model::Question;

use crate::audio::{AudioService, Jukebox};
use crate::score_service::ScoreHistoryService;
use crate::sessions::{GameLoopService, GameSession};
use crate::store::{EntitlementStore, PurchaseApi};

/// Owns every service the front end talks to.
///
/// All of it is driven from one control flow; the only background work is the
/// store's purchase listener.
pub struct AppServices {
    store: EntitlementStore,
    scores: ScoreHistoryService,
    game: GameLoopService,
}

impl AppServices {
    /// Build services backed by JSON files in `data_dir`, with the catalog
    /// read from `bundle`.
    ///
    /// An unusable data directory is logged and the game runs without
    /// persistence. A missing or broken catalog is logged and leaves the game
    /// without questions.
    pub async fn open(
        data_dir: &Path,
        bundle: &dyn ResourceBundle,
        api: Arc<dyn PurchaseApi>,
        audio: Arc<dyn AudioService>,
        seed: Option<u64>,
    ) -> Self {
        let storage = match Storage::files(data_dir).await {
            Ok(storage) => storage,
            Err(err) => {
                warn!(
                    error = %err,
                    path = %data_dir.display(),
                    "data directory unusable, progress will not be saved"
                );
                Storage::in_memory()
            }
        };
        let questions = match catalog::load(bundle) {
            Ok(questions) => questions,
            Err(err) => {
                warn!(error = %err, "couldn't load the question catalog");
                Vec::new()
            }
        };
        Self::assemble(storage, questions, api, audio, seed).await
    }

    /// Build services over an existing storage and catalog.
    pub async fn assemble(
        storage: Storage,
        questions: Vec<Question>,
        api: Arc<dyn PurchaseApi>,
        audio: Arc<dyn AudioService>,
        seed: Option<u64>,
    ) -> Self {
        let mut store = EntitlementStore::new(Arc::clone(&storage.entitlements), api);
        store.load().await;
        store.load_products().await;
        store.refresh_purchases().await;

        let mut scores = ScoreHistoryService::new(Arc::clone(&storage.scores));
        scores.load().await;

        info!(questions = questions.len(), "catalog ready");
        let session = match seed {
            Some(seed) => GameSession::with_seed(questions, seed),
            None => GameSession::new(questions),
        };
        let jukebox = Jukebox::new(audio);
        jukebox.play_intro();

        Self {
            store,
            scores,
            game: GameLoopService::new(session, jukebox),
        }
    }

    /// Start a game over the currently active books.
    ///
    /// Returns `None` when no active book has questions.
    pub fn start_game(&mut self) -> Option<&Question> {
        self.game.start(self.store.entitlements())
    }

    /// End the running game and push its score into the history.
    pub async fn end_game(&mut self) -> i32 {
        self.game.end(&mut self.scores).await
    }

    #[must_use]
    pub fn store(&self) -> &EntitlementStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut EntitlementStore {
        &mut self.store
    }

    #[must_use]
    pub fn scores(&self) -> &ScoreHistoryService {
        &self.scores
    }

    #[must_use]
    pub fn game(&self) -> &GameLoopService {
        &self.game
    }

    pub fn game_mut(&mut self) -> &mut GameLoopService {
        &mut self.game
    }

    /// Stop background work.
    pub fn shutdown(&mut self) {
        self.store.shutdown();
    }
}
