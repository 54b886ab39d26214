#![forbid(unsafe_code)]

pub mod app_services;
pub mod audio;
pub mod error;
pub mod score_service;
pub mod sessions;
pub mod store;

pub use app_services::AppServices;
pub use audio::{AudioService, Jukebox, SilentAudio, TracingAudio};
pub use error::{PurchaseApiError, StoreError};
pub use score_service::ScoreHistoryService;
pub use sessions::{AnswerOutcome, GameLoopService, GameProgress, GameSession};
pub use store::{
    EntitlementStore, LocalPurchaseApi, Product, PurchaseApi, PurchaseOutcome, StoreEvent,
};
