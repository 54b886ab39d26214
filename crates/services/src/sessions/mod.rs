mod progress;
mod service;
mod workflow;

// Public API of the game subsystem.
pub use progress::GameProgress;
pub use service::{GameSession, QUESTION_VALUE};
pub use workflow::{AnswerOutcome, GameLoopService};
