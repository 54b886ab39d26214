mod book;
mod ids;
mod purchase;
mod question;
mod scores;

pub use ids::{BookId, ProductId, QuestionId};

pub use book::{BOOK_COUNT, BookStatus, EntitlementError, Entitlements};
pub use purchase::{OwnedProducts, PurchaseRecord, Reconciled, Verification};
pub use question::{Question, QuestionError};
pub use scores::{HISTORY_LEN, ScoreHistory};
