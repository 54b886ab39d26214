//! Question catalog loading.
//!
//! The bundled catalog stores each question with a single `answer` string and
//! a `wrong` list; the loader folds both into the question's answers map.

use std::collections::HashSet;

use serde::Deserialize;
use tracing::debug;
use trivia_core::model::{BookId, Question, QuestionId};

use crate::bundle::ResourceBundle;
use crate::repository::StorageError;

/// Resource name of the bundled catalog.
pub const CATALOG_NAME: &str = "trivia";
/// Resource extension of the bundled catalog.
pub const CATALOG_EXT: &str = "json";

/// Persisted shape of one catalog entry.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogRecord {
    pub id: u64,
    pub question: String,
    pub answer: String,
    pub wrong: Vec<String>,
    pub book: u8,
    pub hint: String,
}

impl CatalogRecord {
    /// Convert the record into a domain `Question`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Parse` if the record does not describe a valid question.
    pub fn into_question(self) -> Result<Question, StorageError> {
        let id = self.id;
        Question::from_answer_lists(
            QuestionId::new(id),
            self.question,
            self.answer,
            self.wrong,
            BookId::new(self.book),
            self.hint,
        )
        .map_err(|err| StorageError::Parse(format!("question {id}: {err}")))
    }
}

/// Parse catalog JSON text into questions.
///
/// # Errors
///
/// Returns `StorageError::Parse` for malformed JSON, invalid records, or two
/// records sharing an id.
pub fn parse_catalog(text: &str) -> Result<Vec<Question>, StorageError> {
    let records: Vec<CatalogRecord> =
        serde_json::from_str(text).map_err(|err| StorageError::Parse(err.to_string()))?;
    let mut seen = HashSet::with_capacity(records.len());
    records
        .into_iter()
        .map(|record| {
            if !seen.insert(record.id) {
                return Err(StorageError::Parse(format!(
                    "duplicate question id {}",
                    record.id
                )));
            }
            record.into_question()
        })
        .collect()
}

/// Load the catalog from the resource bundle.
///
/// # Errors
///
/// Returns `StorageError::ResourceMissing` if the bundle has no catalog,
/// `StorageError::Io` if it cannot be read, and `StorageError::Parse` if it is malformed.
pub fn load(bundle: &dyn ResourceBundle) -> Result<Vec<Question>, StorageError> {
    let path = bundle
        .resolve(CATALOG_NAME, CATALOG_EXT)
        .ok_or_else(|| StorageError::ResourceMissing(format!("{CATALOG_NAME}.{CATALOG_EXT}")))?;
    let text = std::fs::read_to_string(&path).map_err(|err| StorageError::Io(err.to_string()))?;
    let questions = parse_catalog(&text)?;
    debug!(count = questions.len(), path = %path.display(), "catalog loaded");
    Ok(questions)
}
