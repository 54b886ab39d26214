use std::collections::BTreeMap;

use thiserror::Error;

use crate::model::ids::{BookId, QuestionId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text cannot be empty")]
    EmptyText,

    #[error("a question needs at least 2 answers, got {count}")]
    TooFewAnswers { count: usize },

    #[error("a question needs exactly one correct answer, got {count}")]
    CorrectAnswerCount { count: usize },
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A single trivia question from the catalog.
///
/// Answers map their display text to a correctness flag. Exactly one entry is
/// `true`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    text: String,
    answers: BTreeMap<String, bool>,
    book: BookId,
    hint: String,
}

impl Question {
    /// Creates a question from a prepared answers map.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the text is blank, there are fewer than two
    /// answers, or the map does not hold exactly one correct answer.
    pub fn new(
        id: QuestionId,
        text: impl Into<String>,
        answers: BTreeMap<String, bool>,
        book: BookId,
        hint: impl Into<String>,
    ) -> Result<Self, QuestionError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(QuestionError::EmptyText);
        }
        if answers.len() < 2 {
            return Err(QuestionError::TooFewAnswers {
                count: answers.len(),
            });
        }
        let correct = answers.values().filter(|flag| **flag).count();
        if correct != 1 {
            return Err(QuestionError::CorrectAnswerCount { count: correct });
        }

        Ok(Self {
            id,
            text,
            answers,
            book,
            hint: hint.into(),
        })
    }

    /// Builds the answers map from one correct answer and a list of wrong ones.
    ///
    /// The correct answer is inserted first, so a wrong answer with the same
    /// text overwrites it (and the question is then rejected).
    ///
    /// # Errors
    ///
    /// Same as [`Question::new`].
    pub fn from_answer_lists(
        id: QuestionId,
        text: impl Into<String>,
        correct: impl Into<String>,
        wrong: impl IntoIterator<Item = String>,
        book: BookId,
        hint: impl Into<String>,
    ) -> Result<Self, QuestionError> {
        let mut answers = BTreeMap::new();
        answers.insert(correct.into(), true);
        for answer in wrong {
            answers.insert(answer, false);
        }
        Self::new(id, text, answers, book, hint)
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn answers(&self) -> &BTreeMap<String, bool> {
        &self.answers
    }

    #[must_use]
    pub fn book(&self) -> BookId {
        self.book
    }

    #[must_use]
    pub fn hint(&self) -> &str {
        &self.hint
    }

    /// The text of the single correct answer.
    #[must_use]
    pub fn correct_answer(&self) -> &str {
        self.answers
            .iter()
            .find_map(|(text, correct)| correct.then_some(text.as_str()))
            .unwrap_or_default()
    }

    /// `Some(true)` for the correct answer, `Some(false)` for a wrong one,
    /// `None` when the text is not an answer of this question.
    #[must_use]
    pub fn is_correct(&self, answer: &str) -> Option<bool> {
        self.answers.get(answer).copied()
    }

    pub fn answer_texts(&self) -> impl Iterator<Item = &str> {
        self.answers.keys().map(String::as_str)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
