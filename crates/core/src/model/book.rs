use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::BookId;

/// Number of book groups in the catalog.
pub const BOOK_COUNT: usize = 7;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EntitlementError {
    #[error("book index {index} is out of range (0..{BOOK_COUNT})")]
    OutOfRange { index: usize },
}

//
// ─── BOOK STATUS ───────────────────────────────────────────────────────────────
//

/// Availability of a book group for gameplay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookStatus {
    /// Questions from this book are in play.
    Active,
    /// Owned but switched off by the player.
    Inactive,
    /// Requires a purchase before it can be switched on.
    Locked,
}

//
// ─── ENTITLEMENTS ──────────────────────────────────────────────────────────────
//

/// Status of every book group, index `i` being book `i + 1`.
///
/// Serialized as a plain array of seven status tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entitlements([BookStatus; BOOK_COUNT]);

impl Default for Entitlements {
    fn default() -> Self {
        use BookStatus::{Active, Inactive, Locked};
        Self([Active, Active, Inactive, Locked, Locked, Locked, Locked])
    }
}

impl Entitlements {
    #[must_use]
    pub fn from_statuses(statuses: [BookStatus; BOOK_COUNT]) -> Self {
        Self(statuses)
    }

    #[must_use]
    pub fn statuses(&self) -> &[BookStatus; BOOK_COUNT] {
        &self.0
    }

    #[must_use]
    pub fn status(&self, index: usize) -> Option<BookStatus> {
        self.0.get(index).copied()
    }

    /// Overwrites the status of the book at `index`.
    ///
    /// Leaving `Locked` is not checked here; ownership is confirmed by the
    /// purchase flow before calling this.
    ///
    /// # Errors
    ///
    /// Returns `EntitlementError::OutOfRange` if `index >= BOOK_COUNT`.
    pub fn set(&mut self, index: usize, status: BookStatus) -> Result<(), EntitlementError> {
        let slot = self
            .0
            .get_mut(index)
            .ok_or(EntitlementError::OutOfRange { index })?;
        *slot = status;
        Ok(())
    }

    /// Books whose questions are currently in play.
    #[must_use]
    pub fn active_books(&self) -> BTreeSet<BookId> {
        self.iter()
            .filter(|(_, status)| *status == BookStatus::Active)
            .map(|(book, _)| book)
            .collect()
    }

    #[must_use]
    pub fn has_active(&self) -> bool {
        self.0.contains(&BookStatus::Active)
    }

    pub fn iter(&self) -> impl Iterator<Item = (BookId, BookStatus)> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(index, status)| BookId::from_index(index).map(|book| (book, *status)))
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
