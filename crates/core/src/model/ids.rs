use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a catalog question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(u64);

impl QuestionId {
    /// Creates a new `QuestionId`
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying u64 value
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// One-based identifier of a book group.
///
/// Book `n` lives at index `n - 1` of the entitlement list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(u8);

impl BookId {
    #[must_use]
    pub fn new(id: u8) -> Self {
        Self(id)
    }

    /// Book id for a zero-based entitlement index.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        u8::try_from(index)
            .ok()
            .and_then(|i| i.checked_add(1))
            .map(Self)
    }

    #[must_use]
    pub fn value(&self) -> u8 {
        self.0
    }

    /// Zero-based entitlement index, `None` for book 0.
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        usize::from(self.0).checked_sub(1)
    }
}

/// Store identifier of a purchasable product (`hp4` … `hp7`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

const PRODUCT_PREFIX: &str = "hp";

impl ProductId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The product that unlocks `book`.
    #[must_use]
    pub fn for_book(book: BookId) -> Self {
        Self(format!("{PRODUCT_PREFIX}{}", book.value()))
    }

    /// The book this product unlocks, if the id follows the `hp<n>` scheme.
    #[must_use]
    pub fn book(&self) -> Option<BookId> {
        self.0
            .strip_prefix(PRODUCT_PREFIX)
            .and_then(|n| n.parse::<u8>().ok())
            .map(BookId::new)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ─── Display Implementations ───────────────────────────────────────────────────

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────
