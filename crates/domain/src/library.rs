//! Libraries, books and the per-library available-copy counter.

use std::str::FromStr;

use common::{BookUid, LibraryUid};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Physical condition grade of a book copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BookCondition {
    Excellent,
    Good,
    Bad,
}

impl BookCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookCondition::Excellent => "EXCELLENT",
            BookCondition::Good => "GOOD",
            BookCondition::Bad => "BAD",
        }
    }
}

impl std::fmt::Display for BookCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookCondition {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EXCELLENT" => Ok(BookCondition::Excellent),
            "GOOD" => Ok(BookCondition::Good),
            "BAD" => Ok(BookCondition::Bad),
            other => Err(DomainError::UnknownCondition(other.to_string())),
        }
    }
}

/// A library branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Library {
    pub library_uid: LibraryUid,
    pub name: String,
    pub city: String,
    pub address: String,
}

/// A book title with its canonical condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub book_uid: BookUid,
    pub name: String,
    pub author: String,
    pub genre: String,
    pub condition: BookCondition,
}

impl Book {
    /// Returns true when `reported` differs from the canonical condition.
    ///
    /// This is a pure comparison; it never mutates inventory.
    pub fn is_condition_violation(&self, reported: BookCondition) -> bool {
        self.condition != reported
    }
}

/// A book as stocked by one library, with its available-copy counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryBook {
    #[serde(flatten)]
    pub book: Book,
    pub available_count: u32,
}

impl LibraryBook {
    pub fn is_available(&self) -> bool {
        self.available_count > 0
    }

    /// Takes one copy out of the library.
    ///
    /// The counter never goes below zero: taking from an empty shelf is
    /// rejected and leaves the counter untouched.
    pub fn take(&mut self) -> Result<(), DomainError> {
        if self.available_count == 0 {
            return Err(DomainError::NoAvailableCopies);
        }
        self.available_count -= 1;
        Ok(())
    }

    /// Puts one copy back. Returns whether `reported` is a condition violation.
    pub fn restock(&mut self, reported: BookCondition) -> bool {
        self.available_count = self.available_count.saturating_add(1);
        self.book.is_condition_violation(reported)
    }
}
