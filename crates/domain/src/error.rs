//! Domain error types.

use thiserror::Error;

use crate::reservation::ReservationStatus;

/// Business rule violations.
///
/// The display text of each variant is the message shown to API callers, so
/// it must stay stable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// The (library, book) pair has no inventory record.
    #[error("book not presented in this library")]
    BookNotStocked,

    /// The available-copy counter is zero.
    #[error("there is 0 available books in library")]
    NoAvailableCopies,

    /// The requested due date is not a `YYYY-MM-DD` date.
    #[error("invalid till date format")]
    InvalidTillDate,

    /// The reservation does not exist or belongs to another user.
    #[error("reservation not found")]
    ReservationNotFound,

    /// The reservation was already closed.
    #[error("reservation is already {0}")]
    ReservationClosed(ReservationStatus),

    /// The book condition string is not one of the known grades.
    #[error("unknown book condition: {0}")]
    UnknownCondition(String),
}
