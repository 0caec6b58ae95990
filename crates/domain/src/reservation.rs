//! Reservation ledger entries and their status machine.

use chrono::NaiveDate;
use common::{BookUid, LibraryUid, ReservationUid};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Format of every date exchanged with the reservation ledger.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Lifecycle status of a reservation.
///
/// State transitions:
/// ```text
/// Rented ──┬──► Returned
///          └──► Expired
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReservationStatus {
    /// The book is out with the reader.
    Rented,
    /// Returned on or before the due date (terminal).
    Returned,
    /// Returned after the due date (terminal).
    Expired,
}

impl ReservationStatus {
    pub fn is_open(&self) -> bool {
        matches!(self, ReservationStatus::Rented)
    }

    /// Status a rented reservation closes with when returned on `return_date`.
    ///
    /// Expired iff the return date is strictly after the due date.
    pub fn on_return(till_date: NaiveDate, return_date: NaiveDate) -> Self {
        if return_date > till_date {
            ReservationStatus::Expired
        } else {
            ReservationStatus::Returned
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Rented => "RENTED",
            ReservationStatus::Returned => "RETURNED",
            ReservationStatus::Expired => "EXPIRED",
        }
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses a `YYYY-MM-DD` due date supplied by a client.
pub fn parse_till_date(raw: &str) -> Result<NaiveDate, DomainError> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| DomainError::InvalidTillDate)
}

/// A reservation as reported by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub reservation_uid: ReservationUid,
    pub book_uid: BookUid,
    pub library_uid: LibraryUid,
    pub status: ReservationStatus,
    pub start_date: NaiveDate,
    pub till_date: NaiveDate,
}

impl Reservation {
    /// Opens a new rented reservation.
    pub fn open(
        book_uid: BookUid,
        library_uid: LibraryUid,
        start_date: NaiveDate,
        till_date: NaiveDate,
    ) -> Self {
        Self {
            reservation_uid: ReservationUid::new(),
            book_uid,
            library_uid,
            status: ReservationStatus::Rented,
            start_date,
            till_date,
        }
    }

    /// Closes the reservation. Returns true when it was returned late.
    pub fn finish(&mut self, return_date: NaiveDate) -> Result<bool, DomainError> {
        if !self.status.is_open() {
            return Err(DomainError::ReservationClosed(self.status));
        }
        self.status = ReservationStatus::on_return(self.till_date, return_date);
        Ok(self.status == ReservationStatus::Expired)
    }
}
