//! Request and response shapes of the gateway sagas.

use chrono::NaiveDate;
use common::{BookUid, LibraryUid, ReservationUid};
use domain::{Book, BookCondition, Library, Reservation, ReservationStatus, UserRating};
use serde::{Deserialize, Serialize};

use crate::services::NewReservation;

/// Checkout request as sent by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub book_uid: BookUid,
    pub library_uid: LibraryUid,
    pub till_date: String,
}

impl From<CheckoutRequest> for NewReservation {
    fn from(request: CheckoutRequest) -> Self {
        NewReservation {
            book_uid: request.book_uid,
            library_uid: request.library_uid,
            till_date: request.till_date,
        }
    }
}

/// Return request: the condition the book came back in and the return date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnRequest {
    pub condition: BookCondition,
    pub date: NaiveDate,
}

/// Book details attached to a reservation.
///
/// Only the uid is guaranteed; the rest is missing when the inventory
/// lookup failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookInfo {
    pub book_uid: BookUid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
}

impl BookInfo {
    pub fn bare(book_uid: BookUid) -> Self {
        Self {
            book_uid,
            name: None,
            author: None,
            genre: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.name.is_some()
    }
}

impl From<Book> for BookInfo {
    fn from(book: Book) -> Self {
        Self {
            book_uid: book.book_uid,
            name: Some(book.name),
            author: Some(book.author),
            genre: Some(book.genre),
        }
    }
}

/// Library details attached to a reservation, best effort like [`BookInfo`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryInfo {
    pub library_uid: LibraryUid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

impl LibraryInfo {
    pub fn bare(library_uid: LibraryUid) -> Self {
        Self {
            library_uid,
            name: None,
            address: None,
            city: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.name.is_some()
    }
}

impl From<Library> for LibraryInfo {
    fn from(library: Library) -> Self {
        Self {
            library_uid: library.library_uid,
            name: Some(library.name),
            address: Some(library.address),
            city: Some(library.city),
        }
    }
}

/// A reservation with its book and library resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationView {
    pub reservation_uid: ReservationUid,
    pub status: ReservationStatus,
    pub start_date: NaiveDate,
    pub till_date: NaiveDate,
    pub book: BookInfo,
    pub library: LibraryInfo,
}

impl ReservationView {
    pub fn new(reservation: Reservation, book: BookInfo, library: LibraryInfo) -> Self {
        Self {
            reservation_uid: reservation.reservation_uid,
            status: reservation.status,
            start_date: reservation.start_date,
            till_date: reservation.till_date,
            book,
            library,
        }
    }
}

/// Result of a successful checkout.
///
/// The rating is the one read before the reservation was made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutReceipt {
    #[serde(flatten)]
    pub reservation: ReservationView,
    pub rating: UserRating,
}

/// How a return finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnOutcome {
    /// Every step ran; `violations` were applied to the trust score.
    Settled { violations: u32 },
    /// A step failed transiently and the rest was handed to a retry topic.
    Deferred { topic: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_book_serializes_uid_only() {
        let uid = BookUid::new();
        let json = serde_json::to_value(BookInfo::bare(uid)).unwrap();
        assert_eq!(json, serde_json::json!({ "bookUid": uid.to_string() }));
    }

    #[test]
    fn checkout_request_uses_camel_case() {
        let request: CheckoutRequest = serde_json::from_value(serde_json::json!({
            "bookUid": "f7cdc58f-2caf-4b15-9727-f89dcc629b27",
            "libraryUid": "83575e12-7ce0-48ee-9931-51919ff3c9ee",
            "tillDate": "2021-10-11"
        }))
        .unwrap();
        assert_eq!(request.till_date, "2021-10-11");
    }

    #[test]
    fn return_request_parses_condition_and_date() {
        let request: ReturnRequest = serde_json::from_value(serde_json::json!({
            "condition": "EXCELLENT",
            "date": "2021-10-11"
        }))
        .unwrap();
        assert_eq!(request.condition, BookCondition::Excellent);
        assert_eq!(request.date, NaiveDate::from_ymd_opt(2021, 10, 11).unwrap());
    }

    #[test]
    fn receipt_flattens_reservation_next_to_rating() {
        let reservation = Reservation::open(
            BookUid::new(),
            LibraryUid::new(),
            NaiveDate::from_ymd_opt(2021, 10, 1).unwrap(),
            NaiveDate::from_ymd_opt(2021, 10, 11).unwrap(),
        );
        let receipt = CheckoutReceipt {
            reservation: ReservationView::new(
                reservation.clone(),
                BookInfo::bare(reservation.book_uid),
                LibraryInfo::bare(reservation.library_uid),
            ),
            rating: UserRating::default(),
        };

        let json = serde_json::to_value(&receipt).unwrap();
        assert_eq!(json["status"], "RENTED");
        assert_eq!(json["tillDate"], "2021-10-11");
        assert_eq!(json["rating"]["stars"], 1);
    }
}
