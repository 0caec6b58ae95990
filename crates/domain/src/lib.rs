//! Business rules owned by the inventory, reservation and trust score services.
//!
//! This crate provides:
//! - Library, book and book condition types with the available-copy counter
//! - Reservation status transitions (late returns expire)
//! - The clamped trust score and its violation penalty rule

pub mod error;
pub mod library;
pub mod rating;
pub mod reservation;

pub use error::DomainError;
pub use library::{Book, BookCondition, Library, LibraryBook};
pub use rating::{MAX_STARS, MIN_STARS, Stars, UserRating, VIOLATION_PENALTY};
pub use reservation::{DATE_FORMAT, Reservation, ReservationStatus, parse_till_date};
