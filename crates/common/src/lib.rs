//! Identifiers and pagination shared across the library gateway crates.

pub mod paging;
pub mod types;

pub use paging::{Page, PageRequest};
pub use types::{BookUid, LibraryUid, ReservationUid, USER_NAME_HEADER, Username};
