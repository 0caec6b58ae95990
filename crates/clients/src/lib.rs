//! HTTP implementations of the saga service traits.
//!
//! Each client talks JSON to one downstream service and maps its answers
//! onto [`saga::ServiceError`]: 400 becomes a rejection carrying the
//! service's message, 404 becomes not-found, anything else unexpected is a
//! status error, and a request that never got an answer is a transport
//! error.

mod http;
pub mod inventory;
pub mod rating;
pub mod reservation;

pub use http::{ServiceClient, build_http_client};
pub use inventory::HttpInventoryService;
pub use rating::HttpRatingService;
pub use reservation::HttpReservationService;
