//! Checkout and return sagas for the library gateway.
//!
//! Checkout runs four steps in order:
//! 1. Count the user's open reservations
//! 2. Read the user's trust score and refuse if it is exhausted
//! 3. Open the reservation
//! 4. Take a copy out of the library
//!
//! Return closes the reservation, restocks the book and updates the trust
//! score. Nothing is compensated. Transient failures after the reservation
//! is closed are re-driven in the background by [`RetryDispatcher`].

pub mod coordinator;
pub mod dispatcher;
pub mod error;
pub mod model;
pub mod retry;
pub mod services;
pub mod steps;

pub use coordinator::{SagaCoordinator, TOO_MANY_TAKEN_BOOKS};
pub use dispatcher::{DEFAULT_RETRY_DELAY, RetryDispatcher, RetryWorkers};
pub use error::{SagaError, ServiceError};
pub use model::{
    BookInfo, CheckoutReceipt, CheckoutRequest, LibraryInfo, ReservationView, ReturnOutcome,
    ReturnRequest,
};
pub use retry::{RETURN_BOOK_RETRY_TOPIC, RetryMessage, SAVE_VIOLATIONS_RETRY_TOPIC};
pub use services::{
    InMemoryInventoryService, InMemoryRatingService, InMemoryReservationService,
    InventoryService, NewReservation, RatingService, ReservationService, ViolationReport,
};
