//! External service traits and in-memory implementations for saga steps.

pub mod inventory;
pub mod rating;
pub mod reservation;

use serde::{Deserialize, Serialize};

pub use inventory::{InMemoryInventoryService, InventoryService};
pub use rating::{InMemoryRatingService, RatingService};
pub use reservation::{InMemoryReservationService, NewReservation, ReservationService};

use crate::error::ServiceError;

/// Whether a step counted a violation against the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationReport {
    pub violation: bool,
}

impl ViolationReport {
    pub fn count(&self) -> u32 {
        u32::from(self.violation)
    }
}

fn unavailable(service: &str) -> ServiceError {
    ServiceError::Transport(format!("{service} service unavailable"))
}

fn server_error(service: &str) -> ServiceError {
    ServiceError::Status {
        status: 503,
        body: format!("{service} service overloaded"),
    }
}
