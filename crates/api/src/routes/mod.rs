//! HTTP route handlers.

pub mod health;
pub mod libraries;
pub mod metrics;
pub mod rating;
pub mod reservations;

use std::str::FromStr;

use saga::{InventoryService, RatingService, ReservationService, SagaCoordinator};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<I, R, T, B>
where
    I: InventoryService,
    R: ReservationService,
    T: RatingService,
    B: message_bus::MessageBus,
{
    pub coordinator: SagaCoordinator<I, R, T, B>,
}

fn parse_uid<U: FromStr>(raw: &str, what: &str) -> Result<U, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid {what}: {raw}")))
}
