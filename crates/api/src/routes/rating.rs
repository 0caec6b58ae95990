//! Trust score endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use domain::UserRating;
use message_bus::MessageBus;
use saga::{InventoryService, RatingService, ReservationService};

use super::AppState;
use crate::error::ApiError;
use crate::extract::CurrentUser;

/// GET /rating — the current user's trust score.
#[tracing::instrument(skip(state))]
pub async fn get<I, R, T, B>(
    State(state): State<Arc<AppState<I, R, T, B>>>,
    CurrentUser(username): CurrentUser,
) -> Result<Json<UserRating>, ApiError>
where
    I: InventoryService + 'static,
    R: ReservationService + 'static,
    T: RatingService + 'static,
    B: MessageBus + 'static,
{
    Ok(Json(state.coordinator.rating(&username).await?))
}
