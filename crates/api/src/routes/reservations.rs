//! Reservation endpoints: listing, checkout, return and cancellation.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::ReservationUid;
use message_bus::MessageBus;
use saga::{
    CheckoutReceipt, CheckoutRequest, InventoryService, RatingService, ReservationService,
    ReservationView, ReturnRequest,
};

use super::{AppState, parse_uid};
use crate::error::ApiError;
use crate::extract::{CurrentUser, JsonBody};

/// GET /reservations — the current user's reservations with book and
/// library details.
#[tracing::instrument(skip(state))]
pub async fn list<I, R, T, B>(
    State(state): State<Arc<AppState<I, R, T, B>>>,
    CurrentUser(username): CurrentUser,
) -> Result<Json<Vec<ReservationView>>, ApiError>
where
    I: InventoryService + 'static,
    R: ReservationService + 'static,
    T: RatingService + 'static,
    B: MessageBus + 'static,
{
    Ok(Json(state.coordinator.list_reservations(&username).await?))
}

/// POST /reservations — check a book out.
#[tracing::instrument(skip(state, req))]
pub async fn checkout<I, R, T, B>(
    State(state): State<Arc<AppState<I, R, T, B>>>,
    CurrentUser(username): CurrentUser,
    JsonBody(req): JsonBody<CheckoutRequest>,
) -> Result<Json<CheckoutReceipt>, ApiError>
where
    I: InventoryService + 'static,
    R: ReservationService + 'static,
    T: RatingService + 'static,
    B: MessageBus + 'static,
{
    Ok(Json(state.coordinator.checkout(&username, req).await?))
}

/// POST /reservations/{reservation_uid}/return — return a book.
///
/// Answers 204 whether the return settled immediately or was deferred to
/// the retry channel.
#[tracing::instrument(skip(state, req))]
pub async fn return_book<I, R, T, B>(
    State(state): State<Arc<AppState<I, R, T, B>>>,
    CurrentUser(username): CurrentUser,
    Path(reservation_uid): Path<String>,
    JsonBody(req): JsonBody<ReturnRequest>,
) -> Result<StatusCode, ApiError>
where
    I: InventoryService + 'static,
    R: ReservationService + 'static,
    T: RatingService + 'static,
    B: MessageBus + 'static,
{
    let reservation_uid: ReservationUid = parse_uid(&reservation_uid, "reservation uid")?;
    state
        .coordinator
        .return_book(&username, reservation_uid, req)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /reservations/{reservation_uid} — withdraw a reservation.
#[tracing::instrument(skip(state))]
pub async fn cancel<I, R, T, B>(
    State(state): State<Arc<AppState<I, R, T, B>>>,
    CurrentUser(username): CurrentUser,
    Path(reservation_uid): Path<String>,
) -> Result<StatusCode, ApiError>
where
    I: InventoryService + 'static,
    R: ReservationService + 'static,
    T: RatingService + 'static,
    B: MessageBus + 'static,
{
    let reservation_uid: ReservationUid = parse_uid(&reservation_uid, "reservation uid")?;
    state
        .coordinator
        .cancel_reservation(&username, reservation_uid)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
