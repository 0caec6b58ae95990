//! HTTP gateway for the library system.
//!
//! Serves the public catalogue, the user's reservations and trust score,
//! and the checkout and return sagas, with structured logging (tracing)
//! and Prometheus metrics.

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::{delete, get, post};
use message_bus::MessageBus;
use metrics_exporter_prometheus::PrometheusHandle;
use saga::{InventoryService, RatingService, ReservationService, SagaCoordinator};
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<I, R, T, B>(
    state: Arc<AppState<I, R, T, B>>,
    metrics_handle: PrometheusHandle,
    request_timeout: Duration,
) -> Router
where
    I: InventoryService + 'static,
    R: ReservationService + 'static,
    T: RatingService + 'static,
    B: MessageBus + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/manage/health", get(routes::health::check))
        .route("/libraries", get(routes::libraries::list::<I, R, T, B>))
        .route(
            "/libraries/{library_uid}/books",
            get(routes::libraries::books::<I, R, T, B>),
        )
        .route("/rating", get(routes::rating::get::<I, R, T, B>))
        .route(
            "/reservations",
            get(routes::reservations::list::<I, R, T, B>)
                .post(routes::reservations::checkout::<I, R, T, B>),
        )
        .route(
            "/reservations/{reservation_uid}",
            delete(routes::reservations::cancel::<I, R, T, B>),
        )
        .route(
            "/reservations/{reservation_uid}/return",
            post(routes::reservations::return_book::<I, R, T, B>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
}

/// Wraps a coordinator built from the given services in shared state.
pub fn create_state<I, R, T, B>(
    inventory: I,
    reservations: R,
    rating: T,
    bus: B,
) -> Arc<AppState<I, R, T, B>>
where
    I: InventoryService,
    R: ReservationService,
    T: RatingService,
    B: MessageBus,
{
    Arc::new(AppState {
        coordinator: SagaCoordinator::new(inventory, reservations, rating, bus),
    })
}
