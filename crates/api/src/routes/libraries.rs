//! Library and catalogue endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use common::{LibraryUid, Page, PageRequest};
use domain::{Library, LibraryBook};
use message_bus::MessageBus;
use saga::{InventoryService, RatingService, ReservationService};
use serde::Deserialize;

use super::{AppState, parse_uid};
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct LibrariesQuery {
    pub city: Option<String>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BooksQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
    #[serde(default)]
    pub show_all: bool,
}

/// GET /libraries — libraries in a city, paged.
#[tracing::instrument(skip(state))]
pub async fn list<I, R, T, B>(
    State(state): State<Arc<AppState<I, R, T, B>>>,
    Query(query): Query<LibrariesQuery>,
) -> Result<Json<Page<Library>>, ApiError>
where
    I: InventoryService + 'static,
    R: ReservationService + 'static,
    T: RatingService + 'static,
    B: MessageBus + 'static,
{
    let page = PageRequest {
        page: query.page,
        size: query.size,
    };
    let libraries = state
        .coordinator
        .list_libraries(query.city.as_deref(), page)
        .await?;
    Ok(Json(libraries))
}

/// GET /libraries/{library_uid}/books — books stocked by a library, paged.
#[tracing::instrument(skip(state))]
pub async fn books<I, R, T, B>(
    State(state): State<Arc<AppState<I, R, T, B>>>,
    Path(library_uid): Path<String>,
    Query(query): Query<BooksQuery>,
) -> Result<Json<Page<LibraryBook>>, ApiError>
where
    I: InventoryService + 'static,
    R: ReservationService + 'static,
    T: RatingService + 'static,
    B: MessageBus + 'static,
{
    let library_uid: LibraryUid = parse_uid(&library_uid, "library uid")?;
    let page = PageRequest {
        page: query.page,
        size: query.size,
    };
    let books = state
        .coordinator
        .list_books(library_uid, page, query.show_all)
        .await?;
    Ok(Json(books))
}
