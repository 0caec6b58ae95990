//! Client for the library service.

use async_trait::async_trait;
use common::{BookUid, LibraryUid, Page, PageRequest};
use domain::{Book, BookCondition, Library, LibraryBook};
use reqwest::Client;
use saga::{InventoryService, ServiceError, ViolationReport};
use serde::Serialize;

use crate::http::ServiceClient;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ListQuery<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    city: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<u32>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    show_all: bool,
}

impl ListQuery<'_> {
    fn paged(page: PageRequest) -> Self {
        Self {
            city: None,
            page: page.page,
            size: page.size,
            show_all: false,
        }
    }
}

#[derive(Debug, Serialize)]
struct ReturnBody {
    condition: BookCondition,
}

/// [`InventoryService`] backed by the library service's HTTP API.
#[derive(Debug, Clone)]
pub struct HttpInventoryService {
    client: ServiceClient,
}

impl HttpInventoryService {
    pub fn new(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            client: ServiceClient::new("library", base_url, client),
        }
    }

    pub fn service(&self) -> &ServiceClient {
        &self.client
    }
}

#[async_trait]
impl InventoryService for HttpInventoryService {
    async fn list_libraries(
        &self,
        city: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<Library>, ServiceError> {
        let query = ListQuery {
            city,
            ..ListQuery::paged(page)
        };
        self.client
            .send_json(self.client.get("/api/v1/libraries").query(&query))
            .await
    }

    async fn get_library(&self, library_uid: LibraryUid) -> Result<Library, ServiceError> {
        self.client
            .send_json(self.client.get(&format!("/api/v1/libraries/{library_uid}")))
            .await
    }

    async fn list_books(
        &self,
        library_uid: LibraryUid,
        page: PageRequest,
        show_all: bool,
    ) -> Result<Page<LibraryBook>, ServiceError> {
        let query = ListQuery {
            show_all,
            ..ListQuery::paged(page)
        };
        self.client
            .send_json(
                self.client
                    .get(&format!("/api/v1/libraries/{library_uid}/books"))
                    .query(&query),
            )
            .await
    }

    async fn get_book(&self, book_uid: BookUid) -> Result<Book, ServiceError> {
        self.client
            .send_json(self.client.get(&format!("/api/v1/books/{book_uid}")))
            .await
    }

    async fn take_book(
        &self,
        library_uid: LibraryUid,
        book_uid: BookUid,
    ) -> Result<(), ServiceError> {
        let path = format!("/api/v1/libraries/{library_uid}/books/{book_uid}/take");
        self.client.send(self.client.post(&path)).await.map(drop)
    }

    async fn return_book(
        &self,
        library_uid: LibraryUid,
        book_uid: BookUid,
        condition: BookCondition,
    ) -> Result<ViolationReport, ServiceError> {
        let path = format!("/api/v1/libraries/{library_uid}/books/{book_uid}/return");
        self.client
            .send_json(self.client.post(&path).json(&ReturnBody { condition }))
            .await
    }
}
