//! Client for the trust score service.

use async_trait::async_trait;
use common::{USER_NAME_HEADER, Username};
use domain::UserRating;
use reqwest::Client;
use saga::{RatingService, ServiceError};

use crate::http::ServiceClient;

/// [`RatingService`] backed by the rating service's HTTP API.
#[derive(Debug, Clone)]
pub struct HttpRatingService {
    client: ServiceClient,
}

impl HttpRatingService {
    pub fn new(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            client: ServiceClient::new("rating", base_url, client),
        }
    }

    pub fn service(&self) -> &ServiceClient {
        &self.client
    }
}

#[async_trait]
impl RatingService for HttpRatingService {
    async fn get(&self, username: &Username) -> Result<UserRating, ServiceError> {
        self.client
            .send_json(
                self.client
                    .get("/api/v1/rating")
                    .header(USER_NAME_HEADER, username.as_str()),
            )
            .await
    }

    async fn save_violations(&self, username: &Username, count: u32) -> Result<(), ServiceError> {
        self.client
            .send(
                self.client
                    .post("/api/v1/rating/violations")
                    .header(USER_NAME_HEADER, username.as_str())
                    .query(&[("count", count)]),
            )
            .await
            .map(drop)
    }
}
