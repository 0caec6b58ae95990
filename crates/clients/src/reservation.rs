//! Client for the reservation service.

use async_trait::async_trait;
use chrono::NaiveDate;
use common::{ReservationUid, USER_NAME_HEADER, Username};
use domain::Reservation;
use reqwest::{Client, RequestBuilder};
use saga::{NewReservation, ReservationService, ServiceError, ViolationReport};
use serde::Serialize;

use crate::http::ServiceClient;

#[derive(Debug, Serialize)]
struct FinishBody {
    date: NaiveDate,
}

/// [`ReservationService`] backed by the reservation service's HTTP API.
///
/// Every call is scoped to the user named in the `X-User-Name` header.
#[derive(Debug, Clone)]
pub struct HttpReservationService {
    client: ServiceClient,
}

impl HttpReservationService {
    pub fn new(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            client: ServiceClient::new("reservation", base_url, client),
        }
    }

    pub fn service(&self) -> &ServiceClient {
        &self.client
    }
}

fn as_user(request: RequestBuilder, username: &Username) -> RequestBuilder {
    request.header(USER_NAME_HEADER, username.as_str())
}

#[async_trait]
impl ReservationService for HttpReservationService {
    async fn list(&self, username: &Username) -> Result<Vec<Reservation>, ServiceError> {
        self.client
            .send_json(as_user(self.client.get("/api/v1/reservations"), username))
            .await
    }

    async fn get(
        &self,
        username: &Username,
        reservation_uid: ReservationUid,
    ) -> Result<Reservation, ServiceError> {
        let path = format!("/api/v1/reservations/{reservation_uid}");
        self.client
            .send_json(as_user(self.client.get(&path), username))
            .await
    }

    async fn create(
        &self,
        username: &Username,
        request: NewReservation,
    ) -> Result<Reservation, ServiceError> {
        self.client
            .send_json(as_user(
                self.client.post("/api/v1/reservations").json(&request),
                username,
            ))
            .await
    }

    async fn cancel(
        &self,
        username: &Username,
        reservation_uid: ReservationUid,
    ) -> Result<(), ServiceError> {
        let path = format!("/api/v1/reservations/{reservation_uid}");
        self.client
            .send(as_user(self.client.delete(&path), username))
            .await
            .map(drop)
    }

    async fn finish(
        &self,
        username: &Username,
        reservation_uid: ReservationUid,
        date: NaiveDate,
    ) -> Result<ViolationReport, ServiceError> {
        let path = format!("/api/v1/reservations/{reservation_uid}/finish");
        self.client
            .send_json(as_user(
                self.client.post(&path).json(&FinishBody { date }),
                username,
            ))
            .await
    }
}
