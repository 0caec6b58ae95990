//! Reservation ledger trait and in-memory implementation.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use common::{BookUid, LibraryUid, ReservationUid, Username};
use domain::{DomainError, Reservation, parse_till_date};
use serde::{Deserialize, Serialize};

use super::{ViolationReport, unavailable};
use crate::error::ServiceError;

/// Body of a reservation request.
///
/// The due date travels as the raw string the client sent; the ledger is
/// the one that validates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReservation {
    pub book_uid: BookUid,
    pub library_uid: LibraryUid,
    pub till_date: String,
}

/// Per-user reservation records.
#[async_trait]
pub trait ReservationService: Send + Sync {
    async fn list(&self, username: &Username) -> Result<Vec<Reservation>, ServiceError>;

    async fn get(
        &self,
        username: &Username,
        reservation_uid: ReservationUid,
    ) -> Result<Reservation, ServiceError>;

    /// Opens a rented reservation starting today.
    async fn create(
        &self,
        username: &Username,
        request: NewReservation,
    ) -> Result<Reservation, ServiceError>;

    /// Deletes a reservation. Deleting a missing one is not an error.
    async fn cancel(
        &self,
        username: &Username,
        reservation_uid: ReservationUid,
    ) -> Result<(), ServiceError>;

    /// Closes a reservation and reports whether it was returned late.
    async fn finish(
        &self,
        username: &Username,
        reservation_uid: ReservationUid,
        date: NaiveDate,
    ) -> Result<ViolationReport, ServiceError>;
}

#[derive(Debug, Default)]
struct InMemoryReservationState {
    entries: Vec<(Username, Reservation)>,
    unavailable: bool,
    create_calls: u32,
    finish_calls: u32,
}

impl InMemoryReservationState {
    fn find_mut(
        &mut self,
        username: &Username,
        reservation_uid: ReservationUid,
    ) -> Option<&mut Reservation> {
        self.entries
            .iter_mut()
            .find(|(owner, r)| owner == username && r.reservation_uid == reservation_uid)
            .map(|(_, r)| r)
    }
}

/// In-memory reservation ledger for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryReservationService {
    state: Arc<RwLock<InMemoryReservationState>>,
}

impl InMemoryReservationService {
    /// Creates a new in-memory reservation ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an existing reservation for `username`.
    pub fn insert(&self, username: &Username, reservation: Reservation) {
        self.state
            .write()
            .unwrap()
            .entries
            .push((username.clone(), reservation));
    }

    /// Looks a reservation up regardless of owner.
    pub fn find(&self, reservation_uid: ReservationUid) -> Option<Reservation> {
        self.state
            .read()
            .unwrap()
            .entries
            .iter()
            .find(|(_, r)| r.reservation_uid == reservation_uid)
            .map(|(_, r)| r.clone())
    }

    pub fn reservation_count(&self) -> usize {
        self.state.read().unwrap().entries.len()
    }

    /// Makes every call fail with a transport error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.write().unwrap().unavailable = unavailable;
    }

    pub fn create_calls(&self) -> u32 {
        self.state.read().unwrap().create_calls
    }

    pub fn finish_calls(&self) -> u32 {
        self.state.read().unwrap().finish_calls
    }
}

#[async_trait]
impl ReservationService for InMemoryReservationService {
    async fn list(&self, username: &Username) -> Result<Vec<Reservation>, ServiceError> {
        let state = self.state.read().unwrap();
        if state.unavailable {
            return Err(unavailable("reservation"));
        }

        Ok(state
            .entries
            .iter()
            .filter(|(owner, _)| owner == username)
            .map(|(_, r)| r.clone())
            .collect())
    }

    async fn get(
        &self,
        username: &Username,
        reservation_uid: ReservationUid,
    ) -> Result<Reservation, ServiceError> {
        let state = self.state.read().unwrap();
        if state.unavailable {
            return Err(unavailable("reservation"));
        }

        state
            .entries
            .iter()
            .find(|(owner, r)| owner == username && r.reservation_uid == reservation_uid)
            .map(|(_, r)| r.clone())
            .ok_or_else(|| DomainError::ReservationNotFound.into())
    }

    async fn create(
        &self,
        username: &Username,
        request: NewReservation,
    ) -> Result<Reservation, ServiceError> {
        let mut state = self.state.write().unwrap();
        state.create_calls += 1;
        if state.unavailable {
            return Err(unavailable("reservation"));
        }

        let till_date = parse_till_date(&request.till_date)?;
        let reservation = Reservation::open(
            request.book_uid,
            request.library_uid,
            Utc::now().date_naive(),
            till_date,
        );
        state.entries.push((username.clone(), reservation.clone()));
        Ok(reservation)
    }

    async fn cancel(
        &self,
        username: &Username,
        reservation_uid: ReservationUid,
    ) -> Result<(), ServiceError> {
        let mut state = self.state.write().unwrap();
        if state.unavailable {
            return Err(unavailable("reservation"));
        }

        state
            .entries
            .retain(|(owner, r)| !(owner == username && r.reservation_uid == reservation_uid));
        Ok(())
    }

    async fn finish(
        &self,
        username: &Username,
        reservation_uid: ReservationUid,
        date: NaiveDate,
    ) -> Result<ViolationReport, ServiceError> {
        let mut state = self.state.write().unwrap();
        state.finish_calls += 1;
        if state.unavailable {
            return Err(unavailable("reservation"));
        }

        let reservation = state
            .find_mut(username, reservation_uid)
            .ok_or(DomainError::ReservationNotFound)?;
        let late = reservation.finish(date)?;
        Ok(ViolationReport { violation: late })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::ReservationStatus;

    fn request(till_date: &str) -> NewReservation {
        NewReservation {
            book_uid: BookUid::new(),
            library_uid: LibraryUid::new(),
            till_date: till_date.to_string(),
        }
    }

    fn date(raw: &str) -> NaiveDate {
        parse_till_date(raw).unwrap()
    }

    #[tokio::test]
    async fn create_then_list_for_owner_only() {
        let service = InMemoryReservationService::new();
        let alice = Username::from("alice");
        let bob = Username::from("bob");

        let created = service.create(&alice, request("2030-01-01")).await.unwrap();
        assert_eq!(created.status, ReservationStatus::Rented);

        assert_eq!(service.list(&alice).await.unwrap(), vec![created]);
        assert!(service.list(&bob).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn bad_till_date_is_rejected() {
        let service = InMemoryReservationService::new();
        let err = service
            .create(&Username::from("alice"), request("01.01.2030"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ServiceError::Rejected("invalid till date format".to_string())
        );
        assert_eq!(service.reservation_count(), 0);
    }

    #[tokio::test]
    async fn finish_reports_late_returns() {
        let service = InMemoryReservationService::new();
        let alice = Username::from("alice");
        let created = service.create(&alice, request("2030-01-10")).await.unwrap();

        let report = service
            .finish(&alice, created.reservation_uid, date("2030-01-11"))
            .await
            .unwrap();
        assert!(report.violation);
        assert_eq!(
            service.find(created.reservation_uid).unwrap().status,
            ReservationStatus::Expired
        );
    }

    #[tokio::test]
    async fn finish_someone_elses_reservation_is_not_found() {
        let service = InMemoryReservationService::new();
        let created = service
            .create(&Username::from("alice"), request("2030-01-10"))
            .await
            .unwrap();

        let err = service
            .finish(
                &Username::from("bob"),
                created.reservation_uid,
                date("2030-01-01"),
            )
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::NotFound("reservation not found".to_string()));
    }

    #[tokio::test]
    async fn finish_twice_is_rejected() {
        let service = InMemoryReservationService::new();
        let alice = Username::from("alice");
        let created = service.create(&alice, request("2030-01-10")).await.unwrap();

        service
            .finish(&alice, created.reservation_uid, date("2030-01-01"))
            .await
            .unwrap();
        let err = service
            .finish(&alice, created.reservation_uid, date("2030-01-02"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Rejected(_)));
    }

    #[tokio::test]
    async fn cancel_removes_only_that_reservation() {
        let service = InMemoryReservationService::new();
        let alice = Username::from("alice");
        let first = service.create(&alice, request("2030-01-10")).await.unwrap();
        let second = service.create(&alice, request("2030-01-10")).await.unwrap();

        service.cancel(&alice, first.reservation_uid).await.unwrap();
        service.cancel(&alice, first.reservation_uid).await.unwrap();

        assert_eq!(service.list(&alice).await.unwrap(), vec![second]);
    }
}
