//! Saga coordinator for the checkout and return workflows.

use std::time::Instant;

use common::{BookUid, LibraryUid, Page, PageRequest, ReservationUid, Username};
use domain::{Library, LibraryBook, ReservationStatus, UserRating};
use futures_util::future::join_all;
use message_bus::{MessageBus, MessageBusExt};

use crate::error::{Result, SagaError, ServiceError};
use crate::model::{
    BookInfo, CheckoutReceipt, CheckoutRequest, LibraryInfo, ReservationView, ReturnOutcome,
    ReturnRequest,
};
use crate::retry::{RETURN_BOOK_RETRY_TOPIC, RetryMessage, SAVE_VIOLATIONS_RETRY_TOPIC};
use crate::services::{InventoryService, RatingService, ReservationService};
use crate::steps;

/// Message returned when the trust score does not cover another book.
pub const TOO_MANY_TAKEN_BOOKS: &str = "too many taken books";

/// Orchestrates checkout and return across the three services.
///
/// Steps run strictly in order and nothing is compensated: a failure after
/// the reservation is opened leaves it in place. On return, transient
/// failures after the reservation is closed are handed to the retry topics
/// instead of failing the request.
pub struct SagaCoordinator<I, R, T, B>
where
    I: InventoryService,
    R: ReservationService,
    T: RatingService,
    B: MessageBus,
{
    inventory: I,
    reservations: R,
    rating: T,
    bus: B,
}

impl<I, R, T, B> SagaCoordinator<I, R, T, B>
where
    I: InventoryService,
    R: ReservationService,
    T: RatingService,
    B: MessageBus,
{
    /// Creates a new saga coordinator.
    pub fn new(inventory: I, reservations: R, rating: T, bus: B) -> Self {
        Self {
            inventory,
            reservations,
            rating,
            bus,
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_libraries(
        &self,
        city: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<Library>> {
        self.inventory
            .list_libraries(city, page)
            .await
            .map_err(|e| SagaError::at_step(steps::STEP_LIST_LIBRARIES, e))
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_books(
        &self,
        library_uid: LibraryUid,
        page: PageRequest,
        show_all: bool,
    ) -> Result<Page<LibraryBook>> {
        self.inventory
            .list_books(library_uid, page, show_all)
            .await
            .map_err(|e| SagaError::at_step(steps::STEP_LIST_BOOKS, e))
    }

    #[tracing::instrument(skip(self))]
    pub async fn rating(&self, username: &Username) -> Result<UserRating> {
        self.rating
            .get(username)
            .await
            .map_err(|e| SagaError::at_step(steps::STEP_GET_RATING, e))
    }

    /// Lists the user's reservations with book and library details resolved.
    #[tracing::instrument(skip(self))]
    pub async fn list_reservations(&self, username: &Username) -> Result<Vec<ReservationView>> {
        let reservations = self
            .reservations
            .list(username)
            .await
            .map_err(|e| SagaError::at_step(steps::STEP_LIST_RESERVATIONS, e))?;

        let views = reservations.into_iter().map(|reservation| async move {
            let (book, library) = self
                .describe(reservation.book_uid, reservation.library_uid)
                .await;
            ReservationView::new(reservation, book, library)
        });
        Ok(join_all(views).await)
    }

    /// Withdraws one of the user's reservations from the ledger. Copies
    /// taken for it are not restocked.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_reservation(
        &self,
        username: &Username,
        reservation_uid: ReservationUid,
    ) -> Result<()> {
        self.reservations
            .cancel(username, reservation_uid)
            .await
            .map_err(|e| SagaError::at_step(steps::STEP_CANCEL_RESERVATION, e))?;
        tracing::info!(%reservation_uid, "reservation cancelled");
        Ok(())
    }

    /// Checks a book out for `username`.
    ///
    /// Rejected when the user's open reservations already reach their trust
    /// score. Rejections from the ledger or the inventory are passed on
    /// verbatim.
    #[tracing::instrument(
        skip(self, request),
        fields(book_uid = %request.book_uid, library_uid = %request.library_uid)
    )]
    pub async fn checkout(
        &self,
        username: &Username,
        request: CheckoutRequest,
    ) -> Result<CheckoutReceipt> {
        metrics::counter!("checkout_total").increment(1);
        let started = Instant::now();

        let result = self.run_checkout(username, request).await;

        metrics::histogram!("checkout_duration_seconds").record(started.elapsed().as_secs_f64());
        match &result {
            Ok(receipt) => tracing::info!(
                reservation_uid = %receipt.reservation.reservation_uid,
                "checkout completed"
            ),
            Err(e) if e.is_rejection() => {
                metrics::counter!("checkout_rejected_total").increment(1);
                tracing::warn!(reason = %e, "checkout rejected");
            }
            Err(e) => tracing::error!(error = %e, "checkout failed"),
        }
        result
    }

    async fn run_checkout(
        &self,
        username: &Username,
        request: CheckoutRequest,
    ) -> Result<CheckoutReceipt> {
        tracing::info!(step = steps::STEP_LIST_RESERVATIONS, "saga step started");
        let rented = self
            .reservations
            .list(username)
            .await
            .map_err(|e| SagaError::at_step(steps::STEP_LIST_RESERVATIONS, e))?
            .iter()
            .filter(|r| r.status == ReservationStatus::Rented)
            .count();

        tracing::info!(step = steps::STEP_GET_RATING, "saga step started");
        let rating = self
            .rating
            .get(username)
            .await
            .map_err(|e| SagaError::at_step(steps::STEP_GET_RATING, e))?;

        let rented = i64::try_from(rented).unwrap_or(i64::MAX);
        if rating.stars.value() - rented < 0 {
            return Err(SagaError::Rejected(TOO_MANY_TAKEN_BOOKS.to_string()));
        }

        let (book_uid, library_uid) = (request.book_uid, request.library_uid);

        tracing::info!(step = steps::STEP_CREATE_RESERVATION, "saga step started");
        let reservation = self
            .reservations
            .create(username, request.into())
            .await
            .map_err(|e| SagaError::at_step(steps::STEP_CREATE_RESERVATION, e))?;

        tracing::info!(step = steps::STEP_TAKE_BOOK, "saga step started");
        if let Err(e) = self.inventory.take_book(library_uid, book_uid).await {
            tracing::warn!(
                reservation_uid = %reservation.reservation_uid,
                error = %e,
                "reservation left open without a copy taken"
            );
            return Err(SagaError::at_step(steps::STEP_TAKE_BOOK, e));
        }

        let (book, library) = self.describe(book_uid, library_uid).await;
        Ok(CheckoutReceipt {
            reservation: ReservationView::new(reservation, book, library),
            rating,
        })
    }

    /// Returns a checked-out book.
    ///
    /// Once the reservation is closed the request no longer fails on
    /// transient errors: the remaining steps move to a retry topic and the
    /// outcome is [`ReturnOutcome::Deferred`].
    #[tracing::instrument(skip(self, request), fields(condition = %request.condition, date = %request.date))]
    pub async fn return_book(
        &self,
        username: &Username,
        reservation_uid: ReservationUid,
        request: ReturnRequest,
    ) -> Result<ReturnOutcome> {
        metrics::counter!("return_total").increment(1);
        let started = Instant::now();

        let result = self.run_return(username, reservation_uid, request).await;

        metrics::histogram!("return_duration_seconds").record(started.elapsed().as_secs_f64());
        match &result {
            Ok(ReturnOutcome::Settled { violations }) => {
                tracing::info!(violations, "return completed")
            }
            Ok(ReturnOutcome::Deferred { topic }) => {
                metrics::counter!("return_deferred_total").increment(1);
                tracing::warn!(topic, "return deferred to retry channel");
            }
            Err(e) if e.is_rejection() => tracing::warn!(reason = %e, "return rejected"),
            Err(e) => tracing::error!(error = %e, "return failed"),
        }
        result
    }

    async fn run_return(
        &self,
        username: &Username,
        reservation_uid: ReservationUid,
        request: ReturnRequest,
    ) -> Result<ReturnOutcome> {
        tracing::info!(step = steps::STEP_GET_RESERVATION, "saga step started");
        let reservation = self
            .reservations
            .get(username, reservation_uid)
            .await
            .map_err(|e| SagaError::at_step(steps::STEP_GET_RESERVATION, e))?;

        tracing::info!(step = steps::STEP_FINISH_RESERVATION, "saga step started");
        let lateness = self
            .reservations
            .finish(username, reservation_uid, request.date)
            .await
            .map_err(|e| SagaError::at_step(steps::STEP_FINISH_RESERVATION, e))?;

        let pending = RetryMessage::new(
            reservation.library_uid,
            reservation.book_uid,
            request.condition,
            lateness.count(),
            username.clone(),
        );

        tracing::info!(step = steps::STEP_RETURN_BOOK, "saga step started");
        let condition = match self
            .inventory
            .return_book(reservation.library_uid, reservation.book_uid, request.condition)
            .await
        {
            Ok(report) => report,
            Err(e) if e.is_retryable() => {
                return self
                    .defer(steps::STEP_RETURN_BOOK, RETURN_BOOK_RETRY_TOPIC, &pending, e)
                    .await;
            }
            Err(e) => return Err(SagaError::at_step(steps::STEP_RETURN_BOOK, e)),
        };
        let violations = pending.violations + condition.count();

        tracing::info!(step = steps::STEP_SAVE_VIOLATIONS, violations, "saga step started");
        match self.rating.save_violations(username, violations).await {
            Ok(()) => Ok(ReturnOutcome::Settled { violations }),
            Err(e) if e.is_retryable() => {
                let pending = pending.with_violations(violations);
                self.defer(steps::STEP_SAVE_VIOLATIONS, SAVE_VIOLATIONS_RETRY_TOPIC, &pending, e)
                    .await
            }
            Err(e) => Err(SagaError::at_step(steps::STEP_SAVE_VIOLATIONS, e)),
        }
    }

    /// Hands the rest of a return to `topic`, stamped with the current time
    /// so the retry delay counts from the hand-off. If the bus refuses the
    /// message, or nobody is subscribed to take it, the original failure is
    /// reported instead.
    async fn defer(
        &self,
        step: &'static str,
        topic: &'static str,
        message: &RetryMessage,
        cause: ServiceError,
    ) -> Result<ReturnOutcome> {
        tracing::warn!(step, error = %cause, "transient failure, deferring");
        match self.bus.publish_json(topic, &message.refreshed()).await {
            Ok(0) => {
                tracing::error!(step, topic, "no retry dispatcher subscribed, message lost");
                Err(SagaError::at_step(step, cause))
            }
            Ok(_) => {
                metrics::counter!("retry_published_total", "topic" => topic).increment(1);
                Ok(ReturnOutcome::Deferred { topic })
            }
            Err(bus_error) => {
                tracing::error!(step, topic, error = %bus_error, "retry message not published");
                Err(SagaError::at_step(step, cause))
            }
        }
    }

    /// Resolves book and library details, falling back to bare uids when a
    /// lookup fails.
    async fn describe(&self, book_uid: BookUid, library_uid: LibraryUid) -> (BookInfo, LibraryInfo) {
        let (book, library) = tokio::join!(
            self.inventory.get_book(book_uid),
            self.inventory.get_library(library_uid)
        );

        let book = book.map(BookInfo::from).unwrap_or_else(|e| {
            tracing::warn!(%book_uid, error = %e, "book details unavailable");
            BookInfo::bare(book_uid)
        });
        let library = library.map(LibraryInfo::from).unwrap_or_else(|e| {
            tracing::warn!(%library_uid, error = %e, "library details unavailable");
            LibraryInfo::bare(library_uid)
        });
        (book, library)
    }
}
