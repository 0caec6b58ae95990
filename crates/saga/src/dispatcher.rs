//! Background consumers of the retry topics.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::StreamExt;
use message_bus::{BusError, MessageBus, MessageBusExt, MessageStream};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::retry::{RETURN_BOOK_RETRY_TOPIC, RetryMessage, SAVE_VIOLATIONS_RETRY_TOPIC};
use crate::services::{InventoryService, RatingService};

/// Minimum time between a message being enqueued and being processed.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(10);

/// Re-drives returns that failed after the reservation was closed.
///
/// One task consumes each retry topic. Messages on a topic are handled one
/// at a time, each no earlier than `delay` after it was enqueued. Transient
/// failures are republished with a fresh timestamp, so a message keeps
/// cycling until its service recovers.
pub struct RetryDispatcher<I, T, B> {
    inventory: I,
    rating: T,
    bus: B,
    delay: Duration,
    shutdown: CancellationToken,
}

/// Join handles of the running dispatcher tasks.
#[derive(Debug)]
pub struct RetryWorkers {
    handles: Vec<JoinHandle<()>>,
}

impl RetryWorkers {
    /// Waits for every dispatcher task to stop.
    pub async fn join(self) {
        for handle in self.handles {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "retry dispatcher task panicked");
            }
        }
    }
}

impl<I, T, B> RetryDispatcher<I, T, B>
where
    I: InventoryService + 'static,
    T: RatingService + 'static,
    B: MessageBus + 'static,
{
    pub fn new(inventory: I, rating: T, bus: B, shutdown: CancellationToken) -> Self {
        Self {
            inventory,
            rating,
            bus,
            delay: DEFAULT_RETRY_DELAY,
            shutdown,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Subscribes to both retry topics and spawns their consumers.
    ///
    /// Subscriptions are open when this returns, so anything published
    /// afterwards is delivered. The tasks stop when the shutdown token is
    /// cancelled or the bus is closed.
    pub async fn spawn(self) -> Result<RetryWorkers, BusError> {
        let return_book = self.bus.subscribe(RETURN_BOOK_RETRY_TOPIC).await?;
        let save_violations = self.bus.subscribe(SAVE_VIOLATIONS_RETRY_TOPIC).await?;

        let this = Arc::new(self);
        let handles = vec![
            tokio::spawn(Arc::clone(&this).consume(RETURN_BOOK_RETRY_TOPIC, return_book)),
            tokio::spawn(this.consume(SAVE_VIOLATIONS_RETRY_TOPIC, save_violations)),
        ];
        Ok(RetryWorkers { handles })
    }

    async fn consume(self: Arc<Self>, topic: &'static str, mut messages: MessageStream) {
        tracing::info!(topic, delay_secs = self.delay.as_secs(), "retry dispatcher started");

        loop {
            let envelope = tokio::select! {
                _ = self.shutdown.cancelled() => break,
                next = messages.next() => match next {
                    Some(envelope) => envelope,
                    None => break,
                },
            };

            let message: RetryMessage = match envelope.decode() {
                Ok(message) => message,
                Err(e) => {
                    metrics::counter!("retry_malformed_total", "topic" => topic).increment(1);
                    tracing::error!(topic, message_id = %envelope.message_id, error = %e, "dropping malformed retry message");
                    continue;
                }
            };

            if !self.wait_until_due(&message).await {
                break;
            }

            metrics::counter!("retry_attempts_total", "topic" => topic).increment(1);
            if topic == RETURN_BOOK_RETRY_TOPIC {
                self.retry_return_book(message).await;
            } else {
                self.retry_save_violations(message).await;
            }
        }

        tracing::info!(topic, "retry dispatcher stopped");
    }

    /// Sleeps until the message is due. Returns false if shutdown came first.
    async fn wait_until_due(&self, message: &RetryMessage) -> bool {
        let remaining = message.remaining_delay(self.delay, Utc::now());
        if remaining.is_zero() {
            return true;
        }

        tokio::select! {
            _ = self.shutdown.cancelled() => false,
            _ = tokio::time::sleep(remaining) => true,
        }
    }

    #[tracing::instrument(skip(self, message), fields(username = %message.username, book_uid = %message.book_uid))]
    async fn retry_return_book(&self, message: RetryMessage) {
        let topic = RETURN_BOOK_RETRY_TOPIC;
        match self
            .inventory
            .return_book(message.library_uid, message.book_uid, message.condition)
            .await
        {
            Ok(report) => {
                metrics::counter!("retry_resolved_total", "topic" => topic).increment(1);
                let violations = message.violations.saturating_add(report.count());
                tracing::info!(violations, "book returned, forwarding to rating");
                self.publish(SAVE_VIOLATIONS_RETRY_TOPIC, &message.with_violations(violations))
                    .await;
            }
            Err(e) if e.is_retryable() => {
                tracing::warn!(error = %e, "library still failing, requeueing");
                self.publish(topic, &message.refreshed()).await;
            }
            Err(e) => {
                metrics::counter!("retry_dropped_total", "topic" => topic).increment(1);
                tracing::warn!(error = %e, "book return refused, dropping retry");
            }
        }
    }

    #[tracing::instrument(skip(self, message), fields(username = %message.username, violations = message.violations))]
    async fn retry_save_violations(&self, message: RetryMessage) {
        let topic = SAVE_VIOLATIONS_RETRY_TOPIC;
        match self
            .rating
            .save_violations(&message.username, message.violations)
            .await
        {
            Ok(()) => {
                metrics::counter!("retry_resolved_total", "topic" => topic).increment(1);
                tracing::info!("violations saved");
            }
            Err(e) if e.is_retryable() => {
                tracing::warn!(error = %e, "rating still failing, requeueing");
                self.publish(topic, &message.refreshed()).await;
            }
            Err(e) => {
                metrics::counter!("retry_dropped_total", "topic" => topic).increment(1);
                tracing::warn!(error = %e, "violations refused, dropping retry");
            }
        }
    }

    async fn publish(&self, topic: &'static str, message: &RetryMessage) {
        match self.bus.publish_json(topic, message).await {
            Ok(_) => {
                metrics::counter!("retry_published_total", "topic" => topic).increment(1);
            }
            Err(e) => tracing::error!(topic, error = %e, "retry message lost"),
        }
    }
}
