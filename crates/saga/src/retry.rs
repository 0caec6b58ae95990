//! Messages carried on the retry topics.

use std::time::Duration;

use chrono::{DateTime, Utc};
use common::{BookUid, LibraryUid, Username};
use domain::BookCondition;
use serde::{Deserialize, Serialize};

/// Topic re-driving `Inventory.Return` followed by the trust score update.
pub const RETURN_BOOK_RETRY_TOPIC: &str = "library.return_book.retry";

/// Topic re-driving the trust score update alone.
pub const SAVE_VIOLATIONS_RETRY_TOPIC: &str = "rating.save_violations.retry";

/// Everything needed to finish a return that failed part way.
///
/// `violations` is what has been counted so far: the lateness violation when
/// queued for the inventory step, the full count when queued for the trust
/// score step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryMessage {
    pub library_uid: LibraryUid,
    pub book_uid: BookUid,
    pub condition: BookCondition,
    pub violations: u32,
    pub username: Username,
    pub enqueued_at: DateTime<Utc>,
}

impl RetryMessage {
    pub fn new(
        library_uid: LibraryUid,
        book_uid: BookUid,
        condition: BookCondition,
        violations: u32,
        username: Username,
    ) -> Self {
        Self {
            library_uid,
            book_uid,
            condition,
            violations,
            username,
            enqueued_at: Utc::now(),
        }
    }

    /// Same message, enqueued now.
    pub fn refreshed(&self) -> Self {
        Self {
            enqueued_at: Utc::now(),
            ..self.clone()
        }
    }

    /// Same message with a different violation count, enqueued now.
    pub fn with_violations(&self, violations: u32) -> Self {
        Self {
            violations,
            ..self.refreshed()
        }
    }

    /// How long to wait at `now` before the message is due, given the
    /// minimum `delay` between enqueue and processing.
    pub fn remaining_delay(&self, delay: Duration, now: DateTime<Utc>) -> Duration {
        // A timestamp from the future counts as just enqueued.
        let elapsed = (now - self.enqueued_at).to_std().unwrap_or(Duration::ZERO);
        delay.saturating_sub(elapsed)
    }
}
