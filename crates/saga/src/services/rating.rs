//! Trust score service trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::Username;
use domain::{Stars, UserRating};

use super::{server_error, unavailable};
use crate::error::ServiceError;

/// Per-user trust score.
#[async_trait]
pub trait RatingService: Send + Sync {
    /// Returns the user's score, creating it at the minimum on first read.
    async fn get(&self, username: &Username) -> Result<UserRating, ServiceError>;

    /// Applies the outcome of one return: `count` violations cost
    /// ten stars each, zero violations earn one star.
    async fn save_violations(&self, username: &Username, count: u32) -> Result<(), ServiceError>;
}

#[derive(Debug, Default)]
struct InMemoryRatingState {
    scores: HashMap<Username, Stars>,
    unavailable: bool,
    failing_saves: u32,
    save_calls: u32,
}

/// In-memory trust score service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRatingService {
    state: Arc<RwLock<InMemoryRatingState>>,
}

impl InMemoryRatingService {
    /// Creates a new in-memory trust score service.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_stars(&self, username: &Username, stars: i64) {
        self.state
            .write()
            .unwrap()
            .scores
            .insert(username.clone(), Stars::new(stars));
    }

    /// Returns the stored score without creating one.
    pub fn stars(&self, username: &Username) -> Option<Stars> {
        self.state.read().unwrap().scores.get(username).copied()
    }

    /// Makes every call fail with a transport error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.write().unwrap().unavailable = unavailable;
    }

    /// Makes the next `count` save calls fail with a server error.
    pub fn fail_next_saves(&self, count: u32) {
        self.state.write().unwrap().failing_saves = count;
    }

    pub fn save_calls(&self) -> u32 {
        self.state.read().unwrap().save_calls
    }
}

#[async_trait]
impl RatingService for InMemoryRatingService {
    async fn get(&self, username: &Username) -> Result<UserRating, ServiceError> {
        let mut state = self.state.write().unwrap();
        if state.unavailable {
            return Err(unavailable("rating"));
        }

        let stars = *state.scores.entry(username.clone()).or_default();
        Ok(UserRating { stars })
    }

    async fn save_violations(&self, username: &Username, count: u32) -> Result<(), ServiceError> {
        let mut state = self.state.write().unwrap();
        state.save_calls += 1;
        if state.unavailable {
            return Err(unavailable("rating"));
        }
        if state.failing_saves > 0 {
            state.failing_saves -= 1;
            return Err(server_error("rating"));
        }

        let stars = state.scores.entry(username.clone()).or_default();
        *stars = stars.apply_violations(count);
        Ok(())
    }
}
