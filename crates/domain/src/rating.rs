//! Trust score ("stars") kept per user.

use serde::{Deserialize, Serialize};

/// Lowest possible score, also the score of a user seen for the first time.
pub const MIN_STARS: i64 = 1;

/// Highest possible score.
pub const MAX_STARS: i64 = 100;

/// Stars removed per violation.
pub const VIOLATION_PENALTY: i64 = 10;

/// A user's trust score, always within `[MIN_STARS, MAX_STARS]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub struct Stars(i64);

impl Stars {
    /// Creates a score, clamping `value` into range.
    pub fn new(value: i64) -> Self {
        Self(value.clamp(MIN_STARS, MAX_STARS))
    }

    /// Score assigned to a user on first read.
    pub fn initial() -> Self {
        Self(MIN_STARS)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    /// Applies the outcome of one return.
    ///
    /// Any violations subtract `VIOLATION_PENALTY` each; a clean return adds
    /// one star. The result is clamped.
    pub fn apply_violations(self, violations: u32) -> Self {
        if violations > 0 {
            let penalty = VIOLATION_PENALTY.saturating_mul(i64::from(violations));
            Self::new(self.0.saturating_sub(penalty))
        } else {
            Self::new(self.0.saturating_add(1))
        }
    }
}

impl Default for Stars {
    fn default() -> Self {
        Self::initial()
    }
}

impl From<i64> for Stars {
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}

impl From<Stars> for i64 {
    fn from(stars: Stars) -> Self {
        stars.0
    }
}

impl std::fmt::Display for Stars {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Rating payload as exchanged with the trust score service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserRating {
    pub stars: Stars,
}
