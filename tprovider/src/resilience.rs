//! Attempt budget and exponential backoff shared by exchange loops.
//!
//! ```rust
//! use std::time::Duration;
//!
//! use tprovider::RetryPolicy;
//!
//! let policy = RetryPolicy::default();
//! assert_eq!(policy.backoff_for_attempt(1), Duration::from_millis(200));
//! assert_eq!(
//!     policy.backoff_within(3, Duration::from_millis(50)),
//!     Duration::from_millis(50)
//! );
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Counted attempts per model candidate.
    pub max_attempts: u32,
    #[serde(with = "duration_millis", rename = "initial_backoff_ms")]
    pub initial_backoff: Duration,
    #[serde(with = "duration_millis", rename = "max_backoff_ms")]
    pub max_backoff: Duration,
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(5),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    pub fn has_attempts_left(&self, attempts_used: u32) -> bool {
        attempts_used < self.max_attempts.max(1)
    }

    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = (attempt.saturating_sub(1)) as i32;
        let unbounded = self.initial_backoff.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        Duration::from_secs_f64(unbounded.min(self.max_backoff.as_secs_f64()))
    }

    /// Backoff for `attempt`, never longer than `remaining`.
    pub fn backoff_within(&self, attempt: u32, remaining: Duration) -> Duration {
        self.backoff_for_attempt(attempt).min(remaining)
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = u64::try_from(value.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}
