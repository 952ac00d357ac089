//! Caller-supplied deadline budget.
//!
//! Both the writer and the relay must leave a small reserved margin before
//! the hard deadline so in-flight operations can be cancelled cleanly rather
//! than abruptly terminated. A cancelled publish-then-mark sequence leaves
//! the record PENDING, which is always safe to retry.

use std::time::Duration;

use tokio::time::Instant;

/// Fraction of the budget reserved before the hard deadline.
const MARGIN_FRACTION: f64 = 0.0025;

/// Smallest reserved margin applied regardless of budget size.
const MIN_MARGIN: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    hard: Instant,
    margin: Duration,
}

impl Deadline {
    /// A deadline `budget` from now, reserving the default margin.
    pub fn after(budget: Duration) -> Self {
        let margin = budget.mul_f64(MARGIN_FRACTION).max(MIN_MARGIN);
        Self {
            hard: Instant::now() + budget,
            margin,
        }
    }

    /// A deadline with an explicit reserved margin.
    pub fn with_margin(budget: Duration, margin: Duration) -> Self {
        Self {
            hard: Instant::now() + budget,
            margin,
        }
    }

    /// Time left before the hard deadline.
    pub fn remaining(&self) -> Duration {
        self.hard.saturating_duration_since(Instant::now())
    }

    /// Time left for starting or awaiting work, excluding the reserved
    /// margin.
    pub fn remaining_until_margin(&self) -> Duration {
        self.remaining().saturating_sub(self.margin)
    }

    /// True once the remaining budget is inside the reserved margin; callers
    /// must stop starting new work.
    pub fn expired(&self) -> bool {
        self.remaining() <= self.margin
    }
}
