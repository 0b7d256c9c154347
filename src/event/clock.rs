//! Span timing.

use chrono::{DateTime, TimeDelta, Utc};
use std::time::Instant;

/// Measures one span.
///
/// The start is stamped from the wall clock; the finish is the start plus
/// monotonic elapsed time, so a span can never come out inverted even if
/// the system clock steps backwards mid-operation.
#[derive(Debug, Clone, Copy)]
pub struct SpanTimer {
    started_at: DateTime<Utc>,
    origin: Instant,
}

impl SpanTimer {
    /// Start timing now
    pub fn start() -> Self {
        Self {
            started_at: Utc::now(),
            origin: Instant::now(),
        }
    }

    /// Wall-clock start of the span
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Stop timing, returning `(start, finish)`
    pub fn finish(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let elapsed = TimeDelta::from_std(self.origin.elapsed()).unwrap_or(TimeDelta::zero());
        let finish = self
            .started_at
            .checked_add_signed(elapsed)
            .unwrap_or(self.started_at);
        (self.started_at, finish)
    }
}
