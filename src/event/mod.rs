//! Completed instrumentation spans.
//!
//! An [`Event`] is built once, after the instrumented work has finished, and
//! handed to listeners by reference. Nothing keeps it after dispatch.

use crate::{Error, Result};
use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use uuid::Uuid;

pub mod clock;
pub mod exception;

pub use clock::SpanTimer;
pub use exception::Exception;

/// Arbitrary key/value data attached to an event.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// Payload key under which a failed operation records its error.
pub const EXCEPTION_KEY: &str = "exception";

/// Generate a collision-resistant event id (32 lowercase hex characters).
pub fn unique_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// One completed, timed instrumentation span.
///
/// # Example
///
/// ```rust
/// use instrumentation_bus::event::{Event, Payload};
/// use chrono::{TimeDelta, Utc};
///
/// let start = Utc::now();
/// let finish = start + TimeDelta::milliseconds(5);
/// let event = Event::new("render", "abc123", start, finish, Payload::new()).unwrap();
/// assert_eq!(event.duration_ms(), 5.0);
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    name: String,
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    transaction_id: Option<Uuid>,
    payload: Payload,
    start: DateTime<Utc>,
    finish: DateTime<Utc>,
}

impl Event {
    /// Build an event from externally measured timestamps.
    ///
    /// Fails with [`Error::InvertedSpan`] when `finish` precedes `start`.
    pub fn new(
        name: impl Into<String>,
        id: impl Into<String>,
        start: DateTime<Utc>,
        finish: DateTime<Utc>,
        payload: Payload,
    ) -> Result<Self> {
        let name = name.into();
        if finish < start {
            return Err(Error::InvertedSpan {
                name,
                start,
                finish,
            });
        }

        Ok(Self {
            name,
            id: id.into(),
            transaction_id: None,
            payload,
            start,
            finish,
        })
    }

    /// Build an event from a [`SpanTimer`] reading, which is ordered by construction
    pub(crate) fn from_span(
        name: &str,
        id: String,
        transaction_id: Uuid,
        payload: Payload,
        (start, finish): (DateTime<Utc>, DateTime<Utc>),
    ) -> Self {
        Self {
            name: name.to_string(),
            id,
            transaction_id: Some(transaction_id),
            payload,
            start,
            finish,
        }
    }

    /// Event name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unique id of this occurrence
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Id of the instrumenter that produced the event, if any
    pub fn transaction_id(&self) -> Option<Uuid> {
        self.transaction_id
    }

    /// Payload, frozen
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Wall-clock start
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Wall-clock finish
    pub fn finish(&self) -> DateTime<Utc> {
        self.finish
    }

    /// Time between start and finish, never negative
    pub fn duration(&self) -> TimeDelta {
        (self.finish - self.start).max(TimeDelta::zero())
    }

    /// Duration in milliseconds, with sub-millisecond precision
    pub fn duration_ms(&self) -> f64 {
        let duration = self.duration();
        match duration.num_microseconds() {
            Some(micros) => micros as f64 / 1_000.0,
            None => duration.num_milliseconds() as f64,
        }
    }

    /// Error recorded by a failed instrumented operation
    pub fn exception(&self) -> Option<Exception> {
        self.payload.get(EXCEPTION_KEY).and_then(Exception::from_value)
    }
}
