//! Timed execution of instrumented work.
//!
//! An [`Instrumenter`] runs a unit of work, times it, and publishes exactly
//! one [`Event`] for it, whether the work returns `Ok`, returns `Err`, or
//! panics. Work errors are recorded under `payload["exception"]` and handed
//! back unchanged; panics are recorded and then resumed.

use crate::event::{self, Event, Exception, Payload, SpanTimer};
use crate::registry::Fanout;
use crate::InstrumentError;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Weak};
use tracing::warn;
use uuid::Uuid;

pub mod pool;
pub use pool::InstrumenterPool;

/// Times work and publishes the resulting events to one registry.
///
/// Usually obtained per thread from [`InstrumenterPool`]. The registry is
/// held weakly: once it is gone, work still runs but nothing is published.
#[derive(Debug)]
pub struct Instrumenter {
    id: Uuid,
    fanout: Weak<Fanout>,
}

impl Instrumenter {
    /// Create an instrumenter publishing to `fanout`
    pub fn new(fanout: &Arc<Fanout>) -> Self {
        Self {
            id: Uuid::new_v4(),
            fanout: Arc::downgrade(fanout),
        }
    }

    /// Instrumenter identity, stamped on events as their transaction id
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Check if the registry this instrumenter publishes to still exists
    pub fn is_attached(&self) -> bool {
        self.fanout.strong_count() > 0
    }

    /// Run `work`, then publish one event named `name` describing it.
    ///
    /// `work` gets the payload mutably and may attach result metadata before
    /// the event is built. On success its value is returned; if a listener
    /// then fails, the failure is returned as [`InstrumentError::Notify`].
    /// On failure the error is recorded in the payload and returned as
    /// [`InstrumentError::Work`], unchanged.
    pub fn instrument<T, E, F>(
        &self,
        name: &str,
        payload: Payload,
        work: F,
    ) -> Result<T, InstrumentError<E>>
    where
        F: FnOnce(&mut Payload) -> Result<T, E>,
        E: fmt::Display,
    {
        self.instrument_described(name, payload, work, Exception::from_error)
    }

    /// Like [`instrument`](Self::instrument), with `describe` turning a work
    /// error into the recorded [`Exception`].
    ///
    /// Use it when the error's type name says nothing, as with boxed errors:
    ///
    /// ```rust
    /// use instrumentation_bus::{Exception, Notifier, Payload};
    /// use std::error::Error;
    ///
    /// let notifier = Notifier::new();
    /// let result = notifier.instrumenter().instrument_described(
    ///     "http.request",
    ///     Payload::new(),
    ///     |_| Err::<(), Box<dyn Error + Send + Sync>>("connection reset".into()),
    ///     |error| Exception::with_kind("ConnectionReset", &**error),
    /// );
    /// assert!(result.is_err());
    /// ```
    pub fn instrument_described<T, E, F, D>(
        &self,
        name: &str,
        mut payload: Payload,
        work: F,
        describe: D,
    ) -> Result<T, InstrumentError<E>>
    where
        F: FnOnce(&mut Payload) -> Result<T, E>,
        D: FnOnce(&E) -> Exception,
    {
        let Some(fanout) = self.fanout.upgrade() else {
            return work(&mut payload).map_err(InstrumentError::Work);
        };

        let id = event::unique_id();
        let timer = SpanTimer::start();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| work(&mut payload)));
        let span = timer.finish();

        match &outcome {
            Ok(Ok(_)) => {}
            Ok(Err(error)) => describe(error).record(&mut payload),
            Err(cause) => Exception::from_panic(cause.as_ref()).record(&mut payload),
        }

        let event = Event::from_span(name, id, self.id, payload, span);
        let published = fanout.publish(&event);

        match outcome {
            Ok(Ok(value)) => {
                published?;
                Ok(value)
            }
            Ok(Err(error)) => {
                if let Err(listener_error) = published {
                    warn!(
                        event = name,
                        error = %listener_error,
                        "Listener failure masked by work error"
                    );
                }
                Err(InstrumentError::Work(error))
            }
            Err(cause) => {
                if let Err(listener_error) = published {
                    warn!(
                        event = name,
                        error = %listener_error,
                        "Listener failure masked by panic"
                    );
                }
                panic::resume_unwind(cause)
            }
        }
    }

    /// Like [`instrument`](Self::instrument), but when nothing listens to
    /// `name` the work runs bare: no id, no timing, no publish.
    pub fn instrument_if_listening<T, E, F>(
        &self,
        name: &str,
        mut payload: Payload,
        work: F,
    ) -> Result<T, InstrumentError<E>>
    where
        F: FnOnce(&mut Payload) -> Result<T, E>,
        E: fmt::Display,
    {
        let listening = self
            .fanout
            .upgrade()
            .is_some_and(|fanout| fanout.is_listening(name));

        if listening {
            self.instrument(name, payload, work)
        } else {
            work(&mut payload).map_err(InstrumentError::Work)
        }
    }
}
