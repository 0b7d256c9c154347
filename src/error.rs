//! Error types for the instrumentation bus.

use crate::subscription::SubscriptionId;
use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;

/// Type alias for Results in this crate
pub type Result<T> = std::result::Result<T, Error>;

/// Error a listener reports back to the registry.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Return type of every listener callback.
pub type ListenerResult = std::result::Result<(), ListenerError>;

/// Main error type for the instrumentation bus
#[derive(Error, Debug)]
pub enum Error {
    /// A pattern matcher did not compile
    #[error("Invalid subscription pattern `{pattern}`: {source}")]
    InvalidPattern {
        /// The rejected pattern text
        pattern: String,
        /// Compiler diagnostic
        #[source]
        source: regex::Error,
    },

    /// A listener failed while an event was being dispatched
    #[error("Listener {subscription} failed on `{event}`: {source}")]
    ListenerFailed {
        /// Name of the event being dispatched
        event: String,
        /// Subscription whose listener failed
        subscription: SubscriptionId,
        /// What the listener reported
        #[source]
        source: ListenerError,
    },

    /// A span was published with its finish before its start
    #[error("Event `{name}` finishes before it starts ({finish} < {start})")]
    InvertedSpan {
        /// Event name
        name: String,
        /// Reported start
        start: DateTime<Utc>,
        /// Reported finish
        finish: DateTime<Utc>,
    },

    /// The process-wide default notifier was installed twice
    #[error("A default notifier is already installed")]
    DefaultAlreadySet,
}

impl Error {
    /// Check if this error came out of a listener
    pub fn is_listener_failure(&self) -> bool {
        matches!(self, Error::ListenerFailed { .. })
    }
}

/// Failure of an instrumented call.
///
/// `Work` carries the wrapped operation's own error untouched; its `Display`
/// and `source` are forwarded so it reads exactly like the unwrapped error.
/// `Notify` is only produced when the work succeeded but a listener failed
/// under [`ListenerErrorPolicy::Propagate`](crate::registry::ListenerErrorPolicy).
///
/// An application error type that can absorb [`Error`] gets its own error
/// back with [`into_inner`](Self::into_inner), so `?` keeps working:
///
/// ```rust
/// use instrumentation_bus::{Notifier, Payload};
///
/// #[derive(Debug, thiserror::Error)]
/// enum AppError {
///     #[error("row not found")]
///     NotFound,
///     #[error(transparent)]
///     Instrumentation(#[from] instrumentation_bus::Error),
/// }
///
/// fn load(notifier: &Notifier) -> Result<u32, AppError> {
///     let row = notifier
///         .instrument("db.load", Payload::new(), |_| Err::<u32, _>(AppError::NotFound))
///         .map_err(|e| e.into_inner())?;
///     Ok(row)
/// }
///
/// assert!(matches!(load(&Notifier::new()), Err(AppError::NotFound)));
/// ```
#[derive(Debug)]
pub enum InstrumentError<E> {
    /// The instrumented work failed
    Work(E),
    /// Publishing the event failed
    Notify(Error),
}

impl<E> InstrumentError<E> {
    /// Borrow the work error, if that is what failed
    pub fn work(&self) -> Option<&E> {
        match self {
            InstrumentError::Work(error) => Some(error),
            InstrumentError::Notify(_) => None,
        }
    }

    /// Take the work error, if that is what failed
    pub fn into_work(self) -> Option<E> {
        match self {
            InstrumentError::Work(error) => Some(error),
            InstrumentError::Notify(_) => None,
        }
    }

    /// Collapse into the work's error type, converting a listener failure
    pub fn into_inner(self) -> E
    where
        E: From<Error>,
    {
        match self {
            InstrumentError::Work(error) => error,
            InstrumentError::Notify(error) => E::from(error),
        }
    }

    /// Check if the wrapped work itself failed
    pub fn is_work(&self) -> bool {
        matches!(self, InstrumentError::Work(_))
    }
}

impl<E> From<Error> for InstrumentError<E> {
    fn from(error: Error) -> Self {
        InstrumentError::Notify(error)
    }
}

impl<E: fmt::Display> fmt::Display for InstrumentError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstrumentError::Work(error) => error.fmt(f),
            InstrumentError::Notify(error) => error.fmt(f),
        }
    }
}

impl<E> std::error::Error for InstrumentError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InstrumentError::Work(error) => error.source(),
            InstrumentError::Notify(error) => error.source(),
        }
    }
}
