//! Listener traits and implementations.
//!
//! A listener is chosen at subscribe time as either timed (receives the whole
//! [`Event`]) or raw (receives the name and payload only). The registry holds
//! it as a [`Listener`] and dispatches on the variant.

use crate::event::{Event, Payload};
use crate::ListenerResult;
use std::fmt;
use std::sync::Arc;

/// Receives completed, timed spans.
///
/// Listeners run synchronously on the publishing thread, must tolerate other
/// listeners on the same event, and must treat the event as read-only.
pub trait TimedListener: Send + Sync + 'static {
    /// Handle one event
    fn on_event(&self, event: &Event) -> ListenerResult;

    /// Get the listener name for debugging
    fn name(&self) -> &str {
        "unnamed"
    }
}

/// Receives name and payload, for spans and for raw announcements alike.
pub trait RawListener: Send + Sync + 'static {
    /// Handle one publication
    fn on_publish(&self, name: &str, payload: &Payload) -> ListenerResult;

    /// Get the listener name for debugging
    fn name(&self) -> &str {
        "unnamed"
    }
}

/// A listener as stored by the registry.
#[derive(Clone)]
pub enum Listener {
    /// Wants `(name, id, start, finish, payload)` as an [`Event`]
    Timed(Arc<dyn TimedListener>),
    /// Wants `(name, payload)`
    Raw(Arc<dyn RawListener>),
}

impl Listener {
    /// Wrap a timed listener
    pub fn timed(listener: impl TimedListener) -> Self {
        Listener::Timed(Arc::new(listener))
    }

    /// Wrap a raw listener
    pub fn raw(listener: impl RawListener) -> Self {
        Listener::Raw(Arc::new(listener))
    }

    /// Listener name
    pub fn name(&self) -> &str {
        match self {
            Listener::Timed(listener) => listener.name(),
            Listener::Raw(listener) => listener.name(),
        }
    }

    /// Check if this listener only receives timed spans
    pub fn is_timed(&self) -> bool {
        matches!(self, Listener::Timed(_))
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_timed() { "Timed" } else { "Raw" };
        f.debug_tuple(kind).field(&self.name()).finish()
    }
}

/// A closure-based timed listener.
pub struct FunctionListener<F>
where
    F: Fn(&Event) + Send + Sync + 'static,
{
    function: F,
    name: String,
}

impl<F> FunctionListener<F>
where
    F: Fn(&Event) + Send + Sync + 'static,
{
    /// Create a new function listener
    pub fn new(function: F) -> Self {
        Self::with_name(function, "FunctionListener")
    }

    /// Create a new function listener with a custom name
    pub fn with_name(function: F, name: impl Into<String>) -> Self {
        Self {
            function,
            name: name.into(),
        }
    }
}

impl<F> fmt::Debug for FunctionListener<F>
where
    F: Fn(&Event) + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionListener")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<F> TimedListener for FunctionListener<F>
where
    F: Fn(&Event) + Send + Sync + 'static,
{
    fn on_event(&self, event: &Event) -> ListenerResult {
        (self.function)(event);
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// A closure-based raw listener.
pub struct RawFunctionListener<F>
where
    F: Fn(&str, &Payload) + Send + Sync + 'static,
{
    function: F,
    name: String,
}

impl<F> RawFunctionListener<F>
where
    F: Fn(&str, &Payload) + Send + Sync + 'static,
{
    /// Create a new raw function listener
    pub fn new(function: F) -> Self {
        Self::with_name(function, "RawFunctionListener")
    }

    /// Create a new raw function listener with a custom name
    pub fn with_name(function: F, name: impl Into<String>) -> Self {
        Self {
            function,
            name: name.into(),
        }
    }
}

impl<F> fmt::Debug for RawFunctionListener<F>
where
    F: Fn(&str, &Payload) + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawFunctionListener")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<F> RawListener for RawFunctionListener<F>
where
    F: Fn(&str, &Payload) + Send + Sync + 'static,
{
    fn on_publish(&self, name: &str, payload: &Payload) -> ListenerResult {
        (self.function)(name, payload);
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
