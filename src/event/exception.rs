//! The `payload["exception"]` convention.
//!
//! A failed instrumented operation records a two-element array
//! `[kind, message]` under [`EXCEPTION_KEY`](super::EXCEPTION_KEY). `kind` is
//! the error's bare type name (`"Timeout"`, not `"my_app::db::Timeout"`), or
//! `"panic"` for a panicking operation.
//!
//! Type-erased errors (`Box<dyn Error>` and the like) only have a container
//! type to report. Callers that want a meaningful kind for them describe the
//! error themselves through
//! [`Instrumenter::instrument_described`](crate::Instrumenter::instrument_described).

use super::{Payload, EXCEPTION_KEY};
use serde_json::Value;
use std::any::Any;
use std::fmt;

/// Kind reported for operations that panicked.
pub const PANIC_KIND: &str = "panic";

/// Error details carried in an event payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exception {
    /// Error kind (type name)
    pub kind: String,
    /// Rendered error message
    pub message: String,
}

impl Exception {
    /// Create exception details
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Describe an error value by its bare type name and `Display` output
    pub fn from_error<E: fmt::Display>(error: &E) -> Self {
        Self::new(short_type_name::<E>(), error.to_string())
    }

    /// Describe an error value under a caller-chosen kind
    pub fn with_kind<E: fmt::Display + ?Sized>(kind: impl Into<String>, error: &E) -> Self {
        Self::new(kind, error.to_string())
    }

    /// Describe a caught panic payload
    pub fn from_panic(panic: &(dyn Any + Send)) -> Self {
        let message = if let Some(message) = panic.downcast_ref::<&str>() {
            (*message).to_string()
        } else if let Some(message) = panic.downcast_ref::<String>() {
            message.clone()
        } else {
            "Box<dyn Any>".to_string()
        };
        Self::new(PANIC_KIND, message)
    }

    /// Read `[kind, message]` back out of a payload value
    pub fn from_value(value: &Value) -> Option<Self> {
        match value.as_array()?.as_slice() {
            [Value::String(kind), Value::String(message)] => Some(Self::new(kind, message)),
            _ => None,
        }
    }

    /// Encode as `[kind, message]`
    pub fn to_value(&self) -> Value {
        Value::Array(vec![
            Value::String(self.kind.clone()),
            Value::String(self.message.clone()),
        ])
    }

    /// Store into `payload["exception"]`, replacing any previous value
    pub fn record(&self, payload: &mut Payload) {
        payload.insert(EXCEPTION_KEY.to_string(), self.to_value());
    }
}

/// `type_name::<T>()` with every module path dropped.
///
/// `my_app::db::Timeout` becomes `Timeout`; paths inside generic arguments are
/// shortened too, so `alloc::boxed::Box<dyn core::error::Error>` becomes
/// `Box<dyn Error>`.
pub fn short_type_name<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let mut short = String::with_capacity(full.len());
    // Start of the path segment being copied, in `short`
    let mut segment = 0;
    let mut chars = full.chars().peekable();

    while let Some(c) = chars.next() {
        if c == ':' && chars.peek() == Some(&':') {
            chars.next();
            short.truncate(segment);
        } else {
            short.push(c);
            if !(c.is_alphanumeric() || c == '_') {
                segment = short.len();
            }
        }
    }
    short
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}
