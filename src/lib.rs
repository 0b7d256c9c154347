//! # instrumentation-bus
//!
//! An in-process instrumentation bus: producers emit named, timed events
//! carrying a key/value payload; consumers subscribe by exact name, pattern,
//! or to everything, and are called synchronously when a matching event is
//! published.
//!
//! ## Features
//!
//! - **Timed instrumentation** that publishes exactly one event per call,
//!   including for failed or panicking work
//! - **Exact, pattern and catch-all** subscriptions, dispatched in
//!   registration order
//! - **Fast path** that skips timing when nobody is listening
//! - **Thread-safe** copy-on-write registry; publishers never block each other
//!
//! ## Quick Example
//!
//! ```rust
//! use instrumentation_bus::{Event, Notifier, Payload};
//! use serde_json::json;
//! use std::convert::Infallible;
//!
//! let notifier = Notifier::new();
//!
//! // Subscribe to every sql.* event
//! notifier
//!     .subscribe_pattern(r"^sql\.", |event: &Event| {
//!         println!("{} ({:.2}ms): {:?}", event.name(), event.duration_ms(), event.payload());
//!     })
//!     .unwrap();
//!
//! // Instrument some work; the closure may add to the payload
//! let rows = notifier
//!     .instrument("sql.query", Payload::new(), |payload| {
//!         payload.insert("rows".into(), json!(3));
//!         Ok::<_, Infallible>(3)
//!     })
//!     .unwrap();
//! assert_eq!(rows, 3);
//! ```

#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    unreachable_pub
)]
#![cfg_attr(docsrs, feature(doc_cfg))]

/// Error types and result aliases
pub mod error;

/// Subscription scope
pub mod matcher;

/// Completed instrumentation spans
pub mod event;

/// Subscriptions and listeners
pub mod subscription;

/// Subscription registry and fanout
pub mod registry;

/// Timed execution and per-thread instrumenters
pub mod instrumenter;

/// The main notifier facade
pub mod notifier;

/// Optional process-wide default notifier
pub mod global;

// Re-export commonly used types
pub use error::{Error, InstrumentError, ListenerError, ListenerResult, Result};
pub use event::{Event, Exception, Payload};
pub use instrumenter::{Instrumenter, InstrumenterPool};
pub use matcher::Matcher;
pub use notifier::{Notifier, NotifierBuilder, NotifierConfig};
pub use registry::{Fanout, ListenerErrorPolicy, RegistryStats};
pub use subscription::{
    RawListener, SubscriptionGuard, SubscriptionHandle, SubscriptionId, TimedListener,
};

/// Prelude module for convenient imports
///
/// # Example
/// ```rust
/// use instrumentation_bus::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{Error, InstrumentError, ListenerResult, Result};
    pub use crate::event::{Event, Payload};
    pub use crate::matcher::Matcher;
    pub use crate::notifier::Notifier;
    pub use crate::subscription::{RawListener, SubscriptionHandle, TimedListener};
}
