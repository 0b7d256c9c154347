//! The Notifier facade.
//!
//! A [`Notifier`] owns one registry and is the primary interface for
//! instrumenting work and subscribing to the resulting events. Cloning a
//! notifier shares the registry.

use crate::event::{Event, Exception, Payload};
use crate::instrumenter::{Instrumenter, InstrumenterPool};
use crate::registry::{Fanout, RegistryStats};
use crate::subscription::{
    FunctionListener, Listener, RawFunctionListener, RawListener, SubscriptionGuard,
    SubscriptionHandle, SubscriptionId, TimedListener,
};
use crate::{InstrumentError, Matcher, Result};
use chrono::{DateTime, Utc};
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

pub mod builder;
pub mod config;

pub use builder::NotifierBuilder;
pub use config::NotifierConfig;

/// Publishes instrumentation events to subscribed listeners.
///
/// # Example
///
/// ```rust
/// use instrumentation_bus::{Event, Notifier, Payload};
/// use std::convert::Infallible;
///
/// let notifier = Notifier::new();
///
/// let handle = notifier.subscribe("render", |event: &Event| {
///     println!("{} took {:.3}ms", event.name(), event.duration_ms());
/// });
///
/// let html = notifier
///     .instrument("render", Payload::new(), |_| Ok::<_, Infallible>("<p>hi</p>"))
///     .unwrap();
/// assert_eq!(html, "<p>hi</p>");
///
/// notifier.unsubscribe(&handle);
/// ```
#[derive(Clone)]
pub struct Notifier {
    pub(crate) fanout: Arc<Fanout>,
    pub(crate) config: NotifierConfig,
}

impl Notifier {
    /// Create a Notifier with default configuration
    pub fn new() -> Self {
        NotifierBuilder::new().build()
    }

    /// Create a new Notifier builder
    pub fn builder() -> NotifierBuilder {
        NotifierBuilder::new()
    }

    /// Configuration this notifier was built with
    pub fn config(&self) -> &NotifierConfig {
        &self.config
    }

    /// The underlying registry
    pub fn fanout(&self) -> &Arc<Fanout> {
        &self.fanout
    }

    /// Subscribe a closure to completed spans
    pub fn subscribe<F>(&self, matcher: impl Into<Matcher>, f: F) -> SubscriptionHandle
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.subscribe_listener(matcher, FunctionListener::new(f))
    }

    /// Subscribe a closure to every event whose name matches `pattern`.
    ///
    /// A malformed pattern fails here, and nothing is registered.
    pub fn subscribe_pattern<F>(&self, pattern: &str, f: F) -> Result<SubscriptionHandle>
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let matcher = Matcher::pattern(pattern)?;
        Ok(self.subscribe(matcher, f))
    }

    /// Subscribe a custom timed listener
    pub fn subscribe_listener<L>(
        &self,
        matcher: impl Into<Matcher>,
        listener: L,
    ) -> SubscriptionHandle
    where
        L: TimedListener,
    {
        self.fanout
            .subscribe(matcher.into(), Listener::timed(listener))
    }

    /// Subscribe a closure to names and payloads, including raw announcements
    pub fn subscribe_raw<F>(&self, matcher: impl Into<Matcher>, f: F) -> SubscriptionHandle
    where
        F: Fn(&str, &Payload) + Send + Sync + 'static,
    {
        self.subscribe_raw_listener(matcher, RawFunctionListener::new(f))
    }

    /// Subscribe a custom raw listener
    pub fn subscribe_raw_listener<L>(
        &self,
        matcher: impl Into<Matcher>,
        listener: L,
    ) -> SubscriptionHandle
    where
        L: RawListener,
    {
        self.fanout
            .subscribe(matcher.into(), Listener::raw(listener))
    }

    /// Subscribe a closure for as long as the returned guard lives
    pub fn subscribe_scoped<F>(&self, matcher: impl Into<Matcher>, f: F) -> SubscriptionGuard
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        SubscriptionGuard::new(self.subscribe(matcher, f), &self.fanout)
    }

    /// Run `work` with `f` subscribed, unsubscribing afterwards on every exit path
    pub fn subscribed<F, R>(
        &self,
        matcher: impl Into<Matcher>,
        f: F,
        work: impl FnOnce() -> R,
    ) -> R
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let _guard = self.subscribe_scoped(matcher, f);
        work()
    }

    /// Remove a subscription; unknown or already removed ids are ignored
    pub fn unsubscribe(&self, subscription: impl Into<SubscriptionId>) -> bool {
        self.fanout.unsubscribe(subscription.into())
    }

    /// Remove every subscription made for exactly `name`
    pub fn unsubscribe_named(&self, name: &str) -> usize {
        self.fanout.unsubscribe_named(name)
    }

    /// Check if any subscription matches `name`
    pub fn is_listening(&self, name: &str) -> bool {
        self.fanout.is_listening(name)
    }

    /// Subscriptions matching `name`, in dispatch order
    pub fn listeners_for(&self, name: &str) -> Vec<SubscriptionHandle> {
        self.fanout.listeners_for(name)
    }

    /// Publish a span timed elsewhere
    pub fn publish(
        &self,
        name: &str,
        id: impl Into<String>,
        start: DateTime<Utc>,
        finish: DateTime<Utc>,
        payload: Payload,
    ) -> Result<()> {
        let event = Event::new(name, id, start, finish, payload)?;
        self.fanout.publish(&event)
    }

    /// Publish a ready-made event
    pub fn publish_event(&self, event: &Event) -> Result<()> {
        self.fanout.publish(event)
    }

    /// Announce `name` without timing; only raw listeners receive it
    pub fn raw_publish(&self, name: &str, payload: &Payload) -> Result<()> {
        self.fanout.raw_publish(name, payload)
    }

    /// This thread's instrumenter for this notifier
    pub fn instrumenter(&self) -> Rc<Instrumenter> {
        InstrumenterPool::for_current_thread(&self.fanout)
    }

    /// Run `work` and publish one event describing it.
    ///
    /// See [`Instrumenter::instrument`].
    pub fn instrument<T, E, F>(
        &self,
        name: &str,
        payload: Payload,
        work: F,
    ) -> std::result::Result<T, InstrumentError<E>>
    where
        F: FnOnce(&mut Payload) -> std::result::Result<T, E>,
        E: fmt::Display,
    {
        self.instrumenter().instrument(name, payload, work)
    }

    /// Run `work` and publish one event, recording failures as `describe` says.
    ///
    /// See [`Instrumenter::instrument_described`].
    pub fn instrument_described<T, E, F, D>(
        &self,
        name: &str,
        payload: Payload,
        work: F,
        describe: D,
    ) -> std::result::Result<T, InstrumentError<E>>
    where
        F: FnOnce(&mut Payload) -> std::result::Result<T, E>,
        D: FnOnce(&E) -> Exception,
    {
        self.instrumenter().instrument_described(name, payload, work, describe)
    }

    /// Run `work`, publishing an event only if something listens to `name`
    pub fn instrument_if_listening<T, E, F>(
        &self,
        name: &str,
        payload: Payload,
        work: F,
    ) -> std::result::Result<T, InstrumentError<E>>
    where
        F: FnOnce(&mut Payload) -> std::result::Result<T, E>,
        E: fmt::Display,
    {
        self.instrumenter().instrument_if_listening(name, payload, work)
    }

    /// Get statistics about the registry
    pub fn stats(&self) -> RegistryStats {
        self.fanout.stats()
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("registry", &self.fanout.id())
            .field("subscriptions", &self.fanout.len())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, ListenerResult};
    use chrono::TimeDelta;
    use serde_json::json;
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::thread;

    #[derive(Debug, thiserror::Error)]
    #[error("boom")]
    struct Boom;

    fn counter(
        notifier: &Notifier,
        matcher: impl Into<Matcher>,
    ) -> (SubscriptionHandle, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let counted = hits.clone();
        let handle = notifier.subscribe(matcher, move |_: &Event| {
            counted.fetch_add(1, Ordering::SeqCst);
        });
        (handle, hits)
    }

    fn noop(notifier: &Notifier, name: &str) {
        notifier
            .instrument(name, Payload::new(), |_| Ok::<_, Infallible>(()))
            .unwrap();
    }

    #[test]
    fn test_render_scenario() {
        let notifier = Notifier::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        notifier.subscribe("render", move |event: &Event| {
            sink.lock().unwrap().push(event.clone());
        });

        let mut payload = Payload::new();
        payload.insert("extra".into(), json!("info"));
        let result = notifier
            .instrument("render", payload, |_| Ok::<_, Infallible>("result"))
            .unwrap();

        assert_eq!(result, "result");
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].name(), "render");
        assert_eq!(seen[0].payload()["extra"], "info");
        assert!(seen[0].duration_ms() >= 0.0);
    }

    #[test]
    fn test_no_subscriptions_no_listening() {
        let notifier = Notifier::new();
        assert!(!notifier.is_listening("x"));
        noop(&notifier, "x");
        notifier.raw_publish("x", &Payload::new()).unwrap();
        assert_eq!(notifier.stats().subscriptions, 0);
    }

    #[test]
    fn test_pattern_subscription() {
        let notifier = Notifier::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counted = hits.clone();
        notifier
            .subscribe_pattern(r"^sql\.", move |_: &Event| {
                counted.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        noop(&notifier, "sql.query");
        noop(&notifier, "http.request");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_malformed_pattern_fails_at_subscribe() {
        let notifier = Notifier::new();
        let err = notifier.subscribe_pattern("sql.(", |_: &Event| {}).unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { .. }));
        assert_eq!(notifier.stats().subscriptions, 0);
    }

    #[test]
    fn test_unsubscribe_is_final() {
        let notifier = Notifier::new();
        let (handle, hits) = counter(&notifier, "x");

        noop(&notifier, "x");
        assert!(notifier.unsubscribe(&handle));
        noop(&notifier, "x");
        noop(&notifier, "x");

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(!notifier.unsubscribe(handle));
    }

    #[test]
    fn test_absent_matcher_subscribes_to_all() {
        let notifier = Notifier::new();
        let (_, hits) = counter(&notifier, None::<&str>);
        noop(&notifier, "a");
        noop(&notifier, "b");
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_work_error_surfaces_unchanged() {
        let notifier = Notifier::new();
        let seen = Arc::new(Mutex::new(None));
        let sink = seen.clone();
        notifier.subscribe("x", move |event: &Event| {
            *sink.lock().unwrap() = event.exception();
        });

        let err = notifier
            .instrument("x", Payload::new(), |_| Err::<(), _>(Boom))
            .unwrap_err();

        assert_eq!(err.to_string(), "boom");
        assert!(err.into_work().is_some());
        let exception = seen.lock().unwrap().clone().unwrap();
        assert_eq!(exception.kind, "Boom");
        assert_eq!(exception.message, "boom");
    }

    #[test]
    fn test_described_failure_kind() {
        let notifier = Notifier::new();
        let seen = Arc::new(Mutex::new(None));
        let sink = seen.clone();
        notifier.subscribe("x", move |event: &Event| {
            *sink.lock().unwrap() = event.exception();
        });

        let err = notifier
            .instrument_described(
                "x",
                Payload::new(),
                |_| Err::<(), _>(Boom),
                |error| Exception::with_kind("Exploded", error),
            )
            .unwrap_err();

        assert!(err.is_work());
        assert_eq!(err.to_string(), "boom");
        assert_eq!(
            seen.lock().unwrap().clone(),
            Some(Exception::new("Exploded", "boom"))
        );
    }

    #[test]
    fn test_listening_visible_right_after_subscribe() {
        let notifier = Notifier::new();
        assert!(!notifier.is_listening("x"));
        let (handle, _) = counter(&notifier, "x");
        assert!(notifier.is_listening("x"));
        notifier.unsubscribe(&handle);
        assert!(!notifier.is_listening("x"));
    }

    #[test]
    fn test_publish_with_external_timing() {
        let notifier = Notifier::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        notifier.subscribe("cache.read", move |event: &Event| {
            sink.lock()
                .unwrap()
                .push((event.id().to_string(), event.duration_ms()));
        });

        let start = Utc::now();
        notifier
            .publish(
                "cache.read",
                "abc",
                start,
                start + TimeDelta::milliseconds(3),
                Payload::new(),
            )
            .unwrap();
        let err = notifier
            .publish(
                "cache.read",
                "def",
                start,
                start - TimeDelta::milliseconds(3),
                Payload::new(),
            )
            .unwrap_err();

        assert!(matches!(err, Error::InvertedSpan { .. }));
        assert_eq!(*seen.lock().unwrap(), vec![("abc".to_string(), 3.0)]);
    }

    #[test]
    fn test_raw_listeners_receive_announcements() {
        let notifier = Notifier::new();
        let names = Arc::new(Mutex::new(Vec::new()));
        let sink = names.clone();
        notifier.subscribe_raw(Matcher::All, move |name: &str, payload: &Payload| {
            sink.lock()
                .unwrap()
                .push((name.to_string(), payload.get("phase").cloned()));
        });
        let (_, timed_hits) = counter(&notifier, Matcher::All);

        let mut payload = Payload::new();
        payload.insert("phase".into(), json!("boot"));
        notifier.raw_publish("app.boot", &payload).unwrap();

        assert_eq!(
            *names.lock().unwrap(),
            vec![("app.boot".to_string(), Some(json!("boot")))]
        );
        assert_eq!(timed_hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_subscribed_removes_listener_afterwards() {
        let notifier = Notifier::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counted = hits.clone();

        let value = notifier.subscribed(
            "x",
            move |_: &Event| {
                counted.fetch_add(1, Ordering::SeqCst);
            },
            || {
                noop(&notifier, "x");
                5
            },
        );
        noop(&notifier, "x");

        assert_eq!(value, 5);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(!notifier.is_listening("x"));
    }

    #[test]
    fn test_isolated_listener_errors() {
        struct Failing;

        impl TimedListener for Failing {
            fn on_event(&self, _event: &Event) -> ListenerResult {
                Err("listener exploded".into())
            }
        }

        let notifier = Notifier::builder().isolate_listener_errors().build();
        notifier.subscribe_listener("x", Failing);
        let (_, hits) = counter(&notifier, "x");

        assert_eq!(
            notifier
                .instrument("x", Payload::new(), |_| Ok::<_, Infallible>(3))
                .unwrap(),
            3
        );
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_clones_share_registry() {
        let notifier = Notifier::new();
        let clone = notifier.clone();
        let (_, hits) = counter(&clone, "x");

        noop(&notifier, "x");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(Rc::ptr_eq(&notifier.instrumenter(), &clone.instrumenter()));
        assert_eq!(notifier.listeners_for("x").len(), 1);
    }

    #[test]
    fn test_concurrent_subscribe_publish_unsubscribe() {
        const THREADS: usize = 8;
        const ROUNDS: usize = 700;

        let notifier = Notifier::new();
        let (_, total) = counter(&notifier, Matcher::All);

        thread::scope(|scope| {
            for t in 0..THREADS {
                let notifier = &notifier;
                scope.spawn(move || {
                    let name = format!("thread.{}", t);
                    for _ in 0..ROUNDS {
                        let (handle, hits) = counter(notifier, name.as_str());
                        assert!(notifier.is_listening(&name));

                        noop(notifier, &name);
                        assert_eq!(hits.load(Ordering::SeqCst), 1);

                        assert!(notifier.unsubscribe(&handle));
                        noop(notifier, &name);
                        assert_eq!(hits.load(Ordering::SeqCst), 1);
                    }
                });
            }
        });

        assert_eq!(total.load(Ordering::SeqCst), THREADS * ROUNDS * 2);
        assert_eq!(notifier.stats().subscriptions, 1);
    }
}
