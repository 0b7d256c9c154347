use instrumentation_bus::{Event, Matcher, Notifier, Payload};
use serde_json::json;
use std::convert::Infallible;
use std::thread;
use std::time::Duration;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "instrumentation_bus=debug".into()),
        )
        .init();

    println!("Testing instrumentation-bus...\n");

    let notifier = Notifier::new();

    // Subscribe to one event name
    let handle = notifier.subscribe("render", |event: &Event| {
        println!(
            "📨 {} [{}] took {:.3}ms: {:?}",
            event.name(),
            event.id(),
            event.duration_ms(),
            event.payload()
        );
    });

    // Subscribe to a whole family of names
    let sql = notifier
        .subscribe_pattern(r"^sql\.", |event: &Event| {
            println!("🗄️  {} took {:.3}ms", event.name(), event.duration_ms());
        })
        .unwrap();

    // Raw listeners also see untimed announcements
    let boot = notifier.subscribe_raw(Matcher::All, |name: &str, payload: &Payload| {
        println!("📣 {} {:?}", name, payload);
    });

    println!("Publishing events...");
    let announcement = Payload::from_iter([("phase".to_string(), json!("init"))]);
    notifier.raw_publish("app.boot", &announcement).unwrap();

    let mut payload = Payload::new();
    payload.insert("extra".into(), json!("info"));
    let html = notifier
        .instrument("render", payload, |_| {
            thread::sleep(Duration::from_millis(2));
            Ok::<_, Infallible>("<p>hello</p>")
        })
        .unwrap();
    println!("rendered {}", html);

    notifier
        .instrument("sql.query", Payload::new(), |payload| {
            payload.insert("rows".into(), json!(3));
            Ok::<_, Infallible>(())
        })
        .unwrap();

    // Nobody listens to this one, so it runs untimed
    notifier
        .instrument_if_listening("cache.read", Payload::new(), |_| Ok::<_, Infallible>(()))
        .unwrap();

    println!("\n{}", notifier.stats());

    // Clean up
    notifier.unsubscribe(handle);
    notifier.unsubscribe(sql);
    notifier.unsubscribe(boot);

    println!("\n✅ Demo completed successfully!");
}
