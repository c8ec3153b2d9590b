use rask_event_tracker::app::{ConfigError, EventTracker, TrackerConfig};
use rask_event_tracker::domain::{Payload, TrackerError};
use rask_event_tracker::scheduler::SchedulerState;
use rask_event_tracker::sources::{AppLifecycleAdapter, ConnectivityAdapter, LocalAddressProvider};
use serde_json::{Value, json};
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "1234567890123456";

fn config(server: &MockServer, flush_interval_ms: u64, buffer_capacity: usize) -> TrackerConfig {
    TrackerConfig {
        endpoint: format!("{}/v1/events", server.uri()),
        flush_interval_ms,
        buffer_capacity,
        request_timeout_secs: 5,
        ..TrackerConfig::default()
    }
}

async fn accept_all(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1/events"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
}

async fn received_bodies(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|request| serde_json::from_slice(&request.body).unwrap())
        .collect()
}

async fn wait_for_requests(server: &MockServer, count: usize) -> Vec<Value> {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let bodies = received_bodies(server).await;
            if bodies.len() >= count {
                return bodies;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("endpoint did not receive the expected requests")
}

async fn wait_for_first_cycle<T: rask_event_tracker::sender::EventTransport>(
    tracker: &EventTracker<T>,
) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while tracker.metrics().cycles == 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("first flush cycle did not run");
}

fn payload(value: Value) -> Payload {
    match value {
        Value::Object(map) => map,
        _ => Payload::new(),
    }
}

struct FixedAddress(Option<Ipv4Addr>);

impl LocalAddressProvider for FixedAddress {
    fn local_ipv4(&self) -> Option<Ipv4Addr> {
        self.0
    }
}

#[tokio::test]
async fn test_initialize_validates_credentials() {
    let server = MockServer::start().await;
    let tracker = EventTracker::new(config(&server, 60_000, 10)).unwrap();

    let result = tracker.initialize("short", TOKEN);
    assert!(matches!(
        result,
        Err(TrackerError::Config(ConfigError::Session(_)))
    ));
    assert!(matches!(
        tracker.track("app", Payload::new()),
        Err(TrackerError::NotInitialized)
    ));

    tracker.initialize(TOKEN, TOKEN).unwrap();
    assert!(tracker.track("app", Payload::new()).is_ok());
    tracker.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_tracked_events_arrive_in_order() {
    let server = MockServer::start().await;
    accept_all(&server).await;

    let tracker = EventTracker::new(config(&server, 50, 10)).unwrap();
    tracker.initialize(TOKEN, TOKEN).unwrap();

    for step in 0..3 {
        tracker
            .track("checkout", payload(json!({"step": step})))
            .unwrap();
    }

    let bodies = wait_for_requests(&server, 3).await;
    let steps: Vec<&Value> = bodies.iter().map(|b| &b["data"]["step"]).collect();
    assert_eq!(steps, vec![&json!(0), &json!(1), &json!(2)]);

    for body in &bodies {
        assert_eq!(body["apiKey"], TOKEN);
        assert_eq!(body["deviceUID"], TOKEN);
        assert_eq!(body["event"], "checkout");
        assert!(body["timestamp"].as_i64().unwrap() > 0);
    }

    tracker.shutdown().await.unwrap();
    let metrics = tracker.metrics();
    assert_eq!(metrics.state, Some(SchedulerState::Stopped));
    assert_eq!(metrics.delivery.unwrap().succeeded, 3);
}

#[tokio::test]
async fn test_overflow_delivers_newest_on_shutdown() {
    let server = MockServer::start().await;
    accept_all(&server).await;

    let tracker = EventTracker::new(config(&server, 3_600_000, 2)).unwrap();
    tracker.initialize(TOKEN, TOKEN).unwrap();
    wait_for_first_cycle(&tracker).await;

    for name in ["A", "B", "C"] {
        tracker.track("letter", payload(json!({"name": name}))).unwrap();
    }
    let buffer = tracker.metrics().buffer.unwrap();
    assert_eq!(buffer.len, 2);
    assert_eq!(buffer.evicted, 1);

    tracker.shutdown().await.unwrap();

    let names: Vec<Value> = received_bodies(&server)
        .await
        .into_iter()
        .map(|b| b["data"]["name"].clone())
        .collect();
    assert_eq!(names, vec![json!("B"), json!("C")]);
}

#[tokio::test]
async fn test_failing_endpoint_does_not_block_later_events() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let tracker = EventTracker::new(config(&server, 30, 10)).unwrap();
    tracker.initialize(TOKEN, TOKEN).unwrap();

    tracker.track("a", Payload::new()).unwrap();
    wait_for_requests(&server, 1).await;
    tracker.track("b", Payload::new()).unwrap();
    tracker.track("c", Payload::new()).unwrap();

    let bodies = wait_for_requests(&server, 3).await;
    let categories: Vec<&Value> = bodies.iter().map(|b| &b["event"]).collect();
    assert_eq!(categories, vec![&json!("a"), &json!("b"), &json!("c")]);

    tracker.shutdown().await.unwrap();
    let delivery = tracker.metrics().delivery.unwrap();
    assert_eq!(delivery.failed, 3);
    assert_eq!(delivery.last_status_code, Some(500));
}

#[tokio::test]
async fn test_set_endpoint_redirects_later_deliveries() {
    let first = MockServer::start().await;
    let second = MockServer::start().await;
    accept_all(&first).await;
    accept_all(&second).await;

    let tracker = EventTracker::new(config(&first, 3_600_000, 10)).unwrap();
    tracker.initialize(TOKEN, TOKEN).unwrap();
    wait_for_first_cycle(&tracker).await;

    tracker
        .set_endpoint(&format!("{}/v1/events", second.uri()))
        .unwrap();
    assert!(matches!(
        tracker.set_endpoint("no scheme here"),
        Err(ConfigError::InvalidUrl(_))
    ));

    tracker.track("moved", Payload::new()).unwrap();
    tracker.shutdown().await.unwrap();

    assert!(received_bodies(&first).await.is_empty());
    assert_eq!(received_bodies(&second).await.len(), 1);
}

#[tokio::test]
async fn test_adapters_post_through_tracker() {
    let server = MockServer::start().await;
    accept_all(&server).await;

    let tracker = Arc::new(EventTracker::new(config(&server, 3_600_000, 10)).unwrap());
    tracker.initialize(TOKEN, TOKEN).unwrap();
    wait_for_first_cycle(&tracker).await;

    let lifecycle = AppLifecycleAdapter::new(Arc::clone(&tracker));
    let connectivity = ConnectivityAdapter::with_provider(
        Arc::clone(&tracker),
        FixedAddress(Some(Ipv4Addr::new(10, 0, 0, 7))),
    );

    lifecycle.on_resumed();
    connectivity.on_connectivity_changed(true);
    connectivity.on_connectivity_changed(true);
    lifecycle.on_paused();

    tracker.shutdown().await.unwrap();

    let bodies = received_bodies(&server).await;
    assert_eq!(bodies.len(), 3);
    assert_eq!(bodies[0]["event"], "app");
    assert_eq!(bodies[0]["data"], json!({"ActivityState": "resumed"}));
    assert_eq!(bodies[1]["event"], "network");
    assert_eq!(
        bodies[1]["data"],
        json!({"NetworkStateOn": true, "IPv4": "10.0.0.7"})
    );
    assert_eq!(bodies[2]["data"], json!({"ActivityState": "paused"}));
}
