use rask_event_tracker::app::{App, EventTracker, ShutdownReason, TrackerConfig};
use serde_json::Value;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "1234567890123456";

#[tokio::test]
async fn test_ndjson_input_is_tracked_and_flushed_at_end_of_input() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let config = TrackerConfig {
        endpoint: format!("{}/v1/events", server.uri()),
        flush_interval_ms: 3_600_000,
        ..TrackerConfig::default()
    };
    let app = App::with_tracker(EventTracker::new(config).unwrap(), TOKEN, TOKEN);

    let input: &[u8] = br#"{"event": "app", "data": {"ActivityState": "resumed"}}

not json at all
{"event": "purchase", "data": {"sku": "A-1", "qty": 2}}
{"event": "", "data": {}}
{"event": "ping"}
"#;

    let summary = app.run_with_input(input).await.unwrap();

    assert_eq!(summary.reason, ShutdownReason::EndOfInput);
    assert_eq!(summary.tracked, 3);
    assert_eq!(summary.rejected, 2);

    let events: Vec<String> = server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|r| {
            let body: Value = serde_json::from_slice(&r.body).unwrap();
            body["event"].as_str().unwrap_or_default().to_string()
        })
        .collect();
    assert_eq!(events, vec!["app", "purchase", "ping"]);
}

#[tokio::test]
async fn test_bad_credentials_fail_before_reading_input() {
    let app = App::with_tracker(
        EventTracker::new(TrackerConfig::default()).unwrap(),
        "short",
        TOKEN,
    );
    let input: &[u8] = b"{\"event\": \"app\"}\n";

    assert!(app.run_with_input(input).await.is_err());
}
