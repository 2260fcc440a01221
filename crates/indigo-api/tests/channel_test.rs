#![allow(clippy::unwrap_used)]
// Integration tests for `RequestQueue` using wiremock.

use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use indigo_api::{Error, IndigoClient, Method, Params, RequestQueue};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, RequestQueue) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = IndigoClient::with_client(reqwest::Client::new(), base_url);
    (server, RequestQueue::spawn(client))
}

// ── JSON requests ───────────────────────────────────────────────────

#[tokio::test]
async fn request_json_parses_device_body() {
    let (server, queue) = setup().await;

    Mock::given(method("GET"))
        .and(path("/devices/101"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 101,
            "name": "Porch Light",
            "isOn": true,
            "brightness": 60
        })))
        .mount(&server)
        .await;

    let value = queue
        .request_json("/devices/101", Method::Get, Params::new())
        .await
        .unwrap();

    assert_eq!(value["name"], "Porch Light");
    assert_eq!(value["brightness"], 60);
    assert_eq!(queue.issued(), 1);
    assert_eq!(queue.pending(), 0);
}

#[tokio::test]
async fn malformed_json_is_a_parse_error_with_body() {
    let (server, queue) = setup().await;

    Mock::given(method("GET"))
        .and(path("/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[{\"id\": 1,]"))
        .mount(&server)
        .await;

    let result = queue.request_json("/devices", Method::Get, Params::new()).await;

    match result {
        Err(Error::Deserialization { body, .. }) => assert_eq!(body, "[{\"id\": 1,]"),
        other => panic!("expected Deserialization error, got: {other:?}"),
    }
}

#[tokio::test]
async fn non_success_status_is_a_transport_error() {
    let (server, queue) = setup().await;

    Mock::given(method("GET"))
        .and(path("/devices/404"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such device"))
        .mount(&server)
        .await;

    let err = queue
        .request("/devices/404", Method::Get, Params::new())
        .await
        .unwrap_err();

    assert!(err.is_not_found(), "expected 404, got: {err:?}");
    assert!(!err.is_parse());
}

// ── Writes ──────────────────────────────────────────────────────────

#[tokio::test]
async fn put_sends_params_as_query_string() {
    let (server, queue) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/devices/101"))
        .and(query_param("brightness", "60"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    queue
        .request("/devices/101", Method::Put, Params::new().with("brightness", 60))
        .await
        .unwrap();
}

#[tokio::test]
async fn execute_uses_the_custom_verb() {
    let (server, queue) = setup().await;

    Mock::given(method("EXECUTE"))
        .and(path("/actions/555"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    queue
        .request("/actions/555", Method::Execute, Params::new())
        .await
        .unwrap();
}

// ── Ordering ────────────────────────────────────────────────────────

#[tokio::test]
async fn requests_drain_in_fifo_order_one_at_a_time() {
    let (server, queue) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(100)))
        .mount(&server)
        .await;

    let started = Instant::now();
    let (a, b, c) = tokio::join!(
        queue.request("/devices/1", Method::Get, Params::new()),
        queue.request("/devices/2", Method::Get, Params::new()),
        queue.request("/devices/3", Method::Get, Params::new()),
    );
    a.unwrap();
    b.unwrap();
    c.unwrap();

    // Serialized: three 100ms responses cannot overlap.
    assert!(started.elapsed() >= Duration::from_millis(300));

    let paths: Vec<String> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| r.url.path().to_owned())
        .collect();
    assert_eq!(paths, vec!["/devices/1", "/devices/2", "/devices/3"]);
    assert_eq!(queue.issued(), 3);
}

#[tokio::test]
async fn one_failure_does_not_stall_the_queue() {
    let (server, queue) = setup().await;

    Mock::given(method("GET"))
        .and(path("/devices/1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/devices/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 2})))
        .mount(&server)
        .await;

    let first = queue.request_json("/devices/1", Method::Get, Params::new()).await;
    let second = queue.request_json("/devices/2", Method::Get, Params::new()).await;

    assert!(matches!(first, Err(Error::Http { status: 500, .. })));
    assert_eq!(second.unwrap()["id"], 2);
}

#[tokio::test]
async fn shutdown_fails_queued_requests_and_clears_pending() {
    let (server, queue) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(100)))
        .mount(&server)
        .await;

    let enqueue = |path: &'static str| {
        let queue = queue.clone();
        tokio::spawn(async move { queue.request(path, Method::Get, Params::new()).await })
    };

    let in_flight = enqueue("/devices/1");
    tokio::time::sleep(Duration::from_millis(20)).await;
    let second = enqueue("/devices/2");
    let third = enqueue("/devices/3");
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(queue.pending(), 2);

    queue.shutdown();

    assert!(in_flight.await.unwrap().is_ok());
    assert!(matches!(second.await.unwrap(), Err(Error::ChannelClosed)));
    assert!(matches!(third.await.unwrap(), Err(Error::ChannelClosed)));
    assert_eq!(queue.pending(), 0);
    assert_eq!(queue.issued(), 1);
}

#[tokio::test]
async fn shutdown_closes_the_channel() {
    let (_server, queue) = setup().await;

    queue.shutdown();
    tokio::task::yield_now().await;

    let result = queue.request("/devices", Method::Get, Params::new()).await;
    assert!(matches!(result, Err(Error::ChannelClosed)));
}
