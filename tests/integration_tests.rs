//! Integration tests for logship against a real HTTP endpoint

use logship::client::LogClient;
use logship::config::ClientConfig;
use logship::types::LogData;
use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;
use std::time::Duration;

/// Helper function to create a client config pointing at the mock server
fn create_test_config(server: &ServerGuard, service: &str) -> ClientConfig {
    ClientConfig {
        endpoint: format!("{}/api/v1/logs", server.url()),
        service: service.to_string(),
        backoff_base_ms: 1,
        request_timeout_ms: 2000,
        ..ClientConfig::new("test-api-key", "test-api-secret")
    }
}

/// Test that a batch reaches the endpoint with the expected headers and body
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_basic_shipping() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("POST", "/api/v1/logs")
        .match_header("content-type", "application/json")
        .match_header("x-api-key", "test-api-key")
        .match_header("authorization", "Bearer test-api-secret")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#""message":"User logged in""#.to_string()),
            Matcher::Regex(r#""service":"auth-service""#.to_string()),
            Matcher::Regex(r#""level":"info""#.to_string()),
            Matcher::Regex(r#""user_id":"12345""#.to_string()),
        ]))
        .with_status(202)
        .expect(1)
        .create_async()
        .await;

    let config = ClientConfig {
        worker_count: 1,
        ..create_test_config(&server, "auth-service")
    };
    let client = LogClient::with_config(config).unwrap();

    let mut data = LogData::new();
    data.insert("user_id".to_string(), json!("12345"));
    client.info_with_data("User logged in", data);

    let report = client.close().await;
    assert_eq!(report.stopped, 1);

    mock.assert_async().await;
    let stats = client.stats();
    assert_eq!(stats.delivered_batches, 1);
    assert_eq!(stats.delivered_entries, 1);
}

/// Test that every level is shipped and the body is a JSON array
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_all_levels_in_one_batch() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("POST", "/api/v1/logs")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r"^\[".to_string()),
            Matcher::Regex(r#""level":"debug""#.to_string()),
            Matcher::Regex(r#""level":"info""#.to_string()),
            Matcher::Regex(r#""level":"warn""#.to_string()),
            Matcher::Regex(r#""level":"error""#.to_string()),
            Matcher::Regex(r#""level":"critical""#.to_string()),
        ]))
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let config = ClientConfig {
        worker_count: 1,
        ..create_test_config(&server, "levels")
    };
    let client = LogClient::with_config(config).unwrap();

    client.debug("Debug message");
    client.info("Info message");
    client.warn("Warn message");
    client.error("Error message");
    client.critical("Critical message");
    client.close().await;

    mock.assert_async().await;
    assert_eq!(client.stats().delivered_entries, 5);
}

/// Test that auth failures are not retried
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unauthorized_not_retried() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("POST", "/api/v1/logs")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;

    let config = ClientConfig {
        worker_count: 1,
        ..create_test_config(&server, "auth")
    };
    let client = LogClient::with_config(config).unwrap();
    client.error("This will be rejected");
    client.close().await;

    mock.assert_async().await;
    let stats = client.stats();
    assert_eq!(stats.rejected_batches, 1);
    assert_eq!(stats.lost_entries, 1);
    assert_eq!(stats.retries, 0);
}

/// Test that server errors are retried up to the attempt limit
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_server_error_retried_then_dropped() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("POST", "/api/v1/logs")
        .with_status(500)
        .expect(3)
        .create_async()
        .await;

    let config = ClientConfig {
        worker_count: 1,
        ..create_test_config(&server, "flaky")
    };
    let client = LogClient::with_config(config).unwrap();
    client.warn("Retry me");
    client.close().await;

    mock.assert_async().await;
    let stats = client.stats();
    assert_eq!(stats.exhausted_batches, 1);
    assert_eq!(stats.retries, 2);
    assert_eq!(stats.delivered_batches, 0);
}

/// Test that an unreachable endpoint is contained inside the client
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unreachable_endpoint() {
    // Grab a free port, then release it so nothing is listening there
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let config = ClientConfig {
        endpoint: format!("http://127.0.0.1:{}/api/v1/logs", port),
        worker_count: 1,
        backoff_base_ms: 1,
        request_timeout_ms: 500,
        ..ClientConfig::new("key", "secret")
    };
    let client = LogClient::with_config(config).unwrap();
    client.info("Nobody is listening");
    client.close().await;

    let stats = client.stats();
    assert_eq!(stats.exhausted_batches, 1);
    assert_eq!(stats.lost_entries, 1);
}

/// Test that close ships everything still queued
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_close_flushes_pending() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("POST", "/api/v1/logs")
        .with_status(200)
        .expect_at_least(3)
        .create_async()
        .await;

    let client = LogClient::with_config(create_test_config(&server, "bulk")).unwrap();
    for i in 0..300 {
        client.info(format!("Bulk message {}", i));
    }
    let report = client.close().await;

    assert_eq!(report.stopped, 3);
    assert_eq!(report.abandoned, 0);
    mock.assert_async().await;
    assert_eq!(client.stats().delivered_entries, 300);
    assert_eq!(client.queue_len(), 0);
}

/// Test two clients in one process shipping independently
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_multiple_clients() {
    let mut server = Server::new_async().await;

    let billing = server
        .mock("POST", "/api/v1/logs")
        .match_header("x-api-key", "billing-key")
        .match_body(Matcher::Regex(r#""service":"billing""#.to_string()))
        .with_status(200)
        .expect(1)
        .create_async()
        .await;
    let search = server
        .mock("POST", "/api/v1/logs")
        .match_header("x-api-key", "search-key")
        .match_body(Matcher::Regex(r#""service":"search""#.to_string()))
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let billing_client = LogClient::with_config(ClientConfig {
        api_key: "billing-key".to_string(),
        worker_count: 1,
        ..create_test_config(&server, "billing")
    })
    .unwrap();
    let search_client = LogClient::with_config(ClientConfig {
        api_key: "search-key".to_string(),
        worker_count: 1,
        ..create_test_config(&server, "search")
    })
    .unwrap();

    billing_client.info("Invoice created");
    search_client.info("Index rebuilt");

    billing_client.close().await;
    search_client.close().await;

    billing.assert_async().await;
    search.assert_async().await;
}

/// Test the interval flush against a live endpoint
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_interval_flush_without_close() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("POST", "/api/v1/logs")
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let config = ClientConfig {
        worker_count: 1,
        flush_interval_ms: 200,
        dequeue_timeout_ms: 50,
        ..create_test_config(&server, "interval")
    };
    let client = LogClient::with_config(config).unwrap();
    for i in 0..5 {
        client.info(format!("Interval message {}", i));
    }

    tokio::time::sleep(Duration::from_millis(800)).await;
    mock.assert_async().await;
    assert_eq!(client.stats().delivered_entries, 5);

    client.close().await;
}
