//! HTTP client tests against a mock cluster manager
//!
//! Run with: cargo test --test http_client -p autobalance-rebalancer

use std::sync::Arc;

use autobalance_core::{NumberLike, RawInput, RebalanceMode};
use autobalance_rebalancer::{
    ClusterManager, HttpClusterManager, ManagerClientConfig, Orchestrator, Outcome,
    RebalanceError, UniformRebalance,
};
use serde_json::{json, Value};
use wiremock::matchers::{body_string, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "session-key";

fn envelope(content: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "links": {},
        "entry": [{ "name": "entry", "content": content }],
    }))
}

fn client(server: &MockServer) -> HttpClusterManager {
    HttpClusterManager::new(&ManagerClientConfig::new(server.uri(), TOKEN)).unwrap()
}

async fn mount_healthy_cluster(server: &MockServer, threshold: Value) {
    Mock::given(method("GET"))
        .and(path("/services/cluster/manager/info"))
        .and(query_param("f", "maintenance_mode"))
        .respond_with(envelope(json!({ "maintenance_mode": false })))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/services/cluster/manager/generation/master"))
        .and(query_param("f", "search_factor_met"))
        .respond_with(envelope(json!({ "search_factor_met": "1" })))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/servicesNS/-/-/configs/conf-server/clustering"))
        .respond_with(envelope(json!({ "rebalance_threshold": threshold })))
        .expect(1)
        .mount(server)
        .await;
}

// ============================================================================
// Individual calls
// ============================================================================

#[tokio::test]
async fn test_maintenance_mode_sends_authorization() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/services/cluster/manager/info"))
        .and(query_param("output_mode", "json"))
        .and(header("Authorization", "Splunk session-key"))
        .respond_with(envelope(json!({ "maintenance_mode": true })))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client(&server).maintenance_mode().await.unwrap());
}

#[tokio::test]
async fn test_search_factor_values() {
    for (value, expected) in [
        (json!({ "search_factor_met": "1" }), true),
        (json!({ "search_factor_met": "0" }), false),
        (json!({ "search_factor_met": 1 }), false),
        (json!({}), false),
    ] {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/services/cluster/manager/generation/master"))
            .respond_with(envelope(value.clone()))
            .mount(&server)
            .await;

        let met = client(&server).search_factor_met().await.unwrap();
        assert_eq!(met, expected, "content {value}");
    }
}

#[tokio::test]
async fn test_rebalance_threshold_forms() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/servicesNS/-/-/configs/conf-server/clustering"))
        .respond_with(envelope(json!({ "rebalance_threshold": "0.9", "mode": "manager" })))
        .mount(&server)
        .await;

    assert_eq!(
        client(&server).rebalance_threshold().await.unwrap(),
        Some(NumberLike::Text("0.9".to_string()))
    );

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/servicesNS/-/-/configs/conf-server/clustering"))
        .respond_with(envelope(json!({ "mode": "manager" })))
        .mount(&server)
        .await;

    assert_eq!(client(&server).rebalance_threshold().await.unwrap(), None);
}

#[tokio::test]
async fn test_set_rebalance_threshold_posts_form() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/servicesNS/nobody/system/configs/conf-server/clustering"))
        .and(header("Content-Type", "application/x-www-form-urlencoded"))
        .and(body_string("rebalance_threshold=0.95"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<feed/>"))
        .expect(1)
        .mount(&server)
        .await;

    client(&server).set_rebalance_threshold(0.95).await.unwrap();
}

#[tokio::test]
async fn test_prune_with_and_without_index() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/services/cluster/master/control/default/prune_index"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let manager = client(&server);
    manager.prune_excess_buckets(Some("main")).await.unwrap();
    manager.prune_excess_buckets(None).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(String::from_utf8_lossy(&requests[0].body), "index=main");
    assert!(requests[1].body.is_empty());
}

#[tokio::test]
async fn test_usage_rebalance_status_and_start() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/services/cluster/master/control/control/rebalance_buckets_usage"))
        .and(body_string("action=status"))
        .respond_with(envelope(json!({
            "stddev_current": "7.25",
            "stddev_before_usage_rebalance": 12,
            "stddev_after_usage_rebalance": 0.5,
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/services/cluster/master/control/control/rebalance_buckets_usage"))
        .and(body_string("action=start"))
        .respond_with(envelope(json!({ "description": "usage rebalance started" })))
        .expect(1)
        .mount(&server)
        .await;

    let manager = client(&server);
    let stats = manager.usage_rebalance_status().await.unwrap();
    assert_eq!(stats.stddev_current, 7.25);
    assert_eq!(stats.stddev_before_usage_rebalance, 12.0);
    assert_eq!(stats.stddev_after_usage_rebalance, 0.5);

    let description = manager.start_usage_rebalance().await.unwrap();
    assert_eq!(description, "usage rebalance started");
}

#[tokio::test]
async fn test_start_rebalance_form_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/services/cluster/master/control/control/rebalance_buckets"))
        .and(query_param("output_mode", "json"))
        .and(body_string(
            "action=start&searchable=true&index=main&max_time_in_min=30",
        ))
        .respond_with(envelope(json!({ "description": "rebalance started" })))
        .expect(1)
        .mount(&server)
        .await;

    let description = client(&server)
        .start_rebalance(&UniformRebalance {
            searchable: true,
            index: Some("main".to_string()),
            max_time_in_min: Some(30.0),
        })
        .await
        .unwrap();
    assert_eq!(description, "rebalance started");
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_non_200_is_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/services/cluster/manager/info"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .mount(&server)
        .await;

    let err = client(&server).maintenance_mode().await.unwrap_err();
    match err {
        RebalanceError::Http {
            method,
            status,
            body,
            ..
        } => {
            assert_eq!(method, "GET");
            assert_eq!(status, 401);
            assert_eq!(body, "Unauthorized");
        }
        other => panic!("expected http error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_non_200_success_status_is_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/services/cluster/master/control/default/prune_index"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;

    let err = client(&server).prune_excess_buckets(None).await.unwrap_err();
    assert!(matches!(err, RebalanceError::Http { status: 201, .. }));
}

#[tokio::test]
async fn test_empty_entry_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/services/cluster/manager/info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "entry": [] })))
        .mount(&server)
        .await;

    let err = client(&server).maintenance_mode().await.unwrap_err();
    assert!(matches!(err, RebalanceError::MalformedResponse { .. }));
}

#[tokio::test]
async fn test_missing_description_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/services/cluster/master/control/control/rebalance_buckets"))
        .respond_with(envelope(json!({ "status": "ok" })))
        .mount(&server)
        .await;

    let err = client(&server)
        .start_rebalance(&UniformRebalance {
            searchable: false,
            index: None,
            max_time_in_min: None,
        })
        .await
        .unwrap_err();
    match err {
        RebalanceError::MalformedResponse { reason, .. } => {
            assert!(reason.contains("description"))
        }
        other => panic!("expected malformed response, got {other:?}"),
    }
}

#[tokio::test]
async fn test_tls_failure_is_transport_error() {
    // Speak TLS to a plain HTTP listener
    let server = MockServer::start().await;
    let base_url = format!("https://{}", server.address());
    let manager =
        HttpClusterManager::new(&ManagerClientConfig::new(base_url, TOKEN)).unwrap();

    let err = Orchestrator::new(Arc::new(manager))
        .run_input(&RawInput::new("tls"))
        .await
        .unwrap_err();

    assert!(matches!(err, RebalanceError::Transport { .. }));
}

// ============================================================================
// End to end
// ============================================================================

#[tokio::test]
async fn test_uniform_rebalance_end_to_end() {
    let server = MockServer::start().await;
    mount_healthy_cluster(&server, json!(0.9)).await;

    Mock::given(method("POST"))
        .and(path("/servicesNS/nobody/system/configs/conf-server/clustering"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/services/cluster/master/control/control/rebalance_buckets"))
        .and(body_string_contains("searchable=false"))
        .respond_with(envelope(json!({ "description": "Data rebalance started" })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = Orchestrator::new(Arc::new(client(&server)))
        .run_input(&RawInput::new("a").with("threshold", "0.9"))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        Outcome::Completed {
            mode: RebalanceMode::Uniform,
            description: Some("Data rebalance started".to_string()),
        }
    );
}

#[tokio::test]
async fn test_excess_buckets_end_to_end() {
    let server = MockServer::start().await;
    mount_healthy_cluster(&server, json!("0.9")).await;

    Mock::given(method("POST"))
        .and(path("/services/cluster/master/control/default/prune_index"))
        .and(body_string("index=main"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/services/cluster/master/control/control/rebalance_buckets"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let input = RawInput::new("b")
        .with("excess_buckets", "true")
        .with("target_index", "main");
    let outcome = Orchestrator::new(Arc::new(client(&server)))
        .run_input(&input)
        .await
        .unwrap();

    assert!(outcome.is_completed());
}

#[tokio::test]
async fn test_maintenance_mode_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/services/cluster/manager/info"))
        .respond_with(envelope(json!({ "maintenance_mode": true })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = Orchestrator::new(Arc::new(client(&server)))
        .run_input(&RawInput::new("c"))
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::SkippedMaintenance);
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}
