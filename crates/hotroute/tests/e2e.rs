// SPDX-FileCopyrightText: 2026 Hotroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the complete request path.
//!
//! Each test builds an isolated TestHarness over a temporary plugin directory.
//! Tests are independent and order-insensitive.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use hotroute_gateway::spawn_hot_reload;
use hotroute_plugin::WatcherConfig;
use hotroute_test_utils::TestHarness;
use serde_json::json;
use tokio_util::sync::CancellationToken;

const PING: &str = "path = \"/ping\"\nhandler = \"echo\"\n";

// ---- Dispatch ----

#[tokio::test]
async fn ping_without_message_returns_empty_msg() {
    let harness = TestHarness::builder()
        .with_plugin("ping.toml", PING)
        .build()
        .await
        .unwrap();

    let response = harness.get("/ping").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({"success": true, "msg": ""}));
}

#[tokio::test]
async fn reload_moves_route() {
    let harness = TestHarness::builder()
        .with_plugin("ping.toml", PING)
        .build()
        .await
        .unwrap();
    assert_eq!(harness.get("/ping").await.status, StatusCode::OK);

    harness.write_plugin("ping.toml", "path = \"/pong\"\nhandler = \"echo\"\n");
    assert!(harness.reload("ping.toml").await);

    assert_eq!(harness.get("/ping").await.status, StatusCode::NOT_FOUND);
    assert_eq!(harness.get("/pong").await.status, StatusCode::OK);
    assert_eq!(harness.registry.routes().len(), 1);
}

#[tokio::test]
async fn invalid_reload_keeps_previous_version() {
    let harness = TestHarness::builder()
        .with_plugin("ping.toml", PING)
        .build()
        .await
        .unwrap();

    harness.write_plugin("ping.toml", "path = \"/ping\"\nmethod = \"TRACE\"\nhandler = \"echo\"\n");
    assert!(!harness.reload("ping.toml").await);

    assert_eq!(harness.get("/ping").await.status, StatusCode::OK);
    assert_eq!(harness.registry.routes().len(), 1);
}

#[tokio::test]
async fn invalid_descriptors_do_not_mount() {
    let harness = TestHarness::builder()
        .with_plugin("ok.toml", PING)
        .with_plugin("no-path.toml", "handler = \"echo\"\n")
        .with_plugin("no-handler.toml", "path = \"/x\"\n")
        .with_plugin("bad-method.toml", "path = \"/y\"\nmethod = \"TRACE\"\nhandler = \"echo\"\n")
        .build()
        .await
        .unwrap();

    assert_eq!(harness.load_summary.loaded, 1);
    assert_eq!(harness.load_summary.failed, 3);
    assert_eq!(harness.registry.routes().len(), 1);
}

#[tokio::test]
async fn host_paths_cannot_be_claimed() {
    let harness = TestHarness::builder()
        .with_plugin("ping.toml", PING)
        .with_plugin("h.toml", "path = \"/health\"\nhandler = \"echo\"\n")
        .with_plugin(
            "s.toml",
            "path = \"/_hotroute/stats\"\nmethod = \"POST\"\nhandler = \"echo\"\n",
        )
        .build()
        .await
        .unwrap();

    assert_eq!(harness.load_summary.loaded, 1);
    assert_eq!(harness.load_summary.failed, 2);
    assert!(!harness.registry.load("h.toml").await);
    assert!(!harness.registry.load("s.toml").await);
    assert_eq!(harness.registry.routes().len(), 1);

    let health = harness.get("/health").await;
    assert_eq!(health.body["status"], "ok");

    let stats = harness.get("/_hotroute/stats").await.body;
    assert_eq!(stats["totalPlugins"], 1);
    assert_eq!(stats["methodDistribution"], json!({"GET": 1}));
}

#[tokio::test]
async fn repeated_load_keeps_one_route() {
    let harness = TestHarness::builder()
        .with_plugin("ping.toml", PING)
        .build()
        .await
        .unwrap();
    for _ in 0..3 {
        assert!(harness.registry.load("ping.toml").await);
        assert_eq!(harness.registry.routes().len(), 1);
    }
}

#[tokio::test]
async fn route_conflict_rejects_second_file() {
    let harness = TestHarness::builder()
        .with_plugin("a.toml", PING)
        .with_plugin("b.toml", PING)
        .build()
        .await
        .unwrap();
    assert_eq!(harness.load_summary.loaded, 1);
    assert!(harness.registry.get("a.toml").await.is_some());
    assert!(harness.registry.get("b.toml").await.is_none());
}

// ---- Guards ----

#[tokio::test]
async fn authentication_gates_before_validation() {
    let harness = TestHarness::builder()
        .with_bearer_token("s3cret")
        .with_plugin(
            "secure.toml",
            "path = \"/secure\"\nauthentication = true\nhandler = \"echo\"\nparameter = [\"message\"]\n",
        )
        .build()
        .await
        .unwrap();

    let response = harness.get("/secure").await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let request = Request::get("/secure")
        .header("authorization", "Bearer wrong")
        .body(Body::empty())
        .unwrap();
    assert_eq!(harness.request(request).await.status, StatusCode::FORBIDDEN);

    let request = Request::get("/secure")
        .header("authorization", "Bearer s3cret")
        .body(Body::empty())
        .unwrap();
    let response = harness.request(request).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["details"][0], "message is required");

    let request = Request::get("/secure?message=hi")
        .header("authorization", "Bearer s3cret")
        .body(Body::empty())
        .unwrap();
    let response = harness.request(request).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["msg"], "hi");
}

#[tokio::test]
async fn missing_required_url_is_reported() {
    let harness = TestHarness::builder()
        .with_plugin(
            "fetch.toml",
            "path = \"/fetch\"\nhandler = \"mock\"\nparameter = [{ name = \"url\", type = \"url\" }]\n",
        )
        .build()
        .await
        .unwrap();

    let response = harness.get("/fetch").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "Validation failed");
    assert!(response.body["details"][0].as_str().unwrap().contains("url"));

    let response = harness.get("/fetch?url=not%20a%20url").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = harness.get("/fetch?url=https://example.com").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(harness.mock_counters().started(), 1);
}

#[tokio::test(start_paused = true)]
async fn rate_limit_blocks_fourth_request_until_window_passes() {
    let harness = TestHarness::builder()
        .with_plugin(
            "limited.toml",
            "path = \"/limited\"\nhandler = \"echo\"\n[rate_limit]\nlimit = 3\nwindow_ms = 1000\n",
        )
        .build()
        .await
        .unwrap();

    for _ in 0..3 {
        assert_eq!(harness.get("/limited").await.status, StatusCode::OK);
    }
    let response = harness.get("/limited").await;
    assert_eq!(response.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.header("retry-after"), Some("1"));
    assert_eq!(response.body["retryAfter"], 1);

    tokio::time::advance(Duration::from_millis(1001)).await;
    assert_eq!(harness.get("/limited").await.status, StatusCode::OK);
}

#[tokio::test]
async fn rate_limit_is_per_client() {
    let harness = TestHarness::builder()
        .with_plugin(
            "limited.toml",
            "path = \"/limited\"\nhandler = \"echo\"\n[rate_limit]\nlimit = 1\nwindow_ms = 60000\n",
        )
        .build()
        .await
        .unwrap();

    let alice: SocketAddr = "10.0.0.1:4000".parse().unwrap();
    let bob: SocketAddr = "10.0.0.2:4000".parse().unwrap();
    let get = || Request::get("/limited").body(Body::empty()).unwrap();

    assert_eq!(harness.request_from(alice, get()).await.status, StatusCode::OK);
    assert_eq!(
        harness.request_from(alice, get()).await.status,
        StatusCode::TOO_MANY_REQUESTS
    );
    assert_eq!(harness.request_from(bob, get()).await.status, StatusCode::OK);
}

// ---- Execution ----

#[tokio::test(start_paused = true)]
async fn timeout_returns_error_id_and_handler_finishes() {
    let harness = TestHarness::builder()
        .with_plugin(
            "slow.toml",
            "path = \"/slow\"\nhandler = \"mock\"\ntimeout_ms = 50\n[options]\ndelay_ms = 200\n",
        )
        .build()
        .await
        .unwrap();

    let response = harness.get("/slow").await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body["error"], "Internal server error");
    assert!(response.body["errorId"].is_string());
    assert_eq!(harness.mock_counters().completed(), 0);

    // The execution was not cancelled.
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(harness.mock_counters().started(), 1);
    assert_eq!(harness.mock_counters().completed(), 1);
}

#[tokio::test]
async fn handler_error_and_panic_return_error_id() {
    let harness = TestHarness::builder()
        .with_plugin(
            "fail.toml",
            "path = \"/fail\"\nhandler = \"mock\"\n[options]\nfail = \"database unreachable\"\n",
        )
        .with_plugin(
            "panic.toml",
            "path = \"/panic\"\nhandler = \"mock\"\n[options]\npanic = true\n",
        )
        .build()
        .await
        .unwrap();

    for uri in ["/fail", "/panic"] {
        let response = harness.get(uri).await;
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.body["errorId"].is_string());
        // Internal details never reach the client.
        assert!(!response.text.contains("database unreachable"));
    }

    // The host keeps serving after a panic.
    assert_eq!(harness.get("/nope").await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn post_plugin_reads_json_body() {
    let harness = TestHarness::builder()
        .with_plugin(
            "create.toml",
            "path = \"/items\"\nmethod = \"POST\"\nhandler = \"mock\"\nparameter = [{ name = \"title\", type = \"string\", min = 3 }]\n",
        )
        .build()
        .await
        .unwrap();

    let response = harness
        .send_json("POST", "/items", &json!({"title": "ab"}), None)
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["details"][0], "title must be at least 3 characters");

    let response = harness
        .send_json("POST", "/items", &json!({"title": "abc"}), None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["params"]["title"], "abc");
}

// ---- Introspection ----

#[tokio::test]
async fn health_aggregation_reports_failing_checks() {
    let harness = TestHarness::builder()
        .with_plugin("ping.toml", PING)
        .with_plugin(
            "sick.toml",
            "path = \"/sick\"\nhandler = \"mock\"\n[options]\nunhealthy = \"disk full\"\n",
        )
        .with_plugin(
            "broken.toml",
            "path = \"/broken\"\nhandler = \"mock\"\n[options]\nhealth_error = \"probe crashed\"\n",
        )
        .build()
        .await
        .unwrap();

    let response = harness.get("/_hotroute/health").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["ping.toml"], json!({"status": "ok"}));
    assert_eq!(response.body["sick.toml"]["status"], "error");
    assert_eq!(response.body["sick.toml"]["message"], "disk full");
    assert_eq!(response.body["broken.toml"]["status"], "error");
    assert!(response.body["broken.toml"]["message"]
        .as_str()
        .unwrap()
        .contains("probe crashed"));
}

#[tokio::test]
async fn stats_follow_reloads_and_removals() {
    let harness = TestHarness::builder()
        .with_plugin("ping.toml", PING)
        .with_plugin(
            "users.toml",
            "path = \"/users\"\nmethod = \"POST\"\nauthentication = true\ndeprecated = true\nhandler = \"echo\"\n",
        )
        .build()
        .await
        .unwrap();

    let stats = harness.get("/_hotroute/stats").await.body;
    assert_eq!(stats["totalPlugins"], 2);
    assert_eq!(stats["authRequiredCount"], 1);
    assert_eq!(stats["deprecatedCount"], 1);

    harness.remove_plugin("users.toml");
    assert!(harness.registry.unregister("users.toml").await);

    let stats = harness.get("/_hotroute/stats").await.body;
    assert_eq!(stats["totalPlugins"], 1);
    assert_eq!(stats["totalEndpoints"], 1);
    assert_eq!(stats["methodDistribution"], json!({"GET": 1}));
}

// ---- Hot reload ----

async fn wait_for(harness: &TestHarness, uri: &str, status: StatusCode) -> bool {
    for _ in 0..100 {
        if harness.get(uri).await.status == status {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn watcher_applies_create_change_and_remove() {
    let harness = TestHarness::builder().build().await.unwrap();
    let cancel = CancellationToken::new();
    let task = spawn_hot_reload(
        Arc::clone(&harness.registry),
        WatcherConfig::new(harness.plugin_dir()).with_debounce(Duration::from_millis(50)),
        cancel.clone(),
    )
    .expect("watcher starts on an existing directory");

    harness.write_plugin("ping.toml", PING);
    assert!(wait_for(&harness, "/ping", StatusCode::OK).await);

    harness.write_plugin("ping.toml", "path = \"/pong\"\nhandler = \"echo\"\n");
    assert!(wait_for(&harness, "/pong", StatusCode::OK).await);
    assert_eq!(harness.get("/ping").await.status, StatusCode::NOT_FOUND);

    harness.remove_plugin("ping.toml");
    assert!(wait_for(&harness, "/pong", StatusCode::NOT_FOUND).await);
    assert!(harness.registry.is_empty().await);

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("hot reload stops on cancel")
        .unwrap();
}
