//! Integration tests for the batch move protocol
//!
//! **Coverage:**
//! - Envelope shape: one `item_move` command per id, unique operation ids
//! - Limit enforcement before any network activity
//! - Partial failure, empty result and result filtering
//! - Idempotency token forwarding on the sync origin
//!
//! **Infrastructure:**
//! - WireMock HTTP server answering with a status map built from the
//!   submitted commands

#![allow(dead_code)]

#[path = "support.rs"]
mod support;

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::{json, Map, Value};
use support::{executor_with, ScriptedTransport};
use tasklink_domain::{ClientConfig, ErrorKind, MoveTarget};
use tasklink_infra::{RetryPolicy, SyncBatchClient, TaskClient};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn client_for(server: &MockServer) -> TaskClient {
    let config = ClientConfig {
        api_token: Some("token".to_string()),
        rest_base_url: format!("{}/rest/v2/", server.uri()),
        sync_base_url: format!("{}/sync/v9/", server.uri()),
        ..Default::default()
    };
    TaskClient::builder()
        .config(config)
        .retry_policy(RetryPolicy::immediate(3))
        .build()
        .expect("client should build")
}

fn submitted_commands(req: &Request) -> Vec<Value> {
    let body: Value = serde_json::from_slice(&req.body).expect("request body is JSON");
    body["commands"].as_array().cloned().unwrap_or_default()
}

/// Answer every command with `ok`, returning the requested items plus `extra`.
fn echo_items(
    extra: &'static [&'static str],
) -> impl Fn(&Request) -> ResponseTemplate + Send + Sync + 'static {
    move |req: &Request| {
        let commands = submitted_commands(req);
        let mut status = Map::new();
        let mut items = Vec::new();
        for command in &commands {
            status.insert(command["uuid"].as_str().unwrap().to_string(), json!("ok"));
            items.push(json!({
                "id": command["args"]["id"],
                "content": "moved",
                "project_id": command["args"]["project_id"],
            }));
        }
        for id in extra {
            items.push(json!({"id": id, "content": "unrelated"}));
        }
        ResponseTemplate::new(200).set_body_json(json!({"items": items, "sync_status": status}))
    }
}

#[tokio::test]
async fn moves_tasks_in_one_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sync/v9/sync"))
        .and(header("authorization", "Bearer token"))
        .respond_with(echo_items(&[]))
        .expect(1)
        .mount(&server)
        .await;

    let moved = client_for(&server)
        .move_tasks(&["1", "2"], &MoveTarget::Project("p9".into()), None)
        .await
        .expect("move should succeed");

    let ids: Vec<&str> = moved.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2"]);
    assert_eq!(moved[0].project_id.as_deref(), Some("p9"));

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["resource_types"], json!(["items"]));

    let commands = body["commands"].as_array().unwrap();
    assert_eq!(commands.len(), 2);
    for command in commands {
        assert_eq!(command["type"], json!("item_move"));
        assert_eq!(command["args"]["project_id"], json!("p9"));
    }
    assert!(requests[0].headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn full_batch_uses_distinct_operation_ids() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(echo_items(&[]))
        .expect(1)
        .mount(&server)
        .await;

    let ids: Vec<String> = (0..100).map(|i| format!("t{i}")).collect();
    let moved = client_for(&server)
        .move_tasks(&ids, &MoveTarget::Section("s1".into()), None)
        .await
        .unwrap();
    assert_eq!(moved.len(), 100);

    let requests = server.received_requests().await.unwrap();
    let commands = submitted_commands(&requests[0]);
    let uuids: HashSet<&str> = commands.iter().map(|c| c["uuid"].as_str().unwrap()).collect();
    assert_eq!(uuids.len(), 100);
}

#[tokio::test]
async fn more_than_one_hundred_ids_fail_without_network() {
    let transport = ScriptedTransport::flaky(0, "{}");
    let batch = SyncBatchClient::new(
        Arc::new(executor_with(Arc::clone(&transport))),
        "https://api.example.test/sync/v9/",
        None,
    );

    let ids: Vec<String> = (0..101).map(|i| i.to_string()).collect();
    let err = batch.move_many(&ids, &MoveTarget::Parent("x".into()), None).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn command_error_fails_the_whole_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(|req: &Request| {
            let commands = submitted_commands(req);
            let mut status = Map::new();
            for (i, command) in commands.iter().enumerate() {
                let uuid = command["uuid"].as_str().unwrap().to_string();
                let entry = if i == 1 {
                    json!({"error": "Invalid parent", "error_code": 31, "http_code": 400,
                           "error_extra": {"retry_after": 0}})
                } else {
                    json!("ok")
                };
                status.insert(uuid, entry);
            }
            ResponseTemplate::new(200)
                .set_body_json(json!({"items": [{"id": "1"}], "sync_status": status}))
        })
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server)
        .move_tasks(&["1", "2", "3"], &MoveTarget::Parent("p".into()), None)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Batch);
    assert_eq!(err.message(), "Invalid parent");
    assert_eq!(err.http_status_code(), Some(400));
    let context = err.response_data().unwrap();
    assert_eq!(context["errorCode"], json!(31));
    assert_eq!(context["errorExtra"], json!({"retryAfter": 0}));
}

#[tokio::test]
async fn missing_items_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(|req: &Request| {
            let status: Map<String, Value> = submitted_commands(req)
                .iter()
                .map(|c| (c["uuid"].as_str().unwrap().to_string(), json!("ok")))
                .collect();
            ResponseTemplate::new(200).set_body_json(json!({"sync_status": status}))
        })
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server)
        .move_tasks(&["1"], &MoveTarget::Project("p".into()), None)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn unrequested_items_are_filtered_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(echo_items(&["999"]))
        .expect(1)
        .mount(&server)
        .await;

    let moved = client_for(&server)
        .move_tasks(&["1"], &MoveTarget::Project("p".into()), None)
        .await
        .unwrap();

    assert_eq!(moved.len(), 1);
    assert_eq!(moved[0].id, "1");
}

#[tokio::test]
async fn caller_request_id_is_forwarded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("x-request-id", "move-123"))
        .respond_with(echo_items(&[]))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .move_tasks(&["1"], &MoveTarget::Project("p".into()), Some("move-123".into()))
        .await
        .unwrap();
}

#[tokio::test]
async fn http_error_from_sync_endpoint_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"error": "Forbidden"})))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server)
        .move_tasks(&["1"], &MoveTarget::Project("p".into()), None)
        .await
        .unwrap_err();

    assert!(err.is_auth_error());
    assert_eq!(err.kind(), ErrorKind::Http);
}
