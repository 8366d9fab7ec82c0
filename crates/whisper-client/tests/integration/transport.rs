//! HttpTransport against the fake node: envelope, status and decode handling.

use axum::http::StatusCode;
use serde_json::{json, Value};
use whisper_client::{has_identity, new_identity, post_message, HttpTransport, Transport, TransportError};
use whisper_protocol::{IncomingResponse, Method};

use crate::harness::{FakeNode, Reply};

#[tokio::test]
async fn test_request_envelope() {
    let node = FakeNode::start(vec![], Reply::Result(json!(true))).await.unwrap();
    let transport = HttpTransport::new(node.url.clone()).unwrap();

    transport
        .send(Method::HasIdentity, vec![json!("0xabc")], None)
        .await
        .unwrap();
    transport
        .send(Method::HasIdentity, vec![json!("0xabc")], None)
        .await
        .unwrap();

    let requests = node.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0]["jsonrpc"], "2.0");
    assert_eq!(requests[0]["method"], "shh_hasIdentity");
    assert_eq!(requests[0]["params"], json!(["0xabc"]));
    assert_ne!(requests[0]["id"], requests[1]["id"], "fresh correlation id per call");

    node.shutdown().await;
}

#[tokio::test]
async fn test_bool_result_selected_over_generic() {
    let node = FakeNode::start(vec![], Reply::Result(json!(false))).await.unwrap();
    let transport = HttpTransport::new(node.url.clone()).unwrap();

    let resp = transport.send(Method::HasIdentity, vec![], None).await.unwrap();
    assert_eq!(resp, IncomingResponse::Bool(false));
    assert!(!has_identity(&transport, "0xabc").await.unwrap());

    node.shutdown().await;
}

#[tokio::test]
async fn test_non_ok_status_is_transport_error() {
    let node = FakeNode::start(
        vec![],
        Reply::Raw(StatusCode::SERVICE_UNAVAILABLE, "node syncing".into()),
    )
    .await
    .unwrap();
    let transport = HttpTransport::new(node.url.clone()).unwrap();

    match transport.send(Method::NewFilter, vec![], None).await {
        Err(TransportError::Status { method, status, body }) => {
            assert_eq!(method, Method::NewFilter);
            assert_eq!(status, 503);
            assert_eq!(body, "node syncing");
        }
        other => panic!("expected status error, got {other:?}"),
    }
    // Not retried by the transport
    assert_eq!(node.requests().len(), 1);

    node.shutdown().await;
}

#[tokio::test]
async fn test_undecodable_body_carries_content() {
    let node = FakeNode::start(vec![], Reply::Raw(StatusCode::OK, "{\"jsonrpc\":".into()))
        .await
        .unwrap();
    let transport = HttpTransport::new(node.url.clone()).unwrap();

    match transport.send(Method::GetMessages, vec![], None).await {
        Err(TransportError::Decode { body, .. }) => assert_eq!(body, "{\"jsonrpc\":"),
        other => panic!("expected decode error, got {other:?}"),
    }

    node.shutdown().await;
}

#[tokio::test]
async fn test_unreachable_node_is_network_error() {
    // Bind and drop to get a port nothing listens on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/", listener.local_addr().unwrap());
    drop(listener);

    let transport = HttpTransport::new(url).unwrap();
    assert!(matches!(
        transport.send(Method::Post, vec![], None).await,
        Err(TransportError::Network { method: Method::Post, .. })
    ));
}

#[tokio::test]
async fn test_new_identity_and_post() {
    let node = FakeNode::start(
        vec![Reply::Result(json!("0x04beef")), Reply::Result(json!(true))],
        Reply::NoResult,
    )
    .await
    .unwrap();
    let transport = HttpTransport::new(node.url.clone()).unwrap();

    assert_eq!(new_identity(&transport).await.unwrap(), "0x04beef");

    let params = vec![json!({ "from": "0x04beef", "topics": ["0x6869"], "payload": "0x00", "ttl": "0x32", "priority": "0x01" })];
    post_message(&transport, params.clone(), None).await.unwrap();

    let requests = node.requests();
    assert_eq!(node.methods(), vec!["shh_newIdentity", "shh_post"]);
    assert_eq!(requests[0]["params"], Value::Array(vec![]));
    assert_eq!(requests[1]["params"], Value::Array(params));

    node.shutdown().await;
}
