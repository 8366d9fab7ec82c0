//! Reader end to end: filter lifecycle, dedup and timeouts over real HTTP.

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;
use whisper_client::{ClientError, HttpTransport, ReadTimeout, Reader, ReaderConfig, TransportError};
use whisper_protocol::Topic;

use crate::harness::{message, FakeNode, Reply};

const INTERVAL: Duration = Duration::from_millis(5);

fn topics() -> Vec<Topic> {
    vec![Topic::from_text("micropayment"), Topic::from_text("handout")]
}

#[tokio::test]
async fn test_filter_expiry_and_payload_decode() {
    let node = FakeNode::start(
        vec![
            Reply::Result(json!("0xf1")),
            Reply::Result(json!([])),
            Reply::NoResult, // filter expired
            Reply::Result(json!("0xf2")),
            Reply::Result(json!([message("0x01", "0x1234")])),
        ],
        Reply::Result(json!([])),
    )
    .await
    .unwrap();
    let transport = HttpTransport::new(node.url.clone()).unwrap();
    let mut reader = Reader::new(transport, topics()).unwrap();

    let msgs = reader.read(INTERVAL, ReadTimeout::Never).await.unwrap();
    assert_eq!(msgs.len(), 1);
    assert_eq!(msgs[0].payload, vec![0x12, 0x34]);

    assert_eq!(
        node.methods(),
        vec![
            "shh_newFilter",
            "shh_getMessages",
            "shh_getMessages",
            "shh_newFilter",
            "shh_getMessages"
        ]
    );

    let requests = node.requests();
    assert_eq!(
        requests[0]["params"],
        json!([{ "topics": ["0x6d6963726f7061796d656e74", "0x68616e646f7574"] }])
    );
    assert_eq!(requests[0]["params"], requests[3]["params"]);
    assert_eq!(requests[4]["params"], json!(["0xf2"]));

    node.shutdown().await;
}

#[tokio::test]
async fn test_redelivered_message_suppressed() {
    let m = message("0x01", "0x00");
    let node = FakeNode::start(
        vec![
            Reply::Result(json!("0xf1")),
            Reply::Result(json!([m.clone()])),
        ],
        Reply::Result(json!([m])),
    )
    .await
    .unwrap();
    let transport = HttpTransport::new(node.url.clone()).unwrap();
    let mut reader = Reader::new(transport, topics()).unwrap();

    assert_eq!(reader.read(INTERVAL, ReadTimeout::Never).await.unwrap().len(), 1);

    let again = reader
        .read(INTERVAL, ReadTimeout::After(Duration::from_millis(50)))
        .await
        .unwrap();
    assert!(again.is_empty());
    assert!(node.count("shh_getMessages") >= 2);

    node.shutdown().await;
}

#[tokio::test]
async fn test_timeout_zero_returns_empty() {
    let node = FakeNode::start(
        vec![Reply::Result(json!("0xf1"))],
        Reply::Result(json!([])),
    )
    .await
    .unwrap();
    let transport = HttpTransport::new(node.url.clone()).unwrap();
    let mut reader = Reader::new(transport, topics()).unwrap();

    let msgs = reader.read(INTERVAL, ReadTimeout::from_secs(0)).await.unwrap();
    assert!(msgs.is_empty());
    assert!(node.count("shh_getMessages") <= 1);

    node.shutdown().await;
}

#[tokio::test]
async fn test_malformed_payload_fails_read() {
    let node = FakeNode::start(
        vec![
            Reply::Result(json!("0xf1")),
            Reply::Result(json!([message("0x01", "0xnothex")])),
        ],
        Reply::Result(json!([])),
    )
    .await
    .unwrap();
    let transport = HttpTransport::new(node.url.clone()).unwrap();
    let mut reader = Reader::new(transport, topics()).unwrap();

    match reader.read(INTERVAL, ReadTimeout::Never).await {
        Err(ClientError::Transport(TransportError::Decode { body, .. })) => {
            assert!(body.contains("0xnothex"));
        }
        other => panic!("expected decode error, got {other:?}"),
    }

    node.shutdown().await;
}

#[tokio::test]
async fn test_poll_status_error_propagates() {
    let node = FakeNode::start(
        vec![
            Reply::Result(json!("0xf1")),
            Reply::Raw(StatusCode::INTERNAL_SERVER_ERROR, "boom".into()),
        ],
        Reply::Result(json!([])),
    )
    .await
    .unwrap();
    let transport = HttpTransport::new(node.url.clone()).unwrap();
    let mut reader = Reader::new(transport, topics()).unwrap();

    assert!(matches!(
        reader.read(INTERVAL, ReadTimeout::Never).await,
        Err(ClientError::Transport(TransportError::Status { status: 500, .. }))
    ));

    node.shutdown().await;
}

#[tokio::test]
async fn test_reader_from_config() {
    let node = FakeNode::start(
        vec![
            Reply::Result(json!("0xf1")),
            Reply::Result(json!([message("0x01", "0x68656c6c6f")])),
        ],
        Reply::Result(json!([])),
    )
    .await
    .unwrap();

    let toml_str = format!(
        "[node]\nurl = \"{}\"\n\n[reader]\ntext_topics = [\"micropayment\"]\npoll_interval_ms = 5\nread_timeout_secs = 5\n",
        node.url
    );
    let cfg: ReaderConfig = toml::from_str(&toml_str).unwrap();
    let mut reader = Reader::from_config(&cfg).unwrap();

    let msgs = reader
        .read(cfg.reader.poll_interval(), cfg.reader.read_timeout())
        .await
        .unwrap();
    assert_eq!(msgs[0].payload, b"hello");
    assert_eq!(
        node.requests()[0]["params"],
        json!([{ "topics": ["0x6d6963726f7061796d656e74"] }])
    );

    node.shutdown().await;
}

#[tokio::test]
async fn test_config_topics_reach_node_once_each() {
    let node = FakeNode::start(
        vec![
            Reply::Result(json!("0xf1")),
            Reply::Result(json!([message("0x01", "0x00")])),
        ],
        Reply::Result(json!([])),
    )
    .await
    .unwrap();

    let toml_str = format!(
        "[node]\nurl = \"{}\"\n\n[reader]\ntopics = [\"0xdeadbeef\", \"0x6869\"]\ntext_topics = [\"hi\"]\npoll_interval_ms = 5\n",
        node.url
    );
    let cfg: ReaderConfig = toml::from_str(&toml_str).unwrap();
    let mut reader = Reader::from_config(&cfg).unwrap();
    assert_eq!(reader.topics(), &[Topic::raw("0xdeadbeef"), Topic::raw("0x6869")]);

    reader.read(INTERVAL, ReadTimeout::Never).await.unwrap();
    assert_eq!(
        node.requests()[0]["params"],
        json!([{ "topics": ["0xdeadbeef", "0x6869"] }])
    );

    node.shutdown().await;
}
