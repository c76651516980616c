use crate::common::*;
use bitcoin::Amount;
use rbf_chain_lab::engine::{LogLevel, RbfEngine};
use rbf_chain_lab::errors::{EngineError, ErrorKind};
use rbf_chain_lab::rpc::NodeClient;

/// Tests for `connect` and the not-connected preconditions
///
/// Driven by the scripted node; the last test uses the real JSON-RPC client
/// against a closed local port.

#[tokio::test]
async fn test_connect_records_node_version() {
    let node = MockNode::new();
    let mut engine = RbfEngine::new();

    assert!(engine.connect_with(node.clone()).await);
    assert!(engine.is_connected());
    assert!(engine.state().connected);
    assert_eq!(engine.state().node_version, Some(NODE_VERSION));
    assert!(log_contains(&engine, "Version: 270000"));
    assert_eq!(node.methods(), vec!["getnetworkinfo"]);
}

#[tokio::test]
async fn test_connect_failure_is_logged_not_raised() {
    let node = MockNode::new();
    node.go_offline();
    let mut engine = RbfEngine::new();

    assert!(!engine.connect_with(node).await);
    assert!(!engine.is_connected());
    assert!(engine.client().is_none());

    let last = engine.logs().last().unwrap();
    assert_eq!(last.level, LogLevel::Failure);
    assert!(last.message.contains("Connection Error"));
    assert!(last.message.contains("127.0.0.1:18443"));
}

#[tokio::test]
async fn test_reconnect_keeps_chain_state() {
    let node = MockNode::new();
    let mut engine = connected_engine(&node).await;
    let (parent, child) = build_chain(&mut engine).await;

    // A failed reconnect drops the handle but not the chain
    let offline = MockNode::new();
    offline.go_offline();
    assert!(!engine.connect_with(offline).await);
    assert_eq!(engine.state().parent_txid(), Some(parent));
    assert_eq!(engine.state().child_txid(), Some(child));

    // A successful reconnect does not reset it either
    assert!(engine.connect_with(node.clone()).await);
    assert_eq!(engine.state().parent_txid(), Some(parent));
    assert_eq!(engine.state().child_txid(), Some(child));
}

#[tokio::test]
async fn test_operations_require_connection() {
    let mut engine: RbfEngine<MockNode> = RbfEngine::new();

    let err = engine
        .create_parent(
            UTXO_TXID,
            0,
            Amount::from_sat(UTXO_VALUE_SATS),
            CHANGE_ADDR,
            PRIV_KEY,
            false,
        )
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::NotConnected);
    assert_eq!(err.kind(), ErrorKind::SequenceError);

    let err = engine
        .cancel_parent(UTXO_TXID, 0, REFUND_ADDR, PRIV_KEY)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::NotConnected);

    assert_eq!(engine.state().log.failures().count(), 2);
    assert!(log_contains(&engine, "Error creating Parent"));
    assert!(log_contains(&engine, "RBF Error"));
}

#[tokio::test]
async fn test_real_client_reports_unreachable_node() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let mut engine: RbfEngine<NodeClient> = RbfEngine::new();
    assert!(!engine.connect("bitcoin", "bitcoin", "127.0.0.1", port).await);

    let last = engine.logs().last().unwrap();
    assert_eq!(last.level, LogLevel::Failure);
    assert!(last.message.contains(&format!("127.0.0.1:{}", port)));
}
