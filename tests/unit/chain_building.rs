use crate::common::*;
use bitcoin::Amount;
use rbf_chain_lab::engine::state::PARENT_OUTPUT_INDEX;
use rbf_chain_lab::engine::RbfEngine;
use rbf_chain_lab::errors::{EngineError, ErrorClass, ErrorKind, RpcError};

/// Tests for `create_parent` and `create_child`
///
/// Fee arithmetic is checked against the amounts recorded in the scripted
/// node's `createrawtransaction` calls.

const RBF_SEQUENCE: u64 = 0xfffffffd;

async fn create_standard_parent(engine: &mut RbfEngine<MockNode>) -> Result<bitcoin::Txid, EngineError> {
    engine
        .create_parent(
            UTXO_TXID,
            0,
            Amount::from_sat(UTXO_VALUE_SATS),
            CHANGE_ADDR,
            PRIV_KEY,
            false,
        )
        .await
}

#[tokio::test]
async fn test_parent_fee_is_one_sat_per_vbyte() {
    let node = MockNode::new();
    let mut engine = connected_engine(&node).await;

    let txid = create_standard_parent(&mut engine).await.unwrap();

    let creates = node.calls_to("createrawtransaction");
    assert_eq!(creates.len(), 2);
    assert_eq!(output_sats(&creates[0], CHANGE_ADDR), UTXO_VALUE_SATS);
    assert_eq!(output_sats(&creates[1], CHANGE_ADDR), UTXO_VALUE_SATS - DEFAULT_VSIZE);

    let parent = engine.state().parent.as_ref().unwrap();
    assert_eq!(parent.tx.txid, txid);
    assert_eq!(parent.tx.fee, Amount::from_sat(DEFAULT_VSIZE));
    assert_eq!(parent.tx.vsize, DEFAULT_VSIZE);
    assert_eq!(parent.amount, Amount::from_sat(UTXO_VALUE_SATS - DEFAULT_VSIZE));
    assert_eq!(parent.vout, PARENT_OUTPUT_INDEX);
    assert_eq!(engine.state().parent_vout(), 0);
    assert!(!parent.tx.broadcast);
}

#[tokio::test]
async fn test_parent_call_sequence() {
    let node = MockNode::new();
    let mut engine = connected_engine(&node).await;

    create_standard_parent(&mut engine).await.unwrap();

    assert_eq!(
        node.methods(),
        vec![
            "createrawtransaction",
            "signrawtransactionwithkey",
            "decoderawtransaction",
            "getrawtransaction",
            "createrawtransaction",
            "signrawtransactionwithkey",
            "decoderawtransaction",
        ]
    );

    let signs = node.calls_to("signrawtransactionwithkey");
    assert_eq!(signs[0][1], serde_json::json!([PRIV_KEY]));
}

#[tokio::test]
async fn test_parent_fee_scales_with_vsize() {
    let node = MockNode::new().with_vsize(141);
    let mut engine = connected_engine(&node).await;

    create_standard_parent(&mut engine).await.unwrap();

    let parent = engine.state().parent.as_ref().unwrap();
    assert_eq!(parent.tx.fee, Amount::from_sat(141));
    assert_eq!(parent.amount, Amount::from_sat(UTXO_VALUE_SATS - 141));
}

#[tokio::test]
async fn test_parent_change_uses_chain_value_not_caller_amount() {
    let node = MockNode::new();
    let mut engine = connected_engine(&node).await;

    engine
        .create_parent(
            UTXO_TXID,
            0,
            Amount::from_sat(250_000),
            CHANGE_ADDR,
            PRIV_KEY,
            false,
        )
        .await
        .unwrap();

    let creates = node.calls_to("createrawtransaction");
    assert_eq!(output_sats(&creates[0], CHANGE_ADDR), 250_000);
    assert_eq!(output_sats(&creates[1], CHANGE_ADDR), UTXO_VALUE_SATS - DEFAULT_VSIZE);
}

#[tokio::test]
async fn test_every_input_opts_into_rbf() {
    let node = MockNode::new();
    let mut engine = connected_engine(&node).await;

    build_chain(&mut engine).await;

    let creates = node.calls_to("createrawtransaction");
    assert_eq!(creates.len(), 4);
    for params in creates {
        for input in params[0].as_array().unwrap() {
            assert_eq!(input["sequence"].as_u64(), Some(RBF_SEQUENCE));
        }
    }
}

#[tokio::test]
async fn test_child_before_parent_is_sequence_error() {
    let node = MockNode::new();
    let mut engine = connected_engine(&node).await;

    let err = engine
        .create_child(TARGET_ADDR, PRIV_KEY, false)
        .await
        .unwrap_err();

    assert_eq!(err, EngineError::Sequence("No Parent TX Created yet".to_string()));
    assert_eq!(err.kind(), ErrorKind::SequenceError);
    assert_eq!(err.class(), ErrorClass::Precondition);
    assert!(node.calls().is_empty());
    assert!(log_contains(&engine, "No Parent TX Created yet"));
}

#[tokio::test]
async fn test_child_before_parent_without_connection() {
    let mut engine: RbfEngine<MockNode> = RbfEngine::new();

    let err = engine
        .create_child(TARGET_ADDR, PRIV_KEY, false)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::SequenceError);
    assert!(matches!(err, EngineError::Sequence(_)));
}

#[tokio::test]
async fn test_child_spends_parent_output_at_ten_sat_per_vbyte() {
    let node = MockNode::new();
    let mut engine = connected_engine(&node).await;
    create_standard_parent(&mut engine).await.unwrap();
    let parent_txid = engine.state().parent_txid().unwrap();
    node.clear_calls();

    let child_txid = engine.create_child(TARGET_ADDR, PRIV_KEY, false).await.unwrap();

    let creates = node.calls_to("createrawtransaction");
    assert_eq!(creates.len(), 2);
    for params in &creates {
        let input = &params[0][0];
        assert_eq!(input["txid"], parent_txid.to_string());
        assert_eq!(input["vout"], 0);
    }

    let parent_amount = UTXO_VALUE_SATS - DEFAULT_VSIZE;
    assert_eq!(output_sats(&creates[0], TARGET_ADDR), parent_amount);
    assert_eq!(
        output_sats(&creates[1], TARGET_ADDR),
        parent_amount - 10 * DEFAULT_VSIZE
    );

    // The child never looks the parent up on chain: it is unconfirmed
    assert!(node.calls_to("getrawtransaction").is_empty());

    let child = engine.state().child.as_ref().unwrap();
    assert_eq!(child.txid, child_txid);
    assert_eq!(child.fee, Amount::from_sat(10 * DEFAULT_VSIZE));
    assert!(log_contains(&engine, "Dependency Established"));
}

#[tokio::test]
async fn test_incomplete_signature_is_signing_error() {
    let node = MockNode::new().with_incomplete_signing();
    let mut engine = connected_engine(&node).await;

    let err = create_standard_parent(&mut engine).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::SigningError);
    assert!(err.to_string().contains("Check private key"));
    assert!(engine.state().parent.is_none());
    assert!(log_contains(&engine, "Error creating Parent"));
}

#[tokio::test]
async fn test_fee_exceeding_input_is_chain_build_error() {
    let dust_txid = "b".repeat(64);
    let node = MockNode::new().with_utxo(&dust_txid, vec![0.000001]);
    let mut engine = connected_engine(&node).await;

    let err = engine
        .create_parent(
            &dust_txid,
            0,
            Amount::from_sat(100),
            CHANGE_ADDR,
            PRIV_KEY,
            false,
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ChainBuildError);
    assert!(engine.state().parent.is_none());
}

#[tokio::test]
async fn test_missing_output_index_is_chain_build_error() {
    let node = MockNode::new();
    let mut engine = connected_engine(&node).await;

    let err = engine
        .create_parent(
            UTXO_TXID,
            5,
            Amount::from_sat(UTXO_VALUE_SATS),
            CHANGE_ADDR,
            PRIV_KEY,
            false,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::ChainBuild(ref msg) if msg.contains("Output 5")));
}

#[tokio::test]
async fn test_malformed_utxo_txid_makes_no_calls() {
    let node = MockNode::new();
    let mut engine = connected_engine(&node).await;

    let err = engine
        .create_parent(
            "not-a-txid",
            0,
            Amount::from_sat(UTXO_VALUE_SATS),
            CHANGE_ADDR,
            PRIV_KEY,
            false,
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ChainBuildError);
    assert!(node.calls().is_empty());
}

#[tokio::test]
async fn test_node_rejection_propagates() {
    let node = MockNode::new();
    node.fail_method_after(
        "createrawtransaction",
        0,
        RpcError::Rejected {
            method: "createrawtransaction".to_string(),
            code: Some(-5),
            message: "Invalid Bitcoin address".to_string(),
        },
    );
    let mut engine = connected_engine(&node).await;

    let err = create_standard_parent(&mut engine).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RpcError);
    assert_eq!(err.class(), ErrorClass::Rejected);
    assert!(log_contains(&engine, "Invalid Bitcoin address"));
}

#[tokio::test]
async fn test_v3_flag_only_adds_commentary() {
    let node = MockNode::new();
    let mut engine = connected_engine(&node).await;

    engine
        .create_parent(
            UTXO_TXID,
            0,
            Amount::from_sat(UTXO_VALUE_SATS),
            CHANGE_ADDR,
            PRIV_KEY,
            true,
        )
        .await
        .unwrap();

    assert!(log_contains(&engine, "TRUC (V3)"));
    assert!(log_contains(&engine, "pinning"));
    assert!(log_contains(&engine, "encodes version 2"));

    // createrawtransaction is called exactly as for version 2
    for params in node.calls_to("createrawtransaction") {
        assert_eq!(params.len(), 2);
    }
}
