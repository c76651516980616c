use crate::common::*;
use anyhow::Result;
use bitcoin::Amount;
use rbf_chain_lab::engine::{LogLevel, RbfEngine, TxStatus, WalletStatus};

#[tokio::test]
async fn test_full_replace_by_fee_session() -> Result<()> {
    let node = MockNode::new();
    let mut engine = RbfEngine::new();

    assert!(engine.connect_with(node.clone()).await);

    let parent = engine
        .create_parent(
            UTXO_TXID,
            0,
            Amount::from_sat(UTXO_VALUE_SATS),
            CHANGE_ADDR,
            PRIV_KEY,
            false,
        )
        .await?;
    let child = engine.create_child(TARGET_ADDR, PRIV_KEY, false).await?;

    let receipt = engine.broadcast_chain().await?;
    assert_eq!((receipt.parent, receipt.child), (parent, child));

    let before = engine.check_status().await;
    assert_eq!(before.parent, TxStatus::Mempool);
    assert_eq!(before.child, TxStatus::Mempool);
    assert_eq!(before.replacement, TxStatus::NotCreated);
    assert_eq!(before.wallet_c, WalletStatus::PendingIncoming);

    let replacement = engine
        .cancel_parent(UTXO_TXID, 0, REFUND_ADDR, PRIV_KEY)
        .await?;
    assert_ne!(replacement, parent);

    let after = engine.check_status().await;
    assert_eq!(after.parent, TxStatus::EvictedOrMissing);
    assert_eq!(after.child, TxStatus::EvictedOrMissing);
    assert_eq!(after.replacement, TxStatus::Mempool);
    assert_eq!(after.wallet_c, WalletStatus::BlockedOrphaned);

    // Fee ladder: 1, 10 and 20 sat/vB on the same 110 vbyte drafts
    let state = engine.state();
    let parent_leg = state.parent.as_ref().expect("parent recorded");
    let child_leg = state.child.as_ref().expect("child recorded");
    let replacement_leg = state.replacement.as_ref().expect("replacement recorded");
    assert_eq!(parent_leg.tx.fee, Amount::from_sat(110));
    assert_eq!(parent_leg.amount, Amount::from_sat(99_890));
    assert_eq!(child_leg.fee, Amount::from_sat(1_100));
    assert_eq!(replacement_leg.fee, Amount::from_sat(2_200));
    assert!(parent_leg.tx.broadcast && child_leg.broadcast && replacement_leg.broadcast);

    let creates = node.calls_to("createrawtransaction");
    assert_eq!(output_sats(creates.last().expect("replacement draft"), REFUND_ADDR), 97_800);

    assert_eq!(state.log.failures().count(), 0);
    let steps: Vec<&str> = engine
        .logs()
        .iter()
        .filter(|entry| entry.message.starts_with("--- Step"))
        .map(|entry| entry.message.as_str())
        .collect();
    assert_eq!(steps.len(), 4);
    assert!(steps[0].contains("Parent"));
    assert!(steps[3].contains("RBF"));

    Ok(())
}

#[tokio::test]
async fn test_session_recovers_after_out_of_order_calls() -> Result<()> {
    let node = MockNode::new();
    let mut engine: RbfEngine<MockNode> = RbfEngine::new();

    assert!(engine.create_child(TARGET_ADDR, PRIV_KEY, false).await.is_err());
    assert!(engine.broadcast_chain().await.is_err());
    assert!(engine.connect_with(node.clone()).await);
    assert!(engine.broadcast_chain().await.is_err());

    build_chain(&mut engine).await;
    engine.broadcast_chain().await?;

    let report = engine.check_status().await;
    assert_eq!(report.wallet_c, WalletStatus::PendingIncoming);

    let failures: Vec<_> = engine.state().log.failures().collect();
    assert_eq!(failures.len(), 3);
    assert!(failures.iter().all(|entry| entry.level == LogLevel::Failure));
    Ok(())
}

#[tokio::test]
async fn test_session_state_serialises() -> Result<()> {
    let node = MockNode::new();
    let mut engine = connected_engine(&node).await;
    let (parent, child) = build_chain(&mut engine).await;
    engine.broadcast_chain().await?;

    let value = serde_json::to_value(engine.state())?;

    assert_eq!(value["connected"], true);
    assert_eq!(value["node_version"], NODE_VERSION);
    assert_eq!(value["parent"]["txid"], parent.to_string());
    assert_eq!(value["parent"]["amount"], 99_890);
    assert_eq!(value["parent"]["broadcast"], true);
    assert_eq!(value["child"]["txid"], child.to_string());
    assert_eq!(value["child"]["fee"], 1_100);
    assert!(value["replacement"].is_null());
    assert!(value["log"].as_array().map_or(false, |log| !log.is_empty()));

    let report = serde_json::to_value(engine.check_status().await)?;
    assert_eq!(report["parent"], "Mempool");
    assert_eq!(report["wallet_c"], "Pending (Incoming)");
    Ok(())
}
