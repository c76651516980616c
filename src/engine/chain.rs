//! Parent → child → broadcast → cancel operations and status polling

use super::builder::{net_of_fee, parse_outpoint, TxVersion};
use super::fees::{replacement_shortfall, FeeTier};
use super::state::{ParentLeg, SignedTx, PARENT_OUTPUT_INDEX};
use super::status::{StatusReport, TxStatus};
use super::RbfEngine;
use crate::errors::{EngineError, EngineResult};
use crate::rpc::{methods, MempoolEntry, NodeRpc, VerboseTransaction};
use crate::utils::currency::{format_amount, short_txid};
use bitcoin::{Amount, Txid};
use serde::Serialize;
use serde_json::json;
use tracing::debug;

/// Txids the node returned when relaying the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChainBroadcast {
    pub parent: Txid,
    pub child: Txid,
}

impl<C: NodeRpc> RbfEngine<C> {
    /// Build the low-fee parent spending `utxo_txid:utxo_vout` back to `change_address`
    ///
    /// `amount` only sizes the draft; the final change is computed from the
    /// UTXO value the node reports.
    pub async fn create_parent(
        &mut self,
        utxo_txid: &str,
        utxo_vout: u32,
        amount: Amount,
        change_address: &str,
        private_key: &str,
        use_v3: bool,
    ) -> EngineResult<Txid> {
        let result = self
            .build_parent(
                utxo_txid,
                utxo_vout,
                amount,
                change_address,
                private_key,
                TxVersion::from_flag(use_v3),
            )
            .await;
        self.record_failure("Error creating Parent", result)
    }

    async fn build_parent(
        &mut self,
        utxo_txid: &str,
        utxo_vout: u32,
        amount: Amount,
        change_address: &str,
        private_key: &str,
        version: TxVersion,
    ) -> EngineResult<Txid> {
        self.node()?;
        let utxo = parse_outpoint(utxo_txid, utxo_vout)?;

        self.state.log.info("--- Step 1: Creating Parent Transaction ---");
        self.state.log.info(format!(
            "Input: Spending UTXO {}...:{}",
            short_txid(&utxo.txid),
            utxo.vout
        ));

        let inputs = [utxo];
        let tier = FeeTier::Parent;
        let (vsize, fee) = self
            .estimate_fee(&inputs, change_address, amount, tier, private_key, version)
            .await?;

        self.state
            .log
            .info(format!("Fee Strategy: {} to keep it unconfirmed.", tier));
        self.state.log.info(format!(
            "Calculated Fee: {} sats for {} vBytes.",
            fee.to_sat(),
            vsize
        ));

        let input_value = self.fetch_output_value(utxo).await?;
        let change = net_of_fee(input_value, fee)?;

        let (txid, hex) = self
            .sign_payment(&inputs, change_address, change, private_key, version)
            .await?;

        self.state.parent = Some(ParentLeg {
            tx: SignedTx {
                txid,
                hex,
                vsize,
                fee,
                broadcast: false,
            },
            spends: utxo,
            vout: PARENT_OUTPUT_INDEX,
            amount: change,
        });

        self.state.log.success(format!(
            "Parent TX Created: {} (change {})",
            txid,
            format_amount(change)
        ));
        Ok(txid)
    }

    /// Build the child spending the parent's unconfirmed output to `target_address`
    pub async fn create_child(
        &mut self,
        target_address: &str,
        private_key: &str,
        use_v3: bool,
    ) -> EngineResult<Txid> {
        let result = self
            .build_child(target_address, private_key, TxVersion::from_flag(use_v3))
            .await;
        self.record_failure("Error creating Child", result)
    }

    async fn build_child(
        &mut self,
        target_address: &str,
        private_key: &str,
        version: TxVersion,
    ) -> EngineResult<Txid> {
        let (parent_outpoint, parent_amount) = match &self.state.parent {
            Some(parent) => (parent.outpoint(), parent.amount),
            None => {
                return Err(EngineError::Sequence(
                    "No Parent TX Created yet".to_string(),
                ))
            }
        };
        self.node()?;

        self.state.log.info("--- Step 2: Creating Child Transaction ---");
        self.state.log.info(format!(
            "Input: Spending Unconfirmed Parent Output {}...:{}",
            short_txid(&parent_outpoint.txid),
            parent_outpoint.vout
        ));

        let inputs = [parent_outpoint];
        let tier = FeeTier::Child;
        let (vsize, fee) = self
            .estimate_fee(&inputs, target_address, parent_amount, tier, private_key, version)
            .await?;

        self.state
            .log
            .info(format!("Fee Strategy: {} to look valid.", tier));
        self.state.log.info(format!(
            "Calculated Fee: {} sats for {} vBytes.",
            fee.to_sat(),
            vsize
        ));

        let payout = net_of_fee(parent_amount, fee)?;
        let (txid, hex) = self
            .sign_payment(&inputs, target_address, payout, private_key, version)
            .await?;

        self.state.child = Some(SignedTx {
            txid,
            hex,
            vsize,
            fee,
            broadcast: false,
        });

        self.state.log.success(format!("Child TX Created: {}", txid));
        self.state
            .log
            .info("Dependency Established: Child cannot exist without Parent.");
        Ok(txid)
    }

    /// Relay the parent and then the child
    ///
    /// A child failure after the parent was accepted is not rolled back: the
    /// parent stays broadcast and is marked as such in the session state.
    pub async fn broadcast_chain(&mut self) -> EngineResult<ChainBroadcast> {
        let result = self.relay_chain().await;
        self.record_failure("Broadcast Error", result)
    }

    async fn relay_chain(&mut self) -> EngineResult<ChainBroadcast> {
        let parent_hex = self
            .state
            .parent_hex()
            .ok_or(EngineError::IncompleteChain { missing: "parent" })?
            .to_string();
        let child_hex = self
            .state
            .child_hex()
            .ok_or(EngineError::IncompleteChain { missing: "child" })?
            .to_string();
        self.node()?;

        self.state.log.info("--- Step 3: Broadcasting Chain ---");

        self.state.log.info("Broadcasting Parent Transaction...");
        let parent = self.send_raw_transaction(&parent_hex).await?;
        if let Some(leg) = self.state.parent.as_mut() {
            leg.tx.broadcast = true;
        }

        self.state.log.info("Broadcasting Child Transaction...");
        let child = self.send_raw_transaction(&child_hex).await?;
        if let Some(leg) = self.state.child.as_mut() {
            leg.broadcast = true;
        }

        self.state.log.success("Chain Broadcasted Successfully!");
        self.state
            .log
            .info("Check your Mempool. You should see both transactions waiting.");
        Ok(ChainBroadcast { parent, child })
    }

    /// Double-spend `utxo_txid:utxo_vout` to `refund_address` at the replacement tier
    ///
    /// The replacement is recorded before it is relayed, so a rejected relay
    /// still leaves it visible in the session state.
    pub async fn cancel_parent(
        &mut self,
        utxo_txid: &str,
        utxo_vout: u32,
        refund_address: &str,
        private_key: &str,
    ) -> EngineResult<Txid> {
        let result = self
            .build_replacement(utxo_txid, utxo_vout, refund_address, private_key)
            .await;
        self.record_failure("RBF Error", result)
    }

    async fn build_replacement(
        &mut self,
        utxo_txid: &str,
        utxo_vout: u32,
        refund_address: &str,
        private_key: &str,
    ) -> EngineResult<Txid> {
        self.node()?;
        let utxo = parse_outpoint(utxo_txid, utxo_vout)?;

        self.state.log.info("--- Step 4: RBF Kill Switch Initiated ---");
        self.state.log.warning(format!(
            "Objective: Double Spend UTXO {}...:{}",
            short_txid(&utxo.txid),
            utxo.vout
        ));

        // Fees of everything the replacement would evict: the parent and its child
        let original = self.state.parent.as_ref().map(|parent| {
            let child_fee = self.state.child.as_ref().map_or(Amount::ZERO, |child| child.fee);
            (parent.spends, parent.tx.fee.checked_add(child_fee).unwrap_or(Amount::MAX))
        });
        if let Some((spent, _)) = original {
            if spent != utxo {
                self.state.log.warning(format!(
                    "UTXO {} is not the one the Parent spends ({}); nothing will be evicted.",
                    utxo, spent
                ));
            }
        }

        let input_value = self.fetch_output_value(utxo).await?;

        let inputs = [utxo];
        let tier = FeeTier::Replacement;
        let (vsize, fee) = self
            .estimate_fee(
                &inputs,
                refund_address,
                input_value,
                tier,
                private_key,
                TxVersion::V2,
            )
            .await?;

        self.state.log.info(format!("Fee Strategy: {}.", tier));
        self.state.log.info(format!(
            "Logic: Miners will replace the old Parent ({} sat/vB) with this new one to earn more fees.",
            FeeTier::Parent.sat_per_vb()
        ));

        if let Some((spent, evicted_fees)) = original.filter(|(spent, _)| *spent == utxo) {
            debug!("Replacement of {} must outbid {} in evicted fees", spent, evicted_fees);
            if let Some(gap) = replacement_shortfall(evicted_fees, fee, vsize) {
                self.state.log.warning(format!(
                    "Replacement fee {} is {} short of the BIP-125 minimum; the node may reject it.",
                    format_amount(fee),
                    format_amount(gap)
                ));
            }
        }

        let payout = net_of_fee(input_value, fee)?;
        let (txid, hex) = self
            .sign_payment(&inputs, refund_address, payout, private_key, TxVersion::V2)
            .await?;

        self.state.replacement = Some(SignedTx {
            txid,
            hex: hex.clone(),
            vsize,
            fee,
            broadcast: false,
        });

        self.state
            .log
            .info(format!("Broadcasting Replacement TX: {}", txid));
        self.send_raw_transaction(&hex).await?;
        if let Some(replacement) = self.state.replacement.as_mut() {
            replacement.broadcast = true;
        }

        self.state.log.success("Replacement Broadcasted!");
        self.state.log.info(
            "RESULT: The original Parent and Child have been evicted from the Mempool.",
        );
        Ok(txid)
    }

    async fn send_raw_transaction(&self, hex: &str) -> EngineResult<Txid> {
        let txid = self
            .node()?
            .call_as(methods::SEND_RAW_TRANSACTION, vec![json!(hex)])
            .await?;
        Ok(txid)
    }

    /// Classify the parent, child and replacement without touching session state
    pub async fn check_status(&self) -> StatusReport {
        let parent = self.classify(self.state.parent_txid()).await;
        let child = self.classify(self.state.child_txid()).await;
        let replacement = self.classify(self.state.replacement_txid()).await;

        let report = StatusReport::new(parent, child, replacement);
        debug!("Status: {}", report);
        report
    }

    async fn classify(&self, txid: Option<Txid>) -> TxStatus {
        let Some(txid) = txid else {
            return TxStatus::NotCreated;
        };
        let Some(node) = self.client.as_ref().filter(|_| self.state.connected) else {
            return TxStatus::Unknown;
        };
        let txid_param = json!(txid.to_string());

        match node
            .call_as::<MempoolEntry>(methods::GET_MEMPOOL_ENTRY, vec![txid_param.clone()])
            .await
        {
            Ok(entry) => {
                debug!("{} is in the mempool ({} vB)", txid, entry.vsize);
                return TxStatus::Mempool;
            }
            Err(e) if e.is_inconclusive() => {
                debug!("Mempool lookup for {} failed: {}", txid, e);
                return TxStatus::Unknown;
            }
            Err(_) => {}
        }

        match node
            .call_as::<VerboseTransaction>(
                methods::GET_RAW_TRANSACTION,
                vec![txid_param, json!(true)],
            )
            .await
        {
            Ok(tx) if tx.confirmations > 0 => TxStatus::Confirmed,
            Ok(_) => TxStatus::EvictedOrMissing,
            Err(e) if e.is_inconclusive() => {
                debug!("Chain lookup for {} failed: {}", txid, e);
                TxStatus::Unknown
            }
            Err(_) => TxStatus::EvictedOrMissing,
        }
    }
}
