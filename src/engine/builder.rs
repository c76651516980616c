//! Transaction construction primitives shared by every chain operation
//!
//! The node does all the heavy lifting: raw transaction assembly, signing with
//! a WIF key and decoding. The engine only decides inputs, outputs, nSequence
//! and fees.

use super::fees::FeeTier;
use super::RbfEngine;
use crate::errors::{EngineError, EngineResult};
use crate::rpc::{methods, DecodedTransaction, NodeRpc, SignedRawTransaction, VerboseTransaction};
use crate::utils::currency::format_amount;
use bitcoin::{Amount, OutPoint, Sequence, Txid};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::str::FromStr;

/// Transaction version requested by the caller
///
/// `V3` only adds TRUC (BIP-431) commentary to the session log. The node's
/// `createrawtransaction` always produces version 2 and the engine does not
/// rewrite it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum TxVersion {
    #[default]
    V2,
    V3,
}

impl TxVersion {
    pub fn from_flag(use_v3: bool) -> Self {
        if use_v3 {
            TxVersion::V3
        } else {
            TxVersion::V2
        }
    }
}

/// A single output: pay `amount` to `address`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payment {
    pub address: String,
    pub amount: Amount,
}

impl Payment {
    pub fn new(address: impl Into<String>, amount: Amount) -> Self {
        Self {
            address: address.into(),
            amount,
        }
    }
}

/// nSequence for every input: 0xfffffffd opts into replacement, 0xffffffff is final
pub fn rbf_sequence(replaceable: bool) -> Sequence {
    if replaceable {
        Sequence::ENABLE_RBF_NO_LOCKTIME
    } else {
        Sequence::MAX
    }
}

/// Parse a caller-supplied UTXO reference
pub fn parse_outpoint(txid: &str, vout: u32) -> EngineResult<OutPoint> {
    let txid = Txid::from_str(txid.trim())
        .map_err(|e| EngineError::ChainBuild(format!("Invalid UTXO txid '{}': {}", txid, e)))?;
    Ok(OutPoint { txid, vout })
}

/// `gross - fee`, refusing to produce an empty or negative output
pub fn net_of_fee(gross: Amount, fee: Amount) -> EngineResult<Amount> {
    gross
        .checked_sub(fee)
        .filter(|net| *net > Amount::ZERO)
        .ok_or_else(|| {
            EngineError::ChainBuild(format!(
                "Input value {} cannot cover fee {}",
                format_amount(gross),
                format_amount(fee)
            ))
        })
}

fn raw_inputs(inputs: &[OutPoint], sequence: Sequence) -> Value {
    Value::Array(
        inputs
            .iter()
            .map(|input| {
                json!({
                    "txid": input.txid.to_string(),
                    "vout": input.vout,
                    "sequence": sequence.to_consensus_u32(),
                })
            })
            .collect(),
    )
}

fn raw_outputs(outputs: &[Payment]) -> Value {
    let mut map = Map::new();
    for output in outputs {
        map.insert(output.address.clone(), json!(output.amount.to_btc()));
    }
    Value::Object(map)
}

impl<C: NodeRpc> RbfEngine<C> {
    /// Assemble, sign and return the hex encoding of a transaction
    pub async fn build_signed_transaction(
        &mut self,
        inputs: &[OutPoint],
        outputs: &[Payment],
        private_key: &str,
        replaceable: bool,
        version: TxVersion,
    ) -> EngineResult<String> {
        self.node()?;

        let sequence = rbf_sequence(replaceable);
        if replaceable {
            self.state.log.info(format!(
                "Setting nSequence to {:#010x} to enable RBF (BIP-125).",
                sequence.to_consensus_u32()
            ));
        } else {
            self.state.log.info(format!(
                "Setting nSequence to {:#010x} (final, replacement disabled).",
                sequence.to_consensus_u32()
            ));
        }

        if version == TxVersion::V3 {
            self.state
                .log
                .info("TRUC (V3) requested: transaction version 3 (BIP-431).");
            self.state.log.info(
                "Research Note: V3 transactions restrict topology to prevent pinning attacks on L2 protocols.",
            );
            self.state.log.warning(
                "V3 is simulated: createrawtransaction encodes version 2 and the engine does not rewrite it.",
            );
        }

        let raw: String = self
            .node()?
            .call_as(
                methods::CREATE_RAW_TRANSACTION,
                vec![raw_inputs(inputs, sequence), raw_outputs(outputs)],
            )
            .await?;

        let signed: SignedRawTransaction = self
            .node()?
            .call_as(
                methods::SIGN_RAW_TRANSACTION_WITH_KEY,
                vec![json!(raw), json!([private_key])],
            )
            .await?;

        if !signed.complete {
            let reason = match signed.first_issue() {
                Some(issue) => format!("{}. Check private key.", issue),
                None => "Signature incomplete. Check private key.".to_string(),
            };
            return Err(EngineError::Signing(reason));
        }

        Ok(signed.hex)
    }

    pub async fn decode_transaction(&self, hex: &str) -> EngineResult<DecodedTransaction> {
        let decoded = self
            .node()?
            .call_as(methods::DECODE_RAW_TRANSACTION, vec![json!(hex)])
            .await?;
        Ok(decoded)
    }

    /// Virtual size in vbytes, the unit every fee tier is priced in
    pub async fn measure_virtual_size(&self, hex: &str) -> EngineResult<u64> {
        Ok(self.decode_transaction(hex).await?.vsize)
    }

    /// Value of `outpoint` as recorded on chain (or in the mempool)
    pub async fn fetch_output_value(&self, outpoint: OutPoint) -> EngineResult<Amount> {
        let prev_tx: VerboseTransaction = self
            .node()?
            .call_as(
                methods::GET_RAW_TRANSACTION,
                vec![json!(outpoint.txid.to_string()), json!(true)],
            )
            .await?;

        let output = prev_tx.output(outpoint.vout).ok_or_else(|| {
            EngineError::ChainBuild(format!(
                "Output {} not found in transaction {}",
                outpoint.vout, outpoint.txid
            ))
        })?;

        output.amount().map_err(|e| {
            EngineError::ChainBuild(format!(
                "Node reported an invalid value {} for {}: {}",
                output.value, outpoint, e
            ))
        })
    }

    /// Sign a draft paying `draft_amount` and price it at `tier`
    ///
    /// Returns the draft's vsize and the resulting fee.
    pub(crate) async fn estimate_fee(
        &mut self,
        inputs: &[OutPoint],
        address: &str,
        draft_amount: Amount,
        tier: FeeTier,
        private_key: &str,
        version: TxVersion,
    ) -> EngineResult<(u64, Amount)> {
        let draft = self
            .build_signed_transaction(
                inputs,
                &[Payment::new(address, draft_amount)],
                private_key,
                true,
                version,
            )
            .await?;
        let vsize = self.measure_virtual_size(&draft).await?;

        let fee = tier.fee_for_vsize(vsize).ok_or_else(|| {
            EngineError::ChainBuild(format!("Fee overflow for {} vbytes at {}", vsize, tier))
        })?;

        Ok((vsize, fee))
    }

    /// Build the final replaceable transaction and ask the node for its txid
    pub(crate) async fn sign_payment(
        &mut self,
        inputs: &[OutPoint],
        address: &str,
        amount: Amount,
        private_key: &str,
        version: TxVersion,
    ) -> EngineResult<(Txid, String)> {
        let hex = self
            .build_signed_transaction(
                inputs,
                &[Payment::new(address, amount)],
                private_key,
                true,
                version,
            )
            .await?;
        let txid = self.decode_transaction(&hex).await?.txid;
        Ok((txid, hex))
    }
}
