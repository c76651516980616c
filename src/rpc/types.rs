//! Typed views of the Bitcoin Core RPC results the engine consumes
//!
//! Only the fields the engine reads are modelled; everything else in the
//! node's responses is ignored during deserialisation.

use bitcoin::amount::ParseAmountError;
use bitcoin::{Amount, Txid};
use serde::{Deserialize, Serialize};

/// Subset of `getnetworkinfo`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkInfo {
    pub version: u64,
    #[serde(default)]
    pub subversion: String,
    #[serde(default, rename = "protocolversion")]
    pub protocol_version: u64,
}

/// Result of `signrawtransactionwithkey`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedRawTransaction {
    pub hex: String,
    pub complete: bool,
    #[serde(default)]
    pub errors: Vec<SigningIssue>,
}

/// Per-input script verification failure reported by the signer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SigningIssue {
    #[serde(default)]
    pub txid: String,
    #[serde(default)]
    pub vout: u32,
    #[serde(default)]
    pub error: String,
}

impl SignedRawTransaction {
    /// First signer complaint, if any, for error messages
    pub fn first_issue(&self) -> Option<&str> {
        self.errors
            .iter()
            .map(|issue| issue.error.as_str())
            .find(|error| !error.is_empty())
    }
}

/// Subset of `decoderawtransaction`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodedTransaction {
    pub txid: Txid,
    pub vsize: u64,
    #[serde(default)]
    pub version: i32,
}

/// Subset of verbose `getrawtransaction`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerboseTransaction {
    pub txid: Txid,
    /// Absent while the transaction is unconfirmed
    #[serde(default)]
    pub confirmations: u64,
    #[serde(default)]
    pub vout: Vec<VerboseOutput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerboseOutput {
    /// Output value in BTC as reported by the node
    pub value: f64,
    pub n: u32,
}

impl VerboseOutput {
    /// Convert the node's BTC float into exact satoshis
    pub fn amount(&self) -> Result<Amount, ParseAmountError> {
        Amount::from_btc(self.value)
    }
}

impl VerboseTransaction {
    /// Output with index `vout`, looked up by its `n` field
    pub fn output(&self, vout: u32) -> Option<&VerboseOutput> {
        self.vout.iter().find(|output| output.n == vout)
    }
}

/// Subset of `getmempoolentry`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MempoolEntry {
    #[serde(default)]
    pub vsize: u64,
}
