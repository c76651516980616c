//! Session state owned by a single `RbfEngine`
//!
//! The state is created empty, filled in by successive engine operations and
//! never reset for the lifetime of the engine. A new `connect` replaces the
//! node handle but keeps every transaction already built.

use bitcoin::{Amount, OutPoint, Txid};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use tracing::{error, info, warn};

/// The parent pays a single output, so its spendable output is always index 0
pub const PARENT_OUTPUT_INDEX: u32 = 0;

/// A signed transaction produced by the engine
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignedTx {
    pub txid: Txid,
    pub hex: String,
    /// Virtual size of the draft used for fee estimation
    pub vsize: u64,
    #[serde(with = "bitcoin::amount::serde::as_sat")]
    pub fee: Amount,
    /// Set once the node accepted the transaction via `sendrawtransaction`
    pub broadcast: bool,
}

/// The low-fee parent and the UTXO it spends
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParentLeg {
    #[serde(flatten)]
    pub tx: SignedTx,
    /// Outpoint consumed by the parent; the replacement must spend it too
    pub spends: OutPoint,
    pub vout: u32,
    /// Value of the parent's single output (the child's input)
    #[serde(with = "bitcoin::amount::serde::as_sat")]
    pub amount: Amount,
}

impl ParentLeg {
    pub fn outpoint(&self) -> OutPoint {
        OutPoint {
            txid: self.tx.txid,
            vout: self.vout,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Failure,
}

impl LogLevel {
    pub fn marker(&self) -> &'static str {
        match self {
            LogLevel::Info => "ℹ️",
            LogLevel::Success => "✅",
            LogLevel::Warning => "⚠️",
            LogLevel::Failure => "❌",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {}",
            self.timestamp.format("%H:%M:%S"),
            self.level.marker(),
            self.message
        )
    }
}

/// Append-only, ordered trail of human-readable engine messages
///
/// Entries are mirrored to `tracing` as they are appended. There is no way to
/// remove or rewrite an entry.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct SessionLog {
    entries: Vec<LogEntry>,
}

impl SessionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, level: LogLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            LogLevel::Info | LogLevel::Success => info!(target: "rbf_chain_lab::engine", "{}", message),
            LogLevel::Warning => warn!(target: "rbf_chain_lab::engine", "{}", message),
            LogLevel::Failure => error!(target: "rbf_chain_lab::engine", "{}", message),
        }
        self.entries.push(LogEntry {
            timestamp: Utc::now(),
            level,
            message,
        });
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Info, message);
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Success, message);
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Warning, message);
    }

    pub fn failure(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Failure, message);
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rendered entries, oldest first
    pub fn lines(&self) -> Vec<String> {
        self.entries.iter().map(ToString::to_string).collect()
    }

    pub fn failures(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.level == LogLevel::Failure)
    }
}

/// Everything one engine session knows about its transaction chain
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionState {
    pub connected: bool,
    pub node_version: Option<u64>,
    pub parent: Option<ParentLeg>,
    pub child: Option<SignedTx>,
    pub replacement: Option<SignedTx>,
    pub log: SessionLog,
}

impl SessionState {
    pub fn parent_txid(&self) -> Option<Txid> {
        self.parent.as_ref().map(|parent| parent.tx.txid)
    }

    pub fn parent_hex(&self) -> Option<&str> {
        self.parent.as_ref().map(|parent| parent.tx.hex.as_str())
    }

    /// Always `PARENT_OUTPUT_INDEX`, whether or not a parent exists yet
    pub fn parent_vout(&self) -> u32 {
        self.parent
            .as_ref()
            .map_or(PARENT_OUTPUT_INDEX, |parent| parent.vout)
    }

    pub fn parent_amount(&self) -> Option<Amount> {
        self.parent.as_ref().map(|parent| parent.amount)
    }

    pub fn child_txid(&self) -> Option<Txid> {
        self.child.as_ref().map(|child| child.txid)
    }

    pub fn child_hex(&self) -> Option<&str> {
        self.child.as_ref().map(|child| child.hex.as_str())
    }

    pub fn replacement_txid(&self) -> Option<Txid> {
        self.replacement.as_ref().map(|replacement| replacement.txid)
    }
}
