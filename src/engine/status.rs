//! Mempool/chain status classification for the tracked transactions

use serde::Serialize;
use std::fmt;

/// Where a tracked transaction currently lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TxStatus {
    #[serde(rename = "Not Created")]
    NotCreated,
    Mempool,
    Confirmed,
    #[serde(rename = "Evicted/Missing")]
    EvictedOrMissing,
    /// The node could not be asked (not connected or unreachable)
    Unknown,
}

impl TxStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxStatus::NotCreated => "Not Created",
            TxStatus::Mempool => "Mempool",
            TxStatus::Confirmed => "Confirmed",
            TxStatus::EvictedOrMissing => "Evicted/Missing",
            TxStatus::Unknown => "Unknown",
        }
    }

    /// In the mempool or in a block
    pub fn is_live(&self) -> bool {
        matches!(self, TxStatus::Mempool | TxStatus::Confirmed)
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the recipient of the child transaction ("wallet C") observes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WalletStatus {
    #[serde(rename = "Pending (Incoming)")]
    PendingIncoming,
    Received,
    #[serde(rename = "BLOCKED (Orphaned)")]
    BlockedOrphaned,
    Waiting,
}

impl WalletStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WalletStatus::PendingIncoming => "Pending (Incoming)",
            WalletStatus::Received => "Received",
            WalletStatus::BlockedOrphaned => "BLOCKED (Orphaned)",
            WalletStatus::Waiting => "Waiting",
        }
    }
}

impl fmt::Display for WalletStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derive the recipient's view from the child and replacement statuses
///
/// The child being live wins; otherwise a live replacement means the child's
/// funding was double-spent and the payment can never arrive.
pub fn derive_wallet_status(child: TxStatus, replacement: TxStatus) -> WalletStatus {
    match child {
        TxStatus::Mempool => WalletStatus::PendingIncoming,
        TxStatus::Confirmed => WalletStatus::Received,
        _ if replacement.is_live() => WalletStatus::BlockedOrphaned,
        _ => WalletStatus::Waiting,
    }
}

/// Flat classification of every tracked transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub parent: TxStatus,
    pub child: TxStatus,
    pub replacement: TxStatus,
    pub wallet_c: WalletStatus,
}

impl StatusReport {
    pub fn new(parent: TxStatus, child: TxStatus, replacement: TxStatus) -> Self {
        Self {
            parent,
            child,
            replacement,
            wallet_c: derive_wallet_status(child, replacement),
        }
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "parent: {} | child: {} | replacement: {} | wallet C: {}",
            self.parent, self.child, self.replacement, self.wallet_c
        )
    }
}
