//! Fee tiers for the parent, child and replacement transactions
//!
//! Fees are always `vsize × rate` in whole satoshis. The tiers are fixed so
//! that the replacement strictly outbids the parent it evicts.

use bitcoin::Amount;
use serde::Serialize;
use std::fmt;

/// Incremental relay fee assumed when checking the BIP-125 absolute-fee rule
pub const INCREMENTAL_RELAY_SAT_PER_VB: u64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FeeTier {
    /// Minimum relay rate so the parent lingers unconfirmed
    Parent,
    /// A standard-looking rate for the dependent child
    Child,
    /// High priority rate for the double-spend
    Replacement,
}

impl FeeTier {
    pub fn sat_per_vb(self) -> u64 {
        match self {
            FeeTier::Parent => 1,
            FeeTier::Child => 10,
            FeeTier::Replacement => 20,
        }
    }

    /// Fee for a transaction of `vsize` virtual bytes, `None` on overflow
    pub fn fee_for_vsize(self, vsize: u64) -> Option<Amount> {
        vsize.checked_mul(self.sat_per_vb()).map(Amount::from_sat)
    }

    pub fn label(self) -> &'static str {
        match self {
            FeeTier::Parent => "Minimum",
            FeeTier::Child => "Standard",
            FeeTier::Replacement => "High Priority",
        }
    }
}

impl fmt::Display for FeeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} sat/vB)", self.label(), self.sat_per_vb())
    }
}

/// Amount by which a replacement misses the BIP-125 absolute-fee rule
///
/// The rule requires the replacement to pay at least the original fee plus
/// the incremental relay fee for its own size. Returns `None` when the rule is
/// satisfied.
pub fn replacement_shortfall(
    original_fee: Amount,
    replacement_fee: Amount,
    replacement_vsize: u64,
) -> Option<Amount> {
    let increment = Amount::from_sat(replacement_vsize.saturating_mul(INCREMENTAL_RELAY_SAT_PER_VB));
    let required = original_fee.checked_add(increment).unwrap_or(Amount::MAX);
    required.checked_sub(replacement_fee).filter(|gap| *gap > Amount::ZERO)
}
