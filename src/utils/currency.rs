//! Currency formatting utilities for Bitcoin amounts and fee rates
//!
//! This module provides standardised formatting for the session log, showing
//! amounts in both BTC and satoshi units for readability and precision.

use bitcoin::{Amount, Txid};

/// Satoshis per Bitcoin
const SATS_PER_BTC: u64 = 100_000_000;

/// Format a satoshi amount as dual BTC + sats display
///
/// Uses integer arithmetic so the BTC figure is exact to the satoshi.
///
/// # Examples
/// ```
/// use rbf_chain_lab::utils::currency::format_sats_as_btc;
///
/// assert_eq!(format_sats_as_btc(99890), "0.00099890 BTC (99890 sats)");
/// assert_eq!(
///     format_sats_as_btc(28125351850),
///     "281.25351850 BTC (28125351850 sats)"
/// );
/// ```
pub fn format_sats_as_btc(sats: u64) -> String {
    format!(
        "{}.{:08} BTC ({} sats)",
        sats / SATS_PER_BTC,
        sats % SATS_PER_BTC,
        sats
    )
}

/// Format a `bitcoin::Amount` as dual BTC + sats display
pub fn format_amount(amount: Amount) -> String {
    format_sats_as_btc(amount.to_sat())
}

/// Effective fee rate of `fee` over `vsize` virtual bytes
///
/// # Examples
/// ```
/// use bitcoin::Amount;
/// use rbf_chain_lab::utils::currency::format_fee_rate;
///
/// assert_eq!(format_fee_rate(Amount::from_sat(2200), 110), "20.00 sat/vB");
/// assert_eq!(format_fee_rate(Amount::from_sat(100), 0), "n/a");
/// ```
pub fn format_fee_rate(fee: Amount, vsize: u64) -> String {
    if vsize == 0 {
        return "n/a".to_string();
    }
    format!("{:.2} sat/vB", fee.to_sat() as f64 / vsize as f64)
}

/// First eight hex characters of a txid, for compact log lines
pub fn short_txid(txid: &Txid) -> String {
    txid.to_string().chars().take(8).collect()
}
