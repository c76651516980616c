//! Bitcoin Replace-By-Fee Demonstrator
//!
//! Builds a low-fee parent transaction, a child spending its unconfirmed
//! output, relays both, and then evicts them with a fee-bumping replacement
//! that double-spends the parent's input.

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod rpc;
pub mod utils;

pub use engine::RbfEngine;
