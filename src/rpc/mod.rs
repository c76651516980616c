//! Bitcoin node RPC integration module
//!
//! This module provides the Node Client used by the RBF engine:
//! - **Client** - `NodeRpc` trait and the `reqwest`-based JSON-RPC 2.0 `NodeClient`
//! - **Types** - Typed views of the RPC results the engine reads
//!
//! Every call is a single best-effort attempt bounded by the configured
//! timeout. Failures are translated into `RpcError` so callers can tell an
//! unreachable node apart from a node that rejected the request.

pub mod client;
pub mod types;

// Re-export main types
pub use client::{methods, NodeClient, NodeRpc};
pub use types::{
    DecodedTransaction, MempoolEntry, NetworkInfo, SignedRawTransaction, VerboseTransaction,
};
