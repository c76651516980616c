//! Replace-By-Fee chain engine
//!
//! The engine owns one session: a node connection and the parent → child →
//! replacement transaction chain built over it. Operations are meant to be
//! called in order:
//!
//! 1. `connect` - validate the node with `getnetworkinfo`
//! 2. `create_parent` - spend a UTXO back to ourselves at 1 sat/vB
//! 3. `create_child` - spend the unconfirmed parent output at 10 sat/vB
//! 4. `broadcast_chain` - relay parent, then child
//! 5. `cancel_parent` - double-spend the parent's UTXO at 20 sat/vB
//!
//! `check_status` may be called at any point. Every mutating operation appends
//! to the session log and returns failures as `EngineError`.
//!
//! The engine holds no locks; serialise calls, or create one engine per
//! session.

pub mod builder;
pub mod chain;
pub mod fees;
pub mod state;
pub mod status;

pub use builder::{Payment, TxVersion};
pub use chain::ChainBroadcast;
pub use fees::FeeTier;
pub use state::{LogEntry, LogLevel, ParentLeg, SessionLog, SessionState, SignedTx};
pub use status::{StatusReport, TxStatus, WalletStatus};

use crate::config::NodeConfig;
use crate::errors::{EngineError, EngineResult};
use crate::rpc::{methods, NetworkInfo, NodeClient, NodeRpc};

pub struct RbfEngine<C = NodeClient> {
    client: Option<C>,
    state: SessionState,
}

impl<C: NodeRpc> Default for RbfEngine<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: NodeRpc> RbfEngine<C> {
    pub fn new() -> Self {
        Self {
            client: None,
            state: SessionState::default(),
        }
    }

    /// Read-only view of the whole session, log included
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn logs(&self) -> &[LogEntry] {
        self.state.log.entries()
    }

    pub fn is_connected(&self) -> bool {
        self.state.connected && self.client.is_some()
    }

    pub fn client(&self) -> Option<&C> {
        self.client.as_ref()
    }

    pub(crate) fn node(&self) -> EngineResult<&C> {
        self.client.as_ref().ok_or(EngineError::NotConnected)
    }

    /// Adopt `client` if it answers `getnetworkinfo`
    ///
    /// Never fails: the outcome is the return value and the session log.
    /// Previously built transactions are kept either way.
    pub async fn connect_with(&mut self, client: C) -> bool {
        match client
            .call_as::<NetworkInfo>(methods::GET_NETWORK_INFO, vec![])
            .await
        {
            Ok(info) => {
                self.client = Some(client);
                self.state.connected = true;
                self.state.node_version = Some(info.version);
                self.state.log.success(format!(
                    "Connected to Bitcoin Node (Version: {})",
                    info.version
                ));
                true
            }
            Err(e) => {
                self.client = None;
                self.state.connected = false;
                self.state.log.failure(format!("Connection Error: {}", e));
                false
            }
        }
    }

    /// Append a failure entry for `result` and pass it through unchanged
    fn record_failure<T>(&mut self, context: &str, result: EngineResult<T>) -> EngineResult<T> {
        if let Err(e) = &result {
            self.state.log.failure(format!("{}: {}", context, e));
        }
        result
    }
}

impl RbfEngine<NodeClient> {
    pub async fn connect(&mut self, user: &str, password: &str, host: &str, port: u16) -> bool {
        self.connect_with_config(NodeConfig::new(user, password, host, port))
            .await
    }

    pub async fn connect_with_config(&mut self, config: NodeConfig) -> bool {
        match NodeClient::new(config) {
            Ok(client) => self.connect_with(client).await,
            Err(e) => {
                self.client = None;
                self.state.connected = false;
                self.state.log.failure(format!("Connection Error: {}", e));
                false
            }
        }
    }
}
