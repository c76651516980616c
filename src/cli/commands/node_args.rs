use crate::config::{AppConfig, NodeConfig};
use crate::errors::AppResult;
use clap::Args;
use std::path::PathBuf;

/// Node connection flags shared by every command that talks to a node
#[derive(Args, Debug, Clone, Default)]
pub struct NodeArgs {
    /// Path to a TOML config file (defaults to ./rbf-chain-lab.toml if present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Bitcoin node RPC host
    #[arg(long)]
    pub rpc_host: Option<String>,

    /// Bitcoin node RPC port
    #[arg(long)]
    pub rpc_port: Option<u16>,

    /// Bitcoin node RPC username
    #[arg(long)]
    pub rpc_username: Option<String>,

    /// Bitcoin node RPC password (prefer RBF_NODE_PASSWORD)
    #[arg(long)]
    pub rpc_password: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub rpc_timeout: Option<u64>,
}

impl NodeArgs {
    /// Load configuration and apply command-line overrides
    pub fn load_config(&self) -> AppResult<AppConfig> {
        let mut app_config = match &self.config {
            Some(path) => AppConfig::load_from(path)?,
            None => AppConfig::get_defaults()?,
        };
        self.apply(&mut app_config.node)?;
        Ok(app_config)
    }

    pub fn resolve(&self) -> AppResult<NodeConfig> {
        Ok(self.load_config()?.node)
    }

    fn apply(&self, node: &mut NodeConfig) -> AppResult<()> {
        if let Some(host) = &self.rpc_host {
            node.host = host.clone();
        }
        if let Some(port) = self.rpc_port {
            node.port = port;
        }
        if let Some(username) = &self.rpc_username {
            node.username = username.clone();
        }
        if let Some(password) = &self.rpc_password {
            node.password = password.clone();
        }
        if let Some(timeout) = self.rpc_timeout {
            node.timeout_seconds = timeout;
        }
        node.validate()?;
        Ok(())
    }
}
