use super::node_args::NodeArgs;
use crate::errors::AppResult;
use crate::rpc::{methods, NetworkInfo, NodeClient, NodeRpc};
use clap::Args;
use tracing::{error, info};

/// Test Bitcoin node RPC connectivity
#[derive(Args)]
pub struct TestRpcCommand {
    #[command(flatten)]
    pub node: NodeArgs,
}

impl TestRpcCommand {
    pub async fn run(&self) -> AppResult<()> {
        info!("=== Testing Bitcoin RPC Connection ===");

        let node_config = self.node.resolve()?;
        info!("Testing connection to: {}", node_config.endpoint());
        info!("Username: {}", node_config.username);

        let client = NodeClient::new(node_config)?;
        match client
            .call_as::<NetworkInfo>(methods::GET_NETWORK_INFO, vec![])
            .await
        {
            Ok(network) => {
                println!("Bitcoin RPC connection test PASSED");
                println!("Node version: {}", network.version);
                println!("User agent: {}", network.subversion);
                println!("Protocol version: {}", network.protocol_version);
                Ok(())
            }
            Err(e) => {
                error!("RPC connection test failed: {}", e);
                Err(e.into())
            }
        }
    }
}
