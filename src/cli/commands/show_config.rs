use super::node_args::NodeArgs;
use crate::errors::{AppError, AppResult};
use clap::Args;

/// Print the effective configuration
#[derive(Args)]
pub struct ShowConfigCommand {
    #[command(flatten)]
    pub node: NodeArgs,
}

impl ShowConfigCommand {
    pub fn run(&self) -> AppResult<()> {
        let app_config = self.node.load_config()?;
        let rendered = app_config
            .to_masked_toml()
            .map_err(|e| AppError::Config(format!("Failed to render config: {}", e)))?;
        println!("{}", rendered);
        Ok(())
    }
}
