use crate::config::LoggingConfig;
use crate::errors::AppResult;
use clap::{Parser, Subcommand};

pub mod commands;

/// Bitcoin Replace-By-Fee Demonstrator
#[derive(Parser)]
#[command(name = "rbf-chain-lab")]
#[command(about = "Bitcoin Replace-By-Fee Demonstrator")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Build, broadcast and optionally cancel a parent/child chain
    Demo(commands::demo::DemoCommand),
    /// Test Bitcoin node RPC connectivity
    TestRpc(commands::test_rpc::TestRpcCommand),
    /// Print the effective configuration (password masked)
    ShowConfig(commands::show_config::ShowConfigCommand),
}

impl Commands {
    /// Node flags of the selected command, `--config` included
    pub fn node_args(&self) -> &commands::node_args::NodeArgs {
        match self {
            Commands::Demo(command) => &command.node,
            Commands::TestRpc(command) => &command.node,
            Commands::ShowConfig(command) => &command.node,
        }
    }
}

pub async fn run() -> AppResult<()> {
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise the configured filter. A broken config is
    // reported by the command itself, so logging only falls back here.
    let default_filter = cli
        .command
        .node_args()
        .load_config()
        .map(|app_config| app_config.logging.filter)
        .unwrap_or_else(|_| LoggingConfig::default().filter);
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .try_init();

    match cli.command {
        Commands::Demo(command) => command.run().await,
        Commands::TestRpc(command) => command.run().await,
        Commands::ShowConfig(command) => command.run(),
    }
}
