use super::node_args::NodeArgs;
use crate::engine::{RbfEngine, SignedTx};
use crate::errors::{AppError, AppResult};
use crate::utils::currency::{format_amount, format_fee_rate};
use bitcoin::amount::Denomination;
use bitcoin::Amount;
use clap::Args;
use std::env;
use tracing::{info, warn};

/// Environment variable consulted when `--priv-key` is omitted
pub const PRIV_KEY_ENV: &str = "RBF_PRIV_KEY";

/// Run the parent → child → broadcast (→ cancel) sequence against a node
#[derive(Args)]
pub struct DemoCommand {
    #[command(flatten)]
    pub node: NodeArgs,

    /// Txid of the UTXO the parent spends
    #[arg(long)]
    pub utxo_txid: String,

    /// Output index of the UTXO
    #[arg(long, default_value_t = 0)]
    pub utxo_vout: u32,

    /// UTXO amount in BTC (sizes the draft; change uses the on-chain value)
    #[arg(long, value_parser = parse_btc)]
    pub amount: Amount,

    /// Address receiving the parent's change
    #[arg(long)]
    pub change_addr: String,

    /// Address the child pays ("wallet C")
    #[arg(long)]
    pub target_addr: String,

    /// Address the replacement pays (defaults to the change address)
    #[arg(long)]
    pub refund_addr: Option<String>,

    /// WIF private key for every input (or set RBF_PRIV_KEY)
    #[arg(long)]
    pub priv_key: Option<String>,

    /// Log TRUC (V3) commentary for the parent and child
    #[arg(long)]
    pub use_v3: bool,

    /// Fire the replacement after the chain is broadcast
    #[arg(long)]
    pub cancel: bool,

    /// Print the final session state as JSON
    #[arg(long)]
    pub json: bool,
}

fn parse_btc(value: &str) -> Result<Amount, String> {
    Amount::from_str_in(value, Denomination::Bitcoin).map_err(|e| e.to_string())
}

fn resolve_private_key(flag: Option<&str>) -> AppResult<String> {
    match flag {
        Some(key) => Ok(key.to_string()),
        None => env::var(PRIV_KEY_ENV).map_err(|_| {
            AppError::Config(format!(
                "No private key given. Pass --priv-key or set {}",
                PRIV_KEY_ENV
            ))
        }),
    }
}

fn describe_leg(name: &str, leg: &SignedTx) -> String {
    format!(
        "{:<12} {} fee {} ({}) broadcast: {}",
        name,
        leg.txid,
        format_amount(leg.fee),
        format_fee_rate(leg.fee, leg.vsize),
        leg.broadcast
    )
}

impl DemoCommand {
    pub async fn run(&self) -> AppResult<()> {
        info!("=== Replace-By-Fee Chain Demo ===");

        let node_config = self.node.resolve()?;
        let private_key = resolve_private_key(self.priv_key.as_deref())?;

        let mut engine: RbfEngine = RbfEngine::new();
        if !engine.connect_with_config(node_config.clone()).await {
            self.report(&engine);
            return Err(AppError::Config(format!(
                "Could not connect to Bitcoin node at {}",
                node_config.endpoint()
            )));
        }

        let outcome = self.run_steps(&mut engine, &private_key).await;
        self.report(&engine);

        if let Err(e) = &outcome {
            warn!("Demo stopped early: {}", e);
        }
        outcome
    }

    async fn run_steps(&self, engine: &mut RbfEngine, private_key: &str) -> AppResult<()> {
        engine
            .create_parent(
                &self.utxo_txid,
                self.utxo_vout,
                self.amount,
                &self.change_addr,
                private_key,
                self.use_v3,
            )
            .await?;
        engine
            .create_child(&self.target_addr, private_key, self.use_v3)
            .await?;
        engine.broadcast_chain().await?;

        let status = engine.check_status().await;
        println!("Status after broadcast: {}", status);

        if self.cancel {
            let refund = self.refund_addr.as_deref().unwrap_or(&self.change_addr);
            engine
                .cancel_parent(&self.utxo_txid, self.utxo_vout, refund, private_key)
                .await?;

            let status = engine.check_status().await;
            println!("Status after replacement: {}", status);
        }

        Ok(())
    }

    fn report(&self, engine: &RbfEngine) {
        let state = engine.state();

        println!("\n=== SESSION LOG ===");
        for line in state.log.lines() {
            println!("{}", line);
        }

        println!("\n=== TRANSACTIONS ===");
        if let Some(parent) = &state.parent {
            println!("{}", describe_leg("Parent", &parent.tx));
        }
        if let Some(child) = &state.child {
            println!("{}", describe_leg("Child", child));
        }
        if let Some(replacement) = &state.replacement {
            println!("{}", describe_leg("Replacement", replacement));
        }

        if self.json {
            match serde_json::to_string_pretty(state) {
                Ok(json) => println!("\n{}", json),
                Err(e) => warn!("Failed to serialise session state: {}", e),
            }
        }
    }
}
