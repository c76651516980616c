#[tokio::main]
async fn main() {
    if let Err(e) = rbf_chain_lab::cli::run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
