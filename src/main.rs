//! Horizon main entry point

use anyhow::Context;
use clap::Parser;
use horizon_api::start_server;
use horizon_config::Config;
use horizon_core::Dashboard;
use horizon_gateway::{AppwriteStore, PlaidClient};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Runtime;

#[derive(Parser, Debug)]
#[command(name = "horizon")]
#[command(version = "0.1.0")]
#[command(about = "Personal finance dashboard backend over a bank data API and a document store", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Print the default configuration and exit
    #[arg(long)]
    print_default_config: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.print_default_config {
        print!("{}", Config::generate_default());
        return Ok(());
    }

    let config = match Config::load(args.config.clone()) {
        Ok(config) => config,
        Err(e) => {
            for suggestion in e.suggestions() {
                eprintln!("hint: {}", suggestion);
            }
            return Err(e).with_context(|| {
                format!("Failed to load configuration from {}", args.config.display())
            });
        }
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();
    log::info!("Config loaded from {}", args.config.display());

    if config.upstream.client_id.is_empty() && !config.upstream.use_sandbox_transactions {
        log::warn!("upstream.client_id is empty; set PLAID_CLIENT_ID or upstream.client_id");
    }
    if config.upstream.use_sandbox_transactions {
        log::info!("Serving sandbox transactions instead of syncing");
    }

    let rt = Runtime::new()?;
    rt.block_on(async {
        let bank_data =
            PlaidClient::new(&config.upstream).context("Failed to build upstream client")?;
        let store = AppwriteStore::new(&config.store).context("Failed to build store client")?;
        let dashboard = Dashboard::new(Arc::new(bank_data), Arc::new(store));

        start_server(config, dashboard).await.context("Server error")
    })
}
