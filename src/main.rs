//! Fairmint command line
//!
//! Thin shell over [`fairmint_core::Orchestrator`]: every subcommand maps to
//! one public operation and prints its result envelope as JSON.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fairmint_core::{
    config::Config,
    flows::{InitializeRequest, Orchestrator},
    ledger::RpcLedger,
    metrics::Metrics,
    types::FlowResult,
    wallet::LocalWallet,
    Network,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file; the built-in network table is used when absent
    #[arg(short, long, env = "FAIRMINT_CONFIG")]
    config: Option<PathBuf>,

    /// Network to use when no config file is given
    #[arg(short, long, default_value = "devnet")]
    network: Network,

    /// Keypair file used to sign transactions
    #[arg(short, long, env = "FAIRMINT_KEYPAIR")]
    keypair: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every address a launch of NAME/SYMBOL would use
    Derive {
        #[arg(long)]
        name: String,
        #[arg(long)]
        symbol: String,
    },
    /// Quote the fee for minting with a referral code
    Quote {
        #[arg(long)]
        mint: String,
        #[arg(long)]
        code: String,
    },
    /// Resolve a referral code to its referrer
    Referral {
        #[arg(long)]
        code: String,
    },
    /// Print the protocol-wide configuration account
    SystemConfig,
    /// Launch a new token
    Initialize {
        #[arg(long)]
        name: String,
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        uri: String,
        #[arg(long, default_value = "standard")]
        token_type: String,
    },
    /// Mint the current epoch's allotment
    Mint {
        #[arg(long)]
        mint: String,
        #[arg(long)]
        code: String,
    },
    /// Show what a refund would return
    RefundPreview {
        #[arg(long)]
        mint: String,
    },
    /// Return minted tokens and reclaim fees
    Refund {
        #[arg(long)]
        mint: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        symbol: String,
    },
    /// Print a token's metadata
    Metadata {
        #[arg(long)]
        mint: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose)?;

    let config = load_config(&args)?;
    info!(
        network = ?config.network.network,
        rpc_url = %config.network.rpc_url,
        program_id = %config.network.program_id,
        "Configuration loaded"
    );

    let ledger = Arc::new(RpcLedger::new(config.network.rpc_url.clone()));
    let mut orchestrator = Orchestrator::new(&config, ledger);

    if let Some(path) = &args.keypair {
        let wallet = LocalWallet::from_file(path).context("Failed to load wallet")?;
        info!(wallet = %fairmint_core::wallet::WalletSigner::pubkey(&wallet), "Wallet loaded");
        orchestrator = orchestrator.with_wallet(Arc::new(wallet));
    }

    let metrics = if config.enable_metrics {
        let metrics = Arc::new(Metrics::new().context("Failed to register metrics")?);
        orchestrator = orchestrator.with_metrics(metrics.clone());
        Some(metrics)
    } else {
        None
    };

    let success = run(&orchestrator, args.command).await?;

    if let Some(metrics) = metrics {
        debug!(metrics = %metrics.render()?, "Submission metrics");
    }

    if !success {
        std::process::exit(1);
    }
    Ok(())
}

/// Run one subcommand and print its envelope; returns the envelope's `success`
async fn run(orchestrator: &Orchestrator, command: Command) -> Result<bool> {
    match command {
        Command::Derive { name, symbol } => print(orchestrator.derive_addresses(&name, &symbol)),
        Command::Quote { mint, code } => print(orchestrator.quote_mint_fee(&mint, &code).await),
        Command::Referral { code } => print(orchestrator.lookup_referral(&code).await),
        Command::SystemConfig => print(orchestrator.system_config().await),
        Command::Initialize {
            name,
            symbol,
            uri,
            token_type,
        } => {
            let request = InitializeRequest {
                name,
                symbol,
                uri,
                token_type,
            };
            print(orchestrator.initialize(&request).await)
        }
        Command::Mint { mint, code } => print(orchestrator.mint(&mint, &code).await),
        Command::RefundPreview { mint } => print(orchestrator.refund_preview(&mint).await),
        Command::Refund { mint, name, symbol } => {
            print(orchestrator.refund(&mint, &name, &symbol).await)
        }
        Command::Metadata { mint } => print(orchestrator.metadata(&mint).await),
    }
}

fn print<T: Serialize>(result: FlowResult<T>) -> Result<bool> {
    let json = serde_json::to_string_pretty(&result).context("Failed to serialize result")?;
    println!("{}", json);
    Ok(result.success)
}

fn load_config(args: &Args) -> Result<Config> {
    match &args.config {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            Config::from_file_with_env(path)
        }
        None => Config::for_network(args.network),
    }
}

/// Initialize logging subsystem
fn init_logging(verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        "fairmint=debug,fairmint_core=debug,info"
    } else {
        "fairmint=info,fairmint_core=info,warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .init();

    Ok(())
}
