use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client_core::{load_settings, ClientConfig, ClientEvent, MintClient};
use shared::domain::{Address, NetworkId};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use wallet_integration::{SimulatedWallet, SimulatedWalletConfig, WalletProvider};

mod render;

#[derive(Parser, Debug)]
struct Cli {
    /// Settings file; defaults to ./minter.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Account held by the simulated wallet; repeat for several.
    #[arg(long = "account")]
    accounts: Vec<Address>,
    /// Network id the simulated wallet reports.
    #[arg(long, default_value = "4")]
    network: String,
    /// Accounts are already authorized when the app starts.
    #[arg(long)]
    pre_authorized: bool,
    /// Decline every authorization prompt.
    #[arg(long)]
    reject: bool,
    /// Run as if no wallet extension were installed.
    #[arg(long)]
    no_wallet: bool,
    /// Seconds the simulated network takes to confirm a transaction.
    #[arg(long, default_value_t = 0)]
    confirmation_secs: u64,
    /// Print the final state as JSON instead of the text view.
    #[arg(long)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Detect an existing session and show it.
    Status,
    /// Ask the wallet for account access.
    Connect,
    /// Connect and mint one or more tokens.
    Mint {
        #[arg(long, default_value_t = 1)]
        count: u32,
    },
    /// Follow wallet notifications and counter updates.
    Watch {
        /// Stop after this many seconds; runs until Ctrl-C otherwise.
        #[arg(long)]
        seconds: Option<u64>,
    },
}

fn simulated_wallet(cli: &Cli, supply_cap: u64) -> SimulatedWallet {
    SimulatedWallet::new(SimulatedWalletConfig {
        accounts: cli.accounts.clone(),
        pre_authorized: cli.pre_authorized,
        network_id: NetworkId::new(cli.network.clone()),
        reject_requests: cli.reject,
        supply_cap,
        confirmation_delay: Duration::from_secs(cli.confirmation_secs),
        events_carry_collections: true,
    })
}

fn spawn_notification_printer(client: &Arc<MintClient>) -> tokio::task::JoinHandle<()> {
    let mut events = client.subscribe_events();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                ClientEvent::Notification(notification) => {
                    println!("{}", render::render_notification(&notification));
                }
                ClientEvent::Error { action, error } => {
                    eprintln!("{action} failed: {error}");
                }
                _ => {}
            }
        }
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let cli = Cli::parse();

    let settings = load_settings(cli.config.as_deref())?;
    let config = ClientConfig::from_settings(&settings).context("invalid settings")?;
    let provider: Option<Arc<dyn WalletProvider>> = if cli.no_wallet {
        None
    } else {
        Some(Arc::new(simulated_wallet(&cli, config.total_cap)))
    };
    let poll_interval = config.poll_interval;
    let client = MintClient::new(config, provider);
    let printer = spawn_notification_printer(&client);

    if client.detect_existing_session().await.is_err() {
        warn!("startup: no usable session detected");
    }

    match cli.command {
        Command::Status => {}
        Command::Connect => {
            if let Ok(address) = client.connect().await {
                info!("connected as {address}");
            }
        }
        Command::Mint { count } => {
            let session_valid = client.snapshot().await.session().is_valid();
            if session_valid || client.connect().await.is_ok() {
                for _ in 0..count {
                    match client.mint().await {
                        Ok(receipt) => info!("minted in block {}", receipt.block_number),
                        Err(_) => break,
                    }
                }
            }
        }
        Command::Watch { seconds } => {
            let _watcher = client.watch_wallet_notifications().ok();
            let _poller = poll_interval.and_then(|every| client.spawn_counter_poller(every));
            match seconds {
                Some(seconds) => tokio::time::sleep(Duration::from_secs(seconds)).await,
                None => tokio::signal::ctrl_c()
                    .await
                    .context("failed to listen for ctrl-c")?,
            }
        }
    }

    // Let the listener deliver notifications for the last confirmed mint.
    tokio::time::sleep(Duration::from_millis(100)).await;
    printer.abort();

    let snapshot = client.snapshot().await;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        println!("{}", render::render_view(&snapshot));
    }
    Ok(())
}
