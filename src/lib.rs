pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use crate::core::cache::Cache;
use crate::core::config::AppConfig;
use crate::core::price::MarketSnapshot;
use crate::providers::{BinanceProvider, YahooFinanceProvider};
use crate::store::HistoryStore;

/// The commands the application can execute, independent of the CLI parser.
#[derive(Debug, Clone)]
pub enum AppCommand {
    Plan,
    Prices,
    Crash,
    Record { notes: Option<String> },
    History { limit: usize },
    Returns,
    Export { output: Option<PathBuf> },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("drip starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    match command {
        AppCommand::Plan => {
            let snapshot = fetch_snapshot(&config).await?;
            cli::plan::run(&config, &snapshot)
        }
        AppCommand::Prices => {
            let snapshot = fetch_snapshot(&config).await?;
            cli::prices::run(&config, &snapshot)
        }
        AppCommand::Crash => {
            let snapshot = fetch_snapshot(&config).await?;
            let store = open_store(&config)?;
            cli::crash::run(&config, &snapshot, &store)
        }
        AppCommand::Record { notes } => {
            let snapshot = fetch_snapshot(&config).await?;
            let mut store = open_store(&config)?;
            cli::record::run(&config, &snapshot, &mut store, notes.as_deref())
        }
        AppCommand::History { limit } => {
            let store = open_store(&config)?;
            cli::history::run(&store, limit)
        }
        AppCommand::Returns => {
            let snapshot = fetch_snapshot(&config).await?;
            let store = open_store(&config)?;
            cli::returns::run(&store, &snapshot)
        }
        AppCommand::Export { output } => {
            let store = open_store(&config)?;
            cli::export::run(&store, output.as_deref())
        }
    }
}

async fn fetch_snapshot(config: &AppConfig) -> Result<MarketSnapshot> {
    // Separate caches per provider so symbol namespaces never collide
    let stock_cache = Arc::new(Cache::<String, f64>::default());
    let crypto_cache = Arc::new(Cache::<String, f64>::default());

    let yahoo_base = config
        .providers
        .yahoo
        .as_ref()
        .map_or("https://query1.finance.yahoo.com", |p| &p.base_url);
    let binance_base = config
        .providers
        .binance
        .as_ref()
        .map_or("https://api.binance.com", |p| &p.base_url);

    let stock_provider = YahooFinanceProvider::new(yahoo_base, Arc::clone(&stock_cache));
    let crypto_provider = BinanceProvider::new(binance_base, Arc::clone(&crypto_cache));

    cli::market::fetch_snapshot(config, &stock_provider, &crypto_provider).await
}

fn open_store(config: &AppConfig) -> Result<HistoryStore> {
    HistoryStore::open(config.history_file_path()?)
}
