//! Builds the per-invocation price snapshot from the configured providers.

use super::ui;
use crate::core::config::AppConfig;
use crate::core::error::FetchError;
use crate::core::price::{MarketSnapshot, PriceProvider};
use anyhow::{Result, anyhow};
use futures::future::join_all;
use std::collections::HashMap;
use tracing::{debug, warn};

/// The crypto budget ceiling is denominated in this unit, so its price is
/// always part of a snapshot.
pub const CONVERSION_SYMBOL: &str = "TAO";

/// Fetches every configured symbol concurrently and assembles a
/// [`MarketSnapshot`].
///
/// A failed fetch falls back to the configured `fallback_prices` entry for
/// that symbol (logged at warn level); a failure without a fallback fails
/// the whole snapshot. The conversion price is fetched once here and reused
/// for every computation in the invocation.
pub async fn fetch_snapshot(
    config: &AppConfig,
    stock_provider: &dyn PriceProvider,
    crypto_provider: &dyn PriceProvider,
) -> Result<MarketSnapshot> {
    let stock_symbols: Vec<&str> = config
        .portfolio
        .stock_allocation
        .keys()
        .map(String::as_str)
        .collect();
    let mut crypto_symbols: Vec<&str> = config
        .portfolio
        .crypto_allocation
        .keys()
        .map(String::as_str)
        .collect();
    if !crypto_symbols.contains(&CONVERSION_SYMBOL) {
        crypto_symbols.push(CONVERSION_SYMBOL);
    }

    let total = (stock_symbols.len() + crypto_symbols.len()) as u64;
    let pb = ui::new_progress_bar(total, true);
    pb.set_message("Fetching prices...");

    let stock_futures = stock_symbols.iter().map(|symbol| {
        let pb = pb.clone();
        async move {
            let res = stock_provider.fetch_price(symbol).await;
            pb.inc(1);
            (symbol.to_string(), res)
        }
    });
    let crypto_futures = crypto_symbols.iter().map(|symbol| {
        let pb = pb.clone();
        async move {
            let res = crypto_provider.fetch_price(symbol).await;
            pb.inc(1);
            (symbol.to_string(), res)
        }
    });

    // Both provider batches run concurrently.
    let (stock_results, crypto_results) =
        futures::join!(join_all(stock_futures), join_all(crypto_futures));
    pb.finish_and_clear();

    let mut fallbacks_applied = 0usize;
    let stocks = resolve_batch(stock_results, config, &mut fallbacks_applied)?;
    let mut cryptos = resolve_batch(crypto_results, config, &mut fallbacks_applied)?;

    let tao_price = cryptos.remove(CONVERSION_SYMBOL).ok_or_else(|| {
        anyhow!("No price resolved for conversion symbol {CONVERSION_SYMBOL}")
    })?;

    if fallbacks_applied > 0 {
        warn!("{fallbacks_applied} price(s) taken from configured fallbacks");
    }
    debug!(
        stocks = stocks.len(),
        cryptos = cryptos.len(),
        tao_price,
        "Snapshot assembled"
    );

    Ok(MarketSnapshot {
        stocks,
        cryptos,
        tao_price,
    })
}

fn resolve_batch(
    results: Vec<(String, Result<f64, FetchError>)>,
    config: &AppConfig,
    fallbacks_applied: &mut usize,
) -> Result<HashMap<String, f64>> {
    let mut prices = HashMap::new();
    for (symbol, result) in results {
        let price = match result {
            Ok(price) => price,
            Err(e) => match config.fallback_prices.get(&symbol) {
                Some(&fallback) => {
                    warn!("Fetch failed for {symbol} ({e}), using fallback {fallback}");
                    *fallbacks_applied += 1;
                    fallback
                }
                None => {
                    return Err(anyhow::Error::new(e)
                        .context(format!("No price and no fallback for {symbol}")));
                }
            },
        };
        prices.insert(symbol, price);
    }
    Ok(prices)
}
