//! Pricing abstractions shared by the providers and the calculator core.

use crate::core::error::FetchError;
use async_trait::async_trait;
use std::collections::HashMap;

#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Current price of `symbol` in USD.
    async fn fetch_price(&self, symbol: &str) -> Result<f64, FetchError>;
}

/// All prices needed for one planning run, resolved up front. The calculator
/// treats this as an already-settled in-memory value; caching, retries and
/// fallbacks happen before it is built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketSnapshot {
    pub stocks: HashMap<String, f64>,
    pub cryptos: HashMap<String, f64>,
    /// TAO/USD conversion price. Every computation within one run uses this
    /// same value, never a re-fetched one.
    pub tao_price: f64,
}

impl MarketSnapshot {
    /// Merged view over both asset classes, as consumed by crash detection.
    pub fn all_prices(&self) -> HashMap<String, f64> {
        let mut prices = self.stocks.clone();
        prices.extend(self.cryptos.iter().map(|(s, p)| (s.clone(), *p)));
        prices
    }
}
