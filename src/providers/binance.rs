use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::core::cache::Cache;
use crate::core::error::FetchError;
use crate::core::price::PriceProvider;

/// Spot symbols are quoted against USDT.
fn trading_pair(symbol: &str) -> String {
    format!("{symbol}USDT")
}

// BinanceProvider implementation for PriceProvider
pub struct BinanceProvider {
    base_url: String,
    cache: Arc<Cache<String, f64>>,
}

impl BinanceProvider {
    pub fn new(base_url: &str, cache: Arc<Cache<String, f64>>) -> Self {
        BinanceProvider {
            base_url: base_url.to_string(),
            cache,
        }
    }
}

#[derive(Deserialize, Debug)]
struct TickerResponse {
    // Binance serializes the price as a decimal string.
    price: String,
}

#[async_trait]
impl PriceProvider for BinanceProvider {
    #[instrument(
        name = "BinancePriceFetch",
        skip(self),
        fields(symbol = %symbol)
    )]
    async fn fetch_price(&self, symbol: &str) -> Result<f64, FetchError> {
        if let Some(cached) = self.cache.get(&symbol.to_string()).await {
            return Ok(cached);
        }

        let pair = trading_pair(symbol);
        let url = format!("{}/api/v3/ticker/price?symbol={}", self.base_url, pair);
        debug!("Requesting ticker from {}", url);

        let client = reqwest::Client::builder()
            .user_agent("drip/0.2")
            .build()
            .map_err(|e| FetchError::Http {
                symbol: symbol.to_string(),
                source: e,
            })?;
        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Http {
                symbol: symbol.to_string(),
                source: e,
            })?;

        if !response.status().is_success() {
            return Err(FetchError::NoData {
                symbol: symbol.to_string(),
            });
        }

        let ticker = response
            .json::<TickerResponse>()
            .await
            .map_err(|e| FetchError::Http {
                symbol: symbol.to_string(),
                source: e,
            })?;

        let price: f64 = ticker.price.parse().map_err(|_| FetchError::Malformed {
            symbol: symbol.to_string(),
            reason: format!("unparseable price {:?}", ticker.price),
        })?;
        if price <= 0.0 {
            return Err(FetchError::Malformed {
                symbol: symbol.to_string(),
                reason: format!("non-positive price {price}"),
            });
        }

        self.cache.put(symbol.to_string(), price).await;

        Ok(price)
    }
}
