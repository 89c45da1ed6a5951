use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::core::cache::Cache;
use crate::core::error::FetchError;
use crate::core::price::PriceProvider;

// YahooFinanceProvider implementation for PriceProvider
pub struct YahooFinanceProvider {
    base_url: String,
    cache: Arc<Cache<String, f64>>,
}

impl YahooFinanceProvider {
    pub fn new(base_url: &str, cache: Arc<Cache<String, f64>>) -> Self {
        YahooFinanceProvider {
            base_url: base_url.to_string(),
            cache,
        }
    }
}

#[derive(Deserialize, Debug)]
struct YahooPriceResponse {
    chart: PriceChartResult,
}

#[derive(Deserialize, Debug)]
struct PriceChartResult {
    result: Option<Vec<PriceChartItem>>,
}

#[derive(Deserialize, Debug)]
struct PriceChartItem {
    meta: PriceChartMeta,
}

#[derive(Deserialize, Debug)]
struct PriceChartMeta {
    #[serde(alias = "regularMarketPrice")]
    regular_market_price: Option<f64>,
}

fn http_error(symbol: &str, source: reqwest::Error) -> FetchError {
    FetchError::Http {
        symbol: symbol.to_string(),
        source,
    }
}

#[async_trait]
impl PriceProvider for YahooFinanceProvider {
    #[instrument(
        name = "YahooPriceFetch",
        skip(self),
        fields(symbol = %symbol)
    )]
    async fn fetch_price(&self, symbol: &str) -> Result<f64, FetchError> {
        if let Some(cached) = self.cache.get(&symbol.to_string()).await {
            return Ok(cached);
        }

        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
        debug!("Requesting price data from {}", url);

        let client = reqwest::Client::builder()
            .user_agent("drip/0.2")
            .build()
            .map_err(|e| http_error(symbol, e))?;
        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| http_error(symbol, e))?;

        if !response.status().is_success() {
            return Err(FetchError::Malformed {
                symbol: symbol.to_string(),
                reason: format!("HTTP status {}", response.status()),
            });
        }

        let data = response
            .json::<YahooPriceResponse>()
            .await
            .map_err(|e| http_error(symbol, e))?;
        let price = data
            .chart
            .result
            .as_ref()
            .and_then(|items| items.first())
            .and_then(|item| item.meta.regular_market_price)
            .ok_or_else(|| FetchError::NoData {
                symbol: symbol.to_string(),
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
