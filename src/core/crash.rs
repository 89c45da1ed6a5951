//! Crash detection: flags assets trading well below their historical
//! average acquisition cost and sizes an extra purchase accordingly.

use crate::core::config::AppConfig;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Reference multiplier applied to the current price when no purchase
/// history exists for a symbol. Treats the current price as sitting 15%
/// below a recent synthetic peak.
pub const SYNTHETIC_PEAK_FACTOR: f64 = 1.15;

/// Source of historical average acquisition cost. Implemented by the
/// history store; lookup failures surface as `None`, never as an error.
pub trait AverageCostLookup {
    /// Quantity-weighted average cost of `symbol` over purchases within the
    /// last `lookback_days` days, or `None` if there are none.
    fn average_cost(&self, symbol: &str, lookback_days: u32) -> Option<f64>;
}

/// One detected buying opportunity. `drop_percent` is a fraction
/// (0.21 means a 21% drop from the reference price).
#[derive(Debug, Clone, PartialEq)]
pub struct CrashOpportunity {
    pub symbol: String,
    pub current_price: f64,
    pub avg_price: f64,
    pub drop_percent: f64,
    pub tier: u8,
    pub multiplier: f64,
    pub base_amount: f64,
    pub suggested_amount: f64,
}

pub struct CrashDetector<'a> {
    config: &'a AppConfig,
}

impl<'a> CrashDetector<'a> {
    pub fn new(config: &'a AppConfig) -> Self {
        CrashDetector { config }
    }

    /// Scans every priced symbol for crash-tier drops.
    ///
    /// Symbols outside both allocation maps are skipped. The reference
    /// price is the historical average cost inside the class-specific
    /// lookback window; without usable history the detector falls back to
    /// a synthetic peak of `current * SYNTHETIC_PEAK_FACTOR`. Assets not
    /// reaching the first tier are omitted from the result. The same
    /// `tao_price` is used for every divisible-asset budget within one
    /// call.
    pub fn detect(
        &self,
        current_prices: &HashMap<String, f64>,
        tao_price: f64,
        lookup: &dyn AverageCostLookup,
    ) -> BTreeMap<String, CrashOpportunity> {
        let portfolio = &self.config.portfolio;
        let crash = &self.config.crash_detection;
        let mut opportunities = BTreeMap::new();

        for (symbol, &current_price) in current_prices {
            if current_price <= 0.0 {
                continue;
            }

            let (ratio, class_weight, weekly_budget, lookback) =
                if let Some(&ratio) = portfolio.stock_allocation.get(symbol) {
                    (
                        ratio,
                        portfolio.stock_weight,
                        self.config.limits.weekly_usd_limit,
                        crash.stock_lookback_days,
                    )
                } else if let Some(&ratio) = portfolio.crypto_allocation.get(symbol) {
                    (
                        ratio,
                        portfolio.crypto_weight,
                        self.config.limits.weekly_tao_limit * tao_price,
                        crash.crypto_lookback_days,
                    )
                } else {
                    continue;
                };

            let avg_price = match lookup.average_cost(symbol, lookback) {
                Some(avg) if avg > 0.0 => avg,
                _ => {
                    debug!(symbol = %symbol, "No usable history, using synthetic peak");
                    current_price * SYNTHETIC_PEAK_FACTOR
                }
            };

            let drop = (avg_price - current_price) / avg_price;

            // Deepest exceeded tier wins.
            let (tier, multiplier) = if drop >= crash.level3_threshold {
                (3, crash.level3_multiplier)
            } else if drop >= crash.level2_threshold {
                (2, crash.level2_multiplier)
            } else if drop >= crash.level1_threshold {
                (1, crash.level1_multiplier)
            } else {
                continue;
            };

            let base_amount = weekly_budget * ratio * class_weight;
            opportunities.insert(
                symbol.clone(),
                CrashOpportunity {
                    symbol: symbol.clone(),
                    current_price,
                    avg_price,
                    drop_percent: drop,
                    tier,
                    multiplier,
                    base_amount,
                    suggested_amount: base_amount * multiplier,
                },
            );
        }

        opportunities
    }
}
