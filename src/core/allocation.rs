//! The weekly allocation calculator.
//!
//! Pure arithmetic over a budget, target ratios and a price snapshot. Every
//! method is deterministic: identical inputs produce bit-for-bit identical
//! plans, which is what makes the purchase records reproducible.

use crate::core::config::AppConfig;
use crate::core::error::PlanError;
use std::collections::{BTreeMap, HashMap};

/// Integer-unit rounding may push the equity total past the nominal budget;
/// anything up to this factor of the budget is accepted before the
/// correction pass starts shaving shares.
pub const OVERSHOOT_FACTOR: f64 = 1.5;

/// Deviation from the target ratio that triggers a rebalancing correction.
pub const REBALANCE_TRIGGER: f64 = 0.05;

/// At most this share of the weekly budget goes into a single corrective
/// purchase.
const MAX_CORRECTION_SHARE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetClass {
    /// Traded in whole shares.
    Stock,
    /// Divisible; fractional quantities are fine.
    Crypto,
}

/// Purchase quantity in the unit native to the asset class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Units {
    Shares(u64),
    Quantity(f64),
}

impl Units {
    pub fn as_f64(&self) -> f64 {
        match self {
            Units::Shares(n) => *n as f64,
            Units::Quantity(q) => *q,
        }
    }
}

/// One line of a purchase plan. For share-based assets `amount` is exactly
/// `units * price`; for divisible assets `amount` is authoritative and
/// `units` is derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseLine {
    pub symbol: String,
    pub ratio: f64,
    pub price: f64,
    pub amount: f64,
    pub units: Units,
}

/// The complete weekly plan. Built once per calculation and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct InvestmentPlan {
    pub stock_total: f64,
    pub crypto_total: f64,
    /// `crypto_total` expressed in TAO at the snapshot's conversion price.
    pub crypto_tao_amount: f64,
    pub stocks: BTreeMap<String, PurchaseLine>,
    pub cryptos: BTreeMap<String, PurchaseLine>,
    pub total_budget: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnitBreakdown {
    pub units: Units,
    pub actual_cost: f64,
    pub remainder: f64,
    /// Fraction of the requested amount that actually gets invested.
    pub efficiency: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssetPerformance {
    pub initial_value: f64,
    pub final_value: f64,
    pub profit: f64,
    pub return_percent: f64,
}

/// What the plan would be worth after applying hypothetical price changes.
#[derive(Debug, Clone, PartialEq)]
pub struct OutcomeProjection {
    pub initial_value: f64,
    pub final_value: f64,
    pub total_return: f64,
    pub return_percent: f64,
    pub assets: BTreeMap<String, AssetPerformance>,
}

pub struct AllocationEngine<'a> {
    config: &'a AppConfig,
}

impl<'a> AllocationEngine<'a> {
    pub fn new(config: &'a AppConfig) -> Self {
        AllocationEngine { config }
    }

    /// Computes the weekly purchase plan.
    ///
    /// Equities are planned first against the USD baseline; the crypto
    /// budget is then derived from what the equities *actually* cost, so
    /// the configured class weights hold for real money spent, not for the
    /// nominal budget. The crypto budget is capped at the TAO limit
    /// expressed in USD at `tao_price`.
    pub fn weekly_plan(
        &self,
        stock_prices: &HashMap<String, f64>,
        crypto_prices: &HashMap<String, f64>,
        tao_price: f64,
    ) -> Result<InvestmentPlan, PlanError> {
        let portfolio = &self.config.portfolio;
        let limits = &self.config.limits;

        if tao_price <= 0.0 {
            return Err(PlanError::InvalidBudget(format!(
                "conversion price must be positive, got {tao_price}"
            )));
        }
        if limits.weekly_usd_limit <= 0.0 || limits.weekly_tao_limit <= 0.0 {
            return Err(PlanError::InvalidBudget(
                "weekly limits must be positive".to_string(),
            ));
        }
        if portfolio.stock_weight <= 0.0 {
            return Err(PlanError::InvalidBudget(
                "stock weight must be positive".to_string(),
            ));
        }
        require_prices(&portfolio.stock_allocation, stock_prices)?;
        require_prices(&portfolio.crypto_allocation, crypto_prices)?;

        let stocks = self.stock_lines(limits.weekly_usd_limit, stock_prices);
        let stock_total: f64 = stocks.values().map(|line| line.amount).sum();

        // Crypto funding is proportional to actual equity spend, capped at
        // the TAO limit in USD.
        let target_crypto = stock_total * (portfolio.crypto_weight / portfolio.stock_weight);
        let tao_cap = limits.weekly_tao_limit * tao_price;
        let crypto_total = target_crypto.min(tao_cap);

        let cryptos = self.crypto_lines(crypto_total, crypto_prices);

        Ok(InvestmentPlan {
            stock_total,
            crypto_total,
            crypto_tao_amount: crypto_total / tao_price,
            stocks,
            cryptos,
            total_budget: stock_total + crypto_total,
        })
    }

    /// Whole-share allocation against a nominal budget.
    ///
    /// Ratios are normalized over the symbols present in the price map.
    /// Share counts round half away from zero, with a floor of one share
    /// per allocated symbol. If the mandatory floor plus rounding pushes
    /// the total past `budget * OVERSHOOT_FACTOR`, the correction pass
    /// repeatedly removes one share from the most expensive symbol still
    /// holding more than one (ties broken by symbol name), stopping once
    /// under the bound or when every symbol is down to a single share.
    fn stock_lines(
        &self,
        budget: f64,
        prices: &HashMap<String, f64>,
    ) -> BTreeMap<String, PurchaseLine> {
        let allocation = &self.config.portfolio.stock_allocation;
        let ratio_sum: f64 = allocation
            .iter()
            .filter(|(symbol, _)| prices.contains_key(*symbol))
            .map(|(_, ratio)| ratio)
            .sum();
        if ratio_sum <= 0.0 {
            return BTreeMap::new();
        }

        let mut lines = BTreeMap::new();
        for (symbol, &ratio) in allocation {
            let Some(&price) = prices.get(symbol) else {
                continue;
            };
            let target_amount = budget * (ratio / ratio_sum);
            let target_shares = target_amount / price;
            let shares = (target_shares.round() as u64).max(1);
            lines.insert(
                symbol.clone(),
                PurchaseLine {
                    symbol: symbol.clone(),
                    ratio,
                    price,
                    amount: shares as f64 * price,
                    units: Units::Shares(shares),
                },
            );
        }

        let max_budget = budget * OVERSHOOT_FACTOR;
        loop {
            let total: f64 = lines.values().map(|line| line.amount).sum();
            if total <= max_budget {
                break;
            }

            // Highest price wins; the ascending symbol iteration plus the
            // strict comparison makes the tie-break the lexicographically
            // smallest symbol.
            let mut candidate: Option<String> = None;
            let mut max_price = 0.0;
            for line in lines.values() {
                if let Units::Shares(n) = line.units {
                    if n > 1 && line.price > max_price {
                        max_price = line.price;
                        candidate = Some(line.symbol.clone());
                    }
                }
            }

            match candidate {
                Some(symbol) => {
                    if let Some(line) = lines.get_mut(&symbol) {
                        if let Units::Shares(n) = &mut line.units {
                            *n -= 1;
                            line.amount = *n as f64 * line.price;
                        }
                    }
                }
                // Every symbol is down to one share; over budget is now a
                // terminal state, not an error.
                None => break,
            }
        }

        lines
    }

    /// Fractional allocation of an already-capped budget. Amounts sum to
    /// the budget by construction, so no correction pass exists here.
    fn crypto_lines(
        &self,
        budget: f64,
        prices: &HashMap<String, f64>,
    ) -> BTreeMap<String, PurchaseLine> {
        let mut lines = BTreeMap::new();
        for (symbol, &ratio) in &self.config.portfolio.crypto_allocation {
            let Some(&price) = prices.get(symbol) else {
                continue;
            };
            let amount = budget * ratio;
            lines.insert(
                symbol.clone(),
                PurchaseLine {
                    symbol: symbol.clone(),
                    ratio,
                    price,
                    amount,
                    units: Units::Quantity(amount / price),
                },
            );
        }
        lines
    }

    /// Splits a weekly budget so that holdings drift back toward target
    /// ratios.
    ///
    /// A symbol whose pre-purchase value share deviates from its target by
    /// more than [`REBALANCE_TRIGGER`] receives a corrective amount, never
    /// negative and never more than half the weekly budget. Whatever is
    /// left (or everything, when nothing deviates or there are no holdings
    /// yet) is distributed by target ratio.
    pub fn rebalancing_adjustment(
        &self,
        holdings: &HashMap<String, f64>,
        targets: &BTreeMap<String, f64>,
        weekly_budget: f64,
    ) -> BTreeMap<String, f64> {
        let current_total: f64 = holdings.values().sum();
        let projected_total = current_total + weekly_budget;

        let mut adjustments = BTreeMap::new();
        if current_total > 0.0 {
            for (symbol, &target_ratio) in targets {
                let current_value = holdings.get(symbol).copied().unwrap_or(0.0);
                let current_ratio = current_value / current_total;
                if (current_ratio - target_ratio).abs() > REBALANCE_TRIGGER {
                    let target_value = projected_total * target_ratio;
                    let correction = (target_value - current_value)
                        .clamp(0.0, weekly_budget * MAX_CORRECTION_SHARE);
                    adjustments.insert(symbol.clone(), correction);
                }
            }
        }

        if adjustments.is_empty() {
            for (symbol, &target_ratio) in targets {
                adjustments.insert(symbol.clone(), weekly_budget * target_ratio);
            }
        } else {
            let corrected: f64 = adjustments.values().sum();
            let remaining = weekly_budget - corrected;
            if remaining > 0.0 {
                for (symbol, &target_ratio) in targets {
                    *adjustments.entry(symbol.clone()).or_insert(0.0) +=
                        remaining * target_ratio;
                }
            }
        }

        adjustments
    }

    /// How many units a given amount buys, and how much of it is actually
    /// spent. Share-based assets floor to whole shares and report the
    /// unspent remainder; divisible assets spend the amount exactly.
    pub fn optimal_units(amount: f64, price: f64, class: AssetClass) -> UnitBreakdown {
        match class {
            AssetClass::Stock => {
                let shares = if price > 0.0 {
                    (amount / price).floor() as u64
                } else {
                    0
                };
                let actual_cost = shares as f64 * price;
                UnitBreakdown {
                    units: Units::Shares(shares),
                    actual_cost,
                    remainder: amount - actual_cost,
                    efficiency: if amount > 0.0 {
                        actual_cost / amount
                    } else {
                        0.0
                    },
                }
            }
            AssetClass::Crypto => {
                let quantity = if price > 0.0 { round6(amount / price) } else { 0.0 };
                UnitBreakdown {
                    units: Units::Quantity(quantity),
                    actual_cost: amount,
                    remainder: 0.0,
                    efficiency: 1.0,
                }
            }
        }
    }
}

impl InvestmentPlan {
    /// Applies hypothetical per-symbol price changes (fractions, e.g. 0.05
    /// for +5%) to every line and aggregates the outcome.
    pub fn project_outcome(&self, price_changes: &HashMap<String, f64>) -> OutcomeProjection {
        let mut assets = BTreeMap::new();
        let mut initial_value = 0.0;
        let mut final_value = 0.0;

        for line in self.stocks.values().chain(self.cryptos.values()) {
            let change = price_changes.get(&line.symbol).copied().unwrap_or(0.0);
            let line_final = line.amount * (1.0 + change);
            initial_value += line.amount;
            final_value += line_final;
            assets.insert(
                line.symbol.clone(),
                AssetPerformance {
                    initial_value: line.amount,
                    final_value: line_final,
                    profit: line_final - line.amount,
                    return_percent: change * 100.0,
                },
            );
        }

        let total_return = final_value - initial_value;
        OutcomeProjection {
            initial_value,
            final_value,
            total_return,
            return_percent: if initial_value > 0.0 {
                (total_return / initial_value) * 100.0
            } else {
                0.0
            },
            assets,
        }
    }
}

/// Every configured symbol must carry a strictly positive price, otherwise
/// the whole plan aborts. A non-positive quote counts as missing.
fn require_prices(
    allocation: &BTreeMap<String, f64>,
    prices: &HashMap<String, f64>,
) -> Result<(), PlanError> {
    let missing: Vec<String> = allocation
        .keys()
        .filter(|symbol| !prices.get(*symbol).is_some_and(|p| *p > 0.0))
        .cloned()
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(PlanError::MissingPrice { symbols: missing })
    }
}

fn round6(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::AppConfig;

    fn test_config() -> AppConfig {
        serde_yaml::from_str(
            r#"
portfolio:
  stock_weight: 0.6
  crypto_weight: 0.4
  stock_allocation:
    QQQ: 0.5
    VOO: 0.3
    GLDM: 0.2
  crypto_allocation:
    BTC: 0.4
    ETH: 0.3
    SOL: 0.2
    BNB: 0.1
limits:
  weekly_usd_limit: 2000
  weekly_tao_limit: 4.0
"#,
        )
        .unwrap()
    }

    fn stock_prices() -> HashMap<String, f64> {
        HashMap::from([
            ("QQQ".to_string(), 350.0),
            ("VOO".to_string(), 420.0),
            ("GLDM".to_string(), 36.0),
        ])
    }

    fn crypto_prices() -> HashMap<String, f64> {
        HashMap::from([
            ("BTC".to_string(), 45000.0),
            ("ETH".to_string(), 2800.0),
            ("SOL".to_string(), 98.0),
            ("BNB".to_string(), 280.0),
        ])
    }

    #[test]
    fn test_weekly_plan_share_rounding() {
        let config = test_config();
        let engine = AllocationEngine::new(&config);

        let plan = engine
            .weekly_plan(&stock_prices(), &crypto_prices(), 500.0)
            .unwrap();

        // 1000/350 = 2.86 -> 3 shares, 600/420 = 1.43 -> 1 share,
        // 400/36 = 11.1 -> 11 shares.
        assert_eq!(plan.stocks["QQQ"].units, Units::Shares(3));
        assert_eq!(plan.stocks["QQQ"].amount, 1050.0);
        assert_eq!(plan.stocks["VOO"].units, Units::Shares(1));
        assert_eq!(plan.stocks["VOO"].amount, 420.0);
        assert_eq!(plan.stocks["GLDM"].units, Units::Shares(11));
        assert_eq!(plan.stocks["GLDM"].amount, 396.0);

        // Under the 1.5x cap, so no correction triggered.
        assert_eq!(plan.stock_total, 1866.0);
        assert!(plan.stock_total <= 2000.0 * OVERSHOOT_FACTOR);
    }

    #[test]
    fn test_weekly_plan_crypto_budget_follows_stock_spend() {
        let config = test_config();
        let engine = AllocationEngine::new(&config);
        let tao_price = 500.0;

        let plan = engine
            .weekly_plan(&stock_prices(), &crypto_prices(), tao_price)
            .unwrap();

        // 1866 * (0.4 / 0.6) = 1244, under the 4 TAO * 500 = 2000 cap.
        let expected_crypto = 1866.0 * (0.4 / 0.6);
        assert!((plan.crypto_total - expected_crypto).abs() < 1e-9);
        assert!((plan.crypto_tao_amount - expected_crypto / tao_price).abs() < 1e-12);
        assert!((plan.total_budget - (1866.0 + expected_crypto)).abs() < 1e-9);

        // Amounts follow ratios exactly and quantities are fractional.
        let btc = &plan.cryptos["BTC"];
        assert!((btc.amount - expected_crypto * 0.4).abs() < 1e-9);
        assert_eq!(btc.units, Units::Quantity(btc.amount / 45000.0));
        let line_sum: f64 = plan.cryptos.values().map(|l| l.amount).sum();
        assert!((line_sum - plan.crypto_total).abs() < 1e-9);
    }

    #[test]
    fn test_weekly_plan_tao_cap_applies() {
        let config = test_config();
        let engine = AllocationEngine::new(&config);

        // A low conversion price makes the cap bind: 4 TAO * 100 = 400 USD.
        let plan = engine
            .weekly_plan(&stock_prices(), &crypto_prices(), 100.0)
            .unwrap();

        assert_eq!(plan.crypto_total, 400.0);
        assert_eq!(plan.crypto_tao_amount, 4.0);
        assert!(plan.crypto_total < plan.stock_total * (0.4 / 0.6));
    }

    #[test]
    fn test_weekly_plan_every_stock_gets_a_share() {
        let mut config = test_config();
        // A tiny ratio whose target amount rounds to zero shares.
        config.portfolio.stock_allocation = [
            ("QQQ".to_string(), 0.99),
            ("VOO".to_string(), 0.01),
        ]
        .into();
        let engine = AllocationEngine::new(&config);

        let plan = engine
            .weekly_plan(&stock_prices(), &crypto_prices(), 500.0)
            .unwrap();

        // 20/420 = 0.05 shares still buys one whole share.
        assert_eq!(plan.stocks["VOO"].units, Units::Shares(1));
        for line in plan.stocks.values() {
            assert!(matches!(line.units, Units::Shares(n) if n >= 1));
        }
    }

    #[test]
    fn test_overflow_correction_shaves_most_expensive() {
        let mut config = test_config();
        config.limits.weekly_usd_limit = 100.0;
        config.portfolio.stock_allocation = [
            ("AAA".to_string(), 0.5),
            ("BBB".to_string(), 0.5),
        ]
        .into();
        let engine = AllocationEngine::new(&config);

        // 50/30 = 1.67 -> 2 shares of AAA (60), 50/95 = 0.53 -> 1 share of
        // BBB (95): total 155 > 150 cap. BBB is the most expensive symbol
        // but sits at its one-share floor, so AAA loses a share instead.
        let prices = HashMap::from([("AAA".to_string(), 30.0), ("BBB".to_string(), 95.0)]);
        let plan = engine.weekly_plan(&prices, &crypto_prices(), 500.0).unwrap();

        assert_eq!(plan.stocks["AAA"].units, Units::Shares(1));
        assert_eq!(plan.stocks["BBB"].units, Units::Shares(1));
        assert_eq!(plan.stock_total, 125.0);
        assert!(plan.stock_total <= 100.0 * OVERSHOOT_FACTOR);
    }

    #[test]
    fn test_overflow_correction_terminates_at_one_share_floor() {
        let mut config = test_config();
        config.limits.weekly_usd_limit = 100.0;
        config.portfolio.stock_allocation = [
            ("AAA".to_string(), 0.4),
            ("BBB".to_string(), 0.4),
            ("CCC".to_string(), 0.2),
        ]
        .into();
        let engine = AllocationEngine::new(&config);

        // The one-share floor alone overshoots: 1x60 + 1x60 + 1x55 = 175 >
        // 150 cap, and no symbol has a share to give up. Over budget is a
        // terminal state, not an error.
        let prices = HashMap::from([
            ("AAA".to_string(), 60.0),
            ("BBB".to_string(), 60.0),
            ("CCC".to_string(), 55.0),
        ]);
        let plan = engine.weekly_plan(&prices, &crypto_prices(), 500.0).unwrap();

        assert_eq!(plan.stock_total, 175.0);
        for line in plan.stocks.values() {
            assert_eq!(line.units, Units::Shares(1));
        }
    }

    #[test]
    fn test_overflow_correction_tie_breaks_by_symbol() {
        let mut config = test_config();
        config.limits.weekly_usd_limit = 260.0;
        config.portfolio.stock_allocation = [
            ("AAA".to_string(), 0.45),
            ("BBB".to_string(), 0.45),
            ("CCC".to_string(), 0.10),
        ]
        .into();
        let engine = AllocationEngine::new(&config);

        // 117/75 = 1.56 -> 2 shares each of AAA and BBB (150 + 150),
        // 26/130 = 0.2 -> 1 share of CCC (130): total 430 > 390 cap. CCC
        // is the most expensive but is at its floor; AAA and BBB tie at 75
        // and the lexicographically smaller AAA loses the share, bringing
        // the total to 355.
        let prices = HashMap::from([
            ("AAA".to_string(), 75.0),
            ("BBB".to_string(), 75.0),
            ("CCC".to_string(), 130.0),
        ]);
        let plan = engine.weekly_plan(&prices, &crypto_prices(), 500.0).unwrap();

        assert_eq!(plan.stocks["AAA"].units, Units::Shares(1));
        assert_eq!(plan.stocks["BBB"].units, Units::Shares(2));
        assert_eq!(plan.stocks["CCC"].units, Units::Shares(1));
        assert_eq!(plan.stock_total, 355.0);
    }

    #[test]
    fn test_weekly_plan_missing_price_aborts() {
        let config = test_config();
        let engine = AllocationEngine::new(&config);

        let mut prices = stock_prices();
        prices.remove("VOO");
        let err = engine
            .weekly_plan(&prices, &crypto_prices(), 500.0)
            .unwrap_err();
        assert_eq!(
            err,
            PlanError::MissingPrice {
                symbols: vec!["VOO".to_string()]
            }
        );

        // A non-positive quote counts as missing too.
        let mut prices = stock_prices();
        prices.insert("QQQ".to_string(), 0.0);
        let err = engine
            .weekly_plan(&prices, &crypto_prices(), 500.0)
            .unwrap_err();
        assert_eq!(
            err,
            PlanError::MissingPrice {
                symbols: vec!["QQQ".to_string()]
            }
        );
    }

    #[test]
    fn test_weekly_plan_rejects_bad_conversion_price() {
        let config = test_config();
        let engine = AllocationEngine::new(&config);

        let err = engine
            .weekly_plan(&stock_prices(), &crypto_prices(), 0.0)
            .unwrap_err();
        assert!(matches!(err, PlanError::InvalidBudget(_)));
    }

    #[test]
    fn test_weekly_plan_is_deterministic() {
        let config = test_config();
        let engine = AllocationEngine::new(&config);

        let first = engine
            .weekly_plan(&stock_prices(), &crypto_prices(), 500.0)
            .unwrap();
        let second = engine
            .weekly_plan(&stock_prices(), &crypto_prices(), 500.0)
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_rebalancing_plain_distribution_when_on_target() {
        let config = test_config();
        let engine = AllocationEngine::new(&config);
        let targets: BTreeMap<String, f64> =
            [("QQQ".to_string(), 0.5), ("VOO".to_string(), 0.5)].into();

        let holdings =
            HashMap::from([("QQQ".to_string(), 5000.0), ("VOO".to_string(), 5000.0)]);
        let adjustments = engine.rebalancing_adjustment(&holdings, &targets, 1000.0);

        assert_eq!(adjustments["QQQ"], 500.0);
        assert_eq!(adjustments["VOO"], 500.0);
    }

    #[test]
    fn test_rebalancing_corrects_underweight_symbol() {
        let config = test_config();
        let engine = AllocationEngine::new(&config);
        let targets: BTreeMap<String, f64> =
            [("QQQ".to_string(), 0.5), ("VOO".to_string(), 0.5)].into();

        // QQQ is at 30% of the pre-purchase total, 20 points under target.
        let holdings =
            HashMap::from([("QQQ".to_string(), 3000.0), ("VOO".to_string(), 7000.0)]);
        let adjustments = engine.rebalancing_adjustment(&holdings, &targets, 1000.0);

        // Needed: 0.5 * 11000 - 3000 = 2500, clamped to 500 (half the
        // budget). VOO is overweight: its correction clamps to 0. The
        // remaining 500 is then spread by target ratio.
        assert_eq!(adjustments["QQQ"], 500.0 + 250.0);
        assert_eq!(adjustments["VOO"], 0.0 + 250.0);
        let total: f64 = adjustments.values().sum();
        assert!((total - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_rebalancing_empty_holdings_skips_correction() {
        let config = test_config();
        let engine = AllocationEngine::new(&config);
        let targets: BTreeMap<String, f64> =
            [("QQQ".to_string(), 0.7), ("VOO".to_string(), 0.3)].into();

        let adjustments = engine.rebalancing_adjustment(&HashMap::new(), &targets, 1000.0);
        assert_eq!(adjustments["QQQ"], 700.0);
        assert_eq!(adjustments["VOO"], 300.0);
    }

    #[test]
    fn test_optimal_units_stock() {
        let breakdown = AllocationEngine::optimal_units(1000.0, 350.0, AssetClass::Stock);
        assert_eq!(breakdown.units, Units::Shares(2));
        assert_eq!(breakdown.actual_cost, 700.0);
        assert_eq!(breakdown.remainder, 300.0);
        assert!((breakdown.efficiency - 0.7).abs() < 1e-12);

        let empty = AllocationEngine::optimal_units(0.0, 350.0, AssetClass::Stock);
        assert_eq!(empty.units, Units::Shares(0));
        assert_eq!(empty.efficiency, 0.0);
    }

    #[test]
    fn test_optimal_units_crypto() {
        let breakdown = AllocationEngine::optimal_units(450.0, 45000.0, AssetClass::Crypto);
        assert_eq!(breakdown.units, Units::Quantity(0.01));
        assert_eq!(breakdown.actual_cost, 450.0);
        assert_eq!(breakdown.remainder, 0.0);
        assert_eq!(breakdown.efficiency, 1.0);

        // Quantities round to six decimals.
        let breakdown = AllocationEngine::optimal_units(100.0, 2800.0, AssetClass::Crypto);
        assert_eq!(breakdown.units, Units::Quantity(0.035714));
    }

    #[test]
    fn test_project_outcome() {
        let config = test_config();
        let engine = AllocationEngine::new(&config);
        let plan = engine
            .weekly_plan(&stock_prices(), &crypto_prices(), 500.0)
            .unwrap();

        let changes = HashMap::from([
            ("QQQ".to_string(), 0.10),
            ("BTC".to_string(), -0.20),
        ]);
        let outcome = plan.project_outcome(&changes);

        assert!((outcome.initial_value - plan.total_budget).abs() < 1e-9);
        let qqq = &outcome.assets["QQQ"];
        assert!((qqq.profit - 105.0).abs() < 1e-9);
        assert_eq!(qqq.return_percent, 10.0);
        let voo = &outcome.assets["VOO"];
        assert_eq!(voo.profit, 0.0);
        let expected_total: f64 = outcome.assets.values().map(|a| a.profit).sum();
        assert!((outcome.total_return - expected_total).abs() < 1e-9);
    }
}
