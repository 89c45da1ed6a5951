use crate::core::error::ConfigError;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::{fs, path::PathBuf};
use tracing::debug;

/// Tolerance when checking that ratio maps and weights sum to 1.0.
pub const RATIO_EPSILON: f64 = 0.01;

/// Target weights and per-symbol ratios for the fixed basket. Allocation
/// maps are ordered so every computation iterates symbols deterministically.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PortfolioConfig {
    pub stock_weight: f64,
    pub crypto_weight: f64,
    pub stock_allocation: BTreeMap<String, f64>,
    pub crypto_allocation: BTreeMap<String, f64>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LimitsConfig {
    /// Weekly equity budget baseline in USD.
    pub weekly_usd_limit: f64,
    /// Weekly crypto ceiling expressed in TAO.
    pub weekly_tao_limit: f64,
}

/// Drop thresholds and purchase multipliers for the three crash tiers,
/// plus per-asset-class lookback windows for the average-cost query.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CrashDetectionConfig {
    pub stock_lookback_days: u32,
    pub crypto_lookback_days: u32,
    pub level1_threshold: f64,
    pub level1_multiplier: f64,
    pub level2_threshold: f64,
    pub level2_multiplier: f64,
    pub level3_threshold: f64,
    pub level3_multiplier: f64,
}

impl Default for CrashDetectionConfig {
    fn default() -> Self {
        CrashDetectionConfig {
            stock_lookback_days: 30,
            crypto_lookback_days: 14,
            level1_threshold: 0.10,
            level1_multiplier: 1.5,
            level2_threshold: 0.20,
            level2_multiplier: 2.0,
            level3_threshold: 0.30,
            level3_multiplier: 3.0,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct YahooProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BinanceProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub yahoo: Option<YahooProviderConfig>,
    pub binance: Option<BinanceProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            yahoo: Some(YahooProviderConfig {
                base_url: "https://query1.finance.yahoo.com".to_string(),
            }),
            binance: Some(BinanceProviderConfig {
                base_url: "https://api.binance.com".to_string(),
            }),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub portfolio: PortfolioConfig,
    pub limits: LimitsConfig,
    #[serde(default)]
    pub crash_detection: CrashDetectionConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    /// Prices used when a provider fails for a symbol. Applying a fallback
    /// is always logged; symbols without one fail the whole snapshot.
    #[serde(default)]
    pub fallback_prices: BTreeMap<String, f64>,
    pub history_path: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs =
            ProjectDirs::from("", "", "drip").context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    /// Path of the JSON history file, honoring a custom `history_path`.
    pub fn history_file_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.history_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs =
            ProjectDirs::from("", "", "drip").context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().join("history.json"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// Structural validation run once at load time. The calculator may
    /// assume a valid configuration afterwards, though it still rejects
    /// non-positive budgets at the point of use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();

        let weight_sum = self.portfolio.stock_weight + self.portfolio.crypto_weight;
        if (weight_sum - 1.0).abs() > RATIO_EPSILON {
            problems.push(format!(
                "stock_weight + crypto_weight must sum to 1.0, got {weight_sum:.3}"
            ));
        }
        if self.portfolio.stock_weight <= 0.0 || self.portfolio.crypto_weight <= 0.0 {
            problems.push("asset class weights must be positive".to_string());
        }

        for (name, allocation) in [
            ("stock_allocation", &self.portfolio.stock_allocation),
            ("crypto_allocation", &self.portfolio.crypto_allocation),
        ] {
            if allocation.is_empty() {
                problems.push(format!("{name} must not be empty"));
                continue;
            }
            let sum: f64 = allocation.values().sum();
            if (sum - 1.0).abs() > RATIO_EPSILON {
                problems.push(format!("{name} ratios must sum to 1.0, got {sum:.3}"));
            }
            if let Some((symbol, _)) = allocation.iter().find(|(_, r)| **r <= 0.0) {
                problems.push(format!("{name} ratio for {symbol} must be positive"));
            }
        }

        if self.limits.weekly_usd_limit <= 0.0 {
            problems.push("weekly_usd_limit must be greater than 0".to_string());
        }
        if self.limits.weekly_tao_limit <= 0.0 {
            problems.push("weekly_tao_limit must be greater than 0".to_string());
        }

        let c = &self.crash_detection;
        if !(0.0 < c.level1_threshold
            && c.level1_threshold < c.level2_threshold
            && c.level2_threshold < c.level3_threshold)
        {
            problems.push("crash thresholds must be positive and ascending".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError { problems })
        }
    }
}
