//! Core business logic abstractions

pub mod allocation;
pub mod cache;
pub mod config;
pub mod crash;
pub mod error;
pub mod log;
pub mod price;

// Re-export main types for cleaner imports
pub use allocation::{AllocationEngine, AssetClass, InvestmentPlan, PurchaseLine, Units};
pub use cache::Cache;
pub use config::AppConfig;
pub use crash::{AverageCostLookup, CrashDetector, CrashOpportunity};
pub use error::{FetchError, PlanError};
pub use price::{MarketSnapshot, PriceProvider};
