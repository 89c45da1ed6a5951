pub mod binance;
pub mod yahoo_finance;

// Re-export so callers wire providers without reaching into core
pub use crate::core::cache::Cache;
pub use binance::BinanceProvider;
pub use yahoo_finance::YahooFinanceProvider;
