//! Domain error types for the calculator core and the price providers.

use thiserror::Error;

/// Failures of the allocation calculator. A plan is computed whole or not at
/// all; a partial plan would misrepresent the total budget.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PlanError {
    /// One or more configured symbols had no usable (strictly positive)
    /// price in the supplied snapshot.
    #[error("no price available for: {}", symbols.join(", "))]
    MissingPrice { symbols: Vec<String> },

    /// A budget, weight or conversion price was non-positive at the point
    /// of use.
    #[error("invalid budget: {0}")]
    InvalidBudget(String),
}

/// Failures of a price provider. These are explicit so callers can decide
/// whether to apply a configured fallback price; the calculator never
/// receives silently substituted data.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request for {symbol} failed: {source}")]
    Http {
        symbol: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("malformed price response for {symbol}: {reason}")]
    Malformed { symbol: String, reason: String },

    #[error("no price data for {symbol}")]
    NoData { symbol: String },
}

/// Structural configuration problems found at load time.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("invalid configuration: {}", problems.join("; "))]
pub struct ConfigError {
    pub problems: Vec<String>,
}
