//! Error types for options analytics

use thiserror::Error;

/// Analytics error types
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// Unrecognized option kind or out-of-range pricing input
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Malformed strategy leg
    #[error("Invalid leg {index}: {reason}")]
    InvalidLeg {
        /// Position of the offending leg in the strategy
        index: usize,
        /// What is wrong with it
        reason: String,
    },

    /// Price grid that cannot be evaluated
    #[error("Invalid price grid: {0}")]
    InvalidPriceGrid(String),

    /// Configuration could not be loaded or is inconsistent
    #[error("Configuration error: {0}")]
    Config(String),

    /// Option chain data could not be read
    #[error("Market data error: {0}")]
    MarketData(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, AnalyticsError>;

impl AnalyticsError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn invalid_leg(index: usize, reason: impl Into<String>) -> Self {
        Self::InvalidLeg {
            index,
            reason: reason.into(),
        }
    }

    pub fn invalid_price_grid(msg: impl Into<String>) -> Self {
        Self::InvalidPriceGrid(msg.into())
    }

    pub fn market_data(msg: impl Into<String>) -> Self {
        Self::MarketData(msg.into())
    }
}

impl From<config::ConfigError> for AnalyticsError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
