//! Configuration for options analytics

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, Result};

/// Environment variable prefix, e.g. `OPTIONS_ANALYTICS__MARKET__RISK_FREE_RATE`
pub const ENV_PREFIX: &str = "OPTIONS_ANALYTICS";

/// Top-level analytics configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Market assumptions
    pub market: MarketConfig,
    /// Payoff diagram grid
    pub payoff: PayoffConfig,
    /// Implied volatility solver
    pub solver: SolverConfig,
    /// Option chain processing
    pub chain: ChainConfig,
}

/// Market assumptions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    /// Ticker analysed when none is given
    pub default_ticker: String,
    /// Annualized risk-free rate
    pub risk_free_rate: f64,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            default_ticker: "SPY".to_string(),
            risk_free_rate: 0.05,
        }
    }
}

/// Payoff diagram grid settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayoffConfig {
    /// Grid spans spot * (1 - range_percent) ..= spot * (1 + range_percent)
    pub range_percent: f64,
    /// Number of grid prices
    pub grid_points: usize,
}

impl Default for PayoffConfig {
    fn default() -> Self {
        Self {
            range_percent: 0.20,
            grid_points: 200,
        }
    }
}

/// Implied volatility solver settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub tolerance: f64,
    pub max_iterations: u32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            lower_bound: crate::volatility::MIN_VOLATILITY,
            upper_bound: crate::volatility::MAX_VOLATILITY,
            tolerance: crate::volatility::DEFAULT_TOLERANCE,
            max_iterations: crate::volatility::DEFAULT_MAX_ITERATIONS,
        }
    }
}

/// Option chain processing settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Evaluate large chains on the rayon pool
    pub parallel: bool,
    /// Minimum chain length before going parallel
    pub parallel_threshold: usize,
    /// Drop quotes with zero volume or open interest before solving
    pub require_liquidity: bool,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            parallel_threshold: 64,
            require_liquidity: true,
        }
    }
}

impl AnalyticsConfig {
    /// Load defaults, then the optional file, then environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::layered(path, Self::environment())
    }

    /// Like [`load`](Self::load), reading overrides from `vars` instead of
    /// the process environment. Keys use the same
    /// `OPTIONS_ANALYTICS__SECTION__KEY` form.
    pub fn load_with_vars(path: Option<&Path>, vars: config::Map<String, String>) -> Result<Self> {
        Self::layered(path, Self::environment().source(Some(vars)))
    }

    fn environment() -> config::Environment {
        config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
    }

    fn layered(path: Option<&Path>, environment: config::Environment) -> Result<Self> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Self::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }

        let settings = builder.add_source(environment).build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::load(Some(path.as_ref()))
    }

    /// Reject settings the analytics cannot run with
    pub fn validate(&self) -> Result<()> {
        if !self.market.risk_free_rate.is_finite() {
            return Err(AnalyticsError::Config(
                "market.risk_free_rate must be finite".to_string(),
            ));
        }

        let payoff = &self.payoff;
        if !(payoff.range_percent > 0.0 && payoff.range_percent < 1.0) {
            return Err(AnalyticsError::Config(format!(
                "payoff.range_percent must be in (0, 1), got {}",
                payoff.range_percent
            )));
        }
        if payoff.grid_points < 2 {
            return Err(AnalyticsError::Config(format!(
                "payoff.grid_points must be at least 2, got {}",
                payoff.grid_points
            )));
        }

        let solver = &self.solver;
        if !(solver.lower_bound > 0.0 && solver.lower_bound < solver.upper_bound)
            || !solver.upper_bound.is_finite()
        {
            return Err(AnalyticsError::Config(format!(
                "solver bounds must satisfy 0 < lower < upper, got [{}, {}]",
                solver.lower_bound, solver.upper_bound
            )));
        }
        if !(solver.tolerance > 0.0) {
            return Err(AnalyticsError::Config(
                "solver.tolerance must be positive".to_string(),
            ));
        }
        if solver.max_iterations == 0 {
            return Err(AnalyticsError::Config(
                "solver.max_iterations must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
