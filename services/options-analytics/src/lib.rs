//! Options Analytics
//! Strategy payoff modeling and implied volatility across option chains
//!
//! Features:
//! - Black-Scholes pricing of European calls and puts
//! - Implied volatility via Brent's method on a fixed volatility bracket
//! - Chain-wide implied volatility, optionally on a rayon worker pool
//! - Multi-leg payoff at expiration with break-evens and structural
//!   unbounded profit/loss detection
//! - Plot-ready payoff diagrams and volatility surfaces
//!
//! Everything here is pure and synchronous. Market data and rendering are
//! supplied by the caller; [`market_data`] reads chain exports from CSV.

pub mod chain;
pub mod chart;
pub mod config;
pub mod error;
pub mod market_data;
pub mod payoff;
pub mod pricing;
pub mod volatility;

pub use chain::{compute_chain_iv, defined_only, ChainIvEngine, ImpliedVolatilityResult, Quote};
pub use chart::{build_surface, BreakEvenMarker, PayoffChart, SurfacePlot, SurfacePoint};
pub use crate::config::{AnalyticsConfig, ChainConfig, MarketConfig, PayoffConfig, SolverConfig};
pub use error::{AnalyticsError, Result};
pub use market_data::{load_chain_csv, read_chain, retain_liquid, time_to_expiration};
pub use payoff::{
    evaluate_strategy, price_grid, Bound, LegAction, PayoffCurve, StrategyLeg, StrategySummary,
    TailTrend, CONTRACT_MULTIPLIER,
};
pub use pricing::{BlackScholes, OptionParameters, OptionType};
pub use volatility::{implied_volatility, VolatilitySolver};
