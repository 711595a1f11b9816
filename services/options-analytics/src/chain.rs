//! Implied volatility across an option chain
//!
//! Every quote is solved independently. Results come back one per quote in
//! input order; quotes whose price no volatility can reproduce carry `None`.

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ChainConfig;
use crate::pricing::OptionType;
use crate::volatility::VolatilitySolver;

/// One row of option chain market data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Strike price of the option
    pub strike: f64,
    /// Expiration date of the contract
    pub expiration: NaiveDate,
    /// Type of option (Call or Put)
    pub option_type: OptionType,
    /// Last traded price
    pub last_price: f64,
    /// Time to expiration in years
    pub time_to_expiration: f64,
    /// Trading volume for this contract
    pub volume: u64,
    /// Total open interest for this contract
    pub open_interest: u64,
}

impl Quote {
    /// Traded today and has open positions
    pub fn is_liquid(&self) -> bool {
        self.volume > 0 && self.open_interest > 0
    }
}

/// A quote paired with its implied volatility
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpliedVolatilityResult {
    #[serde(flatten)]
    pub quote: Quote,
    /// `None` when the solver could not bracket a root
    pub implied_volatility: Option<f64>,
}

impl ImpliedVolatilityResult {
    pub fn is_defined(&self) -> bool {
        self.implied_volatility.is_some()
    }
}

/// Applies the volatility solver to whole chains
#[derive(Debug, Clone)]
pub struct ChainIvEngine {
    solver: VolatilitySolver,
    parallel: bool,
    parallel_threshold: usize,
}

impl Default for ChainIvEngine {
    fn default() -> Self {
        Self::new(VolatilitySolver::default(), &ChainConfig::default())
    }
}

impl ChainIvEngine {
    pub fn new(solver: VolatilitySolver, config: &ChainConfig) -> Self {
        Self {
            solver,
            parallel: config.parallel,
            parallel_threshold: config.parallel_threshold,
        }
    }

    /// Single-threaded engine
    pub fn sequential(solver: VolatilitySolver) -> Self {
        Self {
            solver,
            parallel: false,
            parallel_threshold: usize::MAX,
        }
    }

    pub fn solver(&self) -> &VolatilitySolver {
        &self.solver
    }

    /// Implied volatility for every quote, in input order
    pub fn compute(&self, quotes: &[Quote], spot: f64, rate: f64) -> Vec<ImpliedVolatilityResult> {
        let results: Vec<ImpliedVolatilityResult> =
            if self.parallel && quotes.len() >= self.parallel_threshold {
                debug!(quotes = quotes.len(), "solving chain in parallel");
                quotes
                    .par_iter()
                    .map(|quote| self.solve_quote(quote, spot, rate))
                    .collect()
            } else {
                quotes
                    .iter()
                    .map(|quote| self.solve_quote(quote, spot, rate))
                    .collect()
            };

        let solved = results.iter().filter(|r| r.is_defined()).count();
        info!(
            total = results.len(),
            solved,
            undefined = results.len() - solved,
            "computed chain implied volatility"
        );

        results
    }

    fn solve_quote(&self, quote: &Quote, spot: f64, rate: f64) -> ImpliedVolatilityResult {
        ImpliedVolatilityResult {
            implied_volatility: self.solver.implied_volatility(
                quote.option_type,
                spot,
                quote.strike,
                rate,
                quote.time_to_expiration,
                quote.last_price,
            ),
            quote: quote.clone(),
        }
    }
}

/// Implied volatility for every quote with the default solver, sequentially
pub fn compute_chain_iv(quotes: &[Quote], spot: f64, rate: f64) -> Vec<ImpliedVolatilityResult> {
    ChainIvEngine::sequential(VolatilitySolver::default()).compute(quotes, spot, rate)
}

/// Drops results whose implied volatility is undefined
pub fn defined_only(results: Vec<ImpliedVolatilityResult>) -> Vec<ImpliedVolatilityResult> {
    results.into_iter().filter(|r| r.is_defined()).collect()
}
