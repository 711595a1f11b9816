//! Multi-leg strategy payoff at expiration
//!
//! A strategy is a caller-owned slice of [`StrategyLeg`]s. Evaluation sums the
//! per-leg P/L over a grid of underlying prices and derives the risk metrics
//! shown next to a payoff diagram: max profit, max loss and break-evens.
//!
//! Max profit and max loss are read off the grid unless the legs make them
//! infinite. That is decided from the legs themselves: net long calls gain
//! without limit as the underlying rises, net short calls lose without limit.
//! The put side is capped because the underlying cannot fall below zero, so
//! it only shows up as a [`TailTrend`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AnalyticsError, Result};
use crate::pricing::OptionType;

/// Shares per listed equity option contract
pub const CONTRACT_MULTIPLIER: f64 = 100.0;

/// Whether a leg is bought or written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegAction {
    Buy,
    Sell,
}

impl LegAction {
    fn sign(self) -> i64 {
        match self {
            LegAction::Buy => 1,
            LegAction::Sell => -1,
        }
    }
}

impl fmt::Display for LegAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LegAction::Buy => f.write_str("buy"),
            LegAction::Sell => f.write_str("sell"),
        }
    }
}

impl FromStr for LegAction {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" | "long" => Ok(LegAction::Buy),
            "sell" | "short" => Ok(LegAction::Sell),
            other => Err(AnalyticsError::invalid_argument(format!(
                "invalid leg action '{other}', must be 'buy' or 'sell'"
            ))),
        }
    }
}

/// Individual option leg within a multi-leg strategy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrategyLeg {
    pub action: LegAction,
    pub option_type: OptionType,
    /// Strike price of the option
    pub strike: f64,
    /// Premium per share paid (buy) or received (sell)
    pub premium: f64,
    /// Number of contracts
    pub contracts: u32,
}

impl StrategyLeg {
    pub fn new(action: LegAction, option_type: OptionType, strike: f64, premium: f64, contracts: u32) -> Self {
        Self {
            action,
            option_type,
            strike,
            premium,
            contracts,
        }
    }

    pub fn buy(option_type: OptionType, strike: f64, premium: f64, contracts: u32) -> Self {
        Self::new(LegAction::Buy, option_type, strike, premium, contracts)
    }

    pub fn sell(option_type: OptionType, strike: f64, premium: f64, contracts: u32) -> Self {
        Self::new(LegAction::Sell, option_type, strike, premium, contracts)
    }

    /// Check the leg at position `index` of a strategy
    pub fn validate(&self, index: usize) -> Result<()> {
        if !self.strike.is_finite() || self.strike <= 0.0 {
            return Err(AnalyticsError::invalid_leg(
                index,
                format!("strike must be positive, got {}", self.strike),
            ));
        }
        if !self.premium.is_finite() || self.premium < 0.0 {
            return Err(AnalyticsError::invalid_leg(
                index,
                format!("premium must be non-negative, got {}", self.premium),
            ));
        }
        if self.contracts == 0 {
            return Err(AnalyticsError::invalid_leg(index, "contracts must be at least 1"));
        }
        Ok(())
    }

    /// P/L of this leg at expiration with the underlying at `price`
    pub fn pnl_at(&self, price: f64) -> f64 {
        let intrinsic = self.option_type.intrinsic(price, self.strike);
        let per_share = match self.action {
            LegAction::Buy => intrinsic - self.premium,
            LegAction::Sell => self.premium - intrinsic,
        };
        per_share * self.contracts as f64 * CONTRACT_MULTIPLIER
    }

    /// Signed contract count: positive long, negative short
    fn signed_contracts(&self) -> i64 {
        self.action.sign() * i64::from(self.contracts)
    }
}

impl FromStr for StrategyLeg {
    type Err = AnalyticsError;

    /// Parses `action:type:strike:premium:contracts`, e.g. `buy:call:100:2.5:1`
    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(':').map(str::trim).collect();
        if parts.len() != 5 {
            return Err(AnalyticsError::invalid_argument(format!(
                "leg '{s}' must look like action:type:strike:premium:contracts"
            )));
        }

        let number = |field: &str, value: &str| -> Result<f64> {
            value
                .parse::<f64>()
                .map_err(|_| AnalyticsError::invalid_argument(format!("leg '{s}': bad {field} '{value}'")))
        };

        Ok(Self {
            action: parts[0].parse()?,
            option_type: parts[1].parse()?,
            strike: number("strike", parts[2])?,
            premium: number("premium", parts[3])?,
            contracts: parts[4].parse().map_err(|_| {
                AnalyticsError::invalid_argument(format!("leg '{s}': bad contracts '{}'", parts[4]))
            })?,
        })
    }
}

/// Max profit or max loss of a strategy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Bound {
    Bounded(f64),
    Unbounded,
}

impl Bound {
    pub fn value(&self) -> Option<f64> {
        match self {
            Bound::Bounded(v) => Some(*v),
            Bound::Unbounded => None,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(self, Bound::Unbounded)
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Bounded(v) => write!(f, "${v:.2}"),
            Bound::Unbounded => f.write_str("Unlimited"),
        }
    }
}

/// Direction the P/L heads in as the underlying moves away from the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TailTrend {
    ProfitIncreasing,
    LossIncreasing,
    Flat,
}

impl TailTrend {
    fn from_exposure(exposure: i64) -> Self {
        match exposure.signum() {
            1 => TailTrend::ProfitIncreasing,
            -1 => TailTrend::LossIncreasing,
            _ => TailTrend::Flat,
        }
    }
}

/// Strategy P/L over a price grid with its risk metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoffCurve {
    /// Underlying prices, ascending
    pub prices: Vec<f64>,
    /// Aggregate P/L at each price
    pub pnl: Vec<f64>,
    pub max_profit: Bound,
    pub max_loss: Bound,
    /// Interpolated zero crossings, ascending
    pub break_evens: Vec<f64>,
    /// Trend as the underlying falls toward zero
    pub lower_tail: TailTrend,
    /// Trend as the underlying rises without limit
    pub upper_tail: TailTrend,
}

/// `points` evenly spaced prices spanning `spot` +/- `range_percent`
pub fn price_grid(spot: f64, range_percent: f64, points: usize) -> Result<Vec<f64>> {
    if !spot.is_finite() || spot <= 0.0 {
        return Err(AnalyticsError::invalid_price_grid(format!(
            "spot must be positive, got {spot}"
        )));
    }
    if !(range_percent > 0.0 && range_percent < 1.0) {
        return Err(AnalyticsError::invalid_price_grid(format!(
            "range must be in (0, 1), got {range_percent}"
        )));
    }
    if points < 2 {
        return Err(AnalyticsError::invalid_price_grid(format!(
            "need at least 2 points, got {points}"
        )));
    }

    let start = spot * (1.0 - range_percent);
    let end = spot * (1.0 + range_percent);
    let step = (end - start) / (points - 1) as f64;

    let mut grid: Vec<f64> = (0..points).map(|i| start + i as f64 * step).collect();
    grid[points - 1] = end;
    Ok(grid)
}

/// Evaluate a strategy at expiration across `prices`
pub fn evaluate_strategy(legs: &[StrategyLeg], prices: &[f64]) -> Result<PayoffCurve> {
    if legs.is_empty() {
        return Err(AnalyticsError::invalid_argument("strategy has no legs"));
    }
    for (index, leg) in legs.iter().enumerate() {
        leg.validate(index)?;
    }
    validate_grid(prices)?;

    let pnl: Vec<f64> = prices
        .iter()
        .map(|&price| legs.iter().map(|leg| leg.pnl_at(price)).sum::<f64>())
        .collect();

    let grid_max = pnl.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let grid_min = pnl.iter().copied().fold(f64::INFINITY, f64::min);

    // Net call exposure drives the upside, net put exposure the downside
    let call_exposure: i64 = legs
        .iter()
        .filter(|leg| leg.option_type == OptionType::Call)
        .map(StrategyLeg::signed_contracts)
        .sum();
    let put_exposure: i64 = legs
        .iter()
        .filter(|leg| leg.option_type == OptionType::Put)
        .map(StrategyLeg::signed_contracts)
        .sum();

    let upper_tail = TailTrend::from_exposure(call_exposure);
    let lower_tail = TailTrend::from_exposure(put_exposure);

    let max_profit = match upper_tail {
        TailTrend::ProfitIncreasing => Bound::Unbounded,
        _ => Bound::Bounded(grid_max),
    };
    let max_loss = match upper_tail {
        TailTrend::LossIncreasing => Bound::Unbounded,
        _ => Bound::Bounded(grid_min),
    };

    let break_evens = find_break_evens(prices, &pnl);

    debug!(
        legs = legs.len(),
        points = prices.len(),
        break_evens = break_evens.len(),
        %max_profit,
        %max_loss,
        "evaluated strategy payoff"
    );

    Ok(PayoffCurve {
        prices: prices.to_vec(),
        pnl,
        max_profit,
        max_loss,
        break_evens,
        lower_tail,
        upper_tail,
    })
}

fn validate_grid(prices: &[f64]) -> Result<()> {
    if prices.is_empty() {
        return Err(AnalyticsError::invalid_price_grid("grid is empty"));
    }
    if let Some(bad) = prices.iter().find(|p| !p.is_finite() || **p < 0.0) {
        return Err(AnalyticsError::invalid_price_grid(format!(
            "prices must be finite and non-negative, got {bad}"
        )));
    }
    if let Some(pair) = prices.windows(2).find(|w| w[1] <= w[0]) {
        return Err(AnalyticsError::invalid_price_grid(format!(
            "prices must be strictly ascending, got {} then {}",
            pair[0], pair[1]
        )));
    }
    Ok(())
}

/// Zero crossings of `pnl`, linearly interpolated between grid prices.
///
/// A run of exact zeros between a loss and a profit counts once, at the first
/// zero of the run. Touching zero and turning back is not a crossing.
fn find_break_evens(prices: &[f64], pnl: &[f64]) -> Vec<f64> {
    let mut break_evens = Vec::new();
    let mut last_nonzero: Option<usize> = None;

    for (i, &pl) in pnl.iter().enumerate() {
        if pl == 0.0 {
            continue;
        }
        if let Some(j) = last_nonzero {
            if (pnl[j] < 0.0) != (pl < 0.0) {
                if i == j + 1 {
                    let (p1, p2) = (prices[j], prices[i]);
                    let (pl1, pl2) = (pnl[j], pl);
                    break_evens.push(p1 - pl1 * (p2 - p1) / (pl2 - pl1));
                } else {
                    break_evens.push(prices[j + 1]);
                }
            }
        }
        last_nonzero = Some(i);
    }

    break_evens
}

/// Metrics formatted the way the strategy screen shows them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategySummary {
    pub max_profit: String,
    pub max_loss: String,
    pub break_evens: String,
}

impl StrategySummary {
    pub fn from_curve(curve: &PayoffCurve) -> Self {
        let break_evens = if curve.break_evens.is_empty() {
            "N/A".to_string()
        } else {
            curve
                .break_evens
                .iter()
                .map(|be| format!("${be:.2}"))
                .collect::<Vec<_>>()
                .join(", ")
        };

        Self {
            max_profit: curve.max_profit.to_string(),
            max_loss: curve.max_loss.to_string(),
            break_evens,
        }
    }
}
