//! Black-Scholes pricing for European options
//!
//! No dividends and no early exercise. Expired or zero-volatility contracts
//! collapse to their intrinsic value.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, Result};

/// Option type for derivatives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    /// Call option - right to buy the underlying at strike price
    Call,
    /// Put option - right to sell the underlying at strike price
    Put,
}

impl OptionType {
    /// Payoff if exercised immediately at `spot`
    pub fn intrinsic(self, spot: f64, strike: f64) -> f64 {
        match self {
            OptionType::Call => (spot - strike).max(0.0),
            OptionType::Put => (strike - spot).max(0.0),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OptionType::Call => "call",
            OptionType::Put => "put",
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptionType {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "call" | "c" => Ok(OptionType::Call),
            "put" | "p" => Ok(OptionType::Put),
            other => Err(AnalyticsError::invalid_argument(format!(
                "invalid option type '{other}', must be 'call' or 'put'"
            ))),
        }
    }
}

/// Inputs to a single pricing call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptionParameters {
    /// Current price of the underlying
    pub spot: f64,
    /// Strike price
    pub strike: f64,
    /// Time to expiration in years
    pub time: f64,
    /// Annualized risk-free rate (continuous compounding)
    pub rate: f64,
    /// Annualized volatility
    pub volatility: f64,
    pub option_type: OptionType,
}

impl OptionParameters {
    /// Validated constructor
    pub fn new(
        option_type: OptionType,
        spot: f64,
        strike: f64,
        rate: f64,
        volatility: f64,
        time: f64,
    ) -> Result<Self> {
        if !spot.is_finite() || spot <= 0.0 {
            return Err(AnalyticsError::invalid_argument(format!(
                "spot must be positive, got {spot}"
            )));
        }
        if !strike.is_finite() || strike <= 0.0 {
            return Err(AnalyticsError::invalid_argument(format!(
                "strike must be positive, got {strike}"
            )));
        }
        if !time.is_finite() || time < 0.0 {
            return Err(AnalyticsError::invalid_argument(format!(
                "time to expiration must be non-negative, got {time}"
            )));
        }
        if !rate.is_finite() {
            return Err(AnalyticsError::invalid_argument("rate must be finite"));
        }
        if !volatility.is_finite() || volatility < 0.0 {
            return Err(AnalyticsError::invalid_argument(format!(
                "volatility must be non-negative, got {volatility}"
            )));
        }

        Ok(Self {
            spot,
            strike,
            time,
            rate,
            volatility,
            option_type,
        })
    }

    /// Fair value under Black-Scholes
    pub fn price(&self) -> f64 {
        BlackScholes::price(
            self.option_type,
            self.spot,
            self.strike,
            self.rate,
            self.volatility,
            self.time,
        )
    }

    /// Same contract repriced at another volatility
    pub fn with_volatility(&self, volatility: f64) -> Self {
        Self { volatility, ..*self }
    }
}

/// Black-Scholes option pricing model implementation
#[derive(Debug)]
pub struct BlackScholes;

impl BlackScholes {
    /// Standard normal cumulative distribution function
    pub fn norm_cdf(x: f64) -> f64 {
        0.5 * (1.0 + libm::erf(x / std::f64::consts::SQRT_2))
    }

    /// Calculate d1 parameter
    pub fn d1(s: f64, k: f64, r: f64, sigma: f64, t: f64) -> f64 {
        ((s / k).ln() + (r + 0.5 * sigma * sigma) * t) / (sigma * t.sqrt())
    }

    /// Calculate d2 parameter
    pub fn d2(s: f64, k: f64, r: f64, sigma: f64, t: f64) -> f64 {
        Self::d1(s, k, r, sigma, t) - sigma * t.sqrt()
    }

    /// Black-Scholes option price
    pub fn price(
        option_type: OptionType,
        spot: f64,
        strike: f64,
        rate: f64,
        volatility: f64,
        time: f64,
    ) -> f64 {
        if time <= 0.0 || volatility <= 0.0 {
            return option_type.intrinsic(spot, strike);
        }

        let d1 = Self::d1(spot, strike, rate, volatility, time);
        let d2 = d1 - volatility * time.sqrt();
        let discounted_strike = strike * (-rate * time).exp();

        match option_type {
            OptionType::Call => spot * Self::norm_cdf(d1) - discounted_strike * Self::norm_cdf(d2),
            OptionType::Put => discounted_strike * Self::norm_cdf(-d2) - spot * Self::norm_cdf(-d1),
        }
    }
}
