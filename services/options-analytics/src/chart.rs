//! Plot-ready data for payoff diagrams and volatility surfaces
//!
//! Rendering is left to whatever charting front end consumes the JSON.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::chain::ImpliedVolatilityResult;
use crate::payoff::PayoffCurve;

/// Vertical marker on a payoff diagram
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakEvenMarker {
    pub price: f64,
    pub label: String,
}

/// Line plot of strategy P/L with a zero reference line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoffChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// (underlying price, P/L) points
    pub line: Vec<(f64, f64)>,
    /// Horizontal reference line
    pub zero_line: f64,
    pub break_evens: Vec<BreakEvenMarker>,
}

impl PayoffChart {
    pub fn from_curve(curve: &PayoffCurve) -> Self {
        Self {
            title: "Options Strategy Payoff Diagram".to_string(),
            x_label: "Underlying Price at Expiration ($)".to_string(),
            y_label: "Profit / Loss ($)".to_string(),
            line: curve.prices.iter().copied().zip(curve.pnl.iter().copied()).collect(),
            zero_line: 0.0,
            break_evens: curve
                .break_evens
                .iter()
                .map(|&price| BreakEvenMarker {
                    price,
                    label: format!("BE: {price:.2}"),
                })
                .collect(),
        }
    }
}

/// A solved contract positioned on the surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfacePoint {
    pub time_to_expiration: f64,
    pub strike: f64,
    /// Implied volatility in percent
    pub iv_percent: f64,
}

/// Implied volatility keyed by strike and time to expiration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SurfacePlot {
    /// Complete rectangle: `iv_percent[strike_index][time_index]`
    Grid {
        times: Vec<f64>,
        strikes: Vec<f64>,
        iv_percent: Vec<Vec<f64>>,
    },
    /// Points that do not fill a rectangle, in input order
    Scatter { points: Vec<SurfacePoint> },
    /// Nothing solved
    Empty,
}

/// Surface when the solved contracts tile the (strike, time) rectangle
/// exactly once, scatter otherwise. Undefined volatilities are dropped.
pub fn build_surface(results: &[ImpliedVolatilityResult]) -> SurfacePlot {
    let points: Vec<SurfacePoint> = results
        .iter()
        .filter_map(|r| {
            r.implied_volatility.map(|iv| SurfacePoint {
                time_to_expiration: r.quote.time_to_expiration,
                strike: r.quote.strike,
                iv_percent: iv * 100.0,
            })
        })
        .collect();

    if points.is_empty() {
        return SurfacePlot::Empty;
    }

    let strikes = sorted_unique(points.iter().map(|p| p.strike));
    let times = sorted_unique(points.iter().map(|p| p.time_to_expiration));

    if strikes.len() * times.len() != points.len() {
        return SurfacePlot::Scatter { points };
    }

    // Exact bit patterns as keys; every cell must be hit once
    let mut cells: FxHashMap<(u64, u64), f64> = FxHashMap::default();
    let distinct = points.iter().all(|point| {
        let key = (point.strike.to_bits(), point.time_to_expiration.to_bits());
        cells.insert(key, point.iv_percent).is_none()
    });
    if !distinct {
        return SurfacePlot::Scatter { points };
    }

    let mut iv_percent = Vec::with_capacity(strikes.len());
    for strike in &strikes {
        let mut row = Vec::with_capacity(times.len());
        for time in &times {
            match cells.get(&(strike.to_bits(), time.to_bits())) {
                Some(&iv) => row.push(iv),
                None => return SurfacePlot::Scatter { points },
            }
        }
        iv_percent.push(row);
    }

    SurfacePlot::Grid {
        times,
        strikes,
        iv_percent,
    }
}

fn sorted_unique(values: impl Iterator<Item = f64>) -> Vec<f64> {
    let mut seen = FxHashSet::default();
    let mut unique: Vec<f64> = values.filter(|v| seen.insert(v.to_bits())).collect();
    unique.sort_by(f64::total_cmp);
    unique
}
