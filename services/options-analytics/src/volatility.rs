//! Implied volatility solver
//!
//! Inverts [`BlackScholes::price`] with Brent's method over a fixed volatility
//! bracket. The price is strictly increasing in volatility for positive time
//! to expiry, so a sign change of `price(sigma) - market_price` across the
//! bracket pins down a unique root. Without a sign change the implied
//! volatility is undefined and the solver returns `None`; stale or illiquid
//! quotes routinely land there, so it is not an error.

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::SolverConfig;
use crate::pricing::{BlackScholes, OptionType};

/// Lowest volatility searched (0.001% annualized)
pub const MIN_VOLATILITY: f64 = 1e-5;
/// Highest volatility searched (400% annualized)
pub const MAX_VOLATILITY: f64 = 4.0;
/// Absolute tolerance on sigma
pub const DEFAULT_TOLERANCE: f64 = 1e-12;
pub const DEFAULT_MAX_ITERATIONS: u32 = 100;

/// Why a bracketing search produced no root
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RootFindError {
    #[error("no sign change across bracket: f(lower)={lower_value}, f(upper)={upper_value}")]
    NoSignChange { lower_value: f64, upper_value: f64 },

    #[error("objective is not finite at {at}")]
    NonFinite { at: f64 },

    #[error("no convergence after {iterations} iterations")]
    NotConverged { iterations: u32 },
}

/// Brent's method on `[lower, upper]`.
///
/// Requires `f(lower)` and `f(upper)` to have opposite signs. An exact zero at
/// either end is returned as the root.
pub fn brent<F>(
    f: F,
    lower: f64,
    upper: f64,
    tolerance: f64,
    max_iterations: u32,
) -> Result<f64, RootFindError>
where
    F: Fn(f64) -> f64,
{
    let (mut a, mut b) = (lower, upper);
    let mut fa = f(a);
    let mut fb = f(b);

    if !fa.is_finite() {
        return Err(RootFindError::NonFinite { at: a });
    }
    if !fb.is_finite() {
        return Err(RootFindError::NonFinite { at: b });
    }
    if fa == 0.0 {
        return Ok(a);
    }
    if fb == 0.0 {
        return Ok(b);
    }
    if fa.signum() == fb.signum() {
        return Err(RootFindError::NoSignChange {
            lower_value: fa,
            upper_value: fb,
        });
    }

    let (mut c, mut fc) = (b, fb);
    let mut d = b - a;
    let mut e = d;

    for _ in 0..max_iterations {
        // Keep the root between b and c
        if fb.signum() == fc.signum() {
            c = a;
            fc = fa;
            d = b - a;
            e = d;
        }
        // b is always the best estimate so far
        if fc.abs() < fb.abs() {
            a = b;
            b = c;
            c = a;
            fa = fb;
            fb = fc;
            fc = fa;
        }

        let tol = 2.0 * f64::EPSILON * b.abs() + 0.5 * tolerance;
        let midpoint = 0.5 * (c - b);
        if midpoint.abs() <= tol || fb == 0.0 {
            return Ok(b);
        }

        if e.abs() >= tol && fa.abs() > fb.abs() {
            let s = fb / fa;
            let (mut p, mut q) = if a == c {
                // Secant step
                (2.0 * midpoint * s, 1.0 - s)
            } else {
                // Inverse quadratic interpolation
                let q = fa / fc;
                let r = fb / fc;
                (
                    s * (2.0 * midpoint * q * (q - r) - (b - a) * (r - 1.0)),
                    (q - 1.0) * (r - 1.0) * (s - 1.0),
                )
            };
            if p > 0.0 {
                q = -q;
            }
            p = p.abs();

            let min1 = 3.0 * midpoint * q - (tol * q).abs();
            let min2 = (e * q).abs();
            if 2.0 * p < min1.min(min2) {
                e = d;
                d = p / q;
            } else {
                // Interpolation rejected, bisect
                d = midpoint;
                e = d;
            }
        } else {
            d = midpoint;
            e = d;
        }

        a = b;
        fa = fb;
        b += if d.abs() > tol { d } else { tol.copysign(midpoint) };
        fb = f(b);
        if !fb.is_finite() {
            return Err(RootFindError::NonFinite { at: b });
        }
    }

    Err(RootFindError::NotConverged {
        iterations: max_iterations,
    })
}

/// Recovers the volatility implied by an observed option price
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolatilitySolver {
    /// Lower end of the volatility bracket
    pub lower_bound: f64,
    /// Upper end of the volatility bracket
    pub upper_bound: f64,
    /// Absolute tolerance on sigma
    pub tolerance: f64,
    /// Iteration budget for Brent's method
    pub max_iterations: u32,
}

impl Default for VolatilitySolver {
    fn default() -> Self {
        Self {
            lower_bound: MIN_VOLATILITY,
            upper_bound: MAX_VOLATILITY,
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl From<&SolverConfig> for VolatilitySolver {
    fn from(config: &SolverConfig) -> Self {
        Self {
            lower_bound: config.lower_bound,
            upper_bound: config.upper_bound,
            tolerance: config.tolerance,
            max_iterations: config.max_iterations,
        }
    }
}

impl VolatilitySolver {
    /// Implied volatility, or `None` when the market price cannot be matched
    /// by any volatility inside the bracket.
    pub fn implied_volatility(
        &self,
        option_type: OptionType,
        spot: f64,
        strike: f64,
        rate: f64,
        time: f64,
        market_price: f64,
    ) -> Option<f64> {
        let objective = |sigma: f64| {
            BlackScholes::price(option_type, spot, strike, rate, sigma, time) - market_price
        };

        match brent(
            objective,
            self.lower_bound,
            self.upper_bound,
            self.tolerance,
            self.max_iterations,
        ) {
            Ok(sigma) => Some(sigma),
            Err(RootFindError::NotConverged { iterations }) => {
                warn!(
                    %option_type, strike, time, market_price, iterations,
                    "implied volatility search did not converge"
                );
                None
            }
            Err(e) => {
                debug!(%option_type, strike, time, market_price, reason = %e, "implied volatility undefined");
                None
            }
        }
    }
}

/// Implied volatility over the default bracket `[1e-5, 4.0]`
pub fn implied_volatility(
    option_type: OptionType,
    spot: f64,
    strike: f64,
    rate: f64,
    time: f64,
    market_price: f64,
) -> Option<f64> {
    VolatilitySolver::default().implied_volatility(option_type, spot, strike, rate, time, market_price)
}
