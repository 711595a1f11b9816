//! Options Analytics CLI
//!
//! Prices options, solves implied volatility, evaluates strategy payoffs and
//! builds chain volatility surfaces. Results go to stdout as JSON, logs to
//! stderr.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use options_analytics::*;

#[derive(Debug, Parser)]
#[command(name = "options-analytics", version, about = "Options strategy and volatility analytics")]
struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Price a European option with Black-Scholes
    Price {
        #[arg(long = "type")]
        option_type: OptionType,
        #[arg(long)]
        spot: f64,
        #[arg(long)]
        strike: f64,
        /// Time to expiration in years
        #[arg(long)]
        time: f64,
        /// Annualized volatility, e.g. 0.2
        #[arg(long)]
        vol: f64,
        /// Risk-free rate; defaults to the configured rate
        #[arg(long)]
        rate: Option<f64>,
    },
    /// Volatility implied by an observed option price
    ImpliedVol {
        #[arg(long = "type")]
        option_type: OptionType,
        #[arg(long)]
        spot: f64,
        #[arg(long)]
        strike: f64,
        #[arg(long)]
        time: f64,
        #[arg(long)]
        market_price: f64,
        #[arg(long)]
        rate: Option<f64>,
    },
    /// Strategy P/L at expiration around the current spot
    Payoff {
        #[arg(long)]
        spot: f64,
        /// Leg as action:type:strike:premium:contracts, e.g. buy:call:100:2.5:1
        #[arg(long = "leg", required = true)]
        legs: Vec<StrategyLeg>,
        /// Grid half-width as a fraction of spot
        #[arg(long)]
        range_percent: Option<f64>,
        /// Number of grid prices
        #[arg(long)]
        points: Option<usize>,
    },
    /// Implied volatility for every contract in a chain export
    ChainIv {
        /// CSV chain export
        #[arg(long)]
        chain: PathBuf,
        /// Underlying symbol the chain belongs to; defaults to market.default_ticker
        #[arg(long)]
        ticker: Option<String>,
        #[arg(long)]
        spot: f64,
        #[arg(long)]
        rate: Option<f64>,
        /// Valuation date, defaults to today (UTC)
        #[arg(long)]
        as_of: Option<NaiveDate>,
        /// Keep contracts with no volume or open interest
        #[arg(long)]
        include_illiquid: bool,
        /// Solve on the current thread only
        #[arg(long)]
        sequential: bool,
    },
}

#[derive(Debug, Serialize)]
struct PriceOutput {
    parameters: OptionParameters,
    price: f64,
}

#[derive(Debug, Serialize)]
struct ImpliedVolOutput {
    option_type: OptionType,
    spot: f64,
    strike: f64,
    time: f64,
    rate: f64,
    market_price: f64,
    implied_volatility: Option<f64>,
}

#[derive(Debug, Serialize)]
struct PayoffOutput {
    summary: StrategySummary,
    curve: PayoffCurve,
    chart: PayoffChart,
}

#[derive(Debug, Serialize)]
struct ChainIvOutput {
    ticker: String,
    spot: f64,
    rate: f64,
    as_of: NaiveDate,
    total: usize,
    solved: usize,
    undefined: usize,
    results: Vec<ImpliedVolatilityResult>,
    surface: SurfacePlot,
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("options_analytics=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AnalyticsConfig::load(cli.config.as_deref()).context("failed to load configuration")?;

    let output = run(cli.command, &config)?;
    println!("{output}");
    Ok(())
}

/// Executes one command and returns its JSON rendering
fn run(command: Command, config: &AnalyticsConfig) -> Result<String> {
    let json = match command {
        Command::Price {
            option_type,
            spot,
            strike,
            time,
            vol,
            rate,
        } => {
            let rate = rate.unwrap_or(config.market.risk_free_rate);
            let parameters = OptionParameters::new(option_type, spot, strike, rate, vol, time)?;
            serde_json::to_string_pretty(&PriceOutput {
                parameters,
                price: parameters.price(),
            })?
        }
        Command::ImpliedVol {
            option_type,
            spot,
            strike,
            time,
            market_price,
            rate,
        } => {
            let rate = rate.unwrap_or(config.market.risk_free_rate);
            OptionParameters::new(option_type, spot, strike, rate, 0.0, time)?;
            let solver = VolatilitySolver::from(&config.solver);
            let implied_volatility = solver.implied_volatility(option_type, spot, strike, rate, time, market_price);
            if implied_volatility.is_none() {
                warn!(market_price, "market price is outside the solvable range");
            }
            serde_json::to_string_pretty(&ImpliedVolOutput {
                option_type,
                spot,
                strike,
                time,
                rate,
                market_price,
                implied_volatility,
            })?
        }
        Command::Payoff {
            spot,
            legs,
            range_percent,
            points,
        } => {
            let grid = price_grid(
                spot,
                range_percent.unwrap_or(config.payoff.range_percent),
                points.unwrap_or(config.payoff.grid_points),
            )?;
            let curve = evaluate_strategy(&legs, &grid)?;
            let summary = StrategySummary::from_curve(&curve);
            info!(
                max_profit = %summary.max_profit,
                max_loss = %summary.max_loss,
                break_evens = %summary.break_evens,
                "strategy metrics"
            );
            serde_json::to_string_pretty(&PayoffOutput {
                summary,
                chart: PayoffChart::from_curve(&curve),
                curve,
            })?
        }
        Command::ChainIv {
            chain,
            ticker,
            spot,
            rate,
            as_of,
            include_illiquid,
            sequential,
        } => {
            if !spot.is_finite() || spot <= 0.0 {
                bail!("spot price unavailable or invalid: {spot}");
            }
            let ticker = ticker.unwrap_or_else(|| config.market.default_ticker.clone());
            let rate = rate.unwrap_or(config.market.risk_free_rate);
            let as_of = as_of.unwrap_or_else(|| Utc::now().date_naive());

            let mut quotes = load_chain_csv(&chain, as_of)
                .with_context(|| format!("failed to load {ticker} chain {}", chain.display()))?;
            if config.chain.require_liquidity && !include_illiquid {
                quotes = retain_liquid(quotes);
            }

            let solver = VolatilitySolver::from(&config.solver);
            let engine = if sequential {
                ChainIvEngine::sequential(solver)
            } else {
                ChainIvEngine::new(solver, &config.chain)
            };

            let results = engine.compute(&quotes, spot, rate);
            let solved = results.iter().filter(|r| r.is_defined()).count();
            let surface = build_surface(&results);

            serde_json::to_string_pretty(&ChainIvOutput {
                ticker,
                spot,
                rate,
                as_of,
                total: results.len(),
                solved,
                undefined: results.len() - solved,
                results,
                surface,
            })?
        }
    };

    Ok(json)
}
