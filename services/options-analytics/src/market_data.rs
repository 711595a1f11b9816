//! Option chain loading from CSV exports
//!
//! Expected columns (header names are case-sensitive, camelCase aliases from
//! common broker exports are accepted):
//!
//! `strike,expiration,option_type,last_price,volume,open_interest`
//!
//! `expiration` is `YYYY-MM-DD`. Volume and open interest may be written as
//! floats (`12.0`, `nan`) the way dataframe exports do; missing, non-finite or
//! negative counts read as 0.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, info};

use crate::chain::Quote;
use crate::error::{AnalyticsError, Result};
use crate::pricing::OptionType;

/// Days per year used for time to expiration
pub const DAYS_PER_YEAR: f64 = 365.25;

#[derive(Debug, Deserialize)]
struct ChainRow {
    strike: f64,
    #[serde(alias = "expirationDate")]
    expiration: NaiveDate,
    #[serde(alias = "optionType", alias = "type")]
    option_type: String,
    #[serde(alias = "lastPrice")]
    last_price: f64,
    #[serde(default)]
    volume: Option<f64>,
    #[serde(default, alias = "openInterest")]
    open_interest: Option<f64>,
}

/// Whole-number count from a possibly float-typed column
fn count(value: Option<f64>) -> u64 {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => v as u64,
        _ => 0,
    }
}

/// Year fraction between `as_of` and `expiration`
pub fn time_to_expiration(expiration: NaiveDate, as_of: NaiveDate) -> f64 {
    (expiration - as_of).num_days() as f64 / DAYS_PER_YEAR
}

/// Reads a chain from any CSV source, preserving row order
pub fn read_chain<R: Read>(reader: R, as_of: NaiveDate) -> Result<Vec<Quote>> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut quotes = Vec::new();

    for (row_index, record) in csv_reader.deserialize::<ChainRow>().enumerate() {
        // Header is line 1
        let line = row_index + 2;
        let row = record.map_err(|e| AnalyticsError::market_data(format!("line {line}: {e}")))?;

        let option_type: OptionType = row
            .option_type
            .parse()
            .map_err(|e| AnalyticsError::market_data(format!("line {line}: {e}")))?;

        quotes.push(Quote {
            strike: row.strike,
            expiration: row.expiration,
            option_type,
            last_price: row.last_price,
            time_to_expiration: time_to_expiration(row.expiration, as_of),
            volume: count(row.volume),
            open_interest: count(row.open_interest),
        });
    }

    debug!(quotes = quotes.len(), %as_of, "read option chain");
    Ok(quotes)
}

/// Loads a chain CSV file
pub fn load_chain_csv(path: impl AsRef<Path>, as_of: NaiveDate) -> Result<Vec<Quote>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        AnalyticsError::market_data(format!("cannot open chain file {}: {e}", path.display()))
    })?;
    read_chain(file, as_of)
}

/// Keeps only quotes with positive volume and open interest
pub fn retain_liquid(quotes: Vec<Quote>) -> Vec<Quote> {
    let total = quotes.len();
    let liquid: Vec<Quote> = quotes.into_iter().filter(Quote::is_liquid).collect();
    info!(total, kept = liquid.len(), dropped = total - liquid.len(), "filtered illiquid contracts");
    liquid
}
