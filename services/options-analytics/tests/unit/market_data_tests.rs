use std::io::Write;

use approx::assert_abs_diff_eq;
use assert_matches::assert_matches;
use chrono::NaiveDate;
use options_analytics::market_data::DAYS_PER_YEAR;
use options_analytics::{load_chain_csv, read_chain, retain_liquid, time_to_expiration, AnalyticsError, OptionType};
use rstest::*;
use tempfile::NamedTempFile;

#[fixture]
fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
}

fn write_chain(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[rstest]
#[case(NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(), 0.0)]
#[case(NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(), 365.0 / DAYS_PER_YEAR)]
#[case(NaiveDate::from_ymd_opt(2025, 3, 21).unwrap(), 7.0 / DAYS_PER_YEAR)]
fn test_time_to_expiration(as_of: NaiveDate, #[case] expiration: NaiveDate, #[case] expected: f64) {
    assert_abs_diff_eq!(time_to_expiration(expiration, as_of), expected, epsilon = 1e-15);
}

#[rstest]
fn test_load_chain_from_file(as_of: NaiveDate) {
    let file = write_chain(
        "\
strike,expiration,option_type,last_price,volume,open_interest
95,2025-06-20,put,2.15,120,1500
100,2025-06-20,call,5.40,300,2200
105,2025-06-20,call,2.05,0,800
",
    );

    let quotes = load_chain_csv(file.path(), as_of).unwrap();

    assert_eq!(quotes.len(), 3);
    assert_eq!(quotes[0].option_type, OptionType::Put);
    assert_eq!(quotes[1].strike, 100.0);
    assert_eq!(quotes[1].last_price, 5.40);
    assert_eq!(quotes[2].volume, 0);
    assert_abs_diff_eq!(quotes[0].time_to_expiration, 98.0 / DAYS_PER_YEAR, epsilon = 1e-15);

    let liquid = retain_liquid(quotes);
    let strikes: Vec<f64> = liquid.iter().map(|q| q.strike).collect();
    assert_eq!(strikes, vec![95.0, 100.0]);
}

#[rstest]
fn test_broker_export_headers(as_of: NaiveDate) {
    let data = "\
strike, expirationDate, type, lastPrice, volume, openInterest
110, 2025-09-19, C, 1.10, 5, 60
90, 2025-09-19, P, 0.95, , 40
";
    let quotes = read_chain(data.as_bytes(), as_of).unwrap();

    assert_eq!(quotes[0].option_type, OptionType::Call);
    assert_eq!(quotes[1].option_type, OptionType::Put);
    assert_eq!(quotes[1].volume, 0);
    assert_eq!(quotes[1].open_interest, 40);
}

#[rstest]
fn test_dataframe_export_with_float_counts(as_of: NaiveDate) {
    let file = write_chain(
        "\
strike,expirationDate,option_type,lastPrice,volume,openInterest
100,2025-06-20,call,7.5,12.0,340.0
105,2025-06-20,call,4.1,nan,
95,2025-06-20,put,2.2,3.0,nan
",
    );

    let quotes = load_chain_csv(file.path(), as_of).unwrap();

    assert_eq!(quotes.len(), 3);
    assert_eq!((quotes[0].volume, quotes[0].open_interest), (12, 340));
    assert_eq!((quotes[1].volume, quotes[1].open_interest), (0, 0));
    assert_eq!((quotes[2].volume, quotes[2].open_interest), (3, 0));

    let liquid = retain_liquid(quotes);
    assert_eq!(liquid.len(), 1);
    assert_eq!(liquid[0].strike, 100.0);
}

#[rstest]
fn test_missing_liquidity_columns_default_to_zero(as_of: NaiveDate) {
    let data = "\
strike,expiration,option_type,last_price
100,2025-06-20,call,5.40
";
    let quotes = read_chain(data.as_bytes(), as_of).unwrap();
    assert_eq!(quotes[0].volume, 0);
    assert_eq!(quotes[0].open_interest, 0);
    assert!(retain_liquid(quotes).is_empty());
}

#[rstest]
fn test_malformed_row_reports_line(as_of: NaiveDate) {
    let data = "\
strike,expiration,option_type,last_price,volume,open_interest
100,2025-06-20,call,5.40,1,1
100,2025-06-20,call,5.40,1,1
abc,2025-06-20,call,5.40,1,1
";
    assert_matches!(
        read_chain(data.as_bytes(), as_of),
        Err(AnalyticsError::MarketData(msg)) if msg.contains("line 4")
    );
}

#[rstest]
fn test_missing_file_is_market_data_error(as_of: NaiveDate) {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("chain.csv");
    assert_matches!(load_chain_csv(&missing, as_of), Err(AnalyticsError::MarketData(_)));
}

#[rstest]
fn test_header_only_chain_is_empty(as_of: NaiveDate) {
    let file = write_chain("strike,expiration,option_type,last_price,volume,open_interest\n");
    assert!(load_chain_csv(file.path(), as_of).unwrap().is_empty());
}
