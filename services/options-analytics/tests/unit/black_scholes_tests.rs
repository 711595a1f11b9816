use approx::assert_abs_diff_eq;
use assert_matches::assert_matches;
use options_analytics::{AnalyticsError, BlackScholes, OptionParameters, OptionType};
use rstest::*;

use crate::assertions::assert_put_call_parity;
use crate::config::*;

/// Test fixture for standard Black-Scholes parameters
#[fixture]
fn standard_params() -> (f64, f64, f64, f64, f64) {
    // spot, strike, rate, volatility, time
    (SPOT, 100.0, RISK_FREE_RATE, MEDIUM_VOLATILITY, 0.25)
}

/// Test fixture for deep ITM call parameters
#[fixture]
fn deep_itm_call_params() -> (f64, f64, f64, f64, f64) {
    (SPOT, 70.0, RISK_FREE_RATE, MEDIUM_VOLATILITY, ONE_MONTH)
}

#[cfg(test)]
mod black_scholes_pricing_tests {
    use super::*;

    #[rstest]
    fn test_norm_cdf_standard_values() {
        assert_abs_diff_eq!(BlackScholes::norm_cdf(0.0), 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(BlackScholes::norm_cdf(1.96), 0.975, epsilon = 1e-3);
        assert_abs_diff_eq!(BlackScholes::norm_cdf(-1.96), 0.025, epsilon = 1e-3);
        assert_abs_diff_eq!(BlackScholes::norm_cdf(3.0), 0.9987, epsilon = 1e-4);
    }

    #[rstest]
    fn test_d1_d2_calculation(standard_params: (f64, f64, f64, f64, f64)) {
        let (spot, strike, rate, vol, time) = standard_params;

        let d1 = BlackScholes::d1(spot, strike, rate, vol, time);
        let d2 = BlackScholes::d2(spot, strike, rate, vol, time);

        assert_abs_diff_eq!(d2, d1 - vol * time.sqrt(), epsilon = PRICE_EPSILON);

        // ATM: ln(S/K) vanishes
        let expected_d1 = (rate + 0.5 * vol * vol) * time / (vol * time.sqrt());
        assert_abs_diff_eq!(d1, expected_d1, epsilon = PRICE_EPSILON);
    }

    #[rstest]
    fn test_atm_call_matches_closed_form(standard_params: (f64, f64, f64, f64, f64)) {
        let (spot, strike, rate, vol, time) = standard_params;

        let price = BlackScholes::price(OptionType::Call, spot, strike, rate, vol, time);

        let d1 = BlackScholes::d1(spot, strike, rate, vol, time);
        let d2 = BlackScholes::d2(spot, strike, rate, vol, time);
        let expected = spot * BlackScholes::norm_cdf(d1)
            - strike * (-rate * time).exp() * BlackScholes::norm_cdf(d2);

        assert!(price > 0.0);
        assert_abs_diff_eq!(price, expected, epsilon = PRICE_EPSILON);
    }

    #[rstest]
    #[case(100.0, 100.0, 0.05, 0.2, 1.0)]
    #[case(100.0, 80.0, 0.01, 0.35, 0.25)]
    #[case(100.0, 130.0, 0.08, 0.15, 2.0)]
    #[case(50.0, 55.0, -0.01, 0.6, ONE_WEEK)]
    fn test_put_call_parity(
        #[case] spot: f64,
        #[case] strike: f64,
        #[case] rate: f64,
        #[case] vol: f64,
        #[case] time: f64,
    ) {
        let call = BlackScholes::price(OptionType::Call, spot, strike, rate, vol, time);
        let put = BlackScholes::price(OptionType::Put, spot, strike, rate, vol, time);
        assert_put_call_parity(call, put, spot, strike, rate, time, 1e-10);
    }

    #[rstest]
    fn test_deep_itm_call_pricing(deep_itm_call_params: (f64, f64, f64, f64, f64)) {
        let (spot, strike, rate, vol, time) = deep_itm_call_params;

        let call_price = BlackScholes::price(OptionType::Call, spot, strike, rate, vol, time);

        // Worth at least the discounted forward intrinsic
        let lower_bound = spot - strike * (-rate * time).exp();
        assert!(call_price >= lower_bound - PRICE_EPSILON);
        assert!(call_price - lower_bound < 0.01);
    }

    #[rstest]
    #[case(OptionType::Call, 110.0, 100.0, 10.0)]
    #[case(OptionType::Call, 90.0, 100.0, 0.0)]
    #[case(OptionType::Put, 90.0, 100.0, 10.0)]
    #[case(OptionType::Put, 110.0, 100.0, 0.0)]
    fn test_expired_option_is_intrinsic(
        #[case] option_type: OptionType,
        #[case] spot: f64,
        #[case] strike: f64,
        #[case] expected: f64,
    ) {
        let price = BlackScholes::price(option_type, spot, strike, RISK_FREE_RATE, MEDIUM_VOLATILITY, 0.0);
        assert_eq!(price, expected);
    }

    #[rstest]
    fn test_zero_volatility_is_intrinsic() {
        let call = BlackScholes::price(OptionType::Call, 105.0, 100.0, RISK_FREE_RATE, 0.0, ONE_YEAR);
        let put = BlackScholes::price(OptionType::Put, 105.0, 100.0, RISK_FREE_RATE, 0.0, ONE_YEAR);
        assert_eq!(call, 5.0);
        assert_eq!(put, 0.0);
    }

    #[rstest]
    fn test_volatility_impact() {
        let low = BlackScholes::price(OptionType::Call, SPOT, 100.0, RISK_FREE_RATE, LOW_VOLATILITY, ONE_MONTH);
        let high = BlackScholes::price(OptionType::Call, SPOT, 100.0, RISK_FREE_RATE, HIGH_VOLATILITY, ONE_MONTH);

        assert!(high > low);
        assert!(high / low > 2.0);
    }

    #[rstest]
    fn test_time_value() {
        let long = BlackScholes::price(OptionType::Put, SPOT, 100.0, RISK_FREE_RATE, MEDIUM_VOLATILITY, THREE_MONTHS);
        let short = BlackScholes::price(OptionType::Put, SPOT, 100.0, RISK_FREE_RATE, MEDIUM_VOLATILITY, ONE_WEEK);
        assert!(long > short);
    }
}

#[cfg(test)]
mod option_parameters_tests {
    use super::*;

    #[rstest]
    fn test_parameters_price_matches_free_function() {
        let params = OptionParameters::new(OptionType::Call, 100.0, 95.0, 0.03, 0.25, 0.5).unwrap();
        assert_eq!(
            params.price(),
            BlackScholes::price(OptionType::Call, 100.0, 95.0, 0.03, 0.25, 0.5)
        );

        let repriced = params.with_volatility(0.35);
        assert!(repriced.price() > params.price());
    }

    #[rstest]
    #[case(0.0, 100.0, 0.2, 1.0)]
    #[case(100.0, 0.0, 0.2, 1.0)]
    #[case(100.0, 100.0, -0.1, 1.0)]
    #[case(100.0, 100.0, 0.2, -1.0)]
    #[case(f64::NAN, 100.0, 0.2, 1.0)]
    fn test_invalid_parameters(#[case] spot: f64, #[case] strike: f64, #[case] vol: f64, #[case] time: f64) {
        let result = OptionParameters::new(OptionType::Put, spot, strike, RISK_FREE_RATE, vol, time);
        assert_matches!(result, Err(AnalyticsError::InvalidArgument(_)));
    }

    #[rstest]
    #[case("call", OptionType::Call)]
    #[case("Put", OptionType::Put)]
    #[case("C", OptionType::Call)]
    fn test_option_type_parsing(#[case] input: &str, #[case] expected: OptionType) {
        assert_eq!(input.parse::<OptionType>().unwrap(), expected);
    }

    #[rstest]
    fn test_unknown_option_type_is_invalid_argument() {
        assert_matches!("binary".parse::<OptionType>(), Err(AnalyticsError::InvalidArgument(msg)) if msg.contains("binary"));
    }
}
