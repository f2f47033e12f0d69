//! Property tests for the alpha calculator.

use approx::assert_relative_eq;
use chrono::{Days, NaiveDate};
use proptest::prelude::*;
use riskalpha_data::{AlignmentRule, PricePoint, PriceSeries, compute_alpha, simple_return};

fn build(entity: &str, prices: &[f64]) -> PriceSeries {
    let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    let points = prices
        .iter()
        .enumerate()
        .map(|(i, &p)| PricePoint::new(start + Days::new(i as u64), p))
        .collect();
    PriceSeries::new(entity, points).unwrap()
}

proptest! {
    #[test]
    fn alpha_equals_difference_of_raw_returns(
        entity in prop::collection::vec(1.0f64..500.0, 12..40),
        benchmark in prop::collection::vec(1.0f64..500.0, 12..40),
        start in 0usize..5,
        horizon in 1usize..11,
    ) {
        let entity_series = build("E", &entity);
        let benchmark_series = build("B", &benchmark);
        let date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap() + Days::new(start as u64);

        let alpha = compute_alpha(&entity_series, &benchmark_series, date, horizon, AlignmentRule::Exact);

        if start + horizon < entity.len() && start + horizon < benchmark.len() {
            let recomposed = (entity[start + horizon] - entity[start]) / entity[start]
                - (benchmark[start + horizon] - benchmark[start]) / benchmark[start];
            let direct = simple_return(entity[start], entity[start + horizon])
                - simple_return(benchmark[start], benchmark[start + horizon]);
            let alpha = alpha.unwrap();
            assert_relative_eq!(alpha, recomposed, epsilon = 1e-9, max_relative = 1e-9);
            assert_relative_eq!(alpha, direct, epsilon = 1e-12);
        } else {
            prop_assert!(alpha.unwrap_err().is_missing_price_data());
        }
    }

    #[test]
    fn final_trading_day_has_no_label(
        prices in prop::collection::vec(1.0f64..500.0, 2..15),
        horizon in 1usize..20,
    ) {
        let series = build("E", &prices);
        let benchmark = build("B", &[100.0; 40]);
        let last = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap() + Days::new(prices.len() as u64 - 1);

        let result = compute_alpha(&series, &benchmark, last, horizon, AlignmentRule::Exact);
        prop_assert!(result.unwrap_err().is_missing_price_data());
    }
}
