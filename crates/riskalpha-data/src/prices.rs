//! Daily price series and disclosure-date alignment.

use crate::error::{DataError, Result};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// A single (date, price) observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Trading date
    pub date: NaiveDate,
    /// Closing price (adjusted)
    pub price: f64,
}

impl PricePoint {
    /// Create a new price point.
    pub const fn new(date: NaiveDate, price: f64) -> Self {
        Self { date, price }
    }
}

/// Rule used to locate a disclosure date inside a price series.
///
/// Disclosures are frequently filed on weekends or holidays, so an exact
/// match is often impossible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum AlignmentRule {
    /// The disclosure date must be a trading day of the series.
    Exact,
    /// Fall back to the latest trading day on or before the date.
    NearestPrior {
        /// Maximum calendar-day gap to the fallback trading day
        max_gap_days: i64,
    },
    /// Fall back to the first trading day on or after the date.
    NextTrading {
        /// Maximum calendar-day gap to the fallback trading day
        max_gap_days: i64,
    },
}

impl Default for AlignmentRule {
    fn default() -> Self {
        Self::NearestPrior { max_gap_days: 3 }
    }
}

/// Ordered daily price series for one entity or the benchmark.
///
/// Dates are strictly increasing with no duplicates and every price is
/// finite and positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    entity: String,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Create a validated series.
    ///
    /// # Errors
    /// Returns [`DataError::InvalidSeries`] if dates are not strictly increasing
    /// or a price is not finite and positive.
    pub fn new(entity: impl Into<String>, points: Vec<PricePoint>) -> Result<Self> {
        let entity = entity.into();

        for window in points.windows(2) {
            if window[1].date <= window[0].date {
                return Err(DataError::InvalidSeries {
                    entity,
                    reason: format!(
                        "dates not strictly increasing at {} -> {}",
                        window[0].date, window[1].date
                    ),
                });
            }
        }

        if let Some(bad) = points
            .iter()
            .find(|p| !p.price.is_finite() || p.price <= 0.0)
        {
            return Err(DataError::InvalidSeries {
                entity,
                reason: format!("invalid price {} on {}", bad.price, bad.date),
            });
        }

        Ok(Self { entity, points })
    }

    /// Build a series from unordered observations, sorting by date first.
    ///
    /// Duplicate dates are still rejected.
    pub fn from_unsorted(entity: impl Into<String>, mut points: Vec<PricePoint>) -> Result<Self> {
        points.sort_by_key(|p| p.date);
        Self::new(entity, points)
    }

    /// Build a series from a DataFrame with `date` and `close` columns.
    ///
    /// The `date` column may hold strings (`YYYY-MM-DD`) or dates.
    pub fn from_frame(entity: impl Into<String>, df: &DataFrame) -> Result<Self> {
        let dates = df.column("date")?.cast(&DataType::String)?;
        let dates = dates.str()?;
        let closes = df.column("close")?.cast(&DataType::Float64)?;
        let closes = closes.f64()?;

        let mut points = Vec::with_capacity(df.height());
        for i in 0..df.height() {
            let date = dates
                .get(i)
                .ok_or_else(|| DataError::Parse(format!("Missing date in row {}", i)))?;
            let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
                .map_err(|e| DataError::Parse(format!("Invalid date '{}': {}", date, e)))?;
            let close = closes
                .get(i)
                .ok_or_else(|| DataError::Parse(format!("Missing close in row {}", i)))?;
            points.push(PricePoint::new(date, close));
        }

        Self::from_unsorted(entity, points)
    }

    /// Entity identifier (or benchmark symbol).
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// All observations in date order.
    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    /// Number of trading days.
    pub const fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the series has no observations.
    pub const fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Observation at a trading-day position.
    pub fn get(&self, index: usize) -> Option<&PricePoint> {
        self.points.get(index)
    }

    /// First trading date, if any.
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    /// Last trading date, if any.
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    /// Locate `date` in the series according to `rule`.
    ///
    /// Returns the trading-day position of the aligned observation.
    pub fn align(&self, date: NaiveDate, rule: AlignmentRule) -> Option<usize> {
        match self.points.binary_search_by_key(&date, |p| p.date) {
            Ok(index) => Some(index),
            Err(insert_at) => match rule {
                AlignmentRule::Exact => None,
                AlignmentRule::NearestPrior { max_gap_days } => {
                    let prior = insert_at.checked_sub(1)?;
                    let gap = (date - self.points[prior].date).num_days();
                    (gap <= max_gap_days).then_some(prior)
                }
                AlignmentRule::NextTrading { max_gap_days } => {
                    let next = self.points.get(insert_at)?;
                    let gap = (next.date - date).num_days();
                    (gap <= max_gap_days).then_some(insert_at)
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn weekday_series() -> PriceSeries {
        // Thu 4th, Fri 5th, Mon 8th, Tue 9th January 2024
        PriceSeries::new(
            "AAPL",
            vec![
                PricePoint::new(d(2024, 1, 4), 100.0),
                PricePoint::new(d(2024, 1, 5), 101.0),
                PricePoint::new(d(2024, 1, 8), 102.0),
                PricePoint::new(d(2024, 1, 9), 103.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_unordered_dates() {
        let result = PriceSeries::new(
            "AAPL",
            vec![
                PricePoint::new(d(2024, 1, 5), 100.0),
                PricePoint::new(d(2024, 1, 4), 101.0),
            ],
        );
        assert!(matches!(result, Err(DataError::InvalidSeries { .. })));
    }

    #[test]
    fn test_rejects_duplicate_dates() {
        let result = PriceSeries::from_unsorted(
            "AAPL",
            vec![
                PricePoint::new(d(2024, 1, 4), 100.0),
                PricePoint::new(d(2024, 1, 4), 101.0),
            ],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_non_positive_price() {
        let result = PriceSeries::new("AAPL", vec![PricePoint::new(d(2024, 1, 4), 0.0)]);
        assert!(result.is_err());
    }

    #[rstest]
    #[case::exact_hit(d(2024, 1, 5), AlignmentRule::Exact, Some(1))]
    #[case::exact_weekend(d(2024, 1, 6), AlignmentRule::Exact, None)]
    #[case::prior_weekend(d(2024, 1, 7), AlignmentRule::NearestPrior { max_gap_days: 3 }, Some(1))]
    #[case::prior_gap_too_large(d(2024, 1, 7), AlignmentRule::NearestPrior { max_gap_days: 1 }, None)]
    #[case::prior_before_start(d(2024, 1, 1), AlignmentRule::NearestPrior { max_gap_days: 3 }, None)]
    #[case::next_weekend(d(2024, 1, 6), AlignmentRule::NextTrading { max_gap_days: 3 }, Some(2))]
    #[case::next_after_end(d(2024, 1, 10), AlignmentRule::NextTrading { max_gap_days: 3 }, None)]
    fn test_alignment(
        #[case] date: NaiveDate,
        #[case] rule: AlignmentRule,
        #[case] expected: Option<usize>,
    ) {
        assert_eq!(weekday_series().align(date, rule), expected);
    }

    #[test]
    fn test_from_frame() {
        let df = DataFrame::new(vec![
            Series::new("date".into(), vec!["2024-01-05", "2024-01-04"]).into(),
            Series::new("close".into(), vec![101.0, 100.0]).into(),
        ])
        .unwrap();

        let series = PriceSeries::from_frame("SPY", &df).unwrap();
        assert_eq!(series.entity(), "SPY");
        assert_eq!(series.len(), 2);
        assert_eq!(series.first_date(), Some(d(2024, 1, 4)));
        assert_eq!(series.get(1).unwrap().price, 101.0);
    }
}
