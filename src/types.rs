//! # Common Types
//!
//! This module contains the record shapes shared by the loader, the rolling
//! aggregator, the chart renderer and the dashboard.

use serde::Serialize;
use std::fmt;

/// A search count cell as it was found in the input table.
///
/// Values are kept in their typed form so the aggregator can decide how each
/// one contributes to a window sum. See [`CountValue::as_count`].
#[derive(Debug, Clone, PartialEq)]
pub enum CountValue {
    /// A numeric cell
    Number(f64),
    /// A boolean cell (`true` / `false`)
    Bool(bool),
    /// A non-empty cell that is not a finite number
    Text(String),
    /// An empty or absent cell
    Missing,
}

impl CountValue {
    /// Classify a raw cell from the CSV table.
    pub fn parse(cell: &str) -> Self {
        let cell = cell.trim();
        match cell {
            "" => CountValue::Missing,
            "true" | "TRUE" | "True" => CountValue::Bool(true),
            "false" | "FALSE" | "False" => CountValue::Bool(false),
            _ => match cell.parse::<f64>() {
                Ok(value) if value.is_finite() => CountValue::Number(value),
                _ => CountValue::Text(cell.to_string()),
            },
        }
    }

    /// Numeric contribution of this value to a window sum.
    ///
    /// Anything that cannot be coerced to a finite number counts as zero, so a
    /// single bad cell never turns a whole window into NaN.
    pub fn as_count(&self) -> f64 {
        match self {
            CountValue::Number(value) if value.is_finite() => *value,
            CountValue::Number(_) => 0.0,
            CountValue::Bool(true) => 1.0,
            CountValue::Bool(false) => 0.0,
            CountValue::Text(text) => match text.trim().parse::<f64>() {
                Ok(value) if value.is_finite() => value,
                _ => 0.0,
            },
            CountValue::Missing => 0.0,
        }
    }

    /// Whether the value is a real number (as opposed to a coerced one).
    pub fn is_numeric(&self) -> bool {
        matches!(self, CountValue::Number(value) if value.is_finite())
    }

    /// Whether a non-numeric value ended up contributing zero.
    ///
    /// `true` coerces to 1 and is not reported.
    pub fn counts_as_zero(&self) -> bool {
        !self.is_numeric() && self.as_count() == 0.0
    }
}

impl From<f64> for CountValue {
    fn from(value: f64) -> Self {
        CountValue::Number(value)
    }
}

impl fmt::Display for CountValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CountValue::Number(value) => write!(f, "{}", value),
            CountValue::Bool(value) => write!(f, "{}", value),
            CountValue::Text(text) => f.write_str(text),
            CountValue::Missing => f.write_str("<missing>"),
        }
    }
}

/// One dated search count record.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// Date identifier, compared as a raw string
    pub date: Option<String>,
    /// Search count for that date
    pub search_count: CountValue,
}

impl Observation {
    /// Create an observation with a numeric search count.
    pub fn new(date: impl Into<String>, search_count: f64) -> Self {
        Self {
            date: Some(date.into()),
            search_count: CountValue::Number(search_count),
        }
    }

    /// Create an observation from an already classified cell.
    pub fn with_value(date: Option<String>, search_count: CountValue) -> Self {
        Self { date, search_count }
    }

    /// The date if it is present and not blank.
    pub fn usable_date(&self) -> Option<&str> {
        self.date.as_deref().filter(|date| !date.trim().is_empty())
    }
}

/// One point of the derived series handed to the chart renderer.
///
/// The serialized field names (`date`, `currentPeriod`, `previousPeriod`) are
/// shared with the chart and the JSON export.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedPoint {
    /// Date of the observation the windows end at
    pub date: String,
    /// Sum over the trailing window ending at this point
    pub current_period: f64,
    /// Sum over the full window preceding the current one, if it exists
    pub previous_period: Option<f64>,
}

impl AggregatedPoint {
    /// Relative change of the current period against the previous one, in percent.
    pub fn percent_change(&self) -> Option<f64> {
        match self.previous_period {
            Some(previous) if previous != 0.0 => {
                Some((self.current_period - previous) / previous * 100.0)
            }
            _ => None,
        }
    }
}

/// A key used for caching analysis results by data file and window size.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct DatasetKey {
    /// Path of the CSV file the observations came from
    pub path: String,
    /// Window size the result was aggregated with
    pub window_size: usize,
}

/// The result of loading and aggregating one data file.
#[derive(Debug, Clone, Default)]
pub struct AnalysisResult {
    /// File the observations were read from, empty for in-memory data
    pub source_path: String,
    /// Observations in input order
    pub observations: Vec<Observation>,
    /// Rolling sums in date order, one per observation
    pub points: Vec<AggregatedPoint>,
    /// Window size used for the rolling sums
    pub window_size: usize,
    /// Number of rows whose search count was not a number and counted as zero
    pub non_numeric_count: usize,
    /// Wall time spent loading and aggregating, in seconds
    pub elapsed_time: f64,
}

impl AnalysisResult {
    /// The most recent point of the series.
    pub fn latest(&self) -> Option<&AggregatedPoint> {
        self.points.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cells() {
        assert_eq!(CountValue::parse("42"), CountValue::Number(42.0));
        assert_eq!(CountValue::parse(" 3.5 "), CountValue::Number(3.5));
        assert_eq!(CountValue::parse(""), CountValue::Missing);
        assert_eq!(CountValue::parse("TRUE"), CountValue::Bool(true));
        assert_eq!(CountValue::parse("abc"), CountValue::Text("abc".to_string()));
        assert_eq!(CountValue::parse("NaN"), CountValue::Text("NaN".to_string()));
        assert_eq!(CountValue::parse("inf"), CountValue::Text("inf".to_string()));
    }

    #[test]
    fn test_coercion_never_yields_nan() {
        let values = [
            CountValue::Number(f64::NAN),
            CountValue::Number(f64::INFINITY),
            CountValue::Text("abc".to_string()),
            CountValue::Missing,
            CountValue::Bool(false),
        ];
        for value in &values {
            assert_eq!(value.as_count(), 0.0, "{:?}", value);
        }
        assert_eq!(CountValue::Bool(true).as_count(), 1.0);
        assert_eq!(CountValue::Text(" 12 ".to_string()).as_count(), 12.0);
    }

    #[test]
    fn test_counts_as_zero() {
        assert!(CountValue::parse("abc").counts_as_zero());
        assert!(CountValue::parse("").counts_as_zero());
        assert!(CountValue::parse("false").counts_as_zero());
        assert!(CountValue::Number(f64::NAN).counts_as_zero());
        assert!(!CountValue::parse("true").counts_as_zero());
        assert!(!CountValue::parse("0").counts_as_zero());
        assert!(!CountValue::parse("12").counts_as_zero());
    }

    #[test]
    fn test_usable_date() {
        assert_eq!(Observation::new("2024-01-01", 1.0).usable_date(), Some("2024-01-01"));
        let blank = Observation::with_value(Some("  ".to_string()), CountValue::Missing);
        assert_eq!(blank.usable_date(), None);
    }

    #[test]
    fn test_point_serializes_with_stable_field_names() {
        let point = AggregatedPoint {
            date: "2024-01-01".to_string(),
            current_period: 70.0,
            previous_period: None,
        };
        let json = serde_json::to_value(&point).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "date": "2024-01-01",
                "currentPeriod": 70.0,
                "previousPeriod": null
            })
        );
    }

    #[test]
    fn test_percent_change() {
        let mut point = AggregatedPoint {
            date: "d".to_string(),
            current_period: 150.0,
            previous_period: Some(100.0),
        };
        assert_eq!(point.percent_change(), Some(50.0));
        point.previous_period = Some(0.0);
        assert_eq!(point.percent_change(), None);
        point.previous_period = None;
        assert_eq!(point.percent_change(), None);
    }

    #[test]
    fn test_dataset_key() {
        let key1 = DatasetKey {
            path: "data.csv".to_string(),
            window_size: 7,
        };
        let key2 = key1.clone();
        let key3 = DatasetKey {
            path: "data.csv".to_string(),
            window_size: 14,
        };
        assert_eq!(key1, key2);
        assert_ne!(key1, key3);
    }
}
