//! # Search Trend Analysis Library
//!
//! `searchtrends` loads daily search counts from a CSV file, computes trailing
//! rolling sums for a current period and the period before it, and renders
//! both as a line chart in a small dashboard.
//!
//! ## Features
//!
//! - Typed CSV loading with numeric coercion of bad cells
//! - Rolling current/previous period sums with a configurable window
//! - PNG chart rendering with caching of recent renders
//! - Interactive dashboard with loading and error states
//! - JSON export of the aggregated series
//!
//! ## Example
//!
//! ```
//! use searchtrends::analysis::aggregate;
//! use searchtrends::types::Observation;
//!
//! let observations: Vec<Observation> = (0..14)
//!     .map(|day| Observation::new(format!("2024-01-{:02}", day + 1), 10.0))
//!     .collect();
//!
//! let points = aggregate(&observations).unwrap();
//! assert_eq!(points[6].current_period, 70.0);
//! assert_eq!(points[6].previous_period, None);
//! assert_eq!(points[13].previous_period, Some(70.0));
//! ```

pub mod analysis;
pub mod app;
pub mod config;
pub mod error;
pub mod plotting;
pub mod types;
pub mod utils;

// Re-export main types for convenience
pub use app::App as SearchTrendsApp;
pub use config::DashboardConfig;
pub use error::{ConfigError, LoadError, ValidationError};
pub use types::{AggregatedPoint, AnalysisResult, CountValue, DatasetKey, Observation};
