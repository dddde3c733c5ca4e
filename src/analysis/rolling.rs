//! Trailing window sums for a current and a previous period.

use tracing::debug;

use crate::error::ValidationError;
use crate::types::{AggregatedPoint, Observation};

/// Default number of observations per window (one week of daily data).
pub const DEFAULT_WINDOW: usize = 7;

/// Computes rolling sums over date-sorted observations.
///
/// For the observation at sorted index `i`, the current window is
/// `[max(0, i - (w - 1)), i]` and grows until it holds `w` observations. The
/// previous window is the `w` observations right before the current window
/// start, and only yields a value once all `w` of them exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollingAggregator {
    window: usize,
}

impl RollingAggregator {
    pub fn new(window: usize) -> Result<Self, ValidationError> {
        if window == 0 {
            return Err(ValidationError::ZeroWindow);
        }
        Ok(Self { window })
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Aggregate observations into one point per observation, in date order.
    ///
    /// Fails without producing any output if an observation has no usable date.
    pub fn aggregate(
        &self,
        observations: &[Observation],
    ) -> Result<Vec<AggregatedPoint>, ValidationError> {
        let sorted = sort_by_date(observations)?;
        let counts: Vec<f64> = sorted
            .iter()
            .map(|(_, observation)| observation.search_count.as_count())
            .collect();

        let mut points = Vec::with_capacity(sorted.len());
        for (i, (date, _)) in sorted.iter().enumerate() {
            let window_start = i.saturating_sub(self.window - 1);
            let current_period: f64 = counts[window_start..=i].iter().sum();

            let previous_start = window_start.saturating_sub(self.window);
            let previous = &counts[previous_start..window_start];
            let previous_period = if previous.len() == self.window {
                Some(previous.iter().sum())
            } else {
                None
            };

            points.push(AggregatedPoint {
                date: (*date).to_string(),
                current_period,
                previous_period,
            });
        }

        debug!(
            observations = observations.len(),
            window = self.window,
            "aggregated rolling periods"
        );
        Ok(points)
    }
}

impl Default for RollingAggregator {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
        }
    }
}

/// Aggregate with the default 7-observation window.
pub fn aggregate(observations: &[Observation]) -> Result<Vec<AggregatedPoint>, ValidationError> {
    RollingAggregator::default().aggregate(observations)
}

/// Validate dates and sort by the raw date string, keeping input order for ties.
fn sort_by_date(
    observations: &[Observation],
) -> Result<Vec<(&str, &Observation)>, ValidationError> {
    let mut sorted = observations
        .iter()
        .enumerate()
        .map(|(index, observation)| {
            observation
                .usable_date()
                .map(|date| (date, observation))
                .ok_or(ValidationError::MissingDate { index })
        })
        .collect::<Result<Vec<_>, _>>()?;
    // `sort_by` is stable
    sorted.sort_by(|(a, _), (b, _)| a.cmp(b));
    Ok(sorted)
}
