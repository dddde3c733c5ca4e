use csv::{ReaderBuilder, StringRecord, Trim};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::task::spawn_blocking;
use tracing::{debug, info};

use super::rolling::RollingAggregator;
use crate::error::LoadError;
use crate::types::{AnalysisResult, CountValue, Observation};

/// Header of the date column
pub const DATE_COLUMN: &str = "date";
/// Header of the search count column
pub const COUNT_COLUMN: &str = "searchCount";

/// Parse CSV text with a header row into observations, in file order.
pub fn parse_observations(input: &str) -> Result<Vec<Observation>, LoadError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(input.as_bytes());

    let headers = reader.headers()?.clone();
    let date_idx = column_index(&headers, DATE_COLUMN)?;
    let count_idx = column_index(&headers, COUNT_COLUMN)?;

    let mut observations = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|cell| cell.is_empty()) {
            continue;
        }

        let date = record
            .get(date_idx)
            .filter(|cell| !cell.is_empty())
            .map(str::to_string);
        let search_count = record
            .get(count_idx)
            .map(CountValue::parse)
            .unwrap_or(CountValue::Missing);

        if search_count.counts_as_zero() {
            debug!(
                row = observations.len() + 1,
                value = %search_count,
                "search count is not a number, counting it as zero"
            );
        }
        observations.push(Observation::with_value(date, search_count));
    }

    Ok(observations)
}

fn column_index(headers: &StringRecord, name: &'static str) -> Result<usize, LoadError> {
    headers
        .iter()
        .position(|header| header == name)
        .ok_or(LoadError::MissingColumn(name))
}

/// Read and parse a CSV file.
pub fn read_observations(path: &Path) -> Result<Vec<Observation>, LoadError> {
    let contents = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_observations(&contents)
}

/// Read and parse a CSV file on a blocking task.
pub async fn load_observations_async(path: PathBuf) -> Result<Vec<Observation>, LoadError> {
    spawn_blocking(move || read_observations(&path))
        .await
        .map_err(|e| LoadError::Task(e.to_string()))?
}

/// Load a CSV file and compute its rolling periods.
pub async fn analyze_file_async(path: PathBuf, window: usize) -> Result<AnalysisResult, LoadError> {
    let start_time = Instant::now();
    let aggregator = RollingAggregator::new(window)?;

    let observations = load_observations_async(path.clone()).await?;
    let mut result = analyze_observations(observations, aggregator, start_time)?;
    result.source_path = path.display().to_string();

    info!(
        path = %path.display(),
        rows = result.observations.len(),
        non_numeric = result.non_numeric_count,
        elapsed = result.elapsed_time,
        "loaded search data"
    );
    Ok(result)
}

/// Aggregate observations that are already in memory.
pub fn analyze_observations(
    observations: Vec<Observation>,
    aggregator: RollingAggregator,
    start_time: Instant,
) -> Result<AnalysisResult, LoadError> {
    let points = aggregator.aggregate(&observations)?;
    let non_numeric_count = observations
        .iter()
        .filter(|observation| observation.search_count.counts_as_zero())
        .count();

    Ok(AnalysisResult {
        source_path: String::new(),
        observations,
        points,
        window_size: aggregator.window(),
        non_numeric_count,
        elapsed_time: start_time.elapsed().as_secs_f64(),
    })
}
