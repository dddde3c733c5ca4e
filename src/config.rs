//! Dashboard configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::analysis::DEFAULT_WINDOW;
use crate::error::ConfigError;

/// Settings for loading data and drawing the chart.
///
/// Stored as JSON. Fields absent from the file keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// CSV file with `date` and `searchCount` columns
    pub data_path: PathBuf,

    /// Observations per rolling window
    pub window_size: usize,

    /// Where `--export` and `generate_plot` write the chart
    pub plot_path: String,

    /// Chart width in pixels
    pub chart_width: u32,

    /// Chart height in pixels
    pub chart_height: u32,

    /// Series longer than this are thinned before drawing
    pub max_plot_points: usize,

    /// Chart caption and window title
    pub title: String,
}

impl DashboardConfig {
    pub fn new() -> Self {
        Self {
            data_path: PathBuf::from("gold_search_data.csv"),
            window_size: DEFAULT_WINDOW,
            plot_path: "search_trends.png".to_string(),
            chart_width: 1000,
            chart_height: 480,
            max_plot_points: 500,
            title: "Gold Search Trends Analysis".to_string(),
        }
    }

    /// `<config dir>/searchtrends/config.json`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("searchtrends").join("config.json"))
    }

    /// Load from a JSON file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Write as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(io_err)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_size == 0 {
            return Err(ConfigError::Invalid("window_size must be at least 1".into()));
        }
        if self.chart_width == 0 || self.chart_height == 0 {
            return Err(ConfigError::Invalid("chart dimensions must be non-zero".into()));
        }
        if self.max_plot_points == 0 {
            return Err(ConfigError::Invalid("max_plot_points must be at least 1".into()));
        }
        Ok(())
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self::new()
    }
}
