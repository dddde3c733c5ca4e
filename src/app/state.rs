use chrono::{DateTime, Local};
use eframe::App as EApp;
use egui::TextureHandle;
use std::future::Future;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{error, warn};

use crate::analysis::{analyze_file_async, loader, CacheManager, RollingAggregator};
use crate::config::DashboardConfig;
use crate::error::LoadError;
use crate::plotting::ChartOptions;
use crate::types::{AggregatedPoint, AnalysisResult, DatasetKey};

/// Window sizes offered in the side panel besides the configured one
pub const WINDOW_CHOICES: [usize; 3] = [7, 14, 28];

/// Main application state
#[derive(Clone)]
pub struct App {
    pub data_path: String,
    pub window_size: usize,
    pub plot_path: String,
    pub chart: ChartOptions,
    pub plot_png: Option<Arc<Vec<u8>>>,
    pub plot_texture: Option<TextureHandle>,
    pub texture_stale: bool,
    pub update_needed: bool,
    pub is_loading: bool,
    pub is_rendering: bool,
    pub error_message: Option<String>,
    pub analysis_result: Option<AnalysisResult>,
    pub analysis_cache: CacheManager,
    pub last_load_time: Option<f64>,
    pub loaded_at: Option<DateTime<Local>>,
}

impl App {
    pub fn from_config(config: &DashboardConfig) -> Self {
        Self {
            data_path: config.data_path.display().to_string(),
            window_size: config.window_size,
            plot_path: config.plot_path.clone(),
            chart: ChartOptions::from_config(config),
            plot_png: None,
            plot_texture: None,
            texture_stale: false,
            update_needed: false,
            is_loading: false,
            is_rendering: false,
            error_message: None,
            analysis_result: None,
            analysis_cache: CacheManager::new(),
            last_load_time: None,
            loaded_at: None,
        }
    }

    /// Points of the current result, empty before the first load
    pub fn points(&self) -> &[AggregatedPoint] {
        self.analysis_result
            .as_ref()
            .map(|result| result.points.as_slice())
            .unwrap_or(&[])
    }

    /// Cache key for the loaded file at the selected window.
    ///
    /// Built from the path the current result was read from, not the path
    /// field, which the user may have edited since.
    pub fn cache_key(&self) -> Option<DatasetKey> {
        self.analysis_result.as_ref().map(|result| DatasetKey {
            path: result.source_path.clone(),
            window_size: self.window_size,
        })
    }

    /// Window sizes for the selector, including the current one
    pub fn window_choices(&self) -> Vec<usize> {
        let mut choices = WINDOW_CHOICES.to_vec();
        if !choices.contains(&self.window_size) {
            choices.push(self.window_size);
            choices.sort_unstable();
        }
        choices
    }

    /// Mark the app as loading and return the work that reads the file.
    ///
    /// Earlier results for the same file are dropped from the cache, since the
    /// file may have changed on disk.
    pub fn begin_load(
        &mut self,
    ) -> impl Future<Output = Result<AnalysisResult, LoadError>> + Send + 'static {
        self.is_loading = true;
        self.error_message = None;
        self.analysis_cache.invalidate_path(&self.data_path);
        analyze_file_async(PathBuf::from(&self.data_path), self.window_size)
    }

    /// Update the app state with new analysis results
    pub fn update_with_result(&mut self, result: AnalysisResult) {
        self.window_size = result.window_size;
        let key = DatasetKey {
            path: result.source_path.clone(),
            window_size: result.window_size,
        };
        self.analysis_cache.store(key, result.clone());

        self.last_load_time = Some(result.elapsed_time);
        self.loaded_at = Some(Local::now());
        self.analysis_result = Some(result);
        self.error_message = None;
        self.is_loading = false;
        self.update_needed = true;
    }

    /// Replace the view with an error message
    pub fn set_error(&mut self, message: impl ToString) {
        self.error_message = Some(message.to_string());
        self.analysis_result = None;
        self.plot_png = None;
        self.plot_texture = None;
        self.is_loading = false;
    }

    /// Switch the rolling window, reusing cached or in-memory data
    pub fn select_window(&mut self, window_size: usize) {
        // A load in flight would overwrite the window with its own
        if self.is_loading {
            return;
        }
        if window_size == self.window_size && self.analysis_result.is_some() {
            return;
        }
        self.window_size = window_size;

        let Some(key) = self.cache_key() else {
            return;
        };
        if let Some(cached) = self.analysis_cache.get(&key).cloned() {
            self.update_with_result(cached);
            return;
        }

        let Some(observations) = self
            .analysis_result
            .as_ref()
            .map(|result| result.observations.clone())
        else {
            return;
        };

        let outcome = RollingAggregator::new(window_size)
            .map_err(LoadError::from)
            .and_then(|aggregator| {
                loader::analyze_observations(observations, aggregator, Instant::now())
            });
        match outcome {
            Ok(mut result) => {
                result.source_path = key.path;
                self.update_with_result(result);
            }
            Err(e) => {
                warn!("failed to re-aggregate: {}", e);
                self.set_error(e);
            }
        }
    }

    /// Store a freshly rendered chart
    pub fn set_plot(&mut self, png: Arc<Vec<u8>>) {
        self.plot_png = Some(png);
        self.texture_stale = true;
        self.is_rendering = false;
    }

    /// Lines for the stats block under the chart
    pub fn summary_lines(&self) -> Vec<String> {
        let Some(result) = &self.analysis_result else {
            return Vec::new();
        };

        let mut lines = vec![format!("Observations: {}", result.observations.len())];
        if result.non_numeric_count > 0 {
            lines.push(format!(
                "Non-numeric search counts counted as zero: {}",
                result.non_numeric_count
            ));
        }
        if let Some(latest) = result.latest() {
            let line = match (latest.previous_period, latest.percent_change()) {
                (Some(previous), Some(change)) => format!(
                    "Latest ({}): current {:.0} vs previous {:.0} ({:+.1}%)",
                    latest.date, latest.current_period, previous, change
                ),
                (Some(previous), None) => format!(
                    "Latest ({}): current {:.0} vs previous {:.0}",
                    latest.date, latest.current_period, previous
                ),
                (None, _) => format!(
                    "Latest ({}): current {:.0}, previous period not available yet",
                    latest.date, latest.current_period
                ),
            };
            lines.push(line);
        }
        if let (Some(elapsed), Some(loaded_at)) = (self.last_load_time, self.loaded_at) {
            lines.push(format!(
                "Loaded at {} in {:.3}s",
                loaded_at.format("%H:%M:%S"),
                elapsed
            ));
        }
        lines
    }
}

impl Default for App {
    fn default() -> Self {
        Self::from_config(&DashboardConfig::default())
    }
}

/// Thread-safe wrapper around App for use with eframe
pub struct AppWrapper {
    pub app: Arc<Mutex<App>>,
}

impl EApp for AppWrapper {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if let Ok(mut app) = self.app.lock() {
            super::ui::draw_ui(&mut app, ctx, Arc::clone(&self.app));
        } else {
            error!("failed to acquire app lock in update");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Observation;
    use pretty_assertions::assert_eq;

    fn loaded_app() -> App {
        let observations: Vec<Observation> = (0..14)
            .map(|i| Observation::new(format!("2024-02-{:02}", i + 1), 10.0))
            .collect();
        let result = loader::analyze_observations(
            observations,
            RollingAggregator::default(),
            Instant::now(),
        )
        .unwrap();

        let mut app = App::default();
        let source_path = app.data_path.clone();
        app.update_with_result(AnalysisResult {
            source_path,
            ..result
        });
        app
    }

    #[test]
    fn test_update_with_result() {
        let app = loaded_app();
        assert_eq!(app.points().len(), 14);
        assert!(app.update_needed);
        assert!(!app.is_loading);
        assert!(app.analysis_cache.get(&app.cache_key().unwrap()).is_some());
    }

    #[test]
    fn test_select_window_recomputes_and_caches() {
        let mut app = loaded_app();
        app.select_window(14);

        assert_eq!(app.window_size, 14);
        assert_eq!(app.points()[13].current_period, 140.0);
        assert_eq!(app.points()[13].previous_period, None);
        assert_eq!(app.analysis_cache.len(), 2);

        app.select_window(7);
        assert_eq!(app.points()[13].previous_period, Some(70.0));
    }

    #[test]
    fn test_select_window_caches_under_loaded_path() {
        let mut app = loaded_app();
        let loaded_path = app.data_path.clone();
        app.data_path = "other_search_data.csv".to_string();
        app.select_window(14);

        let edited = DatasetKey {
            path: "other_search_data.csv".to_string(),
            window_size: 14,
        };
        let loaded = DatasetKey {
            path: loaded_path,
            window_size: 14,
        };
        assert!(app.analysis_cache.get(&edited).is_none());
        assert!(app.analysis_cache.get(&loaded).is_some());
        assert_eq!(app.analysis_result.as_ref().unwrap().source_path, loaded.path);
    }

    #[test]
    fn test_select_window_ignored_while_loading() {
        let mut app = loaded_app();
        app.is_loading = true;
        app.select_window(14);

        assert_eq!(app.window_size, 7);
        assert_eq!(app.points()[13].previous_period, Some(70.0));
        assert_eq!(app.analysis_cache.len(), 1);
    }

    #[test]
    fn test_set_error_clears_view() {
        let mut app = loaded_app();
        app.is_loading = true;
        app.set_error("Error loading data: boom");

        assert_eq!(app.error_message.as_deref(), Some("Error loading data: boom"));
        assert!(app.points().is_empty());
        assert!(!app.is_loading);
    }

    #[test]
    fn test_summary_lines() {
        let app = loaded_app();
        let lines = app.summary_lines();
        assert_eq!(lines[0], "Observations: 14");
        assert_eq!(
            lines[1],
            "Latest (2024-02-14): current 70 vs previous 70 (+0.0%)"
        );
        assert!(App::default().summary_lines().is_empty());
    }

    #[test]
    fn test_window_choices_include_configured() {
        let mut app = App::default();
        assert_eq!(app.window_choices(), vec![7, 14, 28]);
        app.window_size = 10;
        assert_eq!(app.window_choices(), vec![7, 10, 14, 28]);
    }

    #[tokio::test]
    async fn test_begin_load_missing_file() {
        let mut app = App::default();
        app.data_path = "/nonexistent/gold.csv".to_string();
        let result = app.begin_load().await;

        assert!(app.is_loading);
        let err = result.unwrap_err();
        app.set_error(err);
        assert!(app.error_message.unwrap().starts_with("Error loading data"));
    }
}
