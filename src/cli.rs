use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;

use searchtrends::DashboardConfig;

#[derive(Parser)]
#[command(name = "searchtrends")]
#[command(version)]
#[command(about = "Rolling search trend dashboard for daily search counts")]
pub struct Cli {
    /// CSV file with `date` and `searchCount` columns
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    /// Observations per rolling window
    #[arg(short, long)]
    pub window: Option<usize>,

    /// Config file (defaults to the platform config directory)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Render the chart to this PNG file and exit
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Print the aggregated series as JSON and exit
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    pub fn is_headless(&self) -> bool {
        self.export.is_some() || self.json
    }

    /// Config file values with command-line overrides applied
    pub fn resolve_config(&self) -> anyhow::Result<DashboardConfig> {
        let mut config = match self.config.clone().or_else(DashboardConfig::default_path) {
            Some(path) => DashboardConfig::load(&path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => DashboardConfig::default(),
        };

        if let Some(data) = &self.data {
            config.data_path = data.clone();
        }
        if let Some(window) = self.window {
            config.window_size = window;
        }
        if let Some(export) = &self.export {
            config.plot_path = export.display().to_string();
        }

        config.validate()?;
        Ok(config)
    }
}
