//! Search Trends Dashboard
//!
//! Opens a window charting rolling search counts, or with `--export` / `--json`
//! writes the results and exits.

mod cli;

use anyhow::{anyhow, Context};
use clap::Parser;
use eframe::egui;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::runtime::Runtime;
use tracing::info;

use cli::Cli;
use searchtrends::analysis::analyze_file_async;
use searchtrends::app::{ui, App, AppWrapper};
use searchtrends::plotting::{draw_to_file, ChartOptions};
use searchtrends::DashboardConfig;

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    let rt = Runtime::new().context("failed to start tokio runtime")?;
    if cli.is_headless() {
        return rt.block_on(run_headless(&cli, &config));
    }
    rt.block_on(async { run_gui(config) })
}

fn init_tracing() {
    let default_level = if cfg!(feature = "dev") { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn run_headless(cli: &Cli, config: &DashboardConfig) -> anyhow::Result<()> {
    let result = analyze_file_async(config.data_path.clone(), config.window_size).await?;

    if cli.export.is_some() {
        let path = Path::new(&config.plot_path);
        draw_to_file(&result.points, &ChartOptions::from_config(config), path)
            .map_err(|e| anyhow!("failed to render chart: {}", e))?;
        info!(path = %path.display(), "chart exported");
    }

    if cli.json {
        let mut stdout = std::io::stdout().lock();
        serde_json::to_writer_pretty(&mut stdout, &result.points)?;
        std::io::Write::write_all(&mut stdout, b"\n")?;
    }

    Ok(())
}

fn run_gui(config: DashboardConfig) -> anyhow::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([800.0, 600.0])
            .with_title(config.title.as_str()),
        ..Default::default()
    };

    let title = config.title.clone();
    eframe::run_native(
        &title,
        options,
        Box::new(move |cc| {
            let app = Arc::new(Mutex::new(App::from_config(&config)));
            // Load the configured file right away
            if let Ok(mut state) = app.lock() {
                ui::start_load(&mut state, Arc::clone(&app), cc.egui_ctx.clone());
            }
            Ok(Box::new(AppWrapper { app }) as Box<dyn eframe::App>)
        }),
    )
    .map_err(|e| anyhow!("error running application: {}", e))
}
