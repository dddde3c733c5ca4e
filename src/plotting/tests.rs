use super::chart::{calculate_adaptive_range, dash_segments, defined_runs};
use super::*;
use crate::app::App;
use crate::types::AggregatedPoint;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

fn compact_options() -> ChartOptions {
    ChartOptions {
        width: 320,
        height: 200,
        style: ChartStyle::compact(),
        ..ChartOptions::default()
    }
}

fn series(n: usize) -> Vec<AggregatedPoint> {
    (0..n)
        .map(|i| AggregatedPoint {
            date: format!("2024-01-{:02}", i + 1),
            current_period: 10.0 * ((i % 7) + 1) as f64,
            previous_period: if i >= 13 { Some(70.0) } else { None },
        })
        .collect()
}

fn setup_test_app() -> (App, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let plot_path = temp_dir.path().join("test_plot.png");

    let mut app = App::default();
    app.plot_path = plot_path.to_str().unwrap().to_string();
    app.chart = compact_options();
    app.analysis_result = Some(crate::types::AnalysisResult {
        points: series(20),
        window_size: 7,
        ..Default::default()
    });

    (app, temp_dir)
}

#[test]
fn test_generate_plot() {
    let (app, _temp_dir) = setup_test_app();

    assert!(generate_plot(&app).is_ok());
    let metadata = fs::metadata(&app.plot_path).unwrap();
    assert!(metadata.len() > 0);

    let bytes = fs::read(&app.plot_path).unwrap();
    assert_eq!(&bytes[..8], &PNG_SIGNATURE);
}

#[test]
fn test_empty_plot() {
    let (mut app, _temp_dir) = setup_test_app();
    app.analysis_result = None;

    // Should handle empty data gracefully
    assert!(generate_plot(&app).is_ok());
}

#[test]
fn test_render_png_in_memory() {
    let png = render_png(&series(30), &compact_options()).unwrap();
    assert_eq!(&png[..8], &PNG_SIGNATURE);

    let image = image::load_from_memory(&png).unwrap();
    assert_eq!((image.width(), image.height()), (320, 200));
}

#[test]
fn test_render_downsampled_series() {
    let mut options = compact_options();
    options.max_points = 10;
    assert!(render_png(&series(200), &options).is_ok());
}

#[tokio::test]
async fn test_async_plot_is_cached() {
    let mut points = series(15);
    points[0].date = "cache-test".to_string();

    let first = generate_plot_async(points.clone(), compact_options()).await.unwrap();
    let second = generate_plot_async(points, compact_options()).await.unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[tokio::test]
async fn test_async_plot_cache_tells_styles_apart() {
    let mut points = series(15);
    points[0].date = "style-cache-test".to_string();

    let solid = ChartOptions {
        style: ChartStyle {
            dash_pattern: (1.0, 0.0),
            ..ChartStyle::compact()
        },
        ..compact_options()
    };
    let dashed = generate_plot_async(points.clone(), compact_options()).await.unwrap();
    let undashed = generate_plot_async(points.clone(), solid).await.unwrap();
    assert!(!Arc::ptr_eq(&dashed, &undashed));

    let mut recolored = compact_options();
    recolored.theme.previous_color = plotters::style::RGBColor(255, 0, 0);
    let red = generate_plot_async(points, recolored).await.unwrap();
    assert!(!Arc::ptr_eq(&dashed, &red));
}

#[test]
fn test_adaptive_range() {
    let values = vec![1.0, 2.0, 3.0, 4.0, 5.0, 100.0]; // 100.0 is an outlier
    let (min, max) = calculate_adaptive_range(&values);

    assert_eq!(min, 0.0);
    assert!(max < 100.0); // Max should be scaled down due to outlier
    assert!(max > 5.0); // But should still be greater than the normal range
}

#[test]
fn test_adaptive_range_degenerate() {
    assert_eq!(calculate_adaptive_range(&[]), (0.0, 1.0));
    assert_eq!(calculate_adaptive_range(&[0.0, 0.0]), (0.0, 1.0));
}

#[test]
fn test_defined_runs() {
    let mut points = series(16);
    points[14].previous_period = None;
    let runs = defined_runs(&points);

    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0], vec![(13.0, 70.0)]);
    assert_eq!(runs[1], vec![(15.0, 70.0)]);
    assert!(defined_runs(&series(5)).is_empty());
}

#[test]
fn test_dash_segments() {
    let line = vec![(0.0, 0.0), (4.0, 4.0)];
    let dashes = dash_segments(&line, 1.0, 1.0);

    assert_eq!(
        dashes,
        vec![
            vec![(0.0, 0.0), (1.0, 1.0)],
            vec![(2.0, 2.0), (3.0, 3.0)],
        ]
    );
}

#[test]
fn test_dash_segments_keep_inner_points() {
    let line = vec![(0.0, 0.0), (1.0, 5.0), (2.0, 0.0), (10.0, 0.0)];
    let dashes = dash_segments(&line, 3.0, 1.0);

    assert_eq!(dashes[0], vec![(0.0, 0.0), (1.0, 5.0), (2.0, 0.0), (3.0, 0.0)]);
    assert_eq!(dashes[1], vec![(4.0, 0.0), (7.0, 0.0)]);
    assert_eq!(dashes[2], vec![(8.0, 0.0), (10.0, 0.0)]);
}

#[test]
fn test_dash_segments_degenerate() {
    assert!(dash_segments(&[], 1.0, 1.0).is_empty());
    assert_eq!(dash_segments(&[(3.0, 1.0)], 1.0, 1.0), vec![vec![(3.0, 1.0)]]);
    let line = vec![(0.0, 0.0), (2.0, 2.0)];
    assert_eq!(dash_segments(&line, 0.0, 1.0), vec![line.clone()]);
}
