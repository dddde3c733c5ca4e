use image::{ImageFormat, RgbImage};
use once_cell::sync::Lazy;
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use lru::LruCache;
use std::error::Error;
use std::hash::{Hash, Hasher};
use std::io::Cursor;
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex as TokioMutex;
use tracing::debug;

use super::styles::ChartOptions;
use crate::app::App;
use crate::types::AggregatedPoint;
use crate::utils::downsample;

pub type PlotError = Box<dyn Error + Send + Sync>;

type Chart<'a, 'b> = ChartContext<'a, BitMapBackend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

const PLOT_CACHE_TTL: Duration = Duration::from_secs(300);

// Up to 10 rendered charts, each valid for 5 minutes
static PLOT_CACHE: Lazy<Arc<TokioMutex<LruCache<PlotCacheKey, (Arc<Vec<u8>>, Instant)>>>> =
    Lazy::new(|| {
        Arc::new(TokioMutex::new(LruCache::new(
            NonZeroUsize::new(10).unwrap_or(NonZeroUsize::MIN),
        )))
    });

#[derive(Hash, Eq, PartialEq)]
struct PlotCacheKey {
    title: String,
    width: u32,
    height: u32,
    max_points: usize,
    style_hash: u64,
    data_hash: u64,
}

impl PlotCacheKey {
    fn new(points: &[AggregatedPoint], options: &ChartOptions) -> Self {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        for point in points {
            point.date.hash(&mut hasher);
            point.current_period.to_bits().hash(&mut hasher);
            point.previous_period.map(f64::to_bits).hash(&mut hasher);
        }

        Self {
            title: options.title.clone(),
            width: options.width,
            height: options.height,
            max_points: options.max_points,
            style_hash: style_hash(options),
            data_hash: hasher.finish(),
        }
    }
}

// Everything in the theme and style that changes pixels
fn style_hash(options: &ChartOptions) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    let theme = &options.theme;
    for color in [
        &theme.background_color,
        &theme.text_color,
        &theme.grid_color,
        &theme.axis_color,
    ] {
        (color.0, color.1, color.2, color.3.to_bits()).hash(&mut hasher);
    }
    for color in [&theme.current_color, &theme.previous_color] {
        (color.0, color.1, color.2).hash(&mut hasher);
    }

    let style = &options.style;
    style.line_width.hash(&mut hasher);
    style.font_size.hash(&mut hasher);
    style.margin.hash(&mut hasher);
    style.label_area_size.hash(&mut hasher);
    style.dash_pattern.0.to_bits().hash(&mut hasher);
    style.dash_pattern.1.to_bits().hash(&mut hasher);
    style.annotate.hash(&mut hasher);
    hasher.finish()
}

/// Render the chart as PNG bytes on a blocking task, reusing recent renders.
pub async fn generate_plot_async(
    points: Vec<AggregatedPoint>,
    options: ChartOptions,
) -> Result<Arc<Vec<u8>>, PlotError> {
    let cache_key = PlotCacheKey::new(&points, &options);

    if let Some((png, timestamp)) = PLOT_CACHE.lock().await.get(&cache_key) {
        if timestamp.elapsed() < PLOT_CACHE_TTL {
            debug!("plot cache hit");
            return Ok(Arc::clone(png));
        }
    }

    let png = tokio::task::spawn_blocking(move || render_png(&points, &options)).await??;
    let png = Arc::new(png);

    PLOT_CACHE
        .lock()
        .await
        .put(cache_key, (Arc::clone(&png), Instant::now()));

    Ok(png)
}

/// Render the app's current series to its `plot_path`.
pub fn generate_plot(app: &App) -> Result<(), PlotError> {
    draw_to_file(app.points(), &app.chart, Path::new(&app.plot_path))
}

/// Render a series to a PNG file.
pub fn draw_to_file(
    points: &[AggregatedPoint],
    options: &ChartOptions,
    path: &Path,
) -> Result<(), PlotError> {
    let root = BitMapBackend::new(path, (options.width, options.height)).into_drawing_area();
    generate_plot_internal(points, options, &root)?;
    root.present()?;
    debug!(path = %path.display(), points = points.len(), "chart written");
    Ok(())
}

/// Render a series to PNG bytes in memory.
pub fn render_png(points: &[AggregatedPoint], options: &ChartOptions) -> Result<Vec<u8>, PlotError> {
    let (width, height) = (options.width, options.height);
    let mut pixels = vec![0u8; width as usize * height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut pixels, (width, height)).into_drawing_area();
        generate_plot_internal(points, options, &root)?;
        root.present()?;
    }

    let image = RgbImage::from_raw(width, height, pixels)
        .ok_or("pixel buffer does not match the chart size")?;
    let mut png = Vec::new();
    image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    Ok(png)
}

/// Internal function to draw the chart onto a drawing area
pub fn generate_plot_internal(
    points: &[AggregatedPoint],
    options: &ChartOptions,
    root_area: &DrawingArea<BitMapBackend, Shift>,
) -> Result<(), PlotError> {
    let theme = &options.theme;
    let style = &options.style;

    root_area.fill(&theme.background_color)?;

    let plot_data = downsample(points, options.max_points);

    let values: Vec<f64> = plot_data
        .iter()
        .flat_map(|p| std::iter::once(p.current_period).chain(p.previous_period))
        .collect();
    let (min_val, max_val) = calculate_adaptive_range(&values);
    let x_max = plot_data.len().saturating_sub(1).max(1) as f64;

    let mut builder = ChartBuilder::on(root_area);
    builder
        .margin(style.margin)
        .set_all_label_area_size(style.label_area_size);
    if style.annotate {
        builder.caption(
            &options.title,
            ("sans-serif", style.font_size * 2)
                .into_font()
                .color(&theme.text_color),
        );
    }
    let mut chart = builder.build_cartesian_2d(0f64..x_max, min_val..max_val)?;

    if style.annotate {
        let dates: Vec<String> = plot_data.iter().map(|p| p.date.clone()).collect();
        let x_label_formatter = move |x: &f64| {
            if (x - x.round()).abs() > 1e-6 || *x < 0.0 {
                return String::new();
            }
            dates.get(x.round() as usize).cloned().unwrap_or_default()
        };
        let y_label_formatter = |y: &f64| {
            if y.abs() >= 1_000_000.0 {
                format!("{:.1}M", y / 1_000_000.0)
            } else if y.abs() >= 1_000.0 {
                format!("{:.1}K", y / 1_000.0)
            } else {
                format!("{:.0}", y)
            }
        };

        chart
            .configure_mesh()
            .light_line_style(TRANSPARENT)
            .bold_line_style(theme.grid_color)
            .axis_style(theme.axis_color)
            .y_desc("Searches")
            .x_labels(6)
            .label_style(
                ("sans-serif", style.font_size)
                    .into_font()
                    .color(&theme.text_color),
            )
            .x_label_formatter(&x_label_formatter)
            .y_label_formatter(&y_label_formatter)
            .x_label_style(
                ("sans-serif", style.font_size)
                    .into_font()
                    .color(&theme.text_color)
                    .transform(FontTransform::Rotate90)
                    .pos(Pos::new(HPos::Right, VPos::Center)),
            )
            .draw()?;
    }

    draw_grid(&mut chart, x_max)?;
    draw_current_period(&mut chart, &plot_data, options)?;
    draw_previous_period(&mut chart, &plot_data, options)?;

    if style.annotate && !plot_data.is_empty() {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(&theme.background_color)
            .border_style(&theme.axis_color)
            .label_font(
                ("sans-serif", style.font_size)
                    .into_font()
                    .color(&theme.text_color),
            )
            .draw()?;
    }

    Ok(())
}

fn draw_grid(chart: &mut Chart, x_max: f64) -> Result<(), PlotError> {
    let grid_style = ShapeStyle::from(&WHITE.mix(0.15)).stroke_width(1);
    let major_grid_style = ShapeStyle::from(&WHITE.mix(0.25)).stroke_width(2);

    let y_range = chart.y_range();
    let y_min = y_range.start;
    let y_max = y_range.end;
    let y_span = y_max - y_min;

    let y_interval = if y_span > 1_000_000.0 {
        100_000.0
    } else if y_span > 100_000.0 {
        10_000.0
    } else if y_span > 10_000.0 {
        1_000.0
    } else if y_span > 1_000.0 {
        100.0
    } else if y_span > 100.0 {
        10.0
    } else {
        1.0
    };

    let steps = (y_span / y_interval).ceil() as i32;
    let y_start = (y_min / y_interval).floor() * y_interval;

    for i in 0..=steps {
        let y = y_start + i as f64 * y_interval;
        if y > y_max {
            break;
        }
        let style = if i % 5 == 0 {
            major_grid_style
        } else {
            grid_style
        };
        chart.draw_series(std::iter::once(PathElement::new(
            vec![(0.0, y), (x_max, y)],
            style,
        )))?;
    }

    if y_min <= 0.0 && y_max >= 0.0 {
        let zero_line_style = ShapeStyle::from(&WHITE.mix(0.3)).stroke_width(2);
        chart.draw_series(std::iter::once(PathElement::new(
            vec![(0.0, 0.0), (x_max, 0.0)],
            zero_line_style,
        )))?;
    }

    Ok(())
}

fn draw_current_period(
    chart: &mut Chart,
    plot_data: &[AggregatedPoint],
    options: &ChartOptions,
) -> Result<(), PlotError> {
    let line_style = options
        .theme
        .current_color
        .stroke_width(options.style.line_width);
    let series: Vec<(f64, f64)> = plot_data
        .iter()
        .enumerate()
        .map(|(i, p)| (i as f64, p.current_period))
        .collect();

    chart
        .draw_series(LineSeries::new(series, line_style))?
        .label("Current Period")
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], line_style));

    Ok(())
}

fn draw_previous_period(
    chart: &mut Chart,
    plot_data: &[AggregatedPoint],
    options: &ChartOptions,
) -> Result<(), PlotError> {
    let line_style = options
        .theme
        .previous_color
        .stroke_width(options.style.line_width);
    let (dash, gap) = options.style.dash_pattern;
    let dashes: Vec<Vec<(f64, f64)>> = defined_runs(plot_data)
        .iter()
        .flat_map(|run| dash_segments(run, dash, gap))
        .collect();

    chart
        .draw_series(
            dashes
                .into_iter()
                .map(|segment| PathElement::new(segment, line_style)),
        )?
        .label("Previous Period")
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], line_style));

    Ok(())
}

/// Contiguous runs of indexes where the previous period is defined.
pub(crate) fn defined_runs(plot_data: &[AggregatedPoint]) -> Vec<Vec<(f64, f64)>> {
    let mut runs = Vec::new();
    let mut run = Vec::new();
    for (i, p) in plot_data.iter().enumerate() {
        match p.previous_period {
            Some(value) => run.push((i as f64, value)),
            None if !run.is_empty() => runs.push(std::mem::take(&mut run)),
            None => {}
        }
    }
    if !run.is_empty() {
        runs.push(run);
    }
    runs
}

/// Split a polyline into dashes of `dash` x-units separated by `gap` x-units.
///
/// Points must be ordered by x. A non-positive dash or gap, or a polyline that
/// does not advance along x, comes back as a single solid segment.
pub(crate) fn dash_segments(points: &[(f64, f64)], dash: f64, gap: f64) -> Vec<Vec<(f64, f64)>> {
    let (Some(&(first_x, _)), Some(&(last_x, _))) = (points.first(), points.last()) else {
        return Vec::new();
    };
    if dash <= 0.0 || gap <= 0.0 || last_x <= first_x {
        return vec![points.to_vec()];
    }

    let period = dash + gap;
    let mut segments = Vec::new();
    let mut k = 0u32;
    loop {
        let start = first_x + f64::from(k) * period;
        if start >= last_x {
            break;
        }
        let end = (start + dash).min(last_x);

        let inner_from = points.partition_point(|(x, _)| *x <= start);
        let inner_to = points.partition_point(|(x, _)| *x < end);
        let mut segment = Vec::with_capacity(inner_to.saturating_sub(inner_from) + 2);
        segment.push((start, interpolate(points, start)));
        if inner_from < inner_to {
            segment.extend_from_slice(&points[inner_from..inner_to]);
        }
        segment.push((end, interpolate(points, end)));
        segments.push(segment);

        k += 1;
    }
    segments
}

fn interpolate(points: &[(f64, f64)], x: f64) -> f64 {
    let idx = points.partition_point(|(px, _)| *px < x);
    if idx == 0 {
        return points[0].1;
    }
    if idx >= points.len() {
        return points[points.len() - 1].1;
    }
    let (x0, y0) = points[idx - 1];
    let (x1, y1) = points[idx];
    if x1 == x0 {
        y1
    } else {
        y0 + (y1 - y0) * (x - x0) / (x1 - x0)
    }
}

/// Y range that keeps a few extreme peaks from flattening the rest of the chart.
pub(crate) fn calculate_adaptive_range(values: &[f64]) -> (f64, f64) {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    if sorted.is_empty() {
        return (0.0, 1.0);
    }

    // 95th percentile as the main scale
    let p95_idx = (((sorted.len() - 1) as f64 * 0.95) as usize)
        .max(1)
        .min(sorted.len() - 1);
    let normal_max = sorted[p95_idx];
    let absolute_max = sorted[sorted.len() - 1];

    let display_max = if absolute_max > normal_max * 2.0 {
        normal_max * 1.2
    } else {
        absolute_max * 1.1
    };
    let display_min = sorted[0].min(0.0) * 1.1;

    if display_max <= display_min {
        (display_min, display_min + 1.0)
    } else {
        (display_min, display_max)
    }
}
