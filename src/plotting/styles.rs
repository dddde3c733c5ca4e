use plotters::style::{RGBAColor, RGBColor};

use crate::config::DashboardConfig;

/// Chart theme configuration
#[derive(Clone)]
pub struct ChartTheme {
    pub background_color: RGBAColor,
    pub text_color: RGBAColor,
    pub grid_color: RGBAColor,
    pub axis_color: RGBAColor,
    pub current_color: RGBColor,
    pub previous_color: RGBColor,
}

impl Default for ChartTheme {
    fn default() -> Self {
        Self {
            background_color: RGBAColor(0, 0, 0, 0.94),
            text_color: RGBAColor(255, 255, 255, 0.8),
            grid_color: RGBAColor(255, 255, 255, 0.15),
            axis_color: RGBAColor(255, 255, 255, 0.8),
            current_color: RGBColor(0x88, 0x84, 0xd8),
            previous_color: RGBColor(0x82, 0xca, 0x9d),
        }
    }
}

/// Chart style configuration
#[derive(Clone)]
pub struct ChartStyle {
    pub line_width: u32,
    pub font_size: u32,
    pub margin: u32,
    pub label_area_size: u32,
    /// Dash and gap lengths of the previous period line, in x-axis units
    pub dash_pattern: (f64, f64),
    /// Draw caption, axis labels and legend
    pub annotate: bool,
}

impl ChartStyle {
    /// Lines only: no caption, labels or legend, so no fonts are needed.
    pub fn compact() -> Self {
        Self {
            margin: 4,
            label_area_size: 0,
            annotate: false,
            ..Self::default()
        }
    }
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            line_width: 2,
            font_size: 15,
            margin: 10,
            label_area_size: 50,
            dash_pattern: (0.5, 0.5),
            annotate: true,
        }
    }
}

/// Everything the renderer needs besides the data.
#[derive(Clone)]
pub struct ChartOptions {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub max_points: usize,
    pub theme: ChartTheme,
    pub style: ChartStyle,
}

impl ChartOptions {
    pub fn from_config(config: &DashboardConfig) -> Self {
        Self {
            title: config.title.clone(),
            width: config.chart_width,
            height: config.chart_height,
            max_points: config.max_plot_points,
            theme: ChartTheme::default(),
            style: ChartStyle::default(),
        }
    }
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self::from_config(&DashboardConfig::default())
    }
}
