mod chart;
mod styles;

#[cfg(test)]
mod tests;

pub use chart::{
    draw_to_file, generate_plot, generate_plot_async, generate_plot_internal, render_png,
    PlotError,
};
pub use styles::{ChartOptions, ChartStyle, ChartTheme};
