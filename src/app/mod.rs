mod state;
pub mod ui;

pub use state::{App, AppWrapper, WINDOW_CHOICES};
