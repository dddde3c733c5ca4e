mod cache;
pub mod loader;
pub mod rolling;


pub use cache::CacheManager;
pub use loader::{analyze_file_async, load_observations_async, parse_observations};
pub use rolling::{aggregate, RollingAggregator, DEFAULT_WINDOW};
