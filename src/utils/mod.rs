pub mod constants;
pub mod coordinates;
pub mod filename;
pub mod progress;

pub use constants::*;
pub use coordinates::{is_strictly_ascending, pixel_center};
pub use filename::{
    instant_grid_name, parse_daily_grid_name, parse_raw_raster_name, period_grid_name,
    period_provenance_name, raw_raster_name,
};
pub use progress::ProgressReporter;
