pub mod artifact;
pub mod grid;
pub mod palette;
pub mod period;
pub mod raster;

pub use artifact::SourceArtifact;
pub use grid::{AccumulatedGrid, GeoGrid, Instant};
pub use palette::{Palette, PaletteEntry};
pub use period::{week_ending_on_or_after, AccumulationPeriod, PeriodTier};
pub use raster::{AffineTransform, RgbRaster};
