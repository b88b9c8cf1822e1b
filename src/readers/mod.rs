pub mod geotiff_reader;
pub mod grid_reader;

pub use geotiff_reader::{extract_gdal_item, GeoTiffReader};
pub use grid_reader::{GridFile, GridReader};
