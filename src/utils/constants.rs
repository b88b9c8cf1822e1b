/// Product tags used in artifact file names
pub const PRODUCT_SIX_HOUR: &str = "RNN6H";
pub const PRODUCT_DAILY: &str = "RNN24H";
pub const PRODUCT_WEEKLY: &str = "RNN7D";

/// File extensions
pub const RASTER_EXTENSION: &str = "tif";
pub const GRID_EXTENSION: &str = "parquet";
pub const PROVENANCE_EXTENSION: &str = "txt";

/// Grid variable names
pub const VAR_INSTANT: &str = "precipitation_mm";
pub const VAR_DAILY: &str = "precipitation_mm_24h";
pub const VAR_WEEKLY: &str = "precipitation_mm_7d";
pub const UNITS_MM: &str = "mm";

/// Grid file column and metadata keys
pub const COLUMN_LAT: &str = "lat";
pub const COLUMN_LON: &str = "lon";
pub const META_VARIABLE: &str = "variable";
pub const META_ROWS: &str = "rows";
pub const META_COLS: &str = "cols";
pub const META_PERIOD: &str = "period";
pub const META_UNITS: &str = "units";

/// Accumulation structure
pub const SLOT_HOURS: u32 = 6;
pub const SLOTS_PER_DAY: usize = 4;
pub const DAYS_PER_WEEK: usize = 7;

/// Default site and legend key
pub const DEFAULT_SITE: &str = "GLD";
pub const DEFAULT_LEGEND_KEY: &str = "ESCALA";
pub const LEGEND_ENTRIES_KEY: &str = "Lista RGBA";

/// Default region of interest (degrees)
pub const DEFAULT_LON_MIN: f64 = 0.0;
pub const DEFAULT_LON_MAX: f64 = 3.5;
pub const DEFAULT_LAT_MIN: f64 = 40.0;
pub const DEFAULT_LAT_MAX: f64 = 43.5;

/// Default no-data (yellow) band
pub const DEFAULT_NO_DATA_MIN_RED: u8 = 200;
pub const DEFAULT_NO_DATA_MIN_GREEN: u8 = 180;
pub const DEFAULT_NO_DATA_MAX_BLUE: u8 = 50;

/// GeoTIFF tag codes
pub const TAG_MODEL_PIXEL_SCALE: u16 = 33550;
pub const TAG_MODEL_TIEPOINT: u16 = 33922;
pub const TAG_MODEL_TRANSFORMATION: u16 = 34264;
pub const TAG_GDAL_METADATA: u16 = 42112;

/// Processing defaults
pub const DEFAULT_ROW_GROUP_SIZE: usize = 65536;
pub const DEFAULT_COMPRESSION: &str = "snappy";

/// Parquet compression options
pub const COMPRESSION_SNAPPY: &str = "snappy";
pub const COMPRESSION_GZIP: &str = "gzip";
pub const COMPRESSION_LZ4: &str = "lz4";
pub const COMPRESSION_ZSTD: &str = "zstd";
pub const COMPRESSION_NONE: &str = "none";
