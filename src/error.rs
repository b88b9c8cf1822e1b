use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProcessingError>;

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TIFF decoding error: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[error("Date parsing error: {0}")]
    DateParse(#[from] chrono::ParseError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration source error: {0}")]
    ConfigSource(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Invalid palette metadata: {0}")]
    InvalidPalette(String),

    #[error("Invalid geotransform: {0}")]
    InvalidTransform(String),

    #[error("Region of interest does not overlap raster: {0}")]
    EmptyWindow(String),

    #[error("Grid shape mismatch: {0}")]
    GridShapeMismatch(String),

    #[error("Coordinate grids differ: {0}")]
    CoordinateMismatch(String),

    #[error("Missing required data: {0}")]
    MissingData(String),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Async task error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl ProcessingError {
    /// Whether the error only invalidates the raster or period being processed.
    ///
    /// Per-item failures are reported and the batch moves on to the next
    /// independent item; anything else aborts the run.
    pub fn is_fatal_per_item(&self) -> bool {
        matches!(
            self,
            ProcessingError::Tiff(_)
                | ProcessingError::Json(_)
                | ProcessingError::Parquet(_)
                | ProcessingError::Arrow(_)
                | ProcessingError::InvalidPalette(_)
                | ProcessingError::InvalidTransform(_)
                | ProcessingError::EmptyWindow(_)
                | ProcessingError::GridShapeMismatch(_)
                | ProcessingError::CoordinateMismatch(_)
                | ProcessingError::MissingData(_)
                | ProcessingError::InvalidFormat(_)
                | ProcessingError::Io(_)
        )
    }
}
