use crate::error::{ProcessingError, Result};
use crate::models::AccumulationPeriod;
use crate::utils::coordinates::is_strictly_ascending;
use chrono::NaiveDateTime;

/// A 2-D field of physical values over a rectilinear lat/lon grid.
///
/// Values are stored row-major, one row per latitude. Both coordinate
/// arrays are strictly ascending and NaN marks a missing cell.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoGrid {
    lat: Vec<f64>,
    lon: Vec<f64>,
    values: Vec<f64>,
}

impl GeoGrid {
    pub fn new(lat: Vec<f64>, lon: Vec<f64>, values: Vec<f64>) -> Result<Self> {
        if lat.is_empty() || lon.is_empty() {
            return Err(ProcessingError::GridShapeMismatch(
                "Grid must have at least one row and one column".to_string(),
            ));
        }
        if lat.len() * lon.len() != values.len() {
            return Err(ProcessingError::GridShapeMismatch(format!(
                "{} lat x {} lon coordinates for {} values",
                lat.len(),
                lon.len(),
                values.len()
            )));
        }
        if !is_strictly_ascending(&lat) {
            return Err(ProcessingError::GridShapeMismatch(
                "Latitude coordinates are not strictly ascending".to_string(),
            ));
        }
        if !is_strictly_ascending(&lon) {
            return Err(ProcessingError::GridShapeMismatch(
                "Longitude coordinates are not strictly ascending".to_string(),
            ));
        }

        Ok(Self { lat, lon, values })
    }

    pub fn lat(&self) -> &[f64] {
        &self.lat
    }

    pub fn lon(&self) -> &[f64] {
        &self.lon
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn rows(&self) -> usize {
        self.lat.len()
    }

    pub fn cols(&self) -> usize {
        self.lon.len()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.rows() && col < self.cols() {
            Some(self.values[row * self.cols() + col])
        } else {
            None
        }
    }

    pub fn valid_cells(&self) -> usize {
        self.values.iter().filter(|v| !v.is_nan()).count()
    }

    /// Fail unless `other` lies on exactly the same coordinates
    pub fn ensure_same_coordinates(&self, other: &GeoGrid) -> Result<()> {
        if self.lat != other.lat {
            return Err(ProcessingError::CoordinateMismatch(format!(
                "latitude arrays differ ({} vs {} rows)",
                self.rows(),
                other.rows()
            )));
        }
        if self.lon != other.lon {
            return Err(ProcessingError::CoordinateMismatch(format!(
                "longitude arrays differ ({} vs {} cols)",
                self.cols(),
                other.cols()
            )));
        }
        Ok(())
    }
}

/// One decoded radar snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Instant {
    pub timestamp: NaiveDateTime,
    pub source: String,
    pub grid: GeoGrid,
}

impl Instant {
    pub fn new(timestamp: NaiveDateTime, source: String, grid: GeoGrid) -> Self {
        Self {
            timestamp,
            source,
            grid,
        }
    }
}

/// The reduction of one accumulation period.
#[derive(Debug, Clone, PartialEq)]
pub struct AccumulatedGrid {
    pub period: AccumulationPeriod,
    /// Contributing source names, chronological
    pub sources: Vec<String>,
    pub grid: GeoGrid,
}

impl AccumulatedGrid {
    pub fn variable(&self) -> &'static str {
        self.period.tier().variable()
    }
}
