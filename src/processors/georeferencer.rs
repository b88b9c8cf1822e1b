use crate::error::{ProcessingError, Result};
use crate::models::AffineTransform;
use crate::utils::constants::{DEFAULT_LAT_MAX, DEFAULT_LAT_MIN, DEFAULT_LON_MAX, DEFAULT_LON_MIN};
use crate::utils::coordinates::pixel_center;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use validator::{Validate, ValidationError};

/// Tolerance applied when a pixel centre falls on the ROI boundary
const EDGE_EPSILON: f64 = 1e-9;

/// Geographic bounding box to keep, inclusive on all edges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_ordered_bounds"))]
pub struct RegionOfInterest {
    #[validate(range(min = -180.0, max = 180.0))]
    pub lon_min: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub lon_max: f64,

    #[validate(range(min = -90.0, max = 90.0))]
    pub lat_min: f64,

    #[validate(range(min = -90.0, max = 90.0))]
    pub lat_max: f64,
}

fn validate_ordered_bounds(roi: &RegionOfInterest) -> std::result::Result<(), ValidationError> {
    if roi.lon_min >= roi.lon_max || roi.lat_min >= roi.lat_max {
        return Err(ValidationError::new("roi_bounds_not_ordered"));
    }
    Ok(())
}

impl Default for RegionOfInterest {
    fn default() -> Self {
        Self {
            lon_min: DEFAULT_LON_MIN,
            lon_max: DEFAULT_LON_MAX,
            lat_min: DEFAULT_LAT_MIN,
            lat_max: DEFAULT_LAT_MAX,
        }
    }
}

/// Pixel window covering a region of interest.
///
/// Row and column ranges are always sorted; `rows_descending` /
/// `cols_descending` record whether the raster stores latitude / longitude in
/// decreasing order, so callers can emit the window geographically ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipWindow {
    pub rows: RangeInclusive<usize>,
    pub cols: RangeInclusive<usize>,
    pub rows_descending: bool,
    pub cols_descending: bool,
    /// Pixel-centre latitudes, ascending
    pub lat: Vec<f64>,
    /// Pixel-centre longitudes, ascending
    pub lon: Vec<f64>,
}

impl ClipWindow {
    pub fn height(&self) -> usize {
        self.rows.end() - self.rows.start() + 1
    }

    pub fn width(&self) -> usize {
        self.cols.end() - self.cols.start() + 1
    }

    /// Source raster rows in ascending-latitude order
    pub fn row_indices(&self) -> Vec<usize> {
        let rows: Vec<usize> = self.rows.clone().collect();
        if self.rows_descending {
            rows.into_iter().rev().collect()
        } else {
            rows
        }
    }

    /// Source raster columns in ascending-longitude order
    pub fn col_indices(&self) -> Vec<usize> {
        let cols: Vec<usize> = self.cols.clone().collect();
        if self.cols_descending {
            cols.into_iter().rev().collect()
        } else {
            cols
        }
    }
}

pub struct Georeferencer {
    roi: RegionOfInterest,
}

impl Georeferencer {
    pub fn new(roi: RegionOfInterest) -> Self {
        Self { roi }
    }

    pub fn roi(&self) -> &RegionOfInterest {
        &self.roi
    }

    /// Compute the window of a `width` x `height` raster whose pixel centres
    /// fall inside the region of interest.
    pub fn clip(
        &self,
        transform: &AffineTransform,
        width: usize,
        height: usize,
    ) -> Result<ClipWindow> {
        if !transform.is_rectilinear() {
            return Err(ProcessingError::InvalidTransform(
                "Rotated or sheared rasters are not supported".to_string(),
            ));
        }
        if transform.is_degenerate() {
            return Err(ProcessingError::InvalidTransform(format!(
                "Degenerate pixel size ({}, {})",
                transform.a, transform.e
            )));
        }

        let cols = axis_window(
            transform.c,
            transform.a,
            width,
            self.roi.lon_min,
            self.roi.lon_max,
        )
        .ok_or_else(|| {
            ProcessingError::EmptyWindow(format!(
                "no column centre within lon [{}, {}]",
                self.roi.lon_min, self.roi.lon_max
            ))
        })?;
        let rows = axis_window(
            transform.f,
            transform.e,
            height,
            self.roi.lat_min,
            self.roi.lat_max,
        )
        .ok_or_else(|| {
            ProcessingError::EmptyWindow(format!(
                "no row centre within lat [{}, {}]",
                self.roi.lat_min, self.roi.lat_max
            ))
        })?;

        let rows_descending = transform.e < 0.0;
        let cols_descending = transform.a < 0.0;

        let mut window = ClipWindow {
            rows,
            cols,
            rows_descending,
            cols_descending,
            lat: Vec::new(),
            lon: Vec::new(),
        };
        window.lat = window
            .row_indices()
            .into_iter()
            .map(|r| pixel_center(transform.f, transform.e, r))
            .collect();
        window.lon = window
            .col_indices()
            .into_iter()
            .map(|c| pixel_center(transform.c, transform.a, c))
            .collect();

        if window.lat.len() != window.height() || window.lon.len() != window.width() {
            return Err(ProcessingError::GridShapeMismatch(format!(
                "{} latitudes for {} rows, {} longitudes for {} cols",
                window.lat.len(),
                window.height(),
                window.lon.len(),
                window.width()
            )));
        }

        Ok(window)
    }
}

/// Sorted index range along one axis whose pixel centres lie in [lo, hi]
fn axis_window(
    origin: f64,
    step: f64,
    count: usize,
    lo: f64,
    hi: f64,
) -> Option<RangeInclusive<usize>> {
    if count == 0 {
        return None;
    }
    // centre(i) = origin + step * (i + 0.5)
    let i_lo = (lo - origin) / step - 0.5;
    let i_hi = (hi - origin) / step - 0.5;
    let (first, last) = if i_lo <= i_hi { (i_lo, i_hi) } else { (i_hi, i_lo) };

    let start = (first - EDGE_EPSILON).ceil().max(0.0);
    let end = (last + EDGE_EPSILON).floor().min((count - 1) as f64);
    if start > end {
        return None;
    }
    Some(start as usize..=end as usize)
}
