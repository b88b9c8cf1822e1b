use crate::error::{ProcessingError, Result};

/// Geographic coordinate of the centre of pixel `index` along one axis.
///
/// # Examples
/// ```
/// use radar_accumulator::utils::pixel_center;
///
/// assert!((pixel_center(0.0, 0.5, 2) - 1.25).abs() < 1e-12);
/// assert!((pixel_center(44.0, -0.5, 0) - 43.75).abs() < 1e-12);
/// ```
pub fn pixel_center(origin: f64, step: f64, index: usize) -> f64 {
    origin + step * (index as f64 + 0.5)
}

/// True when every element is strictly greater than the previous one
pub fn is_strictly_ascending(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[1] > w[0])
}

/// Validate a latitude in decimal degrees
pub fn validate_latitude(latitude: f64) -> Result<()> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(ProcessingError::InvalidFormat(format!(
            "Latitude {} is outside [-90, 90]",
            latitude
        )));
    }
    Ok(())
}

/// Validate a longitude in decimal degrees
pub fn validate_longitude(longitude: f64) -> Result<()> {
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(ProcessingError::InvalidFormat(format!(
            "Longitude {} is outside [-180, 180]",
            longitude
        )));
    }
    Ok(())
}
