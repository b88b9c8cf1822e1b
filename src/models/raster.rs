use crate::error::{ProcessingError, Result};

/// Pixel to geographic mapping, in the GDAL/rasterio coefficient order:
///
/// `x = a * col + b * row + c`, `y = d * col + e * row + f`
/// where (col, row) address the pixel's upper-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl AffineTransform {
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// North-up transform from an origin corner and pixel size
    pub fn from_origin(west: f64, north: f64, x_size: f64, y_size: f64) -> Self {
        Self::new(x_size, 0.0, west, 0.0, -y_size, north)
    }

    /// Transform from GeoTIFF `ModelPixelScale` and `ModelTiepoint` tags
    pub fn from_tiepoint(scale: &[f64], tiepoint: &[f64]) -> Result<Self> {
        if scale.len() < 2 || tiepoint.len() < 6 {
            return Err(ProcessingError::InvalidTransform(format!(
                "Expected at least 2 pixel scale and 6 tiepoint values, got {} and {}",
                scale.len(),
                tiepoint.len()
            )));
        }
        let (i, j, x, y) = (tiepoint[0], tiepoint[1], tiepoint[3], tiepoint[4]);
        let (sx, sy) = (scale[0], scale[1]);
        Ok(Self::new(sx, 0.0, x - i * sx, 0.0, -sy, y + j * sy))
    }

    /// Transform from a 4x4 GeoTIFF `ModelTransformation` matrix
    pub fn from_model_transformation(matrix: &[f64]) -> Result<Self> {
        if matrix.len() != 16 {
            return Err(ProcessingError::InvalidTransform(format!(
                "Model transformation has {} values, expected 16",
                matrix.len()
            )));
        }
        Ok(Self::new(
            matrix[0], matrix[1], matrix[3], matrix[4], matrix[5], matrix[7],
        ))
    }

    pub fn is_rectilinear(&self) -> bool {
        self.b == 0.0 && self.d == 0.0
    }

    pub fn is_degenerate(&self) -> bool {
        self.a == 0.0 || self.e == 0.0 || !self.a.is_finite() || !self.e.is_finite()
    }
}

/// Decoded raster: RGB pixels in row-major order plus the metadata needed to
/// interpret them.
#[derive(Debug, Clone, PartialEq)]
pub struct RgbRaster {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<[u8; 3]>,
    pub transform: AffineTransform,
    /// Raw colour legend text, if the raster carries one
    pub legend: Option<String>,
}

impl RgbRaster {
    pub fn new(
        width: usize,
        height: usize,
        pixels: Vec<[u8; 3]>,
        transform: AffineTransform,
        legend: Option<String>,
    ) -> Result<Self> {
        if width * height != pixels.len() {
            return Err(ProcessingError::GridShapeMismatch(format!(
                "{}x{} raster with {} pixels",
                width,
                height,
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
            transform,
            legend,
        })
    }

    pub fn pixel(&self, row: usize, col: usize) -> [u8; 3] {
        self.pixels[row * self.width + col]
    }
}
