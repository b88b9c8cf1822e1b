use crate::error::{ProcessingError, Result};
use crate::models::Palette;
use crate::utils::constants::{
    DEFAULT_NO_DATA_MAX_BLUE, DEFAULT_NO_DATA_MIN_GREEN, DEFAULT_NO_DATA_MIN_RED,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Distance used to pick the closest legend colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMetric {
    #[default]
    Euclidean,
    Manhattan,
}

impl ColorMetric {
    /// Monotonic stand-in for the metric (squared distance for Euclidean)
    fn distance(&self, a: [u8; 3], b: [u8; 3]) -> u32 {
        let deltas = [
            (a[0] as i32 - b[0] as i32).unsigned_abs(),
            (a[1] as i32 - b[1] as i32).unsigned_abs(),
            (a[2] as i32 - b[2] as i32).unsigned_abs(),
        ];
        match self {
            ColorMetric::Euclidean => deltas.iter().map(|d| d * d).sum(),
            ColorMetric::Manhattan => deltas.iter().sum(),
        }
    }
}

/// Yellow hue band the radar uses for "no data"; always decoded as missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoDataBand {
    pub min_red: u8,
    pub min_green: u8,
    pub max_blue: u8,
}

impl Default for NoDataBand {
    fn default() -> Self {
        Self {
            min_red: DEFAULT_NO_DATA_MIN_RED,
            min_green: DEFAULT_NO_DATA_MIN_GREEN,
            max_blue: DEFAULT_NO_DATA_MAX_BLUE,
        }
    }
}

impl NoDataBand {
    pub fn contains(&self, color: [u8; 3]) -> bool {
        color[0] >= self.min_red && color[1] >= self.min_green && color[2] <= self.max_blue
    }
}

/// Turns RGB pixels into physical values using a raster's legend.
pub struct PaletteDecoder {
    metric: ColorMetric,
    no_data: NoDataBand,
    pool: Option<rayon::ThreadPool>,
}

impl PaletteDecoder {
    pub fn new() -> Self {
        Self {
            metric: ColorMetric::default(),
            no_data: NoDataBand::default(),
            pool: None,
        }
    }

    pub fn with_metric(mut self, metric: ColorMetric) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_no_data_band(mut self, band: NoDataBand) -> Self {
        self.no_data = band;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .map_err(|e| ProcessingError::Config(e.to_string()))?;
        self.pool = Some(pool);
        Ok(self)
    }

    pub fn no_data_band(&self) -> &NoDataBand {
        &self.no_data
    }

    /// Index of the closest legend entry; the first one wins ties
    pub fn nearest_index(&self, palette: &Palette, color: [u8; 3]) -> usize {
        let mut best = 0;
        let mut best_distance = u32::MAX;
        for (i, entry) in palette.entries().iter().enumerate() {
            let distance = self.metric.distance(color, entry.color);
            if distance < best_distance {
                best = i;
                best_distance = distance;
            }
        }
        best
    }

    /// Value of a single colour, NaN inside the no-data band
    pub fn classify_color(&self, palette: &Palette, color: [u8; 3]) -> f64 {
        let value = palette.entries()[self.nearest_index(palette, color)].value;
        if self.no_data.contains(color) {
            f64::NAN
        } else {
            value
        }
    }

    /// Classify a whole pixel population.
    ///
    /// Distinct colours are resolved once each, in parallel, and pixels are
    /// then mapped through the resolved table.
    pub fn classify(&self, palette: &Palette, pixels: &[[u8; 3]]) -> Vec<f64> {
        let mut distinct: HashMap<[u8; 3], usize> = HashMap::new();
        let mut colors: Vec<[u8; 3]> = Vec::new();
        let indices: Vec<usize> = pixels
            .iter()
            .map(|color| {
                *distinct.entry(*color).or_insert_with(|| {
                    colors.push(*color);
                    colors.len() - 1
                })
            })
            .collect();

        let resolve = || -> Vec<f64> {
            colors
                .par_iter()
                .map(|color| self.classify_color(palette, *color))
                .collect()
        };
        let table = match &self.pool {
            Some(pool) => pool.install(resolve),
            None => resolve(),
        };

        tracing::trace!(
            pixels = pixels.len(),
            distinct = colors.len(),
            "classified pixel population"
        );

        indices.into_iter().map(|i| table[i]).collect()
    }
}

impl Default for PaletteDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PaletteEntry;

    fn palette() -> Palette {
        Palette::new(vec![
            PaletteEntry::new([0, 0, 255], 0.5),
            PaletteEntry::new([0, 255, 0], 3.0),
            PaletteEntry::new([255, 0, 0], 50.0),
            PaletteEntry::new([255, 255, 0], 999.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_exact_colors_map_to_their_value() {
        let decoder = PaletteDecoder::new();
        let values = decoder.classify(&palette(), &[[0, 0, 255], [0, 255, 0], [255, 0, 0]]);
        assert_eq!(values, vec![0.5, 3.0, 50.0]);
    }

    #[test]
    fn test_nearest_color() {
        let decoder = PaletteDecoder::new();
        assert_eq!(decoder.classify_color(&palette(), [10, 20, 240]), 0.5);
        assert_eq!(decoder.classify_color(&palette(), [30, 200, 40]), 3.0);
    }

    #[test]
    fn test_no_data_band_overrides_classification() {
        let decoder = PaletteDecoder::new();
        // Exactly the yellow legend entry, still forced to missing
        assert!(decoder.classify_color(&palette(), [255, 255, 0]).is_nan());
        assert!(decoder.classify_color(&palette(), [200, 180, 50]).is_nan());
        // Just outside the band
        assert_eq!(decoder.classify_color(&palette(), [255, 0, 0]), 50.0);
        assert!(!decoder.classify_color(&palette(), [200, 180, 51]).is_nan());
    }

    #[test]
    fn test_configurable_band() {
        let decoder = PaletteDecoder::new().with_no_data_band(NoDataBand {
            min_red: 250,
            min_green: 250,
            max_blue: 10,
        });
        assert!(!decoder.classify_color(&palette(), [200, 180, 50]).is_nan());
        assert!(decoder.classify_color(&palette(), [255, 255, 0]).is_nan());
    }

    #[test]
    fn test_ties_go_to_first_entry() {
        let palette = Palette::new(vec![
            PaletteEntry::new([0, 0, 0], 1.0),
            PaletteEntry::new([20, 0, 0], 2.0),
            PaletteEntry::new([0, 0, 0], 3.0),
        ])
        .unwrap();
        let decoder = PaletteDecoder::new();

        assert_eq!(decoder.nearest_index(&palette, [10, 0, 0]), 0);
        assert_eq!(decoder.nearest_index(&palette, [0, 0, 0]), 0);
        assert_eq!(decoder.classify_color(&palette, [11, 0, 0]), 2.0);
    }

    #[test]
    fn test_metrics_can_disagree() {
        let palette = Palette::new(vec![
            PaletteEntry::new([0, 0, 0], 1.0),
            PaletteEntry::new([12, 12, 0], 2.0),
        ])
        .unwrap();
        let color = [20, 0, 0];

        // Euclidean: 400 vs 64+144=208, Manhattan: 20 vs 8+12=20 (tie)
        let euclidean = PaletteDecoder::new().with_metric(ColorMetric::Euclidean);
        let manhattan = PaletteDecoder::new().with_metric(ColorMetric::Manhattan);
        assert_eq!(euclidean.classify_color(&palette, color), 2.0);
        assert_eq!(manhattan.classify_color(&palette, color), 1.0);
    }

    #[test]
    fn test_bulk_matches_per_pixel() {
        let decoder = PaletteDecoder::new().with_workers(2).unwrap();
        let pixels: Vec<[u8; 3]> = (0..=255u8)
            .step_by(5)
            .flat_map(|r| [[r, 0, 255 - r], [r, r, 0], [0, r, r]])
            .collect();

        let bulk = decoder.classify(&palette(), &pixels);
        for (pixel, value) in pixels.iter().zip(bulk) {
            let single = decoder.classify_color(&palette(), *pixel);
            assert!(value == single || (value.is_nan() && single.is_nan()));
        }
    }
}
