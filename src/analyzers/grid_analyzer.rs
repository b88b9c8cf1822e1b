use crate::error::Result;
use crate::readers::{GridFile, GridReader};
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct PrecipitationStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub total: f64,
    pub max_location: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridCoverage {
    pub total_cells: usize,
    pub valid_cells: usize,
    pub dry_cells: usize,
}

impl GridCoverage {
    pub fn valid_percentage(&self) -> f64 {
        (self.valid_cells as f64 / self.total_cells as f64) * 100.0
    }

    pub fn dry_percentage(&self) -> f64 {
        if self.valid_cells == 0 {
            return 0.0;
        }
        (self.dry_cells as f64 / self.valid_cells as f64) * 100.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeographicBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridStatistics {
    pub variable: String,
    pub period: Option<String>,
    pub rows: usize,
    pub cols: usize,
    pub bounds: GeographicBounds,
    pub coverage: GridCoverage,
    /// `None` when every cell is no-data
    pub precipitation: Option<PrecipitationStats>,
}

pub struct GridAnalyzer;

impl GridAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze_file(&self, path: &Path) -> Result<GridStatistics> {
        let file = GridReader::new().read(path)?;
        Ok(self.calculate_statistics(&file))
    }

    pub fn calculate_statistics(&self, file: &GridFile) -> GridStatistics {
        let grid = &file.grid;
        let cols = grid.cols();

        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut total = 0.0;
        let mut valid = 0;
        let mut dry = 0;
        let mut max_location = String::new();

        for (i, &value) in grid.values().iter().enumerate() {
            if value.is_nan() {
                continue;
            }
            valid += 1;
            total += value;
            if value == 0.0 {
                dry += 1;
            }
            if value < min {
                min = value;
            }
            if value > max {
                max = value;
                max_location = format!("{:.3}N {:.3}E", grid.lat()[i / cols], grid.lon()[i % cols]);
            }
        }

        let precipitation = (valid > 0).then(|| PrecipitationStats {
            min,
            max,
            mean: total / valid as f64,
            total,
            max_location,
        });

        GridStatistics {
            variable: file.variable.clone(),
            period: file.period.clone(),
            rows: grid.rows(),
            cols,
            bounds: GeographicBounds {
                min_lat: grid.lat()[0],
                max_lat: grid.lat()[grid.rows() - 1],
                min_lon: grid.lon()[0],
                max_lon: grid.lon()[cols - 1],
            },
            coverage: GridCoverage {
                total_cells: grid.values().len(),
                valid_cells: valid,
                dry_cells: dry,
            },
            precipitation,
        }
    }
}

impl Default for GridAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl GridStatistics {
    pub fn summary(&self) -> String {
        format!(
            "Variable: {}\n\
            Period: {}\n\
            Grid: {} x {} cells (lat x lon)\n\
            Coverage: {:.3}N-{:.3}N, {:.3}E-{:.3}E\n\
            Valid cells: {}/{} ({:.1}%)",
            self.variable,
            self.period.as_deref().unwrap_or("unknown"),
            self.rows,
            self.cols,
            self.bounds.min_lat,
            self.bounds.max_lat,
            self.bounds.min_lon,
            self.bounds.max_lon,
            self.coverage.valid_cells,
            self.coverage.total_cells,
            self.coverage.valid_percentage()
        )
    }

    pub fn detailed_summary(&self) -> String {
        let precipitation = match &self.precipitation {
            Some(stats) => format!(
                "- Minimum: {:.2} mm\n\
                - Maximum: {:.2} mm at {}\n\
                - Mean: {:.2} mm\n\
                - Total: {:.2} mm\n\
                - Dry cells: {} ({:.1}% of valid)",
                stats.min,
                stats.max,
                stats.max_location,
                stats.mean,
                stats.total,
                self.coverage.dry_cells,
                self.coverage.dry_percentage()
            ),
            None => "- No valid measurements".to_string(),
        };

        format!("{}\n\nPrecipitation:\n{}", self.summary(), precipitation)
    }
}
