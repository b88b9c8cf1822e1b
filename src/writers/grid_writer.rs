use crate::error::{ProcessingError, Result};
use crate::models::{AccumulatedGrid, GeoGrid, Instant};
use crate::utils::constants::{
    COLUMN_LAT, COLUMN_LON, COMPRESSION_GZIP, COMPRESSION_LZ4, COMPRESSION_NONE,
    COMPRESSION_SNAPPY, COMPRESSION_ZSTD, DEFAULT_ROW_GROUP_SIZE, META_COLS, META_PERIOD,
    META_ROWS, META_UNITS, META_VARIABLE, UNITS_MM, VAR_INSTANT,
};
use crate::writers::durable::write_durably;
use arrow::array::Float64Array;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use parquet::file::metadata::KeyValue;
use parquet::file::properties::WriterProperties;
use std::path::Path;
use std::sync::Arc;

/// Writes lat/lon grids as long-form Parquet: one row per cell, row-major,
/// with the grid shape in the file's key/value metadata.
pub struct GridWriter {
    compression: Compression,
    row_group_size: usize,
}

impl GridWriter {
    pub fn new() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
        }
    }

    pub fn with_compression(mut self, compression: &str) -> Result<Self> {
        self.compression = match compression.to_lowercase().as_str() {
            COMPRESSION_SNAPPY => Compression::SNAPPY,
            COMPRESSION_GZIP => Compression::GZIP(GzipLevel::default()),
            COMPRESSION_LZ4 => Compression::LZ4,
            COMPRESSION_ZSTD => Compression::ZSTD(ZstdLevel::default()),
            COMPRESSION_NONE => Compression::UNCOMPRESSED,
            _ => {
                return Err(ProcessingError::Config(format!(
                    "Unsupported compression: {}",
                    compression
                )))
            }
        };
        Ok(self)
    }

    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size;
        self
    }

    pub fn write_instant(&self, instant: &Instant, path: &Path) -> Result<()> {
        let label = instant.timestamp.format("%Y-%m-%d %H:%M").to_string();
        self.write_grid(&instant.grid, VAR_INSTANT, Some(&label), path)
    }

    pub fn write_accumulated(&self, accumulated: &AccumulatedGrid, path: &Path) -> Result<()> {
        let label = accumulated.period.label();
        self.write_grid(&accumulated.grid, accumulated.variable(), Some(&label), path)
    }

    /// Durably write `grid` with its values stored under `variable`
    pub fn write_grid(
        &self,
        grid: &GeoGrid,
        variable: &str,
        period: Option<&str>,
        path: &Path,
    ) -> Result<()> {
        let schema = Self::create_schema(variable);
        let batch = Self::grid_to_batch(grid, schema.clone())?;

        let mut metadata = vec![
            KeyValue::new(META_VARIABLE.to_string(), variable.to_string()),
            KeyValue::new(META_ROWS.to_string(), grid.rows().to_string()),
            KeyValue::new(META_COLS.to_string(), grid.cols().to_string()),
            KeyValue::new(META_UNITS.to_string(), UNITS_MM.to_string()),
        ];
        if let Some(period) = period {
            metadata.push(KeyValue::new(META_PERIOD.to_string(), period.to_string()));
        }

        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .set_key_value_metadata(Some(metadata))
            .build();

        write_durably(path, |file| {
            let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;
            writer.write(&batch)?;
            Ok(writer.into_inner()?)
        })
    }

    fn create_schema(variable: &str) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new(COLUMN_LAT, DataType::Float64, false),
            Field::new(COLUMN_LON, DataType::Float64, false),
            Field::new(variable, DataType::Float64, true),
        ]))
    }

    fn grid_to_batch(grid: &GeoGrid, schema: Arc<Schema>) -> Result<RecordBatch> {
        let cols = grid.cols();
        let cells = grid.values().len();

        let lat: Vec<f64> = (0..cells).map(|i| grid.lat()[i / cols]).collect();
        let lon: Vec<f64> = (0..cells).map(|i| grid.lon()[i % cols]).collect();
        let values: Vec<Option<f64>> = grid
            .values()
            .iter()
            .map(|v| if v.is_nan() { None } else { Some(*v) })
            .collect();

        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Float64Array::from(lat)),
                Arc::new(Float64Array::from(lon)),
                Arc::new(Float64Array::from(values)),
            ],
        )?;
        Ok(batch)
    }

    /// Get file statistics
    pub fn get_file_info(&self, path: &Path) -> Result<GridFileInfo> {
        use parquet::file::reader::{FileReader, SerializedFileReader};
        use std::fs::File;

        let file = File::open(path)?;
        let reader = SerializedFileReader::new(file)?;
        let metadata = reader.metadata();

        let total_rows = metadata.file_metadata().num_rows();
        let row_groups = metadata.num_row_groups();
        let file_size = std::fs::metadata(path)?.len();
        let compression = if row_groups > 0 && metadata.row_group(0).num_columns() > 0 {
            Some(metadata.row_group(0).column(0).compression())
        } else {
            None
        };

        Ok(GridFileInfo {
            total_rows,
            row_groups: row_groups as i32,
            file_size,
            compression,
        })
    }
}

impl Default for GridWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct GridFileInfo {
    pub total_rows: i64,
    pub row_groups: i32,
    pub file_size: u64,
    pub compression: Option<Compression>,
}

impl GridFileInfo {
    pub fn summary(&self) -> String {
        format!(
            "Parquet File Summary:\n\
            - Total cells: {}\n\
            - Row groups: {}\n\
            - File size: {:.2} KB\n\
            - Compression: {}",
            self.total_rows,
            self.row_groups,
            self.file_size as f64 / 1024.0,
            self.compression
                .map(|c| format!("{:?}", c))
                .unwrap_or_else(|| "n/a".to_string()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AccumulationPeriod;
    use crate::readers::GridReader;
    use crate::utils::constants::VAR_DAILY;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn sample_grid() -> GeoGrid {
        GeoGrid::new(
            vec![40.25, 40.75],
            vec![0.25, 0.75, 1.25],
            vec![1.5, f64::NAN, 0.0, 12.0, 3.25, f64::NAN],
        )
        .unwrap()
    }

    #[test]
    fn test_written_grid_reads_back() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("GLD_RNN24H_20260213.parquet");
        let accumulated = AccumulatedGrid {
            period: AccumulationPeriod::Day(NaiveDate::from_ymd_opt(2026, 2, 13).unwrap()),
            sources: vec![],
            grid: sample_grid(),
        };

        GridWriter::new().write_accumulated(&accumulated, &path)?;
        let loaded = GridReader::new().read(&path)?;

        assert_eq!(loaded.variable, VAR_DAILY);
        assert_eq!(loaded.period.as_deref(), Some("2026-02-13"));
        assert_eq!(loaded.grid.lat(), sample_grid().lat());
        assert_eq!(loaded.grid.lon(), sample_grid().lon());
        assert_eq!(loaded.grid.get(1, 1), Some(3.25));
        assert!(loaded.grid.get(0, 1).unwrap().is_nan());
        assert_eq!(loaded.grid.get(0, 2), Some(0.0));
        assert_eq!(loaded.grid.valid_cells(), 4);
        Ok(())
    }

    #[test]
    fn test_rewrite_is_byte_identical() -> Result<()> {
        let dir = TempDir::new()?;
        let a = dir.path().join("a.parquet");
        let b = dir.path().join("b.parquet");
        let writer = GridWriter::new();

        writer.write_grid(&sample_grid(), VAR_INSTANT, None, &a)?;
        writer.write_grid(&sample_grid(), VAR_INSTANT, None, &b)?;

        assert_eq!(std::fs::read(&a)?, std::fs::read(&b)?);
        Ok(())
    }

    #[test]
    fn test_file_info() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("grid.parquet");
        let writer = GridWriter::new().with_compression("zstd")?;
        writer.write_grid(&sample_grid(), VAR_INSTANT, None, &path)?;

        let info = writer.get_file_info(&path)?;
        assert_eq!(info.total_rows, 6);
        assert_eq!(info.row_groups, 1);
        assert!(info.summary().contains("Total cells: 6"));
        Ok(())
    }

    #[test]
    fn test_different_compressions() -> Result<()> {
        for compression in ["snappy", "gzip", "lz4", "zstd", "none"] {
            let dir = TempDir::new()?;
            let path = dir.path().join("grid.parquet");
            let writer = GridWriter::new().with_compression(compression)?;
            let result = writer.write_grid(&sample_grid(), VAR_INSTANT, None, &path);
            assert!(result.is_ok(), "Failed with compression: {}", compression);
        }
        assert!(GridWriter::new().with_compression("brotli9000").is_err());
        Ok(())
    }
}
