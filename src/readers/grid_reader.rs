use crate::error::{ProcessingError, Result};
use crate::models::GeoGrid;
use crate::utils::constants::{COLUMN_LAT, COLUMN_LON, META_COLS, META_PERIOD, META_ROWS, META_VARIABLE};
use crate::utils::coordinates::{validate_latitude, validate_longitude};
use arrow::array::{Array, Float64Array};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

/// A grid artifact loaded back from disk.
#[derive(Debug, Clone)]
pub struct GridFile {
    pub variable: String,
    pub period: Option<String>,
    pub grid: GeoGrid,
}

/// Reads grid artifacts written by [`crate::writers::GridWriter`].
pub struct GridReader {
    batch_size: usize,
}

impl GridReader {
    pub fn new() -> Self {
        Self { batch_size: 8192 }
    }

    pub fn read(&self, path: &Path) -> Result<GridFile> {
        let file = File::open(path)?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;

        let metadata: HashMap<String, String> = builder
            .metadata()
            .file_metadata()
            .key_value_metadata()
            .map(|kvs| {
                kvs.iter()
                    .filter_map(|kv| kv.value.clone().map(|v| (kv.key.clone(), v)))
                    .collect()
            })
            .unwrap_or_default();

        let variable = required_key(&metadata, META_VARIABLE, path)?.to_string();
        let rows = parse_dimension(&metadata, META_ROWS, path)?;
        let cols = parse_dimension(&metadata, META_COLS, path)?;
        let period = metadata.get(META_PERIOD).cloned();

        // the declared shape must match the stored row count before anything is allocated
        let stored = builder.metadata().file_metadata().num_rows();
        let cells = rows
            .checked_mul(cols)
            .filter(|&cells| i64::try_from(cells).ok() == Some(stored))
            .ok_or_else(|| {
                ProcessingError::GridShapeMismatch(format!(
                    "{}: {} stored cells for declared {}x{} grid",
                    path.display(),
                    stored,
                    rows,
                    cols
                ))
            })?;

        let reader = builder.with_batch_size(self.batch_size).build()?;

        let mut lat_cells = Vec::with_capacity(cells);
        let mut lon_cells = Vec::with_capacity(cells);
        let mut values = Vec::with_capacity(cells);

        for batch in reader {
            let batch = batch?;
            let lat = float_column(&batch, COLUMN_LAT)?;
            let lon = float_column(&batch, COLUMN_LON)?;
            let value = float_column(&batch, &variable)?;

            lat_cells.extend(lat.values().iter().copied());
            lon_cells.extend(lon.values().iter().copied());
            values.extend((0..value.len()).map(|i| {
                if value.is_null(i) {
                    f64::NAN
                } else {
                    value.value(i)
                }
            }));
        }

        if values.len() != cells {
            return Err(ProcessingError::GridShapeMismatch(format!(
                "{}: {} cells for declared {}x{} grid",
                path.display(),
                values.len(),
                rows,
                cols
            )));
        }

        let lat: Vec<f64> = (0..rows).map(|r| lat_cells[r * cols]).collect();
        let lon: Vec<f64> = lon_cells[..cols].to_vec();

        let consistent = lat_cells
            .iter()
            .zip(&lon_cells)
            .enumerate()
            .all(|(i, (la, lo))| *la == lat[i / cols] && *lo == lon[i % cols]);
        if !consistent {
            return Err(ProcessingError::GridShapeMismatch(format!(
                "{}: cells are not laid out row-major on a rectilinear grid",
                path.display()
            )));
        }

        for latitude in [lat[0], lat[rows - 1]] {
            validate_latitude(latitude)?;
        }
        for longitude in [lon[0], lon[cols - 1]] {
            validate_longitude(longitude)?;
        }

        Ok(GridFile {
            variable,
            period,
            grid: GeoGrid::new(lat, lon, values)?,
        })
    }
}

impl Default for GridReader {
    fn default() -> Self {
        Self::new()
    }
}

fn required_key<'a>(metadata: &'a HashMap<String, String>, key: &str, path: &Path) -> Result<&'a str> {
    metadata.get(key).map(String::as_str).ok_or_else(|| {
        ProcessingError::MissingData(format!("{}: no '{}' metadata", path.display(), key))
    })
}

fn parse_dimension(metadata: &HashMap<String, String>, key: &str, path: &Path) -> Result<usize> {
    let raw = required_key(metadata, key, path)?;
    match raw.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ProcessingError::InvalidFormat(format!(
            "{}: invalid '{}' value '{}'",
            path.display(),
            key,
            raw
        ))),
    }
}

fn float_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Float64Array> {
    batch
        .column_by_name(name)
        .ok_or_else(|| ProcessingError::MissingData(format!("column '{}'", name)))?
        .as_any()
        .downcast_ref::<Float64Array>()
        .ok_or_else(|| ProcessingError::InvalidFormat(format!("column '{}' is not Float64", name)))
}
