use crate::error::Result;
use crate::processors::georeferencer::RegionOfInterest;
use crate::processors::palette_decoder::{ColorMetric, NoDataBand};
use crate::utils::constants::{DEFAULT_COMPRESSION, DEFAULT_LEGEND_KEY, DEFAULT_SITE};
use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use validator::Validate;

/// Environment variable prefix, e.g. `RADAR_DATA_DIR`, `RADAR_ROI__LAT_MIN`
pub const ENV_PREFIX: &str = "RADAR";

/// Settings for one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PipelineConfig {
    /// Directory holding raw rasters and every produced artifact
    pub data_dir: PathBuf,

    /// Radar site prefix in file names
    #[validate(length(min = 1))]
    pub site: String,

    #[validate(nested)]
    pub roi: RegionOfInterest,

    pub no_data: NoDataBand,

    pub color_metric: ColorMetric,

    /// GDAL metadata item holding the colour legend
    #[validate(length(min = 1))]
    pub legend_key: String,

    pub compression: String,

    /// Last day of an accumulation week
    pub week_end: Weekday,

    /// When set, the weekly tier is only evaluated on runs made on this weekday
    pub weekly_gate: Option<Weekday>,

    /// Delete raw rasters once their day is durably written
    pub delete_sources: bool,

    #[validate(range(min = 1, max = 1024))]
    pub workers: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            site: DEFAULT_SITE.to_string(),
            roi: RegionOfInterest::default(),
            no_data: NoDataBand::default(),
            color_metric: ColorMetric::default(),
            legend_key: DEFAULT_LEGEND_KEY.to_string(),
            compression: DEFAULT_COMPRESSION.to_string(),
            week_end: Weekday::Sun,
            weekly_gate: None,
            delete_sources: true,
            workers: num_cpus::get(),
        }
    }
}

impl PipelineConfig {
    /// Layer defaults, an optional TOML file and `RADAR_*` environment
    /// variables, then validate.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Self::default())?);

        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: PipelineConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}
