use crate::error::{ProcessingError, Result};
use crate::lifecycle::{
    ArtifactManager, ArtifactStore, CommitOutcome, ReleaseOutcome, ReleasePolicy,
};
use crate::models::{GeoGrid, Instant, PeriodTier, SourceArtifact};
use crate::processors::instant_builder::InstantBuilder;
use crate::processors::palette_decoder::PaletteDecoder;
use crate::processors::run_report::{IncompletePeriod, PeriodFailure, RunReport};
use crate::processors::temporal_aggregator::{PeriodPlan, PeriodState, TemporalAggregator};
use crate::readers::{GeoTiffReader, GridReader};
use crate::settings::PipelineConfig;
use crate::utils::filename::parse_raw_raster_name;
use crate::utils::progress::ProgressReporter;
use crate::writers::GridWriter;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use validator::Validate;

/// Drives the daily and weekly tiers over one artifact store.
///
/// Every invocation recomputes its work from the files present: a period
/// whose grid exists is skipped, a period missing inputs waits, and every
/// other period is produced, committed and has its inputs released.
pub struct Pipeline {
    config: PipelineConfig,
    reader: GeoTiffReader,
    grid_reader: GridReader,
    builder: InstantBuilder,
    manager: ArtifactManager,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;

        let decoder = PaletteDecoder::new()
            .with_metric(config.color_metric)
            .with_no_data_band(config.no_data)
            .with_workers(config.workers)?;
        let grid_writer = GridWriter::new().with_compression(&config.compression)?;
        let store = ArtifactStore::new(config.data_dir.clone(), &config.site);

        Ok(Self {
            reader: GeoTiffReader::new().with_legend_key(&config.legend_key),
            grid_reader: GridReader::new(),
            builder: InstantBuilder::new(decoder, config.roi),
            manager: ArtifactManager::new(store, grid_writer),
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn store(&self) -> &ArtifactStore {
        self.manager.store()
    }

    /// Daily tier, then weekly tier, so a day finished in this run can
    /// complete its week in the same run.
    pub fn run(&self, today: NaiveDate, progress: Option<&ProgressReporter>) -> Result<RunReport> {
        let mut report = self.run_daily(progress)?;
        report.merge(self.run_weekly(today, progress)?);
        Ok(report)
    }

    pub fn run_daily(&self, progress: Option<&ProgressReporter>) -> Result<RunReport> {
        let sources = self.store().list_raw_rasters()?;
        info!(rasters = sources.len(), "evaluating daily tier");

        let policy = if self.config.delete_sources {
            ReleasePolicy::DeleteSources
        } else {
            ReleasePolicy::KeepSources
        };
        let aggregator = TemporalAggregator::new(PeriodTier::Daily);
        self.execute(&aggregator, &sources, policy, progress, |source| {
            self.load_instant(source).map(|instant| instant.grid)
        })
    }

    pub fn run_weekly(&self, today: NaiveDate, progress: Option<&ProgressReporter>) -> Result<RunReport> {
        if let Some(gate) = self.config.weekly_gate {
            if today.weekday() != gate {
                info!(today = %today, gate = ?gate, "weekly tier not scheduled today");
                return Ok(RunReport {
                    weekly_gated: true,
                    ..Default::default()
                });
            }
        }

        let sources = self.store().list_daily_grids()?;
        info!(days = sources.len(), "evaluating weekly tier");

        let aggregator = TemporalAggregator::new(PeriodTier::Weekly {
            week_end: self.config.week_end,
        });
        let expected = aggregator.tier().input_variable();
        self.execute(&aggregator, &sources, ReleasePolicy::KeepSources, progress, |source| {
            let file = self.grid_reader.read(source.path())?;
            if file.variable != expected {
                return Err(ProcessingError::InvalidFormat(format!(
                    "{} holds '{}', expected '{}'",
                    source.name(),
                    file.variable,
                    expected
                )));
            }
            Ok(file.grid)
        })
    }

    fn execute<F>(
        &self,
        aggregator: &TemporalAggregator,
        sources: &[SourceArtifact],
        policy: ReleasePolicy,
        progress: Option<&ProgressReporter>,
        load: F,
    ) -> Result<RunReport>
    where
        F: Fn(&SourceArtifact) -> Result<GeoGrid>,
    {
        let store = self.store();
        let plans = aggregator.plan(sources, |period| store.is_done(period));
        let ready = plans.iter().filter(|p| p.is_ready()).count();
        if let Some(p) = progress {
            p.set_length(ready as u64);
            p.set_message(&format!("Accumulating {} periods", aggregator.tier().name()));
        }

        let mut report = RunReport::default();
        for plan in plans {
            match plan.state {
                PeriodState::Done => {
                    debug!(period = %plan.period, "already done");
                    report.already_done += 1;
                }
                PeriodState::Incomplete { present, required } => {
                    debug!(period = %plan.period, present, required, "waiting for inputs");
                    report.incomplete.push(IncompletePeriod {
                        period: plan.period,
                        present,
                        required,
                    });
                }
                PeriodState::Ready => {
                    for duplicate in &plan.duplicates {
                        warn!(
                            period = %plan.period,
                            path = %duplicate.path.display(),
                            "ignoring duplicate source for an occupied slot"
                        );
                        report.duplicate_sources.push(duplicate.path.clone());
                    }

                    match self.produce(aggregator, &plan, policy, &load) {
                        Ok(outcome) => report.record_commit(plan.period, outcome),
                        Err(e) if e.is_fatal_per_item() => {
                            error!(period = %plan.period, error = %e, "period failed, inputs kept");
                            report.failures.push(PeriodFailure {
                                period: plan.period,
                                details: e.to_string(),
                            });
                        }
                        Err(e) => return Err(e),
                    }

                    if let Some(p) = progress {
                        p.increment(1);
                    }
                }
            }
        }

        Ok(report)
    }

    fn produce<F>(
        &self,
        aggregator: &TemporalAggregator,
        plan: &PeriodPlan,
        policy: ReleasePolicy,
        load: &F,
    ) -> Result<CommitOutcome>
    where
        F: Fn(&SourceArtifact) -> Result<GeoGrid>,
    {
        let inputs = plan
            .sources
            .iter()
            .map(|source| Ok((source.name(), load(source)?)))
            .collect::<Result<Vec<_>>>()?;

        let accumulated = aggregator.accumulate(plan.period, &inputs)?;
        self.manager.commit(&accumulated, &plan.sources, policy)
    }

    fn load_instant(&self, source: &SourceArtifact) -> Result<Instant> {
        let raster = self.reader.read(source.path())?;
        self.builder.build(&raster, source.timestamp, &source.name())
    }

    /// Convert one raster into a standalone instant grid.
    ///
    /// The timestamp comes from `timestamp` when given, otherwise from the
    /// raster's file name. Without `output` the grid lands in the store
    /// under its conventional name.
    pub fn convert(
        &self,
        input: &Path,
        timestamp: Option<NaiveDateTime>,
        output: Option<&Path>,
    ) -> Result<PathBuf> {
        let name = input
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let timestamp = timestamp
            .or_else(|| parse_raw_raster_name(&self.config.site, &name))
            .ok_or_else(|| {
                ProcessingError::MissingData(format!(
                    "No timestamp given and none in file name '{}'",
                    name
                ))
            })?;

        let raster = self.reader.read(input)?;
        let instant = self.builder.build(&raster, timestamp, &name)?;

        let path = match output {
            Some(path) => path.to_path_buf(),
            None => self.store().instant_path(timestamp),
        };
        self.manager.grid_writer().write_instant(&instant, &path)?;
        info!(source = %name, path = %path.display(), "wrote instant grid");
        Ok(path)
    }

    /// Delete raw rasters already recorded as consumed by finished days
    pub fn cleanup(&self) -> Result<ReleaseOutcome> {
        self.manager.reclaim_consumed_rasters()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AccumulationPeriod;
    use crate::utils::filename::period_grid_name;
    use chrono::Weekday;
    use tempfile::TempDir;

    fn config(dir: &Path) -> PipelineConfig {
        PipelineConfig {
            data_dir: dir.to_path_buf(),
            workers: 2,
            ..Default::default()
        }
    }

    fn write_daily(dir: &Path, date: NaiveDate, value: f64) {
        let grid = GeoGrid::new(vec![40.0, 41.0], vec![0.0, 1.0], vec![value; 4]).unwrap();
        let accumulated = crate::models::AccumulatedGrid {
            period: AccumulationPeriod::Day(date),
            sources: vec![],
            grid,
        };
        let path = dir.join(period_grid_name("GLD", &accumulated.period));
        GridWriter::new().write_accumulated(&accumulated, &path).unwrap();
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, d).unwrap()
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = PipelineConfig {
            workers: 0,
            ..Default::default()
        };
        assert!(Pipeline::new(config).is_err());
    }

    #[test]
    fn test_weekly_from_daily_grids() -> Result<()> {
        let dir = TempDir::new()?;
        for d in 9..=15 {
            write_daily(dir.path(), date(d), 10.0);
        }
        let pipeline = Pipeline::new(config(dir.path()))?;
        let progress = ProgressReporter::new(0, "Accumulating...", false);

        let report = pipeline.run_weekly(date(16), Some(&progress))?;
        let week = AccumulationPeriod::Week { ending: date(15) };
        assert_eq!(report.produced, vec![week]);
        assert_eq!(progress.length(), Some(1));
        assert_eq!(progress.position(), Some(1));

        let loaded = GridReader::new().read(&pipeline.store().grid_path(&week))?;
        assert!(loaded.grid.values().iter().all(|v| *v == 70.0));

        // Daily grids are never deleted
        assert_eq!(pipeline.store().list_daily_grids()?.len(), 7);

        let again = pipeline.run_weekly(date(16), None)?;
        assert!(again.produced.is_empty());
        assert_eq!(again.already_done, 1);
        Ok(())
    }

    #[test]
    fn test_weekly_waits_for_missing_day() -> Result<()> {
        let dir = TempDir::new()?;
        for d in (9..=15).filter(|d| *d != 12) {
            write_daily(dir.path(), date(d), 1.0);
        }
        let pipeline = Pipeline::new(config(dir.path()))?;

        let report = pipeline.run_weekly(date(16), None)?;
        assert!(report.produced.is_empty());
        assert_eq!(report.incomplete.len(), 1);
        assert_eq!(report.incomplete[0].present, 6);
        Ok(())
    }

    #[test]
    fn test_weekly_gate() -> Result<()> {
        let dir = TempDir::new()?;
        for d in 9..=15 {
            write_daily(dir.path(), date(d), 1.0);
        }
        let pipeline = Pipeline::new(PipelineConfig {
            weekly_gate: Some(Weekday::Mon),
            ..config(dir.path())
        })?;

        // 2026-02-17 is a Tuesday
        let gated = pipeline.run_weekly(date(17), None)?;
        assert!(gated.weekly_gated);
        assert!(gated.produced.is_empty());

        let open = pipeline.run_weekly(date(16), None)?;
        assert!(!open.weekly_gated);
        assert_eq!(open.produced.len(), 1);
        Ok(())
    }

    #[test]
    fn test_empty_store_is_a_no_op() -> Result<()> {
        let dir = TempDir::new()?;
        let pipeline = Pipeline::new(config(&dir.path().join("missing")))?;
        let report = pipeline.run(date(16), None)?;
        assert_eq!(report, RunReport::default());
        Ok(())
    }

    #[test]
    fn test_convert_needs_a_timestamp() -> Result<()> {
        let dir = TempDir::new()?;
        let pipeline = Pipeline::new(config(dir.path()))?;
        let result = pipeline.convert(&dir.path().join("snapshot.tif"), None, None);
        assert!(matches!(result, Err(ProcessingError::MissingData(_))));
        Ok(())
    }
}
