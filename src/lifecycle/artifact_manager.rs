use crate::error::Result;
use crate::models::{AccumulatedGrid, AccumulationPeriod, SourceArtifact};
use crate::utils::filename::{
    instant_grid_name, parse_daily_grid_name, parse_raw_raster_name, period_grid_name,
    period_provenance_name,
};
use crate::writers::{GridWriter, ProvenanceRecord, ProvenanceWriter};
use chrono::{NaiveDateTime, NaiveTime};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Directory of artifacts, named deterministically from period identity.
///
/// The presence of a period's grid file is the only record that the period
/// is done.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    data_dir: PathBuf,
    site: String,
}

impl ArtifactStore {
    pub fn new(data_dir: impl Into<PathBuf>, site: &str) -> Self {
        Self {
            data_dir: data_dir.into(),
            site: site.to_string(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn site(&self) -> &str {
        &self.site
    }

    pub fn grid_path(&self, period: &AccumulationPeriod) -> PathBuf {
        self.data_dir.join(period_grid_name(&self.site, period))
    }

    pub fn provenance_path(&self, period: &AccumulationPeriod) -> PathBuf {
        self.data_dir.join(period_provenance_name(&self.site, period))
    }

    pub fn instant_path(&self, timestamp: NaiveDateTime) -> PathBuf {
        self.data_dir.join(instant_grid_name(&self.site, timestamp))
    }

    pub fn is_done(&self, period: &AccumulationPeriod) -> bool {
        self.grid_path(period).is_file()
    }

    /// Raw rasters currently in the store, chronological
    pub fn list_raw_rasters(&self) -> Result<Vec<SourceArtifact>> {
        self.list_matching(|name| parse_raw_raster_name(&self.site, name))
    }

    /// Daily grids currently in the store, stamped at midnight of their day
    pub fn list_daily_grids(&self) -> Result<Vec<SourceArtifact>> {
        self.list_matching(|name| {
            parse_daily_grid_name(&self.site, name).map(|date| date.and_time(NaiveTime::MIN))
        })
    }

    fn list_matching<F>(&self, timestamp_of: F) -> Result<Vec<SourceArtifact>>
    where
        F: Fn(&str) -> Option<NaiveDateTime>,
    {
        let entries = match std::fs::read_dir(&self.data_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut artifacts = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            if let Some(timestamp) = name.to_str().and_then(&timestamp_of) {
                artifacts.push(SourceArtifact::new(timestamp, entry.path()));
            }
        }
        artifacts.sort();
        Ok(artifacts)
    }
}

/// What happens to a period's inputs once its outputs are durable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleasePolicy {
    DeleteSources,
    KeepSources,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReleaseOutcome {
    pub deleted: Vec<PathBuf>,
    pub already_absent: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

impl ReleaseOutcome {
    pub fn merge(&mut self, other: ReleaseOutcome) {
        self.deleted.extend(other.deleted);
        self.already_absent.extend(other.already_absent);
        self.failed.extend(other.failed);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommitOutcome {
    pub grid_path: PathBuf,
    pub provenance_written: bool,
    pub release: ReleaseOutcome,
}

/// Persists period outputs and then releases the consumed inputs.
pub struct ArtifactManager {
    store: ArtifactStore,
    grid_writer: GridWriter,
    provenance_writer: ProvenanceWriter,
}

impl ArtifactManager {
    pub fn new(store: ArtifactStore, grid_writer: GridWriter) -> Self {
        Self {
            store,
            grid_writer,
            provenance_writer: ProvenanceWriter::new(),
        }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn grid_writer(&self) -> &GridWriter {
        &self.grid_writer
    }

    /// Two-phase commit of one period.
    ///
    /// Phase one writes the grid (failure is returned) and the provenance
    /// record (failure is logged). Phase two, reached only when both files
    /// are durable, applies `policy` to `sources`.
    pub fn commit(
        &self,
        accumulated: &AccumulatedGrid,
        sources: &[SourceArtifact],
        policy: ReleasePolicy,
    ) -> Result<CommitOutcome> {
        let period = &accumulated.period;
        let grid_path = self.store.grid_path(period);
        self.grid_writer.write_accumulated(accumulated, &grid_path)?;
        info!(period = %period, path = %grid_path.display(), "wrote accumulated grid");

        let provenance_path = self.store.provenance_path(period);
        let record = ProvenanceRecord::from_accumulated(accumulated);
        let provenance_written = match self.provenance_writer.write(&record, &provenance_path) {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    period = %period,
                    error = %e,
                    "could not write provenance record, keeping sources"
                );
                false
            }
        };

        let release = if provenance_written && policy == ReleasePolicy::DeleteSources {
            let paths: Vec<PathBuf> = sources.iter().map(|s| s.path.clone()).collect();
            release(&paths)
        } else {
            ReleaseOutcome::default()
        };

        Ok(CommitOutcome {
            grid_path,
            provenance_written,
            release,
        })
    }

    /// Re-attempt deletion of the rasters recorded as consumed by finished
    /// days. Days without a readable provenance record are left alone, and
    /// recorded names that are not raw rasters of this site are skipped.
    pub fn reclaim_consumed_rasters(&self) -> Result<ReleaseOutcome> {
        let mut outcome = ReleaseOutcome::default();
        let rasters = self.store.list_raw_rasters()?;

        let mut days: Vec<AccumulationPeriod> = rasters
            .iter()
            .map(|r| AccumulationPeriod::Day(r.timestamp.date()))
            .collect();
        days.dedup();

        for day in days.into_iter().filter(|d| self.store.is_done(d)) {
            let record = match self.provenance_writer.read(&self.store.provenance_path(&day)) {
                Ok(record) => record,
                Err(e) => {
                    warn!(period = %day, error = %e, "no usable provenance, not reclaiming");
                    continue;
                }
            };
            let paths: Vec<PathBuf> = record
                .sources
                .iter()
                .filter(|name| {
                    let ours = parse_raw_raster_name(self.store.site(), name).is_some();
                    if !ours {
                        warn!(period = %day, source = %name, "ignoring foreign provenance entry");
                    }
                    ours
                })
                .map(|name| self.store.data_dir().join(name))
                .collect();
            outcome.merge(release(&paths));
        }

        Ok(outcome)
    }
}

/// Delete each path; a path that is already gone counts as released.
/// Failures are reported in the outcome, never raised.
pub fn release(paths: &[PathBuf]) -> ReleaseOutcome {
    let mut outcome = ReleaseOutcome::default();
    for path in paths {
        match std::fs::remove_file(path) {
            Ok(()) => {
                debug!(path = %path.display(), "deleted source");
                outcome.deleted.push(path.clone());
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                outcome.already_absent.push(path.clone());
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not delete source");
                outcome.failed.push((path.clone(), e.to_string()));
            }
        }
    }
    outcome
}
