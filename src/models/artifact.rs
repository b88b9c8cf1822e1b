use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};

/// A persisted input to an accumulation tier: a raw raster for the daily
/// tier, a daily grid for the weekly tier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceArtifact {
    pub timestamp: NaiveDateTime,
    pub path: PathBuf,
}

impl SourceArtifact {
    pub fn new(timestamp: NaiveDateTime, path: PathBuf) -> Self {
        Self { timestamp, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}
