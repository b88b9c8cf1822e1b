use crate::lifecycle::{CommitOutcome, ReleaseOutcome};
use crate::models::AccumulationPeriod;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub struct IncompletePeriod {
    pub period: AccumulationPeriod,
    pub present: usize,
    pub required: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PeriodFailure {
    pub period: AccumulationPeriod,
    pub details: String,
}

/// Outcome of one pipeline invocation over one or both tiers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub produced: Vec<AccumulationPeriod>,
    pub already_done: usize,
    pub incomplete: Vec<IncompletePeriod>,
    pub failures: Vec<PeriodFailure>,
    pub duplicate_sources: Vec<PathBuf>,
    pub provenance_failures: Vec<AccumulationPeriod>,
    pub release: ReleaseOutcome,
    pub weekly_gated: bool,
}

impl RunReport {
    pub fn record_commit(&mut self, period: AccumulationPeriod, outcome: CommitOutcome) {
        self.produced.push(period);
        if !outcome.provenance_written {
            self.provenance_failures.push(period);
        }
        self.release.merge(outcome.release);
    }

    pub fn merge(&mut self, other: RunReport) {
        self.produced.extend(other.produced);
        self.already_done += other.already_done;
        self.incomplete.extend(other.incomplete);
        self.failures.extend(other.failures);
        self.duplicate_sources.extend(other.duplicate_sources);
        self.provenance_failures.extend(other.provenance_failures);
        self.release.merge(other.release);
        self.weekly_gated |= other.weekly_gated;
    }

    /// True when nothing failed, including non-fatal deletion and
    /// provenance problems
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.provenance_failures.is_empty() && self.release.failed.is_empty()
    }

    pub fn generate_summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str("=== Accumulation Run Report ===\n");
        summary.push_str(&format!("Periods produced: {}\n", self.produced.len()));
        for period in &self.produced {
            summary.push_str(&format!("  + {}\n", period));
        }
        summary.push_str(&format!("Already done: {}\n", self.already_done));
        summary.push_str(&format!("Waiting for inputs: {}\n", self.incomplete.len()));
        for pending in self.incomplete.iter().take(10) {
            summary.push_str(&format!(
                "  . {} ({}/{} inputs)\n",
                pending.period, pending.present, pending.required
            ));
        }
        if self.weekly_gated {
            summary.push_str("Weekly tier: not scheduled for today\n");
        }

        summary.push_str(&format!(
            "Sources deleted: {} (already absent: {})\n",
            self.release.deleted.len(),
            self.release.already_absent.len()
        ));

        if !self.failures.is_empty() {
            summary.push_str(&format!("\nFailed periods: {}\n", self.failures.len()));
            for (i, failure) in self.failures.iter().take(10).enumerate() {
                summary.push_str(&format!("  {}. {}: {}\n", i + 1, failure.period, failure.details));
            }
        }
        if !self.provenance_failures.is_empty() {
            summary.push_str(&format!(
                "\nProvenance records not written: {}\n",
                self.provenance_failures.len()
            ));
        }
        if !self.release.failed.is_empty() {
            summary.push_str(&format!("\nDeletion failures: {}\n", self.release.failed.len()));
            for (path, error) in self.release.failed.iter().take(10) {
                summary.push_str(&format!("  - {}: {}\n", path.display(), error));
            }
        }
        if !self.duplicate_sources.is_empty() {
            summary.push_str(&format!(
                "\nIgnored duplicate sources: {}\n",
                self.duplicate_sources.len()
            ));
        }

        summary
    }
}
