use crate::error::{ProcessingError, Result};
use crate::models::AccumulatedGrid;
use crate::writers::durable::write_durably;
use std::io::Write;
use std::path::Path;

/// Human-readable record of which sources went into a period's total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvenanceRecord {
    pub period: String,
    pub tier: String,
    pub variable: String,
    /// Source file names, chronological
    pub sources: Vec<String>,
}

impl ProvenanceRecord {
    pub fn from_accumulated(accumulated: &AccumulatedGrid) -> Self {
        Self {
            period: accumulated.period.label(),
            tier: accumulated.period.tier().name().to_string(),
            variable: accumulated.variable().to_string(),
            sources: accumulated.sources.clone(),
        }
    }

    pub fn render(&self) -> String {
        let mut text = String::new();
        text.push_str(&format!("period: {}\n", self.period));
        text.push_str(&format!("tier: {}\n", self.tier));
        text.push_str(&format!("variable: {}\n", self.variable));
        text.push_str(&format!("sources: {}\n", self.sources.len()));
        for source in &self.sources {
            text.push_str(source);
            text.push('\n');
        }
        text
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = text.lines();
        let mut header = |key: &str| -> Result<String> {
            lines
                .next()
                .and_then(|line| line.strip_prefix(&format!("{}: ", key)))
                .map(str::to_string)
                .ok_or_else(|| {
                    ProcessingError::InvalidFormat(format!("provenance record lacks '{}'", key))
                })
        };

        let period = header("period")?;
        let tier = header("tier")?;
        let variable = header("variable")?;
        let count: usize = header("sources")?.parse().map_err(|_| {
            ProcessingError::InvalidFormat("provenance source count is not a number".to_string())
        })?;

        let sources: Vec<String> = lines.map(str::to_string).collect();
        if sources.len() != count {
            return Err(ProcessingError::InvalidFormat(format!(
                "provenance declares {} sources, lists {}",
                count,
                sources.len()
            )));
        }

        Ok(Self {
            period,
            tier,
            variable,
            sources,
        })
    }
}

pub struct ProvenanceWriter;

impl ProvenanceWriter {
    pub fn new() -> Self {
        Self
    }

    pub fn write(&self, record: &ProvenanceRecord, path: &Path) -> Result<()> {
        let text = record.render();
        write_durably(path, |mut file| {
            file.write_all(text.as_bytes())?;
            Ok(file)
        })
    }

    pub fn read(&self, path: &Path) -> Result<ProvenanceRecord> {
        ProvenanceRecord::parse(&std::fs::read_to_string(path)?)
    }
}

impl Default for ProvenanceWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccumulationPeriod, GeoGrid};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn accumulated() -> AccumulatedGrid {
        AccumulatedGrid {
            period: AccumulationPeriod::Day(NaiveDate::from_ymd_opt(2026, 2, 13).unwrap()),
            sources: vec![
                "GLD_RNN6H_20260213_0000.tif".to_string(),
                "GLD_RNN6H_20260213_0600.tif".to_string(),
                "GLD_RNN6H_20260213_1200.tif".to_string(),
                "GLD_RNN6H_20260213_1800.tif".to_string(),
            ],
            grid: GeoGrid::new(vec![40.0], vec![0.0], vec![1.0]).unwrap(),
        }
    }

    #[test]
    fn test_render() {
        let record = ProvenanceRecord::from_accumulated(&accumulated());
        assert_eq!(
            record.render(),
            "period: 2026-02-13\n\
             tier: daily\n\
             variable: precipitation_mm_24h\n\
             sources: 4\n\
             GLD_RNN6H_20260213_0000.tif\n\
             GLD_RNN6H_20260213_0600.tif\n\
             GLD_RNN6H_20260213_1200.tif\n\
             GLD_RNN6H_20260213_1800.tif\n"
        );
    }

    #[test]
    fn test_write_and_read() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("GLD_RNN24H_20260213.txt");
        let record = ProvenanceRecord::from_accumulated(&accumulated());

        let writer = ProvenanceWriter::new();
        writer.write(&record, &path)?;
        assert_eq!(writer.read(&path)?, record);
        Ok(())
    }

    #[test]
    fn test_parse_rejects_truncated_record() {
        assert!(ProvenanceRecord::parse("period: x\ntier: daily\n").is_err());
        assert!(ProvenanceRecord::parse("period: x\ntier: daily\nvariable: v\nsources: 2\na\n").is_err());
    }
}
