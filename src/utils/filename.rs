use crate::models::AccumulationPeriod;
use crate::utils::constants::{
    GRID_EXTENSION, PRODUCT_DAILY, PRODUCT_SIX_HOUR, PRODUCT_WEEKLY, PROVENANCE_EXTENSION,
    RASTER_EXTENSION,
};
use chrono::{NaiveDate, NaiveDateTime};

/// Raw raster name: {SITE}_RNN6H_{YYYYMMDD}_{HHMM}.tif
pub fn raw_raster_name(site: &str, timestamp: NaiveDateTime) -> String {
    format!(
        "{}_{}_{}.{}",
        site,
        PRODUCT_SIX_HOUR,
        timestamp.format("%Y%m%d_%H%M"),
        RASTER_EXTENSION
    )
}

/// Instant grid name: {SITE}_RNN6H_{YYYYMMDD}_{HHMM}.parquet
pub fn instant_grid_name(site: &str, timestamp: NaiveDateTime) -> String {
    format!(
        "{}_{}_{}.{}",
        site,
        PRODUCT_SIX_HOUR,
        timestamp.format("%Y%m%d_%H%M"),
        GRID_EXTENSION
    )
}

/// Extract the timestamp from a raw raster name, `None` for foreign files
pub fn parse_raw_raster_name(site: &str, file_name: &str) -> Option<NaiveDateTime> {
    let stem = file_name.strip_suffix(&format!(".{}", RASTER_EXTENSION))?;
    let stamp = stem.strip_prefix(&format!("{}_{}_", site, PRODUCT_SIX_HOUR))?;
    // chrono accepts unpadded fields, only the canonical YYYYMMDD_HHMM form is ours
    let canonical = stamp.len() == 13
        && stamp.bytes().enumerate().all(|(i, b)| match i {
            8 => b == b'_',
            _ => b.is_ascii_digit(),
        });
    if !canonical {
        return None;
    }
    NaiveDateTime::parse_from_str(stamp, "%Y%m%d_%H%M").ok()
}

/// Stem shared by a period's grid and provenance files.
///
/// Daily periods are named by their calendar day, weekly periods by their
/// (inclusive) ending day.
pub fn period_stem(site: &str, period: &AccumulationPeriod) -> String {
    match period {
        AccumulationPeriod::Day(date) => {
            format!("{}_{}_{}", site, PRODUCT_DAILY, date.format("%Y%m%d"))
        }
        AccumulationPeriod::Week { ending } => {
            format!("{}_{}_{}", site, PRODUCT_WEEKLY, ending.format("%Y%m%d"))
        }
    }
}

pub fn period_grid_name(site: &str, period: &AccumulationPeriod) -> String {
    format!("{}.{}", period_stem(site, period), GRID_EXTENSION)
}

pub fn period_provenance_name(site: &str, period: &AccumulationPeriod) -> String {
    format!("{}.{}", period_stem(site, period), PROVENANCE_EXTENSION)
}

/// Extract the day from a daily grid artifact name
pub fn parse_daily_grid_name(site: &str, file_name: &str) -> Option<NaiveDate> {
    let stem = file_name.strip_suffix(&format!(".{}", GRID_EXTENSION))?;
    let stamp = stem.strip_prefix(&format!("{}_{}_", site, PRODUCT_DAILY))?;
    if stamp.len() != 8 {
        return None;
    }
    NaiveDate::parse_from_str(stamp, "%Y%m%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_raw_raster_name_round_trip() {
        let name = raw_raster_name("GLD", ts(2026, 2, 13, 12));
        assert_eq!(name, "GLD_RNN6H_20260213_1200.tif");
        assert_eq!(parse_raw_raster_name("GLD", &name), Some(ts(2026, 2, 13, 12)));
    }

    #[test]
    fn test_foreign_files_are_ignored() {
        assert_eq!(parse_raw_raster_name("GLD", "GLD_RNN6H_20260213_1200.nc"), None);
        assert_eq!(parse_raw_raster_name("GLD", "MAD_RNN6H_20260213_1200.tif"), None);
        assert_eq!(parse_raw_raster_name("GLD", "GLD_RNN6H_2026021_1200.tif"), None);
        assert_eq!(parse_raw_raster_name("GLD", "GLD_RNN6H_20260213_600.tif"), None);
        assert_eq!(parse_raw_raster_name("GLD", "GLD_RNN6H_2026+213_0600.tif"), None);
        assert_eq!(parse_raw_raster_name("GLD", "GLD_RNN6H_../20213_0600.tif"), None);
        assert_eq!(parse_daily_grid_name("GLD", "GLD_RNN7D_20260215.parquet"), None);
    }

    #[test]
    fn test_period_names_are_deterministic() {
        let day = AccumulationPeriod::Day(NaiveDate::from_ymd_opt(2026, 2, 13).unwrap());
        let week = AccumulationPeriod::Week {
            ending: NaiveDate::from_ymd_opt(2026, 2, 15).unwrap(),
        };

        assert_eq!(period_grid_name("GLD", &day), "GLD_RNN24H_20260213.parquet");
        assert_eq!(period_provenance_name("GLD", &day), "GLD_RNN24H_20260213.txt");
        assert_eq!(period_grid_name("GLD", &week), "GLD_RNN7D_20260215.parquet");
        assert_eq!(
            parse_daily_grid_name("GLD", "GLD_RNN24H_20260213.parquet"),
            NaiveDate::from_ymd_opt(2026, 2, 13)
        );
    }
}
