use crate::error::{ProcessingError, Result};
use crate::models::{GeoGrid, Instant, Palette, RgbRaster};
use crate::processors::georeferencer::{ClipWindow, Georeferencer, RegionOfInterest};
use crate::processors::palette_decoder::PaletteDecoder;
use chrono::NaiveDateTime;

/// Turns one decoded raster into one georeferenced instant.
///
/// Pure transform: clip to the region of interest, classify the clipped
/// pixels through the raster's own legend and attach coordinates.
pub struct InstantBuilder {
    decoder: PaletteDecoder,
    georeferencer: Georeferencer,
}

impl InstantBuilder {
    pub fn new(decoder: PaletteDecoder, roi: RegionOfInterest) -> Self {
        Self {
            decoder,
            georeferencer: Georeferencer::new(roi),
        }
    }

    pub fn build(
        &self,
        raster: &RgbRaster,
        timestamp: NaiveDateTime,
        source: &str,
    ) -> Result<Instant> {
        let legend = raster.legend.as_deref().ok_or_else(|| {
            ProcessingError::InvalidPalette(format!("{} carries no colour legend", source))
        })?;
        let palette = Palette::from_legend(legend)?;
        self.build_with_palette(raster, &palette, timestamp, source)
    }

    pub fn build_with_palette(
        &self,
        raster: &RgbRaster,
        palette: &Palette,
        timestamp: NaiveDateTime,
        source: &str,
    ) -> Result<Instant> {
        let window = self
            .georeferencer
            .clip(&raster.transform, raster.width, raster.height)?;
        let pixels = clipped_pixels(raster, &window);
        let values = self.decoder.classify(palette, &pixels);
        let grid = GeoGrid::new(window.lat, window.lon, values)?;

        tracing::debug!(
            source,
            rows = grid.rows(),
            cols = grid.cols(),
            valid = grid.valid_cells(),
            "built instant"
        );

        Ok(Instant::new(timestamp, source.to_string(), grid))
    }
}

/// Window pixels, row-major with latitude and longitude ascending
fn clipped_pixels(raster: &RgbRaster, window: &ClipWindow) -> Vec<[u8; 3]> {
    let cols = window.col_indices();
    window
        .row_indices()
        .into_iter()
        .flat_map(|row| cols.iter().map(move |&col| raster.pixel(row, col)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AffineTransform;
    use chrono::NaiveDate;

    const LEGEND: &str = "{'Lista RGBA': [\
        {'RGBA': [0, 0, 255, 255], 'Valores': ['1', '3']}, \
        {'RGBA': [0, 255, 0, 255], 'Valores': ['10', '']}]}";

    const BLUE: [u8; 3] = [0, 0, 255];
    const GREEN: [u8; 3] = [0, 255, 0];
    const YELLOW: [u8; 3] = [255, 255, 0];

    fn roi() -> RegionOfInterest {
        RegionOfInterest {
            lon_min: 0.0,
            lon_max: 2.0,
            lat_min: 40.0,
            lat_max: 42.0,
        }
    }

    fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 2, 13)
            .unwrap()
            .and_hms_opt(6, 0, 0)
            .unwrap()
    }

    /// 2x2 north-up raster: north row [BLUE, GREEN], south row [YELLOW, BLUE]
    fn north_up() -> RgbRaster {
        RgbRaster::new(
            2,
            2,
            vec![BLUE, GREEN, YELLOW, BLUE],
            AffineTransform::from_origin(0.0, 42.0, 1.0, 1.0),
            Some(LEGEND.to_string()),
        )
        .unwrap()
    }

    #[test]
    fn test_build_instant() {
        let builder = InstantBuilder::new(PaletteDecoder::new(), roi());
        let instant = builder.build(&north_up(), timestamp(), "a.tif").unwrap();

        assert_eq!(instant.timestamp, timestamp());
        assert_eq!(instant.source, "a.tif");
        assert_eq!(instant.grid.lat(), &[40.5, 41.5]);
        assert_eq!(instant.grid.lon(), &[0.5, 1.5]);
        // south row first
        assert!(instant.grid.get(0, 0).unwrap().is_nan());
        assert_eq!(instant.grid.get(0, 1), Some(2.0));
        assert_eq!(instant.grid.get(1, 0), Some(2.0));
        assert_eq!(instant.grid.get(1, 1), Some(10.0));
    }

    #[test]
    fn test_flipped_raster_gives_same_instant() {
        let south_up = RgbRaster::new(
            2,
            2,
            vec![YELLOW, BLUE, BLUE, GREEN],
            AffineTransform::new(1.0, 0.0, 0.0, 0.0, 1.0, 40.0),
            Some(LEGEND.to_string()),
        )
        .unwrap();
        let builder = InstantBuilder::new(PaletteDecoder::new(), roi());

        let a = builder.build(&north_up(), timestamp(), "a.tif").unwrap();
        let b = builder.build(&south_up, timestamp(), "a.tif").unwrap();

        assert_eq!(a.grid.lat(), b.grid.lat());
        assert_eq!(a.grid.lon(), b.grid.lon());
        for (x, y) in a.grid.values().iter().zip(b.grid.values()) {
            assert!(x == y || (x.is_nan() && y.is_nan()));
        }
    }

    #[test]
    fn test_missing_legend_is_fatal() {
        let mut raster = north_up();
        raster.legend = None;
        let builder = InstantBuilder::new(PaletteDecoder::new(), roi());
        assert!(matches!(
            builder.build(&raster, timestamp(), "a.tif"),
            Err(ProcessingError::InvalidPalette(_))
        ));

        raster.legend = Some("{'Lista RGBA': ".to_string());
        assert!(builder.build(&raster, timestamp(), "a.tif").is_err());
    }
}
