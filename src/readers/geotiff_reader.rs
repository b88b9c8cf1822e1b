use crate::error::{ProcessingError, Result};
use crate::models::{AffineTransform, RgbRaster};
use crate::utils::constants::{
    DEFAULT_LEGEND_KEY, TAG_GDAL_METADATA, TAG_MODEL_PIXEL_SCALE, TAG_MODEL_TIEPOINT,
    TAG_MODEL_TRANSFORMATION,
};
use memmap2::Mmap;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;
use tiff::ColorType;

/// Reads 8-bit RGB(A) GeoTIFF radar snapshots.
pub struct GeoTiffReader {
    legend_key: String,
    use_mmap: bool,
}

impl GeoTiffReader {
    pub fn new() -> Self {
        Self {
            legend_key: DEFAULT_LEGEND_KEY.to_string(),
            use_mmap: true,
        }
    }

    pub fn with_legend_key(mut self, key: &str) -> Self {
        self.legend_key = key.to_string();
        self
    }

    pub fn with_mmap(mut self, use_mmap: bool) -> Self {
        self.use_mmap = use_mmap;
        self
    }

    pub fn read(&self, path: &Path) -> Result<RgbRaster> {
        let file = File::open(path)?;
        if self.use_mmap {
            // SAFETY: the artifact store is owned by a single pipeline run,
            // nothing truncates the file while it is mapped.
            let mmap = unsafe { Mmap::map(&file)? };
            self.decode(Cursor::new(&mmap[..]))
        } else {
            self.decode(BufReader::new(file))
        }
    }

    fn decode<R: Read + Seek>(&self, reader: R) -> Result<RgbRaster> {
        let mut decoder = Decoder::new(reader)?;
        let (width, height) = decoder.dimensions()?;

        let channels = match decoder.colortype()? {
            ColorType::RGB(8) => 3,
            ColorType::RGBA(8) => 4,
            other => {
                return Err(ProcessingError::InvalidFormat(format!(
                    "Unsupported colour type {:?}, expected 8-bit RGB or RGBA",
                    other
                )))
            }
        };

        let transform = read_transform(&mut decoder)?;
        let legend = match read_ascii_tag(&mut decoder, TAG_GDAL_METADATA)? {
            Some(xml) => extract_gdal_item(&xml, &self.legend_key),
            None => None,
        };

        let data = match decoder.read_image()? {
            DecodingResult::U8(data) => data,
            _ => {
                return Err(ProcessingError::InvalidFormat(
                    "Expected 8-bit samples".to_string(),
                ))
            }
        };
        let pixels: Vec<[u8; 3]> = data
            .chunks_exact(channels)
            .map(|p| [p[0], p[1], p[2]])
            .collect();

        RgbRaster::new(width as usize, height as usize, pixels, transform, legend)
    }
}

impl Default for GeoTiffReader {
    fn default() -> Self {
        Self::new()
    }
}

fn read_f64_tag<R: Read + Seek>(decoder: &mut Decoder<R>, code: u16) -> Result<Option<Vec<f64>>> {
    Ok(decoder
        .find_tag(Tag::from_u16_exhaustive(code))?
        .map(|value| value.into_f64_vec())
        .transpose()?)
}

fn read_ascii_tag<R: Read + Seek>(decoder: &mut Decoder<R>, code: u16) -> Result<Option<String>> {
    Ok(decoder
        .find_tag(Tag::from_u16_exhaustive(code))?
        .map(|value| value.into_string())
        .transpose()?)
}

fn read_transform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<AffineTransform> {
    if let Some(matrix) = read_f64_tag(decoder, TAG_MODEL_TRANSFORMATION)? {
        return AffineTransform::from_model_transformation(&matrix);
    }

    let scale = read_f64_tag(decoder, TAG_MODEL_PIXEL_SCALE)?;
    let tiepoint = read_f64_tag(decoder, TAG_MODEL_TIEPOINT)?;
    match (scale, tiepoint) {
        (Some(scale), Some(tiepoint)) => AffineTransform::from_tiepoint(&scale, &tiepoint),
        _ => Err(ProcessingError::InvalidTransform(
            "Raster has no georeferencing tags".to_string(),
        )),
    }
}

/// Content of `<Item name="key">...</Item>` in a GDAL metadata document
pub fn extract_gdal_item(xml: &str, key: &str) -> Option<String> {
    let mut rest = xml;
    while let Some(start) = rest.find("<Item") {
        rest = &rest[start..];
        let open_end = rest.find('>')?;
        let open_tag = &rest[..open_end];
        let body = &rest[open_end + 1..];
        let close = body.find("</Item>")?;

        let name_matches = open_tag.contains(&format!("name=\"{}\"", key))
            || open_tag.contains(&format!("name='{}'", key));
        if name_matches {
            return Some(unescape_xml(&body[..close]));
        }
        rest = &body[close..];
    }
    None
}

fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_gdal_item() {
        let xml = "<GDALMetadata>\n  \
            <Item name=\"AREA_OR_POINT\">Area</Item>\n  \
            <Item name=\"ESCALA\">{&apos;Lista RGBA&apos;: []}</Item>\n\
            </GDALMetadata>";

        assert_eq!(
            extract_gdal_item(xml, "ESCALA"),
            Some("{'Lista RGBA': []}".to_string())
        );
        assert_eq!(extract_gdal_item(xml, "AREA_OR_POINT"), Some("Area".to_string()));
        assert_eq!(extract_gdal_item(xml, "MISSING"), None);
    }

    #[test]
    fn test_unescape_order() {
        assert_eq!(unescape_xml("&amp;lt; &quot;a&quot;"), "&lt; \"a\"");
    }

    #[test]
    fn test_missing_file() {
        let result = GeoTiffReader::new().read(Path::new("/nonexistent/raster.tif"));
        assert!(matches!(result, Err(ProcessingError::Io(_))));
    }
}
