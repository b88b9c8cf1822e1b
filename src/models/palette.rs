use crate::error::{ProcessingError, Result};
use crate::utils::constants::LEGEND_ENTRIES_KEY;
use serde::Deserialize;

/// One legend class: a representative colour and the value it stands for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaletteEntry {
    pub color: [u8; 3],
    pub value: f64,
}

impl PaletteEntry {
    pub fn new(color: [u8; 3], value: f64) -> Self {
        Self { color, value }
    }
}

/// Ordered colour legend embedded in a radar raster.
///
/// Colours need not be unique. Entry order is significant: when two entries
/// are equally close to a pixel the earlier one wins.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    entries: Vec<PaletteEntry>,
}

#[derive(Debug, Deserialize)]
struct RawLegend {
    #[serde(rename = "Lista RGBA")]
    entries: Vec<RawLegendEntry>,
}

#[derive(Debug, Deserialize)]
struct RawLegendEntry {
    #[serde(rename = "RGBA")]
    rgba: Vec<f64>,
    #[serde(rename = "Valores")]
    values: Vec<LegendValue>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LegendValue {
    Number(f64),
    Text(String),
    Missing(()),
}

impl LegendValue {
    fn as_bound(&self) -> Result<Option<f64>> {
        match self {
            LegendValue::Number(v) => Ok(Some(*v)),
            LegendValue::Missing(()) => Ok(None),
            LegendValue::Text(s) if s.trim().is_empty() => Ok(None),
            LegendValue::Text(s) => s.trim().parse::<f64>().map(Some).map_err(|_| {
                ProcessingError::InvalidPalette(format!("Invalid legend value: '{}'", s))
            }),
        }
    }
}

impl Palette {
    pub fn new(entries: Vec<PaletteEntry>) -> Result<Self> {
        if entries.is_empty() {
            return Err(ProcessingError::InvalidPalette(
                "Palette has no entries".to_string(),
            ));
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[PaletteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse the legend text stored in the raster metadata.
    ///
    /// The legend is a Python-literal mapping whose `Lista RGBA` list holds
    /// `{'RGBA': [r, g, b, a], 'Valores': [low, high]}` items. A range maps to
    /// its midpoint; an empty or absent upper bound maps to the lower bound.
    pub fn from_legend(legend: &str) -> Result<Self> {
        let json = python_literal_to_json(legend)?;
        let raw: RawLegend = serde_json::from_str(&json).map_err(|e| {
            ProcessingError::InvalidPalette(format!("'{}' not readable: {}", LEGEND_ENTRIES_KEY, e))
        })?;

        let entries = raw
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| parse_entry(i, entry))
            .collect::<Result<Vec<_>>>()?;

        Self::new(entries)
    }
}

fn parse_entry(index: usize, entry: &RawLegendEntry) -> Result<PaletteEntry> {
    if entry.rgba.len() < 3 {
        return Err(ProcessingError::InvalidPalette(format!(
            "Entry {} has {} colour components, expected at least 3",
            index,
            entry.rgba.len()
        )));
    }

    let mut color = [0u8; 3];
    for (channel, component) in color.iter_mut().zip(&entry.rgba) {
        if !(0.0..=255.0).contains(component) || component.fract() != 0.0 {
            return Err(ProcessingError::InvalidPalette(format!(
                "Entry {} has colour component {} outside 0..=255",
                index, component
            )));
        }
        *channel = *component as u8;
    }

    let low = entry
        .values
        .first()
        .map(LegendValue::as_bound)
        .transpose()?
        .flatten()
        .ok_or_else(|| {
            ProcessingError::InvalidPalette(format!("Entry {} has no lower bound", index))
        })?;
    let high = entry
        .values
        .get(1)
        .map(LegendValue::as_bound)
        .transpose()?
        .flatten();

    let value = match high {
        Some(high) => (low + high) / 2.0,
        None => low,
    };

    Ok(PaletteEntry::new(color, value))
}

/// Rewrite a Python literal (single-quoted strings, tuples, `None`, trailing
/// commas) as JSON text.
fn python_literal_to_json(input: &str) -> Result<String> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' => {
                let quote = c;
                out.push('"');
                let mut closed = false;
                while let Some(s) = chars.next() {
                    match s {
                        '\\' => match chars.next() {
                            Some('\'') => out.push('\''),
                            Some(escaped) => {
                                out.push('\\');
                                out.push(escaped);
                            }
                            None => break,
                        },
                        '"' if quote == '\'' => out.push_str("\\\""),
                        s if s == quote => {
                            closed = true;
                            break;
                        }
                        s => out.push(s),
                    }
                }
                if !closed {
                    return Err(ProcessingError::InvalidPalette(
                        "Unterminated string in legend".to_string(),
                    ));
                }
                out.push('"');
            }
            '(' => out.push('['),
            ')' | ']' | '}' => {
                let trimmed = out.trim_end().len();
                out.truncate(trimmed);
                if out.ends_with(',') {
                    out.pop();
                }
                out.push(if c == ')' { ']' } else { c });
            }
            // exponent of a numeric literal
            'e' | 'E' if out.ends_with(|p: char| p.is_ascii_digit() || p == '.') => out.push(c),
            c if c.is_ascii_alphabetic() => {
                let mut word = String::from(c);
                while let Some(&next) = chars.peek() {
                    if next.is_ascii_alphanumeric() || next == '_' {
                        word.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                match word.as_str() {
                    "None" => out.push_str("null"),
                    "True" => out.push_str("true"),
                    "False" => out.push_str("false"),
                    other => {
                        return Err(ProcessingError::InvalidPalette(format!(
                            "Unexpected token '{}' in legend",
                            other
                        )))
                    }
                }
            }
            c => out.push(c),
        }
    }

    Ok(out)
}
