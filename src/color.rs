use std::collections::{hash_map::Entry::*, HashMap};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

const PALETTES_JSON: &str = include_str!("palettes.json");

/// An opaque sRGB color.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ParseColorError {
    #[error("malformed hex color {0:?}: expected \"#rgb\" or \"#rrggbb\"")]
    Malformed(String),
    #[error("normalized color component {0} outside [0, 1]")]
    OutOfRange(f64),
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b }
    }

    /// Parses `"#rrggbb"` or `"#rgb"` (leading `#` optional, case
    /// insensitive). Anything else is rejected rather than silently mapped
    /// to wrong pixels.
    pub fn from_hex(s: &str) -> Result<Self, ParseColorError> {
        let malformed = || ParseColorError::Malformed(s.to_string());
        let digits = s.strip_prefix('#').unwrap_or(s);
        let nibble = |c: char| c.to_digit(16).map(|d| d as u8);
        let chars: Vec<u8> = digits.chars().map(nibble).collect::<Option<_>>().ok_or_else(malformed)?;
        match chars.as_slice() {
            [r, g, b] => Ok(Color::new(r * 17, g * 17, b * 17)),
            [r1, r0, g1, g0, b1, b0] => {
                Ok(Color::new(r1 * 16 + r0, g1 * 16 + g0, b1 * 16 + b0))
            }
            _ => Err(malformed()),
        }
    }

    /// Converts a normalized RGB triple with components in [0, 1].
    pub fn from_normalized(r: f64, g: f64, b: f64) -> Result<Self, ParseColorError> {
        let channel = |v: f64| {
            if !(0.0..=1.0).contains(&v) {
                return Err(ParseColorError::OutOfRange(v));
            }
            Ok((v * 255.0).round() as u8)
        };
        Ok(Color::new(channel(r)?, channel(g)?, channel(b)?))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Linear blend toward `other`; `t = 0` is `self`, `t = 1` is `other`.
    pub fn lerp(self, other: Color, t: f64) -> Color {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8;
        Color::new(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
        )
    }

    /// Blend toward white by `amount` in [0, 1].
    pub fn lighten(self, amount: f64) -> Color {
        self.lerp(Color::new(255, 255, 255), amount)
    }

    /// Blend toward black by `amount` in [0, 1].
    pub fn darken(self, amount: f64) -> Color {
        self.lerp(Color::new(0, 0, 0), amount)
    }
}

impl FromStr for Color {
    type Err = ParseColorError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::from_hex(s)
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Color {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Wire form: either a hex string or a normalized `[r, g, b]` triple.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireColor {
    Hex(String),
    Triple([f64; 3]),
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = WireColor::deserialize(deserializer)?;
        let color = match wire {
            WireColor::Hex(s) => Color::from_hex(&s),
            WireColor::Triple([r, g, b]) => Color::from_normalized(r, g, b),
        };
        color.map_err(serde::de::Error::custom)
    }
}

/// An ordered list of foreground colors plus a background color. Insertion
/// order is significant: it is the only variety axis the pattern catalog has.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    pub colors: Vec<Color>,
    pub background: Color,
}

impl Palette {
    pub fn new(colors: Vec<Color>, background: Color) -> Self {
        Palette { colors, background }
    }
}

/// Piecewise-linear color ramp over `colors` at position `t` in [0, 1].
/// A single-color list is a constant ramp.
///
/// # Panics
///
/// Panics if `colors` is empty; parameter validation rules that out before
/// any renderer runs.
pub fn ramp(colors: &[Color], t: f64) -> Color {
    let first = *colors.first().expect("no colors");
    if colors.len() == 1 {
        return first;
    }
    let t = t.clamp(0.0, 1.0) * (colors.len() - 1) as f64;
    let index = (t.floor() as usize).min(colors.len() - 2);
    colors[index].lerp(colors[index + 1], t - index as f64)
}

#[derive(Debug, Deserialize)]
struct WirePaletteDb {
    palettes: Vec<WirePalette>,
}

#[derive(Debug, Deserialize)]
struct WirePalette {
    name: String,
    colors: Vec<String>,
    background: String,
}

#[derive(Debug, thiserror::Error)]
pub enum PaletteDbError {
    #[error("duplicate palette {name:?}")]
    DuplicatePalette { name: String },
    #[error("palette {name:?} has no colors")]
    EmptyPalette { name: String },
    #[error("palette {name:?}: {source}")]
    BadColor {
        name: String,
        source: ParseColorError,
    },
}

/// Named palettes bundled with the crate.
#[derive(Debug)]
pub struct PaletteDb {
    palettes: HashMap<String, Palette>,
}

impl PaletteDb {
    pub fn from_bundle() -> Self {
        let wire: WirePaletteDb =
            serde_json::from_str(PALETTES_JSON).expect("bundled data is invalid JSON");
        PaletteDb::from_wire(wire).expect("bundled data is not a valid database")
    }

    fn from_wire(wire: WirePaletteDb) -> Result<Self, PaletteDbError> {
        let mut palettes = HashMap::with_capacity(wire.palettes.len());
        for palette in wire.palettes {
            let name = palette.name;
            if palette.colors.is_empty() {
                return Err(PaletteDbError::EmptyPalette { name });
            }
            let parse = |s: &str| {
                Color::from_hex(s).map_err(|source| PaletteDbError::BadColor {
                    name: name.clone(),
                    source,
                })
            };
            let colors = palette
                .colors
                .iter()
                .map(|s| parse(s))
                .collect::<Result<Vec<Color>, _>>()?;
            let background = parse(&palette.background)?;
            match palettes.entry(name) {
                Occupied(o) => {
                    let name = o.remove_entry().0;
                    return Err(PaletteDbError::DuplicatePalette { name });
                }
                Vacant(v) => v.insert(Palette::new(colors, background)),
            };
        }
        Ok(PaletteDb { palettes })
    }

    pub fn get(&self, name: &str) -> Option<&Palette> {
        self.palettes.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.palettes.keys().map(String::as_str)
    }
}
