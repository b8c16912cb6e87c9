use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::color::{Palette, ParseColorError};

/// Errors surfaced by the engine. Parameter problems are rejected before any
/// drawing begins; generation either fully succeeds or fails with no raster.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("palette must contain at least one color")]
    EmptyPalette,
    #[error("canvas dimensions must be positive, got {width}x{height}")]
    BadDimensions { width: i32, height: i32 },
    #[error("grid density must be positive")]
    BadGridDensity,
    #[error("complexity must be within [0, 1], got {0}")]
    BadComplexity(f64),
    #[error("unknown style {0:?}")]
    UnknownStyle(String),
    #[error(transparent)]
    Color(#[from] ParseColorError),
    #[error("render cancelled")]
    Cancelled,
}

macro_rules! variant_enum {
    ($enum:ident, $family:literal { $($value:ident($name:literal)),* $(,)? }) => {
        #[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
        pub enum $enum {
            $($value),*
        }
        impl $enum {
            pub const FAMILY: &'static str = $family;
            pub fn all() -> &'static [Self] {
                &[$(Self::$value),*]
            }
            pub fn name(self) -> &'static str {
                match self {
                    $(Self::$value => $name),*
                }
            }
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(Self::$value),)*
                    _ => None,
                }
            }
        }
    };
}

variant_enum!(TileStyle, "tile" {
    QuarterCircles("quarterCircles"),
    Arcs("arcs"),
    Blocks("blocks"),
    Diamonds("diamonds"),
    Circles("circles"),
    Fans("fans"),
    Confetti("confetti"),
    Truchet("truchet"),
    Triangles("triangles"),
    Medley("medley"),
});

variant_enum!(VoronoiVariant, "voronoi" {
    Cells("cells"),
    StainedGlass("stainedGlass"),
    Mosaic("mosaic"),
    Cracked("cracked"),
    Honeycomb("honeycomb"),
    Crystal("crystal"),
});

variant_enum!(ContourVariant, "contour" {
    Topo("topo"),
    Bands("bands"),
    Islands("islands"),
    Ridges("ridges"),
    Thermal("thermal"),
    Interference("interference"),
    Magnetic("magnetic"),
});

variant_enum!(TerrainVariant, "terrain" {
    Layers("layers"),
    Peaks("peaks"),
    Sunset("sunset"),
    Night("night"),
    Aurora("aurora"),
    Reflection("reflection"),
});

variant_enum!(FlowVariant, "flow" {
    Streams("streams"),
    Curl("curl"),
    Attractors("attractors"),
    Magnet("magnet"),
    Spiral("spiral"),
    Particles("particles"),
});

variant_enum!(BlendVariant, "blend" {
    Blobs("blobs"),
    Lava("lava"),
    Lights("lights"),
    Ribbons("ribbons"),
    Plasma("plasma"),
});

/// Which renderer runs, and its sub-variant. A closed enum: every style the
/// engine knows is matched exhaustively at dispatch, so an unknown style is
/// a parse error, never a runtime lookup miss.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub enum Style {
    Tile(TileStyle),
    Voronoi(VoronoiVariant),
    Contour(ContourVariant),
    Terrain(TerrainVariant),
    Flow(FlowVariant),
    Blend(BlendVariant),
}

impl Style {
    /// Every style the engine supports, in a stable order.
    pub fn all() -> Vec<Style> {
        let mut styles = Vec::new();
        styles.extend(TileStyle::all().iter().copied().map(Style::Tile));
        styles.extend(VoronoiVariant::all().iter().copied().map(Style::Voronoi));
        styles.extend(ContourVariant::all().iter().copied().map(Style::Contour));
        styles.extend(TerrainVariant::all().iter().copied().map(Style::Terrain));
        styles.extend(FlowVariant::all().iter().copied().map(Style::Flow));
        styles.extend(BlendVariant::all().iter().copied().map(Style::Blend));
        styles
    }

    pub fn family(self) -> &'static str {
        match self {
            Style::Tile(_) => TileStyle::FAMILY,
            Style::Voronoi(_) => VoronoiVariant::FAMILY,
            Style::Contour(_) => ContourVariant::FAMILY,
            Style::Terrain(_) => TerrainVariant::FAMILY,
            Style::Flow(_) => FlowVariant::FAMILY,
            Style::Blend(_) => BlendVariant::FAMILY,
        }
    }

    pub fn variant_name(self) -> &'static str {
        match self {
            Style::Tile(v) => v.name(),
            Style::Voronoi(v) => v.name(),
            Style::Contour(v) => v.name(),
            Style::Terrain(v) => v.name(),
            Style::Flow(v) => v.name(),
            Style::Blend(v) => v.name(),
        }
    }
}

impl std::fmt::Display for Style {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.family(), self.variant_name())
    }
}

impl FromStr for Style {
    type Err = Error;

    /// Parses the `family:variant` form, e.g. `tile:quarterCircles`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || Error::UnknownStyle(s.to_string());
        let (family, variant) = s.split_once(':').ok_or_else(unknown)?;
        let style = match family {
            "tile" => TileStyle::from_name(variant).map(Style::Tile),
            "voronoi" => VoronoiVariant::from_name(variant).map(Style::Voronoi),
            "contour" => ContourVariant::from_name(variant).map(Style::Contour),
            "terrain" => TerrainVariant::from_name(variant).map(Style::Terrain),
            "flow" => FlowVariant::from_name(variant).map(Style::Flow),
            "blend" => BlendVariant::from_name(variant).map(Style::Blend),
            _ => None,
        };
        style.ok_or_else(unknown)
    }
}

impl Serialize for Style {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Style {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// One complete generation request. Constructed fresh per call; the engine
/// never holds state across calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Params {
    pub seed: u64,
    pub palette: Palette,
    pub width: i32,
    pub height: i32,
    /// Number of cells along the longer canvas dimension.
    pub grid_density: u32,
    pub style: Style,
    /// Visual density control in [0, 1]; meaning is renderer-specific but
    /// always monotonic in detail.
    pub complexity: f64,
}

impl Params {
    /// Fail-fast validation: rejects bad parameters before any pixel is
    /// written.
    pub fn validate(&self) -> Result<(), Error> {
        if self.palette.colors.is_empty() {
            return Err(Error::EmptyPalette);
        }
        if self.width <= 0 || self.height <= 0 {
            return Err(Error::BadDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if self.grid_density == 0 {
            return Err(Error::BadGridDensity);
        }
        if !(0.0..=1.0).contains(&self.complexity) {
            return Err(Error::BadComplexity(self.complexity));
        }
        Ok(())
    }

    /// Per-cell size in pixels: longer dimension over grid density, at least
    /// one pixel.
    pub fn cell_size(&self) -> f64 {
        (f64::from(self.width.max(self.height)) / f64::from(self.grid_density)).max(1.0)
    }

    /// Longer canvas dimension in pixels.
    pub fn long_side(&self) -> f64 {
        f64::from(self.width.max(self.height))
    }
}
