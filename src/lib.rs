pub mod art;
pub mod blend;
pub mod canvas;
pub mod color;
pub mod contour;
pub mod flow;
pub mod math;
pub mod noise;
pub mod params;
pub mod rand;
pub mod terrain;
pub mod tiles;
pub mod voronoi;

pub use art::{draw, draw_with, EventSink, Phase, RenderEvent};
pub use color::{Color, Palette, PaletteDb};
pub use params::{Error, Params, Style};
