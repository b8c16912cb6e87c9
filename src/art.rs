//! Top-level generation entry point.
//!
//! One call is one pure, deterministic pass from a [`Params`] record to a
//! fully populated raster. All state (PRNG, noise seeds, output surface) is
//! local to the call, so independent generations may run concurrently with
//! no coordination.

use std::ops::ControlFlow;

use raqote::DrawTarget;

use crate::canvas;
use crate::params::{Error, Params, Style};
use crate::rand::Rng;
use crate::{blend, contour, flow, terrain, tiles, voronoi};

/// Which stage of a render a progress event describes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Phase {
    /// Tile compositor cells.
    Cells,
    /// Voronoi sites.
    Sites,
    /// Contour threshold levels.
    Levels,
    /// Terrain depth layers.
    Layers,
    /// Flow-field particles.
    Particles,
    /// Per-pixel renderer scanlines.
    Scanlines,
}

/// A progress notification emitted between independent units of work.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RenderEvent {
    pub phase: Phase,
    pub completed: u32,
    pub total: u32,
}

/// Observer invoked between cells/sites/layers/particles/scanlines. The
/// engine is silent on success; hosts that want progress reporting or
/// cooperative cancellation subscribe here. Returning
/// [`ControlFlow::Break`] aborts the render with [`Error::Cancelled`]
/// before any further drawing.
pub type EventSink<'a> = dyn FnMut(RenderEvent) -> ControlFlow<()> + 'a;

pub(crate) fn emit(sink: &mut EventSink, event: RenderEvent) -> Result<(), Error> {
    match sink(event) {
        ControlFlow::Continue(()) => Ok(()),
        ControlFlow::Break(()) => Err(Error::Cancelled),
    }
}

/// Renders `params` to a fresh raster. Equivalent to [`draw_with`] with an
/// observer that never cancels.
pub fn draw(params: &Params) -> Result<DrawTarget, Error> {
    draw_with(params, &mut |_| ControlFlow::Continue(()))
}

/// Renders `params` to a fresh raster, reporting progress to `events`.
///
/// Parameters are validated before any pixel is written; generation either
/// fully succeeds or fails with no raster. The observer cannot influence the
/// output pixels, only abort the render.
pub fn draw_with(params: &Params, events: &mut EventSink) -> Result<DrawTarget, Error> {
    params.validate()?;

    let mut dt = DrawTarget::new(params.width, params.height);
    canvas::clear(&mut dt, params.palette.background);

    let mut rng = Rng::from_seed(params.seed);
    match params.style {
        Style::Tile(style) => tiles::render(&mut dt, params, &mut rng, style, events)?,
        Style::Voronoi(variant) => voronoi::render(&mut dt, params, &mut rng, variant, events)?,
        Style::Contour(variant) => contour::render(&mut dt, params, &mut rng, variant, events)?,
        Style::Terrain(variant) => terrain::render(&mut dt, params, &mut rng, variant, events)?,
        Style::Flow(variant) => flow::render(&mut dt, params, &mut rng, variant, events)?,
        Style::Blend(variant) => blend::render(&mut dt, params, &mut rng, variant, events)?,
    }
    Ok(dt)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::color::{Color, Palette};
    use crate::params::TileStyle;

    fn small_params() -> Params {
        Params {
            seed: 1,
            palette: Palette::new(
                vec![Color::new(220, 60, 40), Color::new(30, 130, 220)],
                Color::new(245, 245, 220),
            ),
            width: 32,
            height: 32,
            grid_density: 4,
            style: Style::Tile(TileStyle::QuarterCircles),
            complexity: 0.5,
        }
    }

    #[test]
    fn test_draw_rejects_invalid_before_allocating() {
        let mut params = small_params();
        params.complexity = 2.0;
        assert!(matches!(draw(&params), Err(Error::BadComplexity(_))));
    }

    #[test]
    fn test_events_are_reported() {
        let params = small_params();
        let mut count = 0u32;
        let mut last_total = 0u32;
        draw_with(&params, &mut |event| {
            count += 1;
            last_total = event.total;
            assert_eq!(event.phase, Phase::Cells);
            assert!(event.completed <= event.total);
            ControlFlow::Continue(())
        })
        .unwrap();
        assert_eq!(last_total, 16); // 4x4 grid
        assert!(count >= 16);
    }

    #[test]
    fn test_cancellation_aborts() {
        let params = small_params();
        let result = draw_with(&params, &mut |_| ControlFlow::Break(()));
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[test]
    fn test_observer_does_not_change_pixels() {
        let params = small_params();
        let plain = draw(&params).unwrap();
        let observed = draw_with(&params, &mut |_| ControlFlow::Continue(())).unwrap();
        assert_eq!(plain.get_data(), observed.get_data());
    }
}
