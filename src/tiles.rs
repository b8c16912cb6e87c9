//! Tile pattern compositor and the pattern catalog.
//!
//! The compositor partitions the canvas into a square grid and draws one
//! pattern (or a solid fill) per cell. Patterns are plain function pointers
//! taking every input explicitly; they capture nothing, read nothing outside
//! their cell, and draw at most a hair beyond their cell bounds, so cells
//! are independent units of work.

use raqote::DrawTarget;

use crate::art::{emit, EventSink, Phase, RenderEvent};
use crate::canvas::{
    arc, circle, fill, fill_rect, polygon, solid, stroke, stroke_flat, stroke_path,
};
use crate::color::Color;
use crate::math::pi;
use crate::params::{Error, Params, TileStyle};
use crate::rand::Rng;

/// One grid cell in absolute canvas coordinates.
#[derive(Debug, Copy, Clone)]
pub struct Cell {
    pub x: f64,
    pub y: f64,
    pub size: f64,
}

impl Cell {
    fn center(&self) -> (f64, f64) {
        (self.x + self.size / 2.0, self.y + self.size / 2.0)
    }

    fn corners(&self) -> [(f64, f64); 4] {
        [
            (self.x, self.y),
            (self.x + self.size, self.y),
            (self.x + self.size, self.y + self.size),
            (self.x, self.y + self.size),
        ]
    }
}

/// A stateless pattern: fills one cell from its rect, the palette colors,
/// the shared random stream, and the complexity knob.
pub type Pattern = fn(&mut DrawTarget, Cell, &[Color], &mut Rng, f64);

/// Picks two colors for a figure/ground pair, spending two draws. With a
/// single-color palette the pair degenerates to that color twice after a
/// single draw and the pattern renders as a flat fill instead of dividing
/// by zero or indexing out of range.
fn two_colors(colors: &[Color], rng: &mut Rng) -> (Color, Color) {
    let i = (rng.rnd() * colors.len() as f64) as usize;
    if colors.len() < 2 {
        return (colors[0], colors[0]);
    }
    let mut j = (rng.rnd() * (colors.len() - 1) as f64) as usize;
    if j >= i {
        j += 1;
    }
    (colors[i], colors[j])
}

/// Quarter-circle tile: ground fill plus a quarter disc anchored at a random
/// corner, radius equal to the cell size.
fn quarter_circle(dt: &mut DrawTarget, cell: Cell, colors: &[Color], rng: &mut Rng, _c: f64) {
    let (ground, figure) = two_colors(colors, rng);
    fill_rect(dt, cell.x, cell.y, cell.size, cell.size, &solid(ground));

    let corner = (rng.rnd() * 4.0) as usize;
    let (cx, cy) = cell.corners()[corner];
    // Sweep the quadrant that lies inside the cell.
    let start = pi(0.5) * corner as f64;
    let mut pb = raqote::PathBuilder::new();
    pb.move_to(cx as f32, cy as f32);
    pb.arc(cx as f32, cy as f32, cell.size as f32, start as f32, pi(0.5) as f32);
    pb.close();
    fill(dt, &pb.finish(), &solid(figure));
}

/// Concentric quarter arcs from a random corner, alternating colors.
fn concentric_arcs(dt: &mut DrawTarget, cell: Cell, colors: &[Color], rng: &mut Rng, c: f64) {
    let (ground, figure) = two_colors(colors, rng);
    fill_rect(dt, cell.x, cell.y, cell.size, cell.size, &solid(ground));

    let corner = (rng.rnd() * 4.0) as usize;
    let (cx, cy) = cell.corners()[corner];
    let start = pi(0.5) * corner as f64;
    let rings = 2 + (c * 4.0) as u32;
    // Butt caps: the arc ends sit on the cell edges, and a round cap there
    // would poke into the neighboring cell.
    let style = stroke_flat(cell.size * 0.08);
    for ring in 0..rings {
        let r = cell.size * (ring as f64 + 0.5) / rings as f64;
        let color = if ring % 2 == 0 { figure } else { ground.lerp(figure, 0.35) };
        let path = arc(cx, cy, r, start, pi(0.5));
        stroke_path(dt, &path, &solid(color), &style);
    }
}

/// A block with a hard drop shadow offset toward the cell's lower right.
fn shadow_block(dt: &mut DrawTarget, cell: Cell, colors: &[Color], rng: &mut Rng, _c: f64) {
    let (ground, figure) = two_colors(colors, rng);
    fill_rect(dt, cell.x, cell.y, cell.size, cell.size, &solid(ground));

    let inset = cell.size * 0.18;
    let offset = cell.size * 0.08;
    let side = cell.size - 2.0 * inset;
    let shadow = figure.darken(0.55);
    fill_rect(
        dt,
        cell.x + inset + offset,
        cell.y + inset + offset,
        side,
        side,
        &solid(shadow),
    );
    fill_rect(dt, cell.x + inset, cell.y + inset, side, side, &solid(figure));
}

/// Subdivides the cell into an n-by-n block of smaller squares.
fn grid_block(dt: &mut DrawTarget, cell: Cell, colors: &[Color], rng: &mut Rng, c: f64) {
    let ground = *rng.choice(colors);
    fill_rect(dt, cell.x, cell.y, cell.size, cell.size, &solid(ground));

    let n = 2 + (c * 2.0) as u32; // 2..=4
    let gap = cell.size * 0.04;
    let step = cell.size / n as f64;
    for row in 0..n {
        for col in 0..n {
            let color = *rng.choice(colors);
            fill_rect(
                dt,
                cell.x + col as f64 * step + gap / 2.0,
                cell.y + row as f64 * step + gap / 2.0,
                step - gap,
                step - gap,
                &solid(color),
            );
        }
    }
}

/// Filled diamond touching the edge midpoints, with a smaller inner diamond.
fn diamond(dt: &mut DrawTarget, cell: Cell, colors: &[Color], rng: &mut Rng, _c: f64) {
    let (ground, figure) = two_colors(colors, rng);
    fill_rect(dt, cell.x, cell.y, cell.size, cell.size, &solid(ground));

    let (cx, cy) = cell.center();
    let half = cell.size / 2.0;
    let outer = polygon(&[
        (cx, cy - half),
        (cx + half, cy),
        (cx, cy + half),
        (cx - half, cy),
    ]);
    fill(dt, &outer, &solid(figure));

    let inner_half = half * 0.45;
    let inner = polygon(&[
        (cx, cy - inner_half),
        (cx + inner_half, cy),
        (cx, cy + inner_half),
        (cx - inner_half, cy),
    ]);
    fill(dt, &inner, &solid(ground));
}

/// Two circles in diagonally opposite quadrants; one filled, one outlined.
fn circle_pair(dt: &mut DrawTarget, cell: Cell, colors: &[Color], rng: &mut Rng, _c: f64) {
    let (ground, figure) = two_colors(colors, rng);
    fill_rect(dt, cell.x, cell.y, cell.size, cell.size, &solid(ground));

    let q = cell.size / 4.0;
    let r = cell.size * 0.21;
    let flip = rng.odds(0.5);
    let (a, b) = if flip {
        ((cell.x + q, cell.y + q), (cell.x + 3.0 * q, cell.y + 3.0 * q))
    } else {
        ((cell.x + 3.0 * q, cell.y + q), (cell.x + q, cell.y + 3.0 * q))
    };
    fill(dt, &circle(a.0, a.1, r), &solid(figure));
    stroke_path(
        dt,
        &circle(b.0, b.1, r * 0.85),
        &solid(figure),
        &stroke(cell.size * 0.06),
    );
}

/// Clips a polygon to the cell rect, one boundary edge at a time
/// (Sutherland-Hodgman). The crossing closures only run when the segment
/// straddles the boundary, so their divisions are well defined.
fn clip_to_cell(points: &[(f64, f64)], cell: Cell) -> Vec<(f64, f64)> {
    fn pass(
        pts: &[(f64, f64)],
        inside: impl Fn((f64, f64)) -> bool,
        crossing: impl Fn((f64, f64), (f64, f64)) -> (f64, f64),
    ) -> Vec<(f64, f64)> {
        let mut out = Vec::with_capacity(pts.len() + 1);
        for (i, &p) in pts.iter().enumerate() {
            let prev = pts[(i + pts.len() - 1) % pts.len()];
            match (inside(prev), inside(p)) {
                (true, true) => out.push(p),
                (true, false) => out.push(crossing(prev, p)),
                (false, true) => {
                    out.push(crossing(prev, p));
                    out.push(p);
                }
                (false, false) => {}
            }
        }
        out
    }
    let (x0, y0) = (cell.x, cell.y);
    let (x1, y1) = (cell.x + cell.size, cell.y + cell.size);
    let at_x = |edge: f64| {
        move |a: (f64, f64), b: (f64, f64)| {
            (edge, a.1 + (b.1 - a.1) * (edge - a.0) / (b.0 - a.0))
        }
    };
    let at_y = |edge: f64| {
        move |a: (f64, f64), b: (f64, f64)| {
            (a.0 + (b.0 - a.0) * (edge - a.1) / (b.1 - a.1), edge)
        }
    };
    let pts = pass(points, |p| p.0 >= x0, at_x(x0));
    let pts = pass(&pts, |p| p.0 <= x1, at_x(x1));
    let pts = pass(&pts, |p| p.1 >= y0, at_y(y0));
    pass(&pts, |p| p.1 <= y1, at_y(y1))
}

/// Sunburst of wedges around the cell center, alternating colors.
fn fan(dt: &mut DrawTarget, cell: Cell, colors: &[Color], rng: &mut Rng, c: f64) {
    let (ground, figure) = two_colors(colors, rng);
    fill_rect(dt, cell.x, cell.y, cell.size, cell.size, &solid(ground));

    let (cx, cy) = cell.center();
    let wedges = 2 * (3 + (c * 5.0) as u32); // even count, 6..=16
    // Long enough to reach the corners; the clip trims the spill that
    // would otherwise land in neighboring cells.
    let rim = cell.size * 0.71;
    let offset = rng.uniform(0.0, pi(2.0));
    for w in 0..wedges {
        if w % 2 == 1 {
            continue;
        }
        let a0 = offset + pi(2.0) * w as f64 / wedges as f64;
        let a1 = offset + pi(2.0) * (w + 1) as f64 / wedges as f64;
        let wedge = clip_to_cell(
            &[
                (cx, cy),
                (cx + rim * a0.cos(), cy + rim * a0.sin()),
                (cx + rim * a1.cos(), cy + rim * a1.sin()),
            ],
            cell,
        );
        if wedge.len() >= 3 {
            fill(dt, &polygon(&wedge), &solid(figure));
        }
    }
}

/// Scattered confetti dots and ticks; count scales with complexity.
fn confetti(dt: &mut DrawTarget, cell: Cell, colors: &[Color], rng: &mut Rng, c: f64) {
    let ground = *rng.choice(colors);
    fill_rect(dt, cell.x, cell.y, cell.size, cell.size, &solid(ground));

    let count = 4 + (c * 12.0) as u32;
    let margin = cell.size * 0.08;
    for _ in 0..count {
        let color = *rng.choice(colors);
        let x = cell.x + rng.uniform(margin, cell.size - margin);
        let y = cell.y + rng.uniform(margin, cell.size - margin);
        let r = cell.size * rng.uniform(0.02, 0.06);
        if rng.odds(0.7) {
            fill(dt, &circle(x, y, r), &solid(color));
        } else {
            let theta = rng.uniform(0.0, pi(2.0));
            // Arm plus the round cap must fit inside the margin.
            let arm = (r * 2.0).min(margin - r * 0.4);
            let tick = crate::canvas::polyline(&[
                (x - arm * theta.cos(), y - arm * theta.sin()),
                (x + arm * theta.cos(), y + arm * theta.sin()),
            ]);
            stroke_path(dt, &tick, &solid(color), &stroke(r * 0.8));
        }
    }
}

/// Truchet tile: two quarter arcs at radius `size / 2`, each centered on a
/// cell corner and joining the midpoints of the two adjacent edges. Edge
/// midpoints are the only points where strokes meet the cell boundary, so an
/// arc always continues smoothly into the neighboring tile's arc regardless
/// of which rotation either tile picked.
fn truchet(dt: &mut DrawTarget, cell: Cell, colors: &[Color], rng: &mut Rng, _c: f64) {
    let (ground, figure) = two_colors(colors, rng);
    fill_rect(dt, cell.x, cell.y, cell.size, cell.size, &solid(ground));

    let r = cell.size / 2.0;
    // Butt caps end exactly at the edge midpoints where the neighbor's arc
    // picks up.
    let style = stroke_flat(cell.size * 0.14);
    let corners = cell.corners();
    // Rotation A arcs from the top-left and bottom-right corners; rotation B
    // from the other diagonal. The quadrant inside the cell for corner `i`
    // starts at angle `i * pi/2`.
    let pair: [usize; 2] = if rng.odds(0.5) { [0, 2] } else { [1, 3] };
    for corner in pair {
        let (cx, cy) = corners[corner];
        let start = pi(0.5) * corner as f64;
        let path = arc(cx, cy, r, start, pi(0.5));
        stroke_path(dt, &path, &solid(figure), &style);
    }
}

/// Regular tessellation: the cell split along its diagonals into four
/// triangles, or along one diagonal into two.
fn triangles(dt: &mut DrawTarget, cell: Cell, colors: &[Color], rng: &mut Rng, _c: f64) {
    let [tl, tr, br, bl] = cell.corners();
    if rng.odds(0.5) {
        let (a, b) = two_colors(colors, rng);
        // Split along a random diagonal.
        if rng.odds(0.5) {
            fill(dt, &polygon(&[tl, tr, br]), &solid(a));
            fill(dt, &polygon(&[tl, br, bl]), &solid(b));
        } else {
            fill(dt, &polygon(&[tl, tr, bl]), &solid(a));
            fill(dt, &polygon(&[tr, br, bl]), &solid(b));
        }
    } else {
        let center = cell.center();
        for (i, edge) in [[tl, tr], [tr, br], [br, bl], [bl, tl]].iter().enumerate() {
            let color = if colors.len() < 2 {
                colors[0]
            } else {
                colors[(i + (rng.rnd() * colors.len() as f64) as usize) % colors.len()]
            };
            fill(dt, &polygon(&[edge[0], edge[1], center]), &solid(color));
        }
    }
}

/// The pattern list a tile style draws from.
pub fn catalog(style: TileStyle) -> &'static [Pattern] {
    match style {
        TileStyle::QuarterCircles => &[quarter_circle],
        TileStyle::Arcs => &[concentric_arcs],
        TileStyle::Blocks => &[shadow_block, grid_block],
        TileStyle::Diamonds => &[diamond],
        TileStyle::Circles => &[circle_pair],
        TileStyle::Fans => &[fan],
        TileStyle::Confetti => &[confetti],
        TileStyle::Truchet => &[truchet],
        TileStyle::Triangles => &[triangles],
        TileStyle::Medley => &[
            quarter_circle,
            concentric_arcs,
            shadow_block,
            grid_block,
            diamond,
            circle_pair,
            fan,
            confetti,
            truchet,
            triangles,
        ],
    }
}

/// Grid extent for a canvas: `ceil(side / cell_size)` cells per axis.
pub fn grid_extent(params: &Params) -> (u32, u32) {
    let size = params.cell_size();
    let cols = (f64::from(params.width) / size).ceil() as u32;
    let rows = (f64::from(params.height) / size).ceil() as u32;
    (cols.max(1), rows.max(1))
}

pub fn render(
    dt: &mut DrawTarget,
    params: &Params,
    rng: &mut Rng,
    style: TileStyle,
    events: &mut EventSink,
) -> Result<(), Error> {
    let patterns = catalog(style);
    let colors = &params.palette.colors;
    let size = params.cell_size();
    let (cols, rows) = grid_extent(params);
    let total = cols * rows;

    // Draw one decision deviate per cell up front. A cell is patterned iff
    // its deviate is at most `complexity`, so for a fixed seed the set of
    // patterned cells only ever grows as complexity increases, regardless of
    // how much entropy individual patterns consume.
    let decisions: Vec<f64> = (0..total).map(|_| rng.rnd()).collect();

    let mut completed = 0u32;
    for row in 0..rows {
        for col in 0..cols {
            let cell = Cell {
                x: f64::from(col) * size,
                y: f64::from(row) * size,
                size,
            };
            let patterned = decisions[(row * cols + col) as usize] <= params.complexity;
            if patterned {
                let pattern = *rng.choice(patterns);
                pattern(dt, cell, colors, rng, params.complexity);
            } else {
                let color = *rng.choice(colors);
                fill_rect(dt, cell.x, cell.y, cell.size, cell.size, &solid(color));
            }
            completed += 1;
            emit(
                events,
                RenderEvent {
                    phase: Phase::Cells,
                    completed,
                    total,
                },
            )?;
        }
    }
    Ok(())
}

/// Counts how many cells would receive a pattern rather than a solid fill.
/// Exposed for property testing; consumes the same decision draws `render`
/// would.
pub fn patterned_cell_count(params: &Params) -> u32 {
    let mut rng = Rng::from_seed(params.seed);
    let (cols, rows) = grid_extent(params);
    (0..cols * rows)
        .filter(|_| rng.rnd() <= params.complexity)
        .count() as u32
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::canvas::{clear, opaque_pixel};
    use crate::color::Palette;
    use crate::params::Style;
    use std::ops::ControlFlow;

    fn params(style: TileStyle, complexity: f64) -> Params {
        Params {
            seed: 11,
            palette: Palette::new(
                vec![Color::new(220, 60, 40), Color::new(30, 130, 220), Color::new(250, 210, 60)],
                Color::new(245, 245, 220),
            ),
            width: 64,
            height: 48,
            grid_density: 4,
            style: Style::Tile(style),
            complexity,
        }
    }

    fn sink() -> impl FnMut(RenderEvent) -> ControlFlow<()> {
        |_| ControlFlow::Continue(())
    }

    #[test]
    fn test_grid_extent_ceils() {
        let p = params(TileStyle::Blocks, 0.5);
        // cell = 64 / 4 = 16; 64x48 canvas -> 4x3 cells
        assert_eq!(grid_extent(&p), (4, 3));
        let mut p = p;
        p.width = 65;
        assert_eq!(grid_extent(&p), (4, 3));
        p.grid_density = 4;
        p.width = 66;
        // cell = 66/4 = 16.5 -> ceil(66/16.5) = 4, ceil(48/16.5) = 3
        assert_eq!(grid_extent(&p), (4, 3));
    }

    #[test]
    fn test_two_colors_distinct() {
        let colors = [
            Color::new(1, 0, 0),
            Color::new(0, 1, 0),
            Color::new(0, 0, 1),
        ];
        let mut rng = Rng::from_seed(3);
        for _ in 0..200 {
            let (a, b) = two_colors(&colors, &mut rng);
            assert_ne!(a, b);
        }
    }

    #[test]
    fn test_two_colors_single_palette_degrades() {
        let colors = [Color::new(9, 9, 9)];
        let mut rng = Rng::from_seed(3);
        let before = rng.clone();
        let (a, b) = two_colors(&colors, &mut rng);
        assert_eq!(a, b);
        // Consumes exactly one draw in the degenerate case.
        let mut check = before;
        check.rnd();
        assert_eq!(rng, check);
    }

    #[test]
    fn test_every_style_renders_and_writes_pixels() {
        for style in TileStyle::all() {
            let p = params(*style, 1.0);
            let mut dt = DrawTarget::new(p.width, p.height);
            clear(&mut dt, p.palette.background);
            let bg = opaque_pixel(p.palette.background);
            let mut rng = Rng::from_seed(p.seed);
            render(&mut dt, &p, &mut rng, *style, &mut sink()).unwrap();
            let touched = dt.get_data().iter().filter(|&&px| px != bg).count();
            assert!(touched > 0, "{style:?} drew nothing");
        }
    }

    #[test]
    fn test_render_is_deterministic() {
        let p = params(TileStyle::Medley, 0.8);
        let render_once = || {
            let mut dt = DrawTarget::new(p.width, p.height);
            clear(&mut dt, p.palette.background);
            let mut rng = Rng::from_seed(p.seed);
            render(&mut dt, &p, &mut rng, TileStyle::Medley, &mut sink()).unwrap();
            dt.get_data().to_vec()
        };
        assert_eq!(render_once(), render_once());
    }

    #[test]
    fn test_patterned_count_monotone_in_complexity() {
        let mut previous = 0;
        for complexity in [0.0, 0.25, 0.5, 0.75, 1.0] {
            let mut p = params(TileStyle::QuarterCircles, complexity);
            p.grid_density = 16;
            let count = patterned_cell_count(&p);
            assert!(
                count >= previous,
                "complexity {complexity}: {count} < {previous}"
            );
            previous = count;
        }
        // Extremes are exact: complexity 1.0 patterns every cell.
        let p = params(TileStyle::QuarterCircles, 1.0);
        let (cols, rows) = grid_extent(&p);
        assert_eq!(patterned_cell_count(&p), cols * rows);
    }

    #[test]
    fn test_clip_to_cell_trims_protruding_triangle() {
        let cell = Cell { x: 0.0, y: 0.0, size: 10.0 };
        // Apex pokes past the right edge; both base corners are inside.
        let clipped = clip_to_cell(&[(2.0, 2.0), (14.0, 5.0), (2.0, 8.0)], cell);
        assert!(clipped.len() >= 3);
        for (x, y) in &clipped {
            assert!((0.0..=10.0).contains(x) && (0.0..=10.0).contains(y));
        }
        // A triangle already inside comes back unchanged.
        let kept = clip_to_cell(&[(1.0, 1.0), (9.0, 1.0), (5.0, 9.0)], cell);
        assert_eq!(kept, vec![(1.0, 1.0), (9.0, 1.0), (5.0, 9.0)]);
    }

    #[test]
    fn test_patterns_stay_inside_their_cell() {
        let colors = [
            Color::new(220, 60, 40),
            Color::new(30, 130, 220),
            Color::new(250, 210, 60),
        ];
        let bg = Color::new(0, 0, 0);
        let cell = Cell { x: 64.0, y: 64.0, size: 64.0 };
        for (idx, pattern) in catalog(TileStyle::Medley).iter().enumerate() {
            for seed in 0..16u64 {
                let mut dt = DrawTarget::new(192, 192);
                clear(&mut dt, bg);
                let mut rng = Rng::from_seed(seed);
                pattern(&mut dt, cell, &colors, &mut rng, 1.0);
                let data = dt.get_data();
                for y in 0..192usize {
                    for x in 0..192usize {
                        // One pixel of antialiasing slack on every side.
                        if (63..=129).contains(&x) && (63..=129).contains(&y) {
                            continue;
                        }
                        assert_eq!(
                            data[y * 192 + x],
                            opaque_pixel(bg),
                            "pattern {idx} (seed {seed}) painted outside its cell at ({x}, {y})"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_catalog_medley_is_superset() {
        let medley = catalog(TileStyle::Medley);
        for style in TileStyle::all() {
            if *style == TileStyle::Medley {
                continue;
            }
            for p in catalog(*style) {
                assert!(medley.iter().any(|m| std::ptr::eq(*m as *const (), *p as *const ())),
                    "{style:?} pattern missing from medley");
            }
        }
    }
}
