//! Voronoi cell renderer.
//!
//! Sites are scattered over the canvas plus a margin so cells touching the
//! visible edge are not visibly truncated. Decorative variants approximate
//! each cell boundary by angular ray-marching: 72 rays per site, binary
//! searching each ray for the point where ownership flips to another site.
//! The plain `Cells` variant instead paints every pixel with its nearest
//! site's color, which makes coverage an exact partition of the canvas.

use raqote::DrawTarget;

use crate::art::{emit, EventSink, Phase, RenderEvent};
use crate::canvas::{
    fill, opaque_pixel, polygon, radial_gradient, solid, stroke_flat, stroke_path,
};
use crate::color::Color;
use crate::math::{add_polar_offset, dist, pi};
use crate::params::{Error, Params, VoronoiVariant};
use crate::rand::Rng;

/// Fraction of the longer canvas dimension added on every side when
/// scattering sites.
const MARGIN: f64 = 0.15;

/// Rays marched per site when approximating a cell polygon.
const RAYS: usize = 72;

/// Binary-search tolerance along a ray, in canvas units.
const TOLERANCE: f64 = 1.0;

#[derive(Debug, Copy, Clone)]
pub struct Site {
    pub position: (f64, f64),
    pub color: Color,
}

/// Scatters `count` sites uniformly over the margin-expanded canvas, each
/// owning one palette color.
pub fn scatter(params: &Params, rng: &mut Rng, count: usize) -> Vec<Site> {
    let margin = params.long_side() * MARGIN;
    let w = f64::from(params.width);
    let h = f64::from(params.height);
    (0..count)
        .map(|_| {
            let x = rng.uniform(-margin, w + margin);
            let y = rng.uniform(-margin, h + margin);
            let color = *rng.choice(&params.palette.colors);
            Site {
                position: (x, y),
                color,
            }
        })
        .collect()
}

/// Site count: the grid density squared, scaled by complexity.
pub fn site_count(params: &Params) -> usize {
    let d = f64::from(params.grid_density);
    let n = d * d * (0.3 + 0.7 * params.complexity);
    (n as usize).max(3)
}

/// Index of the site nearest to `p`. The epsilon guard in [`dist`] keeps the
/// comparison well-defined even when `p` coincides exactly with a site.
pub fn nearest_site(sites: &[Site], p: (f64, f64)) -> usize {
    let mut best = 0;
    let mut best_d = f64::INFINITY;
    for (i, site) in sites.iter().enumerate() {
        let d = dist(site.position, p);
        if d < best_d {
            best_d = d;
            best = i;
        }
    }
    best
}

/// Whether the point `t` units along the ray still belongs to site `own`.
/// Its distance to `own` is exactly `t`, so ownership means no other site is
/// closer than that.
fn owned_at(sites: &[Site], own: usize, origin: (f64, f64), theta: f64, t: f64) -> bool {
    let p = add_polar_offset(origin, theta, t);
    sites
        .iter()
        .enumerate()
        .all(|(j, site)| j == own || dist(site.position, p) >= t)
}

/// Approximates site `own`'s cell boundary as [`RAYS`] points. Along each
/// ray, ownership is monotone (cells are convex and contain their site), so
/// a binary search between the site and `max_radius` brackets the crossover
/// to within [`TOLERANCE`].
pub fn cell_polygon(sites: &[Site], own: usize, max_radius: f64) -> Vec<(f64, f64)> {
    let origin = sites[own].position;
    (0..RAYS)
        .map(|k| {
            let theta = pi(2.0) * k as f64 / RAYS as f64;
            let r = if owned_at(sites, own, origin, theta, max_radius) {
                max_radius
            } else {
                let mut lo = 0.0;
                let mut hi = max_radius;
                while hi - lo > TOLERANCE {
                    let mid = (lo + hi) / 2.0;
                    if owned_at(sites, own, origin, theta, mid) {
                        lo = mid;
                    } else {
                        hi = mid;
                    }
                }
                (lo + hi) / 2.0
            };
            add_polar_offset(origin, theta, r)
        })
        .collect()
}

/// Pulls each vertex toward the site center by a fixed inset distance.
fn inset_polygon(points: &[(f64, f64)], center: (f64, f64), inset: f64) -> Vec<(f64, f64)> {
    points
        .iter()
        .map(|&(x, y)| {
            let d = dist((x, y), center);
            let t = (inset / d).min(1.0);
            (x + (center.0 - x) * t, y + (center.1 - y) * t)
        })
        .collect()
}

/// Paints every pixel with its nearest site's color. Exact partition: each
/// canvas pixel is written exactly once.
fn render_cells(
    dt: &mut DrawTarget,
    params: &Params,
    sites: &[Site],
    events: &mut EventSink,
) -> Result<(), Error> {
    let width = params.width as usize;
    let height = params.height as usize;
    let pixel_colors: Vec<u32> = sites.iter().map(|s| opaque_pixel(s.color)).collect();
    for y in 0..height {
        {
            let data = dt.get_data_mut();
            for x in 0..width {
                let p = (x as f64 + 0.5, y as f64 + 0.5);
                let idx = nearest_site(sites, p);
                data[y * width + x] = pixel_colors[idx];
            }
        }
        emit(
            events,
            RenderEvent {
                phase: Phase::Scanlines,
                completed: (y + 1) as u32,
                total: height as u32,
            },
        )?;
    }
    Ok(())
}

/// Regular hexagonal lattice; not site-based.
fn render_honeycomb(
    dt: &mut DrawTarget,
    params: &Params,
    rng: &mut Rng,
    events: &mut EventSink,
) -> Result<(), Error> {
    let r = (params.cell_size() / 2.0).max(2.0);
    let col_step = r * 1.5;
    let row_step = r * 3f64.sqrt();
    let cols = (f64::from(params.width) / col_step).ceil() as i32 + 2;
    let rows = (f64::from(params.height) / row_step).ceil() as i32 + 2;
    let edge = params.palette.background.darken(0.3);
    let style = stroke_flat((r * 0.08).max(0.5));

    let mut completed = 0u32;
    let total = (cols * rows) as u32;
    for col in 0..cols {
        for row in 0..rows {
            let cx = f64::from(col) * col_step - r;
            let cy = f64::from(row) * row_step + if col % 2 == 1 { row_step / 2.0 } else { 0.0 } - r;
            let color = *rng.choice(&params.palette.colors);
            let hex: Vec<(f64, f64)> = (0..6)
                .map(|k| {
                    let theta = pi(2.0) * k as f64 / 6.0;
                    add_polar_offset((cx, cy), theta, r)
                })
                .collect();
            let path = polygon(&hex);
            fill(dt, &path, &solid(color));
            stroke_path(dt, &path, &solid(edge), &style);
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

pub fn render(
    dt: &mut DrawTarget,
    params: &Params,
    rng: &mut Rng,
    variant: VoronoiVariant,
    events: &mut EventSink,
) -> Result<(), Error> {
    if variant == VoronoiVariant::Honeycomb {
        return render_honeycomb(dt, params, rng, events);
    }

    let sites = scatter(params, rng, site_count(params));
    if variant == VoronoiVariant::Cells {
        return render_cells(dt, params, &sites, events);
    }

    let margin = params.long_side() * MARGIN;
    let max_radius = params.long_side() + 2.0 * margin;
    let inset = (params.cell_size() * 0.12).max(1.5);

    if variant == VoronoiVariant::Cracked {
        // Flat base under the crack lines.
        let base = *rng.choice(&params.palette.colors);
        crate::canvas::fill_rect(
            dt,
            0.0,
            0.0,
            f64::from(params.width),
            f64::from(params.height),
            &solid(base),
        );
    }

    let total = sites.len() as u32;
    for (i, site) in sites.iter().enumerate() {
        let points = cell_polygon(&sites, i, max_radius);
        match variant {
            VoronoiVariant::Cells | VoronoiVariant::Honeycomb => unreachable!("handled above"),
            VoronoiVariant::StainedGlass => {
                let path = polygon(&points);
                fill(dt, &path, &solid(site.color));
                let lead = params.palette.background.darken(0.6);
                stroke_path(dt, &path, &solid(lead), &stroke_flat(inset * 0.5));
            }
            VoronoiVariant::Mosaic => {
                let tile = inset_polygon(&points, site.position, inset);
                fill(dt, &polygon(&tile), &solid(site.color));
            }
            VoronoiVariant::Cracked => {
                let crack = site.color.darken(0.7);
                stroke_path(
                    dt,
                    &polygon(&points),
                    &solid(crack),
                    &stroke_flat((inset * 0.2).max(0.7)),
                );
            }
            VoronoiVariant::Crystal => {
                let radius = points
                    .iter()
                    .map(|&p| dist(p, site.position))
                    .fold(0.0f64, f64::max)
                    .max(1.0);
                let source = radial_gradient(
                    site.position,
                    radius,
                    site.color.lighten(0.45),
                    site.color.darken(0.35),
                );
                fill(dt, &polygon(&points), &source);
            }
        }
        emit(
            events,
            RenderEvent {
                phase: Phase::Sites,
                completed: (i + 1) as u32,
                total,
            },
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::color::Palette;
    use crate::params::Style;
    use std::ops::ControlFlow;

    fn params(variant: VoronoiVariant) -> Params {
        Params {
            seed: 7,
            palette: Palette::new(
                vec![
                    Color::new(220, 60, 40),
                    Color::new(30, 130, 220),
                    Color::new(250, 210, 60),
                ],
                Color::new(16, 24, 32),
            ),
            width: 64,
            height: 64,
            grid_density: 4,
            style: Style::Voronoi(variant),
            complexity: 0.5,
        }
    }

    fn sink() -> impl FnMut(RenderEvent) -> ControlFlow<()> {
        |_| ControlFlow::Continue(())
    }

    #[test]
    fn test_site_count_scales_with_complexity() {
        let mut p = params(VoronoiVariant::Cells);
        p.complexity = 0.0;
        let low = site_count(&p);
        p.complexity = 1.0;
        let high = site_count(&p);
        assert!(low >= 3);
        assert!(high > low);
    }

    #[test]
    fn test_scatter_uses_margin() {
        let p = params(VoronoiVariant::Cells);
        let mut rng = Rng::from_seed(5);
        let sites = scatter(&p, &mut rng, 500);
        let margin = p.long_side() * MARGIN;
        let mut outside = 0;
        for site in &sites {
            let (x, y) = site.position;
            assert!(x >= -margin && x <= f64::from(p.width) + margin);
            assert!(y >= -margin && y <= f64::from(p.height) + margin);
            if x < 0.0 || x > f64::from(p.width) || y < 0.0 || y > f64::from(p.height) {
                outside += 1;
            }
        }
        // Margin area is a decent share of the scatter region, so some sites
        // must land there.
        assert!(outside > 0);
    }

    #[test]
    fn test_nearest_site_at_site_position() {
        let sites = vec![
            Site {
                position: (10.0, 10.0),
                color: Color::new(1, 0, 0),
            },
            Site {
                position: (50.0, 50.0),
                color: Color::new(0, 1, 0),
            },
        ];
        // Coinciding exactly with a site must resolve to that site, not NaN.
        assert_eq!(nearest_site(&sites, (10.0, 10.0)), 0);
        assert_eq!(nearest_site(&sites, (50.0, 50.0)), 1);
        assert_eq!(nearest_site(&sites, (12.0, 11.0)), 0);
    }

    #[test]
    fn test_cell_polygon_boundary_accuracy() {
        // Two sites: the bisector is x = 30. Boundary points on rays aimed
        // at the other site must land within tolerance of it.
        let sites = vec![
            Site {
                position: (20.0, 40.0),
                color: Color::new(1, 0, 0),
            },
            Site {
                position: (40.0, 40.0),
                color: Color::new(0, 1, 0),
            },
        ];
        let points = cell_polygon(&sites, 0, 200.0);
        assert_eq!(points.len(), RAYS);
        // Ray 0 points in +x, straight at the other site.
        let (bx, by) = points[0];
        assert!((bx - 30.0).abs() <= TOLERANCE, "boundary x = {bx}");
        assert!((by - 40.0).abs() < 1e-9);
        // All boundary points are at least as close to the own site.
        for &p in &points {
            let d0 = dist(p, sites[0].position);
            let d1 = dist(p, sites[1].position);
            assert!(d0 <= d1 + TOLERANCE, "point {p:?}: {d0} vs {d1}");
        }
    }

    #[test]
    fn test_inset_polygon_moves_toward_center() {
        let center = (10.0, 10.0);
        let square = [(0.0, 0.0), (20.0, 0.0), (20.0, 20.0), (0.0, 20.0)];
        let inset = inset_polygon(&square, center, 2.0);
        for (orig, moved) in square.iter().zip(&inset) {
            let before = dist(*orig, center);
            let after = dist(*moved, center);
            assert!((before - after - 2.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_cells_variant_is_exact_partition() {
        let p = params(VoronoiVariant::Cells);
        let mut dt = DrawTarget::new(p.width, p.height);
        crate::canvas::clear(&mut dt, p.palette.background);
        let mut rng = Rng::from_seed(p.seed);
        render(&mut dt, &p, &mut rng, VoronoiVariant::Cells, &mut sink()).unwrap();

        // Recompute the expected owner of every pixel and compare.
        let mut check_rng = Rng::from_seed(p.seed);
        let sites = scatter(&p, &mut check_rng, site_count(&p));
        let data = dt.get_data();
        for y in 0..p.height as usize {
            for x in 0..p.width as usize {
                let idx = nearest_site(&sites, (x as f64 + 0.5, y as f64 + 0.5));
                assert_eq!(
                    data[y * p.width as usize + x],
                    opaque_pixel(sites[idx].color),
                    "pixel ({x}, {y})"
                );
            }
        }
    }

    #[test]
    fn test_all_variants_render() {
        for variant in VoronoiVariant::all() {
            let p = params(*variant);
            let mut dt = DrawTarget::new(p.width, p.height);
            crate::canvas::clear(&mut dt, p.palette.background);
            let bg = opaque_pixel(p.palette.background);
            let mut rng = Rng::from_seed(p.seed);
            render(&mut dt, &p, &mut rng, *variant, &mut sink()).unwrap();
            let touched = dt.get_data().iter().filter(|&&px| px != bg).count();
            assert!(touched > 0, "{variant:?} drew nothing");
        }
    }
}
