//! Layered parallax terrain renderer.
//!
//! Each depth layer is a sampled skyline curve rendered as a filled polygon
//! from the curve down to the canvas bottom, painted back to front. Layers
//! are strictly ordered by baseline height, so the painter's algorithm needs
//! no depth buffer. Specialized variants layer in a sun glow, stars, aurora
//! ribbons, or a mirrored reflection of the same curve points.

use raqote::DrawTarget;

use crate::art::{emit, EventSink, Phase, RenderEvent};
use crate::canvas::{
    circle, fill, linear_gradient, polygon, radial_gradient, solid, solid_alpha,
};
use crate::color::Color;
use crate::math::lerp;
use crate::noise::fractal_noise;
use crate::params::{Error, Params, TerrainVariant};
use crate::rand::Rng;

/// Number of depth layers for a complexity setting.
pub fn layer_count(complexity: f64) -> u32 {
    3 + (complexity * 4.0) as u32
}

/// One skyline: `y` per sample column, plus the layer's fill color.
struct Layer {
    curve: Vec<(f64, f64)>,
    color: Color,
}

/// Samples a skyline wave curve across the canvas width. Jagged curves get
/// sharp synthetic peaks stamped onto the smooth noise base.
fn skyline(
    params: &Params,
    rng: &mut Rng,
    baseline: f64,
    amplitude: f64,
    jagged: bool,
) -> Vec<(f64, f64)> {
    let w = f64::from(params.width);
    let seed = rng.bits();
    let freq = (2.0 + params.complexity * 3.0) / w;
    let row = rng.uniform(0.0, 64.0);

    // Triangular peaks at randomized positions.
    let peaks: Vec<(f64, f64, f64)> = if jagged {
        (0..3)
            .map(|_| {
                let x = rng.uniform(0.0, w);
                let height = amplitude * rng.uniform(0.8, 1.8);
                let half_width = w * rng.uniform(0.04, 0.12);
                (x, height, half_width)
            })
            .collect()
    } else {
        Vec::new()
    };

    let samples = (params.width / 3).max(8) as usize;
    (0..=samples)
        .map(|s| {
            let x = w * s as f64 / samples as f64;
            let mut y = baseline - amplitude * fractal_noise(x * freq, row, seed, 4);
            for &(px, height, half_width) in &peaks {
                let t = (1.0 - (x - px).abs() / half_width).max(0.0);
                y -= height * t;
            }
            (x, y)
        })
        .collect()
}

/// Builds all layers, farthest first. Baselines spread from just below the
/// horizon down toward the canvas bottom.
fn build_layers(params: &Params, rng: &mut Rng, horizon: f64, jagged: bool) -> Vec<Layer> {
    let h = f64::from(params.height);
    let count = layer_count(params.complexity);
    let colors = &params.palette.colors;
    (0..count)
        .map(|l| {
            let depth = f64::from(l) / f64::from(count.max(2) - 1).max(1.0);
            let baseline = lerp(horizon + h * 0.04, h * 0.96, depth);
            let amplitude = h * lerp(0.06, 0.16, depth) * (0.4 + 0.6 * params.complexity);
            let curve = skyline(params, rng, baseline, amplitude, jagged);
            // Distant layers fade toward the background for a haze effect.
            let base = colors[l as usize % colors.len()];
            let color = base.lerp(params.palette.background, 0.65 * (1.0 - depth));
            Layer { curve, color }
        })
        .collect()
}

/// Closes a skyline curve into a polygon down to `floor_y`.
fn skyline_polygon(curve: &[(f64, f64)], floor_y: f64) -> Vec<(f64, f64)> {
    let mut points = curve.to_vec();
    let last_x = curve.last().map_or(0.0, |p| p.0);
    let first_x = curve.first().map_or(0.0, |p| p.0);
    points.push((last_x, floor_y));
    points.push((first_x, floor_y));
    points
}

fn draw_sun(dt: &mut DrawTarget, params: &Params, rng: &mut Rng, horizon: f64) {
    let w = f64::from(params.width);
    let cx = rng.uniform(w * 0.2, w * 0.8);
    let cy = rng.uniform(horizon * 0.4, horizon * 0.9);
    let r = params.long_side() * 0.12;
    let core = *rng.choice(&params.palette.colors);
    // Soft glow twice the disc radius, then the disc itself.
    let glow = radial_gradient((cx, cy), r * 2.5, core.lighten(0.3), params.palette.background);
    fill(dt, &circle(cx, cy, r * 2.5), &glow);
    fill(dt, &circle(cx, cy, r), &solid(core.lighten(0.55)));
}

fn draw_stars(dt: &mut DrawTarget, params: &Params, rng: &mut Rng, horizon: f64) {
    let w = f64::from(params.width);
    let count = 20 + (params.complexity * 80.0) as u32;
    for _ in 0..count {
        let x = rng.uniform(0.0, w);
        let y = rng.uniform(0.0, horizon);
        let r = rng.uniform(0.4, 1.4);
        let twinkle = rng.uniform(0.55, 1.0);
        let color = Color::new(255, 255, 255).lerp(params.palette.background, 1.0 - twinkle);
        fill(dt, &circle(x, y, r), &solid(color));
    }
}

fn draw_aurora(dt: &mut DrawTarget, params: &Params, rng: &mut Rng, horizon: f64) {
    let w = f64::from(params.width);
    let bands = 2 + (params.complexity * 3.0) as u32;
    for _ in 0..bands {
        let color = *rng.choice(&params.palette.colors);
        let seed = rng.bits();
        let base_y = rng.uniform(horizon * 0.15, horizon * 0.7);
        let sway = horizon * rng.uniform(0.1, 0.25);
        let thickness = horizon * rng.uniform(0.12, 0.3);
        let samples = (params.width / 4).max(8) as usize;
        let top: Vec<(f64, f64)> = (0..=samples)
            .map(|s| {
                let x = w * s as f64 / samples as f64;
                let y = base_y + sway * (fractal_noise(x * 2.5 / w, 0.0, seed, 3) - 0.5) * 2.0;
                (x, y)
            })
            .collect();
        let mut ribbon = top.clone();
        for &(x, y) in top.iter().rev() {
            ribbon.push((x, y + thickness));
        }
        // Bright upper edge fading to nothing at the ribbon's underside.
        let gradient = linear_gradient(
            (0.0, base_y),
            (0.0, base_y + thickness),
            &[(0.0, color.lighten(0.2), 200), (1.0, color, 0)],
        );
        fill(dt, &polygon(&ribbon), &gradient);
    }
}

pub fn render(
    dt: &mut DrawTarget,
    params: &Params,
    rng: &mut Rng,
    variant: TerrainVariant,
    events: &mut EventSink,
) -> Result<(), Error> {
    let h = f64::from(params.height);
    let mirrored = variant == TerrainVariant::Reflection;
    let horizon = if mirrored { h * 0.55 } else { h * 0.38 };
    let jagged = variant == TerrainVariant::Peaks;

    match variant {
        TerrainVariant::Sunset => draw_sun(dt, params, rng, horizon),
        TerrainVariant::Night => draw_stars(dt, params, rng, horizon),
        TerrainVariant::Aurora => draw_aurora(dt, params, rng, horizon),
        _ => {}
    }

    // For the reflection variant all terrain sits above the horizon; the
    // water plane below it takes the mirrored copy.
    let floor_y = if mirrored { horizon } else { h };
    let layers = build_layers(params, rng, if mirrored { horizon * 0.3 } else { horizon }, jagged);
    let total = layers.len() as u32;

    if mirrored {
        let water = params.palette.background.darken(0.25);
        crate::canvas::fill_rect(
            dt,
            0.0,
            horizon,
            f64::from(params.width),
            h - horizon,
            &solid(water),
        );
    }

    for (l, layer) in layers.iter().enumerate() {
        // Clamp reflection-variant curves to the horizon so no skyline dips
        // into the water plane.
        let curve: Vec<(f64, f64)> = if mirrored {
            layer.curve.iter().map(|&(x, y)| (x, y.min(horizon))).collect()
        } else {
            layer.curve.clone()
        };
        fill(dt, &polygon(&skyline_polygon(&curve, floor_y)), &solid(layer.color));

        if mirrored {
            // Same curve points reflected about the horizon, at reduced
            // opacity.
            let reflected: Vec<(f64, f64)> =
                curve.iter().map(|&(x, y)| (x, 2.0 * horizon - y)).collect();
            fill(
                dt,
                &polygon(&skyline_polygon(&reflected, horizon)),
                &solid_alpha(layer.color, 90),
            );
        }

        emit(
            events,
            RenderEvent {
                phase: Phase::Layers,
                completed: (l + 1) as u32,
                total,
            },
        )?;
    }
    Ok(())
}
