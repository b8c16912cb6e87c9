//! Height-field contour renderer.
//!
//! Samples a scalar field on a coarse grid, then extracts iso-contour
//! segments with the simplified two-segment-per-cell marching squares:
//! each grid cell's edges are checked for threshold crossings located by
//! linear interpolation, and matching crossings are joined with straight
//! segments. Ambiguous four-crossing cells draw both diagonal segments
//! independently, with no saddle resolution; this can occasionally render a
//! crossed contour where a resolved saddle would not, and is kept that way.
//!
//! Every variant is the same extraction over a different scalar function.

use raqote::DrawTarget;

use crate::art::{emit, EventSink, Phase, RenderEvent};
use crate::canvas::{fill_rect, polyline, solid, stroke, stroke_path};
use crate::color::{ramp, Color};
use crate::math::{dist, lerp, pi};
use crate::noise::fractal_noise;
use crate::params::{ContourVariant, Error, Params};
use crate::rand::Rng;

/// A sampled scalar field over the canvas.
pub struct Field {
    cols: usize,
    rows: usize,
    /// Sample spacing in canvas units.
    step: (f64, f64),
    values: Vec<f64>,
}

impl Field {
    /// Samples `f` on a `cols + 1` by `rows + 1` point grid spanning the
    /// canvas.
    pub fn sample(params: &Params, cols: usize, rows: usize, f: impl Fn(f64, f64) -> f64) -> Field {
        let step = (
            f64::from(params.width) / cols as f64,
            f64::from(params.height) / rows as f64,
        );
        let mut values = Vec::with_capacity((cols + 1) * (rows + 1));
        for j in 0..=rows {
            for i in 0..=cols {
                values.push(f(i as f64 * step.0, j as f64 * step.1));
            }
        }
        Field {
            cols,
            rows,
            step,
            values,
        }
    }

    fn value(&self, i: usize, j: usize) -> f64 {
        self.values[j * (self.cols + 1) + i]
    }

    /// Iso-contour segments for one threshold, over all grid cells.
    pub fn segments(&self, threshold: f64) -> Vec<((f64, f64), (f64, f64))> {
        let mut out = Vec::new();
        for j in 0..self.rows {
            for i in 0..self.cols {
                self.cell_segments(i, j, threshold, &mut out);
            }
        }
        out
    }

    fn cell_segments(
        &self,
        i: usize,
        j: usize,
        threshold: f64,
        out: &mut Vec<((f64, f64), (f64, f64))>,
    ) {
        let x0 = i as f64 * self.step.0;
        let y0 = j as f64 * self.step.1;
        let (x1, y1) = (x0 + self.step.0, y0 + self.step.1);
        // Corners clockwise from top-left; corner bit set when >= threshold.
        let v = [
            self.value(i, j),
            self.value(i + 1, j),
            self.value(i + 1, j + 1),
            self.value(i, j + 1),
        ];
        let case = (usize::from(v[0] >= threshold))
            | (usize::from(v[1] >= threshold) << 1)
            | (usize::from(v[2] >= threshold) << 2)
            | (usize::from(v[3] >= threshold) << 3);
        if case == 0 || case == 15 {
            return;
        }

        // Crossing point on each edge, by linear interpolation of the two
        // endpoint values.
        let cross = |va: f64, vb: f64| (threshold - va) / (vb - va);
        let top = || (lerp(x0, x1, cross(v[0], v[1])), y0);
        let right = || (x1, lerp(y0, y1, cross(v[1], v[2])));
        let bottom = || (lerp(x0, x1, cross(v[3], v[2])), y1);
        let left = || (x0, lerp(y0, y1, cross(v[0], v[3])));

        match case {
            1 | 14 => out.push((top(), left())),
            2 | 13 => out.push((top(), right())),
            3 | 12 => out.push((left(), right())),
            4 | 11 => out.push((right(), bottom())),
            6 | 9 => out.push((top(), bottom())),
            7 | 8 => out.push((left(), bottom())),
            // Ambiguous saddles: both diagonal segments, drawn independently.
            5 => {
                out.push((top(), left()));
                out.push((right(), bottom()));
            }
            10 => {
                out.push((top(), right()));
                out.push((left(), bottom()));
            }
            _ => unreachable!("cases 0 and 15 returned early"),
        }
    }
}

/// Evenly spaced interior thresholds `1/k .. (k-1)/k`. Doubling `k` refines
/// the set without dropping any existing threshold, so the drawn segment
/// count is non-decreasing in `k`.
pub fn thresholds(k: u32) -> Vec<f64> {
    (1..k).map(|l| f64::from(l) / f64::from(k)).collect()
}

/// Threshold count for a complexity setting.
pub fn level_count(complexity: f64) -> u32 {
    4 + (complexity * 12.0) as u32
}

/// Builds the scalar function for a variant. Consumes a fixed amount of
/// entropy regardless of variant so sibling variants with the same seed stay
/// comparable.
fn scalar_field(
    params: &Params,
    rng: &mut Rng,
    variant: ContourVariant,
) -> Box<dyn Fn(f64, f64) -> f64> {
    let seed = rng.bits();
    let long = params.long_side();
    let octaves = 2 + (params.complexity * 3.0) as u32;
    let freq = 3.0 / long;
    let noise = move |x: f64, y: f64| fractal_noise(x * freq, y * freq, seed, octaves);

    // Scattered feature centers for the multi-center variants.
    let centers: Vec<(f64, f64, f64)> = (0..4)
        .map(|_| {
            let x = rng.uniform(0.0, f64::from(params.width));
            let y = rng.uniform(0.0, f64::from(params.height));
            let strength = rng.uniform(0.5, 1.0);
            (x, y, strength)
        })
        .collect();
    let phase = rng.uniform(0.0, pi(2.0));

    match variant {
        ContourVariant::Topo | ContourVariant::Bands | ContourVariant::Thermal => Box::new(noise),
        ContourVariant::Ridges => {
            // Fold the field about its midline for sharp crests.
            Box::new(move |x, y| 1.0 - (2.0 * noise(x, y) - 1.0).abs())
        }
        ContourVariant::Islands => {
            // Radial peaks on a low noise floor.
            let radius = long * 0.28;
            Box::new(move |x, y| {
                let bumps: f64 = centers
                    .iter()
                    .map(|&(cx, cy, s)| {
                        let d = dist((x, y), (cx, cy));
                        let t = (1.0 - d / radius).max(0.0);
                        s * t * t
                    })
                    .sum();
                (0.35 * noise(x, y) + bumps).min(1.0)
            })
        }
        ContourVariant::Interference => {
            // Circular waves radiating from each center.
            let wavelength = long / 14.0;
            let n = centers.len() as f64;
            Box::new(move |x, y| {
                let sum: f64 = centers
                    .iter()
                    .map(|&(cx, cy, s)| s * (dist((x, y), (cx, cy)) / wavelength * pi(2.0) + phase).sin())
                    .sum();
                0.5 + sum / (2.0 * n)
            })
        }
        ContourVariant::Magnetic => {
            // Dipole potential: opposite poles at the first two centers.
            let pole_a = (centers[0].0, centers[0].1);
            let pole_b = (centers[1].0, centers[1].1);
            let scale = long * 0.12;
            Box::new(move |x, y| {
                let p = (x, y);
                let v = scale / dist(p, pole_a) - scale / dist(p, pole_b);
                0.5 + 0.5 * v.tanh()
            })
        }
    }
}

pub fn render(
    dt: &mut DrawTarget,
    params: &Params,
    rng: &mut Rng,
    variant: ContourVariant,
    events: &mut EventSink,
) -> Result<(), Error> {
    let field_fn = scalar_field(params, rng, variant);
    let cols = (params.grid_density as usize * 6).max(8);
    let rows = ((cols as f64 * f64::from(params.height) / f64::from(params.width)) as usize).max(8);
    let field = Field::sample(params, cols, rows, |x, y| field_fn(x, y));

    let colors = &params.palette.colors;
    let levels = thresholds(level_count(params.complexity));
    let total = levels.len() as u32;

    let filled = matches!(variant, ContourVariant::Bands | ContourVariant::Thermal);
    if filled {
        // Filled elevation bands: paint each grid cell by its mean value
        // before tracing the band boundaries.
        let band_color = |v: f64| -> Color {
            match variant {
                ContourVariant::Thermal => ramp(colors, v),
                _ => {
                    let band = (v * levels.len() as f64) as usize;
                    colors[band % colors.len()]
                }
            }
        };
        for j in 0..rows {
            for i in 0..cols {
                let mean = (field.value(i, j)
                    + field.value(i + 1, j)
                    + field.value(i + 1, j + 1)
                    + field.value(i, j + 1))
                    / 4.0;
                fill_rect(
                    dt,
                    i as f64 * field.step.0,
                    j as f64 * field.step.1,
                    field.step.0 + 0.5,
                    field.step.1 + 0.5,
                    &solid(band_color(mean)),
                );
            }
        }
    }

    let width = (params.cell_size() * 0.04).clamp(0.8, 2.5);
    let style = stroke(width);
    for (l, &threshold) in levels.iter().enumerate() {
        let color = if filled {
            params.palette.background.darken(0.4)
        } else {
            colors[l % colors.len()]
        };
        let source = solid(color);
        for (a, b) in field.segments(threshold) {
            stroke_path(dt, &polyline(&[a, b]), &source, &style);
        }
        emit(
            events,
            RenderEvent {
                phase: Phase::Levels,
                completed: (l + 1) as u32,
                total,
            },
        )?;
    }
    Ok(())
}
