//! Flow-field line integrator.
//!
//! A direction angle is derived at every point from the variant's scalar or
//! vector function; particles seeded at random positions step along the
//! field, accumulating either a continuous stroked streamline or a trail of
//! fading dots. Particle count, step length, and path length all scale
//! monotonically with complexity.

use raqote::DrawTarget;

use crate::art::{emit, EventSink, Phase, RenderEvent};
use crate::canvas::{circle, fill, polyline, solid, solid_alpha, stroke, stroke_path};
use crate::math::{add_polar_offset, angle, dist, pi};
use crate::noise::fractal_noise;
use crate::params::{Error, FlowVariant, Params};
use crate::rand::Rng;

/// Spacing used for the finite-difference curl derivative, in canvas units.
const CURL_EPS: f64 = 0.75;

/// Number of particles for a parameter set.
pub fn particle_count(params: &Params) -> u32 {
    let d = f64::from(params.grid_density);
    (d * d * (1.0 + 7.0 * params.complexity)) as u32 + 8
}

/// Integration step length in canvas units.
pub fn step_length(params: &Params) -> f64 {
    params.cell_size() * (0.06 + 0.10 * params.complexity)
}

/// Maximum steps per particle.
pub fn max_steps(params: &Params) -> u32 {
    24 + (params.complexity * 96.0) as u32
}

/// The direction field: angle in radians at any canvas point.
enum AngleField {
    /// Fractal noise mapped over two turns.
    Noise { seed: u32, freq: f64 },
    /// Divergence-free field from the noise gradient rotated a quarter
    /// turn; streamlines follow closed loops around noise extrema.
    Curl { seed: u32, freq: f64 },
    /// Distance-weighted pull toward several attractor points.
    Attractors { points: Vec<(f64, f64, f64)> },
    /// Twin-pole dipole: field of a source and a sink superimposed.
    Magnet { north: (f64, f64), south: (f64, f64) },
    /// Tangential spiral around the canvas center.
    Spiral { center: (f64, f64), swirl: f64 },
}

impl AngleField {
    fn build(params: &Params, rng: &mut Rng, variant: FlowVariant) -> AngleField {
        let long = params.long_side();
        let w = f64::from(params.width);
        let h = f64::from(params.height);
        match variant {
            FlowVariant::Streams | FlowVariant::Particles => AngleField::Noise {
                seed: rng.bits(),
                freq: (1.5 + params.complexity * 2.0) / long,
            },
            FlowVariant::Curl => AngleField::Curl {
                seed: rng.bits(),
                freq: (2.0 + params.complexity * 2.0) / long,
            },
            FlowVariant::Attractors => {
                let count = 2 + (rng.rnd() * 3.0) as usize;
                let points = (0..count)
                    .map(|_| {
                        (
                            rng.uniform(w * 0.1, w * 0.9),
                            rng.uniform(h * 0.1, h * 0.9),
                            rng.uniform(0.5, 1.5),
                        )
                    })
                    .collect();
                AngleField::Attractors { points }
            }
            FlowVariant::Magnet => AngleField::Magnet {
                north: (rng.uniform(w * 0.15, w * 0.45), rng.uniform(h * 0.2, h * 0.8)),
                south: (rng.uniform(w * 0.55, w * 0.85), rng.uniform(h * 0.2, h * 0.8)),
            },
            FlowVariant::Spiral => AngleField::Spiral {
                center: (w / 2.0, h / 2.0),
                swirl: rng.uniform(0.25, 0.75) * if rng.odds(0.5) { 1.0 } else { -1.0 },
            },
        }
    }

    /// Direction angle at `p`.
    fn theta(&self, p: (f64, f64)) -> f64 {
        match *self {
            AngleField::Noise { seed, freq } => {
                fractal_noise(p.0 * freq, p.1 * freq, seed, 3) * pi(4.0)
            }
            AngleField::Curl { seed, freq } => {
                let n = |x: f64, y: f64| fractal_noise(x * freq, y * freq, seed, 3);
                let dn_dx = (n(p.0 + CURL_EPS, p.1) - n(p.0 - CURL_EPS, p.1)) / (2.0 * CURL_EPS);
                let dn_dy = (n(p.0, p.1 + CURL_EPS) - n(p.0, p.1 - CURL_EPS)) / (2.0 * CURL_EPS);
                // Rotate the gradient 90 degrees: (dn/dy, -dn/dx).
                (-dn_dx).atan2(dn_dy)
            }
            AngleField::Attractors { ref points } => {
                let (mut vx, mut vy) = (0.0, 0.0);
                for &(ax, ay, weight) in points {
                    let d = dist(p, (ax, ay));
                    vx += weight * (ax - p.0) / (d * d);
                    vy += weight * (ay - p.1) / (d * d);
                }
                vy.atan2(vx)
            }
            AngleField::Magnet { north, south } => {
                let dn = dist(p, north);
                let ds = dist(p, south);
                let vx = (p.0 - north.0) / (dn * dn * dn) - (p.0 - south.0) / (ds * ds * ds);
                let vy = (p.1 - north.1) / (dn * dn * dn) - (p.1 - south.1) / (ds * ds * ds);
                vy.atan2(vx)
            }
            AngleField::Spiral { center, swirl } => {
                angle(center, p) + pi(0.5) + swirl * pi(0.5)
            }
        }
    }
}

pub fn render(
    dt: &mut DrawTarget,
    params: &Params,
    rng: &mut Rng,
    variant: FlowVariant,
    events: &mut EventSink,
) -> Result<(), Error> {
    let field = AngleField::build(params, rng, variant);
    let w = f64::from(params.width);
    let h = f64::from(params.height);
    let margin = params.long_side() * 0.05;
    let in_bounds =
        |(x, y): (f64, f64)| x >= -margin && x <= w + margin && y >= -margin && y <= h + margin;

    let total = particle_count(params);
    let step = step_length(params);
    let steps = max_steps(params);
    let trails = variant == FlowVariant::Particles;
    let line_width = (params.cell_size() * 0.03).clamp(0.6, 2.0);

    for particle in 0..total {
        let color = *rng.choice(&params.palette.colors);
        let mut p = (rng.uniform(-margin, w + margin), rng.uniform(-margin, h + margin));
        let mut path = Vec::with_capacity(steps as usize + 1);
        path.push(p);
        for _ in 0..steps {
            let theta = field.theta(p);
            p = add_polar_offset(p, theta, step);
            if !in_bounds(p) {
                break;
            }
            path.push(p);
        }

        if trails {
            // Dots fading linearly with step index.
            let n = path.len();
            for (i, &(x, y)) in path.iter().enumerate() {
                let fade = 1.0 - i as f64 / n as f64;
                let alpha = (220.0 * fade) as u8;
                if alpha > 4 {
                    fill(dt, &circle(x, y, line_width), &solid_alpha(color, alpha));
                }
            }
        } else if path.len() > 1 {
            stroke_path(dt, &polyline(&path), &solid(color), &stroke(line_width));
        }

        emit(
            events,
            RenderEvent {
                phase: Phase::Particles,
                completed: particle + 1,
                total,
            },
        )?;
    }
    Ok(())
}
