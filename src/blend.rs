//! Per-pixel radial-influence blending: blobs, metaballs, point lights,
//! Bezier ribbons, and sine-sum plasma.
//!
//! Every output pixel independently evaluates a field value from each
//! scattered primitive and blends toward that primitive's color, composited
//! over the background. A small coordinate jitter from the fractal noise
//! field breaks up perfectly circular silhouettes. Pixels are written one
//! scanline at a time; each is a pure function of the primitive list, so
//! scanlines are the natural parallel (and cancellation) boundary.

use raqote::DrawTarget;

use crate::art::{emit, EventSink, Phase, RenderEvent};
use crate::canvas::opaque_pixel;
use crate::color::{ramp, Color};
use crate::math::{dist, pi, rescale, smoothstep};
use crate::noise::fractal_noise;
use crate::params::{BlendVariant, Error, Params};
use crate::rand::Rng;

/// Polyline samples per ribbon spine.
const RIBBON_SAMPLES: usize = 32;

#[derive(Debug, Copy, Clone)]
struct Blob {
    center: (f64, f64),
    radius: f64,
    color: Color,
}

#[derive(Debug, Clone)]
struct Ribbon {
    /// Points sampled along a quadratic Bezier spine.
    spine: Vec<(f64, f64)>,
    sigma: f64,
    color: Color,
}

struct PlasmaWaves {
    freq: [f64; 3],
    phase: [f64; 3],
    center: (f64, f64),
    radial_freq: f64,
}

enum FieldSet {
    Blobs(Vec<Blob>),
    Metaballs(Vec<Blob>),
    Lights(Vec<Blob>),
    Ribbons(Vec<Ribbon>),
    Plasma(PlasmaWaves),
}

/// Number of scattered primitives for a parameter set.
pub fn primitive_count(params: &Params) -> usize {
    3 + (params.complexity * 9.0) as usize
}

fn scatter_blobs(params: &Params, rng: &mut Rng, radius_range: (f64, f64)) -> Vec<Blob> {
    let w = f64::from(params.width);
    let h = f64::from(params.height);
    let long = params.long_side();
    (0..primitive_count(params))
        .map(|_| Blob {
            center: (rng.uniform(0.0, w), rng.uniform(0.0, h)),
            radius: long * rng.uniform(radius_range.0, radius_range.1),
            color: *rng.choice(&params.palette.colors),
        })
        .collect()
}

impl FieldSet {
    fn build(params: &Params, rng: &mut Rng, variant: BlendVariant) -> FieldSet {
        match variant {
            BlendVariant::Blobs => FieldSet::Blobs(scatter_blobs(params, rng, (0.12, 0.3))),
            BlendVariant::Lava => FieldSet::Metaballs(scatter_blobs(params, rng, (0.08, 0.18))),
            BlendVariant::Lights => FieldSet::Lights(scatter_blobs(params, rng, (0.18, 0.45))),
            BlendVariant::Ribbons => {
                let w = f64::from(params.width);
                let h = f64::from(params.height);
                let ribbons = (0..primitive_count(params).min(7))
                    .map(|_| {
                        let p0 = (rng.uniform(-w * 0.1, w * 0.3), rng.uniform(0.0, h));
                        let p1 = (rng.uniform(w * 0.2, w * 0.8), rng.uniform(-h * 0.2, h * 1.2));
                        let p2 = (rng.uniform(w * 0.7, w * 1.1), rng.uniform(0.0, h));
                        let spine = (0..=RIBBON_SAMPLES)
                            .map(|s| {
                                let t = s as f64 / RIBBON_SAMPLES as f64;
                                let u = 1.0 - t;
                                (
                                    u * u * p0.0 + 2.0 * u * t * p1.0 + t * t * p2.0,
                                    u * u * p0.1 + 2.0 * u * t * p1.1 + t * t * p2.1,
                                )
                            })
                            .collect();
                        Ribbon {
                            spine,
                            sigma: params.long_side() * rng.uniform(0.02, 0.06),
                            color: *rng.choice(&params.palette.colors),
                        }
                    })
                    .collect();
                FieldSet::Ribbons(ribbons)
            }
            BlendVariant::Plasma => FieldSet::Plasma(PlasmaWaves {
                freq: [
                    rng.uniform(2.0, 5.0),
                    rng.uniform(2.0, 5.0),
                    rng.uniform(1.5, 4.0),
                ],
                phase: [
                    rng.uniform(0.0, pi(2.0)),
                    rng.uniform(0.0, pi(2.0)),
                    rng.uniform(0.0, pi(2.0)),
                ],
                center: (rng.uniform(0.25, 0.75), rng.uniform(0.25, 0.75)),
                radial_freq: rng.uniform(4.0, 9.0),
            }),
        }
    }

    /// Color of the pixel at `p` (already jittered), over `background`.
    fn color_at(&self, p: (f64, f64), params: &Params, background: Color) -> Color {
        match self {
            FieldSet::Blobs(blobs) => {
                let mut color = background;
                for blob in blobs {
                    let d = dist(p, blob.center);
                    if d < blob.radius {
                        // Cosine window: 1 at the center, 0 at the rim.
                        let w = 0.5 * (1.0 + (pi(1.0) * d / blob.radius).cos());
                        color = color.lerp(blob.color, w * 0.85);
                    }
                }
                color
            }
            FieldSet::Metaballs(blobs) => {
                // Classic reciprocal-square field summed over all balls.
                let field: f64 = blobs
                    .iter()
                    .map(|b| {
                        let d = dist(p, b.center);
                        (b.radius * b.radius) / (d * d)
                    })
                    .sum();
                let v = smoothstep((field - 0.8) / 1.2);
                if v <= 0.0 {
                    background
                } else {
                    let heat = ramp(&params.palette.colors, (field / 3.0).min(1.0));
                    background.lerp(heat, v)
                }
            }
            FieldSet::Lights(lights) => {
                let mut color = background;
                for light in lights {
                    let d = dist(p, light.center);
                    // Linear falloff to the spotlight radius.
                    let w = (1.0 - d / light.radius).max(0.0);
                    color = color.lerp(light.color.lighten(0.25), w * 0.8);
                }
                color
            }
            FieldSet::Ribbons(ribbons) => {
                let mut color = background;
                for ribbon in ribbons {
                    let d = ribbon
                        .spine
                        .iter()
                        .map(|&s| dist(p, s))
                        .fold(f64::INFINITY, f64::min);
                    let w = (-(d / ribbon.sigma).powi(2)).exp();
                    color = color.lerp(ribbon.color, w * 0.9);
                }
                color
            }
            FieldSet::Plasma(waves) => {
                let nx = p.0 / f64::from(params.width.max(1));
                let ny = p.1 / f64::from(params.height.max(1));
                let v1 = (nx * waves.freq[0] * pi(2.0) + waves.phase[0]).sin();
                let v2 = (ny * waves.freq[1] * pi(2.0) + waves.phase[1]).sin();
                let v3 = ((nx + ny) * waves.freq[2] * pi(1.0) + waves.phase[2]).sin();
                let r = dist((nx, ny), waves.center);
                let v4 = (r * waves.radial_freq).sin();
                let v = (v1 + v2 + v3 + v4) / 4.0;
                ramp(&params.palette.colors, rescale(v, (-1.0, 1.0), (0.0, 1.0)))
            }
        }
    }
}

pub fn render(
    dt: &mut DrawTarget,
    params: &Params,
    rng: &mut Rng,
    variant: BlendVariant,
    events: &mut EventSink,
) -> Result<(), Error> {
    let fields = FieldSet::build(params, rng, variant);
    let jitter_seed_x = rng.bits();
    let jitter_seed_y = rng.bits();
    let jitter_amp = params.cell_size() * (0.1 + 0.5 * params.complexity);
    let jitter_freq = 4.0 / params.long_side();
    let background = params.palette.background;

    let width = params.width as usize;
    let height = params.height as usize;
    for y in 0..height {
        {
            let data = dt.get_data_mut();
            for x in 0..width {
                let p = (x as f64 + 0.5, y as f64 + 0.5);
                // Noise-driven jitter so silhouettes are not mechanically
                // round.
                let jx = fractal_noise(p.0 * jitter_freq, p.1 * jitter_freq, jitter_seed_x, 2);
                let jy = fractal_noise(p.0 * jitter_freq, p.1 * jitter_freq, jitter_seed_y, 2);
                let q = (
                    p.0 + (jx - 0.5) * 2.0 * jitter_amp,
                    p.1 + (jy - 0.5) * 2.0 * jitter_amp,
                );
                let color = fields.color_at(q, params, background);
                data[y * width + x] = opaque_pixel(color);
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

#[cfg(test)]
mod test {
    use super::*;
    use crate::color::Palette;
    use crate::params::Style;
    use std::ops::ControlFlow;

    fn params(variant: BlendVariant) -> Params {
        Params {
            seed: 47,
            palette: Palette::new(
                vec![
                    Color::new(250, 90, 50),
                    Color::new(250, 200, 60),
                    Color::new(240, 240, 230),
                ],
                Color::new(20, 10, 30),
            ),
            width: 48,
            height: 40,
            grid_density: 5,
            style: Style::Blend(variant),
            complexity: 0.5,
        }
    }

    #[test]
    fn test_primitive_count_scales() {
        let mut p = params(BlendVariant::Blobs);
        p.complexity = 0.0;
        let low = primitive_count(&p);
        p.complexity = 1.0;
        let high = primitive_count(&p);
        assert_eq!(low, 3);
        assert_eq!(high, 12);
        assert!(high > low);
    }

    #[test]
    fn test_blob_field_at_center_and_rim() {
        let blob = Blob {
            center: (20.0, 20.0),
            radius: 10.0,
            color: Color::new(255, 0, 0),
        };
        let p = params(BlendVariant::Blobs);
        let field = FieldSet::Blobs(vec![blob]);
        let bg = Color::new(0, 0, 0);
        let center = field.color_at((20.0, 20.0), &p, bg);
        // Full cosine-window weight at the center: 85% toward the blob.
        assert_eq!(center, bg.lerp(blob.color, 0.85));
        // Outside the radius the background is untouched.
        assert_eq!(field.color_at((40.0, 20.0), &p, bg), bg);
    }

    #[test]
    fn test_metaball_field_is_finite_at_center() {
        // A sample point coinciding exactly with a ball center must not
        // produce NaN or a non-finite blend; the epsilon distance guard
        // caps the field and the smoothstep clamps it into range.
        let blob = Blob {
            center: (20.0, 20.0),
            radius: 8.0,
            color: Color::new(255, 0, 0),
        };
        let p = params(BlendVariant::Lava);
        let field = FieldSet::Metaballs(vec![blob]);
        let at_center = field.color_at((20.0, 20.0), &p, p.palette.background);
        // Field is enormous there, so the pixel saturates to the ramp top.
        assert_eq!(at_center, ramp(&p.palette.colors, 1.0));
    }

    #[test]
    fn test_lights_brighten_monotonically_toward_center() {
        let light = Blob {
            center: (20.0, 20.0),
            radius: 15.0,
            color: Color::new(200, 200, 180),
        };
        let p = params(BlendVariant::Lights);
        let field = FieldSet::Lights(vec![light]);
        let bg = Color::new(10, 10, 10);
        let lum = |c: Color| u32::from(c.r) + u32::from(c.g) + u32::from(c.b);
        let near = lum(field.color_at((21.0, 20.0), &p, bg));
        let mid = lum(field.color_at((28.0, 20.0), &p, bg));
        let far = lum(field.color_at((40.0, 20.0), &p, bg));
        assert!(near > mid);
        assert!(mid > far);
        assert_eq!(far, lum(bg));
    }

    #[test]
    fn test_ribbon_distance_falloff() {
        let ribbon = Ribbon {
            spine: vec![(0.0, 20.0), (24.0, 20.0), (48.0, 20.0)],
            sigma: 4.0,
            color: Color::new(255, 255, 255),
        };
        let p = params(BlendVariant::Ribbons);
        let field = FieldSet::Ribbons(vec![ribbon]);
        let bg = Color::new(0, 0, 0);
        let on = field.color_at((24.0, 20.0), &p, bg);
        let off = field.color_at((24.0, 39.0), &p, bg);
        assert!(on.r > 200, "on-spine pixel should be near white: {on:?}");
        assert_eq!(off, bg, "far pixel should stay background");
    }

    #[test]
    fn test_plasma_uses_full_ramp() {
        let p = params(BlendVariant::Plasma);
        let mut rng = Rng::from_seed(p.seed);
        let field = FieldSet::build(&p, &mut rng, BlendVariant::Plasma);
        let mut distinct = std::collections::HashSet::new();
        for y in 0..p.height {
            for x in 0..p.width {
                let c = field.color_at(
                    (f64::from(x) + 0.5, f64::from(y) + 0.5),
                    &p,
                    p.palette.background,
                );
                distinct.insert(c);
            }
        }
        // A wave interference pattern sweeps a wide range of ramp colors.
        assert!(distinct.len() > 16, "only {} distinct colors", distinct.len());
    }

    #[test]
    fn test_all_variants_render_every_pixel() {
        for variant in BlendVariant::all() {
            let p = params(*variant);
            let mut dt = DrawTarget::new(p.width, p.height);
            // Deliberately junk initial contents: the per-pixel pass must
            // write every pixel.
            crate::canvas::clear(&mut dt, Color::new(1, 2, 3));
            let mut rng = Rng::from_seed(p.seed);
            render(&mut dt, &p, &mut rng, *variant, &mut |_| {
                ControlFlow::Continue(())
            })
            .unwrap();
            let junk = opaque_pixel(Color::new(1, 2, 3));
            for (i, &px) in dt.get_data().iter().enumerate() {
                assert!(px >> 24 == 0xff, "pixel {i} not opaque");
                assert_ne!(px, junk, "pixel {i} never written");
            }
        }
    }
}
