//! Seeded continuous noise field.
//!
//! The lattice hash uses integer mixing only (no `sin()`-based hashing), so
//! noise values are bit-identical across platforms. Smoothed value noise
//! interpolates lattice corners with a cubic Hermite weight, which keeps the
//! field continuous across integer lattice boundaries; several renderers
//! depend on that when they sample at adjacent offsets to estimate local
//! derivatives.

use crate::math::{lerp, smoothstep};

/// Hash of an integer lattice point, uniform in [0, 1).
pub fn lattice(ix: i64, iy: i64, seed: u32) -> f64 {
    let mut h = (ix as u64).wrapping_mul(0x9E3779B97F4A7C15)
        ^ (iy as u64).wrapping_mul(0xC2B2AE3D27D4EB4F)
        ^ u64::from(seed).wrapping_mul(0x165667B19E3779F9)
        ^ 0x5851F42D4C957F2D;
    h = (h ^ (h >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    h = (h ^ (h >> 27)).wrapping_mul(0x94D049BB133111EB);
    h ^= h >> 31;
    (h >> 11) as f64 * 2.0f64.powi(-53)
}

/// Smoothed value noise: bilinear blend of the four surrounding lattice
/// hashes with smoothstep weights. Continuous everywhere, equal to the raw
/// hash at integer points.
pub fn smooth_noise(x: f64, y: f64, seed: u32) -> f64 {
    let x0 = x.floor();
    let y0 = y.floor();
    let ix = x0 as i64;
    let iy = y0 as i64;
    let tx = smoothstep(x - x0);
    let ty = smoothstep(y - y0);
    let n00 = lattice(ix, iy, seed);
    let n10 = lattice(ix + 1, iy, seed);
    let n01 = lattice(ix, iy + 1, seed);
    let n11 = lattice(ix + 1, iy + 1, seed);
    lerp(lerp(n00, n10, tx), lerp(n01, n11, tx), ty)
}

/// Multi-octave fractal noise: `octaves` layers of [`smooth_noise`] at
/// doubling frequency and halving amplitude, normalized by the amplitude sum
/// so the result stays in [0, 1). Each octave reseeds the lattice so the
/// layers are uncorrelated. `octaves == 0` is treated as 1.
pub fn fractal_noise(x: f64, y: f64, seed: u32, octaves: u32) -> f64 {
    let octaves = octaves.max(1);
    let mut freq = 1.0;
    let mut amp = 1.0;
    let mut sum = 0.0;
    let mut norm = 0.0;
    for octave in 0..octaves {
        let octave_seed = seed.wrapping_add(octave.wrapping_mul(0x9E3779B9));
        sum += amp * smooth_noise(x * freq, y * freq, octave_seed);
        norm += amp;
        freq *= 2.0;
        amp *= 0.5;
    }
    sum / norm
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_lattice_values() {
        assert_eq!(lattice(0, 0, 0), 0.9489460709013995);
        assert_eq!(lattice(1, 0, 0), 0.6387858045656954);
        assert_eq!(lattice(0, 1, 0), 0.7290657231931271);
        assert_eq!(lattice(-1, -1, 12345), 0.5449541686044977);
    }

    #[test]
    fn test_lattice_range() {
        for i in -100..100 {
            for j in -100..100 {
                let v = lattice(i, j, 7);
                assert!((0.0..1.0).contains(&v), "lattice({i}, {j}) = {v}");
            }
        }
    }

    #[test]
    fn test_smooth_noise_values() {
        assert_eq!(smooth_noise(0.5, 0.5, 7), 0.449036182131619);
        assert_eq!(smooth_noise(3.25, -1.75, 7), 0.45448770368225855);
    }

    #[test]
    fn test_smooth_noise_hits_lattice_at_integers() {
        assert_eq!(smooth_noise(2.0, 3.0, 7), lattice(2, 3, 7));
        assert_eq!(smooth_noise(-4.0, 0.0, 99), lattice(-4, 0, 99));
    }

    #[test]
    fn test_fractal_noise_values() {
        // One octave is plain smooth noise.
        assert_eq!(fractal_noise(0.5, 0.5, 7, 1), smooth_noise(0.5, 0.5, 7));
        assert_eq!(fractal_noise(0.5, 0.5, 7, 0), fractal_noise(0.5, 0.5, 7, 1));
        assert_eq!(fractal_noise(1.6, 2.7, 7, 4), 0.5538599468939793);
        assert_eq!(fractal_noise(-3.2, 4.1, 99, 6), 0.5305278682160014);
    }

    #[test]
    fn test_fractal_noise_range() {
        for i in 0..5000 {
            let v = fractal_noise(i as f64 * 0.173, i as f64 * 0.311, 3, 5);
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn test_continuity_across_lattice_boundaries() {
        // Sample pairs an epsilon apart, straddling integer boundaries among
        // other places. The octave sum has bounded slope, so deltas must be
        // proportional to epsilon: a lattice discontinuity would show up as a
        // jump many orders of magnitude larger than the bound.
        const EPS: f64 = 1e-4;
        const BOUND: f64 = 1e-2; // slope bound * EPS, with ample headroom
        for i in 0..2000 {
            let x = (i as f64 * 0.137) % 11.0 - 3.0;
            let y = (i as f64 * 0.251) % 7.0 - 2.0;
            let dx = (fractal_noise(x + EPS, y, 7, 4) - fractal_noise(x, y, 7, 4)).abs();
            let dy = (fractal_noise(x, y + EPS, 7, 4) - fractal_noise(x, y, 7, 4)).abs();
            assert!(dx < BOUND, "x-jump at ({x}, {y}): {dx}");
            assert!(dy < BOUND, "y-jump at ({x}, {y}): {dy}");
        }
        // And exactly at a boundary.
        let below = fractal_noise(1.0 - EPS, 2.5, 7, 4);
        let above = fractal_noise(1.0 + EPS, 2.5, 7, 4);
        assert!((below - above).abs() < BOUND);
    }

    #[test]
    fn test_seeds_decorrelate() {
        let a = fractal_noise(1.5, 2.5, 1, 4);
        let b = fractal_noise(1.5, 2.5, 2, 4);
        assert_ne!(a, b);
    }
}
