use std::f64::consts::PI;

#[inline(always)]
pub fn pi(v: f64) -> f64 {
    PI * v
}

/// Floor-style modulo: the result always has the sign of `m`.
pub fn modulo(n: f64, m: f64) -> f64 {
    ((n % m) + m) % m
}

pub fn rescale(value: f64, (old_min, old_max): (f64, f64), (new_min, new_max): (f64, f64)) -> f64 {
    let clamped = value.clamp(old_min, old_max);
    let old_spread = old_max - old_min;
    let new_spread = new_max - new_min;
    new_min + (clamped - old_min) * (new_spread / old_spread)
}

#[inline(always)]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Cubic Hermite ramp, `3t^2 - 2t^3`, clamped to [0, 1].
#[inline(always)]
pub fn smoothstep(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Smallest distance treated as nonzero. Distances below this are clamped so
/// that falloff and direction computations never divide by zero or emit NaN.
pub const EPSILON: f64 = 1e-9;

/// Computes the distance between two points, clamped to at least [`EPSILON`].
pub fn dist((x1, y1): (f64, f64), (x2, y2): (f64, f64)) -> f64 {
    let dx = x1 - x2;
    let dy = y1 - y2;
    (dx * dx + dy * dy).sqrt().max(EPSILON)
}

/// Computes the angle from `(x1, y1)` to `(x2, y2)`, as a value in radians from 0 to 2*pi.
pub fn angle((x1, y1): (f64, f64), (x2, y2): (f64, f64)) -> f64 {
    modulo((y2 - y1).atan2(x2 - x1), pi(2.0))
}

pub fn add_polar_offset((x, y): (f64, f64), theta: f64, r: f64) -> (f64, f64) {
    (x + r * theta.cos(), y + r * theta.sin())
}
