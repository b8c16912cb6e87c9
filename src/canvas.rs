//! Helpers over the raqote drawing surface shared by every renderer.

use raqote::{
    DrawOptions, DrawTarget, Gradient, GradientStop, LineCap, LineJoin, Path, PathBuilder, Point,
    SolidSource, Source, Spread, StrokeStyle,
};

use crate::color::Color;
use crate::math::pi;

/// A fully opaque solid source for `color`.
pub fn solid(color: Color) -> Source<'static> {
    solid_alpha(color, 255)
}

pub fn solid_alpha(color: Color, alpha: u8) -> Source<'static> {
    Source::Solid(SolidSource::from_unpremultiplied_argb(
        alpha, color.r, color.g, color.b,
    ))
}

pub fn clear(dt: &mut DrawTarget, color: Color) {
    dt.clear(SolidSource::from_unpremultiplied_argb(
        255, color.r, color.g, color.b,
    ));
}

/// The premultiplied ARGB word raqote stores for an opaque `color`. Used by
/// the per-pixel renderers writing straight into `get_data_mut()`.
pub fn opaque_pixel(color: Color) -> u32 {
    0xff00_0000 | (u32::from(color.r) << 16) | (u32::from(color.g) << 8) | u32::from(color.b)
}

pub fn polyline(points: &[(f64, f64)]) -> Path {
    let mut pb = PathBuilder::new();
    if let Some(&(x, y)) = points.first() {
        pb.move_to(x as f32, y as f32);
        for &(x, y) in &points[1..] {
            pb.line_to(x as f32, y as f32);
        }
    }
    pb.finish()
}

pub fn polygon(points: &[(f64, f64)]) -> Path {
    let mut pb = PathBuilder::new();
    if let Some(&(x, y)) = points.first() {
        pb.move_to(x as f32, y as f32);
        for &(x, y) in &points[1..] {
            pb.line_to(x as f32, y as f32);
        }
        pb.close();
    }
    pb.finish()
}

pub fn circle(cx: f64, cy: f64, r: f64) -> Path {
    let mut pb = PathBuilder::new();
    pb.arc(cx as f32, cy as f32, r as f32, 0.0, pi(2.0) as f32);
    pb.close();
    pb.finish()
}

/// An open circular arc from `start` sweeping by `sweep` radians.
pub fn arc(cx: f64, cy: f64, r: f64, start: f64, sweep: f64) -> Path {
    let mut pb = PathBuilder::new();
    pb.arc(cx as f32, cy as f32, r as f32, start as f32, sweep as f32);
    pb.finish()
}

/// Round-capped stroke, the default line style for organic renderers.
pub fn stroke(width: f64) -> StrokeStyle {
    StrokeStyle {
        width: width as f32,
        cap: LineCap::Round,
        join: LineJoin::Round,
        ..StrokeStyle::default()
    }
}

/// Square-capped stroke for hard-edged geometry (grids, crack lines).
pub fn stroke_flat(width: f64) -> StrokeStyle {
    StrokeStyle {
        width: width as f32,
        cap: LineCap::Butt,
        join: LineJoin::Miter,
        ..StrokeStyle::default()
    }
}

/// Radial gradient from `inner` at the center to `outer` at `radius`.
pub fn radial_gradient(
    (cx, cy): (f64, f64),
    radius: f64,
    inner: Color,
    outer: Color,
) -> Source<'static> {
    Source::new_radial_gradient(
        Gradient {
            stops: vec![
                GradientStop {
                    position: 0.0,
                    color: raqote::Color::new(255, inner.r, inner.g, inner.b),
                },
                GradientStop {
                    position: 1.0,
                    color: raqote::Color::new(255, outer.r, outer.g, outer.b),
                },
            ],
        },
        Point::new(cx as f32, cy as f32),
        radius as f32,
        Spread::Pad,
    )
}

/// Linear gradient between two points; stops are `(position, color, alpha)`.
pub fn linear_gradient(
    (x1, y1): (f64, f64),
    (x2, y2): (f64, f64),
    stops: &[(f32, Color, u8)],
) -> Source<'static> {
    Source::new_linear_gradient(
        Gradient {
            stops: stops
                .iter()
                .map(|&(position, c, a)| GradientStop {
                    position,
                    color: raqote::Color::new(a, c.r, c.g, c.b),
                })
                .collect(),
        },
        Point::new(x1 as f32, y1 as f32),
        Point::new(x2 as f32, y2 as f32),
        Spread::Pad,
    )
}

pub fn fill(dt: &mut DrawTarget, path: &Path, source: &Source) {
    dt.fill(path, source, &DrawOptions::new());
}

pub fn stroke_path(dt: &mut DrawTarget, path: &Path, source: &Source, style: &StrokeStyle) {
    dt.stroke(path, source, style, &DrawOptions::new());
}

pub fn fill_rect(dt: &mut DrawTarget, x: f64, y: f64, w: f64, h: f64, source: &Source) {
    dt.fill_rect(
        x as f32,
        y as f32,
        w as f32,
        h as f32,
        source,
        &DrawOptions::new(),
    );
}
