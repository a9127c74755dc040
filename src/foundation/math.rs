use glam::{DMat4, DVec3, DVec4};

use crate::foundation::core::{Canvas, Point};

pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

pub(crate) fn mul_div255_u8(x: u16, y: u16) -> u8 {
    mul_div255_u16(x, y) as u8
}

pub(crate) fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Linearly map `v` from `[a0, a1]` onto `[b0, b1]`, clamping the result to the target range.
pub(crate) fn map_clamped(v: f64, a0: f64, a1: f64, b0: f64, b1: f64) -> f64 {
    let span = a1 - a0;
    let t = if span.abs() <= f64::EPSILON {
        if v >= a1 { 1.0 } else { 0.0 }
    } else {
        ((v - a0) / span).clamp(0.0, 1.0)
    };
    lerp(b0, b1, t)
}

/// Euler rotation applied as Z, then Y, then X (degrees), matching authoring tools.
pub(crate) fn rotation_zyx_deg(rx: f64, ry: f64, rz: f64) -> DMat4 {
    DMat4::from_rotation_z(rz.to_radians())
        * DMat4::from_rotation_y(ry.to_radians())
        * DMat4::from_rotation_x(rx.to_radians())
}

/// Object model matrix: translate, uniform scale, then rotate.
pub(crate) fn model_matrix(pos: DVec3, rot_deg: DVec3, scale: f64) -> DMat4 {
    DMat4::from_translation(pos)
        * DMat4::from_scale(DVec3::splat(scale))
        * rotation_zyx_deg(rot_deg.x, rot_deg.y, rot_deg.z)
}

/// Project a point through `mvp` into pixel space of `canvas` (y down).
///
/// Returns `None` for points behind the camera (`w <= 0`).
pub(crate) fn project_to_pixels(mvp: &DMat4, p: DVec3, canvas: Canvas) -> Option<Point> {
    let clip = *mvp * DVec4::new(p.x, p.y, p.z, 1.0);
    if clip.w <= 1e-9 {
        return None;
    }
    let ndc_x = clip.x / clip.w;
    let ndc_y = clip.y / clip.w;
    let w = f64::from(canvas.width);
    let h = f64::from(canvas.height);
    Some(Point::new((ndc_x + 1.0) * 0.5 * w, (1.0 - ndc_y) * 0.5 * h))
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
