use glam::{DMat4, DVec3};

use crate::animation::keyframer::ChannelValues;
use crate::foundation::core::Canvas;
use crate::foundation::math::rotation_zyx_deg;
use crate::layer::Camera;
use crate::layer::model::CameraKind;

/// Camera channel values at one instant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraState {
    pub kind: CameraKind,
    pub position: DVec3,
    /// Euler angles in degrees.
    pub rotation: DVec3,
    pub scale: f64,
    /// Vertical field of view in degrees.
    pub fov: f64,
    /// Visible world height of the orthographic camera.
    pub magnitude: f64,
    pub ortho_near: f64,
    pub ortho_far: f64,
    pub perspective_near: f64,
    pub perspective_far: f64,
}

impl CameraState {
    pub fn from_channels(kind: CameraKind, v: &ChannelValues<'_>) -> Self {
        Self {
            kind,
            position: DVec3::new(v.value("x", 0.0), v.value("y", 0.0), v.value("z", 0.0)),
            rotation: DVec3::new(v.value("rx", 0.0), v.value("ry", 0.0), v.value("rz", 0.0)),
            scale: v.value("scale", 1.0),
            fov: v.value("fov", 45.0),
            magnitude: v.value("magnitude", 720.0),
            ortho_near: v.value("ortho-near", 1000.0),
            ortho_far: v.value("ortho-far", -1000.0),
            perspective_near: v.value("perspective-near", 0.1),
            perspective_far: v.value("perspective-far", 1000.0),
        }
    }

    /// Sample `camera` at layer time `t`.
    pub fn sample(camera: &Camera, t: f64) -> Self {
        Self::from_channels(camera.kind, &camera.animation.sample(t))
    }

    /// translate(-position) · scale · rotZ · rotY · rotX
    pub fn view(&self) -> DMat4 {
        DMat4::from_translation(-self.position)
            * DMat4::from_scale(DVec3::splat(self.scale))
            * rotation_zyx_deg(self.rotation.x, self.rotation.y, self.rotation.z)
    }

    pub fn projection(&self, canvas: Canvas) -> DMat4 {
        let aspect = canvas.aspect();
        match self.kind {
            CameraKind::Ortho => {
                let half_h = self.magnitude / 2.0;
                let half_w = half_h * aspect;
                DMat4::orthographic_rh_gl(
                    -half_w,
                    half_w,
                    -half_h,
                    half_h,
                    self.ortho_near,
                    self.ortho_far,
                )
            }
            CameraKind::Perspective => DMat4::perspective_rh_gl(
                self.fov.to_radians(),
                aspect,
                self.perspective_near,
                self.perspective_far,
            ),
        }
    }

    pub fn view_projection(&self, canvas: Canvas) -> DMat4 {
        self.projection(canvas) * self.view()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compile/camera.rs"]
mod tests;
