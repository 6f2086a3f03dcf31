/// Elementary 4x4 transforms
///
/// Angles are in degrees throughout, matching the transform stack.
use nalgebra::{Matrix4, Unit, Vector3};

/// Keep an angle in [0, 360).
pub fn wrap_degrees(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs.
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Rotation of `angle_degrees` about `axis`, counter-clockwise looking down the axis.
///
/// The axis does not need to be normalized. A zero-length axis has no
/// direction to rotate about and yields the identity.
pub fn rotation(angle_degrees: f32, axis: &Vector3<f32>) -> Matrix4<f32> {
    match Unit::try_new(*axis, f32::EPSILON) {
        Some(axis) => Matrix4::from_axis_angle(&axis, angle_degrees.to_radians()),
        None => Matrix4::identity(),
    }
}

pub fn translation(offset: &Vector3<f32>) -> Matrix4<f32> {
    Matrix4::new_translation(offset)
}

pub fn scaling(factors: &Vector3<f32>) -> Matrix4<f32> {
    Matrix4::new_nonuniform_scaling(factors)
}

/// Orientation built from rotations about X, then Y, then Z
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Orientation {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl Orientation {
    pub fn new(pitch: f32, yaw: f32, roll: f32) -> Self {
        Self {
            pitch: wrap_degrees(pitch),
            yaw: wrap_degrees(yaw),
            roll: wrap_degrees(roll),
        }
    }

    /// Add to each angle, wrapping into [0, 360).
    pub fn turn(&mut self, pitch: f32, yaw: f32, roll: f32) {
        *self = Self::new(self.pitch + pitch, self.yaw + yaw, self.roll + roll);
    }

    pub fn matrix(&self) -> Matrix4<f32> {
        rotation(self.roll, &Vector3::z()) * rotation(self.yaw, &Vector3::y()) * rotation(self.pitch, &Vector3::x())
    }
}
