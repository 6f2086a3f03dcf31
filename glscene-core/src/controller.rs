/// Input controllers
///
/// Drawables never read input themselves. Front ends translate their native
/// events into [`InputEvent`]s and scenes forward them to one of the
/// controllers below.
use std::f32::consts::PI;

use nalgebra::{Matrix4, Point3, Vector3};

use crate::projection::Camera;
use crate::transform::Orientation;

/// Platform-agnostic input
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Pointer moved with the primary button held, in pixels (or cells).
    Drag { dx: f32, dy: f32 },
    /// Multiplicative zoom; values above 1 move closer.
    Zoom(f32),
    Reset,
}

/// Turns pointer drags into an orientation
#[derive(Debug, Clone)]
pub struct PointerRotation {
    orientation: Orientation,
    /// Degrees per pixel of pointer motion
    pub sensitivity: f32,
}

impl PointerRotation {
    pub fn new(sensitivity: f32) -> Self {
        Self {
            orientation: Orientation::default(),
            sensitivity,
        }
    }

    /// Horizontal motion yaws about Y, vertical motion pitches about X.
    pub fn drag(&mut self, dx: f32, dy: f32) {
        self.orientation
            .turn(dy * self.sensitivity, dx * self.sensitivity, 0.0);
    }

    pub fn handle(&mut self, event: InputEvent) {
        match event {
            InputEvent::Drag { dx, dy } => self.drag(dx, dy),
            InputEvent::Reset => self.reset(),
            InputEvent::Zoom(_) => {}
        }
    }

    pub fn reset(&mut self) {
        self.orientation = Orientation::default();
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn matrix(&self) -> Matrix4<f32> {
        self.orientation.matrix()
    }
}

impl Default for PointerRotation {
    fn default() -> Self {
        Self::new(0.5)
    }
}

/// Keeps a camera on a sphere around its target
#[derive(Debug, Clone)]
pub struct OrbitController {
    pub target: Point3<f32>,
    radius: f32,
    /// Angle around +Y, measured from +Z
    azimuth: f32,
    /// Angle from +Y
    polar: f32,
    /// Radians per pixel of drag
    pub rotate_speed: f32,
    pub min_radius: f32,
    pub max_radius: f32,
    home: (f32, f32, f32),
}

const POLAR_MARGIN: f32 = 0.01;

impl OrbitController {
    /// Start from wherever `camera` currently is.
    pub fn from_camera(camera: &Camera) -> Self {
        let offset = camera.position - camera.target;
        let radius = offset.norm().max(1e-3);
        let azimuth = offset.x.atan2(offset.z);
        let polar = (offset.y / radius).clamp(-1.0, 1.0).acos();

        Self {
            target: camera.target,
            radius,
            azimuth,
            polar: polar.clamp(POLAR_MARGIN, PI - POLAR_MARGIN),
            rotate_speed: 0.01,
            min_radius: 1.5,
            max_radius: 200.0,
            home: (radius, azimuth, polar),
        }
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn drag(&mut self, dx: f32, dy: f32) {
        self.azimuth -= dx * self.rotate_speed;
        self.polar = (self.polar - dy * self.rotate_speed).clamp(POLAR_MARGIN, PI - POLAR_MARGIN);
    }

    pub fn zoom(&mut self, factor: f32) {
        if factor > 0.0 {
            self.radius = (self.radius / factor).clamp(self.min_radius, self.max_radius);
        }
    }

    pub fn reset(&mut self) {
        let (radius, azimuth, polar) = self.home;
        self.radius = radius;
        self.azimuth = azimuth;
        self.polar = polar.clamp(POLAR_MARGIN, PI - POLAR_MARGIN);
    }

    pub fn handle(&mut self, event: InputEvent) {
        match event {
            InputEvent::Drag { dx, dy } => self.drag(dx, dy),
            InputEvent::Zoom(factor) => self.zoom(factor),
            InputEvent::Reset => self.reset(),
        }
    }

    pub fn eye(&self) -> Point3<f32> {
        let offset = Vector3::new(
            self.polar.sin() * self.azimuth.sin(),
            self.polar.cos(),
            self.polar.sin() * self.azimuth.cos(),
        );
        self.target + offset * self.radius
    }

    pub fn apply(&self, camera: &mut Camera) {
        camera.target = self.target;
        camera.position = self.eye();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_rotation_accumulates_degrees() {
        let mut control = PointerRotation::new(0.5);
        control.drag(10.0, 0.0);
        control.drag(10.0, -4.0);
        let orientation = control.orientation();
        assert!((orientation.yaw - 10.0).abs() < 1e-6);
        assert!((orientation.pitch - 358.0).abs() < 1e-4);
        assert_eq!(orientation.roll, 0.0);
    }

    #[test]
    fn test_pointer_rotation_is_stable_without_input() {
        let mut control = PointerRotation::default();
        control.drag(6.0, 2.0);
        let before = control.matrix();
        // No hidden per-frame accumulation: reading twice gives the same matrix.
        assert!((control.matrix() - before).norm() < 1e-6);
        control.handle(InputEvent::Reset);
        assert!((control.matrix() - Matrix4::identity()).norm() < 1e-6);
    }

    #[test]
    fn test_orbit_round_trips_camera_position() {
        let camera = Camera::perspective(75.0, 10.0, 0.1, 1000.0);
        let orbit = OrbitController::from_camera(&camera);
        assert!((orbit.eye() - camera.position).norm() < 1e-4);
        assert!((orbit.radius() - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_orbit_drag_keeps_radius() {
        let mut camera = Camera::perspective(75.0, 10.0, 0.1, 1000.0);
        let mut orbit = OrbitController::from_camera(&camera);
        orbit.handle(InputEvent::Drag { dx: 40.0, dy: 25.0 });
        orbit.apply(&mut camera);
        assert!((camera.distance() - 10.0).abs() < 1e-4);
        assert!(camera.position.x.abs() > 0.1);
    }

    #[test]
    fn test_orbit_polar_is_clamped() {
        let camera = Camera::perspective(75.0, 10.0, 0.1, 1000.0);
        let mut orbit = OrbitController::from_camera(&camera);
        orbit.drag(0.0, 10_000.0);
        assert!(orbit.eye().y < 10.0);
        assert!(orbit.eye().y > 9.9);
    }

    #[test]
    fn test_orbit_zoom_is_clamped_and_resettable() {
        let camera = Camera::perspective(75.0, 10.0, 0.1, 1000.0);
        let mut orbit = OrbitController::from_camera(&camera);
        orbit.zoom(2.0);
        assert!((orbit.radius() - 5.0).abs() < 1e-4);
        orbit.zoom(100.0);
        assert!((orbit.radius() - orbit.min_radius).abs() < 1e-4);
        orbit.zoom(0.0);
        assert!((orbit.radius() - orbit.min_radius).abs() < 1e-4);
        orbit.handle(InputEvent::Reset);
        assert!((orbit.radius() - 10.0).abs() < 1e-4);
    }
}
