/// Axes, cube and sphere spinning in the unit view box
use std::time::Duration;

use nalgebra::Vector3;

use super::{DrawCall, DrawTarget, Frame, Scene, SceneConfig, Shape, ShapeKey};
use crate::color::Rgb;
use crate::controller::{InputEvent, PointerRotation};
use crate::error::StackError;
use crate::geometry::{LineSet, Mesh};
use crate::projection::Camera;
use crate::stack::TransformStack;
use crate::transform::wrap_degrees;

const AXES: ShapeKey = "axes";
const CUBE: ShapeKey = "cube";
const SPHERE: ShapeKey = "sphere";

/// Degrees added before the axes and cube are drawn
const PRIMARY_STEP: f32 = 2.0;
/// Degrees added again before the sphere is drawn
const SECONDARY_STEP: f32 = 1.0;

pub struct ShapesScene {
    axes: LineSet,
    cube: Mesh,
    sphere: Mesh,
    camera: Camera,
    stack: TransformStack,
    axes_control: PointerRotation,
    /// Running angle, degrees in [0, 360)
    angle: f32,
    cube_angle: f32,
    sphere_angle: f32,
}

impl ShapesScene {
    pub fn new(config: &SceneConfig) -> Self {
        let mut camera = Camera::orthographic(1.0);
        camera.set_viewport(config.viewport.0, config.viewport.1);
        if let Some(distance) = config.camera_distance {
            camera.position.z = distance;
        }

        Self {
            axes: LineSet::axes(1.0),
            cube: Mesh::cube(1.0),
            sphere: Mesh::sphere(1.0, 30, 30),
            camera,
            stack: TransformStack::new(),
            axes_control: PointerRotation::default(),
            angle: 0.0,
            cube_angle: 0.0,
            sphere_angle: 0.0,
        }
    }

    /// Current (axes and cube, sphere) angles in degrees
    pub fn angles(&self) -> (f32, f32) {
        (self.cube_angle, self.sphere_angle)
    }
}

impl Scene for ShapesScene {
    fn name(&self) -> &'static str {
        "shapes"
    }

    fn camera(&self) -> &Camera {
        &self.camera
    }

    fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    fn resources(&self) -> Vec<(ShapeKey, Shape<'_>)> {
        vec![
            (AXES, Shape::Lines(&self.axes)),
            (CUBE, Shape::Mesh(&self.cube)),
            (SPHERE, Shape::Mesh(&self.sphere)),
        ]
    }

    fn handle_input(&mut self, event: InputEvent) {
        self.axes_control.handle(event);
    }

    fn update(&mut self, _step: Duration) {
        self.angle = wrap_degrees(self.angle + PRIMARY_STEP);
        self.cube_angle = self.angle;
        self.angle = wrap_degrees(self.angle + SECONDARY_STEP);
        self.sphere_angle = self.angle;
    }

    fn render(&mut self, target: &mut dyn DrawTarget) -> Result<(), StackError> {
        let view = self.camera.view_matrix();
        target.begin_frame(&Frame {
            projection: self.camera.projection_matrix(),
            view,
            lights: Vec::new(),
            clear_color: Rgb::new(0.2, 0.2, 0.2),
        });

        let ms = &mut self.stack;
        ms.push();
        ms.mult_matrix(&view);

        ms.push();
        ms.mult_matrix(&self.axes_control.matrix());
        ms.rotate(self.cube_angle, Vector3::z());
        ms.scale(Vector3::new(0.5, 0.5, 0.5));
        target.draw(DrawCall {
            key: AXES,
            shape: Shape::Lines(&self.axes),
            model_view: ms.current(),
        });
        ms.pop()?;

        ms.push();
        ms.translate(Vector3::new(-0.5, 0.5, -1.0));
        ms.scale(Vector3::new(0.3, 0.3, 0.3));
        ms.rotate(self.cube_angle, Vector3::x());
        target.draw(DrawCall {
            key: CUBE,
            shape: Shape::Mesh(&self.cube),
            model_view: ms.current(),
        });
        ms.pop()?;

        ms.push();
        ms.translate(Vector3::new(0.5, -0.75, 1.0));
        ms.scale(Vector3::new(0.2, 0.2, 0.2));
        ms.rotate(self.sphere_angle, Vector3::z());
        target.draw(DrawCall {
            key: SPHERE,
            shape: Shape::Mesh(&self.sphere),
            model_view: ms.current(),
        });
        ms.pop()?;

        ms.pop()
    }
}
