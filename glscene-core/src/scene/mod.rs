/// Scenes and the drawing seam
///
/// A [`Scene`] owns its geometry, its camera, its input controller and one
/// [`TransformStack`](crate::stack::TransformStack). Each frame it walks its
/// objects, composes their transforms on the stack and hands every composed
/// matrix to a [`DrawTarget`], which is the only thing that knows how to put
/// pixels (or characters) on screen.
mod earth;
mod shapes;

use std::time::Duration;

use nalgebra::{Matrix4, Point3, Vector3};

use crate::color::Rgb;
use crate::controller::InputEvent;
use crate::error::StackError;
use crate::geometry::{LineSet, Mesh, PointCloud};
use crate::projection::Camera;
use crate::starfield::DEFAULT_STAR_COUNT;

pub use earth::{EarthScene, Lightning};
pub use shapes::ShapesScene;

/// Stable name a draw target can cache GPU resources under
pub type ShapeKey = &'static str;

/// Borrowed geometry of one drawable
#[derive(Debug, Clone, Copy)]
pub enum Shape<'a> {
    Mesh(&'a Mesh),
    Lines(&'a LineSet),
    Points(&'a PointCloud),
}

/// One object to draw with its composed model-view matrix
#[derive(Debug, Clone, Copy)]
pub struct DrawCall<'a> {
    pub key: ShapeKey,
    pub shape: Shape<'a>,
    pub model_view: Matrix4<f32>,
}

/// Light sources, in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Light {
    /// Parallel light arriving from `direction` (pointing towards the light).
    Directional {
        direction: Vector3<f32>,
        color: Rgb,
        intensity: f32,
    },
    /// Light falling off linearly to zero at `range`.
    Point {
        position: Point3<f32>,
        color: Rgb,
        intensity: f32,
        range: f32,
    },
}

/// Per-frame state shared by every draw call
#[derive(Debug, Clone)]
pub struct Frame {
    pub projection: Matrix4<f32>,
    pub view: Matrix4<f32>,
    /// Empty means the scene is unlit and vertex colors are used as-is.
    pub lights: Vec<Light>,
    pub clear_color: Rgb,
}

/// Where composed transforms end up
pub trait DrawTarget {
    fn begin_frame(&mut self, frame: &Frame);
    fn draw(&mut self, call: DrawCall<'_>);
}

pub trait Scene {
    fn name(&self) -> &'static str;

    fn camera(&self) -> &Camera;

    fn camera_mut(&mut self) -> &mut Camera;

    /// Every shape the scene will ever draw, for up-front resource setup.
    fn resources(&self) -> Vec<(ShapeKey, Shape<'_>)>;

    fn handle_input(&mut self, event: InputEvent);

    /// Advance the animation by one fixed step.
    fn update(&mut self, step: Duration);

    /// Draw one frame. An error aborts the rest of the frame.
    fn render(&mut self, target: &mut dyn DrawTarget) -> Result<(), StackError>;
}

/// Knobs shared by the scene constructors
#[derive(Debug, Clone)]
pub struct SceneConfig {
    pub seed: u64,
    pub star_count: usize,
    /// Icosphere subdivisions for the Earth
    pub earth_detail: u32,
    /// Initial camera distance; `None` keeps the scene default.
    pub camera_distance: Option<f32>,
    pub viewport: (u32, u32),
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            star_count: DEFAULT_STAR_COUNT,
            earth_detail: 3,
            camera_distance: None,
            viewport: (800, 600),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneKind {
    Shapes,
    Earth,
}

impl SceneKind {
    pub const ALL: [SceneKind; 2] = [SceneKind::Shapes, SceneKind::Earth];

    pub fn build(self, config: &SceneConfig) -> Box<dyn Scene> {
        log::debug!("building {:?} scene with {:?}", self, config);
        match self {
            SceneKind::Shapes => Box::new(ShapesScene::new(config)),
            SceneKind::Earth => Box::new(EarthScene::new(config)),
        }
    }

    pub fn next(self) -> Self {
        match self {
            SceneKind::Shapes => SceneKind::Earth,
            SceneKind::Earth => SceneKind::Shapes,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SceneKind::Shapes => "shapes",
            SceneKind::Earth => "earth",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name.trim()))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_kind_names() {
        assert_eq!(SceneKind::from_name("Earth"), Some(SceneKind::Earth));
        assert_eq!(SceneKind::from_name(" shapes "), Some(SceneKind::Shapes));
        assert_eq!(SceneKind::from_name("mars"), None);
        assert_eq!(SceneKind::Shapes.next().next(), SceneKind::Shapes);
    }

    #[test]
    fn test_build_every_kind() {
        let config = SceneConfig {
            star_count: 10,
            earth_detail: 1,
            ..SceneConfig::default()
        };
        for kind in SceneKind::ALL {
            let scene = kind.build(&config);
            assert_eq!(scene.name(), kind.name());
            assert!(!scene.resources().is_empty());
        }
    }
}
