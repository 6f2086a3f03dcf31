/// glscene core library - transform stack, geometry and scenes
///
/// This library holds everything that does not touch a graphics API: the
/// hierarchical transform stack, the demo geometry, cameras, input
/// controllers, frame timing and the two demo scenes. Front ends implement
/// [`scene::DrawTarget`] to display them.

pub mod clock;
pub mod color;
pub mod controller;
pub mod error;
pub mod geometry;
pub mod projection;
pub mod scene;
pub mod stack;
pub mod starfield;
pub mod transform;

// Re-export commonly used types
pub use color::Rgb;
pub use controller::{InputEvent, OrbitController, PointerRotation};
pub use error::StackError;
pub use geometry::{Blend, LineSet, Mesh, PointCloud, Segment, Triangle, Vertex};
pub use projection::{Camera, ProjectionMode};
pub use scene::{DrawCall, DrawTarget, Frame, Light, Scene, SceneConfig, SceneKind, Shape, ShapeKey};
pub use stack::TransformStack;
pub use transform::Orientation;
