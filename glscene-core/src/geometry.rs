/// Geometry primitives for the demo scenes
use std::collections::HashMap;
use std::f32::consts::PI;

use nalgebra::{Point3, Vector3};

use crate::color::Rgb;

/// A 3D vertex with position, normal and color
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
    pub color: Rgb,
}

impl Vertex {
    pub fn new(position: Point3<f32>, normal: Vector3<f32>, color: Rgb) -> Self {
        Self {
            position,
            normal,
            color,
        }
    }
}

/// A triangle face defined by three vertices
#[derive(Debug, Clone)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
}

impl Triangle {
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex) -> Self {
        Self {
            vertices: [v0, v1, v2],
        }
    }

    /// Calculate the face normal from the triangle's vertices
    pub fn calculate_normal(&self) -> Vector3<f32> {
        let v0 = self.vertices[0].position;
        let v1 = self.vertices[1].position;
        let v2 = self.vertices[2].position;

        let edge1 = v1 - v0;
        let edge2 = v2 - v0;

        edge1.cross(&edge2).normalize()
    }

    /// Average of the vertex colors
    pub fn color(&self) -> Rgb {
        let [a, b, c] = &self.vertices;
        Rgb::new(
            (a.color.r + b.color.r + c.color.r) / 3.0,
            (a.color.g + b.color.g + c.color.g) / 3.0,
            (a.color.b + b.color.b + c.color.b) / 3.0,
        )
    }
}

/// How a mesh combines with what is already drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Blend {
    #[default]
    Opaque,
    /// Adds its color on top and never occludes (cloud layers).
    Additive,
}

/// A 3D mesh composed of triangles
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub triangles: Vec<Triangle>,
    pub blend: Blend,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            triangles: Vec::with_capacity(capacity),
            blend: Blend::Opaque,
        }
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    pub fn with_blend(mut self, blend: Blend) -> Self {
        self.blend = blend;
        self
    }

    /// Recolor every vertex from its position.
    pub fn recolor(&mut self, mut color: impl FnMut(&Point3<f32>) -> Rgb) {
        for triangle in &mut self.triangles {
            for vertex in &mut triangle.vertices {
                vertex.color = color(&vertex.position);
            }
        }
    }

    /// Axis-aligned cube centred on the origin, colored by position.
    pub fn cube(size: f32) -> Self {
        let half = size / 2.0;
        let mut mesh = Self::with_capacity(12);

        // (normal, u axis, v axis): u x v == normal keeps the winding outward.
        let faces = [
            (Vector3::z(), Vector3::x(), Vector3::y()),
            (-Vector3::z(), Vector3::y(), Vector3::x()),
            (Vector3::y(), Vector3::z(), Vector3::x()),
            (-Vector3::y(), Vector3::x(), Vector3::z()),
            (Vector3::x(), Vector3::y(), Vector3::z()),
            (-Vector3::x(), Vector3::z(), Vector3::y()),
        ];

        for (normal, u, v) in faces {
            let centre = normal * half;
            let corner = |su: f32, sv: f32| {
                let p = Point3::from(centre + u * (su * half) + v * (sv * half));
                let color = Rgb::new(p.x / size + 0.5, p.y / size + 0.5, p.z / size + 0.5);
                Vertex::new(p, normal, color)
            };
            let (a, b, c, d) = (
                corner(-1.0, -1.0),
                corner(1.0, -1.0),
                corner(1.0, 1.0),
                corner(-1.0, 1.0),
            );
            mesh.add_triangle(Triangle::new(a, b, c));
            mesh.add_triangle(Triangle::new(a, c, d));
        }

        mesh
    }

    /// Latitude/longitude sphere with `slices` around the axis and `stacks`
    /// from pole to pole. Vertices are colored by their normal.
    pub fn sphere(radius: f32, slices: u32, stacks: u32) -> Self {
        let slices = slices.max(3);
        let stacks = stacks.max(2);
        let mut mesh = Self::with_capacity((slices * stacks * 2) as usize);

        let vertex = |slice: u32, stack: u32| {
            let theta = 2.0 * PI * slice as f32 / slices as f32;
            let phi = PI * stack as f32 / stacks as f32;
            let normal = Vector3::new(phi.sin() * theta.cos(), phi.cos(), -phi.sin() * theta.sin());
            let color = Rgb::new(
                normal.x * 0.5 + 0.5,
                normal.y * 0.5 + 0.5,
                normal.z * 0.5 + 0.5,
            );
            Vertex::new(Point3::from(normal * radius), normal, color)
        };

        for stack in 0..stacks {
            for slice in 0..slices {
                let a = vertex(slice, stack);
                let b = vertex(slice, stack + 1);
                let c = vertex(slice + 1, stack + 1);
                let d = vertex(slice + 1, stack);

                // Skip the degenerate half of each quad at the poles.
                if stack != 0 {
                    mesh.add_triangle(Triangle::new(a, b, d));
                }
                if stack != stacks - 1 {
                    mesh.add_triangle(Triangle::new(d, b, c));
                }
            }
        }

        mesh
    }

    /// Icosahedron subdivided `subdivisions` times with every vertex pushed
    /// onto the sphere. Face count is `20 * 4^subdivisions`.
    pub fn icosphere(radius: f32, subdivisions: u32) -> Self {
        let (mut positions, mut faces) = icosahedron();

        for _ in 0..subdivisions {
            let mut midpoints: HashMap<(usize, usize), usize> = HashMap::new();
            let mut next = Vec::with_capacity(faces.len() * 4);

            let mut midpoint = |a: usize, b: usize, positions: &mut Vec<Vector3<f32>>| {
                let key = if a < b { (a, b) } else { (b, a) };
                *midpoints.entry(key).or_insert_with(|| {
                    positions.push(((positions[a] + positions[b]) * 0.5).normalize());
                    positions.len() - 1
                })
            };

            for [a, b, c] in faces {
                let ab = midpoint(a, b, &mut positions);
                let bc = midpoint(b, c, &mut positions);
                let ca = midpoint(c, a, &mut positions);
                next.extend([[a, ab, ca], [b, bc, ab], [c, ca, bc], [ab, bc, ca]]);
            }
            faces = next;
        }

        let mut mesh = Self::with_capacity(faces.len());
        let vertex = |i: usize| {
            let n = positions[i];
            Vertex::new(Point3::from(n * radius), n, Rgb::WHITE)
        };
        for [a, b, c] in faces {
            mesh.add_triangle(Triangle::new(vertex(a), vertex(b), vertex(c)));
        }
        mesh
    }
}

/// The twelve unit vertices and twenty outward-wound faces of an icosahedron
fn icosahedron() -> (Vec<Vector3<f32>>, Vec<[usize; 3]>) {
    let t = (1.0 + 5.0_f32.sqrt()) / 2.0;
    let positions = [
        (-1.0, t, 0.0),
        (1.0, t, 0.0),
        (-1.0, -t, 0.0),
        (1.0, -t, 0.0),
        (0.0, -1.0, t),
        (0.0, 1.0, t),
        (0.0, -1.0, -t),
        (0.0, 1.0, -t),
        (t, 0.0, -1.0),
        (t, 0.0, 1.0),
        (-t, 0.0, -1.0),
        (-t, 0.0, 1.0),
    ]
    .iter()
    .map(|&(x, y, z)| Vector3::new(x, y, z).normalize())
    .collect();

    let faces = vec![
        [0, 11, 5], [0, 5, 1], [0, 1, 7], [0, 7, 10], [0, 10, 11],
        [1, 5, 9], [5, 11, 4], [11, 10, 2], [10, 7, 6], [7, 1, 8],
        [3, 9, 4], [3, 4, 2], [3, 2, 6], [3, 6, 8], [3, 8, 9],
        [4, 9, 5], [2, 4, 11], [6, 2, 10], [8, 6, 7], [9, 8, 1],
    ];

    (positions, faces)
}

/// A colored line segment
#[derive(Debug, Clone, Copy)]
pub struct Segment {
    pub start: Point3<f32>,
    pub end: Point3<f32>,
    pub color: Rgb,
}

/// A set of independent line segments
#[derive(Debug, Clone, Default)]
pub struct LineSet {
    pub segments: Vec<Segment>,
}

impl LineSet {
    /// Coordinate axes from the origin: x red, y green, z blue.
    pub fn axes(length: f32) -> Self {
        let origin = Point3::origin();
        let segment = |axis: Vector3<f32>, color| Segment {
            start: origin,
            end: Point3::from(axis * length),
            color,
        };
        Self {
            segments: vec![
                segment(Vector3::x(), Rgb::RED),
                segment(Vector3::y(), Rgb::GREEN),
                segment(Vector3::z(), Rgb::BLUE),
            ],
        }
    }
}

/// Colored points rendered as sprites of `size` world units
#[derive(Debug, Clone, Default)]
pub struct PointCloud {
    pub points: Vec<(Point3<f32>, Rgb)>,
    pub size: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_faces_point_outward() {
        let cube = Mesh::cube(1.0);
        assert_eq!(cube.triangles.len(), 12);
        for triangle in &cube.triangles {
            let normal = triangle.calculate_normal();
            let declared = triangle.vertices[0].normal;
            assert!((normal - declared).norm() < 1e-5);
            for v in &triangle.vertices {
                assert!((v.position.x.abs() - 0.5).abs() < 1e-6
                    || (v.position.y.abs() - 0.5).abs() < 1e-6
                    || (v.position.z.abs() - 0.5).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_cube_colors_follow_position() {
        let cube = Mesh::cube(2.0);
        for v in cube.triangles.iter().flat_map(|t| t.vertices.iter()) {
            assert!((v.color.r - (v.position.x / 2.0 + 0.5)).abs() < 1e-6);
            assert!(v.color.r == 0.0 || v.color.r == 1.0);
        }
    }

    #[test]
    fn test_sphere_vertices_on_radius() {
        let sphere = Mesh::sphere(2.0, 30, 30);
        assert_eq!(sphere.triangles.len(), 30 * 30 * 2 - 2 * 30);
        for v in sphere.triangles.iter().flat_map(|t| t.vertices.iter()) {
            assert!((v.position.coords.norm() - 2.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_sphere_winding_is_outward() {
        let sphere = Mesh::sphere(1.0, 12, 8);
        for triangle in &sphere.triangles {
            let centroid = (triangle.vertices[0].position.coords
                + triangle.vertices[1].position.coords
                + triangle.vertices[2].position.coords)
                / 3.0;
            assert!(triangle.calculate_normal().dot(&centroid) > 0.0);
        }
    }

    #[test]
    fn test_icosphere_face_count_and_radius() {
        for level in 0..3 {
            let mesh = Mesh::icosphere(1.5, level);
            assert_eq!(mesh.triangles.len(), 20 * 4usize.pow(level));
            for v in mesh.triangles.iter().flat_map(|t| t.vertices.iter()) {
                assert!((v.position.coords.norm() - 1.5).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn test_icosphere_winding_is_outward() {
        let mesh = Mesh::icosphere(1.0, 1);
        for triangle in &mesh.triangles {
            let centroid = triangle.vertices[0].position.coords;
            assert!(triangle.calculate_normal().dot(&centroid) > 0.0);
        }
    }

    #[test]
    fn test_axes() {
        let axes = LineSet::axes(1.0);
        assert_eq!(axes.segments.len(), 3);
        assert_eq!(axes.segments[0].end, Point3::new(1.0, 0.0, 0.0));
        assert_eq!(axes.segments[1].color, Rgb::GREEN);
        assert_eq!(axes.segments[2].end, Point3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_recolor() {
        let mut mesh = Mesh::icosphere(1.0, 0);
        mesh.recolor(|p| if p.y > 0.0 { Rgb::WHITE } else { Rgb::BLUE });
        let top = mesh
            .triangles
            .iter()
            .flat_map(|t| t.vertices.iter())
            .find(|v| v.position.y > 0.5)
            .unwrap();
        assert_eq!(top.color, Rgb::WHITE);
    }
}
