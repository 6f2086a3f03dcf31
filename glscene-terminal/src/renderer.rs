/// ASCII rasterizer for terminal rendering
use crossterm::{
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use glscene_core::projection::project;
use glscene_core::{Blend, DrawCall, DrawTarget, Frame, Light, LineSet, Mesh, PointCloud, Rgb, Shape, Triangle};
use nalgebra::{Matrix4, Point3, Vector3};
use std::io::Write;

/// Character luminosity ramp for shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Light that is always present in lit scenes
const AMBIENT: f32 = 0.08;

/// Lines win depth ties against the faces they sit on.
const LINE_DEPTH_BIAS: f32 = 1e-3;

/// ASCII renderer that converts draw calls to terminal characters
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    char_buffer: Vec<char>,
    color_buffer: Vec<Rgb>,
    projection: Matrix4<f32>,
    view: Matrix4<f32>,
    lights: Vec<Light>,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth_buffer: vec![f32::INFINITY; size],
            char_buffer: vec![' '; size],
            color_buffer: vec![Rgb::BLACK; size],
            projection: Matrix4::identity(),
            view: Matrix4::identity(),
            lights: Vec::new(),
        }
    }

    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        *self = Self {
            projection: self.projection,
            view: self.view,
            lights: std::mem::take(&mut self.lights),
            ..Self::new(width, height)
        };
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.char_buffer.fill(' ');
        self.color_buffer.fill(Rgb::BLACK);
    }

    pub fn char_at(&self, x: usize, y: usize) -> char {
        self.char_buffer[y * self.width + x]
    }

    pub fn color_at(&self, x: usize, y: usize) -> Rgb {
        self.color_buffer[y * self.width + x]
    }

    /// Number of non-blank cells
    pub fn coverage(&self) -> usize {
        self.char_buffer.iter().filter(|c| **c != ' ').count()
    }

    fn project(&self, point: &Point3<f32>, model_view: &Matrix4<f32>) -> Option<(f32, f32, f32)> {
        project(
            &self.projection,
            point,
            model_view,
            self.width as u32,
            self.height as u32,
        )
    }

    pub fn render_mesh(&mut self, mesh: &Mesh, model_view: &Matrix4<f32>) {
        for triangle in &mesh.triangles {
            self.render_triangle(triangle, model_view, mesh.blend);
        }
    }

    fn render_triangle(&mut self, triangle: &Triangle, model_view: &Matrix4<f32>, blend: Blend) {
        // Project vertices to screen space
        let mut screen_coords = [(0.0, 0.0, 0.0); 3];
        for (slot, vertex) in screen_coords.iter_mut().zip(&triangle.vertices) {
            match self.project(&vertex.position, model_view) {
                Some(coords) => *slot = coords,
                None => return, // Triangle is clipped
            }
        }

        let eye: [Point3<f32>; 3] = [
            model_view.transform_point(&triangle.vertices[0].position),
            model_view.transform_point(&triangle.vertices[1].position),
            model_view.transform_point(&triangle.vertices[2].position),
        ];
        let normal = (eye[1] - eye[0]).cross(&(eye[2] - eye[0]));
        if normal.norm_squared() < 1e-12 {
            return;
        }
        let normal = normal.normalize();
        let centroid = Point3::from((eye[0].coords + eye[1].coords + eye[2].coords) / 3.0);

        let (brightness, color) = self.shade(triangle.color(), &normal, &centroid);
        let character = ramp_char(brightness);

        self.rasterize_triangle(&screen_coords, character, color, blend);
    }

    /// Returns (brightness for the glyph, final color).
    fn shade(&self, base: Rgb, normal: &Vector3<f32>, centroid: &Point3<f32>) -> (f32, Rgb) {
        if self.lights.is_empty() {
            // Unlit: keep the vertex color and shade the glyph with a headlight.
            return (normal.z.abs(), base);
        }

        let mut light = Rgb::new(AMBIENT, AMBIENT, AMBIENT);
        for source in &self.lights {
            let (direction, color, strength) = match *source {
                Light::Directional {
                    direction,
                    color,
                    intensity,
                } => (self.view.transform_vector(&direction), color, intensity),
                Light::Point {
                    position,
                    color,
                    intensity,
                    range,
                } => {
                    let offset = self.view.transform_point(&position) - centroid;
                    let falloff = (1.0 - offset.norm() / range.max(1e-3)).max(0.0);
                    (offset, color, intensity * falloff)
                }
            };
            let lambert = normal.dot(&direction.normalize()).max(0.0);
            light = light.add(color.scaled(lambert * strength));
        }

        let color = Rgb::new(base.r * light.r, base.g * light.g, base.b * light.b);
        (light.luminance(), color)
    }

    fn rasterize_triangle(&mut self, coords: &[(f32, f32, f32); 3], character: char, color: Rgb, blend: Blend) {
        let (v0, v1, v2) = (coords[0], coords[1], coords[2]);

        // Bounding box
        let min_x = v0.0.min(v1.0).min(v2.0).floor() as i32;
        let max_x = v0.0.max(v1.0).max(v2.0).ceil() as i32;
        let min_y = v0.1.min(v1.1).min(v2.1).floor() as i32;
        let max_y = v0.1.max(v1.1).max(v2.1).ceil() as i32;

        // Clip to screen bounds
        let min_x = min_x.max(0);
        let max_x = max_x.min(self.width as i32 - 1);
        let min_y = min_y.max(0);
        let max_y = max_y.min(self.height as i32 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                let Some((w0, w1, w2)) = barycentric((v0.0, v0.1), (v1.0, v1.1), (v2.0, v2.1), (px, py)) else {
                    continue;
                };
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;
                let idx = y as usize * self.width + x as usize;
                if depth >= self.depth_buffer[idx] {
                    continue;
                }

                match blend {
                    Blend::Opaque => {
                        self.depth_buffer[idx] = depth;
                        self.char_buffer[idx] = character;
                        self.color_buffer[idx] = color;
                    }
                    Blend::Additive => {
                        let mixed = self.color_buffer[idx].add(color);
                        self.color_buffer[idx] = mixed;
                        if self.char_buffer[idx] == ' ' && color.luminance() > 0.02 {
                            self.char_buffer[idx] = ramp_char(color.luminance());
                        }
                    }
                }
            }
        }
    }

    pub fn render_lines(&mut self, lines: &LineSet, model_view: &Matrix4<f32>) {
        for segment in &lines.segments {
            let (Some(a), Some(b)) = (
                self.project(&segment.start, model_view),
                self.project(&segment.end, model_view),
            ) else {
                continue;
            };

            let character = line_char(b.0 - a.0, b.1 - a.1);
            let steps = (b.0 - a.0).abs().max((b.1 - a.1).abs()).ceil().max(1.0) as usize;
            for i in 0..=steps {
                let t = i as f32 / steps as f32;
                let x = a.0 + (b.0 - a.0) * t;
                let y = a.1 + (b.1 - a.1) * t;
                let depth = a.2 + (b.2 - a.2) * t - LINE_DEPTH_BIAS;
                self.plot(x, y, depth, character, segment.color);
            }
        }
    }

    pub fn render_points(&mut self, cloud: &PointCloud, model_view: &Matrix4<f32>) {
        for (point, color) in &cloud.points {
            let luminance = color.luminance();
            let character = match luminance {
                l if l < 0.05 => continue,
                l if l < 0.3 => '.',
                l if l < 0.6 => '+',
                _ => '*',
            };
            if let Some((x, y, depth)) = self.project(point, model_view) {
                self.plot(x, y, depth, character, *color);
            }
        }
    }

    fn plot(&mut self, x: f32, y: f32, depth: f32, character: char, color: Rgb) {
        if x < 0.0 || y < 0.0 {
            return;
        }
        let (x, y) = (x as usize, y as usize);
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = y * self.width + x;
        if depth < self.depth_buffer[idx] {
            self.depth_buffer[idx] = depth;
            self.char_buffer[idx] = character;
            self.color_buffer[idx] = color;
        }
    }

    /// Write the buffers out, one terminal row per buffer row.
    pub fn present<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        let mut current: Option<[u8; 3]> = None;
        for y in 0..self.height {
            for x in 0..self.width {
                let idx = y * self.width + x;
                let c = self.char_buffer[idx];

                if c != ' ' {
                    let [r, g, b] = self.color_buffer[idx].to_u8();
                    if current != Some([r, g, b]) {
                        writer.queue(SetForegroundColor(Color::Rgb { r, g, b }))?;
                        current = Some([r, g, b]);
                    }
                }
                writer.queue(Print(c))?;
            }
            if y + 1 < self.height {
                writer.queue(Print("\r\n"))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

impl DrawTarget for AsciiRenderer {
    fn begin_frame(&mut self, frame: &Frame) {
        self.projection = frame.projection;
        self.view = frame.view;
        self.lights.clone_from(&frame.lights);
        self.clear();
    }

    fn draw(&mut self, call: DrawCall<'_>) {
        match call.shape {
            Shape::Mesh(mesh) => self.render_mesh(mesh, &call.model_view),
            Shape::Lines(lines) => self.render_lines(lines, &call.model_view),
            Shape::Points(points) => self.render_points(points, &call.model_view),
        }
    }
}

/// Glyph for a brightness in 0..=1; covered cells never go blank.
fn ramp_char(brightness: f32) -> char {
    let steps = (LUMINOSITY_RAMP.len() - 2) as f32;
    let index = 1 + (brightness.clamp(0.0, 1.0) * steps).round() as usize;
    LUMINOSITY_RAMP[index.min(LUMINOSITY_RAMP.len() - 1)]
}

/// Glyph following the on-screen slope of a line
fn line_char(dx: f32, dy: f32) -> char {
    if dx.abs() > 2.0 * dy.abs() {
        '-'
    } else if dy.abs() > 2.0 * dx.abs() {
        '|'
    } else if (dx > 0.0) == (dy > 0.0) {
        '\\'
    } else {
        '/'
    }
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use glscene_core::{Camera, SceneConfig, SceneKind, Segment};

    fn unlit_frame(camera: &Camera) -> Frame {
        Frame {
            projection: camera.projection_matrix(),
            view: camera.view_matrix(),
            lights: Vec::new(),
            clear_color: Rgb::BLACK,
        }
    }

    #[test]
    fn test_barycentric_centre() {
        let (w0, w1, w2) = barycentric((0.0, 0.0), (4.0, 0.0), (0.0, 4.0), (1.0, 1.0)).unwrap();
        assert!((w0 - 0.5).abs() < 1e-6);
        assert!((w1 - 0.25).abs() < 1e-6);
        assert!((w2 - 0.25).abs() < 1e-6);
        assert!(barycentric((0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (1.0, 1.0)).is_none());
    }

    #[test]
    fn test_ramp_never_blank() {
        assert_eq!(ramp_char(0.0), '.');
        assert_eq!(ramp_char(1.0), '@');
        assert_eq!(ramp_char(7.0), '@');
    }

    #[test]
    fn test_cube_covers_centre_of_screen() {
        let camera = Camera::orthographic(1.0);
        let mut renderer = AsciiRenderer::new(40, 20);
        renderer.begin_frame(&unlit_frame(&camera));
        renderer.draw(DrawCall {
            key: "cube",
            shape: Shape::Mesh(&Mesh::cube(1.0)),
            model_view: camera.view_matrix(),
        });

        assert_ne!(renderer.char_at(20, 10), ' ');
        assert_eq!(renderer.char_at(0, 0), ' ');
        // Front face of a cube colored by position: blue channel saturated.
        assert!(renderer.color_at(20, 10).b > 0.99);
    }

    #[test]
    fn test_nearer_triangle_wins() {
        let camera = Camera::orthographic(1.0);
        let view = camera.view_matrix();
        let mut renderer = AsciiRenderer::new(20, 20);
        renderer.begin_frame(&unlit_frame(&camera));

        let mut far = Mesh::cube(1.0);
        far.recolor(|_| Rgb::RED);
        let mut near = Mesh::cube(0.5);
        near.recolor(|_| Rgb::GREEN);

        let forward = view * glscene_core::transform::translation(&nalgebra::Vector3::new(0.0, 0.0, 0.6));
        renderer.draw(DrawCall { key: "near", shape: Shape::Mesh(&near), model_view: forward });
        renderer.draw(DrawCall { key: "far", shape: Shape::Mesh(&far), model_view: view });

        assert_eq!(renderer.color_at(10, 10), Rgb::GREEN);
        assert_eq!(renderer.color_at(7, 10), Rgb::RED);
    }

    #[test]
    fn test_additive_layer_does_not_occlude() {
        let camera = Camera::orthographic(1.0);
        let view = camera.view_matrix();
        let mut renderer = AsciiRenderer::new(20, 20);
        renderer.begin_frame(&unlit_frame(&camera));

        let mut base = Mesh::cube(1.0);
        base.recolor(|_| Rgb::new(0.2, 0.2, 0.2));
        let mut glow = Mesh::cube(1.2).with_blend(Blend::Additive);
        glow.recolor(|_| Rgb::new(0.1, 0.0, 0.0));

        renderer.draw(DrawCall { key: "base", shape: Shape::Mesh(&base), model_view: view });
        let before = renderer.char_at(10, 10);
        renderer.draw(DrawCall { key: "glow", shape: Shape::Mesh(&glow), model_view: view });

        // The additive cube is in front, yet only tints what is there.
        assert_eq!(renderer.char_at(10, 10), before);
        let tinted = renderer.color_at(10, 10);
        assert!((tinted.r - 0.3).abs() < 1e-4);
        assert!((tinted.g - 0.2).abs() < 1e-4);
    }

    #[test]
    fn test_axes_draw_line_glyphs() {
        let camera = Camera::orthographic(1.0);
        let mut renderer = AsciiRenderer::new(41, 21);
        renderer.begin_frame(&unlit_frame(&camera));
        let lines = LineSet {
            segments: vec![Segment {
                start: Point3::origin(),
                end: Point3::new(0.9, 0.0, 0.0),
                color: Rgb::RED,
            }],
        };
        renderer.draw(DrawCall { key: "axis", shape: Shape::Lines(&lines), model_view: camera.view_matrix() });

        assert_eq!(renderer.char_at(25, 10), '-');
        assert_eq!(renderer.color_at(25, 10), Rgb::RED);
        assert_eq!(renderer.char_at(10, 10), ' ');
    }

    #[test]
    fn test_points_skip_dark_stars() {
        let camera = Camera::orthographic(1.0);
        let mut renderer = AsciiRenderer::new(20, 20);
        renderer.begin_frame(&unlit_frame(&camera));
        let cloud = PointCloud {
            points: vec![
                (Point3::new(-0.5, 0.0, 0.0), Rgb::WHITE),
                (Point3::new(0.5, 0.0, 0.0), Rgb::new(0.01, 0.01, 0.01)),
            ],
            size: 0.2,
        };
        renderer.draw(DrawCall { key: "stars", shape: Shape::Points(&cloud), model_view: camera.view_matrix() });
        assert_eq!(renderer.coverage(), 1);
        assert_eq!(renderer.char_at(6, 10), '*');
    }

    #[test]
    fn test_lit_side_is_brighter_than_dark_side() {
        let camera = Camera::orthographic(1.0);
        let view = camera.view_matrix();
        let mut renderer = AsciiRenderer::new(40, 40);
        renderer.begin_frame(&Frame {
            lights: vec![Light::Directional {
                direction: Vector3::new(-1.0, 0.0, 1.0).normalize(),
                color: Rgb::WHITE,
                intensity: 1.0,
            }],
            ..unlit_frame(&camera)
        });
        let mut ball = Mesh::icosphere(0.9, 3);
        ball.recolor(|_| Rgb::WHITE);
        renderer.draw(DrawCall { key: "ball", shape: Shape::Mesh(&ball), model_view: view });

        let left = renderer.color_at(8, 20).luminance();
        let right = renderer.color_at(32, 20).luminance();
        assert!(left > right, "left {left} right {right}");
    }

    #[test]
    fn test_renders_whole_scenes() {
        let config = SceneConfig {
            star_count: 200,
            earth_detail: 2,
            viewport: (80, 48),
            ..SceneConfig::default()
        };
        for kind in SceneKind::ALL {
            let mut scene = kind.build(&config);
            scene.update(std::time::Duration::from_millis(16));
            let mut renderer = AsciiRenderer::new(80, 24);
            scene.render(&mut renderer).unwrap();
            assert!(renderer.coverage() > 10, "{} drew too little", scene.name());
        }
    }

    #[test]
    fn test_present_emits_rows() {
        let renderer = AsciiRenderer::new(3, 2);
        let mut out = Vec::new();
        renderer.present(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("   \r\n   "));
    }

    #[test]
    fn test_resize_reallocates_buffers() {
        let mut renderer = AsciiRenderer::new(3, 2);
        renderer.resize(10, 4);
        assert_eq!(renderer.size(), (10, 4));
        assert_eq!(renderer.char_at(9, 3), ' ');
    }
}
