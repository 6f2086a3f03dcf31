/// Packing scene geometry into GPU buffers
use bytemuck::{Pod, Zeroable};
use glscene_core::{Blend, Frame, Light, Rgb, Shape};
use nalgebra::Vector3;
use wasm_bindgen::JsValue;
use web_sys::{WebGl2RenderingContext as Gl, WebGlBuffer, WebGlVertexArrayObject};

use crate::shaders::{ATTRIB_COLOR, ATTRIB_NORMAL, ATTRIB_POSITION, MAX_LIGHTS};

/// Interleaved vertex as laid out in the VBO
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 3],
}

const STRIDE: i32 = std::mem::size_of::<GpuVertex>() as i32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Triangles,
    Lines,
    Points,
}

impl Primitive {
    pub fn gl_mode(self) -> u32 {
        match self {
            Primitive::Triangles => Gl::TRIANGLES,
            Primitive::Lines => Gl::LINES,
            Primitive::Points => Gl::POINTS,
        }
    }
}

/// CPU-side vertex data for one shape
#[derive(Debug, Clone)]
pub struct PackedShape {
    pub vertices: Vec<GpuVertex>,
    pub primitive: Primitive,
    pub blend: Blend,
    pub point_size: f32,
}

pub fn pack_shape(shape: Shape<'_>) -> PackedShape {
    match shape {
        Shape::Mesh(mesh) => {
            let vertices = mesh
                .triangles
                .iter()
                .flat_map(|triangle| {
                    let face = triangle.calculate_normal();
                    triangle.vertices.iter().map(move |vertex| {
                        // Degenerate vertex normals fall back to the face.
                        let normal = if vertex.normal.norm_squared() > 0.0 {
                            vertex.normal
                        } else {
                            face
                        };
                        GpuVertex {
                            position: vertex.position.coords.into(),
                            normal: normal.into(),
                            color: vertex.color.to_array(),
                        }
                    })
                })
                .collect();
            PackedShape {
                vertices,
                primitive: Primitive::Triangles,
                blend: mesh.blend,
                point_size: 1.0,
            }
        }
        Shape::Lines(lines) => {
            let vertices = lines
                .segments
                .iter()
                .flat_map(|segment| {
                    [segment.start, segment.end].map(|point| GpuVertex {
                        position: point.coords.into(),
                        normal: [0.0; 3],
                        color: segment.color.to_array(),
                    })
                })
                .collect();
            PackedShape {
                vertices,
                primitive: Primitive::Lines,
                blend: Blend::Opaque,
                point_size: 1.0,
            }
        }
        Shape::Points(cloud) => {
            let vertices = cloud
                .points
                .iter()
                .map(|(point, color)| GpuVertex {
                    position: point.coords.into(),
                    normal: [0.0; 3],
                    color: color.to_array(),
                })
                .collect();
            PackedShape {
                vertices,
                primitive: Primitive::Points,
                blend: Blend::Opaque,
                point_size: cloud.size,
            }
        }
    }
}

/// Frame lights flattened into the lit program's uniform arrays, in eye space
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LightUniforms {
    pub count: i32,
    pub kinds: [i32; MAX_LIGHTS],
    pub vectors: [f32; MAX_LIGHTS * 3],
    pub colors: [f32; MAX_LIGHTS * 3],
    pub ranges: [f32; MAX_LIGHTS],
}

impl LightUniforms {
    pub fn from_frame(frame: &Frame) -> Self {
        if frame.lights.len() > MAX_LIGHTS {
            log::warn!("{} lights in frame, only {} are used", frame.lights.len(), MAX_LIGHTS);
        }

        let mut uniforms = Self::default();
        for (slot, light) in frame.lights.iter().take(MAX_LIGHTS).enumerate() {
            let (kind, vector, color, range): (i32, Vector3<f32>, _, f32) = match *light {
                Light::Directional {
                    direction,
                    color,
                    intensity,
                } => (0, frame.view.transform_vector(&direction), radiance(color, intensity), 1.0),
                Light::Point {
                    position,
                    color,
                    intensity,
                    range,
                } => (
                    1,
                    frame.view.transform_point(&position).coords,
                    radiance(color, intensity),
                    range.max(1e-3),
                ),
            };
            uniforms.kinds[slot] = kind;
            uniforms.vectors[slot * 3..slot * 3 + 3].copy_from_slice(vector.as_slice());
            uniforms.colors[slot * 3..slot * 3 + 3].copy_from_slice(&color);
            uniforms.ranges[slot] = range;
            uniforms.count += 1;
        }
        uniforms
    }
}

/// Light color times intensity. Not clamped: flashes brighter than 1 must
/// reach the shader intact.
fn radiance(color: Rgb, intensity: f32) -> [f32; 3] {
    color.to_array().map(|channel| channel * intensity)
}

/// A shape living in GPU memory
pub struct GpuShape {
    vao: WebGlVertexArrayObject,
    vbo: WebGlBuffer,
    count: i32,
    pub primitive: Primitive,
    pub blend: Blend,
    pub point_size: f32,
}

impl GpuShape {
    pub fn upload(gl: &Gl, packed: &PackedShape) -> Result<Self, JsValue> {
        let vao = gl
            .create_vertex_array()
            .ok_or_else(|| JsValue::from_str("unable to create vertex array"))?;
        let vbo = gl
            .create_buffer()
            .ok_or_else(|| JsValue::from_str("unable to create buffer"))?;

        gl.bind_vertex_array(Some(&vao));
        gl.bind_buffer(Gl::ARRAY_BUFFER, Some(&vbo));
        gl.buffer_data_with_u8_array(
            Gl::ARRAY_BUFFER,
            bytemuck::cast_slice(&packed.vertices),
            Gl::STATIC_DRAW,
        );

        let float = std::mem::size_of::<f32>() as i32;
        for (location, offset) in [(ATTRIB_POSITION, 0), (ATTRIB_NORMAL, 3), (ATTRIB_COLOR, 6)] {
            gl.enable_vertex_attrib_array(location);
            gl.vertex_attrib_pointer_with_i32(location, 3, Gl::FLOAT, false, STRIDE, offset * float);
        }

        gl.bind_vertex_array(None);
        gl.bind_buffer(Gl::ARRAY_BUFFER, None);

        Ok(Self {
            vao,
            vbo,
            count: packed.vertices.len() as i32,
            primitive: packed.primitive,
            blend: packed.blend,
            point_size: packed.point_size,
        })
    }

    pub fn draw(&self, gl: &Gl) {
        gl.bind_vertex_array(Some(&self.vao));
        gl.draw_arrays(self.primitive.gl_mode(), 0, self.count);
        gl.bind_vertex_array(None);
    }

    pub fn release(self, gl: &Gl) {
        gl.delete_vertex_array(Some(&self.vao));
        gl.delete_buffer(Some(&self.vbo));
    }
}
