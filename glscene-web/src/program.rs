/// Shader program setup
use std::collections::HashMap;

use nalgebra::Matrix4;
use wasm_bindgen::JsValue;
use web_sys::{WebGl2RenderingContext as Gl, WebGlProgram, WebGlShader, WebGlUniformLocation};

/// Everything needed to build one shader program
#[derive(Debug, Clone, Copy)]
pub struct ProgramConfig<'a> {
    pub label: &'a str,
    pub vertex_source: &'a str,
    pub fragment_source: &'a str,
    /// Attribute names and the locations they are bound to before linking
    pub attributes: &'a [(&'a str, u32)],
    pub uniforms: &'a [&'a str],
}

impl ProgramConfig<'_> {
    pub fn attribute_location(&self, name: &str) -> Option<u32> {
        self.attributes
            .iter()
            .find(|(attribute, _)| *attribute == name)
            .map(|(_, location)| *location)
    }

    /// Catch configuration mistakes before touching the GL context.
    pub fn validate(&self) -> Result<(), String> {
        for (index, (name, location)) in self.attributes.iter().enumerate() {
            if self.attributes[..index].iter().any(|(_, other)| other == location) {
                return Err(format!("{}: attribute {} reuses location {}", self.label, name, location));
            }
            if !self.vertex_source.contains(name) {
                return Err(format!("{}: attribute {} is not declared", self.label, name));
            }
        }
        for uniform in self.uniforms {
            if !self.vertex_source.contains(uniform) && !self.fragment_source.contains(uniform) {
                return Err(format!("{}: uniform {} is not declared", self.label, uniform));
            }
        }
        Ok(())
    }
}

/// A linked program with its resolved uniform locations
pub struct Program {
    label: String,
    program: WebGlProgram,
    uniforms: HashMap<String, WebGlUniformLocation>,
}

impl Program {
    pub fn bind(&self, gl: &Gl) {
        gl.use_program(Some(&self.program));
    }

    fn location(&self, name: &str) -> Option<&WebGlUniformLocation> {
        let location = self.uniforms.get(name);
        if location.is_none() {
            log::trace!("{}: uniform {} is inactive", self.label, name);
        }
        location
    }

    pub fn set_matrix(&self, gl: &Gl, name: &str, matrix: &Matrix4<f32>) {
        // nalgebra storage is column-major like GL expects.
        gl.uniform_matrix4fv_with_f32_array(self.location(name), false, matrix.as_slice());
    }

    pub fn set_float(&self, gl: &Gl, name: &str, value: f32) {
        gl.uniform1f(self.location(name), value);
    }

    pub fn set_int(&self, gl: &Gl, name: &str, value: i32) {
        gl.uniform1i(self.location(name), value);
    }

    pub fn set_floats(&self, gl: &Gl, name: &str, values: &[f32]) {
        gl.uniform1fv_with_f32_array(self.location(name), values);
    }

    pub fn set_ints(&self, gl: &Gl, name: &str, values: &[i32]) {
        gl.uniform1iv_with_i32_array(self.location(name), values);
    }

    pub fn set_vec3s(&self, gl: &Gl, name: &str, values: &[f32]) {
        gl.uniform3fv_with_f32_array(self.location(name), values);
    }
}

/// Compile, link and resolve a program described by `config`.
pub fn setup_program(gl: &Gl, config: &ProgramConfig<'_>) -> Result<Program, JsValue> {
    config.validate().map_err(|err| JsValue::from_str(&err))?;

    let vertex = compile_shader(gl, Gl::VERTEX_SHADER, config.label, config.vertex_source)?;
    let fragment = compile_shader(gl, Gl::FRAGMENT_SHADER, config.label, config.fragment_source)?;

    let program = gl
        .create_program()
        .ok_or_else(|| JsValue::from_str("unable to create program object"))?;
    gl.attach_shader(&program, &vertex);
    gl.attach_shader(&program, &fragment);
    for (name, location) in config.attributes {
        gl.bind_attrib_location(&program, *location, name);
    }
    gl.link_program(&program);

    // The shaders are owned by the program once linked.
    gl.delete_shader(Some(&vertex));
    gl.delete_shader(Some(&fragment));

    let linked = gl
        .get_program_parameter(&program, Gl::LINK_STATUS)
        .as_bool()
        .unwrap_or(false);
    if !linked {
        let info = gl.get_program_info_log(&program).unwrap_or_default();
        gl.delete_program(Some(&program));
        return Err(JsValue::from_str(&format!("{}: link failed: {}", config.label, info)));
    }

    let mut uniforms = HashMap::new();
    for name in config.uniforms {
        match gl.get_uniform_location(&program, name) {
            Some(location) => {
                uniforms.insert((*name).to_string(), location);
            }
            // Optimized out by the driver; setting it is a no-op.
            None => log::debug!("{}: uniform {} not found after linking", config.label, name),
        }
    }

    log::info!("linked {} program ({} uniforms)", config.label, uniforms.len());
    Ok(Program {
        label: config.label.to_string(),
        program,
        uniforms,
    })
}

fn compile_shader(gl: &Gl, kind: u32, label: &str, source: &str) -> Result<WebGlShader, JsValue> {
    let shader = gl
        .create_shader(kind)
        .ok_or_else(|| JsValue::from_str("unable to create shader object"))?;
    gl.shader_source(&shader, source);
    gl.compile_shader(&shader);

    let compiled = gl
        .get_shader_parameter(&shader, Gl::COMPILE_STATUS)
        .as_bool()
        .unwrap_or(false);
    if compiled {
        Ok(shader)
    } else {
        let stage = if kind == Gl::VERTEX_SHADER { "vertex" } else { "fragment" };
        let info = gl.get_shader_info_log(&shader).unwrap_or_default();
        gl.delete_shader(Some(&shader));
        Err(JsValue::from_str(&format!("{}: {} shader failed to compile: {}", label, stage, info)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERTEX: &str = "in vec3 a_position; in vec3 a_color; uniform mat4 u_mvp;";
    const FRAGMENT: &str = "uniform float u_alpha;";

    fn config<'a>(attributes: &'a [(&'a str, u32)], uniforms: &'a [&'a str]) -> ProgramConfig<'a> {
        ProgramConfig {
            label: "test",
            vertex_source: VERTEX,
            fragment_source: FRAGMENT,
            attributes,
            uniforms,
        }
    }

    #[test]
    fn test_valid_config() {
        let config = config(&[("a_position", 0), ("a_color", 1)], &["u_mvp", "u_alpha"]);
        assert!(config.validate().is_ok());
        assert_eq!(config.attribute_location("a_color"), Some(1));
        assert_eq!(config.attribute_location("a_normal"), None);
    }

    #[test]
    fn test_duplicate_location_rejected() {
        let config = config(&[("a_position", 0), ("a_color", 0)], &[]);
        let err = config.validate().unwrap_err();
        assert!(err.contains("reuses location 0"));
    }

    #[test]
    fn test_undeclared_names_rejected() {
        assert!(config(&[("a_normal", 2)], &[]).validate().is_err());
        assert!(config(&[], &["u_missing"]).validate().is_err());
    }
}
