/// GLSL sources and their program configurations
use crate::program::ProgramConfig;

/// Point lights and directional lights share these slots.
pub const MAX_LIGHTS: usize = 4;

pub const ATTRIB_POSITION: u32 = 0;
pub const ATTRIB_NORMAL: u32 = 1;
pub const ATTRIB_COLOR: u32 = 2;

const ATTRIBUTES: &[(&str, u32)] = &[
    ("a_position", ATTRIB_POSITION),
    ("a_normal", ATTRIB_NORMAL),
    ("a_color", ATTRIB_COLOR),
];

const UNLIT_VERTEX: &str = r#"#version 300 es
in vec3 a_position;
in vec3 a_normal;
in vec3 a_color;

uniform mat4 u_projection;
uniform mat4 u_model_view;
uniform float u_point_size;

out vec3 v_color;

void main() {
    v_color = a_color;
    gl_PointSize = u_point_size;
    gl_Position = u_projection * u_model_view * vec4(a_position, 1.0);
}
"#;

const UNLIT_FRAGMENT: &str = r#"#version 300 es
precision mediump float;

in vec3 v_color;
out vec4 frag_color;

void main() {
    frag_color = vec4(v_color, 1.0);
}
"#;

const LIT_VERTEX: &str = r#"#version 300 es
in vec3 a_position;
in vec3 a_normal;
in vec3 a_color;

uniform mat4 u_projection;
uniform mat4 u_model_view;

out vec3 v_position;
out vec3 v_normal;
out vec3 v_color;

void main() {
    vec4 eye = u_model_view * vec4(a_position, 1.0);
    v_position = eye.xyz;
    v_normal = mat3(u_model_view) * a_normal;
    v_color = a_color;
    gl_Position = u_projection * eye;
}
"#;

const LIT_FRAGMENT: &str = r#"#version 300 es
precision mediump float;

#define MAX_LIGHTS 4

in vec3 v_position;
in vec3 v_normal;
in vec3 v_color;

uniform int u_light_count;
// 0 = directional (vector is a direction), 1 = point (vector is a position)
uniform int u_light_kind[MAX_LIGHTS];
uniform vec3 u_light_vector[MAX_LIGHTS];
uniform vec3 u_light_color[MAX_LIGHTS];
uniform float u_light_range[MAX_LIGHTS];
uniform float u_ambient;

out vec4 frag_color;

void main() {
    vec3 normal = normalize(v_normal);
    vec3 light = vec3(u_ambient);
    for (int i = 0; i < MAX_LIGHTS; i++) {
        if (i >= u_light_count) {
            break;
        }
        vec3 direction = u_light_vector[i];
        float falloff = 1.0;
        if (u_light_kind[i] == 1) {
            direction = u_light_vector[i] - v_position;
            falloff = max(1.0 - length(direction) / u_light_range[i], 0.0);
        }
        float lambert = max(dot(normal, normalize(direction)), 0.0);
        light += u_light_color[i] * lambert * falloff;
    }
    frag_color = vec4(v_color * light, 1.0);
}
"#;

/// Vertex colors as-is; used for lines, points and unlit scenes.
pub const UNLIT_PROGRAM: ProgramConfig<'static> = ProgramConfig {
    label: "unlit",
    vertex_source: UNLIT_VERTEX,
    fragment_source: UNLIT_FRAGMENT,
    attributes: ATTRIBUTES,
    uniforms: &["u_projection", "u_model_view", "u_point_size"],
};

/// Lambert shading against up to [`MAX_LIGHTS`] lights in eye space.
pub const LIT_PROGRAM: ProgramConfig<'static> = ProgramConfig {
    label: "lit",
    vertex_source: LIT_VERTEX,
    fragment_source: LIT_FRAGMENT,
    attributes: ATTRIBUTES,
    uniforms: &[
        "u_projection",
        "u_model_view",
        "u_light_count",
        "u_light_kind",
        "u_light_vector",
        "u_light_color",
        "u_light_range",
        "u_ambient",
    ],
};
