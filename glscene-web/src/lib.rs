/// glscene Web - WebGL2 front end for the transform-stack scenes
///
/// Scenes compose their transforms on the CPU exactly as in the terminal
/// renderer; this crate only uploads geometry once and feeds each composed
/// model-view matrix to a shader program.
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use glscene_core::clock::FixedTimestep;
use glscene_core::{
    Blend, DrawCall, DrawTarget, Frame, InputEvent, Scene, SceneConfig, SceneKind, ShapeKey,
};
use nalgebra::Matrix4;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{HtmlCanvasElement, MouseEvent, WebGl2RenderingContext as Gl, WheelEvent};

pub mod console;
pub mod gpu;
pub mod program;
pub mod shaders;

use gpu::{pack_shape, GpuShape, LightUniforms, Primitive};
use program::{setup_program, Program};

const ZOOM_STEP: f32 = 1.1;

/// Which shader a draw goes through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramKind {
    Unlit,
    Lit,
}

impl ProgramKind {
    /// Only triangles carry normals worth lighting.
    pub fn select(primitive: Primitive, lights: &LightUniforms) -> Self {
        if primitive == Primitive::Triangles && lights.count > 0 {
            ProgramKind::Lit
        } else {
            ProgramKind::Unlit
        }
    }
}

/// Zoom factor for a wheel delta; scrolling up moves closer.
pub fn wheel_zoom(delta_y: f64) -> Option<f32> {
    if delta_y < 0.0 {
        Some(ZOOM_STEP)
    } else if delta_y > 0.0 {
        Some(1.0 / ZOOM_STEP)
    } else {
        None
    }
}

/// GL state plus the shapes uploaded so far
struct GpuRenderer {
    gl: Gl,
    canvas: HtmlCanvasElement,
    unlit: Program,
    lit: Program,
    shapes: HashMap<ShapeKey, GpuShape>,
    projection: Matrix4<f32>,
    lights: LightUniforms,
}

impl GpuRenderer {
    fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let gl = canvas
            .get_context("webgl2")?
            .ok_or_else(|| JsValue::from_str("WebGL2 is not available"))?
            .dyn_into::<Gl>()
            .map_err(|_| JsValue::from_str("context is not WebGL2"))?;

        let unlit = setup_program(&gl, &shaders::UNLIT_PROGRAM)?;
        let lit = setup_program(&gl, &shaders::LIT_PROGRAM)?;

        gl.enable(Gl::DEPTH_TEST);
        gl.depth_func(Gl::LEQUAL);

        Ok(Self {
            gl,
            canvas,
            unlit,
            lit,
            shapes: HashMap::new(),
            projection: Matrix4::identity(),
            lights: LightUniforms::default(),
        })
    }

    fn upload(&mut self, key: ShapeKey, call: &DrawCall<'_>) -> Result<(), JsValue> {
        let packed = pack_shape(call.shape);
        let shape = GpuShape::upload(&self.gl, &packed)?;
        log::debug!("uploaded {} ({} vertices)", key, packed.vertices.len());
        if let Some(old) = self.shapes.insert(key, shape) {
            old.release(&self.gl);
        }
        Ok(())
    }

    /// Canvas size in device pixels when it differs from the drawing buffer.
    fn pending_resize(&self) -> Option<(u32, u32)> {
        let width = self.canvas.client_width().max(1) as u32;
        let height = self.canvas.client_height().max(1) as u32;
        (width != self.canvas.width() || height != self.canvas.height()).then_some((width, height))
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        self.gl.viewport(0, 0, width as i32, height as i32);
    }
}

impl DrawTarget for GpuRenderer {
    fn begin_frame(&mut self, frame: &Frame) {
        let [r, g, b] = frame.clear_color.to_array();
        self.gl.clear_color(r, g, b, 1.0);
        self.gl.clear(Gl::COLOR_BUFFER_BIT | Gl::DEPTH_BUFFER_BIT);

        // Scenes hand over model-view matrices, so the view is already baked in.
        self.projection = frame.projection;
        self.lights = LightUniforms::from_frame(frame);
    }

    fn draw(&mut self, call: DrawCall<'_>) {
        if !self.shapes.contains_key(call.key) {
            if let Err(err) = self.upload(call.key, &call) {
                log::error!("failed to upload {}: {:?}", call.key, err);
                return;
            }
        }
        let Some(shape) = self.shapes.get(call.key) else {
            return;
        };

        let gl = &self.gl;
        let program = match ProgramKind::select(shape.primitive, &self.lights) {
            ProgramKind::Lit => {
                self.lit.bind(gl);
                self.lit.set_int(gl, "u_light_count", self.lights.count);
                self.lit.set_ints(gl, "u_light_kind", &self.lights.kinds);
                self.lit.set_vec3s(gl, "u_light_vector", &self.lights.vectors);
                self.lit.set_vec3s(gl, "u_light_color", &self.lights.colors);
                self.lit.set_floats(gl, "u_light_range", &self.lights.ranges);
                self.lit.set_float(gl, "u_ambient", 0.08);
                &self.lit
            }
            ProgramKind::Unlit => {
                self.unlit.bind(gl);
                self.unlit.set_float(gl, "u_point_size", shape.point_size);
                &self.unlit
            }
        };
        program.set_matrix(gl, "u_projection", &self.projection);
        program.set_matrix(gl, "u_model_view", &call.model_view);

        match shape.blend {
            Blend::Opaque => shape.draw(gl),
            Blend::Additive => {
                gl.enable(Gl::BLEND);
                gl.blend_func(Gl::ONE, Gl::ONE);
                gl.depth_mask(false);
                shape.draw(gl);
                gl.depth_mask(true);
                gl.disable(Gl::BLEND);
            }
        }
    }
}

impl Drop for GpuRenderer {
    fn drop(&mut self) {
        for (_, shape) in self.shapes.drain() {
            shape.release(&self.gl);
        }
    }
}

/// Browser-side renderer driving one scene
#[wasm_bindgen]
pub struct WebRenderer {
    scene: Box<dyn Scene>,
    gpu: Option<GpuRenderer>,
    timestep: FixedTimestep,
    last_timestamp: Option<f64>,
    aborted_frames: u64,
}

#[wasm_bindgen]
impl WebRenderer {
    /// Create a renderer for the scene called `scene` ("shapes" or "earth").
    #[wasm_bindgen(constructor)]
    pub fn new(scene: &str) -> Result<WebRenderer, JsValue> {
        let kind = SceneKind::from_name(scene)
            .ok_or_else(|| JsValue::from_str(&format!("unknown scene: {}", scene)))?;
        let config = SceneConfig {
            seed: js_sys::Date::now() as u64,
            ..SceneConfig::default()
        };

        Ok(WebRenderer {
            scene: kind.build(&config),
            gpu: None,
            timestep: FixedTimestep::default(),
            last_timestamp: None,
            aborted_frames: 0,
        })
    }

    /// Initialize the renderer with a canvas element
    pub fn init(&mut self, canvas_id: &str) -> Result<(), JsValue> {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let canvas = document
            .get_element_by_id(canvas_id)
            .ok_or_else(|| JsValue::from_str(&format!("no element with id {}", canvas_id)))?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| JsValue::from_str(&format!("{} is not a canvas", canvas_id)))?;

        let mut gpu = GpuRenderer::new(canvas)?;
        for (key, shape) in self.scene.resources() {
            let call = DrawCall {
                key,
                shape,
                model_view: Matrix4::identity(),
            };
            gpu.upload(key, &call)?;
        }
        self.gpu = Some(gpu);

        log::info!("{} scene ready on #{}", self.scene.name(), canvas_id);
        Ok(())
    }

    /// Advance the scene to `timestamp` (milliseconds) and draw a frame
    pub fn render(&mut self, timestamp: f64) -> Result<(), JsValue> {
        let resize = self
            .gpu
            .as_ref()
            .ok_or_else(|| JsValue::from_str("renderer is not initialized"))?
            .pending_resize();
        if let Some((width, height)) = resize {
            self.resize(width, height);
        }

        let elapsed = self
            .last_timestamp
            .map(|last| ((timestamp - last) / 1000.0).max(0.0))
            .unwrap_or(0.0);
        self.last_timestamp = Some(timestamp);
        for _ in 0..self.timestep.advance(Duration::from_secs_f64(elapsed)) {
            self.scene.update(self.timestep.step());
        }

        let Some(gpu) = self.gpu.as_mut() else {
            return Err(JsValue::from_str("renderer is not initialized"));
        };
        if let Err(err) = self.scene.render(gpu) {
            self.aborted_frames += 1;
            log::error!("{} scene frame aborted: {}", self.scene.name(), err);
        }
        Ok(())
    }

    /// Rotate by a pointer drag of `dx`, `dy` pixels
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.scene.handle_input(InputEvent::Drag { dx, dy });
    }

    /// Multiplicative zoom; values above 1 move closer
    pub fn zoom(&mut self, factor: f32) {
        self.scene.handle_input(InputEvent::Zoom(factor));
    }

    pub fn reset(&mut self) {
        self.scene.handle_input(InputEvent::Reset);
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if let Some(gpu) = self.gpu.as_mut() {
            gpu.resize(width, height);
        }
        self.scene.camera_mut().set_viewport(width.max(1), height.max(1));
        log::debug!("viewport resized to {}x{}", width, height);
    }

    #[wasm_bindgen(getter)]
    pub fn scene_name(&self) -> String {
        self.scene.name().to_string()
    }

    #[wasm_bindgen(getter)]
    pub fn aborted_frames(&self) -> u32 {
        self.aborted_frames.min(u64::from(u32::MAX)) as u32
    }
}

fn window() -> Result<web_sys::Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("no window"))
}

fn request_animation_frame(callback: &Closure<dyn FnMut(f64)>) {
    let requested = window().and_then(|window| window.request_animation_frame(callback.as_ref().unchecked_ref()));
    if let Err(err) = requested {
        log::error!("requestAnimationFrame failed: {:?}", err);
    }
}

/// Render `scene` on the canvas `canvas_id` with mouse controls until the page goes away
#[wasm_bindgen]
pub fn run(canvas_id: &str, scene: &str) -> Result<(), JsValue> {
    let mut renderer = WebRenderer::new(scene)?;
    renderer.init(canvas_id)?;
    let canvas = renderer
        .gpu
        .as_ref()
        .map(|gpu| gpu.canvas.clone())
        .ok_or_else(|| JsValue::from_str("renderer is not initialized"))?;
    let renderer = Rc::new(RefCell::new(renderer));

    // Drag with the primary button to rotate
    {
        let renderer = renderer.clone();
        let on_move = Closure::<dyn FnMut(MouseEvent)>::new(move |event: MouseEvent| {
            if event.buttons() & 1 != 0 {
                renderer
                    .borrow_mut()
                    .rotate(event.movement_x() as f32, event.movement_y() as f32);
            }
        });
        canvas.add_event_listener_with_callback("mousemove", on_move.as_ref().unchecked_ref())?;
        on_move.forget();
    }

    // Wheel to zoom
    {
        let renderer = renderer.clone();
        let on_wheel = Closure::<dyn FnMut(WheelEvent)>::new(move |event: WheelEvent| {
            event.prevent_default();
            if let Some(factor) = wheel_zoom(event.delta_y()) {
                renderer.borrow_mut().zoom(factor);
            }
        });
        canvas.add_event_listener_with_callback("wheel", on_wheel.as_ref().unchecked_ref())?;
        on_wheel.forget();
    }

    // Double click to reset
    {
        let renderer = renderer.clone();
        let on_reset = Closure::<dyn FnMut(MouseEvent)>::new(move |_event: MouseEvent| {
            renderer.borrow_mut().reset();
        });
        canvas.add_event_listener_with_callback("dblclick", on_reset.as_ref().unchecked_ref())?;
        on_reset.forget();
    }

    // Animation loop; the closure keeps itself alive through `next_frame`.
    let next_frame: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
    let first_frame = next_frame.clone();
    *first_frame.borrow_mut() = Some(Closure::<dyn FnMut(f64)>::new(move |timestamp: f64| {
        if let Err(err) = renderer.borrow_mut().render(timestamp) {
            log::error!("render loop stopped: {:?}", err);
            return;
        }
        if let Some(callback) = next_frame.borrow().as_ref() {
            request_animation_frame(callback);
        }
    }));
    if let Some(callback) = first_frame.borrow().as_ref() {
        request_animation_frame(callback);
    }

    Ok(())
}

#[wasm_bindgen(start)]
pub fn main() -> Result<(), JsValue> {
    // A host page may have installed its own logger already.
    if console::init(log::LevelFilter::Info).is_ok() {
        log::debug!("console logger installed");
    }
    Ok(())
}
