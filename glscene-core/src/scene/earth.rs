/// Tilted, spinning Earth with clouds, an orbiting moon, stars and lightning
use std::time::Duration;

use nalgebra::{Point3, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{DrawCall, DrawTarget, Frame, Light, Scene, SceneConfig, Shape, ShapeKey};
use crate::color::Rgb;
use crate::controller::{InputEvent, OrbitController};
use crate::error::StackError;
use crate::geometry::{Blend, Mesh, PointCloud};
use crate::projection::Camera;
use crate::stack::TransformStack;
use crate::starfield::Starfield;

const EARTH: ShapeKey = "earth";
const CLOUDS: ShapeKey = "clouds";
const MOON: ShapeKey = "moon";
const STARS: ShapeKey = "stars";

const AXIAL_TILT_DEGREES: f32 = -23.4;
/// Radians per step
const EARTH_SPIN: f32 = 0.002;
const CLOUD_SPIN: f32 = 0.0023;
const MOON_ORBIT: f32 = 0.001;

const CLOUD_SCALE: f32 = 1.003;
const MOON_RADIUS: f32 = 0.27;
const MOON_DISTANCE: f32 = 3.0;

/// Random flashes from a point light
#[derive(Debug, Clone)]
pub struct Lightning {
    pub position: Point3<f32>,
    pub color: Rgb,
    pub range: f32,
    /// Probability of a strike per step
    pub chance: f64,
    pub flash: Duration,
    intensity: f32,
    remaining: Duration,
}

impl Default for Lightning {
    fn default() -> Self {
        Self {
            position: Point3::new(2.0, 5.0, -5.0),
            color: Rgb::from_hex(0xffffaa),
            range: 10.0,
            chance: 0.02,
            flash: Duration::from_millis(100),
            intensity: 0.0,
            remaining: Duration::ZERO,
        }
    }
}

impl Lightning {
    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    /// Fade out an active flash, then maybe strike again.
    pub fn update<R: Rng + ?Sized>(&mut self, step: Duration, rng: &mut R) {
        if !self.remaining.is_zero() {
            self.remaining = self.remaining.saturating_sub(step);
            if self.remaining.is_zero() {
                self.intensity = 0.0;
            }
        }

        if rng.gen_bool(self.chance.clamp(0.0, 1.0)) {
            self.intensity = rng.gen_range(2.0..4.0);
            self.remaining = self.flash;
            log::trace!("lightning strike at intensity {:.2}", self.intensity);
        }
    }

    pub fn light(&self) -> Option<Light> {
        (self.intensity > 0.0).then(|| Light::Point {
            position: self.position,
            color: self.color,
            intensity: self.intensity,
            range: self.range,
        })
    }
}

pub struct EarthScene {
    earth: Mesh,
    clouds: Mesh,
    moon: Mesh,
    stars: PointCloud,
    camera: Camera,
    orbit: OrbitController,
    stack: TransformStack,
    lightning: Lightning,
    rng: StdRng,
    /// Radians
    earth_spin: f32,
    cloud_spin: f32,
    moon_orbit: f32,
}

impl EarthScene {
    pub fn new(config: &SceneConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);

        let mut earth = Mesh::icosphere(1.0, config.earth_detail);
        earth.recolor(surface_color);

        let mut clouds = Mesh::icosphere(1.0, config.earth_detail).with_blend(Blend::Additive);
        clouds.recolor(|_| Rgb::WHITE.scaled(cloud_cover(&mut rng)));

        let mut moon = Mesh::sphere(MOON_RADIUS, 32, 32);
        moon.recolor(|_| Rgb::new(0.6, 0.6, 0.58));

        let stars = Starfield::with_count(config.star_count).generate(&mut rng);

        let mut camera = Camera::perspective(75.0, config.camera_distance.unwrap_or(10.0), 0.1, 1000.0);
        camera.set_viewport(config.viewport.0, config.viewport.1);
        let orbit = OrbitController::from_camera(&camera);

        Self {
            earth,
            clouds,
            moon,
            stars,
            camera,
            orbit,
            stack: TransformStack::new(),
            lightning: Lightning::default(),
            rng,
            earth_spin: 0.0,
            cloud_spin: 0.0,
            moon_orbit: 0.0,
        }
    }

    pub fn lightning(&self) -> &Lightning {
        &self.lightning
    }

    fn lights(&self) -> Vec<Light> {
        let sun = Light::Directional {
            direction: Vector3::new(-10.0, 10.0, 10.0).normalize(),
            color: Rgb::WHITE,
            intensity: 1.0,
        };
        std::iter::once(sun).chain(self.lightning.light()).collect()
    }
}

/// Oceans, a few continents and ice caps, keyed on latitude and longitude.
fn surface_color(p: &Point3<f32>) -> Rgb {
    let latitude = p.y.clamp(-1.0, 1.0).asin();
    let longitude = p.z.atan2(p.x);

    if latitude.abs() > 1.2 {
        return Rgb::new(0.92, 0.94, 0.96);
    }

    let land = (3.0 * longitude).sin() * (2.0 * latitude).cos() + 0.5 * (5.0 * longitude + latitude).sin();
    if land > 0.6 {
        Rgb::new(0.55, 0.45, 0.25).lerp(Rgb::new(0.2, 0.5, 0.2), latitude.cos())
    } else {
        Rgb::new(0.05, 0.15, 0.45)
    }
}

/// Patchy coverage: most vertices clear, some dense.
fn cloud_cover<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    let v: f32 = rng.gen();
    if v > 0.7 {
        0.35 * v
    } else {
        0.0
    }
}

impl Scene for EarthScene {
    fn name(&self) -> &'static str {
        "earth"
    }

    fn camera(&self) -> &Camera {
        &self.camera
    }

    fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    fn resources(&self) -> Vec<(ShapeKey, Shape<'_>)> {
        vec![
            (STARS, Shape::Points(&self.stars)),
            (EARTH, Shape::Mesh(&self.earth)),
            (CLOUDS, Shape::Mesh(&self.clouds)),
            (MOON, Shape::Mesh(&self.moon)),
        ]
    }

    fn handle_input(&mut self, event: InputEvent) {
        self.orbit.handle(event);
        self.orbit.apply(&mut self.camera);
    }

    fn update(&mut self, step: Duration) {
        let turn = std::f32::consts::TAU;
        self.earth_spin = (self.earth_spin + EARTH_SPIN) % turn;
        self.cloud_spin = (self.cloud_spin + CLOUD_SPIN) % turn;
        self.moon_orbit = (self.moon_orbit + MOON_ORBIT) % turn;
        self.lightning.update(step, &mut self.rng);
    }

    fn render(&mut self, target: &mut dyn DrawTarget) -> Result<(), StackError> {
        let view = self.camera.view_matrix();
        target.begin_frame(&Frame {
            projection: self.camera.projection_matrix(),
            view,
            lights: self.lights(),
            clear_color: Rgb::BLACK,
        });

        let ms = &mut self.stack;
        ms.push();
        ms.mult_matrix(&view);

        target.draw(DrawCall {
            key: STARS,
            shape: Shape::Points(&self.stars),
            model_view: ms.current(),
        });

        // Earth group
        ms.push();
        ms.rotate(AXIAL_TILT_DEGREES, Vector3::z());

        ms.push();
        ms.rotate(self.earth_spin.to_degrees(), Vector3::y());
        target.draw(DrawCall {
            key: EARTH,
            shape: Shape::Mesh(&self.earth),
            model_view: ms.current(),
        });
        ms.pop()?;

        ms.push();
        ms.rotate(self.cloud_spin.to_degrees(), Vector3::y());
        ms.scale(Vector3::repeat(CLOUD_SCALE));
        target.draw(DrawCall {
            key: CLOUDS,
            shape: Shape::Mesh(&self.clouds),
            model_view: ms.current(),
        });
        ms.pop()?;

        ms.pop()?;

        // Moon group
        ms.push();
        ms.rotate(self.moon_orbit.to_degrees(), Vector3::y());
        ms.translate(Vector3::new(MOON_DISTANCE, 0.0, 0.0));
        target.draw(DrawCall {
            key: MOON,
            shape: Shape::Mesh(&self.moon),
            model_view: ms.current(),
        });
        ms.pop()?;

        ms.pop()
    }
}
