/// Random starfield on a thick spherical shell
use std::f32::consts::PI;

use nalgebra::Point3;
use rand::Rng;

use crate::color::Rgb;
use crate::geometry::PointCloud;

pub const DEFAULT_STAR_COUNT: usize = 2000;

/// Shell parameters for [`Starfield::generate`]
#[derive(Debug, Clone, Copy)]
pub struct Starfield {
    pub count: usize,
    pub min_radius: f32,
    pub max_radius: f32,
    pub hue: f32,
    pub saturation: f32,
    pub size: f32,
}

impl Default for Starfield {
    fn default() -> Self {
        Self {
            count: DEFAULT_STAR_COUNT,
            min_radius: 25.0,
            max_radius: 50.0,
            hue: 0.6,
            saturation: 0.2,
            size: 0.2,
        }
    }
}

impl Starfield {
    pub fn with_count(count: usize) -> Self {
        Self {
            count,
            ..Self::default()
        }
    }

    /// Directions are uniform over the sphere; the radius is uniform in
    /// `[min_radius, max_radius)` and the lightness is uniform in `[0, 1)`.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> PointCloud {
        let points = (0..self.count)
            .map(|_| {
                let radius = self.min_radius + rng.gen::<f32>() * (self.max_radius - self.min_radius);
                let theta = 2.0 * PI * rng.gen::<f32>();
                let phi = (2.0 * rng.gen::<f32>() - 1.0).acos();

                let position = Point3::new(
                    radius * phi.sin() * theta.cos(),
                    radius * phi.sin() * theta.sin(),
                    radius * phi.cos(),
                );
                let color = Rgb::from_hsl(self.hue, self.saturation, rng.gen());
                (position, color)
            })
            .collect();

        PointCloud {
            points,
            size: self.size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_stars_lie_in_shell() {
        let mut rng = StdRng::seed_from_u64(7);
        let stars = Starfield::with_count(500).generate(&mut rng);
        assert_eq!(stars.points.len(), 500);
        assert!((stars.size - 0.2).abs() < 1e-6);
        for (p, _) in &stars.points {
            let r = p.coords.norm();
            assert!((25.0 - 1e-3..50.0 + 1e-3).contains(&r), "radius {r}");
        }
    }

    #[test]
    fn test_same_seed_same_sky() {
        let field = Starfield::with_count(50);
        let a = field.generate(&mut StdRng::seed_from_u64(3));
        let b = field.generate(&mut StdRng::seed_from_u64(3));
        for ((pa, ca), (pb, cb)) in a.points.iter().zip(&b.points) {
            assert_eq!(pa, pb);
            assert_eq!(ca, cb);
        }
    }

    #[test]
    fn test_directions_cover_both_hemispheres() {
        let mut rng = StdRng::seed_from_u64(11);
        let stars = Starfield::default().generate(&mut rng);
        let above = stars.points.iter().filter(|(p, _)| p.z > 0.0).count();
        let ratio = above as f32 / stars.points.len() as f32;
        assert!((0.4..0.6).contains(&ratio));
    }
}
