/// Linear RGB color with channels in 0..=1
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);
    pub const RED: Rgb = Rgb::new(1.0, 0.0, 0.0);
    pub const GREEN: Rgb = Rgb::new(0.0, 1.0, 0.0);
    pub const BLUE: Rgb = Rgb::new(0.0, 0.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// `0xRRGGBB`
    pub fn from_hex(hex: u32) -> Self {
        let channel = |shift: u32| ((hex >> shift) & 0xff) as f32 / 255.0;
        Self::new(channel(16), channel(8), channel(0))
    }

    /// Hue, saturation and lightness, all in 0..=1.
    pub fn from_hsl(h: f32, s: f32, l: f32) -> Self {
        let h = h.rem_euclid(1.0);
        let s = s.clamp(0.0, 1.0);
        let l = l.clamp(0.0, 1.0);

        if s == 0.0 {
            return Self::new(l, l, l);
        }

        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;

        Self::new(
            hue_to_channel(p, q, h + 1.0 / 3.0),
            hue_to_channel(p, q, h),
            hue_to_channel(p, q, h - 1.0 / 3.0),
        )
    }

    pub fn scaled(self, factor: f32) -> Self {
        Self::new(self.r * factor, self.g * factor, self.b * factor).clamped()
    }

    /// Channel-wise sum, saturating at 1.
    pub fn add(self, other: Rgb) -> Self {
        Self::new(self.r + other.r, self.g + other.g, self.b + other.b).clamped()
    }

    pub fn lerp(self, other: Rgb, t: f32) -> Self {
        Self::new(
            self.r + (other.r - self.r) * t,
            self.g + (other.g - self.g) * t,
            self.b + (other.b - self.b) * t,
        )
    }

    /// Relative luminance with Rec. 709 weights.
    pub fn luminance(&self) -> f32 {
        0.2126 * self.r + 0.7152 * self.g + 0.0722 * self.b
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    pub fn to_u8(self) -> [u8; 3] {
        let c = self.clamped();
        [
            (c.r * 255.0).round() as u8,
            (c.g * 255.0).round() as u8,
            (c.b * 255.0).round() as u8,
        ]
    }

    fn clamped(self) -> Self {
        Self::new(
            self.r.clamp(0.0, 1.0),
            self.g.clamp(0.0, 1.0),
            self.b.clamp(0.0, 1.0),
        )
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::BLACK
    }
}

fn hue_to_channel(p: f32, q: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Rgb, b: Rgb) -> bool {
        (a.r - b.r).abs() < 1e-4 && (a.g - b.g).abs() < 1e-4 && (a.b - b.b).abs() < 1e-4
    }

    #[test]
    fn test_from_hex() {
        let c = Rgb::from_hex(0xffffaa);
        assert!(close(c, Rgb::new(1.0, 1.0, 170.0 / 255.0)));
    }

    #[test]
    fn test_hsl_primaries() {
        assert!(close(Rgb::from_hsl(0.0, 1.0, 0.5), Rgb::RED));
        assert!(close(Rgb::from_hsl(1.0 / 3.0, 1.0, 0.5), Rgb::GREEN));
        assert!(close(Rgb::from_hsl(2.0 / 3.0, 1.0, 0.5), Rgb::BLUE));
    }

    #[test]
    fn test_hsl_lightness_extremes() {
        assert!(close(Rgb::from_hsl(0.6, 0.2, 0.0), Rgb::BLACK));
        assert!(close(Rgb::from_hsl(0.6, 0.2, 1.0), Rgb::WHITE));
    }

    #[test]
    fn test_hsl_star_tint_is_bluish() {
        let c = Rgb::from_hsl(0.6, 0.2, 0.5);
        assert!(c.b > c.r);
        assert!((c.luminance() - 0.5).abs() < 0.1);
    }

    #[test]
    fn test_add_saturates() {
        let c = Rgb::new(0.8, 0.5, 0.0).add(Rgb::new(0.5, 0.2, 0.1));
        assert!(close(c, Rgb::new(1.0, 0.7, 0.1)));
    }

    #[test]
    fn test_to_u8() {
        assert_eq!(Rgb::new(1.0, 0.0, 2.0).to_u8(), [255, 0, 255]);
    }
}
