use ::palette::{FromColor, Srgb};
use rand::Rng;

/// Hue in degrees, saturation and lightness in percent, as CSS `hsl()` takes them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    pub hue: f32,
    pub saturation: f32,
    pub lightness: f32,
}

impl Hsl {
    pub const fn new(hue: f32, saturation: f32, lightness: f32) -> Self {
        Self {
            hue,
            saturation,
            lightness,
        }
    }

    /// sRGB components in 0..=1.
    pub fn to_rgb(&self) -> [f32; 3] {
        let hsl: ::palette::Hsl = ::palette::Hsl::new(
            self.hue,
            (self.saturation / 100.0).clamp(0.0, 1.0),
            (self.lightness / 100.0).clamp(0.0, 1.0),
        );
        let rgb: Srgb = Srgb::from_color(hsl);
        [rgb.red, rgb.green, rgb.blue]
    }
}

/// Subdued random colours: any hue, saturation in [50, 70), lightness in [30, 50).
pub fn generate_palette<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Vec<Hsl> {
    (0..count)
        .map(|_| {
            Hsl::new(
                rng.random_range(0.0..360.0),
                rng.random_range(50.0..70.0),
                rng.random_range(30.0..50.0),
            )
        })
        .collect()
}
