use glam::Vec2;
use rand::Rng;

/// Per-frame phase advance of every particle's sway.
pub const SWAY_STEP: f32 = 0.02;
/// Sway offset, in pixels, of a bin at full magnitude.
pub const SWAY_AMPLITUDE: f32 = 20.0;

/// Where a bin sits in the bin range. Decided by index, not by frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    /// First 30% of the bins, drawn as triangles.
    Low,
    /// 30% to 60%, drawn as squares.
    Mid,
    /// The rest, drawn as circles.
    High,
}

impl Band {
    pub fn classify(index: usize, bin_count: usize) -> Band {
        let position = index as f32;
        let len = bin_count as f32;
        if position < len * 0.3 {
            Band::Low
        } else if position < len * 0.6 {
            Band::Mid
        } else {
            Band::High
        }
    }

    /// Visual size grows linearly with magnitude; higher bands draw larger.
    pub fn size(self, magnitude: u8) -> f32 {
        let height = magnitude as f32 * 1.5;
        match self {
            Band::Low => height / 6.0,
            Band::Mid => height / 4.0,
            Band::High => height / 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShapeParticle {
    pub position: Vec2,
    pub speed: f32,
    pub sway: f32,
}

/// One particle per frequency bin, living for the whole session.
pub struct ShapeField {
    particles: Vec<ShapeParticle>,
}

impl ShapeField {
    pub fn new<R: Rng + ?Sized>(count: usize, canvas: Vec2, rng: &mut R) -> Self {
        let particles = (0..count)
            .map(|_| ShapeParticle {
                position: Vec2::new(rng.random::<f32>() * canvas.x, rng.random::<f32>() * canvas.y),
                speed: rng.random_range(0.2..0.7),
                sway: rng.random_range(-1.0..1.0),
            })
            .collect();

        Self { particles }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn particles(&self) -> &[ShapeParticle] {
        &self.particles
    }

    /// Moves particle `index` one frame and returns where to draw it.
    ///
    /// Louder bins drift right faster. Past the right edge plus `size` the
    /// particle re-enters just off the left edge at a random height. The draw
    /// position is swayed around the particle by an amount that scales with
    /// magnitude, while the sway phase itself always advances by `SWAY_STEP`.
    pub fn advance<R: Rng + ?Sized>(
        &mut self,
        index: usize,
        magnitude: u8,
        size: f32,
        canvas: Vec2,
        rng: &mut R,
    ) -> Vec2 {
        let level = magnitude as f32 / 255.0;
        let particle = &mut self.particles[index];

        particle.position.x += particle.speed * level;
        if particle.position.x > canvas.x + size {
            particle.position.x = -size;
            particle.position.y = rng.random::<f32>() * canvas.y;
        }

        let amplitude = level * SWAY_AMPLITUDE;
        let drawn = particle.position + Vec2::new(particle.sway.sin(), particle.sway.cos()) * amplitude;
        particle.sway += SWAY_STEP;
        drawn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_band_boundaries() {
        for i in 0..=76 {
            assert_eq!(Band::classify(i, 256), Band::Low, "index {}", i);
        }
        for i in 77..=153 {
            assert_eq!(Band::classify(i, 256), Band::Mid, "index {}", i);
        }
        for i in 154..256 {
            assert_eq!(Band::classify(i, 256), Band::High, "index {}", i);
        }
    }

    #[test]
    fn test_band_sizes() {
        assert_eq!(Band::Low.size(200), 50.0);
        assert_eq!(Band::Mid.size(200), 75.0);
        assert_eq!(Band::High.size(200), 150.0);
        assert_eq!(Band::High.size(0), 0.0);
    }

    #[test]
    fn test_initial_particles() {
        let mut rng = StdRng::seed_from_u64(1);
        let canvas = Vec2::new(800.0, 600.0);
        let field = ShapeField::new(256, canvas, &mut rng);
        assert_eq!(field.len(), 256);
        assert!(!field.is_empty());
        assert!(ShapeField::new(0, canvas, &mut rng).is_empty());
        for p in field.particles() {
            assert!((0.0..800.0).contains(&p.position.x));
            assert!((0.0..600.0).contains(&p.position.y));
            assert!((0.2..0.7).contains(&p.speed));
            assert!((-1.0..1.0).contains(&p.sway));
        }
    }

    #[test]
    fn test_silent_bin_does_not_move_but_phase_advances() {
        let mut rng = StdRng::seed_from_u64(2);
        let canvas = Vec2::new(800.0, 600.0);
        let mut field = ShapeField::new(4, canvas, &mut rng);
        let before = field.particles()[3].clone();

        let drawn = field.advance(3, 0, 0.0, canvas, &mut rng);
        let after = &field.particles()[3];

        assert_eq!(drawn, before.position);
        assert_eq!(after.position, before.position);
        assert!((after.sway - (before.sway + SWAY_STEP)).abs() < 1e-6);
    }

    #[test]
    fn test_drift_and_sway_follow_magnitude() {
        let mut rng = StdRng::seed_from_u64(3);
        let canvas = Vec2::new(800.0, 600.0);
        let mut field = ShapeField::new(1, canvas, &mut rng);
        field.particles[0] = ShapeParticle {
            position: Vec2::new(100.0, 100.0),
            speed: 0.5,
            sway: 0.0,
        };

        let drawn = field.advance(0, 255, 10.0, canvas, &mut rng);
        assert!((field.particles()[0].position.x - 100.5).abs() < 1e-5);
        // sin(0) = 0 sideways, cos(0) = 1 downwards at full amplitude
        assert!((drawn.x - 100.5).abs() < 1e-5);
        assert!((drawn.y - 120.0).abs() < 1e-5);
    }

    #[test]
    fn test_wraps_past_right_edge() {
        let mut rng = StdRng::seed_from_u64(4);
        let canvas = Vec2::new(800.0, 600.0);
        let mut field = ShapeField::new(1, canvas, &mut rng);
        field.particles[0].position = Vec2::new(810.0, 50.0);
        field.particles[0].speed = 0.6;

        field.advance(0, 255, 10.0, canvas, &mut rng);
        let p = &field.particles()[0];
        assert_eq!(p.position.x, -10.0);
        assert!((0.0..600.0).contains(&p.position.y));
    }

    #[test]
    fn test_never_escapes_the_field() {
        let mut rng = StdRng::seed_from_u64(5);
        let canvas = Vec2::new(320.0, 200.0);
        let mut field = ShapeField::new(256, canvas, &mut rng);
        let max_size = Band::High.size(255);

        for frame in 0..20_000usize {
            for index in (0..256).step_by(4) {
                let magnitude = ((frame * 7 + index * 13) % 256) as u8;
                let size = Band::classify(index, 256).size(magnitude);
                field.advance(index, magnitude, size, canvas, &mut rng);

                let x = field.particles()[index].position.x;
                assert!(x <= canvas.x + size, "x {} escaped at frame {}", x, frame);
                assert!(x >= -max_size, "x {} too far left at frame {}", x, frame);
            }
        }
    }
}
