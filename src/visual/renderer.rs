use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::{generate_palette, kaleidoscope, Band, Canvas, FrameOutcome, Hsl, ShapeField};
use crate::audio::SpectrumProvider;
use crate::config::VisualizerConfig;

/// Draws one frame of the visualization: the pulsing kaleidoscope behind a
/// field of drifting, glowing shapes, one per `shape_stride`-th bin.
pub struct FrameRenderer {
    palette: Vec<Hsl>,
    field: ShapeField,
    rng: StdRng,
    shape_stride: usize,
    segments: usize,
    glow_blur: f32,
}

impl FrameRenderer {
    pub fn new(config: &VisualizerConfig, canvas: Vec2) -> Self {
        Self::with_rng(config, canvas, StdRng::from_os_rng())
    }

    pub fn with_rng(config: &VisualizerConfig, canvas: Vec2, mut rng: StdRng) -> Self {
        let palette = generate_palette(config.palette_size, &mut rng);
        let field = ShapeField::new(config.bin_count(), canvas, &mut rng);

        Self {
            palette,
            field,
            rng,
            shape_stride: config.shape_stride.max(1),
            segments: config.kaleidoscope_segments,
            glow_blur: config.glow_blur,
        }
    }

    pub fn palette(&self) -> &[Hsl] {
        &self.palette
    }

    pub fn field(&self) -> &ShapeField {
        &self.field
    }

    /// One tick of the render loop. With no active playback it touches
    /// neither the spectrum nor the canvas and ends the loop.
    pub fn draw_frame<S, C>(&mut self, active: bool, spectrum: &mut S, canvas: &mut C) -> FrameOutcome
    where
        S: SpectrumProvider + ?Sized,
        C: Canvas + ?Sized,
    {
        if !active {
            return FrameOutcome::Finished;
        }

        let magnitudes = spectrum.current_magnitudes();
        let size = canvas.size();

        canvas.clear();
        kaleidoscope::draw(canvas, magnitudes, self.segments);

        let bins = magnitudes.len().min(self.field.len());
        for index in (0..bins).step_by(self.shape_stride) {
            let magnitude = magnitudes[index];
            let band = Band::classify(index, magnitudes.len());
            let shape_size = band.size(magnitude);
            let position = self.field.advance(index, magnitude, shape_size, size, &mut self.rng);

            let color = self.palette[index % self.palette.len()];
            canvas.set_fill(color);
            canvas.set_shadow(self.glow_blur, color);

            let half = shape_size / 2.0;
            match band {
                Band::High => canvas.fill_circle(position, shape_size),
                Band::Mid => canvas.fill_rect(position - Vec2::splat(half), Vec2::splat(shape_size)),
                Band::Low => canvas.fill_polygon(&[
                    position + Vec2::new(0.0, -half),
                    position + Vec2::new(-half, half),
                    position + Vec2::new(half, half),
                ]),
            }
        }

        FrameOutcome::Reschedule
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visual::{FrameLoop, Scene, ShapeKind};

    struct FixedSpectrum {
        magnitudes: Vec<u8>,
        reads: usize,
    }

    impl FixedSpectrum {
        fn new(value: u8) -> Self {
            Self {
                magnitudes: vec![value; 256],
                reads: 0,
            }
        }
    }

    impl SpectrumProvider for FixedSpectrum {
        fn current_magnitudes(&mut self) -> &[u8] {
            self.reads += 1;
            &self.magnitudes
        }
    }

    fn renderer() -> FrameRenderer {
        FrameRenderer::with_rng(
            &VisualizerConfig::default(),
            Vec2::new(800.0, 600.0),
            StdRng::seed_from_u64(11),
        )
    }

    #[test]
    fn test_builds_palette_and_field() {
        let renderer = renderer();
        assert_eq!(renderer.palette().len(), 150);
        assert_eq!(renderer.field().len(), 256);
    }

    #[test]
    fn test_frame_draws_background_and_sixty_four_shapes() {
        let mut renderer = renderer();
        let mut spectrum = FixedSpectrum::new(128);
        let mut scene = Scene::new(Vec2::new(800.0, 600.0));

        let outcome = renderer.draw_frame(true, &mut spectrum, &mut scene);
        assert_eq!(outcome, FrameOutcome::Reschedule);
        assert_eq!(spectrum.reads, 1);

        let commands = scene.commands();
        assert_eq!(commands.len(), 6 + 64);

        let shapes = &commands[6..];
        let triangles = shapes
            .iter()
            .filter(|c| matches!(&c.shape, ShapeKind::Polygon(p) if p.len() == 3))
            .count();
        let squares = shapes
            .iter()
            .filter(|c| matches!(&c.shape, ShapeKind::Polygon(p) if p.len() == 4))
            .count();
        let circles = shapes
            .iter()
            .filter(|c| matches!(c.shape, ShapeKind::Circle { .. }))
            .count();
        assert_eq!((triangles, squares, circles), (20, 19, 25));

        for (n, command) in shapes.iter().enumerate() {
            let index = n * 4;
            let color = renderer.palette()[index % 150];
            assert_eq!(command.color, color);
            assert_eq!(command.alpha, 1.0);
            assert_eq!(command.shadow.map(|s| (s.blur, s.color)), Some((20.0, color)));
        }
    }

    #[test]
    fn test_shape_sizes_follow_band() {
        let mut renderer = renderer();
        let mut spectrum = FixedSpectrum::new(200);
        let mut scene = Scene::new(Vec2::new(800.0, 600.0));
        renderer.draw_frame(true, &mut spectrum, &mut scene);

        match &scene.commands()[6 + 63].shape {
            ShapeKind::Circle { radius, .. } => assert_eq!(*radius, 150.0),
            other => panic!("expected circle, got {:?}", other),
        }
        match &scene.commands()[6 + 20].shape {
            ShapeKind::Polygon(points) => assert!(((points[2] - points[0]).x - 75.0).abs() < 1e-3),
            other => panic!("expected square, got {:?}", other),
        }
    }

    #[test]
    fn test_each_frame_replaces_the_previous_one() {
        let mut renderer = renderer();
        let mut spectrum = FixedSpectrum::new(90);
        let mut scene = Scene::new(Vec2::new(800.0, 600.0));

        renderer.draw_frame(true, &mut spectrum, &mut scene);
        renderer.draw_frame(true, &mut spectrum, &mut scene);
        assert_eq!(scene.commands().len(), 70);
    }

    #[test]
    fn test_inactive_frame_draws_nothing_and_stops_the_loop() {
        let mut renderer = renderer();
        let mut spectrum = FixedSpectrum::new(128);
        let mut scene = Scene::new(Vec2::new(800.0, 600.0));
        let mut frames = FrameLoop::new();

        frames.schedule();
        let outcome = frames.run_pending(|| renderer.draw_frame(true, &mut spectrum, &mut scene));
        assert_eq!(outcome, Some(FrameOutcome::Reschedule));
        let calls = scene.draw_calls();
        let drawn = scene.commands().len();

        // playback handle cleared: the already queued frame is the last one
        let outcome = frames.run_pending(|| renderer.draw_frame(false, &mut spectrum, &mut scene));
        assert_eq!(outcome, Some(FrameOutcome::Finished));
        assert_eq!(scene.draw_calls(), calls);
        assert_eq!(scene.commands().len(), drawn);
        assert_eq!(spectrum.reads, 1);
        assert!(!frames.is_queued());
    }
}
