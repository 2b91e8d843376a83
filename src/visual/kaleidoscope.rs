use glam::Vec2;
use std::f32::consts::{PI, TAU};

use super::{Canvas, Hsl};

pub const BACKGROUND_ALPHA: f32 = 0.1;
const PULSE_SCALE: f32 = 20.0;

/// One wedge of the background, in its own rotated frame centred on the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub angle: f32,
    pub hue: f32,
    pub triangle: [Vec2; 3],
}

/// Mean magnitude, normalised to 0..=1 and scaled to a pixel offset.
pub fn pulse(magnitudes: &[u8]) -> f32 {
    if magnitudes.is_empty() {
        return 0.0;
    }
    let sum: u32 = magnitudes.iter().map(|&m| m as u32).sum();
    let mean = sum as f32 / magnitudes.len() as f32;
    mean / 255.0 * PULSE_SCALE
}

/// `count` wedges evenly spaced around the circle. Each spans the centre,
/// the pulsed point on the circle at its angle, and that point mirrored
/// across the wedge's own axis.
pub fn segments(magnitudes: &[u8], canvas: Vec2, count: usize) -> Vec<Segment> {
    let radius = canvas.x.min(canvas.y) / 2.0;
    let pulse = pulse(magnitudes);
    let step = TAU / count.max(1) as f32;

    (0..count)
        .map(|i| {
            let angle = i as f32 * step;
            let tip = Vec2::new(angle.cos() * radius + pulse, angle.sin() * radius + pulse);
            Segment {
                angle,
                hue: angle / PI * 180.0,
                triangle: [Vec2::ZERO, tip, Vec2::new(tip.x, -tip.y)],
            }
        })
        .collect()
}

pub fn draw<C: Canvas + ?Sized>(canvas: &mut C, magnitudes: &[u8], count: usize) {
    let size = canvas.size();
    let center = size / 2.0;

    // the background never glows, whatever the shapes left behind
    canvas.clear_shadow();
    for segment in segments(magnitudes, size, count) {
        canvas.save();
        canvas.translate(center);
        canvas.rotate(segment.angle);
        canvas.set_global_alpha(BACKGROUND_ALPHA);
        canvas.set_fill(Hsl::new(segment.hue, 50.0, 50.0));
        canvas.fill_polygon(&segment.triangle);
        canvas.restore();
    }
    canvas.set_global_alpha(1.0);
}
