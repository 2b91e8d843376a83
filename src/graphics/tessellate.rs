use glam::Vec2;
use std::f32::consts::TAU;

use super::Vertex;
use crate::visual::{DrawCommand, Hsl, ShapeKind};

const CIRCLE_SEGMENTS: usize = 32;
const GLOW_LAYERS: usize = 4;
const GLOW_OPACITY: f32 = 0.35;

/// Triangulates the scene for the GPU. Shapes are filled as fans, which
/// holds for everything the canvas produces since all of it is convex.
/// A shadow becomes a few translucent copies of the outline, grown out
/// to the blur radius and drawn underneath the shape.
pub fn tessellate(commands: &[DrawCommand]) -> Vec<Vertex> {
    let mut vertices = Vec::new();
    for command in commands {
        push_command(&mut vertices, command);
    }
    vertices
}

fn push_command(out: &mut Vec<Vertex>, command: &DrawCommand) {
    let outline = match &command.shape {
        ShapeKind::Polygon(points) => points.clone(),
        ShapeKind::Circle { center, radius } => circle_outline(*center, *radius),
    };
    if outline.len() < 3 || area(&outline) <= f32::EPSILON {
        return;
    }

    if let Some(shadow) = command.shadow.filter(|s| s.blur > 0.0) {
        let centroid = outline.iter().copied().sum::<Vec2>() / outline.len() as f32;
        let color = rgba(shadow.color, command.alpha * GLOW_OPACITY / GLOW_LAYERS as f32);

        for layer in (1..=GLOW_LAYERS).rev() {
            let grow = shadow.blur * layer as f32 / GLOW_LAYERS as f32;
            let expanded: Vec<Vec2> = outline
                .iter()
                .map(|&p| p + (p - centroid).normalize_or_zero() * grow)
                .collect();
            push_fan(out, &expanded, color);
        }
    }

    push_fan(out, &outline, rgba(command.color, command.alpha));
}

fn circle_outline(center: Vec2, radius: f32) -> Vec<Vec2> {
    (0..CIRCLE_SEGMENTS)
        .map(|i| {
            let angle = i as f32 / CIRCLE_SEGMENTS as f32 * TAU;
            center + Vec2::new(angle.cos(), angle.sin()) * radius
        })
        .collect()
}

fn area(points: &[Vec2]) -> f32 {
    let doubled: f32 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.perp_dot(*b))
        .sum();
    doubled.abs() / 2.0
}

fn push_fan(out: &mut Vec<Vertex>, points: &[Vec2], color: [f32; 4]) {
    let anchor = points[0];
    for pair in points[1..].windows(2) {
        for p in [anchor, pair[0], pair[1]] {
            out.push(Vertex {
                position: p.to_array(),
                color,
            });
        }
    }
}

fn rgba(color: Hsl, alpha: f32) -> [f32; 4] {
    let [r, g, b] = color.to_rgb();
    [r, g, b, alpha]
}
