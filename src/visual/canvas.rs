use glam::{Affine2, Vec2};

use super::Hsl;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shadow {
    pub blur: f32,
    pub color: Hsl,
}

/// Immediate-mode 2D drawing surface with a save/restore state stack,
/// modelled on the HTML canvas context.
pub trait Canvas {
    fn size(&self) -> Vec2;
    fn clear(&mut self);

    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, offset: Vec2);
    fn rotate(&mut self, angle: f32);

    fn set_global_alpha(&mut self, alpha: f32);
    fn set_fill(&mut self, color: Hsl);
    fn set_shadow(&mut self, blur: f32, color: Hsl);
    fn clear_shadow(&mut self);

    fn fill_polygon(&mut self, points: &[Vec2]);
    fn fill_rect(&mut self, origin: Vec2, size: Vec2);
    fn fill_circle(&mut self, center: Vec2, radius: f32);
}

#[derive(Debug, Clone, PartialEq)]
pub enum ShapeKind {
    /// Convex outline in screen space.
    Polygon(Vec<Vec2>),
    Circle { center: Vec2, radius: f32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    pub shape: ShapeKind,
    pub color: Hsl,
    pub alpha: f32,
    pub shadow: Option<Shadow>,
}

#[derive(Debug, Clone, Copy)]
struct DrawState {
    transform: Affine2,
    alpha: f32,
    fill: Hsl,
    shadow: Option<Shadow>,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            transform: Affine2::IDENTITY,
            alpha: 1.0,
            fill: Hsl::new(0.0, 0.0, 0.0),
            shadow: None,
        }
    }
}

/// A canvas that keeps what was drawn on it. Commands are stored in screen
/// space with the current transform already applied, and stay until the
/// next `clear`, the way canvas pixels do.
pub struct Scene {
    size: Vec2,
    commands: Vec<DrawCommand>,
    state: DrawState,
    stack: Vec<DrawState>,
    draw_calls: usize,
}

impl Scene {
    pub fn new(size: Vec2) -> Self {
        Self {
            size,
            commands: Vec::new(),
            state: DrawState::default(),
            stack: Vec::new(),
            draw_calls: 0,
        }
    }

    pub fn resize(&mut self, size: Vec2) {
        self.size = size;
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Drawing operations (clears included) issued since creation.
    pub fn draw_calls(&self) -> usize {
        self.draw_calls
    }

    fn record(&mut self, shape: ShapeKind) {
        self.draw_calls += 1;
        self.commands.push(DrawCommand {
            shape,
            color: self.state.fill,
            alpha: self.state.alpha,
            shadow: self.state.shadow,
        });
    }
}

impl Canvas for Scene {
    fn size(&self) -> Vec2 {
        self.size
    }

    fn clear(&mut self) {
        self.draw_calls += 1;
        self.commands.clear();
    }

    fn save(&mut self) {
        self.stack.push(self.state);
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    fn translate(&mut self, offset: Vec2) {
        self.state.transform = self.state.transform * Affine2::from_translation(offset);
    }

    fn rotate(&mut self, angle: f32) {
        self.state.transform = self.state.transform * Affine2::from_angle(angle);
    }

    fn set_global_alpha(&mut self, alpha: f32) {
        self.state.alpha = alpha.clamp(0.0, 1.0);
    }

    fn set_fill(&mut self, color: Hsl) {
        self.state.fill = color;
    }

    fn set_shadow(&mut self, blur: f32, color: Hsl) {
        self.state.shadow = Some(Shadow { blur, color });
    }

    fn clear_shadow(&mut self) {
        self.state.shadow = None;
    }

    fn fill_polygon(&mut self, points: &[Vec2]) {
        let transform = self.state.transform;
        let points = points.iter().map(|&p| transform.transform_point2(p)).collect();
        self.record(ShapeKind::Polygon(points));
    }

    fn fill_rect(&mut self, origin: Vec2, size: Vec2) {
        let corners = [
            origin,
            origin + Vec2::new(size.x, 0.0),
            origin + size,
            origin + Vec2::new(0.0, size.y),
        ];
        self.fill_polygon(&corners);
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32) {
        let center = self.state.transform.transform_point2(center);
        self.record(ShapeKind::Circle { center, radius });
    }
}
