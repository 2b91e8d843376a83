pub mod canvas;
pub mod frame_loop;
pub mod kaleidoscope;
pub mod palette;
pub mod particles;
pub mod renderer;

pub use canvas::{Canvas, DrawCommand, Scene, Shadow, ShapeKind};
pub use frame_loop::{FrameLoop, FrameOutcome};
pub use palette::{generate_palette, Hsl};
pub use particles::{Band, ShapeField, ShapeParticle};
pub use renderer::FrameRenderer;
