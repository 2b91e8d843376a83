pub mod engine;
pub mod shader;
pub mod tessellate;
pub mod vertex;

pub use engine::GraphicsEngine;
pub use shader::canvas_pipeline;
pub use tessellate::tessellate;
pub use vertex::{Vertex, VertexBuffer};
