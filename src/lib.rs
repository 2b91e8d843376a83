pub mod app;
pub mod audio;
pub mod config;
pub mod controller;
pub mod graphics;
pub mod ui;
pub mod visual;

pub use app::App;
pub use config::{Args, VisualizerConfig};
