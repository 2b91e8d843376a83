use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "audiopicture")]
#[command(about = "Drop an audio file and watch its spectrum drive a kaleidoscope of shapes")]
pub struct Args {
    /// Audio file to load at startup, handled exactly like a drop
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// JSON file with visualizer settings
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Initial window width in logical pixels
    #[arg(long, default_value = "1200")]
    pub width: u32,

    /// Initial window height in logical pixels
    #[arg(long, default_value = "800")]
    pub height: u32,

    /// Name of the output device to play through (host default when omitted)
    #[arg(long)]
    pub output_device: Option<String>,

    /// Print the available output devices and exit
    #[arg(long)]
    pub list_devices: bool,
}

/// Analysis and drawing parameters. Every field has a default, so a config
/// file only needs to name what it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizerConfig {
    /// Transform window in samples; yields `fft_size / 2` frequency bins.
    pub fft_size: usize,
    pub smoothing_time_constant: f32,
    pub min_decibels: f32,
    pub max_decibels: f32,

    pub palette_size: usize,
    /// Only every n-th bin produces a shape.
    pub shape_stride: usize,
    pub kaleidoscope_segments: usize,
    pub glow_blur: f32,
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            fft_size: 512,
            smoothing_time_constant: 0.8,
            min_decibels: -100.0,
            max_decibels: -30.0,
            palette_size: 150,
            shape_stride: 4,
            kaleidoscope_segments: 6,
            glow_blur: 20.0,
        }
    }
}

impl VisualizerConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Self = serde_json::from_str(&json)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    pub fn validate(&self) -> Result<()> {
        if self.fft_size < 32 || !self.fft_size.is_power_of_two() {
            bail!("fft_size must be a power of two >= 32, got {}", self.fft_size);
        }
        if !(0.0..=1.0).contains(&self.smoothing_time_constant) {
            bail!(
                "smoothing_time_constant must be within [0, 1], got {}",
                self.smoothing_time_constant
            );
        }
        if self.min_decibels >= self.max_decibels {
            bail!(
                "min_decibels ({}) must be below max_decibels ({})",
                self.min_decibels,
                self.max_decibels
            );
        }
        if self.palette_size == 0 {
            bail!("palette_size must be at least 1");
        }
        if self.shape_stride == 0 {
            bail!("shape_stride must be at least 1");
        }
        if self.kaleidoscope_segments == 0 {
            bail!("kaleidoscope_segments must be at least 1");
        }
        if self.glow_blur < 0.0 {
            bail!("glow_blur must not be negative");
        }
        Ok(())
    }
}
