use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use crate::config::VisualizerConfig;

/// Anything that can hand the renderer the magnitudes of "right now".
pub trait SpectrumProvider {
    /// One byte per frequency bin, 0 = silent, 255 = at or above the loudness ceiling.
    fn current_magnitudes(&mut self) -> &[u8];
}

/// Writer side of the analyser: the most recent `capacity` mono samples
/// of whatever is currently playing.
#[derive(Clone)]
pub struct AnalyserInput {
    window: Arc<Mutex<VecDeque<f32>>>,
    capacity: usize,
}

impl AnalyserInput {
    pub fn new(capacity: usize) -> Self {
        Self {
            window: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    pub fn push(&self, samples: &[f32]) {
        let mut window = self.window.lock().unwrap_or_else(PoisonError::into_inner);
        let keep = samples.len().min(self.capacity);
        window.extend(&samples[samples.len() - keep..]);
        let excess = window.len().saturating_sub(self.capacity);
        window.drain(..excess);
    }

    pub fn reset(&self) {
        self.window
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Copies the window into `out`, zero-padding the oldest end when fewer
    /// samples have arrived than the window holds.
    fn snapshot(&self, out: &mut [f32]) {
        let window = self.window.lock().unwrap_or_else(PoisonError::into_inner);
        let pad = out.len().saturating_sub(window.len());
        out[..pad].fill(0.0);
        for (slot, &sample) in out[pad..].iter_mut().zip(window.iter()) {
            *slot = sample;
        }
    }
}

/// Pull-based byte spectrum in the style of a Web Audio analyser node:
/// Blackman window, FFT, temporal smoothing, then a dB range mapped onto 0..=255.
pub struct SpectrumSource {
    input: AnalyserInput,
    fft: Arc<dyn Fft<f32>>,
    fft_size: usize,
    window: Vec<f32>,
    frame: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
    bytes: Vec<u8>,
    smoothing: f32,
    min_db: f32,
    max_db: f32,
}

impl SpectrumSource {
    pub fn new(config: &VisualizerConfig) -> Self {
        let fft_size = config.fft_size;
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);
        let bins = fft_size / 2;

        Self {
            input: AnalyserInput::new(fft_size),
            fft,
            fft_size,
            window: Self::blackman_window(fft_size),
            frame: vec![0.0; fft_size],
            buffer: vec![Complex::new(0.0, 0.0); fft_size],
            smoothed: vec![0.0; bins],
            bytes: vec![0; bins],
            smoothing: config.smoothing_time_constant,
            min_db: config.min_decibels,
            max_db: config.max_decibels,
        }
    }

    pub fn input(&self) -> AnalyserInput {
        self.input.clone()
    }

    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    fn blackman_window(size: usize) -> Vec<f32> {
        let alpha = 0.16;
        let a0 = 0.5 * (1.0 - alpha);
        let a1 = 0.5;
        let a2 = 0.5 * alpha;
        (0..size)
            .map(|i| {
                let phase = 2.0 * std::f32::consts::PI * i as f32 / size as f32;
                a0 - a1 * phase.cos() + a2 * (2.0 * phase).cos()
            })
            .collect()
    }

    fn analyze(&mut self) {
        self.input.snapshot(&mut self.frame);

        for ((slot, &sample), &weight) in self
            .buffer
            .iter_mut()
            .zip(self.frame.iter())
            .zip(self.window.iter())
        {
            *slot = Complex::new(sample * weight, 0.0);
        }

        self.fft.process(&mut self.buffer);

        let scale = 1.0 / self.fft_size as f32;
        let db_range = self.max_db - self.min_db;
        for (k, (smoothed, byte)) in self
            .smoothed
            .iter_mut()
            .zip(self.bytes.iter_mut())
            .enumerate()
        {
            let magnitude = self.buffer[k].norm() * scale;
            *smoothed = self.smoothing * *smoothed + (1.0 - self.smoothing) * magnitude;

            // log10(0) is -inf, which the clamp maps to 0
            let db = 20.0 * smoothed.log10();
            let scaled = (255.0 / db_range) * (db - self.min_db);
            *byte = scaled.floor().clamp(0.0, 255.0) as u8;
        }
    }
}

impl SpectrumProvider for SpectrumSource {
    fn current_magnitudes(&mut self) -> &[u8] {
        self.analyze();
        &self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(bin: usize, amplitude: f32, fft_size: usize) -> Vec<f32> {
        (0..fft_size)
            .map(|n| {
                let phase = 2.0 * std::f32::consts::PI * bin as f32 * n as f32 / fft_size as f32;
                amplitude * phase.sin()
            })
            .collect()
    }

    #[test]
    fn test_silence_is_all_zero() {
        let mut source = SpectrumSource::new(&VisualizerConfig::default());
        let magnitudes = source.current_magnitudes();
        assert_eq!(magnitudes.len(), 256);
        assert!(magnitudes.iter().all(|&m| m == 0));
    }

    #[test]
    fn test_sine_peaks_at_its_bin() {
        let mut source = SpectrumSource::new(&VisualizerConfig::default());
        source.input().push(&sine(40, 1.0, 512));

        let magnitudes = source.current_magnitudes().to_vec();
        let peak = magnitudes
            .iter()
            .enumerate()
            .max_by_key(|&(_, m)| *m)
            .map(|(i, _)| i)
            .unwrap();

        assert_eq!(magnitudes[40], 255);
        assert_eq!(peak, 40);
        // far away from the tone the window keeps leakage below the floor
        assert_eq!(magnitudes[200], 0);
    }

    #[test]
    fn test_window_keeps_most_recent_samples() {
        let input = AnalyserInput::new(4);
        input.push(&[1.0, 2.0, 3.0]);
        input.push(&[4.0, 5.0, 6.0]);

        let mut out = [0.0; 4];
        input.snapshot(&mut out);
        assert_eq!(out, [3.0, 4.0, 5.0, 6.0]);

        input.reset();
        input.push(&[7.0]);
        input.snapshot(&mut out);
        assert_eq!(out, [0.0, 0.0, 0.0, 7.0]);
    }

    #[test]
    fn test_smoothing_decays_after_reset() {
        let mut source = SpectrumSource::new(&VisualizerConfig::default());
        // quiet enough that the peak sits inside the dB range instead of at the ceiling
        source.input().push(&sine(10, 0.01, 512));
        let loud = source.current_magnitudes()[10];

        source.input().reset();
        let after = source.current_magnitudes()[10];
        assert!(after < loud);
        assert!(after > 0);
    }
}
