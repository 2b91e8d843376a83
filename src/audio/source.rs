use rodio::Source;
use std::time::Duration;

use super::{AnalyserInput, DecodedAudio};

const TAP_BATCH: usize = 128;

/// One-shot playback of a decoded buffer from frame zero that also feeds
/// the analyser. Samples reach the output untouched; complete frames are
/// downmixed to mono and handed to the analyser in small batches.
pub struct TappedBuffer {
    audio: DecodedAudio,
    position: usize,
    tap: AnalyserInput,
    frame_sum: f32,
    pending: Vec<f32>,
}

impl TappedBuffer {
    pub fn new(audio: DecodedAudio, tap: AnalyserInput) -> Self {
        Self {
            audio,
            position: 0,
            tap,
            frame_sum: 0.0,
            pending: Vec::with_capacity(TAP_BATCH),
        }
    }

    fn flush(&mut self) {
        if !self.pending.is_empty() {
            self.tap.push(&self.pending);
            self.pending.clear();
        }
    }
}

impl Iterator for TappedBuffer {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        let Some(&sample) = self.audio.samples.get(self.position) else {
            self.flush();
            return None;
        };
        self.position += 1;

        let channels = self.audio.channels.max(1) as usize;
        self.frame_sum += sample;
        if self.position % channels == 0 {
            self.pending.push(self.frame_sum / channels as f32);
            self.frame_sum = 0.0;
            if self.pending.len() >= TAP_BATCH {
                self.flush();
            }
        }

        Some(sample)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.audio.samples.len() - self.position;
        (remaining, Some(remaining))
    }
}

impl Source for TappedBuffer {
    fn current_frame_len(&self) -> Option<usize> {
        Some(self.audio.samples.len() - self.position)
    }

    fn channels(&self) -> u16 {
        self.audio.channels
    }

    fn sample_rate(&self) -> u32 {
        self.audio.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(self.audio.duration())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{SpectrumProvider, SpectrumSource};
    use crate::config::VisualizerConfig;

    #[test]
    fn test_passes_samples_through_unchanged() {
        let audio = DecodedAudio::new(2, 8000, vec![0.1, 0.3, -0.2, 0.4, 0.5, 0.5]);
        let tap = AnalyserInput::new(512);
        let played: Vec<f32> = TappedBuffer::new(audio.clone(), tap).collect();
        assert_eq!(played, audio.samples.to_vec());
    }

    #[test]
    fn test_feeds_downmixed_frames_to_the_analyser() {
        let config = VisualizerConfig::default();
        let mut spectrum = SpectrumSource::new(&config);

        // a full-scale tone on the left channel only, silence on the right
        let mut samples = Vec::new();
        for n in 0..1024 {
            let phase = 2.0 * std::f32::consts::PI * 32.0 * n as f32 / 512.0;
            samples.push(phase.sin());
            samples.push(0.0);
        }
        let audio = DecodedAudio::new(2, 44100, samples);
        let source = TappedBuffer::new(audio, spectrum.input());
        assert_eq!(source.count(), 2048);

        // the downmix halves the tone, which still lands near the top of the range
        let magnitudes = spectrum.current_magnitudes();
        assert!(magnitudes[32] > 200);
        assert_eq!(magnitudes[128], 0);
    }

    #[test]
    fn test_reports_format() {
        let audio = DecodedAudio::new(1, 22050, vec![0.0; 22050]);
        let source = TappedBuffer::new(audio, AnalyserInput::new(16));
        assert_eq!(source.channels(), 1);
        assert_eq!(source.sample_rate(), 22050);
        assert_eq!(source.total_duration(), Some(Duration::from_secs(1)));
    }
}
