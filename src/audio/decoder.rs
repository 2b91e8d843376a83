use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use crossbeam_channel::Sender;
use log::{info, warn};
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::controller::ControllerEvent;

/// Fully decoded PCM, interleaved f32. Cloning shares the samples.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    pub channels: u16,
    pub sample_rate: u32,
    pub samples: Arc<[f32]>,
}

impl DecodedAudio {
    pub fn new(channels: u16, sample_rate: u32, samples: Vec<f32>) -> Self {
        Self {
            channels,
            sample_rate,
            samples: samples.into(),
        }
    }

    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames() as f64 / self.sample_rate as f64)
    }
}

/// Decodes a complete in-memory audio file into PCM.
///
/// The container is probed from its content alone, the first track with a
/// known codec is decoded to the end, and packets that fail to decode are
/// skipped with a warning.
pub fn decode_bytes(bytes: Vec<u8>) -> Result<DecodedAudio> {
    if bytes.is_empty() {
        bail!("file is empty");
    }

    let source = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());
    let probed = symphonia::default::get_probe()
        .format(
            &Hint::new(),
            source,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .context("unrecognised audio format")?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| anyhow!("no audio track found"))?;
    let track_id = track.id;
    let mut channels = track.codec_params.channels.map(|c| c.count() as u16);
    let mut sample_rate = track.codec_params.sample_rate;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .context("unsupported codec")?;

    let mut samples = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(e).context("reading audio packet"),
        };
        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                channels = Some(spec.channels.count() as u16);
                sample_rate = Some(spec.rate);

                let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                buffer.copy_interleaved_ref(decoded);
                samples.extend_from_slice(buffer.samples());
            }
            Err(SymphoniaError::DecodeError(e)) => {
                warn!("Skipping undecodable packet: {}", e);
            }
            Err(e) => return Err(e).context("decoding audio packet"),
        }
    }

    let channels = channels.filter(|&c| c > 0).ok_or_else(|| anyhow!("unknown channel layout"))?;
    let sample_rate = sample_rate.ok_or_else(|| anyhow!("unknown sample rate"))?;
    if samples.is_empty() {
        bail!("no audio frames decoded");
    }

    let audio = DecodedAudio::new(channels, sample_rate, samples);
    info!(
        "Decoded {} frames ({}Hz, {} channels, {:.1}s)",
        audio.frames(),
        audio.sample_rate,
        audio.channels,
        audio.duration().as_secs_f32()
    );
    Ok(audio)
}

/// Turns encoded bytes into PCM without blocking the caller's thread.
#[async_trait]
pub trait AudioDecoder: Send + Sync {
    async fn decode(&self, bytes: Vec<u8>) -> Result<DecodedAudio>;
}

pub struct SymphoniaDecoder;

#[async_trait]
impl AudioDecoder for SymphoniaDecoder {
    async fn decode(&self, bytes: Vec<u8>) -> Result<DecodedAudio> {
        tokio::task::spawn_blocking(move || decode_bytes(bytes))
            .await
            .context("decode task failed")?
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodeRequest {
    pub id: u64,
    pub path: PathBuf,
}

impl DecodeRequest {
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Accepts dropped files; the outcome arrives later as
/// `ControllerEvent::DecodeFinished`.
pub trait DecodeService {
    fn submit(&self, request: DecodeRequest);
}

pub struct BackgroundDecoder {
    runtime: tokio::runtime::Handle,
    decoder: Arc<dyn AudioDecoder>,
    events: Sender<ControllerEvent>,
}

impl BackgroundDecoder {
    pub fn new(
        runtime: tokio::runtime::Handle,
        decoder: Arc<dyn AudioDecoder>,
        events: Sender<ControllerEvent>,
    ) -> Self {
        Self {
            runtime,
            decoder,
            events,
        }
    }
}

impl DecodeService for BackgroundDecoder {
    fn submit(&self, request: DecodeRequest) {
        let decoder = Arc::clone(&self.decoder);
        let events = self.events.clone();

        self.runtime.spawn(async move {
            let result = match tokio::fs::read(&request.path).await {
                Ok(bytes) => decoder.decode(bytes).await,
                Err(e) => {
                    Err(anyhow::Error::new(e).context(format!("reading {}", request.path.display())))
                }
            };

            if events
                .send(ControllerEvent::DecodeFinished { request, result })
                .is_err()
            {
                warn!("Decode finished after the controller went away");
            }
        });
    }
}
