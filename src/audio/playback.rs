use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, HostTrait};
use crossbeam_channel::Sender;
use log::{info, warn};
use rodio::source::EmptyCallback;
use rodio::{OutputStream, OutputStreamHandle, Sink};
use std::fmt;

use super::{AnalyserInput, DecodedAudio, TappedBuffer};
use crate::controller::ControllerEvent;

/// Identifies one playback handle. A handle plays its buffer once from the
/// start and can only be stopped, never resumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlaybackId(pub u64);

impl fmt::Display for PlaybackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where playback handles live. Implementations report natural completion
/// by posting `ControllerEvent::PlaybackFinished` with the handle's id.
pub trait AudioOutput {
    fn start(&mut self, id: PlaybackId, audio: &DecodedAudio) -> Result<()>;
    fn stop(&mut self, id: PlaybackId);
}

pub struct RodioOutput {
    #[allow(dead_code)]
    stream: OutputStream,
    stream_handle: OutputStreamHandle,
    active: Option<(PlaybackId, Sink)>,
    tap: AnalyserInput,
    events: Sender<ControllerEvent>,
}

impl RodioOutput {
    /// Opens the named output device, or the host default when `device_name` is `None`.
    pub fn new(
        device_name: Option<&str>,
        tap: AnalyserInput,
        events: Sender<ControllerEvent>,
    ) -> Result<Self> {
        let (stream, stream_handle) = match device_name {
            Some(name) => {
                let device = cpal::default_host()
                    .output_devices()?
                    .find(|d| d.name().map(|n| n == name).unwrap_or(false))
                    .ok_or_else(|| anyhow!("No output device named '{}'", name))?;
                info!("Using audio device: {}", name);
                OutputStream::try_from_device(&device)?
            }
            None => {
                if let Some(device) = cpal::default_host().default_output_device() {
                    info!(
                        "Using audio device: {}",
                        device.name().unwrap_or_else(|_| "Unknown".to_string())
                    );
                }
                OutputStream::try_default()?
            }
        };

        Ok(Self {
            stream,
            stream_handle,
            active: None,
            tap,
            events,
        })
    }
}

impl AudioOutput for RodioOutput {
    fn start(&mut self, id: PlaybackId, audio: &DecodedAudio) -> Result<()> {
        if let Some((previous, sink)) = self.active.take() {
            warn!("Playback {} still active when starting {}, stopping it", previous, id);
            sink.stop();
        }

        self.tap.reset();
        let sink = Sink::try_new(&self.stream_handle)?;
        sink.append(TappedBuffer::new(audio.clone(), self.tap.clone()));

        let events = self.events.clone();
        sink.append(EmptyCallback::<f32>::new(Box::new(move || {
            let _ = events.send(ControllerEvent::PlaybackFinished(id));
        })));

        info!("Audio playback {} started", id);
        self.active = Some((id, sink));
        Ok(())
    }

    fn stop(&mut self, id: PlaybackId) {
        match self.active.take() {
            Some((active, sink)) if active == id => {
                sink.stop();
                info!("Audio playback {} stopped", id);
            }
            other => self.active = other,
        }
    }
}

pub fn list_output_devices() -> Result<Vec<String>> {
    let host = cpal::default_host();
    let default = host
        .default_output_device()
        .and_then(|d| d.name().ok());

    let mut names = Vec::new();
    for device in host.output_devices()? {
        let name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        if Some(&name) == default.as_ref() {
            names.push(format!("{} (default)", name));
        } else {
            names.push(name);
        }
    }
    Ok(names)
}
