use anyhow::Result;
use log::{debug, info, warn};
use std::path::PathBuf;
use std::time::Duration;

use crate::audio::{AudioOutput, DecodeRequest, DecodeService, DecodedAudio, PlaybackId};
use crate::visual::FrameLoop;

/// Messages consumed by `PlaybackController::handle`. Asynchronous work
/// (decoding, playback running out) reports back through these.
#[derive(Debug)]
pub enum ControllerEvent {
    DecodeFinished {
        request: DecodeRequest,
        result: Result<DecodedAudio>,
    },
    PlaybackFinished(PlaybackId),
    PlayRequested,
    PauseRequested,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Nothing decoded yet.
    Idle,
    /// A buffer is ready and has not been played.
    Loaded,
    Playing(PlaybackId),
    /// Paused by the user or ran to the end. Playing again restarts from zero.
    Stopped,
}

/// Enablement of the on-screen triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Controls {
    pub play_enabled: bool,
    pub pause_enabled: bool,
}

/// The line of text shown under the drop zone.
#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Empty,
    Decoding { name: String },
    Loaded { name: String, duration: Duration },
    Failed { name: String, reason: String },
}

/// The decoded buffer that `play` starts, with the file it came from.
struct LoadedTrack {
    name: String,
    audio: DecodedAudio,
}

impl LoadedTrack {
    fn status(&self) -> Status {
        Status::Loaded {
            name: self.name.clone(),
            duration: self.audio.duration(),
        }
    }
}

pub struct PlaybackController<O, D> {
    output: O,
    decoder: D,
    state: PlaybackState,
    track: Option<LoadedTrack>,
    controls: Controls,
    status: Status,
    frames: FrameLoop,
    next_playback: u64,
    next_request: u64,
    pending_request: Option<u64>,
}

impl<O: AudioOutput, D: DecodeService> PlaybackController<O, D> {
    pub fn new(output: O, decoder: D) -> Self {
        Self {
            output,
            decoder,
            state: PlaybackState::Idle,
            track: None,
            controls: Controls::default(),
            status: Status::Empty,
            frames: FrameLoop::new(),
            next_playback: 0,
            next_request: 0,
            pending_request: None,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn controls(&self) -> Controls {
        self.controls
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.state, PlaybackState::Playing(_))
    }

    pub fn active_playback(&self) -> Option<PlaybackId> {
        match self.state {
            PlaybackState::Playing(id) => Some(id),
            _ => None,
        }
    }

    pub fn frames_mut(&mut self) -> &mut FrameLoop {
        &mut self.frames
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    /// Hands a dropped file to the decoder. Only the most recent drop is
    /// applied when several decodes are in flight.
    pub fn file_dropped(&mut self, path: PathBuf) {
        self.next_request += 1;
        let request = DecodeRequest {
            id: self.next_request,
            path,
        };

        info!("Decoding dropped file {}", request.path.display());
        self.status = Status::Decoding {
            name: request.name(),
        };
        self.pending_request = Some(request.id);
        self.decoder.submit(request);
    }

    pub fn play(&mut self) {
        let Some(track) = &self.track else {
            debug!("Play ignored: nothing loaded");
            return;
        };

        if let PlaybackState::Playing(previous) = self.state {
            self.output.stop(previous);
        }

        self.next_playback += 1;
        let id = PlaybackId(self.next_playback);
        if let Err(e) = self.output.start(id, &track.audio) {
            warn!("Could not start playback of {}: {:#}", track.name, e);
            self.status = Status::Failed {
                name: track.name.clone(),
                reason: format!("{:#}", e),
            };
            self.state = PlaybackState::Stopped;
            self.controls = Controls {
                play_enabled: true,
                pause_enabled: false,
            };
            return;
        }

        // a pending decode keeps its own status line
        if self.pending_request.is_none() {
            self.status = track.status();
        }
        self.state = PlaybackState::Playing(id);
        self.frames.schedule();
        self.controls = Controls {
            play_enabled: false,
            pause_enabled: true,
        };
    }

    /// Stops the active handle. There is no resume: the next `play`
    /// starts the buffer over from the beginning.
    pub fn pause(&mut self) {
        let PlaybackState::Playing(id) = self.state else {
            debug!("Pause ignored: nothing playing");
            return;
        };

        self.output.stop(id);
        self.state = PlaybackState::Stopped;
        self.controls = Controls {
            play_enabled: true,
            pause_enabled: false,
        };
    }

    pub fn handle(&mut self, event: ControllerEvent) {
        match event {
            ControllerEvent::PlayRequested => self.play(),
            ControllerEvent::PauseRequested => self.pause(),
            ControllerEvent::PlaybackFinished(id) => self.playback_finished(id),
            ControllerEvent::DecodeFinished { request, result } => {
                self.decode_finished(request, result)
            }
        }
    }

    fn playback_finished(&mut self, id: PlaybackId) {
        if self.state != PlaybackState::Playing(id) {
            debug!("Ignoring completion of inactive playback {}", id);
            return;
        }

        info!("Playback {} finished", id);
        self.state = PlaybackState::Stopped;
        self.controls = Controls {
            play_enabled: true,
            pause_enabled: false,
        };
    }

    fn decode_finished(&mut self, request: DecodeRequest, result: Result<DecodedAudio>) {
        if self.pending_request != Some(request.id) {
            debug!("Ignoring superseded decode of {}", request.name());
            return;
        }
        self.pending_request = None;

        match result {
            Ok(audio) => {
                info!("Loaded {} ({:.1}s)", request.name(), audio.duration().as_secs_f32());
                let track = LoadedTrack {
                    name: request.name(),
                    audio,
                };
                self.status = track.status();
                self.track = Some(track);
                if matches!(self.state, PlaybackState::Idle | PlaybackState::Stopped) {
                    self.state = PlaybackState::Loaded;
                }
                self.controls = Controls {
                    play_enabled: true,
                    pause_enabled: self.is_playing(),
                };
            }
            Err(e) => {
                warn!("Failed to decode {}: {:#}", request.name(), e);
                self.status = Status::Failed {
                    name: request.name(),
                    reason: format!("{:#}", e),
                };
            }
        }
    }
}
