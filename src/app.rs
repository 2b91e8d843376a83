use crossbeam_channel::Receiver;
use glam::Vec2;
use log::debug;
use std::path::PathBuf;

use crate::audio::{AudioOutput, DecodeService, SpectrumSource};
use crate::controller::{ControllerEvent, PlaybackController};
use crate::ui::UiAction;
use crate::visual::{FrameOutcome, FrameRenderer, Scene};

/// Everything the window event loop drives: the controller, the analyser
/// and the scene the frame renderer draws into.
pub struct App<O, D> {
    controller: PlaybackController<O, D>,
    renderer: FrameRenderer,
    spectrum: SpectrumSource,
    scene: Scene,
    events: Receiver<ControllerEvent>,
}

impl<O: AudioOutput, D: DecodeService> App<O, D> {
    pub fn new(
        controller: PlaybackController<O, D>,
        renderer: FrameRenderer,
        spectrum: SpectrumSource,
        scene: Scene,
        events: Receiver<ControllerEvent>,
    ) -> Self {
        Self {
            controller,
            renderer,
            spectrum,
            scene,
            events,
        }
    }

    pub fn controller(&self) -> &PlaybackController<O, D> {
        &self.controller
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Applies everything the decoder and audio thread reported since the
    /// last call.
    pub fn pump_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            debug!("Controller event: {:?}", event);
            self.controller.handle(event);
        }
    }

    /// Runs the pending frame, if the loop is live.
    pub fn redraw(&mut self) -> Option<FrameOutcome> {
        let playing = self.controller.is_playing();
        self.controller
            .frames_mut()
            .run_pending(|| self.renderer.draw_frame(playing, &mut self.spectrum, &mut self.scene))
    }

    pub fn apply_ui_action(&mut self, action: UiAction) {
        match action {
            UiAction::Play => self.controller.handle(ControllerEvent::PlayRequested),
            UiAction::Pause => self.controller.handle(ControllerEvent::PauseRequested),
        }
    }

    pub fn file_dropped(&mut self, path: PathBuf) {
        self.controller.file_dropped(path);
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.scene.resize(Vec2::new(width as f32, height as f32));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{DecodeRequest, DecodedAudio, PlaybackId};
    use crate::config::VisualizerConfig;
    use anyhow::Result;
    use crossbeam_channel::{unbounded, Sender};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::cell::RefCell;

    #[derive(Default)]
    struct SilentOutput {
        started: Vec<PlaybackId>,
    }

    impl AudioOutput for SilentOutput {
        fn start(&mut self, id: PlaybackId, _audio: &DecodedAudio) -> Result<()> {
            self.started.push(id);
            Ok(())
        }

        fn stop(&mut self, _id: PlaybackId) {}
    }

    /// Decodes synchronously into a one second buffer.
    struct InstantDecoder {
        events: Sender<ControllerEvent>,
        submitted: RefCell<usize>,
    }

    impl DecodeService for InstantDecoder {
        fn submit(&self, request: DecodeRequest) {
            *self.submitted.borrow_mut() += 1;
            let audio = DecodedAudio::new(1, 1000, vec![0.0; 1000]);
            let _ = self.events.send(ControllerEvent::DecodeFinished {
                request,
                result: Ok(audio),
            });
        }
    }

    fn app() -> App<SilentOutput, InstantDecoder> {
        let (tx, rx) = unbounded();
        let config = VisualizerConfig::default();
        let size = Vec2::new(400.0, 300.0);
        let decoder = InstantDecoder {
            events: tx,
            submitted: RefCell::new(0),
        };

        App::new(
            PlaybackController::new(SilentOutput::default(), decoder),
            FrameRenderer::with_rng(&config, size, StdRng::seed_from_u64(3)),
            SpectrumSource::new(&config),
            Scene::new(size),
            rx,
        )
    }

    #[test]
    fn test_drop_play_pause_cycle() {
        let mut app = app();
        assert_eq!(app.redraw(), None);

        app.file_dropped(PathBuf::from("tone.wav"));
        assert!(!app.controller().controls().play_enabled);
        app.pump_events();
        assert!(app.controller().controls().play_enabled);
        assert_eq!(app.controller().decoder().submitted.take(), 1);

        app.apply_ui_action(UiAction::Play);
        assert_eq!(app.controller().output().started, vec![PlaybackId(1)]);
        assert_eq!(app.redraw(), Some(FrameOutcome::Reschedule));
        assert!(app.scene().draw_calls() > 0);

        app.apply_ui_action(UiAction::Pause);
        assert_eq!(app.redraw(), Some(FrameOutcome::Finished));
        assert_eq!(app.redraw(), None);
    }

    #[test]
    fn test_pause_keeps_the_last_frame() {
        let mut app = app();
        app.file_dropped(PathBuf::from("tone.wav"));
        app.pump_events();
        app.apply_ui_action(UiAction::Play);
        app.redraw();
        let drawn = app.scene().commands().len();

        app.apply_ui_action(UiAction::Pause);
        app.redraw();
        assert_eq!(app.scene().commands().len(), drawn);
    }

    #[test]
    fn test_resize_changes_canvas() {
        let mut app = app();
        app.resize(800, 600);
        assert_eq!(crate::visual::Canvas::size(app.scene()), Vec2::new(800.0, 600.0));
    }
}
