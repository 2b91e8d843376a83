use egui_wgpu::Renderer;
use egui_winit::State;
use std::time::Duration;
use wgpu::{CommandBuffer, CommandEncoder, Device, Queue, TextureFormat, TextureView};
use winit::{event::WindowEvent, window::Window};

use crate::controller::{Controls, Status};

const DROP_BORDER: egui::Color32 = egui::Color32::from_rgb(0xcc, 0xcc, 0xcc);
const DROP_BORDER_HOVER: egui::Color32 = egui::Color32::from_rgb(0, 128, 0);
const DROP_ZONE_SIZE: [f32; 2] = [300.0, 120.0];

/// Clicks collected during a UI pass, applied by the caller afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiAction {
    Play,
    Pause,
}

struct PendingPaint {
    primitives: Vec<egui::ClippedPrimitive>,
    textures_delta: egui::TexturesDelta,
    pixels_per_point: f32,
}

pub struct UserInterface {
    context: egui::Context,
    state: State,
    renderer: Renderer,
    drop_hover: bool,
    actions: Vec<UiAction>,
    pending: Option<PendingPaint>,
}

impl UserInterface {
    pub fn new(window: &Window, device: &Device, format: TextureFormat) -> Self {
        let context = egui::Context::default();

        let egui_state = State::new(
            context.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
        );

        let renderer = Renderer::new(device, format, None, 1);

        Self {
            context,
            state: egui_state,
            renderer,
            drop_hover: false,
            actions: Vec::new(),
            pending: None,
        }
    }

    /// Returns true when egui consumed the event.
    pub fn handle_event(&mut self, event: &WindowEvent, window: &Window) -> bool {
        self.state.on_window_event(window, event).consumed
    }

    /// Highlights the drop zone while a file is dragged over the window.
    pub fn set_drop_hover(&mut self, hovering: bool) {
        self.drop_hover = hovering;
    }

    /// Lays out the overlay for this frame. The result is painted by `render`.
    pub fn run(&mut self, window: &Window, controls: Controls, status: &Status) {
        let raw_input = self.state.take_egui_input(window);

        let drop_hover = self.drop_hover;
        let actions = &mut self.actions;

        let full_output = self.context.run(raw_input, |ctx| {
            Self::ui_content(ctx, drop_hover, controls, status, actions);
        });

        self.state.handle_platform_output(window, full_output.platform_output);

        let primitives = self
            .context
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        self.pending = Some(PendingPaint {
            primitives,
            textures_delta: full_output.textures_delta,
            pixels_per_point: full_output.pixels_per_point,
        });
    }

    pub fn take_actions(&mut self) -> Vec<UiAction> {
        std::mem::take(&mut self.actions)
    }

    /// Paints the last laid-out pass on top of `target`.
    pub fn render(
        &mut self,
        encoder: &mut CommandEncoder,
        target: &TextureView,
        device: &Device,
        queue: &Queue,
        size_in_pixels: [u32; 2],
    ) -> Vec<CommandBuffer> {
        let Some(paint) = self.pending.take() else {
            return Vec::new();
        };

        for (id, image_delta) in &paint.textures_delta.set {
            self.renderer.update_texture(device, queue, *id, image_delta);
        }

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels,
            pixels_per_point: paint.pixels_per_point,
        };

        let command_buffers =
            self.renderer
                .update_buffers(device, queue, encoder, &paint.primitives, &screen_descriptor);

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui render pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            self.renderer
                .render(&mut render_pass, &paint.primitives, &screen_descriptor);
        }

        for id in &paint.textures_delta.free {
            self.renderer.free_texture(id);
        }

        command_buffers
    }

    fn ui_content(
        ctx: &egui::Context,
        drop_hover: bool,
        controls: Controls,
        status: &Status,
        actions: &mut Vec<UiAction>,
    ) {
        egui::Area::new(egui::Id::new("drop_zone"))
            .anchor(egui::Align2::CENTER_TOP, [0.0, 20.0])
            .show(ctx, |ui| {
                let border = drop_border(drop_hover);

                egui::Frame::none()
                    .fill(egui::Color32::from_black_alpha(160))
                    .stroke(egui::Stroke::new(2.0, border))
                    .rounding(6.0)
                    .inner_margin(12.0)
                    .show(ui, |ui| {
                        ui.set_min_size(DROP_ZONE_SIZE.into());
                        ui.vertical_centered(|ui| {
                            ui.label("Drop an audio file here");
                            ui.add_space(8.0);

                            ui.horizontal(|ui| {
                                if ui
                                    .add_enabled(controls.play_enabled, egui::Button::new("Play"))
                                    .clicked()
                                {
                                    actions.push(UiAction::Play);
                                }
                                if ui
                                    .add_enabled(controls.pause_enabled, egui::Button::new("Pause"))
                                    .clicked()
                                {
                                    actions.push(UiAction::Pause);
                                }
                            });

                            let (text, is_error) = status_text(status);
                            if !text.is_empty() {
                                ui.add_space(8.0);
                                let text = egui::RichText::new(text);
                                if is_error {
                                    ui.label(text.color(egui::Color32::RED));
                                } else {
                                    ui.label(text);
                                }
                            }
                        });
                    });
            });
    }
}

fn drop_border(hovering: bool) -> egui::Color32 {
    if hovering {
        DROP_BORDER_HOVER
    } else {
        DROP_BORDER
    }
}

/// Text for the status line and whether it reports an error.
pub fn status_text(status: &Status) -> (String, bool) {
    match status {
        Status::Empty => (String::new(), false),
        Status::Decoding { name } => (format!("Decoding {}...", name), false),
        Status::Loaded { name, duration } => (
            format!("{} ({})", name, format_duration(*duration)),
            false,
        ),
        Status::Failed { name, reason } => {
            (format!("Could not load {}: {}", name, reason), true)
        }
    }
}

fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_text() {
        assert_eq!(status_text(&Status::Empty), (String::new(), false));

        let decoding = Status::Decoding { name: "song.mp3".into() };
        assert_eq!(status_text(&decoding), ("Decoding song.mp3...".to_string(), false));

        let loaded = Status::Loaded {
            name: "song.mp3".into(),
            duration: Duration::from_millis(125_700),
        };
        assert_eq!(status_text(&loaded), ("song.mp3 (2:05)".to_string(), false));

        let failed = Status::Failed {
            name: "notes.txt".into(),
            reason: "unsupported format".into(),
        };
        let (text, is_error) = status_text(&failed);
        assert!(is_error);
        assert!(text.contains("notes.txt") && text.contains("unsupported format"));
    }

    #[test]
    fn test_drop_zone_turns_green_while_hovered() {
        assert_eq!(drop_border(false), egui::Color32::from_rgb(0xcc, 0xcc, 0xcc));
        assert_eq!(drop_border(true), egui::Color32::from_rgb(0, 128, 0));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::ZERO), "0:00");
        assert_eq!(format_duration(Duration::from_secs(59)), "0:59");
        assert_eq!(format_duration(Duration::from_secs(3600)), "60:00");
    }
}
