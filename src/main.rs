use anyhow::Result;
use clap::Parser;
use glam::Vec2;
use log::{error, info};
use std::sync::Arc;
use winit::{
    event::{ElementState, Event, WindowEvent},
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::WindowBuilder,
};

use audiopicture::audio::{
    list_output_devices, BackgroundDecoder, RodioOutput, SpectrumSource, SymphoniaDecoder,
};
use audiopicture::controller::PlaybackController;
use audiopicture::graphics::GraphicsEngine;
use audiopicture::ui::UserInterface;
use audiopicture::visual::{FrameRenderer, Scene};
use audiopicture::{App, Args, VisualizerConfig};

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.list_devices {
        for name in list_output_devices()? {
            println!("{}", name);
        }
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => VisualizerConfig::load(path)?,
        None => VisualizerConfig::default(),
    };
    config.validate()?;
    info!("Starting Audio Picture ({} frequency bins)", config.bin_count());

    let runtime = tokio::runtime::Runtime::new()?;
    let (event_tx, event_rx) = crossbeam_channel::unbounded();

    let event_loop = EventLoop::new()?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Audio Picture")
            .with_inner_size(winit::dpi::LogicalSize::new(args.width, args.height))
            .build(&event_loop)?,
    );

    let mut graphics_engine = pollster::block_on(GraphicsEngine::new(Arc::clone(&window)))?;
    let mut ui = UserInterface::new(&window, &graphics_engine.device, graphics_engine.config.format);

    let size = graphics_engine.size();
    let canvas_size = Vec2::new(size.width as f32, size.height as f32);

    let spectrum = SpectrumSource::new(&config);
    let output = RodioOutput::new(args.output_device.as_deref(), spectrum.input(), event_tx.clone())?;
    let decoder = BackgroundDecoder::new(
        runtime.handle().clone(),
        Arc::new(SymphoniaDecoder),
        event_tx,
    );

    let mut app = App::new(
        PlaybackController::new(output, decoder),
        FrameRenderer::new(&config, canvas_size),
        spectrum,
        Scene::new(canvas_size),
        event_rx,
    );

    if let Some(path) = args.file {
        app.file_dropped(path);
    }

    info!("Visualizer initialized successfully");

    let window_clone = Arc::clone(&window);
    event_loop.run(move |event, elwt| match event {
        Event::WindowEvent { event, .. } => {
            if ui.handle_event(&event, &window_clone) {
                return;
            }

            match event {
                WindowEvent::CloseRequested => {
                    info!("Close requested");
                    elwt.exit();
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    if event.physical_key == PhysicalKey::Code(KeyCode::Escape)
                        && event.state == ElementState::Pressed
                    {
                        info!("Escape pressed");
                        elwt.exit();
                    }
                }
                WindowEvent::Resized(physical_size) => {
                    graphics_engine.resize(physical_size);
                    app.resize(physical_size.width, physical_size.height);
                }
                WindowEvent::HoveredFile(_) => ui.set_drop_hover(true),
                WindowEvent::HoveredFileCancelled => ui.set_drop_hover(false),
                WindowEvent::DroppedFile(path) => {
                    ui.set_drop_hover(false);
                    app.file_dropped(path);
                }
                WindowEvent::RedrawRequested => {
                    app.redraw();

                    let controller = app.controller();
                    ui.run(&window_clone, controller.controls(), controller.status());
                    if let Err(e) = graphics_engine.render(app.scene(), &mut ui) {
                        error!("Render error: {}", e);
                    }

                    for action in ui.take_actions() {
                        app.apply_ui_action(action);
                    }
                }
                _ => {}
            }
        }
        Event::AboutToWait => {
            app.pump_events();
            window_clone.request_redraw();
        }
        _ => {}
    })?;

    drop(runtime);
    Ok(())
}
