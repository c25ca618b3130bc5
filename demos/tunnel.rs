// SPDX-License-Identifier: MPL-2.0

//! Rides a track through a tunnel.
//!
//! Usage: `tunnel [ASSET_DIR] [CONFIG.toml]`
//!
//! Space rides to the next stop, B jumps back a stop, F toggles fast-forward, Enter skips the
//! intro, and the mouse looks around.

use std::time::Instant;

use tunnel_ride::{
    assets::FileSource,
    config::RideConfig,
    host::{Host, HostBridge, HostResult},
    ride::Ride,
    Renderer,
};
use winit::{
    dpi::LogicalSize,
    event::{ElementState, Event, KeyboardInput, VirtualKeyCode, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    window::WindowBuilder,
};

fn main() -> anyhow::Result<()> {
    init_tracing();

    let mut args = std::env::args().skip(1);
    let root = args.next().unwrap_or_else(|| "assets".to_owned());
    let config = match args.next() {
        Some(path) => RideConfig::from_path(path)?,
        None => RideConfig::default(),
    };

    let event_loop = EventLoop::new();
    let window = WindowBuilder::new()
        .with_title("Tunnel")
        .with_inner_size(LogicalSize::new(1024, 640))
        .build(&event_loop)?;
    let size = window.inner_size();
    // SAFETY: the window moves into the event loop alongside the renderer and is never dropped
    // before it.
    let mut renderer = pollster::block_on(unsafe {
        Renderer::new(&window, wgpu::Backends::all(), size.width, size.height)
    })?;

    let mut ride = Ride::new(
        config,
        Box::new(FileSource::new(root)),
        HostBridge::new(Box::new(LogHost)),
    );
    ride.load();

    let mut fps = fps_counter::FPSCounter::new();
    let mut last_frame = Instant::now();
    let mut last_report = Instant::now();

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;

        match event {
            Event::WindowEvent { event, window_id } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => *control_flow = ControlFlow::Exit,
                WindowEvent::Resized(size) => renderer.resize_surface(size.width, size.height),
                WindowEvent::ScaleFactorChanged { new_inner_size, .. } => {
                    renderer.resize_surface(new_inner_size.width, new_inner_size.height);
                }
                WindowEvent::CursorMoved { position, .. } => {
                    let size = window.inner_size();
                    let x = 2. * position.x as f32 / size.width.max(1) as f32 - 1.;
                    let y = 2. * position.y as f32 / size.height.max(1) as f32 - 1.;
                    ride.look(x, y);
                }
                WindowEvent::KeyboardInput {
                    input:
                        KeyboardInput {
                            state: ElementState::Pressed,
                            virtual_keycode: Some(key),
                            ..
                        },
                    ..
                } => match key {
                    VirtualKeyCode::Space => {
                        ride.play_track();
                    }
                    VirtualKeyCode::B => {
                        ride.jump_back();
                    }
                    VirtualKeyCode::F => {
                        let on = ride.toggle_ffwd();
                        tracing::info!(on, "fast-forward");
                    }
                    VirtualKeyCode::Return => ride.skip_intro(),
                    VirtualKeyCode::Escape => *control_flow = ControlFlow::Exit,
                    _ => {}
                },
                _ => {}
            },
            Event::MainEventsCleared => window.request_redraw(),
            Event::RedrawRequested(_) => {
                let now = Instant::now();
                let dt = (now - last_frame).as_secs_f32();
                last_frame = now;

                if let Err(error) = renderer.render(ride.frame(dt)) {
                    tracing::error!(%error, "failed to render; exiting");
                    *control_flow = ControlFlow::Exit;
                }

                let fps = fps.tick();
                if now.duration_since(last_report).as_secs() >= 5 {
                    tracing::info!(fps, phase = ?ride.phase(), "frame rate");
                    last_report = now;
                }
            }
            _ => {}
        }
    })
}

/// Reports ride progress to the log.
struct LogHost;

impl Host for LogHost {
    fn load_progress(&mut self, loaded: usize, total: usize) -> HostResult {
        tracing::info!(loaded, total, "loading");
        Ok(())
    }

    fn load_complete(&mut self) -> HostResult {
        tracing::info!("loaded; press Enter to skip the intro");
        Ok(())
    }

    fn intro_finished(&mut self) -> HostResult {
        tracing::info!("press Space to ride");
        Ok(())
    }

    fn track_started(&mut self, stop: usize) -> HostResult {
        tracing::info!(stop, "riding");
        Ok(())
    }

    fn track_stopped(&mut self, stop: usize) -> HostResult {
        tracing::info!(stop, "arrived");
        Ok(())
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,wgpu_core=warn")),
        )
        .with_target(false)
        .init();
}
