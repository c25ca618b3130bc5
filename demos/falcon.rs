// SPDX-License-Identifier: MPL-2.0

//! Shows the rocket under orbit controls.
//!
//! Drag to orbit and scroll to zoom. L toggles the landing legs, G the grid fins, O the fairing,
//! S stage separation, and W the solar wings.

use std::{rc::Rc, time::Instant};

use tunnel_ride::{
    linear::{Spherical, Vec3},
    orbit::{OrbitControls, OrbitOptions},
    primitives,
    rocket::Rocket,
    tween::{Easing, Tween},
    Camera, Material, Node, Object, Renderer, Scene,
};
use winit::{
    dpi::{LogicalSize, PhysicalPosition},
    event::{
        ElementState, Event, KeyboardInput, MouseButton, MouseScrollDelta, VirtualKeyCode,
        WindowEvent,
    },
    event_loop::{ControlFlow, EventLoop},
    window::WindowBuilder,
};

const POSE_DURATION: f32 = 1.5;
const SEPARATION_DISTANCE: f32 = 3.;

fn main() -> anyhow::Result<()> {
    init_tracing();

    let event_loop = EventLoop::new();
    let window = WindowBuilder::new()
        .with_title("Falcon")
        .with_inner_size(LogicalSize::new(800, 800))
        .build(&event_loop)?;
    let size = window.inner_size();
    // SAFETY: the window moves into the event loop alongside the renderer and is never dropped
    // before it.
    let mut renderer = pollster::block_on(unsafe {
        Renderer::new(&window, wgpu::Backends::all(), size.width, size.height)
    })?;

    let mut rocket = Rocket::build();
    let mut poses = Poses::default();
    let mut orbit = OrbitControls::new(
        Vec3::new(0., 3., 0.),
        Spherical::new(9., 1.3, 0.6),
        OrbitOptions {
            min_radius: 3.,
            max_radius: 40.,
            auto_rotate: 0.1,
            ..Default::default()
        },
    );
    let mut scene = create_scene(&rocket);

    let mut fps = fps_counter::FPSCounter::new();
    let mut last_frame = Instant::now();
    let mut last_report = Instant::now();
    let mut dragging = false;
    let mut cursor: Option<PhysicalPosition<f64>> = None;

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;

        match event {
            Event::WindowEvent { event, window_id } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => *control_flow = ControlFlow::Exit,
                WindowEvent::Resized(size) => renderer.resize_surface(size.width, size.height),
                WindowEvent::MouseInput {
                    button: MouseButton::Left,
                    state,
                    ..
                } => dragging = state == ElementState::Pressed,
                WindowEvent::CursorMoved { position, .. } => {
                    if let (true, Some(last)) = (dragging, cursor) {
                        let dx = (position.x - last.x) as f32;
                        let dy = (position.y - last.y) as f32;
                        orbit.impulse(-dx * 0.05, -dy * 0.05, 0.);
                    }
                    cursor = Some(position);
                }
                WindowEvent::MouseWheel { delta, .. } => {
                    let lines = match delta {
                        MouseScrollDelta::LineDelta(_, y) => y,
                        MouseScrollDelta::PixelDelta(position) => position.y as f32 / 40.,
                    };
                    orbit.impulse(0., 0., -lines * 4.);
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
                    VirtualKeyCode::L => poses.legs = toggle(&poses.legs, 1.),
                    VirtualKeyCode::G => poses.grid_fins = toggle(&poses.grid_fins, 1.),
                    VirtualKeyCode::O => poses.fairing = toggle(&poses.fairing, 1.),
                    VirtualKeyCode::S => {
                        poses.separation = toggle(&poses.separation, SEPARATION_DISTANCE)
                    }
                    VirtualKeyCode::W => poses.solar_wings = toggle(&poses.solar_wings, 1.),
                    VirtualKeyCode::R => {
                        rocket.reset();
                        poses = Poses::default();
                    }
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

                orbit.update(dt);
                poses.advance(dt, &rocket);
                scene.camera = Camera {
                    near: 0.05,
                    ..orbit.camera()
                };

                if let Err(error) = renderer.render(&scene) {
                    tracing::error!(%error, "failed to render; exiting");
                    *control_flow = ControlFlow::Exit;
                }

                let fps = fps.tick();
                if now.duration_since(last_report).as_secs() >= 5 {
                    tracing::info!(fps, "frame rate");
                    last_report = now;
                }
            }
            _ => {}
        }
    })
}

/// An eased amount for each movable part of the rocket.
struct Poses {
    legs: Tween,
    grid_fins: Tween,
    fairing: Tween,
    separation: Tween,
    solar_wings: Tween,
}

impl Default for Poses {
    fn default() -> Self {
        let rest = || Tween::new(0., 0., 0., Easing::Linear);

        Self {
            legs: rest(),
            grid_fins: rest(),
            fairing: rest(),
            separation: rest(),
            solar_wings: rest(),
        }
    }
}

impl Poses {
    fn advance(&mut self, dt: f32, rocket: &Rocket) {
        rocket.deploy_legs(self.legs.advance(dt));
        rocket.deploy_grid_fins(self.grid_fins.advance(dt));
        rocket.open_fairing(self.fairing.advance(dt));
        rocket.separate_stages(self.separation.advance(dt));
        rocket.extend_solar_wings(self.solar_wings.advance(dt));
    }
}

/// Starts easing from wherever `tween` is toward whichever end it is not heading to.
fn toggle(tween: &Tween, extended: f32) -> Tween {
    let to = if tween.to() > 0. { 0. } else { extended };
    tracing::debug!(from = tween.value(), to, "posing rocket");

    Tween::new(tween.value(), to, POSE_DURATION, Easing::CubicInOut)
}

fn create_scene(rocket: &Rocket) -> Scene {
    let mut scene = Scene::new(Camera::default());
    scene.background = Vec3::new(0.02, 0.03, 0.06);
    scene.fog = Some((20., 80.));
    scene.objects.extend(rocket.objects().iter().cloned());
    let ground = Node::root();
    ground.set_position(Vec3::new(0., -0.17, 0.));
    scene.objects.push(Object::new(
        ground,
        Rc::new(primitives::plane(30., 30.)),
        Material::basic(Vec3::new(0.2, 0.22, 0.25)),
    ));
    tracing::info!(
        objects = scene.objects.len(),
        triangles = scene.objects.iter().map(Object::triangle_count).sum::<usize>(),
        "built scene"
    );

    scene
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
