// SPDX-License-Identifier: MPL-2.0

//! The tunnel ride: load, orbit through an intro, then ride the track from stop to stop.
//!
//! A [`Ride`] is driven by calling [`Ride::frame`] once per redraw. Nothing happens until
//! [`Ride::load`] is called; assets then load one per frame, the intro plays, and the track
//! becomes rideable with [`Ride::play_track`] and [`Ride::jump_back`].

use std::{f32::consts::PI, rc::Rc};

use crate::{
    assets::{AssetKind, AssetLibrary, AssetQueue, AssetRequest, AssetSource, QueueStatus},
    config::RideConfig,
    host::HostBridge,
    linear::{Quat, Spherical, Vec3},
    orbit::OrbitControls,
    primitives,
    theme::{ThemeCycler, ACCENT, BACKGROUND, PRIMARY},
    track::{parse_track, TrackController, TrackEvent},
    Camera, Material, Mesh, Node, Object, Scene, UniformValue,
};

/// Asset names the track files are stored under.
pub const TRACK_POSITIONS: &str = "track-positions";
pub const TRACK_ROTATIONS: &str = "track-rotations";
pub const TRACK_CENTERS: &str = "track-centers";

/// Every this many track samples gets a ring of tunnel wall.
const RING_SPACING: usize = 4;
const RING_RADIUS: f32 = 1.6;
const STOP_RING_RADIUS: f32 = 2.2;
const GLOBE_RADIUS: f32 = 3.;
const SPORE_COUNT: usize = 24;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RidePhase {
    /// Waiting for [`Ride::load`].
    Idle,
    Loading { loaded: usize, total: usize },
    /// Orbiting the globe while the track waits.
    Intro,
    Riding,
}

/// Which theme color an object follows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Tint {
    Primary,
    Accent,
}

impl Tint {
    fn uniform(self) -> &'static str {
        match self {
            Tint::Primary => PRIMARY,
            Tint::Accent => ACCENT,
        }
    }
}

pub struct Ride {
    config: RideConfig,
    source: Box<dyn AssetSource>,
    host: HostBridge,
    queue: AssetQueue,
    phase: RidePhase,
    track: Option<TrackController>,
    theme: ThemeCycler,
    orbit: OrbitControls,
    intro_elapsed: f32,
    scene: Scene,
    /// Parent of every node in `scene`.
    root: Rc<Node>,
    /// Parallel to `scene.objects`.
    tints: Vec<Tint>,
}

impl std::fmt::Debug for Ride {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ride")
            .field("phase", &self.phase)
            .field("index", &self.track.as_ref().map(TrackController::index))
            .field("objects", &self.scene.objects.len())
            .finish_non_exhaustive()
    }
}

impl Ride {
    pub fn new(config: RideConfig, source: Box<dyn AssetSource>, host: HostBridge) -> Self {
        let mut requests = vec![
            AssetRequest::new(TRACK_POSITIONS, AssetKind::Text, &config.track.positions),
            AssetRequest::new(TRACK_ROTATIONS, AssetKind::Text, &config.track.rotations),
        ];
        if let Some(centers) = &config.track.centers {
            requests.push(AssetRequest::new(TRACK_CENTERS, AssetKind::Text, centers));
        }
        requests.extend(config.assets.iter().cloned());

        let theme = ThemeCycler::new(
            config.theme.palettes.clone(),
            config.theme.interval,
            config.theme.transition,
            config.theme.easing,
        );
        let mut orbit_options = config.orbit;
        orbit_options.auto_rotate = config.intro.spin;
        let orbit = OrbitControls::new(
            Vec3::ZERO,
            Spherical::new(config.intro.radius, PI / 2.4, 0.),
            orbit_options,
        );

        let mut scene = Scene::new(orbit.camera());
        scene.fog = config.scene.fog();

        let mut this = Self {
            config,
            source,
            host,
            queue: AssetQueue::new(requests),
            phase: RidePhase::Idle,
            track: None,
            theme,
            orbit,
            intro_elapsed: 0.,
            scene,
            root: Node::root(),
            tints: Vec::new(),
        };
        this.build_intro_scene();
        this.apply_theme();

        this
    }

    pub fn phase(&self) -> RidePhase {
        self.phase
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> Camera {
        self.scene.camera
    }

    /// The track, once it has loaded.
    pub fn track(&self) -> Option<&TrackController> {
        self.track.as_ref()
    }

    pub fn library(&self) -> &AssetLibrary {
        self.queue.library()
    }

    pub fn theme(&self) -> &ThemeCycler {
        &self.theme
    }

    /// Starts loading. Has no effect after the first call.
    pub fn load(&mut self) {
        if self.phase != RidePhase::Idle {
            tracing::debug!(phase = ?self.phase, "already loading");
            return;
        }

        tracing::info!("loading ride");
        self.phase = match self.queue.status() {
            QueueStatus::Loading { loaded, total } => RidePhase::Loading { loaded, total },
            QueueStatus::Complete => RidePhase::Intro,
        };
    }

    /// Rides to the next stop and returns its stop index.
    ///
    /// During the intro this ends the intro first. Returns `None` while loading, while a ride is
    /// underway, or if the track has no stops.
    pub fn play_track(&mut self) -> Option<usize> {
        if self.phase == RidePhase::Intro && self.track.is_some() {
            self.finish_intro();
        }
        if self.phase != RidePhase::Riding {
            return None;
        }

        let stop = self.track.as_mut()?.ride_to_next_stop();
        self.forward_track_events();

        stop
    }

    /// Toggles fast-forward on the track and returns whether it is now on.
    pub fn toggle_ffwd(&mut self) -> bool {
        self.track
            .as_mut()
            .map(TrackController::toggle_ffwd)
            .unwrap_or(false)
    }

    /// Snaps back to the previous stop and returns its stop index.
    pub fn jump_back(&mut self) -> Option<usize> {
        if self.phase != RidePhase::Riding {
            return None;
        }

        let stop = self.track.as_mut()?.jump_back();
        self.forward_track_events();

        stop
    }

    /// Aims the look at a pointer position normalized to `[-1, 1]`.
    pub fn look(&mut self, x: f32, y: f32) {
        if let Some(track) = &mut self.track {
            track.look(x, y);
        }
    }

    /// Nudges the intro orbit, in radians per second.
    pub fn drag(&mut self, dx: f32, dy: f32) {
        if self.phase == RidePhase::Intro {
            self.orbit.impulse(dx, dy, 0.);
        }
    }

    pub fn set_device_orientation(&mut self, orientation: Option<Quat>) {
        if let Some(track) = &mut self.track {
            track.set_device_orientation(orientation);
        }
    }

    /// Ends the intro early.
    pub fn skip_intro(&mut self) {
        if self.phase == RidePhase::Intro && self.track.is_some() {
            self.finish_intro();
        }
    }

    /// Advances everything by `dt` seconds and returns the scene to draw.
    pub fn frame(&mut self, dt: f32) -> &Scene {
        match self.phase {
            RidePhase::Idle => {}
            RidePhase::Loading { .. } => self.poll_assets(),
            RidePhase::Intro => {
                self.orbit.update(dt);
                self.scene.camera = self.orbit.camera();
                self.intro_elapsed += dt;
                if self.intro_elapsed >= self.config.intro.duration && self.track.is_some() {
                    self.finish_intro();
                }
            }
            RidePhase::Riding => {
                if let Some(track) = &mut self.track {
                    track.update(dt);
                    self.scene.camera = Camera {
                        far: self.scene.camera.far,
                        ..track.camera()
                    };
                }
                self.forward_track_events();
            }
        }

        self.theme.update(dt);
        self.apply_theme();

        &self.scene
    }

    fn poll_assets(&mut self) {
        match self.queue.poll(self.source.as_mut(), &mut self.host) {
            QueueStatus::Loading { loaded, total } => {
                self.phase = RidePhase::Loading { loaded, total };
            }
            QueueStatus::Complete => {
                self.track = self.build_track();
                self.phase = RidePhase::Intro;
                self.intro_elapsed = 0.;
            }
        }
    }

    fn build_track(&self) -> Option<TrackController> {
        let library = self.queue.library();
        let (Some(positions), Some(rotations)) =
            (library.text(TRACK_POSITIONS), library.text(TRACK_ROTATIONS))
        else {
            tracing::error!("track files did not load; the ride is unavailable");
            return None;
        };

        let track = parse_track(positions, rotations, library.text(TRACK_CENTERS))
            .and_then(|points| TrackController::new(points, self.config.ride));
        match track {
            Ok(track) => {
                tracing::info!(points = track.len(), "track ready");
                Some(track)
            }
            Err(error) => {
                tracing::error!(error = %error, "failed to build track; the ride is unavailable");
                None
            }
        }
    }

    fn finish_intro(&mut self) {
        tracing::info!(elapsed = self.intro_elapsed, "intro finished");
        self.phase = RidePhase::Riding;
        self.host.intro_finished();
        self.build_tunnel_scene();
        if let Some(track) = &self.track {
            self.scene.camera = track.camera();
        }
        self.apply_theme();
    }

    fn forward_track_events(&mut self) {
        let Some(track) = &mut self.track else {
            return;
        };

        for event in track.drain_events() {
            match event {
                TrackEvent::Started { stop } => self.host.track_started(stop),
                TrackEvent::Stopped { stop } => self.host.track_stopped(stop),
            }
        }
    }

    fn push_object(&mut self, node: Rc<Node>, mesh: Rc<Mesh>, material: Material, tint: Tint) {
        self.scene.objects.push(Object::new(node, mesh, material));
        self.tints.push(tint);
    }

    fn build_intro_scene(&mut self) {
        self.clear_scene();
        let root = self.root.clone();
        self.push_object(
            Node::child_of(&root),
            Rc::new(primitives::sphere(GLOBE_RADIUS, 24, 16)),
            Material::basic(Vec3::ONE),
            Tint::Primary,
        );

        // Spores spread evenly over a shell around the globe.
        let spore = Rc::new(primitives::sphere(0.15, 8, 6));
        let golden_angle = PI * (3. - 5f32.sqrt());
        for i in 0..SPORE_COUNT {
            let y = 1. - 2. * (i as f32 + 0.5) / SPORE_COUNT as f32;
            let polar = y.acos();
            let azimuth = golden_angle * i as f32;
            let position = Spherical::new(GLOBE_RADIUS * 1.4, polar, azimuth).to_cartesian();
            self.push_object(
                Node::child_at(&root, position),
                spore.clone(),
                Material::unlit(Vec3::ONE),
                Tint::Accent,
            );
        }
    }

    fn build_tunnel_scene(&mut self) {
        self.clear_scene();

        let Some(track) = &self.track else {
            return;
        };
        let rings: Vec<_> = track
            .points()
            .iter()
            .enumerate()
            .filter(|(i, point)| point.is_stop() || i % RING_SPACING == 0)
            .map(|(_, point)| *point)
            .collect();

        let root = self.root.clone();
        let ring = Rc::new(primitives::tube(RING_RADIUS, 0.08, 24));
        let stop_ring = Rc::new(primitives::tube(STOP_RING_RADIUS, 0.2, 32));
        // Tubes run along Y; the track looks down -Z.
        let along_track = Quat::from_rotation_x(PI / 2.);
        for point in rings {
            let node = Node::child_at(&root, point.position);
            node.set_rotation(point.orientation * along_track);
            if point.is_stop() {
                self.push_object(node, stop_ring.clone(), Material::unlit(Vec3::ONE), Tint::Accent);
            } else {
                self.push_object(node, ring.clone(), Material::basic(Vec3::ONE), Tint::Primary);
            }
        }
        tracing::debug!(objects = self.scene.objects.len(), "built tunnel");
    }

    fn clear_scene(&mut self) {
        self.scene.objects.clear();
        self.tints.clear();
        self.root = Node::root();
    }

    fn apply_theme(&mut self) {
        self.scene.background = self.theme.color(BACKGROUND);
        for (object, tint) in self.scene.objects.iter_mut().zip(&self.tints) {
            object
                .material
                .uniforms
                .set(Material::COLOR, UniformValue::Vec3(self.theme.color(tint.uniform())));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, collections::HashMap, rc::Rc};

    use super::*;
    use crate::{
        error::{Error, Result},
        host::{testing::RecordingHost, HostBridge},
        tween::Easing,
    };

    /// Shares its files with the test so they can be inspected after the ride takes ownership.
    #[derive(Clone, Default)]
    struct SharedSource {
        files: Rc<RefCell<HashMap<String, Vec<u8>>>>,
    }

    impl AssetSource for SharedSource {
        fn fetch(&mut self, path: &str) -> Result<Vec<u8>> {
            self.files.borrow().get(path).cloned().ok_or_else(|| Error::Io {
                path: path.into(),
                source: std::io::ErrorKind::NotFound.into(),
            })
        }
    }

    const POSITIONS: &str = "\
0 0 0 0
0 0 -1
0 0 -2
0 0 -3 1
0 0 -4
0 0 -5
";

    fn source() -> SharedSource {
        let source = SharedSource::default();
        let mut files = source.files.borrow_mut();
        files.insert("track/positions.txt".into(), POSITIONS.as_bytes().to_vec());
        files.insert("track/rotations.txt".into(), "0 0 0\n".repeat(6).into_bytes());
        drop(files);
        source
    }

    fn config() -> RideConfig {
        let mut config = RideConfig::default();
        config.intro.duration = 1.;
        config.ride.ride_duration = 1.;
        config.ride.easing = Easing::Linear;
        config.theme.interval = 0.;
        config
    }

    fn ride_with_host() -> (Ride, Rc<RefCell<Vec<String>>>) {
        let host = RecordingHost::default();
        let calls = host.calls.clone();
        let ride = Ride::new(config(), Box::new(source()), HostBridge::new(Box::new(host)));
        (ride, calls)
    }

    fn run(ride: &mut Ride, frames: usize, dt: f32) {
        for _ in 0..frames {
            ride.frame(dt);
        }
    }

    #[test]
    fn nothing_loads_until_asked() {
        let (mut ride, calls) = ride_with_host();
        run(&mut ride, 3, 0.1);
        assert_eq!(ride.phase(), RidePhase::Idle);
        assert!(calls.borrow().is_empty());
        assert_eq!(ride.play_track(), None);
    }

    #[test]
    fn loads_one_asset_per_frame_then_plays_the_intro() {
        let (mut ride, calls) = ride_with_host();
        ride.load();
        assert_eq!(ride.phase(), RidePhase::Loading { loaded: 0, total: 2 });

        ride.frame(0.1);
        assert_eq!(ride.phase(), RidePhase::Loading { loaded: 1, total: 2 });
        ride.frame(0.1);
        assert_eq!(ride.phase(), RidePhase::Intro);
        assert_eq!(ride.track().map(TrackController::len), Some(6));

        run(&mut ride, 11, 0.1);
        assert_eq!(ride.phase(), RidePhase::Riding);
        assert_eq!(
            *calls.borrow(),
            vec!["progress 1/2", "progress 2/2", "complete", "intro finished"]
        );
    }

    #[test]
    fn playing_during_the_intro_skips_it() {
        let (mut ride, calls) = ride_with_host();
        ride.load();
        run(&mut ride, 2, 0.1);

        assert_eq!(ride.play_track(), Some(1));
        assert_eq!(ride.phase(), RidePhase::Riding);
        assert_eq!(calls.borrow()[3..], ["intro finished", "started 1"]);
    }

    #[test]
    fn rides_between_stops_and_reports_them() {
        let (mut ride, calls) = ride_with_host();
        ride.load();
        run(&mut ride, 2, 0.1);
        ride.skip_intro();

        assert_eq!(ride.play_track(), Some(1));
        assert_eq!(ride.play_track(), None, "already riding");
        run(&mut ride, 11, 0.1);
        assert_eq!(ride.track().unwrap().index(), 3.);
        assert!((ride.camera().position - Vec3::new(0., 0., -3.)).length() < 1e-5);

        assert_eq!(ride.jump_back(), Some(0));
        assert_eq!(ride.track().unwrap().index(), 0.);
        assert_eq!(
            calls.borrow()[4..],
            ["started 1", "stopped 1", "stopped 0"]
        );
    }

    #[test]
    fn fast_forward_shortens_the_ride() {
        let (mut ride, _) = ride_with_host();
        ride.load();
        run(&mut ride, 2, 0.1);
        ride.skip_intro();

        assert!(ride.toggle_ffwd());
        ride.play_track();
        run(&mut ride, 4, 0.1);
        assert!(!ride.track().unwrap().is_riding());
    }

    #[test]
    fn broken_track_leaves_the_intro_running() {
        let source = source();
        source
            .files
            .borrow_mut()
            .insert("track/rotations.txt".into(), b"0 0 0\n".to_vec());
        let mut ride = Ride::new(config(), Box::new(source), HostBridge::detached());
        ride.load();
        run(&mut ride, 20, 0.1);

        assert_eq!(ride.phase(), RidePhase::Intro);
        assert!(ride.track().is_none());
        assert_eq!(ride.play_track(), None);
        assert!(!ride.toggle_ffwd());
    }

    #[test]
    fn scene_follows_the_theme() {
        let (mut ride, _) = ride_with_host();
        let background = ride.theme().color(BACKGROUND);
        assert_eq!(ride.scene().background, background);

        let primary = ride.theme().color(PRIMARY);
        assert_eq!(ride.scene().objects[0].material.color(), primary);
        ride.frame(0.1);
        assert_eq!(ride.scene().objects[0].material.color(), primary);
    }

    #[test]
    fn tunnel_rings_mark_every_stop() {
        let (mut ride, _) = ride_with_host();
        ride.load();
        run(&mut ride, 2, 0.1);
        ride.skip_intro();

        // Samples 0 and 4 by spacing, plus the stop at sample 3.
        assert_eq!(ride.scene().objects.len(), 3);
        let accent = ride.theme().color(ACCENT);
        let stop_rings = ride
            .scene()
            .objects
            .iter()
            .filter(|o| o.material.color() == accent)
            .count();
        assert_eq!(stop_rings, 2);
    }

    #[test]
    fn scene_nodes_keep_a_live_parent() {
        let (mut ride, _) = ride_with_host();
        let parents_alive =
            |ride: &Ride| ride.scene().objects.iter().all(|o| o.node.parent().is_some());
        assert!(parents_alive(&ride));

        ride.load();
        run(&mut ride, 2, 0.1);
        ride.skip_intro();
        assert!(!ride.scene().objects.is_empty());
        assert!(parents_alive(&ride));
    }
}
