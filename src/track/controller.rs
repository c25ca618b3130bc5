// SPDX-License-Identifier: MPL-2.0

use serde::{Deserialize, Serialize};

use super::TrackPoint;
use crate::{
    error::{require_at_least, Error, Result},
    linear::{slerp_shortest, Mat4, Quat, Vec2, Vec3},
    tween::{Easing, Tween},
    Camera,
};

/// Tunables for a [`TrackController`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackOptions {
    /// Seconds taken to ride from one stop to the next.
    pub ride_duration: f32,
    pub easing: Easing,
    /// How many times faster a ride progresses while fast-forwarding.
    pub ffwd_rate: f32,
    /// The yaw, in degrees, reached when the pointer is at the horizontal edge of the viewport.
    pub max_look_yaw: f32,
    /// The pitch, in degrees, reached when the pointer is at the vertical edge of the viewport.
    pub max_look_pitch: f32,
    /// The rate, per second, at which the view catches up to the pointer.
    pub look_damping: f32,
}

impl Default for TrackOptions {
    fn default() -> Self {
        Self {
            ride_duration: 4.,
            easing: Easing::CubicInOut,
            ffwd_rate: 4.,
            max_look_yaw: 30.,
            max_look_pitch: 20.,
            look_damping: 4.,
        }
    }
}

impl TrackOptions {
    /// Rejects options that would leave a ride unable to finish.
    pub fn validate(&self) -> Result<()> {
        require_at_least("ride.ride_duration", self.ride_duration, 0.)?;
        if !(self.ffwd_rate.is_finite() && self.ffwd_rate > 0.) {
            return Err(Error::invalid(
                "ride.ffwd_rate",
                format!("expected a positive number, got {}", self.ffwd_rate),
            ));
        }
        require_at_least("ride.max_look_yaw", self.max_look_yaw, 0.)?;
        require_at_least("ride.max_look_pitch", self.max_look_pitch, 0.)?;
        require_at_least("ride.look_damping", self.look_damping, 0.)
    }
}

/// Something that happened on the track since events were last drained.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackEvent {
    /// A ride toward `stop` has begun.
    Started { stop: usize },
    /// The camera came to rest at `stop`.
    Stopped { stop: usize },
}

/// The camera transform at the controller's current index.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackPose {
    pub position: Vec3,
    /// The path orientation with look rotations applied.
    pub orientation: Quat,
    pub up: Vec3,
    pub matrix: Mat4,
}

impl TrackPose {
    /// The direction the camera faces.
    pub fn forward(&self) -> Vec3 {
        self.orientation * Vec3::NEG_Z
    }
}

#[derive(Clone, Copy, Debug)]
struct ActiveRide {
    /// Drives the unwrapped index, which may run past the end of the track.
    tween: Tween,
    /// The sample the ride ends on.
    target: usize,
    stop: usize,
}

/// Walks a looping track by a fractional index.
#[derive(Clone, Debug)]
pub struct TrackController {
    points: Vec<TrackPoint>,
    options: TrackOptions,
    /// Always within `[0, points.len())`.
    index: f32,
    ride: Option<ActiveRide>,
    ffwd: bool,
    /// Yaw and pitch, in radians, that the look is easing toward.
    look_target: Vec2,
    look: Vec2,
    device_orientation: Option<Quat>,
    events: Vec<TrackEvent>,
}

impl TrackController {
    pub fn new(points: Vec<TrackPoint>, options: TrackOptions) -> Result<Self> {
        if points.is_empty() {
            return Err(Error::EmptyTrack);
        }
        options.validate()?;

        Ok(Self {
            points,
            options,
            index: 0.,
            ride: None,
            ffwd: false,
            look_target: Vec2::ZERO,
            look: Vec2::ZERO,
            device_orientation: None,
            events: Vec::new(),
        })
    }

    pub fn points(&self) -> &[TrackPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn options(&self) -> &TrackOptions {
        &self.options
    }

    pub fn index(&self) -> f32 {
        self.index
    }

    /// Moves to `index`, wrapped into the track.
    pub fn set_index(&mut self, index: f32) {
        let len = self.points.len() as f32;
        let mut wrapped = index.rem_euclid(len);
        // Rounding can land a tiny negative input exactly on `len`.
        if wrapped >= len {
            wrapped = 0.;
        }
        self.index = wrapped;
    }

    pub fn advance(&mut self, delta: f32) {
        self.set_index(self.index + delta);
    }

    pub fn is_riding(&self) -> bool {
        self.ride.is_some()
    }

    pub fn is_ffwd(&self) -> bool {
        self.ffwd
    }

    /// The stop the camera is resting on, if any.
    pub fn current_stop(&self) -> Option<usize> {
        if self.ride.is_some() || self.index.fract() != 0. {
            return None;
        }

        self.points[self.index as usize].stop
    }

    /// Toggles fast-forwarding and returns whether it is now on.
    pub fn toggle_ffwd(&mut self) -> bool {
        self.ffwd = !self.ffwd;
        tracing::debug!(ffwd = self.ffwd, "toggled fast-forward");

        self.ffwd
    }

    /// Aims the look at a pointer position, with both coordinates normalized to `[-1, 1]`.
    pub fn look(&mut self, x: f32, y: f32) {
        self.look_target = Vec2::new(
            -x.clamp(-1., 1.) * self.options.max_look_yaw.to_radians(),
            -y.clamp(-1., 1.) * self.options.max_look_pitch.to_radians(),
        );
    }

    pub fn set_device_orientation(&mut self, orientation: Option<Quat>) {
        self.device_orientation = orientation;
    }

    /// Starts riding toward the nearest stop ahead and returns its stop index.
    ///
    /// Nothing happens if a ride is already underway or the track has no stops.
    pub fn ride_to_next_stop(&mut self) -> Option<usize> {
        if self.ride.is_some() {
            return None;
        }

        let len = self.points.len();
        let base = self.index.floor() as usize;
        let (steps, target) = (1..=len)
            .map(|steps| (steps, (base + steps) % len))
            .find(|&(_, sample)| self.points[sample].is_stop())?;
        let stop = self.points[target].stop?;

        let tween = Tween::new(
            self.index,
            (base + steps) as f32,
            self.options.ride_duration,
            self.options.easing,
        );
        self.ride = Some(ActiveRide { tween, target, stop });
        self.events.push(TrackEvent::Started { stop });
        tracing::debug!(stop, from = self.index, to = target, "riding to next stop");

        Some(stop)
    }

    /// Snaps back to the nearest stop behind and returns its stop index.
    ///
    /// Any ride underway is abandoned.
    pub fn jump_back(&mut self) -> Option<usize> {
        let len = self.points.len() as isize;
        let start = self.index.ceil() as isize - 1;
        let target = (0..len)
            .map(|steps| (start - steps).rem_euclid(len) as usize)
            .find(|&sample| self.points[sample].is_stop())?;
        let stop = self.points[target].stop?;

        self.ride = None;
        self.index = target as f32;
        self.events.push(TrackEvent::Stopped { stop });
        tracing::debug!(stop, to = target, "jumped back");

        Some(stop)
    }

    /// Advances any ride and look easing by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        let catch_up = 1. - (-self.options.look_damping * dt.max(0.)).exp();
        self.look += (self.look_target - self.look) * catch_up;

        let Some(mut ride) = self.ride.take() else {
            return;
        };

        let rate = if self.ffwd { self.options.ffwd_rate } else { 1. };
        let unwrapped = ride.tween.advance(dt * rate);
        if ride.tween.is_finished() {
            self.index = ride.target as f32;
            self.events.push(TrackEvent::Stopped { stop: ride.stop });
            tracing::debug!(stop = ride.stop, "arrived at stop");
        } else {
            self.set_index(unwrapped);
            self.ride = Some(ride);
        }
    }

    /// Takes every event that happened since the last call.
    pub fn drain_events(&mut self) -> Vec<TrackEvent> {
        std::mem::take(&mut self.events)
    }

    /// Interpolates the camera transform at the current index.
    pub fn pose(&self) -> TrackPose {
        let len = self.points.len();
        let i0 = (self.index.floor() as usize) % len;
        let i1 = (i0 + 1) % len;
        let t = self.index - self.index.floor();
        let (a, b) = (&self.points[i0], &self.points[i1]);

        let position = a.position.lerp(b.position, t);
        let path_orientation = slerp_shortest(a.orientation, b.orientation, t);
        let center = a.center.lerp(b.center, t);

        let look = Quat::from_rotation_y(self.look.x) * Quat::from_rotation_x(self.look.y);
        let mut orientation = path_orientation * look;
        if let Some(device) = self.device_orientation {
            orientation = orientation * device;
        }
        let orientation = orientation.normalize();

        let forward = orientation * Vec3::NEG_Z;
        let up = match (position - center).try_normalize() {
            Some(up) if up.cross(forward).length_squared() > 1e-6 => up,
            _ => path_orientation * Vec3::Y,
        };

        TrackPose {
            position,
            orientation,
            up,
            matrix: Mat4::from_rotation_translation(orientation, position),
        }
    }

    /// A camera placed at the current pose.
    pub fn camera(&self) -> Camera {
        let pose = self.pose();

        Camera {
            position: pose.position,
            target: pose.position + pose.forward(),
            up: pose.up,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linear::angle_between;

    /// A straight track along +X with stops at the given samples.
    fn track(len: usize, stops: &[usize]) -> TrackController {
        let points = (0..len)
            .map(|i| {
                let point = TrackPoint::new(
                    Vec3::new(i as f32, 0., 0.),
                    Quat::from_rotation_y(i as f32 * 0.2),
                );
                match stops.iter().position(|&s| s == i) {
                    Some(stop) => point.with_stop(stop),
                    None => point,
                }
            })
            .collect();

        TrackController::new(points, TrackOptions::default()).unwrap()
    }

    fn finish_ride(controller: &mut TrackController) {
        for _ in 0..1_000 {
            if !controller.is_riding() {
                return;
            }
            controller.update(0.05);
        }
        panic!("ride never finished");
    }

    #[test]
    fn empty_track_is_rejected() {
        assert!(matches!(
            TrackController::new(Vec::new(), TrackOptions::default()),
            Err(Error::EmptyTrack)
        ));
    }

    #[test]
    fn interpolated_position_lies_on_segment() {
        let mut controller = track(5, &[]);
        for &index in &[1.25f32, 1.5, 1.9, 3.01] {
            controller.set_index(index);
            let pose = controller.pose();
            let a = controller.points()[index as usize].position;
            let b = controller.points()[index as usize + 1].position;
            let t = index.fract();
            assert!((pose.position - a.lerp(b, t)).length() < 1e-5);
        }
    }

    #[test]
    fn interpolated_orientation_lies_on_shortest_arc() {
        let mut points: Vec<_> = track(2, &[]).points().to_vec();
        points[0].orientation = Quat::from_rotation_z(0.2);
        // The same rotation as 0.8 rad about Z, expressed on the far hemisphere.
        points[1].orientation = -Quat::from_rotation_z(0.8);
        let mut controller = TrackController::new(points, TrackOptions::default()).unwrap();

        let (q0, q1) = (controller.points()[0].orientation, controller.points()[1].orientation);
        let total = angle_between(q0, q1);
        controller.set_index(0.25);
        let q = controller.pose().orientation;

        assert!((angle_between(q0, q) + angle_between(q, q1) - total).abs() < 1e-4);
        assert!((angle_between(q0, q) - 0.25 * total).abs() < 1e-4);
    }

    #[test]
    fn last_segment_blends_back_into_first_point() {
        let mut controller = track(4, &[]);
        controller.set_index(3.5);
        let pose = controller.pose();
        assert!((pose.position - Vec3::new(1.5, 0., 0.)).length() < 1e-5);
    }

    #[test]
    fn advancing_wraps_modulo_length() {
        let mut controller = track(4, &[]);
        controller.set_index(3.5);
        controller.advance(1.);
        assert!((controller.index() - 0.5).abs() < 1e-6);
        controller.advance(-1.);
        assert!((controller.index() - 3.5).abs() < 1e-6);
        controller.set_index(-8.);
        assert_eq!(controller.index(), 0.);
        controller.set_index(-1e-9);
        assert!(controller.index() < 4.);
    }

    #[test]
    fn ride_ends_on_the_nearest_stop_ahead() {
        let mut controller = track(10, &[2, 5, 8]);
        controller.set_index(3.5);

        assert_eq!(controller.ride_to_next_stop(), Some(1));
        finish_ride(&mut controller);

        assert_eq!(controller.index(), 5.);
        assert_eq!(controller.current_stop(), Some(1));
        assert_eq!(
            controller.drain_events(),
            vec![TrackEvent::Started { stop: 1 }, TrackEvent::Stopped { stop: 1 }]
        );
    }

    #[test]
    fn ride_from_a_stop_moves_on_to_the_next() {
        let mut controller = track(10, &[2, 5]);
        controller.set_index(2.);
        assert_eq!(controller.ride_to_next_stop(), Some(1));
        finish_ride(&mut controller);
        assert_eq!(controller.index(), 5.);
    }

    #[test]
    fn ride_wraps_past_the_end_and_never_skips_a_stop() {
        let mut controller = track(10, &[1, 4, 7]);
        controller.set_index(8.);

        let mut last = controller.index();
        let mut visited = Vec::new();
        controller.ride_to_next_stop();
        for _ in 0..1_000 {
            controller.update(0.05);
            let index = controller.index();
            // Progress is monotonic modulo the wrap.
            let moved = (index - last).rem_euclid(10.);
            assert!(moved < 5., "jumped from {last} to {index}");
            last = index;
            if !controller.is_riding() {
                break;
            }
            visited.push(index);
        }

        assert_eq!(controller.index(), 1.);
        assert_eq!(controller.current_stop(), Some(0));
        assert!(visited.iter().all(|&i| !(1.0..8.0).contains(&i)));
    }

    #[test]
    fn ride_is_ignored_while_riding_or_without_stops() {
        let mut controller = track(6, &[3]);
        assert_eq!(controller.ride_to_next_stop(), Some(0));
        assert_eq!(controller.ride_to_next_stop(), None);

        let mut bare = track(6, &[]);
        assert_eq!(bare.ride_to_next_stop(), None);
        assert!(!bare.is_riding());
    }

    #[test]
    fn single_stop_rides_a_full_loop() {
        let mut controller = track(6, &[3]);
        controller.set_index(3.);
        controller.ride_to_next_stop();
        controller.update(controller.options().ride_duration * 0.5);
        assert!(controller.is_riding());
        finish_ride(&mut controller);
        assert_eq!(controller.index(), 3.);
    }

    #[test]
    fn ffwd_shortens_the_ride() {
        let mut normal = track(10, &[9]);
        let mut fast = track(10, &[9]);
        assert!(fast.toggle_ffwd());

        normal.ride_to_next_stop();
        fast.ride_to_next_stop();
        let dt = normal.options().ride_duration / fast.options().ffwd_rate;
        normal.update(dt);
        fast.update(dt);

        assert!(normal.is_riding());
        assert!(!fast.is_riding());
        assert_eq!(fast.index(), 9.);
        assert!(!fast.toggle_ffwd());
    }

    #[test]
    fn jump_back_snaps_to_the_nearest_stop_behind() {
        let mut controller = track(10, &[2, 5, 8]);
        controller.set_index(7.4);
        assert_eq!(controller.jump_back(), Some(1));
        assert_eq!(controller.index(), 5.);
        assert_eq!(controller.pose().position, controller.points()[5].position);

        // Already on a stop: go to the one before it.
        assert_eq!(controller.jump_back(), Some(0));
        assert_eq!(controller.index(), 2.);

        // And wrap around the start.
        assert_eq!(controller.jump_back(), Some(2));
        assert_eq!(controller.index(), 8.);
    }

    #[test]
    fn jump_back_cancels_a_ride() {
        let mut controller = track(10, &[2, 5]);
        controller.set_index(2.);
        controller.ride_to_next_stop();
        controller.update(1.);
        assert!(controller.index() > 2.);

        assert_eq!(controller.jump_back(), Some(0));
        assert!(!controller.is_riding());
        assert_eq!(controller.index(), 2.);
        assert_eq!(
            controller.drain_events(),
            vec![TrackEvent::Started { stop: 1 }, TrackEvent::Stopped { stop: 0 }]
        );
    }

    #[test]
    fn look_eases_toward_the_pointer() {
        let mut controller = track(3, &[]);
        let straight = controller.pose().forward();
        controller.look(1., 0.);
        controller.update(0.1);
        let partial = controller.pose().forward();
        for _ in 0..200 {
            controller.update(0.1);
        }
        let settled = controller.pose().forward();

        let yaw = |v: Vec3| straight.angle_between(v);
        assert!(yaw(partial) > 0.);
        assert!(yaw(partial) < yaw(settled));
        assert!((yaw(settled) - controller.options().max_look_yaw.to_radians()).abs() < 1e-3);
    }

    #[test]
    fn device_orientation_composes_after_the_path() {
        let mut controller = track(3, &[]);
        controller.set_device_orientation(Some(Quat::from_rotation_x(0.3)));
        let expected = controller.points()[0].orientation * Quat::from_rotation_x(0.3);
        assert!(angle_between(controller.pose().orientation, expected) < 1e-5);
    }

    #[test]
    fn camera_faces_along_orientation() {
        let controller = track(3, &[]);
        let camera = controller.camera();
        let forward = (camera.target - camera.position).normalize();
        assert!((forward - controller.pose().forward()).length() < 1e-5);
        assert!(camera.up.cross(forward).length() > 0.1);
    }

    #[test]
    fn options_that_stall_a_ride_are_rejected() {
        let points = track(4, &[2]).points().to_vec();
        for options in [
            TrackOptions { ffwd_rate: -1., ..Default::default() },
            TrackOptions { ffwd_rate: 0., ..Default::default() },
            TrackOptions { ride_duration: f32::NAN, ..Default::default() },
        ] {
            assert!(matches!(
                TrackController::new(points.clone(), options),
                Err(Error::InvalidConfig { .. })
            ));
        }
    }

    #[test]
    fn fast_forward_ride_reaches_its_stop() {
        let mut controller = track(4, &[2]);
        assert!(controller.toggle_ffwd());
        assert_eq!(controller.ride_to_next_stop(), Some(0));
        finish_ride(&mut controller);
        assert_eq!(controller.index(), 2.);
        assert_eq!(
            controller.drain_events(),
            vec![TrackEvent::Started { stop: 0 }, TrackEvent::Stopped { stop: 0 }]
        );
    }
}
