// SPDX-License-Identifier: MPL-2.0

//! Recorded camera paths.
//!
//! A track is an ordered, looping list of [`TrackPoint`]s. Some points are *stops*: points of
//! interest where a ride pauses. The [`TrackController`] walks the track by a fractional index,
//! interpolating between neighboring points.

mod controller;
mod point;

pub use controller::{TrackController, TrackEvent, TrackOptions, TrackPose};
pub use point::{load_track, parse_track, TrackFiles, TrackPoint};
