// SPDX-License-Identifier: MPL-2.0

//! Time-based interpolation with easing.

use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

/// An easing curve mapping linear progress in `[0, 1]` to eased progress.
///
/// Every curve maps 0 to 0 and 1 to 1.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Easing {
    Linear,
    QuadIn,
    QuadOut,
    QuadInOut,
    CubicIn,
    CubicOut,
    #[default]
    CubicInOut,
    SineInOut,
    Smoothstep,
}

impl Easing {
    pub fn sample(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::QuadIn => t * t,
            Easing::QuadOut => t * (2.0 - t),
            Easing::QuadInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
            Easing::CubicIn => t * t * t,
            Easing::CubicOut => {
                let u = t - 1.0;
                u * u * u + 1.0
            }
            Easing::CubicInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    let u = 2.0 * t - 2.0;
                    0.5 * u * u * u + 1.0
                }
            }
            Easing::SineInOut => 0.5 * (1.0 - (PI * t).cos()),
            Easing::Smoothstep => t * t * (3.0 - 2.0 * t),
        }
    }
}

/// Interpolates a scalar from `from` to `to` over `duration` seconds.
///
/// Tweens do not read a clock; they are advanced explicitly with [`Tween::advance`] so that the
/// caller decides what a frame's worth of time is.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tween {
    from: f32,
    to: f32,
    duration: f32,
    elapsed: f32,
    easing: Easing,
}

impl Tween {
    /// Creates a tween. A non-positive duration yields a tween that is already finished.
    pub fn new(from: f32, to: f32, duration: f32, easing: Easing) -> Self {
        Self {
            from,
            to,
            duration: duration.max(0.0),
            elapsed: 0.0,
            easing,
        }
    }

    pub fn from(&self) -> f32 {
        self.from
    }

    pub fn to(&self) -> f32 {
        self.to
    }

    /// Linear progress in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).min(1.0)
        }
    }

    pub fn is_finished(&self) -> bool {
        self.progress() >= 1.0
    }

    /// The current eased value.
    pub fn value(&self) -> f32 {
        if self.is_finished() {
            return self.to;
        }

        let eased = self.easing.sample(self.progress());
        self.from + (self.to - self.from) * eased
    }

    /// Advances the tween by `dt` seconds and returns the new value.
    pub fn advance(&mut self, dt: f32) -> f32 {
        if dt > 0.0 {
            self.elapsed = (self.elapsed + dt).min(self.duration);
        }

        self.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Easing; 9] = [
        Easing::Linear,
        Easing::QuadIn,
        Easing::QuadOut,
        Easing::QuadInOut,
        Easing::CubicIn,
        Easing::CubicOut,
        Easing::CubicInOut,
        Easing::SineInOut,
        Easing::Smoothstep,
    ];

    #[test]
    fn every_curve_hits_its_endpoints() {
        for easing in ALL {
            assert!(easing.sample(0.0).abs() < 1e-6, "{easing:?} at 0");
            assert!((easing.sample(1.0) - 1.0).abs() < 1e-6, "{easing:?} at 1");
        }
    }

    #[test]
    fn every_curve_is_monotonic() {
        for easing in ALL {
            let mut last = 0.0;
            for step in 0..=100 {
                let sample = easing.sample(step as f32 / 100.0);
                assert!(sample >= last - 1e-6, "{easing:?} dipped at step {step}");
                last = sample;
            }
        }
    }

    #[test]
    fn out_of_range_progress_is_clamped() {
        assert_eq!(Easing::QuadIn.sample(-1.0), 0.0);
        assert_eq!(Easing::QuadIn.sample(2.0), 1.0);
    }

    #[test]
    fn tween_reaches_target_exactly() {
        let mut tween = Tween::new(2.0, 7.0, 1.0, Easing::SineInOut);
        tween.advance(0.4);
        assert!(!tween.is_finished());
        let value = tween.advance(0.7);
        assert!(tween.is_finished());
        assert_eq!(value, 7.0);
    }

    #[test]
    fn linear_tween_is_proportional() {
        let mut tween = Tween::new(0.0, 10.0, 2.0, Easing::Linear);
        assert!((tween.advance(0.5) - 2.5).abs() < 1e-5);
    }

    #[test]
    fn zero_duration_is_finished_immediately() {
        let tween = Tween::new(1.0, 3.0, 0.0, Easing::Linear);
        assert!(tween.is_finished());
        assert_eq!(tween.value(), 3.0);
    }
}
