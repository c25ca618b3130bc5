// SPDX-License-Identifier: MPL-2.0

//! Damped orbiting around a target.

use std::f32::consts::{FRAC_PI_2, PI};

use serde::{Deserialize, Serialize};

use crate::{
    error::{require_at_least, Error, Result},
    linear::{Spherical, Vec3},
    Camera,
};

/// Tunables for [`OrbitControls`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitOptions {
    /// The fraction of velocity lost per second.
    pub damping: f32,
    pub min_radius: f32,
    pub max_radius: f32,
    /// The polar angle is kept this many radians away from either pole.
    pub pole_margin: f32,
    /// Azimuthal velocity, in radians per second, when no input is given.
    pub auto_rotate: f32,
}

impl Default for OrbitOptions {
    fn default() -> Self {
        Self {
            damping: 0.9,
            min_radius: 1.,
            max_radius: 500.,
            pole_margin: 0.01,
            auto_rotate: 0.,
        }
    }
}

impl OrbitOptions {
    /// Rejects radius and pole limits that leave no room to orbit in.
    pub fn validate(&self) -> Result<()> {
        require_at_least("orbit.damping", self.damping, 0.)?;
        require_at_least("orbit.min_radius", self.min_radius, 0.)?;
        require_at_least("orbit.max_radius", self.max_radius, self.min_radius)?;
        require_at_least("orbit.pole_margin", self.pole_margin, 0.)?;
        if self.pole_margin >= FRAC_PI_2 {
            return Err(Error::invalid(
                "orbit.pole_margin",
                format!("expected less than {FRAC_PI_2}, got {}", self.pole_margin),
            ));
        }
        if !self.auto_rotate.is_finite() {
            return Err(Error::invalid("orbit.auto_rotate", "expected a finite number"));
        }

        Ok(())
    }

    /// Pulls limits that would overlap back into a usable range.
    fn normalized(self) -> Self {
        let min_radius = self.min_radius.max(0.);
        Self {
            min_radius,
            max_radius: self.max_radius.max(min_radius),
            pole_margin: self.pole_margin.max(0.).min(FRAC_PI_2),
            ..self
        }
    }
}

/// A camera orbiting a target in spherical coordinates.
///
/// Input arrives as velocity impulses that decay over time, which keeps motion smooth no matter how
/// bursty the input.
#[derive(Clone, Debug)]
pub struct OrbitControls {
    pub target: Vec3,
    spherical: Spherical,
    /// Per-second rates of change of azimuth, polar angle, and radius.
    velocity: Vec3,
    options: OrbitOptions,
}

impl OrbitControls {
    pub fn new(target: Vec3, spherical: Spherical, options: OrbitOptions) -> Self {
        let mut this = Self {
            target,
            spherical,
            velocity: Vec3::ZERO,
            options: options.normalized(),
        };
        this.clamp();

        this
    }

    /// Orbits `target` from `position`.
    pub fn looking_at(position: Vec3, target: Vec3, options: OrbitOptions) -> Self {
        Self::new(target, Spherical::from_cartesian(position - target), options)
    }

    pub fn spherical(&self) -> Spherical {
        self.spherical
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Adds to the current angular and radial velocity.
    pub fn impulse(&mut self, azimuth: f32, polar: f32, radius: f32) {
        self.velocity += Vec3::new(azimuth, polar, radius);
    }

    pub fn update(&mut self, dt: f32) {
        if dt <= 0. {
            return;
        }

        let step = self.velocity * dt;
        self.spherical.azimuth =
            (self.spherical.azimuth + step.x + self.options.auto_rotate * dt).rem_euclid(2. * PI);
        self.spherical.polar += step.y;
        self.spherical.radius += step.z;
        self.clamp();

        let retained = (1. - self.options.damping.clamp(0., 1.)).powf(dt);
        self.velocity *= retained;
        if self.velocity.length_squared() < 1e-10 {
            self.velocity = Vec3::ZERO;
        }
    }

    fn clamp(&mut self) {
        let margin = self.options.pole_margin;
        self.spherical.polar = self.spherical.polar.clamp(margin, (PI - margin).max(margin));
        self.spherical.radius = self
            .spherical
            .radius
            .clamp(self.options.min_radius, self.options.max_radius);
    }

    pub fn position(&self) -> Vec3 {
        self.target + self.spherical.to_cartesian()
    }

    pub fn camera(&self) -> Camera {
        Camera {
            position: self.position(),
            target: self.target,
            up: Vec3::Y,
            ..Default::default()
        }
    }
}
