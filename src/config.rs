// SPDX-License-Identifier: MPL-2.0

//! TOML configuration for a [`Ride`](crate::ride::Ride).
//!
//! Every section and field is optional; anything left out takes its default.
//!
//! ```toml
//! [track]
//! positions = "track/positions.txt"
//! rotations = "track/rotations.txt"
//!
//! [ride]
//! ride_duration = 6.0
//! easing = "sine-in-out"
//!
//! [[assets]]
//! name = "skybox"
//! kind = "cube-texture"
//! path = "sky/{face}.jpg"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    assets::AssetRequest,
    error::{require_at_least, Error, Result},
    orbit::OrbitOptions,
    theme::ColorTheme,
    track::TrackOptions,
    tween::Easing,
};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RideConfig {
    pub track: TrackSection,
    pub ride: TrackOptions,
    pub orbit: OrbitOptions,
    pub theme: ThemeSection,
    pub intro: IntroSection,
    pub scene: SceneSection,
    /// Extra assets loaded before the ride starts, after the track.
    pub assets: Vec<AssetRequest>,
}

impl RideConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;

        Ok(config)
    }

    /// Checks values that parse but could stall or panic the ride.
    pub fn validate(&self) -> Result<()> {
        self.ride.validate()?;
        self.orbit.validate()?;
        require_at_least("theme.interval", self.theme.interval, 0.)?;
        require_at_least("theme.transition", self.theme.transition, 0.)?;
        require_at_least("intro.duration", self.intro.duration, 0.)?;
        require_at_least("intro.radius", self.intro.radius, 0.)?;
        if !self.intro.spin.is_finite() {
            return Err(Error::invalid("intro.spin", "expected a finite number"));
        }

        Ok(())
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::info!(path = %path.display(), assets = config.assets.len(), "loaded ride config");

        Ok(config)
    }
}

/// Where the track files are fetched from, relative to the asset source.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackSection {
    pub positions: String,
    pub rotations: String,
    pub centers: Option<String>,
}

impl Default for TrackSection {
    fn default() -> Self {
        Self {
            positions: "track/positions.txt".into(),
            rotations: "track/rotations.txt".into(),
            centers: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeSection {
    /// Seconds between theme changes; zero disables cycling.
    pub interval: f32,
    /// Seconds a theme change takes.
    pub transition: f32,
    pub easing: Easing,
    /// Empty means the built-in palettes.
    pub palettes: Vec<ColorTheme>,
}

impl Default for ThemeSection {
    fn default() -> Self {
        Self {
            interval: 30.,
            transition: 3.,
            easing: Easing::SineInOut,
            palettes: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntroSection {
    /// Seconds the orbiting intro runs before the ride takes over.
    pub duration: f32,
    /// Radians per second the intro camera circles at.
    pub spin: f32,
    pub radius: f32,
}

impl Default for IntroSection {
    fn default() -> Self {
        Self {
            duration: 6.,
            spin: 0.35,
            radius: 12.,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneSection {
    pub fog_near: f32,
    /// Zero or less disables fog.
    pub fog_far: f32,
}

impl SceneSection {
    pub fn fog(&self) -> Option<(f32, f32)> {
        (self.fog_far > 0.).then_some((self.fog_near, self.fog_far))
    }
}

impl Default for SceneSection {
    fn default() -> Self {
        Self {
            fog_near: 4.,
            fog_far: 60.,
        }
    }
}
