// SPDX-License-Identifier: MPL-2.0

//! Color themes that change on a timer.

use serde::{Deserialize, Serialize};

use crate::{
    linear::Vec3,
    tween::Easing,
    uniforms::{UniformAnimator, UniformMap, UniformTween, UniformValue},
};

pub const BACKGROUND: &str = "background";
pub const PRIMARY: &str = "primary";
pub const ACCENT: &str = "accent";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColorTheme {
    pub name: String,
    pub background: Vec3,
    pub primary: Vec3,
    pub accent: Vec3,
}

impl ColorTheme {
    pub fn new(name: impl Into<String>, background: Vec3, primary: Vec3, accent: Vec3) -> Self {
        Self {
            name: name.into(),
            background,
            primary,
            accent,
        }
    }

    /// The built-in palettes.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("abyss", Vec3::new(0.02, 0.03, 0.08), Vec3::new(0.15, 0.45, 0.85), Vec3::new(0.9, 0.95, 1.0)),
            Self::new("ember", Vec3::new(0.08, 0.02, 0.01), Vec3::new(0.9, 0.35, 0.1), Vec3::new(1.0, 0.85, 0.4)),
            Self::new("lagoon", Vec3::new(0.0, 0.06, 0.05), Vec3::new(0.1, 0.75, 0.6), Vec3::new(0.85, 1.0, 0.7)),
            Self::new("orchid", Vec3::new(0.05, 0.0, 0.07), Vec3::new(0.7, 0.2, 0.8), Vec3::new(1.0, 0.75, 0.95)),
        ]
    }

    fn entries(&self) -> [(&'static str, Vec3); 3] {
        [
            (BACKGROUND, self.background),
            (PRIMARY, self.primary),
            (ACCENT, self.accent),
        ]
    }
}

/// Cycles through a list of themes, cross-fading between them.
///
/// The colors of the current blend are published as [`BACKGROUND`], [`PRIMARY`], and [`ACCENT`]
/// in [`ThemeCycler::uniforms`].
#[derive(Clone, Debug)]
pub struct ThemeCycler {
    themes: Vec<ColorTheme>,
    current: usize,
    /// Seconds between automatic changes; zero or less disables them.
    interval: f32,
    transition: f32,
    easing: Easing,
    elapsed: f32,
    uniforms: UniformMap,
    animator: UniformAnimator,
}

impl ThemeCycler {
    /// Creates a cycler showing the first theme. An empty list falls back to
    /// [`ColorTheme::defaults`].
    pub fn new(themes: Vec<ColorTheme>, interval: f32, transition: f32, easing: Easing) -> Self {
        let themes = if themes.is_empty() {
            ColorTheme::defaults()
        } else {
            themes
        };

        let mut uniforms = UniformMap::new();
        for (name, color) in themes[0].entries() {
            uniforms.set(name, UniformValue::Vec3(color));
        }

        Self {
            themes,
            current: 0,
            interval,
            transition,
            easing,
            elapsed: 0.,
            uniforms,
            animator: UniformAnimator::new(),
        }
    }

    pub fn current(&self) -> &ColorTheme {
        &self.themes[self.current]
    }

    pub fn uniforms(&self) -> &UniformMap {
        &self.uniforms
    }

    pub fn color(&self, name: &str) -> Vec3 {
        self.uniforms.vec3(name).unwrap_or(Vec3::ZERO)
    }

    pub fn is_transitioning(&self) -> bool {
        !self.animator.is_idle()
    }

    /// Starts fading to the next theme, wrapping after the last.
    pub fn next(&mut self) {
        self.show((self.current + 1) % self.themes.len());
    }

    /// Starts fading to the theme at `index`, wrapped into the list.
    pub fn show(&mut self, index: usize) {
        self.current = index % self.themes.len();
        self.elapsed = 0.;

        let theme = &self.themes[self.current];
        tracing::debug!(theme = %theme.name, "changing theme");
        for (name, color) in theme.entries() {
            let from = self.uniforms.vec3(name).unwrap_or(color);
            self.animator
                .start(UniformTween::vec3(name, from, color, self.transition, self.easing));
        }
    }

    pub fn update(&mut self, dt: f32) {
        self.elapsed += dt;
        if self.interval > 0. && self.elapsed >= self.interval {
            self.next();
        }

        self.animator.update(&mut self.uniforms, dt);
    }
}
