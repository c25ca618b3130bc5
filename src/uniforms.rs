// SPDX-License-Identifier: MPL-2.0

//! Named shader inputs and the animations that drive them.

use std::collections::BTreeMap;

use crate::{
    linear::{Vec2, Vec3, Vec4},
    tween::{Easing, Tween},
};

/// A texture referenced by the name it was loaded under in the
/// [asset library](crate::assets::AssetLibrary).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub String);

impl TextureHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Texture(TextureHandle),
}

/// A string-keyed table of shader inputs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UniformMap {
    values: BTreeMap<String, UniformValue>,
}

impl UniformMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: UniformValue) -> Option<UniformValue> {
        self.values.insert(name.into(), value)
    }

    pub fn get(&self, name: &str) -> Option<&UniformValue> {
        self.values.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<UniformValue> {
        self.values.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &UniformValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn float(&self, name: &str) -> Option<f32> {
        match self.get(name)? {
            UniformValue::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn vec3(&self, name: &str) -> Option<Vec3> {
        match self.get(name)? {
            UniformValue::Vec3(value) => Some(*value),
            _ => None,
        }
    }

    pub fn texture(&self, name: &str) -> Option<&TextureHandle> {
        match self.get(name)? {
            UniformValue::Texture(handle) => Some(handle),
            _ => None,
        }
    }
}

/// The name of the scalar that mixes between [`MAP`] and [`MAP_NEXT`] in a texture blend.
pub const BLEND: &str = "blend";
pub const MAP: &str = "map";
pub const MAP_NEXT: &str = "map2";

/// Prepares `uniforms` to cross-fade from `from` to `to`, returning the tween that drives the
/// cross-fade.
///
/// When the tween finishes, `to` is promoted to [`MAP`] and the blend factor reset.
pub fn blend_textures(
    uniforms: &mut UniformMap,
    from: TextureHandle,
    to: TextureHandle,
    duration: f32,
    easing: Easing,
) -> UniformTween {
    uniforms.set(MAP, UniformValue::Texture(from));
    uniforms.set(MAP_NEXT, UniformValue::Texture(to));
    uniforms.set(BLEND, UniformValue::Float(0.));

    UniformTween::float(BLEND, 0., 1., duration, easing).promoting_blend()
}

#[derive(Clone, Debug, PartialEq)]
enum Endpoints {
    Float,
    Vec3(Vec3, Vec3),
}

/// A [`Tween`] bound to a named entry in a [`UniformMap`].
#[derive(Clone, Debug, PartialEq)]
pub struct UniformTween {
    name: String,
    endpoints: Endpoints,
    tween: Tween,
    promote_blend: bool,
}

impl UniformTween {
    /// Tweens a scalar, e.g. fading an opacity.
    pub fn float(name: impl Into<String>, from: f32, to: f32, duration: f32, easing: Easing) -> Self {
        Self {
            name: name.into(),
            endpoints: Endpoints::Float,
            tween: Tween::new(from, to, duration, easing),
            promote_blend: false,
        }
    }

    /// Tweens a vector component-wise, e.g. shifting a color.
    pub fn vec3(name: impl Into<String>, from: Vec3, to: Vec3, duration: f32, easing: Easing) -> Self {
        Self {
            name: name.into(),
            endpoints: Endpoints::Vec3(from, to),
            tween: Tween::new(0., 1., duration, easing),
            promote_blend: false,
        }
    }

    /// Fades the `opacity` uniform to `to`, starting from its current value.
    pub fn fade(uniforms: &UniformMap, to: f32, duration: f32, easing: Easing) -> Self {
        let from = uniforms.float(crate::Material::OPACITY).unwrap_or(1.);

        Self::float(crate::Material::OPACITY, from, to, duration, easing)
    }

    fn promoting_blend(mut self) -> Self {
        self.promote_blend = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_finished(&self) -> bool {
        self.tween.is_finished()
    }

    /// Advances the tween by `dt` seconds and writes the new value into `uniforms`.
    ///
    /// Returns `true` once the tween has finished.
    pub fn apply(&mut self, uniforms: &mut UniformMap, dt: f32) -> bool {
        let t = self.tween.advance(dt);
        let value = match self.endpoints {
            Endpoints::Float => UniformValue::Float(t),
            Endpoints::Vec3(from, to) => UniformValue::Vec3(from.lerp(to, t)),
        };
        uniforms.set(self.name.clone(), value);

        let finished = self.tween.is_finished();
        if finished && self.promote_blend {
            if let Some(next) = uniforms.remove(MAP_NEXT) {
                uniforms.set(MAP, next);
            }
            uniforms.set(self.name.clone(), UniformValue::Float(0.));
        }

        finished
    }
}

/// A set of running uniform tweens against one map.
#[derive(Clone, Debug, Default)]
pub struct UniformAnimator {
    tweens: Vec<UniformTween>,
}

impl UniformAnimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts `tween`, replacing any running tween of the same uniform.
    pub fn start(&mut self, tween: UniformTween) {
        self.tweens.retain(|running| running.name() != tween.name());
        self.tweens.push(tween);
    }

    pub fn is_idle(&self) -> bool {
        self.tweens.is_empty()
    }

    pub fn update(&mut self, uniforms: &mut UniformMap, dt: f32) {
        self.tweens.retain_mut(|tween| !tween.apply(uniforms, dt));
    }
}
