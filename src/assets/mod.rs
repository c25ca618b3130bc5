// SPDX-License-Identifier: MPL-2.0

//! Sequential asset loading.
//!
//! Assets are requested up front and loaded one per [`AssetQueue::poll`], so that a frame loop can
//! keep drawing (and reporting progress) while loading. An asset that fails to load is logged and
//! skipped.

mod decode;
mod queue;
mod source;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub use decode::{CubeTexture, ModelMesh, CUBE_FACES};
pub use queue::{AssetQueue, FailedAsset, QueueStatus};
#[cfg(feature = "http")]
pub use source::HttpSource;
pub use source::{AssetSource, FileSource};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssetKind {
    Json,
    Text,
    Texture,
    /// Six images, one per cube face.
    ///
    /// The request path either contains a `{face}` placeholder, which is replaced by each of
    /// [`CUBE_FACES`], or names a directory holding `<face>.jpg` files.
    CubeTexture,
    /// A Wavefront OBJ model.
    Model,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRequest {
    /// The name the asset is stored under in the [`AssetLibrary`].
    pub name: String,
    pub kind: AssetKind,
    /// Where to fetch the asset from, relative to the [`AssetSource`].
    pub path: String,
}

impl AssetRequest {
    pub fn new(name: impl Into<String>, kind: AssetKind, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            path: path.into(),
        }
    }
}

#[derive(Clone, Debug)]
pub enum Asset {
    Json(serde_json::Value),
    Text(String),
    Texture(image::RgbaImage),
    CubeTexture(CubeTexture),
    Model(Vec<ModelMesh>),
}

impl Asset {
    pub fn kind(&self) -> AssetKind {
        match self {
            Asset::Json(_) => AssetKind::Json,
            Asset::Text(_) => AssetKind::Text,
            Asset::Texture(_) => AssetKind::Texture,
            Asset::CubeTexture(_) => AssetKind::CubeTexture,
            Asset::Model(_) => AssetKind::Model,
        }
    }
}

/// Loaded assets by name.
#[derive(Clone, Debug, Default)]
pub struct AssetLibrary {
    assets: HashMap<String, Asset>,
}

impl AssetLibrary {
    pub fn insert(&mut self, name: impl Into<String>, asset: Asset) {
        self.assets.insert(name.into(), asset);
    }

    pub fn get(&self, name: &str) -> Option<&Asset> {
        self.assets.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.assets.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn json(&self, name: &str) -> Option<&serde_json::Value> {
        match self.get(name)? {
            Asset::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            Asset::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn texture(&self, name: &str) -> Option<&image::RgbaImage> {
        match self.get(name)? {
            Asset::Texture(image) => Some(image),
            _ => None,
        }
    }

    pub fn cube_texture(&self, name: &str) -> Option<&CubeTexture> {
        match self.get(name)? {
            Asset::CubeTexture(cube) => Some(cube),
            _ => None,
        }
    }

    pub fn model(&self, name: &str) -> Option<&[ModelMesh]> {
        match self.get(name)? {
            Asset::Model(meshes) => Some(meshes),
            _ => None,
        }
    }
}
