// SPDX-License-Identifier: MPL-2.0

use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{file}:{line}: {message}")]
    TrackParse {
        file: String,
        line: usize,
        message: String,
    },
    #[error("track files disagree: {positions} position(s) but {other} {what}")]
    TrackMismatch {
        positions: usize,
        other: usize,
        what: &'static str,
    },
    #[error("track contains no points")]
    EmptyTrack,
    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),
    #[error("failed to load model: {0}")]
    Model(#[from] tobj::LoadError),
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("asset is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("cube texture face '{face}': {message}")]
    CubeFace { face: &'static str, message: String },
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
    #[error("invalid value for '{field}': {message}")]
    InvalidConfig {
        field: &'static str,
        message: String,
    },
}

impl Error {
    pub(crate) fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            message: message.into(),
        }
    }
}

/// Fails with [`Error::InvalidConfig`] unless `value` is finite and at least `min`.
pub(crate) fn require_at_least(field: &'static str, value: f32, min: f32) -> Result<()> {
    if value.is_finite() && value >= min {
        Ok(())
    } else {
        Err(Error::invalid(field, format!("expected a number >= {min}, got {value}")))
    }
}
