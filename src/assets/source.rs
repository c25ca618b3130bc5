// SPDX-License-Identifier: MPL-2.0

use std::path::PathBuf;

use crate::error::{Error, Result};

/// Somewhere assets are fetched from.
pub trait AssetSource {
    /// Fetches the raw bytes at `path`.
    fn fetch(&mut self, path: &str) -> Result<Vec<u8>>;
}

/// Reads assets from a directory.
#[derive(Clone, Debug)]
pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetSource for FileSource {
    fn fetch(&mut self, path: &str) -> Result<Vec<u8>> {
        let path = self.root.join(path);
        tracing::trace!(path = %path.display(), "reading asset");

        std::fs::read(&path).map_err(|source| Error::Io { path, source })
    }
}

/// Fetches assets with HTTP GET requests against a base URL.
#[cfg(feature = "http")]
#[derive(Clone, Debug)]
pub struct HttpSource {
    client: reqwest::blocking::Client,
    base_url: String,
}

#[cfg(feature = "http")]
impl HttpSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/'),
        )
    }
}

#[cfg(feature = "http")]
impl AssetSource for HttpSource {
    fn fetch(&mut self, path: &str) -> Result<Vec<u8>> {
        let url = self.url(path);
        tracing::trace!(%url, "fetching asset");

        let response = self.client.get(&url).send()?.error_for_status()?;
        Ok(response.bytes()?.to_vec())
    }
}

/// Serves assets from memory.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct MemorySource {
    pub files: std::collections::HashMap<String, Vec<u8>>,
    pub requests: Vec<String>,
}

#[cfg(test)]
impl AssetSource for MemorySource {
    fn fetch(&mut self, path: &str) -> Result<Vec<u8>> {
        self.requests.push(path.to_owned());
        self.files.get(path).cloned().ok_or_else(|| Error::Io {
            path: PathBuf::from(path),
            source: std::io::ErrorKind::NotFound.into(),
        })
    }
}
