// SPDX-License-Identifier: MPL-2.0

use std::collections::VecDeque;

use super::{decode, AssetLibrary, AssetRequest, AssetSource};
use crate::{error::Error, host::HostBridge};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueueStatus {
    /// `loaded` of `total` requests have been processed, successfully or not.
    Loading { loaded: usize, total: usize },
    Complete,
}

/// A request that could not be loaded.
#[derive(Debug)]
pub struct FailedAsset {
    pub request: AssetRequest,
    pub error: Error,
}

/// Loads requests strictly one at a time, in order.
#[derive(Debug, Default)]
pub struct AssetQueue {
    pending: VecDeque<AssetRequest>,
    total: usize,
    loaded: usize,
    library: AssetLibrary,
    failed: Vec<FailedAsset>,
    /// Whether completion has been reported.
    completed: bool,
}

impl AssetQueue {
    pub fn new(requests: impl IntoIterator<Item = AssetRequest>) -> Self {
        let pending: VecDeque<_> = requests.into_iter().collect();

        Self {
            total: pending.len(),
            pending,
            ..Default::default()
        }
    }

    /// Appends a request. Has no effect once the queue has completed.
    pub fn push(&mut self, request: AssetRequest) {
        if self.completed {
            tracing::warn!(name = %request.name, "asset queued after loading completed; ignoring");
            return;
        }

        self.pending.push_back(request);
        self.total += 1;
    }

    pub fn status(&self) -> QueueStatus {
        if self.completed {
            QueueStatus::Complete
        } else {
            QueueStatus::Loading {
                loaded: self.loaded,
                total: self.total,
            }
        }
    }

    pub fn is_complete(&self) -> bool {
        self.completed
    }

    pub fn library(&self) -> &AssetLibrary {
        &self.library
    }

    pub fn into_library(self) -> AssetLibrary {
        self.library
    }

    pub fn failed(&self) -> &[FailedAsset] {
        &self.failed
    }

    /// Loads the next request, if any, and reports progress to `host`.
    ///
    /// Completion is reported once, by the poll that empties the queue (or the first poll of an
    /// empty queue).
    pub fn poll(&mut self, source: &mut dyn AssetSource, host: &mut HostBridge) -> QueueStatus {
        if self.completed {
            return QueueStatus::Complete;
        }

        if let Some(request) = self.pending.pop_front() {
            match decode::load(&request, source) {
                Ok(asset) => {
                    tracing::debug!(name = %request.name, kind = ?request.kind, "loaded asset");
                    self.library.insert(request.name.clone(), asset);
                }
                Err(error) => {
                    tracing::warn!(
                        name = %request.name,
                        path = %request.path,
                        error = %error,
                        "failed to load asset; continuing without it"
                    );
                    self.failed.push(FailedAsset { request, error });
                }
            }
            self.loaded += 1;
            host.load_progress(self.loaded, self.total);
        }

        if self.pending.is_empty() {
            self.completed = true;
            tracing::info!(
                loaded = self.library.len(),
                failed = self.failed.len(),
                "asset loading complete"
            );
            host.load_complete();
        }

        self.status()
    }

    /// Polls until every request has been processed.
    pub fn load_all(&mut self, source: &mut dyn AssetSource, host: &mut HostBridge) -> &AssetLibrary {
        while self.poll(source, host) != QueueStatus::Complete {}

        &self.library
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        assets::{source::MemorySource, AssetKind},
        host::testing::RecordingHost,
    };

    fn source() -> MemorySource {
        let mut source = MemorySource::default();
        source.files.insert("a.txt".into(), b"alpha".to_vec());
        source.files.insert("b.json".into(), br#"{"stops": 3}"#.to_vec());
        source.files.insert("broken.json".into(), b"{".to_vec());
        source
    }

    #[test]
    fn loads_one_request_per_poll_in_order() {
        let host = RecordingHost::default();
        let calls = host.calls.clone();
        let mut bridge = HostBridge::new(Box::new(host));
        let mut source = source();
        let mut queue = AssetQueue::new([
            AssetRequest::new("a", AssetKind::Text, "a.txt"),
            AssetRequest::new("b", AssetKind::Json, "b.json"),
        ]);

        assert_eq!(queue.status(), QueueStatus::Loading { loaded: 0, total: 2 });
        assert_eq!(
            queue.poll(&mut source, &mut bridge),
            QueueStatus::Loading { loaded: 1, total: 2 }
        );
        assert_eq!(source.requests, vec!["a.txt"]);
        assert_eq!(queue.library().text("a"), Some("alpha"));

        assert_eq!(queue.poll(&mut source, &mut bridge), QueueStatus::Complete);
        assert_eq!(queue.library().json("b").unwrap()["stops"], 3);
        assert_eq!(queue.poll(&mut source, &mut bridge), QueueStatus::Complete);

        assert_eq!(*calls.borrow(), vec!["progress 1/2", "progress 2/2", "complete"]);
    }

    #[test]
    fn failures_are_recorded_and_loading_continues() {
        let mut bridge = HostBridge::detached();
        let mut source = source();
        let mut queue = AssetQueue::new([
            AssetRequest::new("missing", AssetKind::Texture, "nope.png"),
            AssetRequest::new("broken", AssetKind::Json, "broken.json"),
            AssetRequest::new("a", AssetKind::Text, "a.txt"),
        ]);

        let library = queue.load_all(&mut source, &mut bridge);
        assert_eq!(library.len(), 1);
        assert!(library.contains("a"));

        let failed: Vec<_> = queue.failed().iter().map(|f| f.request.name.as_str()).collect();
        assert_eq!(failed, vec!["missing", "broken"]);
        assert!(matches!(queue.failed()[1].error, Error::Json(_)));
        // Nothing is retried.
        assert_eq!(source.requests, vec!["nope.png", "broken.json", "a.txt"]);
    }

    #[test]
    fn empty_queue_completes_on_first_poll() {
        let host = RecordingHost::default();
        let calls = host.calls.clone();
        let mut bridge = HostBridge::new(Box::new(host));
        let mut queue = AssetQueue::new(Vec::<AssetRequest>::new());

        assert_eq!(queue.poll(&mut source(), &mut bridge), QueueStatus::Complete);
        assert_eq!(*calls.borrow(), vec!["complete"]);
    }

    #[test]
    fn wrong_kind_lookups_return_none() {
        let mut queue = AssetQueue::new([AssetRequest::new("a", AssetKind::Text, "a.txt")]);
        queue.load_all(&mut source(), &mut HostBridge::detached());
        assert!(queue.library().texture("a").is_none());
        assert!(queue.library().model("a").is_none());
    }
}
