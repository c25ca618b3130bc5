// SPDX-License-Identifier: MPL-2.0

//! Callbacks into the application embedding a ride.
//!
//! A host is optional. Its failures never interrupt loading or riding: [`HostBridge`] logs them
//! and carries on.

/// An error raised by a [`Host`] callback.
#[derive(Debug, thiserror::Error)]
#[error("host callback failed: {0}")]
pub struct HostError(pub String);

impl HostError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

pub type HostResult = Result<(), HostError>;

/// The application surface notified of loading and ride progress.
///
/// Every method has a no-op default.
pub trait Host {
    /// `loaded` of `total` assets have been processed.
    fn load_progress(&mut self, loaded: usize, total: usize) -> HostResult {
        let _ = (loaded, total);
        Ok(())
    }

    /// Every asset has been processed.
    fn load_complete(&mut self) -> HostResult {
        Ok(())
    }

    /// The intro has ended and the track is ready to ride.
    fn intro_finished(&mut self) -> HostResult {
        Ok(())
    }

    fn track_started(&mut self, stop: usize) -> HostResult {
        let _ = stop;
        Ok(())
    }

    fn track_stopped(&mut self, stop: usize) -> HostResult {
        let _ = stop;
        Ok(())
    }
}

/// Forwards notifications to an optional [`Host`], swallowing its errors.
#[derive(Default)]
pub struct HostBridge {
    host: Option<Box<dyn Host>>,
}

impl std::fmt::Debug for HostBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostBridge")
            .field("attached", &self.host.is_some())
            .finish()
    }
}

impl HostBridge {
    pub fn new(host: Box<dyn Host>) -> Self {
        Self { host: Some(host) }
    }

    /// A bridge with no host; every notification is dropped.
    pub fn detached() -> Self {
        Self::default()
    }

    pub fn attach(&mut self, host: Box<dyn Host>) {
        self.host = Some(host);
    }

    pub fn is_attached(&self) -> bool {
        self.host.is_some()
    }

    fn notify(&mut self, callback: &'static str, call: impl FnOnce(&mut dyn Host) -> HostResult) {
        let Some(host) = self.host.as_deref_mut() else {
            return;
        };

        if let Err(error) = call(host) {
            tracing::debug!(callback, %error, "ignoring host failure");
        }
    }

    pub fn load_progress(&mut self, loaded: usize, total: usize) {
        self.notify("load_progress", |host| host.load_progress(loaded, total));
    }

    pub fn load_complete(&mut self) {
        self.notify("load_complete", |host| host.load_complete());
    }

    pub fn intro_finished(&mut self) {
        self.notify("intro_finished", |host| host.intro_finished());
    }

    pub fn track_started(&mut self, stop: usize) {
        self.notify("track_started", |host| host.track_started(stop));
    }

    pub fn track_stopped(&mut self, stop: usize) {
        self.notify("track_stopped", |host| host.track_stopped(stop));
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::{cell::RefCell, rc::Rc};

    use super::*;

    /// Records every notification; optionally fails each one after recording it.
    #[derive(Clone, Default)]
    pub struct RecordingHost {
        pub calls: Rc<RefCell<Vec<String>>>,
        pub fail: bool,
    }

    impl RecordingHost {
        fn record(&self, call: String) -> HostResult {
            self.calls.borrow_mut().push(call);
            if self.fail {
                Err(HostError::new("unavailable"))
            } else {
                Ok(())
            }
        }
    }

    impl Host for RecordingHost {
        fn load_progress(&mut self, loaded: usize, total: usize) -> HostResult {
            self.record(format!("progress {loaded}/{total}"))
        }

        fn load_complete(&mut self) -> HostResult {
            self.record("complete".to_owned())
        }

        fn intro_finished(&mut self) -> HostResult {
            self.record("intro finished".to_owned())
        }

        fn track_started(&mut self, stop: usize) -> HostResult {
            self.record(format!("started {stop}"))
        }

        fn track_stopped(&mut self, stop: usize) -> HostResult {
            self.record(format!("stopped {stop}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{testing::RecordingHost, *};

    #[test]
    fn detached_bridge_drops_everything() {
        let mut bridge = HostBridge::detached();
        assert!(!bridge.is_attached());
        bridge.load_progress(1, 2);
        bridge.load_complete();
    }

    #[test]
    fn failures_are_swallowed_and_later_calls_still_arrive() {
        let host = RecordingHost {
            fail: true,
            ..Default::default()
        };
        let calls = host.calls.clone();
        let mut bridge = HostBridge::new(Box::new(host));

        bridge.track_started(3);
        bridge.track_stopped(3);

        assert_eq!(*calls.borrow(), vec!["started 3", "stopped 3"]);
    }

    #[test]
    fn default_methods_are_no_ops() {
        struct Quiet;
        impl Host for Quiet {}

        let mut bridge = HostBridge::new(Box::new(Quiet));
        bridge.load_progress(0, 0);
        bridge.intro_finished();
    }
}
