//! Relay suppression state for the feedback-loop prevention machinery.
//!
//! While the service is speaking a generated reply into a call, the caller's
//! audio path would pick that speech up and the recognizer would transcribe
//! it as new input. The guard suppresses the relay for exactly that window:
//! disabled the instant a transcript triggers a response, re-enabled when the
//! outbound response call reports completion (or when the fallback window
//! expires).
//!
//! Guard state is scoped per call and published in a registry keyed by call
//! id, so the completion webhook can re-enable the one call it belongs to.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Per-call relay on/off switch.
///
/// The state is a single epoch counter: even values mean the relay is
/// enabled, odd values mean it is suppressed. Every transition bumps the
/// epoch, so a disable always invalidates any re-enable decision taken
/// against an older epoch. All transitions are single atomic operations;
/// nothing reads-then-writes across an await point.
#[derive(Debug, Default)]
pub struct RelayGuard {
    epoch: AtomicU64,
}

impl RelayGuard {
    /// A fresh guard starts enabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether audio may currently flow to the recognizer.
    pub fn is_enabled(&self) -> bool {
        self.epoch.load(Ordering::SeqCst) % 2 == 0
    }

    /// Suppresses the relay and returns the new (odd) epoch as a token for
    /// `enable_if_current`.
    pub fn disable(&self) -> u64 {
        // An already-suppressed guard opens a new suppression epoch so older
        // tokens go stale.
        let prev = self
            .epoch
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |e| {
                Some(if e % 2 == 0 { e + 1 } else { e + 2 })
            })
            .unwrap_or_default();
        if prev % 2 == 0 { prev + 1 } else { prev + 2 }
    }

    /// Re-enables the relay unconditionally.
    pub fn enable(&self) {
        let _ = self
            .epoch
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |e| {
                if e % 2 == 1 { Some(e + 1) } else { None }
            });
    }

    /// Re-enables the relay only if `token` is still the current suppression
    /// epoch. A stale token (a newer disable happened since) is a no-op.
    /// Returns whether the relay was re-enabled.
    pub fn enable_if_current(&self, token: u64) -> bool {
        self.epoch
            .compare_exchange(token, token + 1, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}

/// Process-wide map from call id to that call's guard.
///
/// Sessions register on websocket accept and deregister on close; the
/// completion webhook looks its call up here.
#[derive(Clone, Default)]
pub struct GuardRegistry {
    inner: Arc<Mutex<HashMap<String, Arc<RelayGuard>>>>,
}

impl GuardRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates and registers a fresh guard for `call_id`, replacing any
    /// leftover entry from an earlier connection with the same id.
    pub fn register(&self, call_id: &str) -> Arc<RelayGuard> {
        let guard = Arc::new(RelayGuard::new());
        self.inner
            .lock()
            .expect("guard registry poisoned")
            .insert(call_id.to_string(), guard.clone());
        guard
    }

    pub fn get(&self, call_id: &str) -> Option<Arc<RelayGuard>> {
        self.inner
            .lock()
            .expect("guard registry poisoned")
            .get(call_id)
            .cloned()
    }

    pub fn remove(&self, call_id: &str) {
        self.inner
            .lock()
            .expect("guard registry poisoned")
            .remove(call_id);
    }
}
