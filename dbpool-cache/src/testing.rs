//! Test doubles shared by the unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use dbpool_core::error::CloseError;
use dbpool_core::traits::{EvictionObserver, ResourceHandle};
use dbpool_core::types::EvictionReason;

/// Connection stand-in that counts its close calls.
#[derive(Debug)]
pub(crate) struct TestConn {
    pub(crate) id: usize,
    closes: Arc<AtomicUsize>,
    fail: bool,
}

impl TestConn {
    pub(crate) fn new(id: usize) -> (Self, Arc<AtomicUsize>) {
        Self::build(id, false)
    }

    pub(crate) fn failing(id: usize) -> (Self, Arc<AtomicUsize>) {
        Self::build(id, true)
    }

    fn build(id: usize, fail: bool) -> (Self, Arc<AtomicUsize>) {
        let closes = Arc::new(AtomicUsize::new(0));
        let conn = Self {
            id,
            closes: closes.clone(),
            fail,
        };
        (conn, closes)
    }
}

impl ResourceHandle for TestConn {
    fn close(&self) -> Result<(), CloseError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(CloseError::new(format!("conn {} refused to close", self.id)))
        } else {
            Ok(())
        }
    }
}

pub(crate) fn closes(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}

/// Observer that records every notification as `(key, reason, failed)`.
#[derive(Default)]
pub(crate) struct RecordingObserver {
    events: Mutex<Vec<(String, EvictionReason, bool)>>,
}

impl RecordingObserver {
    pub(crate) fn events(&self) -> Vec<(String, EvictionReason, bool)> {
        self.events.lock().clone()
    }
}

impl EvictionObserver for RecordingObserver {
    fn on_evicted(&self, key: &str, reason: EvictionReason) {
        self.events.lock().push((key.to_string(), reason, false));
    }

    fn on_close_failed(&self, key: &str, reason: EvictionReason, _error: &CloseError) {
        self.events.lock().push((key.to_string(), reason, true));
    }
}
