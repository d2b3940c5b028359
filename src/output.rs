//! Process-wide output sink abstraction.
//!
//! Process-bound response templates write their body through an ambient
//! output buffer rather than a private memory stream. The sink is injected
//! into whatever needs it, so lifecycle reset logic can be exercised in
//! tests without a real process-wide buffer.

use std::sync::{Arc, Mutex};

use bytes::Bytes;

/// Shared output buffer with nesting-level bookkeeping.
///
/// Cloning yields another handle to the same buffer. All state lives
/// behind a mutex; the engine itself is single-threaded, the lock only
/// keeps the handle `Send` for test runners that move it across threads.
#[derive(Clone, Debug, Default)]
pub struct OutputSink {
    inner: Arc<Mutex<SinkState>>,
}

#[derive(Debug, Default)]
struct SinkState {
    level: usize,
    buffer: Vec<u8>,
}

impl OutputSink {
    /// Create a sink with no buffering started.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a buffering level.
    pub fn start(&self) {
        let mut state = self.inner.lock().unwrap();
        state.level += 1;
    }

    /// Current buffering nesting level.
    pub fn level(&self) -> usize {
        self.inner.lock().unwrap().level
    }

    /// Discard all buffered output.
    pub fn clear(&self) {
        let mut state = self.inner.lock().unwrap();
        state.buffer.clear();
    }

    /// Append bytes to the buffer.
    pub fn write(&self, data: &[u8]) {
        let mut state = self.inner.lock().unwrap();
        state.buffer.extend_from_slice(data);
    }

    /// Snapshot of the buffered output.
    pub fn contents(&self) -> Bytes {
        let state = self.inner.lock().unwrap();
        Bytes::copy_from_slice(&state.buffer)
    }

    /// Whether two handles refer to the same buffer.
    pub fn same_sink(&self, other: &OutputSink) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
