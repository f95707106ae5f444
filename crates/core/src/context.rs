use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::trace::TraceSink;

/// State owned by the benchmark driver and shared with every target.
///
/// Cloning is cheap and every clone sees the same collect flag and sink, so
/// the driver can switch collection on after a warm-up run and all targets
/// start recording.
#[derive(Debug, Clone)]
pub struct BenchContext {
    collect: Arc<AtomicBool>,
    sink: Arc<TraceSink>,
}

impl BenchContext {
    /// Collection starts switched off.
    #[must_use]
    pub fn new(sink: Arc<TraceSink>) -> Self {
        Self {
            collect: Arc::new(AtomicBool::new(false)),
            sink,
        }
    }

    #[must_use]
    pub fn collecting(&self) -> bool {
        self.collect.load(Ordering::Relaxed)
    }

    pub fn set_collect(&self, collect: bool) {
        self.collect.store(collect, Ordering::Relaxed);
    }

    #[must_use]
    pub fn sink(&self) -> &TraceSink {
        &self.sink
    }
}

impl Default for BenchContext {
    fn default() -> Self {
        Self::new(Arc::new(TraceSink::stdout()))
    }
}
