//! Human-facing progress output.
//!
//! A [`TraceSink`] is created once per process and shared by every target
//! through its [`BenchContext`](crate::context::BenchContext). The underlying
//! writer is opened lazily on first use and at most once; each line is
//! written under a lock so output from concurrently driven targets does not
//! interleave mid-line.

use core::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::time::{Duration, Instant};

type Writer = Box<dyn Write + Send>;
type Opener = Box<dyn Fn() -> Writer + Send + Sync>;

pub struct TraceSink {
    open: Opener,
    writer: OnceLock<Mutex<Writer>>,
    verbose: bool,
}

impl TraceSink {
    fn with_opener(open: impl Fn() -> Writer + Send + Sync + 'static) -> Self {
        Self {
            open: Box::new(open),
            writer: OnceLock::new(),
            verbose: false,
        }
    }

    #[must_use]
    pub fn stdout() -> Self {
        Self::with_opener(|| Box::new(io::stdout()))
    }

    /// Append to `path`, falling back to stderr if it cannot be opened.
    #[must_use]
    pub fn file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self::with_opener(move || {
            match OpenOptions::new().create(true).append(true).open(&path) {
                Ok(file) => Box::new(file),
                Err(err) => {
                    tracing::warn!(path = %path.display(), %err, "cannot open trace file, using stderr");
                    Box::new(io::stderr())
                }
            }
        })
    }

    #[must_use]
    pub fn discard() -> Self {
        Self::with_opener(|| Box::new(io::sink()))
    }

    /// A sink writing into memory, plus a handle to read what was written.
    #[must_use]
    pub fn buffer() -> (Self, SharedBuffer) {
        let buffer = SharedBuffer::default();
        let handle = buffer.clone();
        (Self::with_opener(move || Box::new(buffer.clone())), handle)
    }

    /// Also echo statement labels and timings, not only progress lines.
    #[must_use]
    pub const fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    #[must_use]
    pub const fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// A percentage-complete line. Always written.
    pub fn progress(&self, line: &str) {
        tracing::debug!(line, "progress");
        self.write_line(line);
    }

    /// A short diagnostic marker, such as the `?` printed for statements that
    /// translate to nothing. Always written.
    pub fn marker(&self, marker: &str) {
        tracing::debug!(marker, "marker");
        self.write_line(marker);
    }

    /// A statement label or timing. Written only when verbose.
    pub fn note(&self, label: &str) {
        tracing::trace!(label, "note");
        if self.verbose {
            self.write_line(label);
        }
    }

    fn write_line(&self, line: &str) {
        let writer = self.writer.get_or_init(|| Mutex::new((self.open)()));
        let mut writer = writer.lock().unwrap_or_else(PoisonError::into_inner);
        let written = writer
            .write_all(line.as_bytes())
            .and_then(|()| writer.write_all(b"\n"))
            .and_then(|()| writer.flush());
        if let Err(err) = written {
            tracing::warn!(%err, "trace sink write failed");
        }
    }
}

impl Default for TraceSink {
    fn default() -> Self {
        Self::stdout()
    }
}

impl fmt::Debug for TraceSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraceSink")
            .field("opened", &self.writer.get().is_some())
            .field("verbose", &self.verbose)
            .finish_non_exhaustive()
    }
}

/// In-memory writer shared between a [`TraceSink`] and whoever inspects it.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    #[must_use]
    pub fn contents(&self) -> String {
        let bytes = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }

    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_owned).collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Rate limiter for progress lines.
///
/// The first call, and any call with index 0, only arms the timer. After
/// that a percentage is released once more than `interval` has passed since
/// the last release.
#[derive(Debug, Clone)]
pub struct ProgressThrottle {
    interval: Duration,
    last: Option<Instant>,
}

impl ProgressThrottle {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Percentage complete if a line is due at `now`.
    pub fn tick(&mut self, index: u64, total: u64, now: Instant) -> Option<u64> {
        match self.last {
            Some(last) if index != 0 => {
                if now.saturating_duration_since(last) > self.interval {
                    self.last = Some(now);
                    Some((index.saturating_mul(100)).checked_div(total).unwrap_or(100))
                } else {
                    None
                }
            }
            _ => {
                self.last = Some(now);
                None
            }
        }
    }
}

impl Default for ProgressThrottle {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INTERVAL)
    }
}
