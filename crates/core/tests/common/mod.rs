//! Fake backend shared by the integration tests.
//!
//! `RecordingDriver` hands out connections that append every call to a
//! shared journal and fail any statement containing one of the configured
//! fragments. `CountingLauncher` launches pretend servers and counts starts
//! and stops.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use dbbench_core::{
    BackendError, BenchContext, Connection, DatabaseTarget, Driver, ManagedServer, Registry,
    ResultSet, ServerError, ServerKind, ServerLauncher, SharedBuffer, TraceSink, Value,
};

pub const DRIVER: &str = "org.example.RecordingDriver";

#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn push(&self, entry: impl Into<String>) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordingDriver {
    pub journal: Journal,
    pub fail_on: Vec<String>,
    pub refuse: bool,
}

impl RecordingDriver {
    pub fn failing_on(fragments: &[&str]) -> Self {
        Self {
            fail_on: fragments.iter().map(|f| (*f).to_owned()).collect(),
            ..Self::default()
        }
    }
}

impl Driver for RecordingDriver {
    fn name(&self) -> &str {
        "recording"
    }

    fn connect(
        &self,
        url: &str,
        user: &str,
        _password: &str,
    ) -> Result<Box<dyn Connection>, BackendError> {
        if self.refuse {
            return Err(BackendError::new(format!("connection refused: {url}")));
        }
        self.journal.push(format!("connect {url} as {user}"));
        Ok(Box::new(RecordingConnection {
            journal: self.journal.clone(),
            fail_on: self.fail_on.clone(),
        }))
    }
}

pub struct RecordingConnection {
    journal: Journal,
    fail_on: Vec<String>,
}

impl RecordingConnection {
    fn record(&self, verb: &str, sql: &str) -> Result<(), BackendError> {
        self.journal.push(format!("{verb} {sql}"));
        match self.fail_on.iter().find(|fragment| sql.contains(fragment.as_str())) {
            Some(fragment) => Err(BackendError::new(format!("rejected: {fragment}"))),
            None => Ok(()),
        }
    }
}

impl Connection for RecordingConnection {
    fn execute(&mut self, sql: &str) -> Result<(), BackendError> {
        self.record("execute", sql)
    }

    fn prepare(&mut self, sql: &str) -> Result<(), BackendError> {
        self.record("prepare", sql)
    }

    fn execute_prepared(&mut self, sql: &str, params: &[Value]) -> Result<usize, BackendError> {
        self.record("execute_prepared", sql)?;
        Ok(params.len())
    }

    fn query(&mut self, sql: &str, _params: &[Value]) -> Result<ResultSet, BackendError> {
        self.record("query", sql)?;
        Ok(ResultSet::new(
            vec!["ID".into()],
            vec![vec![Value::Integer(1)], vec![Value::Integer(2)]],
        ))
    }

    fn drain(&mut self, sql: &str, _params: &[Value]) -> Result<(), BackendError> {
        self.record("drain", sql)
    }

    fn set_auto_commit(&mut self, auto_commit: bool) -> Result<(), BackendError> {
        self.journal.push(format!("auto_commit {auto_commit}"));
        Ok(())
    }

    fn commit(&mut self) -> Result<(), BackendError> {
        self.journal.push("commit");
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), BackendError> {
        self.journal.push("rollback");
        Ok(())
    }

    fn close(self: Box<Self>) -> Result<(), BackendError> {
        self.journal.push("close");
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct Counters {
    pub launched: AtomicUsize,
    pub stopped: AtomicUsize,
}

impl Counters {
    pub fn launched(&self) -> usize {
        self.launched.load(Ordering::SeqCst)
    }

    pub fn stopped(&self) -> usize {
        self.stopped.load(Ordering::SeqCst)
    }
}

pub struct CountingLauncher {
    pub kind: ServerKind,
    pub counters: Arc<Counters>,
}

impl ServerLauncher for CountingLauncher {
    fn kind(&self) -> ServerKind {
        self.kind
    }

    fn launch(&self, _url: &str) -> Result<Box<dyn ManagedServer>, ServerError> {
        self.counters.launched.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(CountingServer {
            kind: self.kind,
            counters: Arc::clone(&self.counters),
        }))
    }
}

struct CountingServer {
    kind: ServerKind,
    counters: Arc<Counters>,
}

impl ManagedServer for CountingServer {
    fn kind(&self) -> ServerKind {
        self.kind
    }

    fn stop(&mut self) -> Result<(), ServerError> {
        self.counters.stopped.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Registry with `driver` under [`DRIVER`] and a counting launcher for every
/// server kind.
pub fn registry(driver: RecordingDriver) -> (Registry, Arc<Counters>) {
    let counters = Arc::new(Counters::default());
    let mut registry = Registry::new();
    registry.register_driver([DRIVER], Arc::new(driver));
    for kind in ServerKind::ALL {
        registry.register_launcher(Arc::new(CountingLauncher {
            kind,
            counters: Arc::clone(&counters),
        }));
    }
    (registry, counters)
}

/// Context writing its trace into a buffer.
pub fn context(verbose: bool) -> (BenchContext, SharedBuffer) {
    let (sink, buffer) = TraceSink::buffer();
    (BenchContext::new(Arc::new(sink.verbose(verbose))), buffer)
}

/// A target on `url` backed by `driver`.
pub fn target(context: &BenchContext, driver: RecordingDriver, url: &str) -> DatabaseTarget {
    let (registry, _) = registry(driver);
    DatabaseTarget::parse(context, &registry, 0, &format!("Fake,{DRIVER},{url},sa,"))
        .expect("config line should parse")
}
