//! One database under test.

use std::borrow::Cow;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::backend::{Connection, Driver, ResultSet};
use crate::config::TargetConfig;
use crate::context::BenchContext;
use crate::dialect::{self, Translator};
use crate::error::{ConfigError, ConfigErrorKind, Error};
use crate::measure::{self, MeasurementLog, Sample, Stopwatch};
use crate::prepared::Prepared;
use crate::properties::Properties;
use crate::registry::Registry;
use crate::server::{ManagedServer, ServerError, ServerKind, ServerLauncher, SETTLE_DELAY};
use crate::trace::ProgressThrottle;

/// Seed of every target's random stream, so all backends see the same data.
pub const RANDOM_SEED: u64 = 1;

/// What [`DatabaseTarget::update`] did with a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Executed,
    /// The statement translated to whitespace and was not sent.
    Empty,
}

/// A configured backend: connection descriptor, dialect rules, an optional
/// managed server, at most one open connection, and the measurements taken
/// against it.
///
/// A target is driven from one thread at a time; the benchmark driver
/// serializes all calls against it. Different targets share nothing except
/// their [`BenchContext`], so one thread per target is fine.
pub struct DatabaseTarget {
    id: usize,
    name: String,
    url: String,
    user: String,
    password: String,
    driver: Arc<dyn Driver>,
    launcher: Option<Arc<dyn ServerLauncher>>,
    translator: Translator,
    context: BenchContext,
    server: Option<Box<dyn ManagedServer>>,
    connection: Option<Box<dyn Connection>>,
    session: u64,
    random: StdRng,
    executed_statements: u64,
    total_time: Duration,
    results: MeasurementLog,
    stopwatch: Option<Stopwatch>,
    progress: ProgressThrottle,
    trace: bool,
}

impl DatabaseTarget {
    /// Build a target from a configuration line.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] echoing `line` if it is malformed or names a
    /// driver that is not in `registry`. The caller is expected to report it
    /// and carry on with the remaining databases.
    pub fn parse(
        context: &BenchContext,
        registry: &Registry,
        id: usize,
        line: &str,
    ) -> Result<Self, ConfigError> {
        let config = TargetConfig::parse(line)?;
        Self::from_config(context, registry, id, config)
            .map_err(|err| ConfigError::new(line, err.kind))
    }

    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the driver is not in `registry`.
    pub fn from_config(
        context: &BenchContext,
        registry: &Registry,
        id: usize,
        config: TargetConfig,
    ) -> Result<Self, ConfigError> {
        let driver = registry.driver(&config.driver).ok_or_else(|| {
            ConfigError::new(
                config.to_string(),
                ConfigErrorKind::UnknownDriver(config.driver.clone()),
            )
        })?;
        let launcher = ServerKind::from_url(&config.url).and_then(|kind| registry.launcher(kind));
        tracing::debug!(
            id,
            db = %config.name,
            url = %config.url,
            driver = driver.name(),
            "configured database"
        );
        Ok(Self {
            id,
            name: config.name,
            url: config.url,
            user: config.user,
            password: config.password,
            driver,
            launcher,
            translator: Translator::new(),
            context: context.clone(),
            server: None,
            connection: None,
            session: 0,
            random: StdRng::seed_from_u64(RANDOM_SEED),
            executed_statements: 0,
            total_time: Duration::ZERO,
            results: MeasurementLog::default(),
            stopwatch: None,
            progress: ProgressThrottle::default(),
            trace: true,
        })
    }

    #[must_use]
    pub const fn id(&self) -> usize {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }

    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }

    #[must_use]
    pub fn dialect(&self) -> Option<&str> {
        dialect::dialect_id(&self.url)
    }

    #[must_use]
    pub const fn context(&self) -> &BenchContext {
        &self.context
    }

    /// Time accumulated by [`end`](Self::end) while collecting.
    #[must_use]
    pub const fn total_time(&self) -> Duration {
        self.total_time
    }

    #[must_use]
    pub const fn executed_statements(&self) -> u64 {
        self.executed_statements
    }

    #[must_use]
    pub const fn results(&self) -> &MeasurementLog {
        &self.results
    }

    /// The target's deterministic random stream, seeded with [`RANDOM_SEED`].
    pub fn random(&mut self) -> &mut StdRng {
        &mut self.random
    }

    #[must_use]
    pub const fn translator(&self) -> &Translator {
        &self.translator
    }

    /// Load the translation rules for this target's dialect.
    pub fn set_translations(&mut self, properties: &Properties) {
        if let Some(dialect) = dialect::dialect_id(&self.url) {
            self.translator.extend_from(dialect, properties);
        }
        tracing::debug!(db = %self.name, rules = self.translator.len(), "translations loaded");
    }

    /// The statement as it will be sent to this backend.
    #[must_use]
    pub fn translate<'a>(&self, sql: &'a str) -> Cow<'a, str> {
        self.translator.translate(sql)
    }

    /// Enable or disable progress lines from [`trace`](Self::trace).
    pub const fn set_trace(&mut self, trace: bool) {
        self.trace = trace;
    }

    // -- server lifecycle --------------------------------------------------

    /// Launch this backend's server if its URL is a network-mode one.
    ///
    /// Blocks for [`SETTLE_DELAY`] after a launch. Does nothing for embedded
    /// URLs or when a server is already held.
    ///
    /// # Errors
    ///
    /// Returns an error if no launcher is registered for the URL's server kind
    /// or the launch fails.
    pub fn start_server(&mut self) -> Result<(), ServerError> {
        let Some(kind) = ServerKind::from_url(&self.url) else {
            return Ok(());
        };
        if self.server.is_some() {
            tracing::debug!(db = %self.name, %kind, "server already started");
            return Ok(());
        }
        let launcher = self.launcher.as_ref().ok_or(ServerError::NoLauncher(kind))?;
        tracing::debug!(db = %self.name, %kind, "starting server");
        self.server = Some(launcher.launch(&self.url)?);
        thread::sleep(SETTLE_DELAY);
        Ok(())
    }

    /// Stop the server started by [`start_server`](Self::start_server).
    ///
    /// Safe to call when nothing was started. Servers whose kind cannot be
    /// stopped on their own are left running.
    ///
    /// # Errors
    ///
    /// Returns an error if the server does not shut down; the handle is kept
    /// so the call can be repeated.
    pub fn stop_server(&mut self) -> Result<(), ServerError> {
        let Some(server) = self.server.as_mut() else {
            return Ok(());
        };
        let kind = server.kind();
        if !kind.can_stop() {
            tracing::debug!(db = %self.name, %kind, "server cannot be stopped, leaving it running");
            return Ok(());
        }
        server.stop()?;
        tracing::debug!(db = %self.name, %kind, "server stopped");
        self.server = None;
        Ok(())
    }

    #[must_use]
    pub fn has_server(&self) -> bool {
        self.server.is_some()
    }

    // -- connection lifecycle ----------------------------------------------

    /// Open a connection the caller owns, tuned like the target's own.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connect`] if the backend refuses the connection.
    pub fn open_new_connection(&self) -> Result<Box<dyn Connection>, Error> {
        let mut connection = self
            .driver
            .connect(&self.url, &self.user, &self.password)
            .map_err(|source| Error::Connect {
                url: self.url.clone(),
                source,
            })?;
        if let Some(tuning) = self.dialect().and_then(dialect::tuning_statement) {
            if let Err(err) = connection.execute(tuning) {
                tracing::debug!(db = %self.name, tuning, %err, "post-connect tuning failed");
            }
        }
        Ok(connection)
    }

    /// Open the target's connection. Must not already be open.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connect`] if the backend refuses the connection.
    pub fn open_connection(&mut self) -> Result<(), Error> {
        if self.connection.is_some() {
            tracing::warn!(db = %self.name, "opening a connection while one is open");
        }
        let connection = self.open_new_connection()?;
        self.connection = Some(connection);
        self.session += 1;
        tracing::debug!(db = %self.name, session = self.session, "connection opened");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`Error::NotConnected`] if nothing is open, or
    /// [`Error::Disconnect`] if the backend reports a failure while closing.
    /// The connection is forgotten either way.
    pub fn close_connection(&mut self) -> Result<(), Error> {
        let connection = self.connection.take().ok_or(Error::NotConnected)?;
        tracing::debug!(db = %self.name, session = self.session, "closing connection");
        connection.close().map_err(Error::Disconnect)
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// The open connection, for operations the target does not wrap.
    pub fn connection(&mut self) -> Option<&mut (dyn Connection + 'static)> {
        self.connection.as_deref_mut()
    }

    fn open(&mut self) -> Result<&mut (dyn Connection + 'static), Error> {
        self.connection.as_deref_mut().ok_or(Error::NotConnected)
    }

    fn bound(&mut self, prepared: &Prepared) -> Result<&mut (dyn Connection + 'static), Error> {
        if self.connection.is_some() && prepared.session() != self.session {
            return Err(Error::StalePrepared {
                sql: prepared.sql().to_owned(),
            });
        }
        self.open()
    }

    fn count_statement(&mut self) {
        if self.context.collecting() {
            self.executed_statements += 1;
        }
    }

    // -- statements --------------------------------------------------------

    /// Translate `sql` and compile it on the open connection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConnected`] without a connection, or
    /// [`Error::Statement`] if the backend cannot compile it.
    pub fn prepare(&mut self, sql: &str) -> Result<Prepared, Error> {
        let sql = self.translator.translate(sql).into_owned();
        self.open()?
            .prepare(&sql)
            .map_err(|source| Error::Statement {
                sql: sql.clone(),
                source,
            })?;
        Ok(Prepared::new(sql, self.session))
    }

    /// Translate and execute a statement.
    ///
    /// A statement that translates to nothing but whitespace is not sent;
    /// a `?` marker goes to the trace sink instead.
    ///
    /// A statement that is sent counts while collecting even if the backend
    /// rejects it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Statement`] if the backend rejects it.
    pub fn update(&mut self, sql: &str) -> Result<Outcome, Error> {
        let sql = self.translator.translate(sql);
        if sql.trim().is_empty() {
            self.context.sink().marker("?");
            return Ok(Outcome::Empty);
        }
        if self.connection.is_none() {
            return Err(Error::NotConnected);
        }
        tracing::trace!(db = %self.name, %sql, "update");
        self.count_statement();
        self.open()?
            .execute(&sql)
            .map_err(|source| Error::Statement {
                sql: sql.to_string(),
                source,
            })?;
        Ok(Outcome::Executed)
    }

    /// Execute a prepared statement, forwarding `label` to the trace sink.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StalePrepared`] if `prepared` came from an earlier
    /// connection, or [`Error::Statement`] if execution fails.
    pub fn update_prepared(&mut self, prepared: &Prepared, label: &str) -> Result<usize, Error> {
        self.context.sink().note(label);
        let affected = self
            .bound(prepared)?
            .execute_prepared(prepared.sql(), prepared.params())
            .map_err(|source| Error::Statement {
                sql: prepared.sql().to_owned(),
                source,
            })?;
        self.count_statement();
        Ok(affected)
    }

    /// Run a prepared query and hand its rows to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StalePrepared`] or [`Error::Statement`].
    pub fn query(&mut self, prepared: &Prepared) -> Result<ResultSet, Error> {
        let rows = self
            .bound(prepared)?
            .query(prepared.sql(), prepared.params())
            .map_err(|source| Error::Statement {
                sql: prepared.sql().to_owned(),
                source,
            })?;
        self.count_statement();
        Ok(rows)
    }

    /// Run a prepared query and read every value of every row, keeping
    /// nothing. Used to time full result traversal; not counted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StalePrepared`] or [`Error::Statement`].
    pub fn query_read_result(&mut self, prepared: &Prepared) -> Result<(), Error> {
        self.bound(prepared)?
            .drain(prepared.sql(), prepared.params())
            .map_err(|source| Error::Statement {
                sql: prepared.sql().to_owned(),
                source,
            })
    }

    /// Drop a table that may not exist. Failures are ignored.
    pub fn drop_table(&mut self, table: &str) {
        if let Err(err) = self.update(&format!("DROP TABLE {table}")) {
            tracing::trace!(db = %self.name, table, %err, "drop table ignored");
        }
    }

    /// # Errors
    ///
    /// Returns [`Error::Transaction`] if the backend refuses.
    pub fn set_auto_commit(&mut self, auto_commit: bool) -> Result<(), Error> {
        self.open()?
            .set_auto_commit(auto_commit)
            .map_err(Error::Transaction)
    }

    /// # Errors
    ///
    /// Returns [`Error::Transaction`] if the commit fails.
    pub fn commit(&mut self) -> Result<(), Error> {
        self.open()?.commit().map_err(Error::Transaction)
    }

    /// # Errors
    ///
    /// Returns [`Error::Transaction`] if the rollback fails.
    pub fn rollback(&mut self) -> Result<(), Error> {
        self.open()?.rollback().map_err(Error::Transaction)
    }

    // -- measurements ------------------------------------------------------

    /// Begin timing `action`. A second `start` replaces the pending one.
    pub fn start(&mut self, action: impl Into<String>) {
        self.stopwatch = Some(Stopwatch::start(action.into()));
    }

    /// Finish the action begun by [`start`](Self::start): log its duration in
    /// milliseconds and, while collecting, add it to the total time.
    pub fn end(&mut self) {
        let Some(stopwatch) = self.stopwatch.take() else {
            tracing::warn!(db = %self.name, "end() without start()");
            return;
        };
        let elapsed = stopwatch.started.elapsed();
        let ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        tracing::debug!(db = %self.name, action = %stopwatch.action, ms, "timed action");
        let sink = self.context.sink();
        if sink.is_verbose() {
            sink.note(&format!("{}: {ms} ms", stopwatch.action));
        }
        self.log(&stopwatch.action, "ms", ms);
        if self.context.collecting() {
            self.total_time += elapsed;
        }
    }

    /// Record a sample while collecting.
    pub fn log(&mut self, action: &str, unit: &str, value: u64) {
        if self.context.collecting() {
            self.results.push(Sample::new(action, unit, value));
        }
    }

    /// Record the process's resident memory in MB while collecting.
    pub fn log_memory(&mut self, action: &str) {
        match measure::resident_memory_mb() {
            Some(mb) => self.log(action, "MB", mb),
            None => tracing::debug!(action, "resident memory not available"),
        }
    }

    /// Print how far `action` has come, at most once a second.
    pub fn trace(&mut self, action: &str, index: u64, total: u64) {
        if !self.trace {
            return;
        }
        if let Some(percent) = self.progress.tick(index, total, Instant::now()) {
            self.context.sink().progress(&format!("{action}: {percent}%"));
        }
    }
}

impl core::fmt::Debug for DatabaseTarget {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DatabaseTarget")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("url", &self.url)
            .field("user", &self.user)
            .field("driver", &self.driver.name())
            .field("rules", &self.translator.len())
            .field("connected", &self.connection.is_some())
            .field("server", &self.server.as_ref().map(|server| server.kind()))
            .field("executed_statements", &self.executed_statements)
            .finish_non_exhaustive()
    }
}
