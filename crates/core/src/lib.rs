//! Per-database core of a cross-database benchmark harness.
//!
//! `dbbench_core` represents one database under test as a
//! [`DatabaseTarget`], so that a single generic workload can run unmodified
//! against several backend products. A target hides four kinds of
//! heterogeneity behind one execution contract:
//!
//! 1. **Connections** -- a [`Driver`] from the [`Registry`] opens one
//!    [`Connection`] at a time, followed by an optional backend-specific
//!    tuning statement.
//! 2. **Servers** -- network-mode URLs (`h2:tcp:`, `derby://`,
//!    `hsqldb:hsql:`) get their server launched and stopped by the target
//!    through a registered [`ServerLauncher`].
//! 3. **Dialects** -- every statement is rewritten by an ordered list of
//!    substring rules loaded from a properties file (see [`dialect`]).
//! 4. **Measurements** -- executed statements, timed actions and arbitrary
//!    samples are recorded while the shared collect flag in the
//!    [`BenchContext`] is on.
//!
//! # Entry point
//!
//! ```rust,ignore
//! use dbbench_core::{BenchContext, DatabaseTarget};
//!
//! let context = BenchContext::default();
//! let mut db = DatabaseTarget::parse(&context, &registry, 0, "SQLite,sqlite,sqlite::memory:,sa")?;
//! db.set_translations(&properties);
//! db.start_server()?;
//! db.open_connection()?;
//! context.set_collect(true);
//! db.start("create");
//! db.update("CREATE TABLE TEST(ID INT)")?;
//! db.end();
//! db.close_connection()?;
//! db.stop_server()?;
//! ```
//!
//! Concrete drivers and server launchers live in the `dbbench_drivers` crate.
//!
//! # Crate features
//!
//! - **`serde`** -- enables `Serialize`/`Deserialize` derives on [`Sample`],
//!   [`MeasurementLog`], [`Properties`] and [`Value`].

pub mod backend;
pub mod config;
pub mod context;
pub mod dialect;
pub mod error;
pub mod measure;
pub mod prepared;
pub mod properties;
pub mod registry;
pub mod server;
pub mod target;
pub mod trace;
pub mod value;

pub use backend::{BackendError, Connection, Driver, ResultSet};
pub use config::TargetConfig;
pub use context::BenchContext;
pub use dialect::{Rule, Translator};
pub use error::{ConfigError, ConfigErrorKind, Error};
pub use measure::{MeasurementLog, Sample};
pub use prepared::Prepared;
pub use properties::Properties;
pub use registry::Registry;
pub use server::{ManagedServer, ServerError, ServerKind, ServerLauncher};
pub use target::{DatabaseTarget, Outcome};
pub use trace::{SharedBuffer, TraceSink};
pub use value::{Row, Value};
