//! Backends and server launchers for `dbbench` targets.
//!
//! [`default_registry`] returns a [`Registry`] with every driver compiled
//! into this build and a [`ProcessLauncher`] for each network-mode server
//! kind.
//!
//! # Crate features
//!
//! - **`sqlite`** (default) -- the embedded SQLite driver, registered as
//!   `sqlite` and `org.sqlite.JDBC`.

use std::sync::Arc;

use dbbench_core::Registry;

pub mod process;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use process::{ProcessLauncher, ProcessServer, ServerCommand};

/// Add the built-in drivers and launchers to `registry`.
pub fn register_defaults(registry: &mut Registry) -> &mut Registry {
    #[cfg(feature = "sqlite")]
    registry.register_driver(sqlite::IDENTIFIERS, Arc::new(sqlite::SqliteDriver));
    for launcher in ProcessLauncher::defaults() {
        registry.register_launcher(Arc::new(launcher));
    }
    registry
}

#[must_use]
pub fn default_registry() -> Registry {
    let mut registry = Registry::new();
    register_defaults(&mut registry);
    registry
}
