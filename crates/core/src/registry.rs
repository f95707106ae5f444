use core::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::backend::Driver;
use crate::server::{ServerKind, ServerLauncher};

/// The backends compiled into this build.
///
/// Drivers are looked up by the identifier given in a configuration line; one
/// driver may be registered under several identifiers. Server launchers are
/// looked up by the [`ServerKind`] a URL selects.
#[derive(Clone, Default)]
pub struct Registry {
    drivers: IndexMap<String, Arc<dyn Driver>>,
    launchers: IndexMap<ServerKind, Arc<dyn ServerLauncher>>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `driver` under every identifier in `identifiers`.
    pub fn register_driver<I, S>(&mut self, identifiers: I, driver: Arc<dyn Driver>) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for identifier in identifiers {
            let identifier = identifier.into();
            tracing::debug!(%identifier, driver = driver.name(), "registering driver");
            self.drivers.insert(identifier, Arc::clone(&driver));
        }
        self
    }

    /// Register a launcher for the kind it reports, replacing any earlier one.
    pub fn register_launcher(&mut self, launcher: Arc<dyn ServerLauncher>) -> &mut Self {
        tracing::debug!(kind = %launcher.kind(), "registering server launcher");
        self.launchers.insert(launcher.kind(), launcher);
        self
    }

    #[must_use]
    pub fn driver(&self, identifier: &str) -> Option<Arc<dyn Driver>> {
        self.drivers.get(identifier).cloned()
    }

    #[must_use]
    pub fn launcher(&self, kind: ServerKind) -> Option<Arc<dyn ServerLauncher>> {
        self.launchers.get(&kind).cloned()
    }

    pub fn driver_identifiers(&self) -> impl Iterator<Item = &str> {
        self.drivers.keys().map(String::as_str)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("drivers", &self.drivers.keys().collect::<Vec<_>>())
            .field("launchers", &self.launchers.keys().collect::<Vec<_>>())
            .finish()
    }
}
