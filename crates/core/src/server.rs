//! Managed server lifecycle for network-mode backends.
//!
//! Some backends are reached through a server that the harness has to launch
//! itself. The connection URL decides which [`ServerKind`] applies; the
//! [`Registry`](crate::registry::Registry) supplies a [`ServerLauncher`] for
//! each kind that was built in.

use std::time::Duration;

use derive_more::{Display, Error};

/// How long `start_server` blocks after a launch before handing control back.
///
/// There is no readiness probe; the first connection attempt after this delay
/// is expected to succeed on a local machine.
pub const SETTLE_DELAY: Duration = Duration::from_millis(100);

/// The network-mode backends the harness knows how to launch.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ServerKind {
    /// `h2:tcp:` URLs, served by a child process the harness owns.
    #[display("h2 tcp")]
    H2Tcp,
    /// `derby://` URLs, served by a network server with its own shutdown command.
    #[display("derby network")]
    DerbyNetwork,
    /// `hsqldb:hsql:` URLs. The listener can only go away together with its
    /// host process, so it is never stopped.
    #[display("hsqldb listener")]
    HsqldbListener,
}

impl ServerKind {
    pub const ALL: [Self; 3] = [Self::H2Tcp, Self::DerbyNetwork, Self::HsqldbListener];

    /// URL prefix (after an optional `jdbc:`) selecting this kind.
    #[must_use]
    pub const fn url_prefix(self) -> &'static str {
        match self {
            Self::H2Tcp => "h2:tcp:",
            Self::DerbyNetwork => "derby://",
            Self::HsqldbListener => "hsqldb:hsql:",
        }
    }

    /// Which managed server, if any, a connection URL needs.
    #[must_use]
    pub fn from_url(url: &str) -> Option<Self> {
        let rest = url.strip_prefix("jdbc:").unwrap_or(url);
        Self::ALL
            .into_iter()
            .find(|kind| rest.starts_with(kind.url_prefix()))
    }

    /// Whether a running server of this kind can be stopped independently of
    /// the process that hosts it.
    #[must_use]
    pub const fn can_stop(self) -> bool {
        !matches!(self, Self::HsqldbListener)
    }
}

/// Failure while launching or stopping a managed server.
#[derive(Debug, Display, Error)]
pub enum ServerError {
    #[display("no launcher registered for {_0} servers")]
    NoLauncher(#[error(not(source))] ServerKind),
    #[display("cannot launch {kind} server: {source}")]
    Launch {
        kind: ServerKind,
        source: std::io::Error,
    },
    #[display("cannot stop {kind} server: {source}")]
    Stop {
        kind: ServerKind,
        source: std::io::Error,
    },
}

/// Starts servers of one [`ServerKind`].
pub trait ServerLauncher: Send + Sync {
    fn kind(&self) -> ServerKind;

    /// Launch a server for `url` and return a handle that can stop it.
    ///
    /// # Errors
    ///
    /// Returns an error if the server process cannot be started.
    fn launch(&self, url: &str) -> Result<Box<dyn ManagedServer>, ServerError>;
}

/// A running server owned by a target.
pub trait ManagedServer: Send {
    fn kind(&self) -> ServerKind;

    /// # Errors
    ///
    /// Returns an error if the server does not shut down cleanly.
    fn stop(&mut self) -> Result<(), ServerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_url_recognizes_network_schemes() {
        assert_eq!(
            ServerKind::from_url("jdbc:h2:tcp://localhost/test"),
            Some(ServerKind::H2Tcp)
        );
        assert_eq!(
            ServerKind::from_url("jdbc:derby://localhost/test;create=true"),
            Some(ServerKind::DerbyNetwork)
        );
        assert_eq!(
            ServerKind::from_url("hsqldb:hsql://localhost/xdb"),
            Some(ServerKind::HsqldbListener)
        );
    }

    #[test]
    fn test_from_url_ignores_embedded_schemes() {
        assert_eq!(ServerKind::from_url("jdbc:h2:mem:test"), None);
        assert_eq!(ServerKind::from_url("jdbc:derby:data/test"), None);
        assert_eq!(ServerKind::from_url("jdbc:hsqldb:data/test"), None);
        assert_eq!(ServerKind::from_url("sqlite::memory:"), None);
    }

    #[test]
    fn test_only_hsqldb_cannot_stop() {
        assert!(ServerKind::H2Tcp.can_stop());
        assert!(ServerKind::DerbyNetwork.can_stop());
        assert!(!ServerKind::HsqldbListener.can_stop());
    }

    #[test]
    fn test_no_launcher_message() {
        let err = ServerError::NoLauncher(ServerKind::DerbyNetwork);
        assert_eq!(
            err.to_string(),
            "no launcher registered for derby network servers"
        );
    }
}
