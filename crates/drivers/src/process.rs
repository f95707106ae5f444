//! Server launchers that run each network-mode backend as a child process.
//!
//! The default commands expect `java` on the `PATH` and the backend jars on
//! the `CLASSPATH`. Use [`ProcessLauncher::new`] with a custom
//! [`ServerCommand`] to run something else.

use std::path::PathBuf;
use std::process::{Child, Command, Stdio};

use dbbench_core::{ManagedServer, ServerError, ServerKind, ServerLauncher};
use typed_builder::TypedBuilder;

/// A program invocation used to start or shut down a server.
#[derive(Clone, Debug, PartialEq, Eq, TypedBuilder)]
pub struct ServerCommand {
    #[builder(setter(into))]
    pub program: String,
    #[builder(default, setter(transform = |args: &[&str]| args.iter().map(|a| (*a).to_owned()).collect()))]
    pub args: Vec<String>,
    #[builder(default, setter(strip_option, into))]
    pub current_dir: Option<PathBuf>,
}

impl ServerCommand {
    fn java(class: &str, args: &[&str]) -> Self {
        let mut all = vec![class];
        all.extend_from_slice(args);
        Self::builder().program("java").args(&all).build()
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }
        command
    }
}

/// Launches one [`ServerKind`] as a child process.
///
/// If a shutdown command is set, stopping runs it and then waits for the
/// server process to exit; otherwise the server process is killed.
#[derive(Clone, Debug)]
pub struct ProcessLauncher {
    kind: ServerKind,
    start: ServerCommand,
    shutdown: Option<ServerCommand>,
}

impl ProcessLauncher {
    #[must_use]
    pub const fn new(kind: ServerKind, start: ServerCommand, shutdown: Option<ServerCommand>) -> Self {
        Self {
            kind,
            start,
            shutdown,
        }
    }

    /// H2 TCP server; stopped by killing it.
    #[must_use]
    pub fn h2() -> Self {
        Self::new(
            ServerKind::H2Tcp,
            ServerCommand::java("org.h2.tools.Server", &["-tcp"]),
            None,
        )
    }

    /// Derby network server; stopped through its own shutdown command.
    #[must_use]
    pub fn derby() -> Self {
        let control = "org.apache.derby.drda.NetworkServerControl";
        Self::new(
            ServerKind::DerbyNetwork,
            ServerCommand::java(control, &["start"]),
            Some(ServerCommand::java(control, &["shutdown"])),
        )
    }

    /// HSQLDB listener serving `data/mydb` as `xdb` with cached tables.
    #[must_use]
    pub fn hsqldb() -> Self {
        Self::new(
            ServerKind::HsqldbListener,
            ServerCommand::java(
                "org.hsqldb.Server",
                &[
                    "-database.0",
                    "data/mydb;hsqldb.default_table_type=cached",
                    "-dbname.0",
                    "xdb",
                ],
            ),
            None,
        )
    }

    /// One launcher per known server kind.
    #[must_use]
    pub fn defaults() -> [Self; 3] {
        [Self::h2(), Self::derby(), Self::hsqldb()]
    }

    #[must_use]
    pub const fn start_command(&self) -> &ServerCommand {
        &self.start
    }
}

impl ServerLauncher for ProcessLauncher {
    fn kind(&self) -> ServerKind {
        self.kind
    }

    fn launch(&self, url: &str) -> Result<Box<dyn ManagedServer>, ServerError> {
        let kind = self.kind;
        tracing::debug!(%kind, url, program = %self.start.program, "spawning server");
        let child = self
            .start
            .command()
            .spawn()
            .map_err(|source| ServerError::Launch { kind, source })?;
        tracing::debug!(%kind, pid = child.id(), "server spawned");
        Ok(Box::new(ProcessServer {
            kind,
            child: Some(child),
            shutdown: self.shutdown.clone(),
        }))
    }
}

/// A server process started by a [`ProcessLauncher`].
#[derive(Debug)]
pub struct ProcessServer {
    kind: ServerKind,
    child: Option<Child>,
    shutdown: Option<ServerCommand>,
}

impl ProcessServer {
    fn terminate(kind: ServerKind, child: &mut Child) -> Result<(), ServerError> {
        match child.kill() {
            Ok(()) => {}
            // Already exited.
            Err(err) if err.kind() == std::io::ErrorKind::InvalidInput => {}
            Err(source) => return Err(ServerError::Stop { kind, source }),
        }
        Ok(())
    }
}

impl ManagedServer for ProcessServer {
    fn kind(&self) -> ServerKind {
        self.kind
    }

    fn stop(&mut self) -> Result<(), ServerError> {
        let kind = self.kind;
        let Some(child) = self.child.as_mut() else {
            return Ok(());
        };
        match &self.shutdown {
            Some(shutdown) => {
                let status = shutdown
                    .command()
                    .status()
                    .map_err(|source| ServerError::Stop { kind, source })?;
                if !status.success() {
                    tracing::warn!(%kind, %status, "shutdown command failed, killing server");
                    Self::terminate(kind, child)?;
                }
            }
            None => Self::terminate(kind, child)?,
        }
        let status = child
            .wait()
            .map_err(|source| ServerError::Stop { kind, source })?;
        tracing::debug!(%kind, %status, "server exited");
        self.child = None;
        Ok(())
    }
}

impl Drop for ProcessServer {
    fn drop(&mut self) {
        if !self.kind.can_stop() {
            return;
        }
        if let Some(child) = self.child.as_mut() {
            if Self::terminate(self.kind, child).is_ok() {
                let _ = child.wait();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_launchers_cover_every_kind() {
        let kinds: Vec<ServerKind> = ProcessLauncher::defaults()
            .iter()
            .map(ServerLauncher::kind)
            .collect();
        assert_eq!(kinds, ServerKind::ALL);
    }

    #[test]
    fn test_hsqldb_command() {
        let launcher = ProcessLauncher::hsqldb();
        let start = launcher.start_command();
        assert_eq!(start.program, "java");
        assert_eq!(
            start.args,
            [
                "org.hsqldb.Server",
                "-database.0",
                "data/mydb;hsqldb.default_table_type=cached",
                "-dbname.0",
                "xdb",
            ]
        );
    }

    #[test]
    fn test_builder_defaults() {
        let command = ServerCommand::builder().program("server").build();
        assert!(command.args.is_empty());
        assert!(command.current_dir.is_none());
    }
}
