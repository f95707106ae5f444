//! Process launchers driven with ordinary Unix commands.
#![cfg(unix)]

use std::time::{Duration, Instant};

use dbbench_core::{ManagedServer, ServerError, ServerKind, ServerLauncher};
use dbbench_drivers::{ProcessLauncher, ServerCommand};

fn command(program: &str, args: &[&str]) -> ServerCommand {
    ServerCommand::builder().program(program).args(args).build()
}

#[test]
fn killed_server_stops_promptly() {
    let launcher = ProcessLauncher::new(ServerKind::H2Tcp, command("sleep", &["30"]), None);
    let mut server = launcher.launch("jdbc:h2:tcp://localhost/test").unwrap();
    let started = Instant::now();
    server.stop().unwrap();
    assert!(started.elapsed() < Duration::from_secs(10));
    server.stop().unwrap();
}

#[test]
fn shutdown_command_runs_before_reaping() {
    let launcher = ProcessLauncher::new(
        ServerKind::DerbyNetwork,
        command("sleep", &["0.2"]),
        Some(command("true", &[])),
    );
    let mut server = launcher.launch("jdbc:derby://localhost/test").unwrap();
    assert_eq!(server.kind(), ServerKind::DerbyNetwork);
    server.stop().unwrap();
}

#[test]
fn failed_shutdown_falls_back_to_kill() {
    let launcher = ProcessLauncher::new(
        ServerKind::DerbyNetwork,
        command("sleep", &["30"]),
        Some(command("false", &[])),
    );
    let mut server = launcher.launch("jdbc:derby://localhost/test").unwrap();
    let started = Instant::now();
    server.stop().unwrap();
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[test]
fn missing_program_is_a_launch_error() {
    let launcher = ProcessLauncher::new(
        ServerKind::H2Tcp,
        command("/nonexistent/dbbench-server", &[]),
        None,
    );
    let err = launcher
        .launch("jdbc:h2:tcp://localhost/test")
        .err()
        .expect("launch should fail");
    assert!(matches!(err, ServerError::Launch { kind: ServerKind::H2Tcp, .. }));
}
