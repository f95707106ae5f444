//! dbbench CLI -- run one SQL script against several databases and compare.

use std::path::PathBuf;

use chrono::{DateTime, Local};
use clap::{Parser, Subcommand};
use dbbench_core::{DatabaseTarget, Error, MeasurementLog, Registry};
use serde::Serialize;

#[derive(Debug, Parser)]
#[command(
    name = "dbbench",
    about = "Cross-database benchmark harness"
)]
pub struct App {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Parse a config-list file and report which databases resolve
    Check(CheckArgs),
    /// Print a statement as it would be sent to the database at a URL
    Translate(TranslateArgs),
    /// Run a SQL script against every configured database
    Exec(ExecArgs),
}

#[derive(Debug, Parser)]
pub struct CheckArgs {
    /// Config-list file: `name, driver, url, user[, password]` per line
    #[arg(long)]
    pub config: PathBuf,
}

#[derive(Debug, Parser)]
pub struct TranslateArgs {
    /// Dialect translation properties file
    #[arg(long)]
    pub properties: PathBuf,
    /// Connection URL selecting the dialect
    #[arg(long)]
    pub url: String,
    /// Statement to translate
    pub sql: String,
}

#[derive(Debug, Parser)]
pub struct ExecArgs {
    /// Config-list file: `name, driver, url, user[, password]` per line
    #[arg(long)]
    pub config: PathBuf,
    /// SQL script; statements are separated by `;`
    #[arg(long)]
    pub script: PathBuf,
    /// Dialect translation properties file
    #[arg(long)]
    pub properties: Option<PathBuf>,
    /// Record measurements (otherwise the script runs as a warm-up only)
    #[arg(long)]
    pub collect: bool,
    /// Output results as JSON (one object per database)
    #[arg(long)]
    pub json: bool,
    /// Also print every timed action as it finishes
    #[arg(long)]
    pub verbose: bool,
    /// Write progress lines to this file instead of stdout
    #[arg(long)]
    pub trace_file: Option<PathBuf>,
}

/// What `exec` reports for one database.
#[derive(Debug, Serialize)]
pub struct TargetReport {
    pub id: usize,
    pub name: String,
    pub url: String,
    pub started: DateTime<Local>,
    pub finished: DateTime<Local>,
    pub collected: bool,
    pub executed_statements: u64,
    pub total_ms: u64,
    pub samples: MeasurementLog,
    pub error: Option<String>,
}

impl TargetReport {
    /// Summarize `db` after a run that started at `started`.
    #[must_use]
    pub fn new(db: &DatabaseTarget, started: DateTime<Local>, outcome: Result<(), Error>) -> Self {
        Self {
            id: db.id(),
            name: db.name().to_owned(),
            url: db.url().to_owned(),
            started,
            finished: Local::now(),
            collected: db.context().collecting(),
            executed_statements: db.executed_statements(),
            total_ms: u64::try_from(db.total_time().as_millis()).unwrap_or(u64::MAX),
            samples: db.results().clone(),
            error: outcome.err().map(|err| err.to_string()),
        }
    }
}

/// The driver identifiers `registry` accepts, comma separated.
#[must_use]
pub fn known_drivers(registry: &Registry) -> String {
    registry.driver_identifiers().collect::<Vec<_>>().join(", ")
}

/// Run every statement of a script as its own timed action, inside one
/// server and connection lifecycle.
///
/// The server is stopped even if a statement fails.
///
/// # Errors
///
/// Returns the first failure; later statements are not run.
pub fn run_script(db: &mut DatabaseTarget, statements: &[String]) -> Result<(), Error> {
    db.start_server()?;
    let result = run_connected(db, statements);
    let stopped = db.stop_server().map_err(Error::from);
    result.and(stopped)
}

fn run_connected(db: &mut DatabaseTarget, statements: &[String]) -> Result<(), Error> {
    db.open_connection()?;
    let total = u64::try_from(statements.len()).unwrap_or(u64::MAX);
    let mut result = Ok(());
    for (index, sql) in (0..).zip(statements) {
        db.trace("script", index, total);
        db.start(sql.as_str());
        if let Err(err) = db.update(sql) {
            result = Err(err);
            break;
        }
        db.end();
    }
    let closed = db.close_connection();
    result.and(closed)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use clap::CommandFactory;
    use dbbench_core::{BenchContext, TraceSink};

    use super::*;

    #[test]
    fn test_cli_definition() {
        App::command().debug_assert();
    }

    #[test]
    fn test_exec_flags() {
        let app = App::parse_from([
            "dbbench", "exec", "--config", "dbs.txt", "--script", "bench.sql", "--collect",
            "--json",
        ]);
        let Command::Exec(args) = app.command else {
            panic!("expected exec");
        };
        assert!(args.collect && args.json && !args.verbose);
        assert!(args.properties.is_none());
    }

    #[test]
    fn test_known_drivers_lists_registration_order() {
        let registry = dbbench_drivers::default_registry();
        let known = known_drivers(&registry);
        assert!(known.starts_with("sqlite, org.sqlite.JDBC"), "{known}");
        assert_eq!(known_drivers(&Registry::new()), "");
    }

    fn sqlite_target(context: &BenchContext) -> DatabaseTarget {
        let registry = dbbench_drivers::default_registry();
        DatabaseTarget::parse(context, &registry, 3, "SQLite,sqlite,sqlite::memory:,sa").unwrap()
    }

    #[test]
    fn test_run_script_times_each_statement() {
        let context = BenchContext::new(Arc::new(TraceSink::discard()));
        context.set_collect(true);
        let mut db = sqlite_target(&context);
        let statements = dbbench_parser::parse_script(
            "CREATE TABLE T(ID INT); INSERT INTO T VALUES(1); UPDATE T SET ID = 2;",
        )
        .unwrap();
        let started = Local::now();
        let outcome = run_script(&mut db, &statements);
        assert!(outcome.is_ok());
        assert!(!db.is_connected());

        let report = TargetReport::new(&db, started, outcome);
        assert_eq!(report.id, 3);
        assert!(report.collected);
        assert_eq!(report.executed_statements, 3);
        assert_eq!(report.samples.len(), 3);
        assert!(report.error.is_none());
        assert!(report.finished >= report.started);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["name"], "SQLite");
        assert_eq!(json["collected"], true);
        assert_eq!(json["samples"][1]["action"], "INSERT INTO T VALUES(1)");
    }

    #[test]
    fn test_run_script_stops_at_first_failure() {
        let context = BenchContext::new(Arc::new(TraceSink::discard()));
        context.set_collect(true);
        let mut db = sqlite_target(&context);
        let statements = vec![
            "CREATE TABLE A(ID INT)".to_owned(),
            "NOT SQL".to_owned(),
            "CREATE TABLE B(ID INT)".to_owned(),
        ];
        let outcome = run_script(&mut db, &statements);
        let report = TargetReport::new(&db, Local::now(), outcome);
        assert_eq!(report.executed_statements, 2);
        assert!(report.error.unwrap().contains("NOT SQL"));
        assert!(!db.is_connected());
    }
}
