//! Embedded SQLite backend via `rusqlite`.
//!
//! Accepts `sqlite:<path>` URLs, with or without a `jdbc:` prefix.
//! `sqlite::memory:` (or an empty path) opens a private in-memory database.

use dbbench_core::{BackendError, Connection, Driver, ResultSet, Row, Value};
use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{params_from_iter, ToSql};

/// Identifiers the SQLite driver answers to in configuration lines.
pub const IDENTIFIERS: [&str; 2] = ["sqlite", "org.sqlite.JDBC"];

#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDriver;

/// Where a `sqlite:` URL points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Location<'a> {
    Memory,
    File(&'a str),
}

fn location(url: &str) -> Option<Location<'_>> {
    let path = url
        .strip_prefix("jdbc:")
        .unwrap_or(url)
        .strip_prefix("sqlite:")?;
    match path {
        "" | ":memory:" => Some(Location::Memory),
        path if path.starts_with("mem:") => Some(Location::Memory),
        path => Some(Location::File(path)),
    }
}

impl Driver for SqliteDriver {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn connect(
        &self,
        url: &str,
        _user: &str,
        _password: &str,
    ) -> Result<Box<dyn Connection>, BackendError> {
        let raw = match location(url) {
            Some(Location::Memory) => rusqlite::Connection::open_in_memory(),
            Some(Location::File(path)) => rusqlite::Connection::open(path),
            None => return Err(BackendError::new(format!("not a sqlite url: {url}"))),
        }
        .map_err(BackendError::wrap)?;
        tracing::debug!(url, "sqlite connection opened");
        Ok(Box::new(SqliteConnection {
            raw,
            auto_commit: true,
        }))
    }
}

/// A `rusqlite` connection with JDBC-style auto-commit switching.
///
/// With auto-commit off an explicit transaction is always open; `commit` and
/// `rollback` end it and begin the next one.
pub struct SqliteConnection {
    raw: rusqlite::Connection,
    auto_commit: bool,
}

struct Param<'a>(&'a Value);

impl ToSql for Param<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self.0 {
            Value::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            Value::Integer(i) => ToSqlOutput::Borrowed(ValueRef::Integer(*i)),
            Value::Real(r) => ToSqlOutput::Borrowed(ValueRef::Real(*r)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
        })
    }
}

fn value(raw: ValueRef<'_>) -> Value {
    match raw {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(r) => Value::Real(r),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    }
}

impl SqliteConnection {
    fn batch(&self, sql: &str) -> Result<(), BackendError> {
        self.raw.execute_batch(sql).map_err(BackendError::wrap)
    }
}

impl Connection for SqliteConnection {
    fn execute(&mut self, sql: &str) -> Result<(), BackendError> {
        self.batch(sql)
    }

    fn prepare(&mut self, sql: &str) -> Result<(), BackendError> {
        self.raw
            .prepare_cached(sql)
            .map(drop)
            .map_err(BackendError::wrap)
    }

    fn execute_prepared(&mut self, sql: &str, params: &[Value]) -> Result<usize, BackendError> {
        let mut statement = self.raw.prepare_cached(sql).map_err(BackendError::wrap)?;
        statement
            .execute(params_from_iter(params.iter().map(Param)))
            .map_err(BackendError::wrap)
    }

    fn query(&mut self, sql: &str, params: &[Value]) -> Result<ResultSet, BackendError> {
        let mut statement = self.raw.prepare_cached(sql).map_err(BackendError::wrap)?;
        let columns: Vec<String> = statement
            .column_names()
            .into_iter()
            .map(str::to_owned)
            .collect();
        let width = columns.len();
        let mut rows = statement
            .query(params_from_iter(params.iter().map(Param)))
            .map_err(BackendError::wrap)?;
        let mut collected = Vec::new();
        while let Some(row) = rows.next().map_err(BackendError::wrap)? {
            let values = (0..width)
                .map(|i| row.get_ref(i).map(value))
                .collect::<Result<Row, _>>()
                .map_err(BackendError::wrap)?;
            collected.push(values);
        }
        Ok(ResultSet::new(columns, collected))
    }

    fn drain(&mut self, sql: &str, params: &[Value]) -> Result<(), BackendError> {
        let mut statement = self.raw.prepare_cached(sql).map_err(BackendError::wrap)?;
        let width = statement.column_count();
        let mut rows = statement
            .query(params_from_iter(params.iter().map(Param)))
            .map_err(BackendError::wrap)?;
        while let Some(row) = rows.next().map_err(BackendError::wrap)? {
            for i in 0..width {
                std::hint::black_box(row.get_ref(i).map_err(BackendError::wrap)?);
            }
        }
        Ok(())
    }

    fn set_auto_commit(&mut self, auto_commit: bool) -> Result<(), BackendError> {
        match (self.auto_commit, auto_commit) {
            (true, false) => self.batch("BEGIN")?,
            (false, true) => self.batch("COMMIT")?,
            _ => {}
        }
        self.auto_commit = auto_commit;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), BackendError> {
        if self.auto_commit {
            return Ok(());
        }
        self.batch("COMMIT; BEGIN")
    }

    fn rollback(&mut self) -> Result<(), BackendError> {
        if self.auto_commit {
            return Ok(());
        }
        self.batch("ROLLBACK; BEGIN")
    }

    fn close(self: Box<Self>) -> Result<(), BackendError> {
        let this = *self;
        this.raw.close().map_err(|(_, err)| BackendError::wrap(err))
    }
}
