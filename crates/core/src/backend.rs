//! The seam between a [`DatabaseTarget`](crate::target::DatabaseTarget) and a
//! concrete database product.
//!
//! A [`Driver`] knows how to open a [`Connection`] from a URL and credentials.
//! Everything the harness does on a connection goes through the object-safe
//! [`Connection`] trait, so the same benchmark code runs against any backend
//! the registry knows about.

use core::fmt;
use std::error::Error as StdError;

use crate::value::{Row, Value};

/// Error reported by a backend driver.
///
/// Wraps the driver's own error type as the `source` so callers can still
/// downcast to it when they need backend-specific detail.
#[derive(Debug)]
pub struct BackendError {
    message: String,
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl BackendError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap a driver error, keeping it as the source.
    #[must_use]
    pub fn wrap<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for BackendError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|err| err as &(dyn StdError + 'static))
    }
}

/// Opens connections to one database product.
pub trait Driver: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Open a new connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not understood by this driver or the
    /// database refuses the connection.
    fn connect(
        &self,
        url: &str,
        user: &str,
        password: &str,
    ) -> Result<Box<dyn Connection>, BackendError>;
}

/// One open session with a backend.
///
/// Statements arrive already translated into the backend's dialect. Prepared
/// statements are identified by their SQL text; implementations are expected
/// to keep a per-connection cache so repeated executions reuse the compiled
/// statement.
pub trait Connection: Send {
    /// Execute a statement, discarding any rows it produces.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the statement.
    fn execute(&mut self, sql: &str) -> Result<(), BackendError>;

    /// Compile `sql` and keep it ready for later executions.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement cannot be compiled.
    fn prepare(&mut self, sql: &str) -> Result<(), BackendError>;

    /// Execute a prepared data-modifying statement with bound parameters and
    /// return the number of affected rows.
    ///
    /// # Errors
    ///
    /// Returns an error if execution fails.
    fn execute_prepared(&mut self, sql: &str, params: &[Value]) -> Result<usize, BackendError>;

    /// Execute a prepared query and hand back its rows.
    ///
    /// # Errors
    ///
    /// Returns an error if execution fails.
    fn query(&mut self, sql: &str, params: &[Value]) -> Result<ResultSet, BackendError>;

    /// Execute a prepared query and read every column of every row without
    /// keeping anything.
    ///
    /// # Errors
    ///
    /// Returns an error if execution or row traversal fails.
    fn drain(&mut self, sql: &str, params: &[Value]) -> Result<(), BackendError>;

    /// # Errors
    ///
    /// Returns an error if the backend cannot switch transaction mode.
    fn set_auto_commit(&mut self, auto_commit: bool) -> Result<(), BackendError>;

    /// # Errors
    ///
    /// Returns an error if the commit fails.
    fn commit(&mut self) -> Result<(), BackendError>;

    /// # Errors
    ///
    /// Returns an error if the rollback fails.
    fn rollback(&mut self) -> Result<(), BackendError>;

    /// Close the connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend reports a failure while closing.
    fn close(self: Box<Self>) -> Result<(), BackendError>;
}

/// Rows returned by [`Connection::query`], consumed by iterating.
#[derive(Debug, Clone)]
pub struct ResultSet {
    columns: Vec<String>,
    rows: std::vec::IntoIter<Row>,
}

impl ResultSet {
    #[must_use]
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self {
            columns,
            rows: rows.into_iter(),
        }
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Number of rows not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.rows.len()
    }
}

impl Iterator for ResultSet {
    type Item = Row;

    fn next(&mut self) -> Option<Self::Item> {
        self.rows.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

impl ExactSizeIterator for ResultSet {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_set_is_a_cursor() {
        let mut rs = ResultSet::new(
            vec!["ID".into(), "NAME".into()],
            vec![
                vec![Value::Integer(1), Value::from("a")],
                vec![Value::Integer(2), Value::Null],
            ],
        );
        assert_eq!(rs.column_count(), 2);
        assert_eq!(rs.remaining(), 2);
        assert_eq!(rs.next().map(|row| row[0].clone()), Some(Value::Integer(1)));
        assert_eq!(rs.remaining(), 1);
        assert_eq!(rs.count(), 1);
    }

    #[test]
    fn test_backend_error_keeps_source() {
        let io = std::io::Error::other("disk on fire");
        let err = BackendError::wrap(io);
        assert_eq!(err.to_string(), "disk on fire");
        assert!(err.source().is_some());
        assert!(BackendError::new("plain").source().is_none());
    }
}
