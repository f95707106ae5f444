use derive_more::{Display, Error, From};

use crate::backend::BackendError;
use crate::server::ServerError;

/// A configuration line that could not be turned into a target.
///
/// The offending input is kept verbatim so the caller can report it and move
/// on to the next configured database.
#[derive(Debug, Display, Error)]
#[display("cannot load database {input}: {kind}")]
pub struct ConfigError {
    pub input: String,
    pub kind: ConfigErrorKind,
}

impl ConfigError {
    #[must_use]
    pub fn new(input: impl Into<String>, kind: ConfigErrorKind) -> Self {
        Self {
            input: input.into(),
            kind,
        }
    }
}

#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum ConfigErrorKind {
    #[display("missing field `{_0}`")]
    MissingField(&'static str),
    #[display("expected at most 5 fields, found {_0}")]
    TooManyFields(usize),
    #[display("unknown driver `{_0}`")]
    UnknownDriver(String),
}

/// Errors raised while a target talks to its backend.
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// The backend refused the connection.
    #[display("cannot connect to {url}: {source}")]
    Connect { url: String, source: BackendError },
    /// A statement failed; `sql` is the translated text that was sent.
    #[display("statement failed: {sql}: {source}")]
    Statement { sql: String, source: BackendError },
    #[display("transaction control failed: {_0}")]
    Transaction(BackendError),
    #[display("closing the connection failed: {_0}")]
    Disconnect(BackendError),
    #[display("no open connection")]
    NotConnected,
    /// The prepared statement was created on a connection that has since
    /// been closed.
    #[display("prepared statement `{sql}` belongs to a closed connection")]
    StalePrepared { sql: String },
    #[display("parameter indexes start at 1 in `{sql}`")]
    ParameterIndex { sql: String },
    #[display("{_0}")]
    #[from]
    Server(ServerError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_echoes_input() {
        let err = ConfigError::new(
            "H2,org.h2.Driver",
            ConfigErrorKind::MissingField("url"),
        );
        assert_eq!(
            err.to_string(),
            "cannot load database H2,org.h2.Driver: missing field `url`"
        );
    }

    #[test]
    fn test_statement_error_names_sql() {
        let err = Error::Statement {
            sql: "DROP TABLE T".into(),
            source: BackendError::new("no such table: T"),
        };
        assert_eq!(
            err.to_string(),
            "statement failed: DROP TABLE T: no such table: T"
        );
    }
}
