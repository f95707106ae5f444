use crate::error::Error;
use crate::value::Value;

/// A translated statement compiled on one connection, with its parameters.
///
/// Obtained from [`DatabaseTarget::prepare`](crate::target::DatabaseTarget::prepare)
/// and reusable until that connection is closed. Parameter positions are
/// 1-based, matching `?` placeholders in the SQL.
#[derive(Debug, Clone, PartialEq)]
pub struct Prepared {
    sql: String,
    params: Vec<Value>,
    session: u64,
}

impl Prepared {
    pub(crate) const fn new(sql: String, session: u64) -> Self {
        Self {
            sql,
            params: Vec::new(),
            session,
        }
    }

    /// The statement as sent to the backend, after translation.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    #[must_use]
    pub fn params(&self) -> &[Value] {
        &self.params
    }

    pub(crate) const fn session(&self) -> u64 {
        self.session
    }

    /// Bind `value` to the 1-based parameter `index`. Unset positions below
    /// the highest bound index are NULL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParameterIndex`] if `index` is 0.
    pub fn set(&mut self, index: usize, value: impl Into<Value>) -> Result<&mut Self, Error> {
        let slot = index.checked_sub(1).ok_or_else(|| Error::ParameterIndex {
            sql: self.sql.clone(),
        })?;
        if self.params.len() <= slot {
            self.params.resize(slot + 1, Value::Null);
        }
        self.params[slot] = value.into();
        Ok(self)
    }

    /// Forget all bound parameters.
    pub fn clear(&mut self) {
        self.params.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_fills_gaps_with_null() {
        let mut prep = Prepared::new("INSERT INTO T VALUES(?, ?, ?)".into(), 1);
        prep.set(3, "c").unwrap().set(1, 7).unwrap();
        assert_eq!(
            prep.params(),
            [Value::Integer(7), Value::Null, Value::Text("c".into())]
        );
        prep.set(1, 8).unwrap();
        assert_eq!(prep.params()[0], Value::Integer(8));
        prep.clear();
        assert!(prep.params().is_empty());
    }

    #[test]
    fn test_index_zero_is_rejected() {
        let mut prep = Prepared::new("SELECT ?".into(), 1);
        let err = prep.set(0, 1).unwrap_err();
        assert!(matches!(err, Error::ParameterIndex { ref sql } if sql == "SELECT ?"));
        assert!(prep.params().is_empty());
    }
}
