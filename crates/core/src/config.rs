use core::fmt;
use core::str::FromStr;

use crate::error::{ConfigError, ConfigErrorKind};

/// The fields of one configuration line:
///
/// ```text
/// name, driverIdentifier, url, user[, password]
/// ```
///
/// Fields are separated by commas and trimmed. A missing or empty trailing
/// password means no password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetConfig {
    pub name: String,
    pub driver: String,
    pub url: String,
    pub user: String,
    pub password: String,
}

const REQUIRED: [&str; 3] = ["name", "driver", "url"];

impl TargetConfig {
    /// # Errors
    ///
    /// Returns a [`ConfigError`] echoing `line` when a required field is
    /// missing or empty, or when there are more than five fields.
    pub fn parse(line: &str) -> Result<Self, ConfigError> {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let fail = |kind| ConfigError::new(line, kind);

        if fields.len() > 5 {
            return Err(fail(ConfigErrorKind::TooManyFields(fields.len())));
        }
        for (index, label) in REQUIRED.iter().enumerate() {
            if fields.get(index).is_none_or(|field| field.is_empty()) {
                return Err(fail(ConfigErrorKind::MissingField(label)));
            }
        }
        let user = fields
            .get(3)
            .ok_or_else(|| fail(ConfigErrorKind::MissingField("user")))?;

        Ok(Self {
            name: fields[0].to_owned(),
            driver: fields[1].to_owned(),
            url: fields[2].to_owned(),
            user: (*user).to_owned(),
            password: fields.get(4).copied().unwrap_or_default().to_owned(),
        })
    }
}

impl FromStr for TargetConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Writes the line back without the password.
impl fmt::Display for TargetConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.name, self.driver, self.url, self.user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_trailing_empty_password() {
        let config = TargetConfig::parse("H2,org.h2.Driver,jdbc:h2:mem:test,sa,").unwrap();
        assert_eq!(
            config,
            TargetConfig {
                name: "H2".into(),
                driver: "org.h2.Driver".into(),
                url: "jdbc:h2:mem:test".into(),
                user: "sa".into(),
                password: String::new(),
            }
        );
    }

    #[test]
    fn test_parse_trims_fields() {
        let config: TargetConfig = " PostgreSQL , org.postgresql.Driver , jdbc:postgresql:test , sa , secret "
            .parse()
            .unwrap();
        assert_eq!(config.name, "PostgreSQL");
        assert_eq!(config.url, "jdbc:postgresql:test");
        assert_eq!(config.password, "secret");
    }

    #[test]
    fn test_parse_without_password() {
        let config = TargetConfig::parse("SQLite,sqlite,sqlite::memory:,sa").unwrap();
        assert_eq!(config.user, "sa");
        assert!(config.password.is_empty());
    }

    #[test]
    fn test_missing_fields() {
        let err = TargetConfig::parse("").unwrap_err();
        assert_eq!(err.kind, ConfigErrorKind::MissingField("name"));

        let err = TargetConfig::parse("H2,org.h2.Driver").unwrap_err();
        assert_eq!(err.kind, ConfigErrorKind::MissingField("url"));
        assert_eq!(err.input, "H2,org.h2.Driver");

        let err = TargetConfig::parse("H2,org.h2.Driver,jdbc:h2:mem:test").unwrap_err();
        assert_eq!(err.kind, ConfigErrorKind::MissingField("user"));

        let err = TargetConfig::parse("H2, ,jdbc:h2:mem:test,sa").unwrap_err();
        assert_eq!(err.kind, ConfigErrorKind::MissingField("driver"));
    }

    #[test]
    fn test_too_many_fields() {
        let err = TargetConfig::parse("a,b,c,d,e,f").unwrap_err();
        assert_eq!(err.kind, ConfigErrorKind::TooManyFields(6));
    }

    #[test]
    fn test_display_hides_password() {
        let config = TargetConfig::parse("H2,org.h2.Driver,jdbc:h2:mem:test,sa,pw").unwrap();
        assert_eq!(config.to_string(), "H2,org.h2.Driver,jdbc:h2:mem:test,sa");
    }
}
