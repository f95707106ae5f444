//! Rewriting generic benchmark SQL into a backend's dialect.
//!
//! Rules come from a property set with keys of the form
//! `<dialect>.<TOKEN_WITH_UNDERSCORES>`. For the dialect of a target's URL,
//! every matching key becomes a rule whose pattern is the token with
//! underscores turned into spaces and upper-cased, and whose replacement is the
//! property value:
//!
//! ```text
//! sqlite.DROP_TABLE = DROP TABLE IF EXISTS
//! ```
//!
//! turns `DROP TABLE T` into `DROP TABLE IF EXISTS T` on SQLite targets.
//!
//! Rules are applied as plain substring replacements, one after another, in
//! the order the property set yields them. Overlapping patterns are not
//! resolved: put the longer pattern first if both can match.

use std::borrow::Cow;

use crate::properties::Properties;

/// One substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pattern: String,
    replacement: String,
}

impl Rule {
    #[must_use]
    pub fn new(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            replacement: replacement.into(),
        }
    }

    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    #[must_use]
    pub fn replacement(&self) -> &str {
        &self.replacement
    }
}

/// Ordered rule list for one backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Translator {
    rules: Vec<Rule>,
}

impl Translator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect the rules for `dialect` from `properties`.
    #[must_use]
    pub fn for_dialect(dialect: &str, properties: &Properties) -> Self {
        let mut translator = Self::new();
        translator.extend_from(dialect, properties);
        translator
    }

    /// Collect the rules for the dialect named by `url`. A URL without a
    /// scheme yields an empty translator.
    #[must_use]
    pub fn for_url(url: &str, properties: &Properties) -> Self {
        dialect_id(url).map_or_else(Self::new, |dialect| Self::for_dialect(dialect, properties))
    }

    /// Append the rules for `dialect` found in `properties`.
    pub fn extend_from(&mut self, dialect: &str, properties: &Properties) {
        let prefix = format!("{dialect}.");
        for (token, replacement) in properties.with_prefix(&prefix) {
            if token.is_empty() {
                tracing::warn!(dialect, "ignoring translation with an empty pattern");
                continue;
            }
            let pattern = token.replace('_', " ").to_uppercase();
            tracing::trace!(dialect, %pattern, replacement, "translation rule");
            self.push(Rule::new(pattern, replacement));
        }
    }

    /// Append `rule`. A rule with an empty pattern would match between
    /// every character and is dropped.
    pub fn push(&mut self, rule: Rule) {
        if rule.pattern.is_empty() {
            tracing::warn!(replacement = %rule.replacement, "ignoring rule with an empty pattern");
            return;
        }
        self.rules.push(rule);
    }

    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Apply every rule in order. Borrows the input when nothing matched.
    #[must_use]
    pub fn translate<'a>(&self, sql: &'a str) -> Cow<'a, str> {
        let mut sql = Cow::Borrowed(sql);
        for rule in &self.rules {
            if sql.contains(rule.pattern.as_str()) {
                sql = Cow::Owned(sql.replace(rule.pattern.as_str(), &rule.replacement));
            }
        }
        sql
    }
}

impl FromIterator<Rule> for Translator {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        let mut translator = Self::new();
        for rule in iter {
            translator.push(rule);
        }
        translator
    }
}

/// The dialect segment of a connection URL: the text after an optional
/// `jdbc:` prefix, up to the next `:`.
#[must_use]
pub fn dialect_id(url: &str) -> Option<&str> {
    let rest = url.strip_prefix("jdbc:").unwrap_or(url);
    rest.find(':')
        .map(|end| &rest[..end])
        .filter(|dialect| !dialect.is_empty())
}

/// Statement issued right after connecting to backends that benefit from it.
/// Both relax durability.
#[must_use]
pub fn tuning_statement(dialect: &str) -> Option<&'static str> {
    match dialect {
        "hsqldb" => Some("SET WRITE_DELAY 1"),
        "sqlite" => Some("PRAGMA synchronous = OFF"),
        _ => None,
    }
}
