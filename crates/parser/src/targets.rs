//! Config-list files: one `name, driver, url, user[, password]` line per
//! database, with blank lines and `#` comments skipped.
use dbbench_core::{BenchContext, ConfigError, DatabaseTarget, Registry};

/// The configuration lines of a config-list file with their 1-based line
/// numbers.
pub fn config_lines(input: &str) -> impl Iterator<Item = (usize, &str)> {
    input
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
}

/// Build one target per configuration line.
///
/// Targets are numbered by their position among the configuration lines.
/// A line that fails to resolve yields its own [`ConfigError`] and does not
/// affect the others.
pub fn parse_targets(
    context: &BenchContext,
    registry: &Registry,
    input: &str,
) -> Vec<(usize, Result<DatabaseTarget, ConfigError>)> {
    config_lines(input)
        .enumerate()
        .map(|(id, (line, config))| {
            let target = DatabaseTarget::parse(context, registry, id, config);
            if let Err(err) = &target {
                tracing::warn!(line, %err, "skipping database");
            }
            (line, target)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use dbbench_core::{BackendError, ConfigErrorKind, Connection, Driver, TraceSink};

    use super::*;

    struct NoDriver;

    impl Driver for NoDriver {
        fn name(&self) -> &str {
            "none"
        }

        fn connect(&self, url: &str, _: &str, _: &str) -> Result<Box<dyn Connection>, BackendError> {
            Err(BackendError::new(format!("cannot reach {url}")))
        }
    }

    fn registry() -> Registry {
        let mut registry = Registry::new();
        registry.register_driver(["none"], Arc::new(NoDriver));
        registry
    }

    const LIST: &str = "\
# name, driver, url, user, password
H2, none, jdbc:h2:mem:test, sa, sa

Derby, org.apache.derby.jdbc.EmbeddedDriver, jdbc:derby:data/test, sa, sa
  # disabled: HSQLDB, none, jdbc:hsqldb:data/test, sa
SQLite, none, jdbc:sqlite::memory:, sa
";

    #[test]
    fn test_config_lines_skip_comments_and_blanks() {
        let lines: Vec<usize> = config_lines(LIST).map(|(line, _)| line).collect();
        assert_eq!(lines, vec![2, 4, 6]);
    }

    #[test]
    fn test_each_line_resolves_independently() {
        let context = BenchContext::new(Arc::new(TraceSink::discard()));
        let targets = parse_targets(&context, &registry(), LIST);
        assert_eq!(targets.len(), 3);

        let (line, h2) = &targets[0];
        assert_eq!(*line, 2);
        let h2 = h2.as_ref().expect("h2 should resolve");
        assert_eq!((h2.id(), h2.name()), (0, "H2"));

        let (line, derby) = &targets[1];
        assert_eq!(*line, 4);
        let err = derby.as_ref().expect_err("derby driver is not registered");
        assert_eq!(
            err.kind,
            ConfigErrorKind::UnknownDriver("org.apache.derby.jdbc.EmbeddedDriver".into())
        );

        let sqlite = targets[2].1.as_ref().expect("sqlite should resolve");
        assert_eq!((sqlite.id(), sqlite.password()), (2, ""));
    }

    #[test]
    fn test_empty_list() {
        let context = BenchContext::new(Arc::new(TraceSink::discard()));
        assert!(parse_targets(&context, &registry(), "\n# nothing\n").is_empty());
    }
}
