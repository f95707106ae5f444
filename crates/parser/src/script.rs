//! Winnow parser for benchmark scripts run by `dbbench exec`.
//!
//! A script is a sequence of SQL statements terminated by `;` (the last one
//! may omit it). `--` starts a comment running to the end of the line.
//! Semicolons and dashes inside single-quoted literals are kept as written;
//! a doubled quote inside a literal is an escaped quote.
use winnow::ascii::till_line_ending;
use winnow::combinator::{alt, eof, not, opt, terminated};
use winnow::prelude::*;
use winnow::token::{literal, take_till};
use winnow::ModalResult;

use crate::error::ParseError;

/// Split a script into its statements, trimmed, with comments removed and
/// empty statements dropped.
///
/// # Errors
///
/// Returns a [`ParseError`] at the opening quote of an unterminated string
/// literal.
pub fn parse_script(input: &str) -> Result<Vec<String>, ParseError> {
    let mut stream: &str = input;
    let mut statements = Vec::new();
    while !stream.is_empty() {
        match statement.parse_next(&mut stream) {
            Ok(sql) if sql.is_empty() => {}
            Ok(sql) => statements.push(sql),
            Err(e) => return Err(ParseError::at(input, stream, e.to_string())),
        }
    }
    Ok(statements)
}

/// A piece of statement text; comments contribute nothing.
fn piece<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    alt((quoted, comment, lone_dash, plain)).parse_next(input)
}

fn plain<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_till(1.., [';', '\'', '-']).parse_next(input)
}

fn lone_dash<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    terminated(literal("-"), not(literal("-"))).parse_next(input)
}

fn comment<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    literal("--").parse_next(input)?;
    till_line_ending.parse_next(input)?;
    Ok("")
}

fn quoted<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    (literal("'"), take_till(0.., '\''), literal("'"))
        .take()
        .parse_next(input)
}

fn statement(input: &mut &str) -> ModalResult<String> {
    let mut sql = String::new();
    loop {
        if opt(alt((literal(";").void(), eof.void())))
            .parse_next(input)?
            .is_some()
        {
            return Ok(sql.trim().to_owned());
        }
        sql.push_str(piece.parse_next(input)?);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statements_split_on_semicolons() {
        let input = "CREATE TABLE T(ID INT);\nINSERT INTO T VALUES(1);\nSELECT * FROM T";
        assert_eq!(
            parse_script(input).expect("should parse"),
            vec![
                "CREATE TABLE T(ID INT)",
                "INSERT INTO T VALUES(1)",
                "SELECT * FROM T",
            ]
        );
    }

    #[test]
    fn test_comments_and_empty_statements_are_dropped() {
        let input = "-- setup\nDROP TABLE T; ;\n-- done\n";
        assert_eq!(
            parse_script(input).expect("should parse"),
            vec!["DROP TABLE T"]
        );
    }

    #[test]
    fn test_trailing_comment_on_statement_line() {
        let input = "SELECT 1 -- one\n;";
        assert_eq!(parse_script(input).expect("should parse"), vec!["SELECT 1"]);
    }

    #[test]
    fn test_literals_keep_semicolons_and_dashes() {
        let input = "INSERT INTO T VALUES('a;b--c', 'it''s');SELECT 2-1;";
        assert_eq!(
            parse_script(input).expect("should parse"),
            vec!["INSERT INTO T VALUES('a;b--c', 'it''s')", "SELECT 2-1"]
        );
    }

    #[test]
    fn test_unterminated_literal_is_an_error() {
        let err = parse_script("SELECT 1;\nSELECT 'oops").expect_err("should fail");
        assert_eq!(err.line, 2, "{err}");
    }
}
