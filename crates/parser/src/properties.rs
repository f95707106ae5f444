//! Winnow parser for dialect translation files, in the Java `.properties`
//! format.
//!
//! Grammar:
//! ```text
//! file    = line*
//! line    = WS* (comment | entry | "") (NEWLINE | EOF)
//! comment = ("#" | "!") REST_OF_LINE
//! entry   = key WS* ("=" | ":")? WS* value
//! key     = (escape | any char except "=", ":", "\" and whitespace)+
//! value   = (escape | any char except "\" and NEWLINE)*
//! escape  = "\" (NEWLINE WS* | "uXXXX" | any char)
//! ```
//!
//! A backslash before a line break continues the logical line; leading
//! whitespace on the next physical line is dropped. `\t`, `\n`, `\r`, `\f`
//! and `\uXXXX` decode to the character they name, and a backslash before any
//! other character keeps that character, so `\:`, `\=` and `\ ` can appear in
//! keys. Comments never continue. Unlike `java.util.Properties`, an empty key
//! is an error and `\u` escapes of surrogate halves are rejected.
//!
//! Entries keep the order they appear in. A repeated key keeps its first
//! position and takes the last value.
use dbbench_core::Properties;
use winnow::ascii::{line_ending, till_line_ending};
use winnow::combinator::{alt, cut_err, empty, eof, opt, preceded};
use winnow::error::{StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::{any, one_of, take_while};
use winnow::ModalResult;

use crate::error::ParseError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    Blank,
    Entry(String, String),
}

/// Parse a properties file into an order-preserving [`Properties`].
///
/// # Errors
///
/// Returns a [`ParseError`] pointing at the first line that is neither a
/// comment, blank, nor an entry with a non-empty key, or that holds a
/// malformed `\uXXXX` escape.
pub fn parse_properties(input: &str) -> Result<Properties, ParseError> {
    let mut stream: &str = input;
    let mut properties = Properties::new();
    while !stream.is_empty() {
        match line.parse_next(&mut stream) {
            Ok(Line::Entry(key, value)) => {
                properties.insert(key, value);
            }
            Ok(Line::Blank) => {}
            Err(e) => return Err(ParseError::at(input, stream, e.to_string())),
        }
    }
    Ok(properties)
}

fn inline_ws(input: &mut &str) -> ModalResult<()> {
    take_while(0.., [' ', '\t', '\x0c']).void().parse_next(input)
}

fn comment(input: &mut &str) -> ModalResult<Line> {
    one_of(['#', '!']).parse_next(input)?;
    till_line_ending.parse_next(input)?;
    Ok(Line::Blank)
}

fn unicode_escape(input: &mut &str) -> ModalResult<char> {
    take_while(4, |c: char| c.is_ascii_hexdigit())
        .try_map(|hex| u32::from_str_radix(hex, 16))
        .verify_map(char::from_u32)
        .context(StrContext::Expected(StrContextValue::Description(
            "four hex digits after `\\u`",
        )))
        .parse_next(input)
}

/// The character a backslash escape stands for, or `None` for a line
/// continuation.
fn escape(input: &mut &str) -> ModalResult<Option<char>> {
    '\\'.parse_next(input)?;
    alt((
        (line_ending, inline_ws).value(None),
        eof.value(None),
        preceded('u', cut_err(unicode_escape)).map(Some),
        any.map(|c| {
            Some(match c {
                't' => '\t',
                'n' => '\n',
                'r' => '\r',
                'f' => '\x0c',
                c => c,
            })
        }),
    ))
    .parse_next(input)
}

/// Text made of runs accepted by `plain`, joined by backslash escapes.
fn escaped_text(input: &mut &str, plain: fn(char) -> bool) -> ModalResult<String> {
    let mut text = String::new();
    loop {
        text.push_str(take_while(0.., plain).parse_next(input)?);
        if !input.starts_with('\\') {
            return Ok(text);
        }
        if let Some(c) = escape.parse_next(input)? {
            text.push(c);
        }
    }
}

fn key(input: &mut &str) -> ModalResult<String> {
    escaped_text(input, |c| !matches!(c, '=' | ':' | '\\') && !c.is_whitespace())
}

fn value(input: &mut &str) -> ModalResult<String> {
    escaped_text(input, |c| !matches!(c, '\\' | '\r' | '\n'))
}

fn entry(input: &mut &str) -> ModalResult<Line> {
    let key = key
        .verify(|key: &str| !key.is_empty())
        .parse_next(input)?;
    inline_ws.parse_next(input)?;
    opt(one_of(['=', ':'])).parse_next(input)?;
    inline_ws.parse_next(input)?;
    let value = value.parse_next(input)?;
    Ok(Line::Entry(key, value))
}

fn line(input: &mut &str) -> ModalResult<Line> {
    inline_ws.parse_next(input)?;
    let parsed = alt((comment, entry, empty.value(Line::Blank))).parse_next(input)?;
    alt((line_ending.void(), eof.void()))
        .context(StrContext::Expected(StrContextValue::Description(
            "a `key=value` entry",
        )))
        .parse_next(input)?;
    Ok(parsed)
}
