/// A parse error with human-readable location information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl ParseError {
    /// Locate the error at the point where parsing of `original` stopped,
    /// given the input left over.
    pub(crate) fn at(original: &str, remaining: &str, message: impl Into<String>) -> Self {
        let consumed = original.len().saturating_sub(remaining.len());
        let (line, column) = offset_to_line_col(original, consumed);
        Self {
            message: message.into(),
            line,
            column,
        }
    }
}

impl core::fmt::Display for ParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "parse error at line {}, column {}: {}",
            self.line, self.column, self.message
        )
    }
}

impl std::error::Error for ParseError {}

/// Convert a byte offset into the original input to 1-based (line, column).
pub(crate) fn offset_to_line_col(input: &str, offset: usize) -> (usize, usize) {
    let prefix = &input[..offset.min(input.len())];
    let line = prefix.bytes().filter(|&b| b == b'\n').count() + 1;
    let column = prefix
        .rfind('\n')
        .map_or_else(|| prefix.len() + 1, |pos| prefix.len() - pos);
    (line, column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_to_line_col_first_line() {
        assert_eq!(offset_to_line_col("hello\nworld\n", 0), (1, 1));
        assert_eq!(offset_to_line_col("hello\nworld\n", 3), (1, 4));
    }

    #[test]
    fn test_offset_to_line_col_second_line() {
        // "hello\n" is 6 bytes; offset 6 is the start of the second line.
        assert_eq!(offset_to_line_col("hello\nworld\n", 6), (2, 1));
    }

    #[test]
    fn test_offset_past_end_is_clamped() {
        assert_eq!(offset_to_line_col("ab", 10), (1, 3));
    }

    #[test]
    fn test_display() {
        let err = ParseError::at("a=1\n=2\n", "=2\n", "expected a key");
        assert_eq!(err.to_string(), "parse error at line 2, column 1: expected a key");
    }
}
