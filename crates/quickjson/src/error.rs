//! Error types: a single [`Error`] carrying an [`ErrorKind`], a message, and
//! (for parse errors) the [`SourceLocation`] where the input went wrong.

use std::fmt;

/// Position in the source JSON text. Lines and columns are 1-based,
/// the offset is a 0-based byte offset from the beginning of the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl Default for SourceLocation {
    fn default() -> Self {
        SourceLocation {
            line: 1,
            column: 1,
            offset: 0,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Compute the location of `offset` by scanning the input from the start.
/// Only runs on error paths, so the linear scan never taxes parsing itself.
pub(crate) fn locate(input: &[u8], offset: usize) -> SourceLocation {
    let offset = offset.min(input.len());
    let mut loc = SourceLocation {
        offset,
        ..SourceLocation::default()
    };
    for &byte in &input[..offset] {
        if byte == b'\n' {
            loc.line += 1;
            loc.column = 1;
        } else {
            loc.column += 1;
        }
    }
    loc
}

/// Everything that can go wrong while parsing, accessing, or serializing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum ErrorKind {
    #[error("unexpected end of input")]
    UnexpectedEndOfInput,
    #[error("unexpected character")]
    UnexpectedCharacter,
    #[error("trailing content after JSON")]
    TrailingContent,
    #[error("maximum nesting depth exceeded")]
    MaxDepthExceeded,
    #[error("invalid literal")]
    InvalidLiteral,
    #[error("invalid escape sequence")]
    InvalidEscape,
    #[error("invalid unicode escape")]
    InvalidUnicodeEscape,
    #[error("unterminated string")]
    UnterminatedString,
    #[error("invalid UTF-8 encoding")]
    InvalidUtf8,
    #[error("invalid number")]
    InvalidNumber,
    #[error("integer overflow")]
    IntegerOverflow,
    #[error("unterminated array")]
    UnterminatedArray,
    #[error("unterminated object")]
    UnterminatedObject,
    #[error("duplicate key")]
    DuplicateKey,
    #[error("type mismatch")]
    TypeMismatch,
    #[error("index out of range")]
    OutOfRange,
    #[error("key not found")]
    KeyNotFound,
    #[error("NaN or Infinity not representable")]
    NanOrInfinity,
}

impl ErrorKind {
    /// Whether this kind is produced by the parser (as opposed to value
    /// access or serialization).
    pub fn is_parse_error(self) -> bool {
        !matches!(
            self,
            ErrorKind::TypeMismatch
                | ErrorKind::OutOfRange
                | ErrorKind::KeyNotFound
                | ErrorKind::IntegerOverflow
                | ErrorKind::NanOrInfinity
        )
    }
}

/// Error returned by every fallible operation in the crate.
#[derive(Debug, Clone)]
pub struct Error {
    kind: ErrorKind,
    message: Box<str>,
    location: Option<SourceLocation>,
}

impl Error {
    pub(crate) fn new(kind: ErrorKind, message: impl Into<Box<str>>) -> Error {
        Error {
            kind,
            message: message.into(),
            location: None,
        }
    }

    pub(crate) fn with_location(
        kind: ErrorKind,
        message: impl Into<Box<str>>,
        location: SourceLocation,
    ) -> Error {
        Error {
            kind,
            message: message.into(),
            location: Some(location),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Where the error occurred in the input. Present on parse errors only.
    pub fn location(&self) -> Option<SourceLocation> {
        self.location
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(loc) => write!(f, "JSON parse error at {loc}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locate_counts_lines_and_columns() {
        let input = b"{\n  \"a\": 1,\n  x\n}";
        let offset = input.iter().position(|&b| b == b'x').unwrap();
        let loc = locate(input, offset);
        assert_eq!(loc.line, 3);
        assert_eq!(loc.column, 3);
        assert_eq!(loc.offset, offset);
    }

    #[test]
    fn locate_clamps_offset() {
        let loc = locate(b"ab", 10);
        assert_eq!(loc.offset, 2);
        assert_eq!(loc.column, 3);
    }

    #[test]
    fn display_includes_location_for_parse_errors() {
        let err = Error::with_location(
            ErrorKind::UnexpectedCharacter,
            "unexpected character 'x'",
            SourceLocation {
                line: 3,
                column: 3,
                offset: 14,
            },
        );
        let text = err.to_string();
        assert!(text.contains("line 3"));
        assert!(text.contains("column 3"));
        assert!(err.kind().is_parse_error());
    }
}
