//! Error types for nagioscfg.
//!
//! All errors are strongly typed using thiserror so callers can match on
//! the exact failure. Parse errors always carry the line and rune column
//! where scanning stopped.

use std::io;

use thiserror::Error;

use crate::collection::ObjectMap;
use crate::identity::ObjectId;
use crate::kind::ObjectKind;
use crate::parse::Position;

/// Errors raised while scanning and parsing object definitions.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("{position}: malformed field: {reason}")]
    MalformedField {
        position: Position,
        reason: String,
    },

    #[error("{position}: unknown object kind '{name}'")]
    UnknownKind {
        position: Position,
        name: String,
    },

    #[error("{position}: invalid block header: {reason}")]
    InvalidHeader {
        position: Position,
        reason: String,
    },

    #[error("{position}: end of input inside '{kind}' block")]
    UnterminatedBlock {
        position: Position,
        kind: ObjectKind,
    },

    #[error("{position}: '}}' outside of a block")]
    UnexpectedBlockEnd {
        position: Position,
    },

    #[error("{position}: only key '{key}' given where key/value expected")]
    MissingValue {
        position: Position,
        key: String,
    },

    #[error("end of input")]
    EndOfInput,

    #[error("{position}: read failed: {source}")]
    Source {
        position: Position,
        #[source]
        source: io::Error,
    },
}

impl ParseError {
    /// Returns true for the normal end-of-input signal.
    #[must_use]
    pub const fn is_end_of_input(&self) -> bool {
        matches!(self, Self::EndOfInput)
    }

    /// Where the error occurred, if it is tied to a position.
    #[must_use]
    pub const fn position(&self) -> Option<Position> {
        match self {
            Self::MalformedField { position, .. }
            | Self::UnknownKind { position, .. }
            | Self::InvalidHeader { position, .. }
            | Self::UnterminatedBlock { position, .. }
            | Self::UnexpectedBlockEnd { position }
            | Self::MissingValue { position, .. }
            | Self::Source { position, .. } => Some(*position),
            Self::EndOfInput => None,
        }
    }
}

/// Validation errors raised by the object model and collections.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Property key cannot be empty")]
    EmptyKey,

    #[error("Object of kind '{kind}' has no identity")]
    MissingIdentity {
        kind: ObjectKind,
    },

    #[error("Identity {id} is already present in the collection")]
    DuplicateIdentity {
        id: ObjectId,
    },

    #[error("Unknown object kind '{name}'")]
    UnknownKind {
        name: String,
    },

    #[error("Invalid identity '{value}': {reason}")]
    InvalidIdentity {
        value: String,
        reason: String,
    },
}

/// Top-level error type for nagioscfg.
#[derive(Debug, Error)]
pub enum NagiosError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("I/O error ({context}): {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed writing {failed} of {total} partitions")]
    PartialGroupWrite {
        failed: usize,
        total: usize,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {reason}")]
    Config {
        reason: String,
    },
}

impl NagiosError {
    /// Creates an I/O error with context (usually a path or source label).
    #[must_use]
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// Returns true if this is a parse error.
    #[must_use]
    pub const fn is_parse(&self) -> bool {
        matches!(self, Self::Parse(_))
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is an I/O error, including read failures
    /// surfaced by the parser.
    #[must_use]
    pub const fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::Parse(ParseError::Source { .. }))
    }
}

/// Result type alias for nagioscfg operations.
pub type NagiosResult<T> = Result<T, NagiosError>;

/// A collection build that stopped early.
///
/// Objects parsed before the failure are kept in `partial`.
#[derive(Debug, Error)]
#[error("collection build stopped after {count} objects: {error}", count = .partial.len())]
pub struct BuildError {
    /// Objects collected before the failure.
    pub partial: ObjectMap,
    /// What stopped the build.
    #[source]
    pub error: NagiosError,
}

/// One failed source of a multi-source read.
#[derive(Debug, Error)]
#[error("source '{label}': {error}")]
pub struct SourceFailure {
    /// Label of the source (its path for file sources).
    pub label: String,
    /// Why the source failed.
    #[source]
    pub error: NagiosError,
}

/// Aggregate result of a multi-source read with at least one failure.
#[derive(Debug, Error)]
#[error("failed to read {} of {total} sources", .failures.len())]
pub struct MultiSourceError {
    /// Everything that was read successfully, including objects parsed from
    /// a failing source before it failed.
    pub collected: ObjectMap,
    /// One entry per failed source, in source order.
    pub failures: Vec<SourceFailure>,
    /// Number of sources attempted.
    pub total: usize,
}

impl MultiSourceError {
    /// Number of failed sources.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_carries_position() {
        let err = ParseError::UnknownKind {
            position: Position::new(1, 18),
            name: "bogus_kind".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("line 1, column 18"));
        assert!(msg.contains("bogus_kind"));
        assert_eq!(err.position(), Some(Position::new(1, 18)));
    }

    #[test]
    fn test_end_of_input_has_no_position() {
        let err = ParseError::EndOfInput;
        assert!(err.is_end_of_input());
        assert!(err.position().is_none());
    }

    #[test]
    fn test_block_end_message_escapes_brace() {
        let err = ParseError::UnexpectedBlockEnd {
            position: Position::new(3, 0),
        };
        assert_eq!(format!("{err}"), "line 3, column 0: '}' outside of a block");
    }

    #[test]
    fn test_nagios_error_from_parse() {
        let err: NagiosError = ParseError::EndOfInput.into();
        assert!(err.is_parse());
        assert!(!err.is_validation());
    }

    #[test]
    fn test_source_parse_error_counts_as_io() {
        let err: NagiosError = ParseError::Source {
            position: Position::new(2, 4),
            source: io::Error::new(io::ErrorKind::BrokenPipe, "gone"),
        }
        .into();
        assert!(err.is_io());
        assert!(err.is_parse());
    }

    #[test]
    fn test_partial_group_write_message() {
        let err = NagiosError::PartialGroupWrite { failed: 1, total: 3 };
        assert_eq!(format!("{err}"), "Failed writing 1 of 3 partitions");
    }

    #[test]
    fn test_multi_source_error_counts() {
        let err = MultiSourceError {
            collected: ObjectMap::new(),
            failures: vec![SourceFailure {
                label: "/nonexistent.cfg".to_string(),
                error: NagiosError::io(
                    "/nonexistent.cfg",
                    io::Error::new(io::ErrorKind::NotFound, "no such file"),
                ),
            }],
            total: 3,
        };
        assert_eq!(err.failed(), 1);
        assert_eq!(format!("{err}"), "failed to read 1 of 3 sources");
    }

    #[test]
    fn test_build_error_reports_partial_count() {
        let err = BuildError {
            partial: ObjectMap::new(),
            error: ParseError::EndOfInput.into(),
        };
        assert!(format!("{err}").starts_with("collection build stopped after 0 objects"));
    }
}
