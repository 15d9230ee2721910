//! Reading object definitions from text.
//!
//! Parsing happens in three layers:
//!
//! ```text
//! bytes ──► RuneReader ──► Scanner ──► ObjectReader ──► ConfigObject
//!           (UTF-8,        (fields,    (define-block       │
//!            CR LF → LF)    delims)     state machine)     ├─► Iterator (pull)
//!                                                          └─► ObjectStream (push)
//! ```
//!
//! The pull and push modes drive the same `read_object` call, so both yield
//! objects in the same order.

mod reader;
mod rune;
mod scanner;
mod stream;

use std::fmt;

pub use reader::{ObjectReader, ReaderConfig};
pub use scanner::{Delimiter, Line, LineEnd, Scanner, Token};
pub use stream::{ObjectStream, RecvTimeoutError};
pub(crate) use stream::{pump, Pump};

/// A location in the input.
///
/// Lines are 1-based; columns count runes from 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    /// 1-based line number.
    pub line: usize,
    /// 0-based rune column.
    pub column: usize,
}

impl Position {
    /// Creates a position.
    #[must_use]
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new(1, 0)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}
