//! Field and delimiter scanning.

use std::io::BufRead;

use tracing::trace;

use crate::error::ParseError;

use super::rune::{is_decode_error, RuneReader};
use super::Position;

/// What ended a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    /// Whitespace other than a newline; more fields may follow on the line.
    Space,
    /// End of line.
    Newline,
    /// An opening `{` directly after the field.
    BlockBegin,
    /// End of stream directly after the field.
    EndOfStream,
}

impl Delimiter {
    /// The line ending this delimiter implies, if it ends the line.
    #[must_use]
    pub const fn line_end(self) -> Option<LineEnd> {
        match self {
            Self::Space => None,
            Self::Newline => Some(LineEnd::Newline),
            Self::BlockBegin => Some(LineEnd::BlockBegin),
            Self::EndOfStream => Some(LineEnd::EndOfStream),
        }
    }
}

/// One scanner step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A run of non-whitespace runes and what terminated it.
    Field {
        /// The field's runes.
        text: String,
        /// What ended the field.
        delimiter: Delimiter,
    },
    /// End of a line without a field; also produced for comment lines.
    Newline,
    /// `{` without a preceding field.
    BlockBegin,
    /// `}` at the start of a token.
    BlockEnd,
    /// The source is exhausted.
    EndOfStream,
}

/// How a [`Line`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnd {
    /// A newline.
    Newline,
    /// An opening `{`.
    BlockBegin,
    /// A closing `}`.
    BlockEnd,
    /// End of stream.
    EndOfStream,
}

/// The fields of one logical line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// Fields in order of appearance.
    pub fields: Vec<String>,
    /// What ended the line.
    pub end: LineEnd,
}

/// Splits a rune stream into fields and line delimiters.
///
/// The scanner is stateful and strictly sequential; it must not be shared
/// between concurrent callers.
pub struct Scanner<R> {
    runes: RuneReader<R>,
    comment: Option<char>,
    line: usize,
    column: usize,
    last: Position,
    line_start: bool,
}

impl<R: BufRead> Scanner<R> {
    /// Creates a scanner with `#` as the comment marker.
    pub fn new(source: R) -> Self {
        Self::with_comment(source, Some('#'))
    }

    /// Creates a scanner with a custom comment marker; `None` disables
    /// comment handling.
    pub fn with_comment(source: R, comment: Option<char>) -> Self {
        Self {
            runes: RuneReader::new(source),
            comment,
            line: 1,
            column: 0,
            last: Position::default(),
            line_start: true,
        }
    }

    /// Position of the last rune consumed.
    #[must_use]
    pub const fn position(&self) -> Position {
        self.last
    }

    /// Produces the next token.
    pub fn next_token(&mut self) -> Result<Token, ParseError> {
        let mut next = self.read()?;
        while let Some(c) = next {
            if c == '\n' || !c.is_whitespace() {
                break;
            }
            next = self.read()?;
        }

        let Some(c) = next else {
            return Ok(Token::EndOfStream);
        };

        if self.line_start {
            self.line_start = false;
            if Some(c) == self.comment {
                return self.skip_comment();
            }
        }

        match c {
            '\n' => {
                self.line_start = true;
                Ok(Token::Newline)
            }
            '{' => Ok(Token::BlockBegin),
            '}' => Ok(Token::BlockEnd),
            _ => self.read_field(c),
        }
    }

    /// Collects tokens up to the end of the current line.
    pub fn next_line(&mut self) -> Result<Line, ParseError> {
        let mut fields = Vec::new();
        loop {
            let end = match self.next_token()? {
                Token::Field { text, delimiter } => {
                    fields.push(text);
                    match delimiter.line_end() {
                        Some(end) => end,
                        None => continue,
                    }
                }
                Token::Newline => LineEnd::Newline,
                Token::BlockBegin => LineEnd::BlockBegin,
                Token::BlockEnd => LineEnd::BlockEnd,
                Token::EndOfStream => LineEnd::EndOfStream,
            };
            trace!(line = self.last.line, ?end, ?fields, "scanned line");
            return Ok(Line { fields, end });
        }
    }

    fn read_field(&mut self, first: char) -> Result<Token, ParseError> {
        let mut text = String::new();
        text.push(first);
        loop {
            let delimiter = match self.read()? {
                None => Delimiter::EndOfStream,
                Some('{') => Delimiter::BlockBegin,
                Some('\n') => {
                    self.line_start = true;
                    Delimiter::Newline
                }
                Some(c) if c.is_whitespace() => Delimiter::Space,
                Some(c) => {
                    text.push(c);
                    continue;
                }
            };
            return Ok(Token::Field { text, delimiter });
        }
    }

    fn skip_comment(&mut self) -> Result<Token, ParseError> {
        loop {
            match self.read()? {
                None => return Ok(Token::EndOfStream),
                Some('\n') => {
                    self.line_start = true;
                    return Ok(Token::Newline);
                }
                Some(_) => {}
            }
        }
    }

    fn read(&mut self) -> Result<Option<char>, ParseError> {
        let rune = self.runes.read_rune().map_err(|err| {
            let position = Position::new(self.line, self.column);
            if is_decode_error(&err) {
                ParseError::MalformedField {
                    position,
                    reason: err.to_string(),
                }
            } else {
                ParseError::Source {
                    position,
                    source: err,
                }
            }
        })?;

        if let Some(c) = rune {
            self.last = Position::new(self.line, self.column);
            if c == '\n' {
                self.line += 1;
                self.column = 0;
            } else {
                self.column += 1;
            }
        }
        Ok(rune)
    }
}
