//! UTF-8 rune decoding over a buffered byte source.

use std::io::{self, BufRead, ErrorKind};

/// Decodes runes one at a time, with one rune of lookahead.
///
/// A CR immediately followed by LF is returned as a single LF. A CR followed
/// by anything else is returned as-is.
pub(crate) struct RuneReader<R> {
    inner: R,
    peeked: Option<char>,
}

impl<R: BufRead> RuneReader<R> {
    pub(crate) const fn new(inner: R) -> Self {
        Self {
            inner,
            peeked: None,
        }
    }

    /// Reads the next rune with line endings normalized.
    ///
    /// Returns `Ok(None)` at end of stream.
    pub(crate) fn read_rune(&mut self) -> io::Result<Option<char>> {
        match self.next_char()? {
            Some('\r') => {
                if self.peek_char()? == Some('\n') {
                    self.peeked = None;
                    Ok(Some('\n'))
                } else {
                    Ok(Some('\r'))
                }
            }
            other => Ok(other),
        }
    }

    fn peek_char(&mut self) -> io::Result<Option<char>> {
        if self.peeked.is_none() {
            self.peeked = self.decode()?;
        }
        Ok(self.peeked)
    }

    fn next_char(&mut self) -> io::Result<Option<char>> {
        match self.peeked.take() {
            Some(c) => Ok(Some(c)),
            None => self.decode(),
        }
    }

    fn decode(&mut self) -> io::Result<Option<char>> {
        let Some(first) = self.read_byte()? else {
            return Ok(None);
        };

        let width = utf8_width(first).ok_or_else(|| {
            io::Error::new(
                ErrorKind::InvalidData,
                format!("invalid UTF-8 lead byte 0x{first:02x}"),
            )
        })?;

        let mut buf = [first, 0, 0, 0];
        for slot in buf.iter_mut().take(width).skip(1) {
            *slot = self.read_byte()?.ok_or_else(|| {
                io::Error::new(ErrorKind::UnexpectedEof, "truncated UTF-8 sequence")
            })?;
        }

        std::str::from_utf8(&buf[..width])
            .map_err(|e| io::Error::new(ErrorKind::InvalidData, e))
            .map(|s| s.chars().next())
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        loop {
            let buf = match self.inner.fill_buf() {
                Ok(buf) => buf,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            let Some(&byte) = buf.first() else {
                return Ok(None);
            };
            self.inner.consume(1);
            return Ok(Some(byte));
        }
    }
}

const fn utf8_width(lead: u8) -> Option<usize> {
    match lead {
        0x00..=0x7f => Some(1),
        0xc2..=0xdf => Some(2),
        0xe0..=0xef => Some(3),
        0xf0..=0xf4 => Some(4),
        _ => None,
    }
}

/// Returns true for errors caused by the bytes themselves rather than the
/// underlying source.
pub(crate) fn is_decode_error(err: &io::Error) -> bool {
    matches!(err.kind(), ErrorKind::InvalidData | ErrorKind::UnexpectedEof)
}
