//! Rewindable line reader and zero-allocation field parsing.
//!
//! Interval files are read twice (once to collect set names, once to collect
//! ranges), so the reader works over any `BufRead + Seek` source and can jump
//! back to the start.

use crate::error::{RangeError, Result};
use memchr::memchr2;
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::Path;

/// Default input buffer size (256 KB).
pub const DEFAULT_INPUT_BUFFER: usize = 256 * 1024;

/// Default line buffer capacity (1 KB).
pub const DEFAULT_LINE_BUFFER: usize = 1024;

/// One non-blank input line with its location.
#[derive(Debug, Clone, Copy)]
pub struct Line<'a> {
    pub bytes: &'a [u8],
    /// 1-based line number
    pub number: usize,
    pub role: &'a str,
}

impl<'a> Line<'a> {
    /// Whitespace-separated fields.
    #[inline]
    pub fn fields(&self) -> Fields<'a> {
        Fields::new(self.bytes)
    }

    /// The last field on the line.
    #[inline]
    pub fn last_field(&self) -> Option<&'a [u8]> {
        self.fields().last()
    }

    /// Build a malformed-input error pointing at this line.
    pub fn malformed(&self, message: impl Into<String>) -> RangeError {
        RangeError::malformed(self.role, self.number, message)
    }
}

/// Streaming line reader that skips blank lines.
pub struct LineReader<R> {
    reader: R,
    role: String,
    line_number: usize,
    buffer: Vec<u8>,
}

impl LineReader<BufReader<File>> {
    /// Open a file. `role` names the file in error messages.
    pub fn from_path<P: AsRef<Path>>(path: P, role: impl Into<String>) -> Result<Self> {
        let role = role.into();
        let file = File::open(path.as_ref()).map_err(|e| RangeError::read(&role, e))?;
        Ok(Self::new(
            BufReader::with_capacity(DEFAULT_INPUT_BUFFER, file),
            role,
        ))
    }
}

impl<R: BufRead + Seek> LineReader<R> {
    /// Wrap a buffered, seekable source.
    pub fn new(reader: R, role: impl Into<String>) -> Self {
        Self {
            reader,
            role: role.into(),
            line_number: 0,
            buffer: Vec::with_capacity(DEFAULT_LINE_BUFFER),
        }
    }

    #[inline]
    pub fn role(&self) -> &str {
        &self.role
    }

    /// Number of the most recently read line (blank lines included).
    #[inline]
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Read the next non-blank line, trimmed of surrounding whitespace.
    pub fn next_line(&mut self) -> Result<Option<Line<'_>>> {
        loop {
            self.buffer.clear();
            let bytes_read = self
                .reader
                .read_until(b'\n', &mut self.buffer)
                .map_err(|e| RangeError::read(&self.role, e))?;
            if bytes_read == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let trimmed = trim_line(&self.buffer);
            if trimmed.is_empty() {
                continue;
            }
            let start = trimmed.as_ptr() as usize - self.buffer.as_ptr() as usize;
            let end = start + trimmed.len();
            return Ok(Some(Line {
                bytes: &self.buffer[start..end],
                number: self.line_number,
                role: &self.role,
            }));
        }
    }

    /// Seek back to the beginning for another pass.
    pub fn rewind(&mut self) -> Result<()> {
        self.reader
            .seek(SeekFrom::Start(0))
            .map_err(|e| RangeError::read(&self.role, e))?;
        self.line_number = 0;
        Ok(())
    }
}

#[inline]
fn is_field_sep(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

#[inline]
fn trim_line(line: &[u8]) -> &[u8] {
    let start = line
        .iter()
        .position(|&b| !b.is_ascii_whitespace())
        .unwrap_or(line.len());
    let end = line
        .iter()
        .rposition(|&b| !b.is_ascii_whitespace())
        .map_or(start, |p| p + 1);
    &line[start..end]
}

/// Iterator over space/tab separated fields. Runs of separators count as one.
pub struct Fields<'a> {
    rest: &'a [u8],
}

impl<'a> Fields<'a> {
    #[inline]
    pub fn new(line: &'a [u8]) -> Self {
        Self { rest: line }
    }
}

impl<'a> Iterator for Fields<'a> {
    type Item = &'a [u8];

    #[inline]
    fn next(&mut self) -> Option<&'a [u8]> {
        let skip = self.rest.iter().position(|&b| !is_field_sep(b))?;
        let rest = &self.rest[skip..];
        let len = memchr2(b' ', b'\t', rest).unwrap_or(rest.len());
        self.rest = &rest[len..];
        Some(&rest[..len])
    }
}

/// Checked u32 parsing for coordinates. Rejects empty input, signs,
/// non-digits and values that overflow.
#[inline]
pub fn parse_u32(bytes: &[u8]) -> Option<u32> {
    if bytes.is_empty() {
        return None;
    }
    let mut n: u32 = 0;
    for &b in bytes {
        let d = b.wrapping_sub(b'0');
        if d > 9 {
            return None;
        }
        n = n.checked_mul(10)?.checked_add(u32::from(d))?;
    }
    Some(n)
}

/// Lossy display form of a token for error messages.
#[inline]
pub fn token_str(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_u32() {
        assert_eq!(parse_u32(b"12345"), Some(12345));
        assert_eq!(parse_u32(b"0"), Some(0));
        assert_eq!(parse_u32(b""), None);
        assert_eq!(parse_u32(b"abc"), None);
        assert_eq!(parse_u32(b"-5"), None);
        assert_eq!(parse_u32(b"4294967295"), Some(u32::MAX));
        assert_eq!(parse_u32(b"4294967296"), None);
    }

    #[test]
    fn test_fields_mixed_separators() {
        let fields: Vec<_> = Fields::new(b"chr1 \t100\t\t200  geneA").collect();
        assert_eq!(fields, vec![&b"chr1"[..], b"100", b"200", b"geneA"]);
        assert_eq!(Fields::new(b"").count(), 0);
    }

    #[test]
    fn test_reader_skips_blank_lines_and_counts_them() {
        let content = "chr1 1 2 a\n\n   \r\nchr2 3 4 b\r\n";
        let mut reader = LineReader::new(Cursor::new(content.as_bytes()), "test file");

        let line = reader.next_line().unwrap().unwrap();
        assert_eq!(line.bytes, b"chr1 1 2 a");
        assert_eq!(line.number, 1);

        let line = reader.next_line().unwrap().unwrap();
        assert_eq!(line.bytes, b"chr2 3 4 b");
        assert_eq!(line.number, 4);
        assert_eq!(line.last_field(), Some(&b"b"[..]));

        assert!(reader.next_line().unwrap().is_none());
    }

    #[test]
    fn test_rewind() {
        let content = "chr1 1 2\nchr1 5 6\n";
        let mut reader = LineReader::new(Cursor::new(content.as_bytes()), "test file");
        while reader.next_line().unwrap().is_some() {}
        assert_eq!(reader.line_number(), 2);

        reader.rewind().unwrap();
        assert_eq!(reader.line_number(), 0);
        let line = reader.next_line().unwrap().unwrap();
        assert_eq!(line.bytes, b"chr1 1 2");
    }

    #[test]
    fn test_line_malformed_error() {
        let mut reader = LineReader::new(Cursor::new(&b"x\n"[..]), "--extract range file");
        let line = reader.next_line().unwrap().unwrap();
        let err = line.malformed("Too few fields");
        assert_eq!(err.line(), Some(1));
        assert!(err.to_string().contains("--extract range file"));
    }
}
