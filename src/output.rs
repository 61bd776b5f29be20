//! Buffered text output for set listings and surviving variant ids.
//!
//! Uses itoa for integer formatting to avoid allocation in the hot path.

use crate::error::{RangeError, Result};
use std::io::{BufWriter, Write};

/// Buffer size for SetWriter (1MB default).
const DEFAULT_BUFFER_SIZE: usize = 1024 * 1024;

/// Tab-separated writer for set summaries.
///
/// A set line is `name<TAB>range_count<TAB>members`, where members are
/// comma-separated variant ids or `chrom:start-end` bp ranges.
pub struct SetWriter<W: Write> {
    writer: BufWriter<W>,
    itoa_buf: itoa::Buffer,
    first_member: bool,
}

impl<W: Write> SetWriter<W> {
    pub fn new(output: W) -> Self {
        Self::with_capacity(DEFAULT_BUFFER_SIZE, output)
    }

    pub fn with_capacity(capacity: usize, output: W) -> Self {
        Self {
            writer: BufWriter::with_capacity(capacity, output),
            itoa_buf: itoa::Buffer::new(),
            first_member: true,
        }
    }

    #[inline]
    fn put(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer.write_all(bytes).map_err(RangeError::Output)
    }

    #[inline]
    fn put_int<I: itoa::Integer>(&mut self, n: I) -> Result<()> {
        self.writer
            .write_all(self.itoa_buf.format(n).as_bytes())
            .map_err(RangeError::Output)
    }

    /// Start a set line with its name and range count.
    pub fn begin_set(&mut self, name: &[u8], range_count: usize) -> Result<()> {
        self.put(name)?;
        self.put(b"\t")?;
        self.put_int(range_count)?;
        self.put(b"\t")?;
        self.first_member = true;
        Ok(())
    }

    #[inline]
    fn separator(&mut self) -> Result<()> {
        if self.first_member {
            self.first_member = false;
            Ok(())
        } else {
            self.put(b",")
        }
    }

    /// Append a variant id to the current set line.
    pub fn write_member(&mut self, id: &[u8]) -> Result<()> {
        self.separator()?;
        self.put(id)
    }

    /// Append a bp range to the current set line.
    pub fn write_bp_range(&mut self, chrom: &[u8], start: u32, end: u32) -> Result<()> {
        self.separator()?;
        self.put(chrom)?;
        self.put(b":")?;
        self.put_int(start)?;
        self.put(b"-")?;
        self.put_int(end)
    }

    /// Finish the current set line. Sets without members get a `.`.
    pub fn end_set(&mut self) -> Result<()> {
        if self.first_member {
            self.put(b".")?;
        }
        self.put(b"\n")
    }

    /// Write a full line as-is with newline.
    pub fn write_line(&mut self, line: &[u8]) -> Result<()> {
        self.put(line)?;
        self.put(b"\n")
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().map_err(RangeError::Output)
    }
}
