//! Interval translation and set-key construction.
//!
//! In indexed mode a bp interval becomes a half-open range of variant
//! indices by binary search over the chromosome's sorted positions. In
//! pure-interval mode the bp interval is kept as is, and set names are
//! prefixed with the chromosome code so identically named features on
//! different chromosomes stay apart.

use crate::chrom::MAX_CHROM_CODE;
use crate::error::{RangeError, Result};

/// Width of the chromosome prefix in pure-interval set keys.
pub const CHROM_PREFIX_LEN: usize = 5;

/// Widen `[start, end)` by `border` bases on both sides, clipped to the u32
/// coordinate space.
#[inline]
pub fn extend_border(start: u32, end: u32, border: u32) -> (u32, u32) {
    (start.saturating_sub(border), end.saturating_add(border))
}

/// Per-chromosome translation from bp space to output range space.
#[derive(Debug, Clone, Copy)]
pub enum Translator<'a> {
    /// Positions of this chromosome's variants; `offset` is the uidx of the first one.
    Indexed { positions: &'a [u32], offset: usize },
    /// Keep bp coordinates.
    PureInterval,
}

impl Translator<'_> {
    /// Translate a half-open bp interval. The result may be empty.
    ///
    /// Variant indices are u32; an index past `u32::MAX` is Inconsistent.
    #[inline]
    pub fn translate(&self, start: u32, end: u32) -> Result<(u32, u32)> {
        match *self {
            Translator::Indexed { positions, offset } => {
                let first = positions.partition_point(|&pos| pos < start);
                let last = positions.partition_point(|&pos| pos < end);
                Ok((to_index(offset + first)?, to_index(offset + last.max(first))?))
            }
            Translator::PureInterval => Ok((start, end)),
        }
    }
}

fn to_index(uidx: usize) -> Result<u32> {
    u32::try_from(uidx).map_err(|_| {
        RangeError::Inconsistent(format!(
            "Variant index {} exceeds the supported maximum of {}",
            uidx,
            u32::MAX
        ))
    })
}

/// Write the 5-character chromosome prefix for `code`.
///
/// The code is zero-padded to five digits and the final digit is shifted
/// into `A..=J`, so a set name that starts with a digit cannot fuse with the
/// chromosome digits under natural ordering.
pub fn write_chrom_prefix(buf: &mut Vec<u8>, code: u32) {
    debug_assert!(code <= MAX_CHROM_CODE);
    let mut digits = itoa::Buffer::new();
    let digits = digits.format(code.min(MAX_CHROM_CODE)).as_bytes();
    let start = buf.len();
    buf.resize(start + CHROM_PREFIX_LEN - digits.len(), b'0');
    buf.extend_from_slice(digits);
    buf[start + CHROM_PREFIX_LEN - 1] += b'A' - b'0';
}

/// Builds set keys in a reusable buffer, the same way on both passes.
pub struct SetKeyBuilder {
    literal: Vec<u8>,
    chrom_prefixed: bool,
    buf: Vec<u8>,
}

impl SetKeyBuilder {
    pub fn new(literal: Option<[u8; 2]>, chrom_prefixed: bool) -> Self {
        Self {
            literal: literal.map(|l| l.to_vec()).unwrap_or_default(),
            chrom_prefixed,
            buf: Vec::with_capacity(64),
        }
    }

    /// Length of all prefixes in front of the raw id.
    #[inline]
    pub fn prefix_len(&self) -> usize {
        self.literal.len() + self.chrom_prefix_len()
    }

    #[inline]
    pub fn chrom_prefix_len(&self) -> usize {
        if self.chrom_prefixed {
            CHROM_PREFIX_LEN
        } else {
            0
        }
    }

    #[inline]
    pub fn literal(&self) -> &[u8] {
        &self.literal
    }

    /// Key as collected by the registry: chromosome prefix (if any) and id.
    pub fn storage_key(&mut self, code: u32, id: &[u8]) -> &[u8] {
        self.buf.clear();
        self.push_chrom_and_id(code, id);
        &self.buf
    }

    /// Key as stored in the final name table: literal prefix, chromosome
    /// prefix (if any) and id.
    pub fn lookup_key(&mut self, code: u32, id: &[u8]) -> &[u8] {
        self.buf.clear();
        self.buf.extend_from_slice(&self.literal);
        self.push_chrom_and_id(code, id);
        &self.buf
    }

    fn push_chrom_and_id(&mut self, code: u32, id: &[u8]) {
        if self.chrom_prefixed {
            write_chrom_prefix(&mut self.buf, code);
        }
        self.buf.extend_from_slice(id);
    }
}
