//! First pass over an interval file: collect the distinct set names.
//!
//! Keys are gathered in scratch memory, sorted in natural order and copied,
//! deduplicated, into a fixed-width table charged to the persistent side of
//! the arena. The reader is rewound afterwards for the range pass.

use crate::arena::{Arena, Side};
use crate::config::{EmptyPolicy, LoadOptions, MAX_SET_ID_LEN};
use crate::error::{RangeError, Result};
use crate::natural::natural_cmp;
use crate::reader::{token_str, LineReader};
use crate::subset::SubsetFilter;
use crate::translate::{SetKeyBuilder, CHROM_PREFIX_LEN};
use crate::variants::ChromosomeContext;
use log::{debug, warn};
use memchr::memchr;
use std::cmp::Ordering;
use std::io::{BufRead, Seek};
use std::mem::size_of;
use std::ops::Range;

/// Sorted, unique set names stored at a fixed stride.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetNameTable {
    /// `len * width` bytes, each entry zero-padded to `width`
    data: Vec<u8>,
    width: usize,
    len: usize,
    literal_len: usize,
    chrom_prefixed: bool,
}

impl SetNameTable {
    /// Table with no sets.
    pub fn empty() -> Self {
        Self {
            data: Vec::new(),
            width: 0,
            len: 0,
            literal_len: 0,
            chrom_prefixed: false,
        }
    }

    /// Table for implicit single-set mode: one unnamed set.
    pub fn single() -> Self {
        Self {
            len: 1,
            ..Self::empty()
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Length of the longest stored name, prefixes included.
    #[inline]
    pub fn max_width(&self) -> usize {
        self.width
    }

    /// Whether entries carry a chromosome prefix (pure-interval mode).
    #[inline]
    pub fn is_chrom_prefixed(&self) -> bool {
        self.chrom_prefixed
    }

    /// Stored key of set `idx`, prefixes included.
    pub fn get(&self, idx: usize) -> &[u8] {
        if self.width == 0 {
            return &[];
        }
        let entry = &self.data[idx * self.width..(idx + 1) * self.width];
        &entry[..memchr(0, entry).unwrap_or(self.width)]
    }

    pub fn iter(&self) -> impl Iterator<Item = &[u8]> + '_ {
        (0..self.len).map(move |i| self.get(i))
    }

    /// Binary search for a stored key using natural order.
    pub fn find(&self, key: &[u8]) -> Option<usize> {
        let mut lo = 0;
        let mut hi = self.len;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            match natural_cmp(self.get(mid), key) {
                Ordering::Less => lo = mid + 1,
                Ordering::Greater => hi = mid,
                Ordering::Equal => return Some(mid),
            }
        }
        None
    }

    /// Set name with the literal and chromosome prefixes removed.
    pub fn display_name(&self, idx: usize) -> String {
        let prefix = self.literal_len + if self.chrom_prefixed { CHROM_PREFIX_LEN } else { 0 };
        let key = self.get(idx);
        token_str(&key[prefix.min(key.len())..])
    }

    /// Chromosome code encoded in a pure-interval key.
    pub fn chrom_code(&self, idx: usize) -> Option<u32> {
        if !self.chrom_prefixed {
            return None;
        }
        let prefix = self.get(idx).get(self.literal_len..self.literal_len + CHROM_PREFIX_LEN)?;
        let (digits, last) = prefix.split_at(CHROM_PREFIX_LEN - 1);
        let head = digits
            .iter()
            .fold(0u32, |n, &b| n * 10 + u32::from(b.wrapping_sub(b'0')));
        Some(head * 10 + u32::from(last[0].wrapping_sub(b'A')))
    }
}

/// Scan `reader` and build the name table for every set it references.
///
/// Lines whose id is not in `subset` are ignored. In pure-interval mode
/// (no positions in `ctx`) names are keyed per chromosome. On success the
/// reader is rewound.
pub fn register_set_names<R: BufRead + Seek>(
    reader: &mut LineReader<R>,
    ctx: &ChromosomeContext,
    subset: Option<&SubsetFilter>,
    opts: &LoadOptions,
    arena: &mut Arena,
) -> Result<SetNameTable> {
    let mut scratch = arena.scratch_scope();
    let chrom_prefixed = !ctx.is_indexed();
    let mut keys = SetKeyBuilder::new(opts.name_prefix, chrom_prefixed);

    let mut pool: Vec<u8> = Vec::new();
    let mut spans: Vec<Range<usize>> = Vec::new();

    while let Some(line) = reader.next_line()? {
        let mut fields = line.fields();
        let Some(chrom) = fields.next() else {
            continue;
        };
        let code = ctx.resolver().resolve(chrom).ok_or_else(|| {
            line.malformed(format!("Invalid chromosome code '{}'", token_str(chrom)))
        })?;

        let mut field_count = 1;
        let mut id = chrom;
        for field in fields {
            field_count += 1;
            id = field;
        }
        if field_count < 4 {
            return Err(line.malformed(format!(
                "Expected at least 4 fields (chrom, start, end, set id), got {}",
                field_count
            )));
        }
        if id.len() > MAX_SET_ID_LEN {
            return Err(line.malformed(format!(
                "Set id is longer than {} characters",
                MAX_SET_ID_LEN
            )));
        }
        if subset.is_some_and(|s| !s.contains(id)) {
            continue;
        }

        let key = keys.storage_key(code, id);
        if spans.last().is_some_and(|prev| &pool[prev.clone()] == key) {
            continue;
        }
        scratch.charge::<u8>(Side::Scratch, key.len() + size_of::<Range<usize>>())?;
        let start = pool.len();
        pool.extend_from_slice(key);
        spans.push(start..pool.len());
    }

    if spans.is_empty() {
        let message = match subset {
            Some(_) => format!("No set in {} matches the subset filter.", reader.role()),
            None => format!("No sets defined in {}.", reader.role()),
        };
        match opts.empty_policy {
            EmptyPolicy::Fail => return Err(RangeError::Inconsistent(message)),
            EmptyPolicy::Warn => {
                warn!("{}", message);
                reader.rewind()?;
                return Ok(SetNameTable::empty());
            }
        }
    }

    scratch.charge::<usize>(Side::Scratch, spans.len())?;
    let mut order: Vec<usize> = (0..spans.len()).collect();
    order.sort_unstable_by(|&a, &b| natural_cmp(&pool[spans[a].clone()], &pool[spans[b].clone()]));

    let literal = keys.literal();
    let width = literal.len() + spans.iter().map(|s| s.len()).max().unwrap_or(0);
    let block = scratch.alloc(Side::Persistent, spans.len() * width)?;

    let mut data: Vec<u8> = Vec::with_capacity(spans.len() * width);
    let mut len = 0;
    let mut prev: Option<&[u8]> = None;
    for &i in &order {
        let key = &pool[spans[i].clone()];
        if prev == Some(key) {
            continue;
        }
        prev = Some(key);
        let entry_start = data.len();
        data.extend_from_slice(literal);
        data.extend_from_slice(key);
        data.resize(entry_start + width, 0);
        len += 1;
    }
    scratch.shrink(block, len * width);

    debug!(
        "{}: {} distinct set(s) from {} key(s)",
        reader.role(),
        len,
        spans.len()
    );
    reader.rewind()?;

    Ok(SetNameTable {
        data,
        width,
        len,
        literal_len: literal.len(),
        chrom_prefixed,
    })
}
