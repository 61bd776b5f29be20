//! Second pass over an interval file: collect each set's ranges.

use crate::arena::{Arena, Side};
use crate::config::{LoadOptions, MAX_SET_ID_LEN};
use crate::error::{RangeError, Result};
use crate::reader::{parse_u32, token_str, LineReader};
use crate::registry::SetNameTable;
use crate::subset::SubsetFilter;
use crate::translate::{extend_border, SetKeyBuilder};
use crate::variants::ChromosomeContext;
use log::debug;
use std::io::{BufRead, Seek};

/// One half-open range: variant indices in indexed mode, 0-based bp in
/// pure-interval mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RangeRecord {
    pub start: u32,
    pub end: u32,
}

impl RangeRecord {
    #[inline]
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    #[inline]
    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// Range lists indexed by set ordinal, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetRangeTable {
    lists: Vec<Vec<RangeRecord>>,
}

impl SetRangeTable {
    pub fn new(set_count: usize) -> Self {
        Self {
            lists: vec![Vec::new(); set_count],
        }
    }

    /// Wrap prebuilt per-set lists.
    pub fn from_lists(lists: Vec<Vec<RangeRecord>>) -> Self {
        Self { lists }
    }

    /// Number of sets.
    #[inline]
    pub fn len(&self) -> usize {
        self.lists.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    #[inline]
    pub fn ranges(&self, set: usize) -> &[RangeRecord] {
        &self.lists[set]
    }

    pub fn iter(&self) -> impl Iterator<Item = &[RangeRecord]> + '_ {
        self.lists.iter().map(Vec::as_slice)
    }

    /// Largest per-set range count.
    pub fn max_range_count(&self) -> usize {
        self.lists.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Range count over all sets.
    pub fn total_ranges(&self) -> usize {
        self.lists.iter().map(Vec::len).sum()
    }

    fn push(&mut self, set: usize, record: RangeRecord) {
        self.lists[set].push(record);
    }
}

/// Read every interval line and attach its translated range to the owning
/// set. Record storage is charged to the scratch side of `arena`.
///
/// With `opts.track_sets` off every range goes to set 0 and `names` is not
/// consulted. Otherwise `names` must come from [`crate::registry::register_set_names`]
/// over the same file with the same context and subset.
pub fn accumulate_ranges<R: BufRead + Seek>(
    reader: &mut LineReader<R>,
    ctx: &ChromosomeContext,
    names: &SetNameTable,
    subset: Option<&SubsetFilter>,
    opts: &LoadOptions,
    arena: &mut Arena,
) -> Result<SetRangeTable> {
    let set_count = if opts.track_sets { names.len() } else { 1 };
    let mut table = SetRangeTable::new(set_count);
    if set_count == 0 {
        return Ok(table);
    }

    let mut keys = SetKeyBuilder::new(opts.name_prefix, names.is_chrom_prefixed());
    let min_fields = opts.min_fields();
    let mut lines = 0usize;

    while let Some(line) = reader.next_line()? {
        let mut fields = line.fields();
        let Some(chrom) = fields.next() else {
            continue;
        };
        let code = ctx.resolver().resolve(chrom).ok_or_else(|| {
            line.malformed(format!("Invalid chromosome code '{}'", token_str(chrom)))
        })?;

        let start_field = fields.next();
        let end_field = fields.next();
        let mut field_count = 1 + usize::from(start_field.is_some()) + usize::from(end_field.is_some());
        let mut last = end_field.unwrap_or(chrom);
        for field in fields {
            field_count += 1;
            last = field;
        }
        let (Some(start_field), Some(end_field)) = (start_field, end_field) else {
            return Err(line.malformed(format!(
                "Expected at least {} fields, got {}",
                min_fields, field_count
            )));
        };
        if field_count < min_fields {
            return Err(line.malformed(format!(
                "Expected at least {} fields, got {}",
                min_fields, field_count
            )));
        }

        if !ctx.is_active(code) {
            continue;
        }
        let Some(translator) = ctx.translator(code) else {
            continue;
        };
        if opts.track_sets {
            if last.len() > MAX_SET_ID_LEN {
                return Err(line.malformed(format!(
                    "Set id is longer than {} characters",
                    MAX_SET_ID_LEN
                )));
            }
            if subset.is_some_and(|s| !s.contains(last)) {
                continue;
            }
        }

        let raw_start = parse_u32(start_field).ok_or_else(|| {
            line.malformed(format!("Invalid range start '{}'", token_str(start_field)))
        })?;
        let raw_end = parse_u32(end_field).ok_or_else(|| {
            line.malformed(format!("Invalid range end '{}'", token_str(end_field)))
        })?;
        if raw_start > raw_end {
            return Err(line.malformed(format!(
                "Range start {} is greater than range end {}",
                raw_start, raw_end
            )));
        }
        let (start, end) = opts
            .convention
            .to_half_open(raw_start, raw_end)
            .ok_or_else(|| line.malformed("1-based range start must be positive"))?;
        let (start, end) = extend_border(start, end, opts.border_bp);

        let set = if opts.track_sets {
            let key = keys.lookup_key(code, last);
            names.find(key).ok_or_else(|| {
                RangeError::Inconsistent(format!(
                    "Set '{}' on line {} of {} is missing from the set name table",
                    token_str(last),
                    line.number,
                    line.role
                ))
            })?
        } else {
            0
        };

        let (first, past_last) = translator.translate(start, end)?;
        if first < past_last {
            arena.charge::<RangeRecord>(Side::Scratch, 1)?;
            table.push(set, RangeRecord::new(first, past_last));
        }
        lines += 1;
    }

    debug!(
        "{}: {} range line(s) kept, {} non-empty range(s) across {} set(s)",
        reader.role(),
        lines,
        table.total_ranges(),
        set_count
    );
    Ok(table)
}
