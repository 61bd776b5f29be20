//! Loading named interval sets: name pass, range pass, and queries over the
//! result.
//!
//! The ranges of a [`RangeLoad`] are charged to a scratch scope of the arena
//! that is held for as long as the load lives. Dropping the load (or calling
//! [`RangeLoad::into_names`]) rewinds the scratch side; the name table stays
//! on the persistent side. A failed load rewinds both sides.

use crate::accumulate::{accumulate_ranges, RangeRecord, SetRangeTable};
use crate::arena::{Arena, ScratchScope, Side};
use crate::bitset::Bitset;
use crate::config::LoadOptions;
use crate::error::{RangeError, Result};
use crate::materialize::MergeBuffer;
use crate::reader::LineReader;
use crate::registry::{register_set_names, SetNameTable};
use crate::subset::SubsetFilter;
use crate::variants::ChromosomeContext;
use log::info;
use std::io::{BufRead, Seek};
use std::path::Path;

/// Named sets and their ranges.
#[derive(Debug)]
pub struct RangeLoad<'a> {
    scope: ScratchScope<'a>,
    names: SetNameTable,
    ranges: SetRangeTable,
    merge: Option<MergeBuffer>,
    indexed: bool,
}

/// The merge buffer of a load, allocated on first use.
fn cached_merge_buffer<'b>(
    slot: &'b mut Option<MergeBuffer>,
    arena: &mut Arena,
    ranges: &SetRangeTable,
) -> Result<&'b mut MergeBuffer> {
    let buffer = match slot.take() {
        Some(buffer) => buffer,
        None => MergeBuffer::for_table(arena, ranges)?,
    };
    Ok(slot.insert(buffer))
}

impl<'a> RangeLoad<'a> {
    #[inline]
    pub fn set_count(&self) -> usize {
        self.ranges.len()
    }

    #[inline]
    pub fn names(&self) -> &SetNameTable {
        &self.names
    }

    #[inline]
    pub fn ranges(&self) -> &SetRangeTable {
        &self.ranges
    }

    #[inline]
    pub fn max_set_name_width(&self) -> usize {
        self.names.max_width()
    }

    /// Whether ranges are variant indices (`true`) or bp coordinates.
    #[inline]
    pub fn is_indexed(&self) -> bool {
        self.indexed
    }

    /// Scratch buffer sized for the largest set, charged to this load's scope
    /// once and reused by later calls.
    pub fn merge_buffer(&mut self) -> Result<&mut MergeBuffer> {
        cached_merge_buffer(&mut self.merge, &mut self.scope, &self.ranges)
    }

    /// Sorted, disjoint ranges of every set.
    pub fn merged_ranges(&mut self) -> Result<Vec<Vec<RangeRecord>>> {
        let buffer = cached_merge_buffer(&mut self.merge, &mut self.scope, &self.ranges)?;
        Ok(self.ranges.iter().map(|r| buffer.merge(r)).collect())
    }

    /// Variants covered by one set. `None` in pure-interval mode.
    pub fn set_members(&self, set: usize, variant_count: usize) -> Option<Bitset> {
        if !self.indexed {
            return None;
        }
        let mut members = Bitset::new(variant_count);
        for range in self.ranges.ranges(set) {
            members.set_range(range.start as usize, range.end as usize);
        }
        Some(members)
    }

    /// Sets whose ranges contain variant `uidx` (indexed mode).
    pub fn sets_containing_variant(&self, uidx: u32) -> Vec<usize> {
        if !self.indexed {
            return Vec::new();
        }
        self.covering_sets(uidx, |_| true)
    }

    /// Sets whose ranges contain 0-based position `bp` on chromosome `code`
    /// (pure-interval mode).
    pub fn sets_containing_bp(&self, code: u32, bp: u32) -> Vec<usize> {
        if self.indexed {
            return Vec::new();
        }
        self.covering_sets(bp, |set| self.names.chrom_code(set) == Some(code))
    }

    fn covering_sets(&self, point: u32, keep: impl Fn(usize) -> bool) -> Vec<usize> {
        self.ranges
            .iter()
            .enumerate()
            .filter(|&(set, ranges)| {
                keep(set) && ranges.iter().any(|r| r.start <= point && point < r.end)
            })
            .map(|(set, _)| set)
            .collect()
    }

    /// Release the ranges and their scratch memory, keeping the name table.
    pub fn into_names(self) -> SetNameTable {
        self.names
    }
}

/// Load named interval sets from `reader`.
///
/// With `opts.track_sets` the file is read twice: once for set names (see
/// [`register_set_names`]) and once for ranges. Otherwise there is a single
/// unnamed set and one pass; that mode needs variant positions, since bp
/// ranges from different chromosomes cannot share one set.
///
/// On error the arena is left as it was before the call.
pub fn load_ranges<'a, R: BufRead + Seek>(
    arena: &'a mut Arena,
    reader: &mut LineReader<R>,
    ctx: &ChromosomeContext,
    subset: Option<&SubsetFilter>,
    opts: &LoadOptions,
) -> Result<RangeLoad<'a>> {
    if !opts.track_sets && !ctx.is_indexed() {
        return Err(RangeError::Inconsistent(format!(
            "{}: loading without set ids requires variant positions.",
            reader.role()
        )));
    }

    let persistent = arena.mark(Side::Persistent);
    let names = if opts.track_sets {
        match register_set_names(reader, ctx, subset, opts, arena) {
            Ok(names) => names,
            Err(e) => {
                arena.reset(persistent);
                return Err(e);
            }
        }
    } else {
        SetNameTable::single()
    };

    let mut scope = arena.scratch_scope();
    let ranges = match accumulate_ranges(reader, ctx, &names, subset, opts, &mut scope) {
        Ok(ranges) => ranges,
        Err(e) => {
            scope.reset(persistent);
            return Err(e);
        }
    };

    info!(
        "{}: {} set(s), {} range(s) loaded",
        reader.role(),
        ranges.len(),
        ranges.total_ranges()
    );

    Ok(RangeLoad {
        scope,
        names,
        ranges,
        merge: None,
        indexed: ctx.is_indexed(),
    })
}

/// Open `path` and [`load_ranges`] from it, using `opts.role` in messages.
pub fn load_ranges_from_path<'a, P: AsRef<Path>>(
    arena: &'a mut Arena,
    path: P,
    ctx: &ChromosomeContext,
    subset: Option<&SubsetFilter>,
    opts: &LoadOptions,
) -> Result<RangeLoad<'a>> {
    let mut reader = LineReader::from_path(path, opts.role.clone())?;
    load_ranges(arena, &mut reader, ctx, subset, opts)
}
