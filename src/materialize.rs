//! Sorting and merging of per-set range lists.
//!
//! One scratch buffer, sized to the largest set, is shared by every merge.
//! Each range is packed into a single u64 (start in the high half, end in
//! the low half) so a plain integer sort orders by start, then end.

use crate::accumulate::{RangeRecord, SetRangeTable};
use crate::arena::{Arena, Side};
use crate::error::Result;

/// Reusable 64-bit slots for sort/merge.
#[derive(Debug)]
pub struct MergeBuffer {
    slots: Vec<u64>,
}

impl MergeBuffer {
    /// Allocate a buffer big enough for any set in `table`, charged to the
    /// scratch side.
    pub fn for_table(arena: &mut Arena, table: &SetRangeTable) -> Result<Self> {
        let mut slots = arena.alloc_words_zeroed(Side::Scratch, table.max_range_count())?;
        slots.clear();
        Ok(Self { slots })
    }

    /// Number of ranges the buffer holds without growing.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Sort `ranges` and merge overlapping or abutting ones. The result is
    /// ascending and pairwise disjoint.
    pub fn merge(&mut self, ranges: &[RangeRecord]) -> Vec<RangeRecord> {
        debug_assert!(ranges.len() <= self.capacity());
        self.slots.clear();
        self.slots
            .extend(ranges.iter().map(|r| (u64::from(r.start) << 32) | u64::from(r.end)));
        self.slots.sort_unstable();

        let mut merged: Vec<RangeRecord> = Vec::with_capacity(self.slots.len());
        for &packed in &self.slots {
            let range = RangeRecord::new((packed >> 32) as u32, packed as u32);
            match merged.last_mut() {
                Some(last) if range.start <= last.end => last.end = last.end.max(range.end),
                _ => merged.push(range),
            }
        }
        merged
    }
}
