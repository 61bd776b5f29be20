//! Dual-ended memory arena.
//!
//! One byte budget is consumed from two ends: the persistent side grows up
//! from zero and the scratch side grows down from the capacity. An allocation
//! fails when the two frontiers would cross. Nothing is freed individually;
//! memory comes back only by resetting a frontier to an earlier [`Mark`].
//!
//! Loading is a serial phase. The arena is passed around by `&mut`, so only
//! one load can charge it at a time, and it must not be shared with any
//! concurrent computation that runs afterwards.
//!
//! Scratch consumption should go through [`Arena::scratch_scope`]: the
//! returned guard rewinds the scratch frontier when dropped, including on
//! early `?` returns.

use crate::bitset::Bitset;
use crate::error::{RangeError, Result};
use std::fmt;
use std::mem::size_of;
use std::ops::{Deref, DerefMut};

/// Default arena capacity (256 MB).
pub const DEFAULT_ARENA_BYTES: usize = 256 * 1024 * 1024;

/// Which frontier an allocation is charged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Survives the load; grows upward.
    Persistent,
    /// Released when the current scratch scope ends; grows downward.
    Scratch,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Persistent => write!(f, "persistent"),
            Side::Scratch => write!(f, "scratch"),
        }
    }
}

/// A frontier position that can later be restored with [`Arena::reset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark {
    side: Side,
    offset: usize,
}

impl Mark {
    pub fn side(&self) -> Side {
        self.side
    }
}

/// A claimed byte range inside the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub side: Side,
    pub offset: usize,
    pub len: usize,
}

/// Dual-ended bump allocator.
#[derive(Debug)]
pub struct Arena {
    capacity: usize,
    persistent: usize,
    scratch: usize,
}

impl Default for Arena {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_ARENA_BYTES)
    }
}

impl Arena {
    /// Create an arena with the given byte budget.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            persistent: 0,
            scratch: capacity,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes still available between the two frontiers.
    #[inline]
    pub fn available(&self) -> usize {
        self.scratch - self.persistent
    }

    /// Bytes currently claimed on one side.
    #[inline]
    pub fn used(&self, side: Side) -> usize {
        match side {
            Side::Persistent => self.persistent,
            Side::Scratch => self.capacity - self.scratch,
        }
    }

    /// Claim `len` bytes from one side.
    pub fn alloc(&mut self, side: Side, len: usize) -> Result<Block> {
        let available = self.available();
        if len > available {
            return Err(RangeError::OutOfMemory {
                side,
                requested: len,
                available,
            });
        }
        let offset = match side {
            Side::Persistent => {
                let offset = self.persistent;
                self.persistent += len;
                offset
            }
            Side::Scratch => {
                self.scratch -= len;
                self.scratch
            }
        };
        Ok(Block { side, offset, len })
    }

    /// Claim room for `count` values of `T` without handing out a block.
    #[inline]
    pub fn charge<T>(&mut self, side: Side, count: usize) -> Result<()> {
        let bytes = count.checked_mul(size_of::<T>()).ok_or(RangeError::OutOfMemory {
            side,
            requested: usize::MAX,
            available: self.available(),
        })?;
        self.alloc(side, bytes).map(|_| ())
    }

    /// Claim room for `capacity` values of `T` and return an empty vector
    /// that can hold them without reallocating.
    pub fn alloc_vec<T>(&mut self, side: Side, capacity: usize) -> Result<Vec<T>> {
        self.charge::<T>(side, capacity)?;
        Ok(Vec::with_capacity(capacity))
    }

    /// Claim a zero-filled buffer of 64-bit words.
    pub fn alloc_words_zeroed(&mut self, side: Side, count: usize) -> Result<Vec<u64>> {
        self.charge::<u64>(side, count)?;
        Ok(vec![0; count])
    }

    /// Claim an all-clear bit-vector of `len` bits.
    pub fn alloc_bitset(&mut self, side: Side, len: usize) -> Result<Bitset> {
        let words = self.alloc_words_zeroed(side, Bitset::word_count(len))?;
        Ok(Bitset::from_words(words, len))
    }

    /// Trim the most recent allocation on a side down to `new_len` bytes.
    ///
    /// Returns the trimmed block. Blocks that are not at the frontier, or
    /// growth requests, are returned unchanged.
    pub fn shrink(&mut self, block: Block, new_len: usize) -> Block {
        if new_len >= block.len {
            return block;
        }
        match block.side {
            Side::Persistent if block.offset + block.len == self.persistent => {
                self.persistent = block.offset + new_len;
                Block {
                    len: new_len,
                    ..block
                }
            }
            Side::Scratch if block.offset == self.scratch => {
                let freed = block.len - new_len;
                self.scratch += freed;
                Block {
                    side: Side::Scratch,
                    offset: block.offset + freed,
                    len: new_len,
                }
            }
            _ => block,
        }
    }

    /// Current frontier of a side.
    #[inline]
    pub fn mark(&self, side: Side) -> Mark {
        let offset = match side {
            Side::Persistent => self.persistent,
            Side::Scratch => self.scratch,
        };
        Mark { side, offset }
    }

    /// Rewind a frontier to an earlier mark. Marks that lie ahead of the
    /// current frontier are ignored.
    pub fn reset(&mut self, mark: Mark) {
        match mark.side {
            Side::Persistent => {
                if mark.offset <= self.persistent {
                    self.persistent = mark.offset;
                }
            }
            Side::Scratch => {
                if mark.offset >= self.scratch {
                    self.scratch = mark.offset;
                }
            }
        }
    }

    /// Open a scratch scope. Everything charged to the scratch side while the
    /// guard lives is released when it drops.
    pub fn scratch_scope(&mut self) -> ScratchScope<'_> {
        let mark = self.mark(Side::Scratch);
        ScratchScope { arena: self, mark }
    }
}

/// Guard that rewinds the scratch frontier on drop.
#[derive(Debug)]
pub struct ScratchScope<'a> {
    arena: &'a mut Arena,
    mark: Mark,
}

impl ScratchScope<'_> {
    /// Scratch bytes claimed inside this scope so far.
    pub fn scope_used(&self) -> usize {
        self.mark.offset - self.arena.scratch
    }
}

impl Deref for ScratchScope<'_> {
    type Target = Arena;

    fn deref(&self) -> &Arena {
        self.arena
    }
}

impl DerefMut for ScratchScope<'_> {
    fn deref_mut(&mut self) -> &mut Arena {
        self.arena
    }
}

impl Drop for ScratchScope<'_> {
    fn drop(&mut self) {
        self.arena.reset(self.mark);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frontiers_grow_towards_each_other() {
        let mut arena = Arena::with_capacity(100);
        let p = arena.alloc(Side::Persistent, 30).unwrap();
        let s = arena.alloc(Side::Scratch, 20).unwrap();

        assert_eq!(p.offset, 0);
        assert_eq!(s.offset, 80);
        assert_eq!(arena.available(), 50);
        assert_eq!(arena.used(Side::Persistent), 30);
        assert_eq!(arena.used(Side::Scratch), 20);
    }

    #[test]
    fn test_alloc_fails_when_frontiers_cross() {
        let mut arena = Arena::with_capacity(64);
        arena.alloc(Side::Persistent, 40).unwrap();
        let err = arena.alloc(Side::Scratch, 25).unwrap_err();

        match err {
            RangeError::OutOfMemory {
                side,
                requested,
                available,
            } => {
                assert_eq!(side, Side::Scratch);
                assert_eq!(requested, 25);
                assert_eq!(available, 24);
            }
            other => panic!("unexpected error: {other}"),
        }
        // A failed allocation claims nothing
        assert_eq!(arena.available(), 24);
    }

    #[test]
    fn test_mark_and_reset() {
        let mut arena = Arena::with_capacity(100);
        let mark = arena.mark(Side::Persistent);
        arena.alloc(Side::Persistent, 10).unwrap();
        arena.alloc(Side::Persistent, 10).unwrap();
        arena.reset(mark);
        assert_eq!(arena.used(Side::Persistent), 0);

        let mark = arena.mark(Side::Scratch);
        arena.alloc(Side::Scratch, 40).unwrap();
        arena.reset(mark);
        assert_eq!(arena.used(Side::Scratch), 0);
    }

    #[test]
    fn test_scratch_scope_releases_on_drop() {
        let mut arena = Arena::with_capacity(1000);
        arena.alloc(Side::Persistent, 100).unwrap();
        {
            let mut scope = arena.scratch_scope();
            scope.alloc(Side::Scratch, 300).unwrap();
            scope.alloc(Side::Persistent, 50).unwrap();
            assert_eq!(scope.scope_used(), 300);
        }
        assert_eq!(arena.used(Side::Scratch), 0);
        // Persistent allocations outlive the scope
        assert_eq!(arena.used(Side::Persistent), 150);
    }

    #[test]
    fn test_scratch_scope_releases_on_error_path() {
        fn failing(arena: &mut Arena) -> Result<()> {
            let mut scope = arena.scratch_scope();
            scope.alloc(Side::Scratch, 60)?;
            scope.alloc(Side::Scratch, 60)?;
            Ok(())
        }

        let mut arena = Arena::with_capacity(100);
        assert!(failing(&mut arena).is_err());
        assert_eq!(arena.available(), 100);
    }

    #[test]
    fn test_shrink_persistent_frontier() {
        let mut arena = Arena::with_capacity(100);
        let block = arena.alloc(Side::Persistent, 40).unwrap();
        let block = arena.shrink(block, 12);
        assert_eq!(block.len, 12);
        assert_eq!(arena.used(Side::Persistent), 12);

        // Not at the frontier any more: unchanged
        arena.alloc(Side::Persistent, 8).unwrap();
        let same = arena.shrink(block, 4);
        assert_eq!(same, block);
        assert_eq!(arena.used(Side::Persistent), 20);
    }

    #[test]
    fn test_alloc_bitset_is_zeroed_and_charged() {
        let mut arena = Arena::with_capacity(1024);
        let bits = arena.alloc_bitset(Side::Scratch, 130).unwrap();
        assert_eq!(bits.len(), 130);
        assert_eq!(bits.count_ones(), 0);
        assert_eq!(arena.used(Side::Scratch), 3 * 8);
    }

    #[test]
    fn test_alloc_vec_charges_capacity() {
        let mut arena = Arena::with_capacity(64);
        let v: Vec<u64> = arena.alloc_vec(Side::Scratch, 4).unwrap();
        assert!(v.capacity() >= 4);
        assert_eq!(arena.used(Side::Scratch), 32);
        assert!(arena.alloc_vec::<u64>(Side::Scratch, 5).is_err());
    }
}
