//! Range-based variant filtering.
//!
//! Exclude mode clears every covered variant from the inclusion vector.
//! Include mode collects the union of all files' ranges in a scratch vector
//! and intersects it into the inclusion vector, so a variant survives only if
//! it was already included and some file covers it.

use crate::accumulate::accumulate_ranges;
use crate::arena::{Arena, Side};
use crate::bitset::Bitset;
use crate::config::{EmptyPolicy, FilterMode, LoadOptions};
use crate::error::{RangeError, Result};
use crate::reader::LineReader;
use crate::registry::SetNameTable;
use crate::variants::ChromosomeContext;
use log::{debug, info, warn};
use std::fmt;
use std::io::{BufRead, Seek};
use std::path::Path;

/// Outcome of a filter pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterReport {
    pub mode: FilterMode,
    /// Included variants before the filter
    pub before: usize,
    /// Included variants after the filter
    pub after: usize,
}

impl FilterReport {
    #[inline]
    pub fn removed(&self) -> usize {
        self.before.saturating_sub(self.after)
    }

    #[inline]
    pub fn is_unchanged(&self) -> bool {
        self.before == self.after
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

impl fmt::Display for FilterReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mode {
            FilterMode::Exclude if self.is_unchanged() => {
                write!(f, "{}: no variants excluded.", self.mode)
            }
            FilterMode::Exclude => write!(
                f,
                "{}: {} variant{} excluded.",
                self.mode,
                self.removed(),
                plural(self.removed())
            ),
            FilterMode::Include if self.is_unchanged() => write!(
                f,
                "{}: all {} variant{} remaining.",
                self.mode,
                self.after,
                plural(self.after)
            ),
            FilterMode::Include => write!(
                f,
                "{}: {} variant{} remaining.",
                self.mode,
                self.after,
                plural(self.after)
            ),
        }
    }
}

/// Apply the ranges of every reader to `include`.
///
/// `variant_count` is the caller's current count of included variants; the
/// returned report carries the new count. A count that disagrees with
/// `include` is replaced by the vector's popcount. Set ids are ignored and only
/// `convention`, `border_bp`, `empty_policy` of `opts` apply.
pub fn apply_filter<R: BufRead + Seek>(
    arena: &mut Arena,
    readers: &mut [LineReader<R>],
    ctx: &ChromosomeContext,
    mode: FilterMode,
    include: &mut Bitset,
    variant_count: usize,
    opts: &LoadOptions,
) -> Result<FilterReport> {
    if !ctx.is_indexed() {
        return Err(RangeError::Inconsistent(format!(
            "{} requires variant positions.",
            mode
        )));
    }
    let before = include.count_ones();
    if before != variant_count {
        debug!(
            "{}: caller count {} differs from {} included variants",
            mode, variant_count, before
        );
    }

    let opts = opts.clone().with_track_sets(false);
    let single = SetNameTable::single();
    let mut scope = arena.scratch_scope();
    let mut covered = match mode {
        FilterMode::Include => Some(scope.alloc_bitset(Side::Scratch, include.len())?),
        FilterMode::Exclude => None,
    };

    for reader in readers.iter_mut() {
        let mut file_scope = scope.scratch_scope();
        let ranges = accumulate_ranges(reader, ctx, &single, None, &opts, &mut file_scope)?;
        for range in ranges.ranges(0) {
            let (start, end) = (range.start as usize, range.end as usize);
            match covered.as_mut() {
                Some(union) => union.set_range(start, end),
                None => include.clear_range(start, end),
            }
        }
    }
    if let Some(union) = &covered {
        include.and_assign(union);
    }

    let report = FilterReport {
        mode,
        before,
        after: include.count_ones(),
    };
    if report.after == 0 && report.before > 0 {
        let message = format!("No variants remaining after {}.", mode);
        match opts.empty_policy {
            EmptyPolicy::Fail => return Err(RangeError::Inconsistent(message)),
            EmptyPolicy::Warn => warn!("{}", message),
        }
    }
    info!("{}", report);
    Ok(report)
}

/// Open every path and [`apply_filter`] over them.
pub fn apply_filter_paths<P: AsRef<Path>>(
    arena: &mut Arena,
    paths: &[P],
    ctx: &ChromosomeContext,
    mode: FilterMode,
    include: &mut Bitset,
    variant_count: usize,
    opts: &LoadOptions,
) -> Result<FilterReport> {
    let role = format!("{} file", mode);
    let mut readers = paths
        .iter()
        .map(|p| LineReader::from_path(p, role.clone()))
        .collect::<Result<Vec<_>>>()?;
    apply_filter(arena, &mut readers, ctx, mode, include, variant_count, opts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chrom::ChromResolver;
    use crate::config::CoordinateConvention;
    use std::io::Cursor;

    fn ten_variants() -> ChromosomeContext {
        ChromosomeContext::from_variants(
            ChromResolver::default(),
            (0..10).map(|i| (1, 100 * (i + 1))),
        )
        .unwrap()
    }

    fn readers(contents: &[&str]) -> Vec<LineReader<Cursor<Vec<u8>>>> {
        contents
            .iter()
            .map(|c| LineReader::new(Cursor::new(c.as_bytes().to_vec()), "range file"))
            .collect()
    }

    fn ibed0() -> LoadOptions {
        LoadOptions::new().with_convention(CoordinateConvention::Ibed0)
    }

    #[test]
    fn test_exclude_three_of_ten() {
        let ctx = ten_variants();
        let mut arena = Arena::with_capacity(1 << 20);
        let mut include = Bitset::full(10);
        // Positions 300, 400, 500 are variants 2..5
        let report = apply_filter(
            &mut arena,
            &mut readers(&["1 300 501\n"]),
            &ctx,
            FilterMode::Exclude,
            &mut include,
            10,
            &ibed0(),
        )
        .unwrap();

        assert_eq!(report.after, 7);
        assert_eq!(report.removed(), 3);
        assert_eq!(report.to_string(), "--exclude range: 3 variants excluded.");
        assert!(!include.get(2) && !include.get(4) && include.get(5));
        assert_eq!(arena.used(Side::Scratch), 0);
    }

    #[test]
    fn test_exclude_is_idempotent() {
        let ctx = ten_variants();
        let mut arena = Arena::with_capacity(1 << 20);
        let mut once = Bitset::full(10);
        apply_filter(&mut arena, &mut readers(&["1 150 450\n"]), &ctx, FilterMode::Exclude, &mut once, 10, &ibed0())
            .unwrap();

        let mut twice = Bitset::full(10);
        let first = apply_filter(
            &mut arena,
            &mut readers(&["1 150 450\n"]),
            &ctx,
            FilterMode::Exclude,
            &mut twice,
            10,
            &ibed0(),
        )
        .unwrap();
        let second = apply_filter(
            &mut arena,
            &mut readers(&["1 150 450\n"]),
            &ctx,
            FilterMode::Exclude,
            &mut twice,
            first.after,
            &ibed0(),
        )
        .unwrap();

        assert_eq!(once, twice);
        assert!(second.is_unchanged());
        assert_eq!(second.to_string(), "--exclude range: no variants excluded.");
    }

    #[test]
    fn test_include_union_across_files() {
        let ctx = ten_variants();
        let mut arena = Arena::with_capacity(1 << 20);
        let mut include = Bitset::full(10);
        let report = apply_filter(
            &mut arena,
            &mut readers(&["1 0 550\n", "1 550 2000\n"]),
            &ctx,
            FilterMode::Include,
            &mut include,
            10,
            &ibed0(),
        )
        .unwrap();

        assert!(report.is_unchanged());
        assert_eq!(include, Bitset::full(10));
    }

    #[test]
    fn test_include_intersects_with_existing() {
        let ctx = ten_variants();
        let mut arena = Arena::with_capacity(1 << 20);
        let mut include = Bitset::full(10);
        include.clear(0);
        let report = apply_filter(
            &mut arena,
            &mut readers(&["1 1 250\n"]),
            &ctx,
            FilterMode::Include,
            &mut include,
            9,
            &ibed0(),
        )
        .unwrap();

        assert_eq!(report.after, 1);
        assert_eq!(include.iter_ones().collect::<Vec<_>>(), vec![1]);
        assert_eq!(report.to_string(), "--extract range: 1 variant remaining.");
    }

    #[test]
    fn test_include_nothing_fails_by_default() {
        let ctx = ten_variants();
        let mut arena = Arena::with_capacity(1 << 20);
        let mut include = Bitset::full(10);
        let err = apply_filter(
            &mut arena,
            &mut readers(&["2 1 250\n"]),
            &ctx,
            FilterMode::Include,
            &mut include,
            10,
            &ibed0(),
        )
        .unwrap_err();
        assert!(matches!(err, RangeError::Inconsistent(_)));
        assert_eq!(arena.used(Side::Scratch), 0);

        let mut include = Bitset::full(10);
        let report = apply_filter(
            &mut arena,
            &mut readers(&["2 1 250\n"]),
            &ctx,
            FilterMode::Include,
            &mut include,
            10,
            &ibed0().with_empty_policy(EmptyPolicy::Warn),
        )
        .unwrap();
        assert_eq!(report.after, 0);
    }

    #[test]
    fn test_stale_count_uses_popcount() {
        let ctx = ten_variants();
        let mut arena = Arena::with_capacity(1 << 20);
        let mut include = Bitset::full(10);
        include.clear_range(0, 8);
        let report = apply_filter(
            &mut arena,
            &mut readers(&["1 0 2000\n"]),
            &ctx,
            FilterMode::Exclude,
            &mut include,
            0,
            &ibed0().with_empty_policy(EmptyPolicy::Warn),
        )
        .unwrap();
        assert_eq!(report.before, 2);
        assert_eq!(report.removed(), 2);

        let report = FilterReport {
            mode: FilterMode::Exclude,
            before: 1,
            after: 3,
        };
        assert_eq!(report.removed(), 0);
    }

    #[test]
    fn test_pure_interval_context_rejected() {
        let ctx = ChromosomeContext::pure_interval(ChromResolver::default());
        let mut arena = Arena::with_capacity(1024);
        let mut include = Bitset::new(0);
        let err = apply_filter(
            &mut arena,
            &mut readers(&["1 1 2\n"]),
            &ctx,
            FilterMode::Exclude,
            &mut include,
            0,
            &ibed0(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("requires variant positions"));
    }
}
