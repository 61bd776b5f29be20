// Clippy allows for the whole crate
#![allow(clippy::too_many_arguments)]

//! grit-sets: named genomic interval sets over a variant list
//!
//! This library loads interval files (`chrom start end [set_id]`) into named
//! sets of variant-index ranges, and applies interval files as include or
//! exclude filters on a variant inclusion bitset.
//!
//! # Features
//!
//! - **Two-pass loading**: set names are registered, sorted and deduplicated
//!   first, then ranges are attached to their set
//! - **Bounded memory**: every buffer is charged to a dual-ended [`Arena`];
//!   scratch memory is released when its scope ends, on success or error
//! - **Pure-interval mode**: without a variant list, sets are keyed per
//!   chromosome and keep bp coordinates
//!
//! # Example
//!
//! ```rust,no_run
//! use grit_sets::prelude::*;
//!
//! let mut bim = LineReader::from_path("data.bim", "variant file").unwrap();
//! let variants = VariantTable::from_bim(&mut bim, ChromResolver::default()).unwrap();
//!
//! let mut arena = Arena::default();
//! let opts = LoadOptions::new();
//! let load = load_ranges_from_path(&mut arena, "genes.txt", &variants.context, None, &opts)
//!     .unwrap();
//! for set in 0..load.set_count() {
//!     println!("{}: {} ranges", load.names().display_name(set), load.ranges().ranges(set).len());
//! }
//! ```

pub mod accumulate;
pub mod arena;
pub mod bitset;
pub mod chrom;
pub mod config;
pub mod error;
pub mod filter;
pub mod load;
pub mod materialize;
pub mod natural;
pub mod output;
pub mod reader;
pub mod registry;
pub mod subset;
pub mod translate;
pub mod variants;

// Re-export commonly used types
pub use arena::{Arena, Side};
pub use bitset::Bitset;
pub use config::{CoordinateConvention, EmptyPolicy, FilterMode, LoadOptions};
pub use error::{RangeError, Result};
pub use filter::{apply_filter, FilterReport};
pub use load::{load_ranges, RangeLoad};
pub use variants::{ChromosomeContext, VariantTable};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::accumulate::RangeRecord;
    pub use crate::arena::{Arena, Side};
    pub use crate::bitset::Bitset;
    pub use crate::chrom::ChromResolver;
    pub use crate::config::{CoordinateConvention, EmptyPolicy, FilterMode, LoadOptions};
    pub use crate::error::{RangeError, Result};
    pub use crate::filter::{apply_filter, apply_filter_paths, FilterReport};
    pub use crate::load::{load_ranges, load_ranges_from_path, RangeLoad};
    pub use crate::reader::LineReader;
    pub use crate::registry::SetNameTable;
    pub use crate::subset::SubsetFilter;
    pub use crate::variants::{ChromosomeContext, VariantTable};
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;
    use std::io::Cursor;

    fn reader(content: &str, role: &str) -> LineReader<Cursor<Vec<u8>>> {
        LineReader::new(Cursor::new(content.as_bytes().to_vec()), role)
    }

    const BIM: &str = "1 rs1 0 1501\n1 rs2 0 1801\n1 rs3 0 5501\n2 rs4 0 9001\n";

    #[test]
    fn test_basic_workflow() {
        let variants =
            VariantTable::from_bim(&mut reader(BIM, "variant file"), ChromResolver::default())
                .unwrap();
        let mut arena = Arena::with_capacity(1 << 20);
        let mut sets = reader(
            "chr1 1001 2000 geneA\nchr1 5001 6000 geneB\nchr2 1 100 geneC\n",
            "set file",
        );
        let load = load_ranges(&mut arena, &mut sets, &variants.context, None, &LoadOptions::new())
            .unwrap();

        assert_eq!(load.set_count(), 3);
        assert_eq!(load.ranges().ranges(0), &[RangeRecord::new(0, 2)]);
        assert_eq!(load.ranges().ranges(1), &[RangeRecord::new(2, 3)]);
        assert!(load.ranges().ranges(2).is_empty());
    }

    #[test]
    fn test_filter_workflow() {
        let variants =
            VariantTable::from_bim(&mut reader(BIM, "variant file"), ChromResolver::default())
                .unwrap();
        let mut arena = Arena::with_capacity(1 << 20);
        let mut include = Bitset::full(variants.len());
        let report = apply_filter(
            &mut arena,
            &mut [reader("1 1 2000\n", "--exclude range file")],
            &variants.context,
            FilterMode::Exclude,
            &mut include,
            variants.len(),
            &LoadOptions::new(),
        )
        .unwrap();

        assert_eq!(report.after, 2);
        let kept: Vec<&str> = include.iter_ones().map(|i| variants.ids[i].as_str()).collect();
        assert_eq!(kept, vec!["rs3", "rs4"]);
    }
}
