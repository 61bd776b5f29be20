//! Allow-list of set names.

use crate::error::Result;
use crate::reader::LineReader;
use std::io::{BufRead, Seek};

/// Sorted, deduplicated set names. Lines whose set id is absent are dropped.
#[derive(Debug, Clone, Default)]
pub struct SubsetFilter {
    names: Vec<Vec<u8>>,
}

impl SubsetFilter {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        let mut names: Vec<Vec<u8>> = names.into_iter().map(|n| n.as_ref().to_vec()).collect();
        names.sort_unstable();
        names.dedup();
        Self { names }
    }

    /// Read whitespace-separated names.
    pub fn from_reader<R: BufRead + Seek>(reader: &mut LineReader<R>) -> Result<Self> {
        let mut names = Vec::new();
        while let Some(line) = reader.next_line()? {
            names.extend(line.fields().map(<[u8]>::to_vec));
        }
        Ok(Self::new(names))
    }

    #[inline]
    pub fn contains(&self, name: &[u8]) -> bool {
        self.names
            .binary_search_by(|probe| probe.as_slice().cmp(name))
            .is_ok()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
