//! Dataset variant layout: per-chromosome index spans, sorted positions and
//! the active-chromosome mask.
//!
//! Variants are indexed in file order (uidx). Every chromosome occupies one
//! contiguous span of indices and positions are ascending within a span,
//! which is what lets a bp interval become an index range by binary search.

use crate::bitset::Bitset;
use crate::chrom::ChromResolver;
use crate::error::{RangeError, Result};
use crate::reader::{parse_u32, token_str, LineReader};
use crate::translate::Translator;
use std::io::{BufRead, Seek};
use std::ops::Range;

/// Read-only chromosome metadata consumed by the loaders.
#[derive(Debug, Clone)]
pub struct ChromosomeContext {
    resolver: ChromResolver,
    /// Variant index span per chromosome code
    spans: Vec<Option<Range<usize>>>,
    /// Active chromosome codes
    mask: Bitset,
    /// 0-based bp position per variant; `None` in pure-interval mode
    positions: Option<Vec<u32>>,
}

impl ChromosomeContext {
    /// Context without variant positions. Intervals stay in bp space and set
    /// names are disambiguated per chromosome.
    pub fn pure_interval(resolver: ChromResolver) -> Self {
        let code_count = resolver.code_count() as usize;
        Self {
            resolver,
            spans: vec![None; code_count],
            mask: Bitset::full(code_count),
            positions: None,
        }
    }

    /// Build from `(chromosome code, 0-based bp)` pairs in variant order.
    pub fn from_variants<I>(resolver: ChromResolver, variants: I) -> Result<Self>
    where
        I: IntoIterator<Item = (u32, u32)>,
    {
        let mut builder = ContextBuilder::new(resolver);
        for (code, pos) in variants {
            builder.push(code, pos).map_err(RangeError::Inconsistent)?;
        }
        Ok(builder.finish())
    }

    #[inline]
    pub fn resolver(&self) -> &ChromResolver {
        &self.resolver
    }

    /// Whether a genome-wide position array is available.
    #[inline]
    pub fn is_indexed(&self) -> bool {
        self.positions.is_some()
    }

    #[inline]
    pub fn positions(&self) -> Option<&[u32]> {
        self.positions.as_deref()
    }

    /// Total variant count (0 in pure-interval mode).
    pub fn variant_count(&self) -> usize {
        self.positions.as_ref().map_or(0, Vec::len)
    }

    /// Variant index span of a chromosome, if it has any variants.
    pub fn span(&self, code: u32) -> Option<Range<usize>> {
        self.spans.get(code as usize).cloned().flatten()
    }

    #[inline]
    pub fn is_active(&self, code: u32) -> bool {
        self.mask.get(code as usize)
    }

    /// Restrict processing to the given chromosome codes.
    pub fn with_active_only(mut self, codes: &[u32]) -> Self {
        self.mask = Bitset::new(self.mask.len());
        for &code in codes {
            if (code as usize) < self.mask.len() {
                self.mask.set(code as usize);
            }
        }
        self
    }

    /// Translator for one chromosome. `None` in indexed mode when the
    /// chromosome has no variants, so its lines can be skipped.
    pub fn translator(&self, code: u32) -> Option<Translator<'_>> {
        match &self.positions {
            None => Some(Translator::PureInterval),
            Some(positions) => {
                let span = self.span(code)?;
                Some(Translator::Indexed {
                    positions: &positions[span.clone()],
                    offset: span.start,
                })
            }
        }
    }
}

struct ContextBuilder {
    resolver: ChromResolver,
    spans: Vec<Option<Range<usize>>>,
    positions: Vec<u32>,
    current: Option<u32>,
}

impl ContextBuilder {
    fn new(resolver: ChromResolver) -> Self {
        let code_count = resolver.code_count() as usize;
        Self {
            resolver,
            spans: vec![None; code_count],
            positions: Vec::new(),
            current: None,
        }
    }

    fn push(&mut self, code: u32, pos: u32) -> std::result::Result<(), String> {
        let idx = self.positions.len();
        let slot = self
            .spans
            .get_mut(code as usize)
            .ok_or_else(|| format!("Chromosome code {} is out of range", code))?;
        if self.current == Some(code) {
            if let Some(span) = slot {
                if self.positions.last().is_some_and(|&last| pos < last) {
                    return Err(format!(
                        "Variants on chromosome {} are not sorted by position",
                        self.resolver.name(code)
                    ));
                }
                span.end = idx + 1;
            }
        } else {
            if slot.is_some() {
                return Err(format!(
                    "Variants on chromosome {} are not contiguous",
                    self.resolver.name(code)
                ));
            }
            *slot = Some(idx..idx + 1);
            self.current = Some(code);
        }
        self.positions.push(pos);
        Ok(())
    }

    fn finish(self) -> ChromosomeContext {
        let code_count = self.spans.len();
        ChromosomeContext {
            resolver: self.resolver,
            spans: self.spans,
            mask: Bitset::full(code_count),
            positions: Some(self.positions),
        }
    }
}

/// Variant ids together with their chromosome context.
#[derive(Debug, Clone)]
pub struct VariantTable {
    pub ids: Vec<String>,
    pub context: ChromosomeContext,
}

impl VariantTable {
    /// Load a PLINK-style variant listing (`chrom id cM bp ...`). The 1-based
    /// bp column is stored 0-based.
    pub fn from_bim<R: BufRead + Seek>(
        reader: &mut LineReader<R>,
        resolver: ChromResolver,
    ) -> Result<Self> {
        let mut builder = ContextBuilder::new(resolver);
        let mut ids = Vec::new();

        while let Some(line) = reader.next_line()? {
            if line.bytes.starts_with(b"#") {
                continue;
            }
            let mut fields = line.fields();
            let (Some(chrom), Some(id), Some(_cm), Some(bp)) =
                (fields.next(), fields.next(), fields.next(), fields.next())
            else {
                return Err(line.malformed("Expected at least 4 fields (chrom, id, cM, bp)"));
            };

            let code = builder.resolver.resolve(chrom).ok_or_else(|| {
                line.malformed(format!("Invalid chromosome code '{}'", token_str(chrom)))
            })?;
            let bp = parse_u32(bp)
                .ok_or_else(|| line.malformed(format!("Invalid bp position '{}'", token_str(bp))))?;

            builder
                .push(code, bp.saturating_sub(1))
                .map_err(|message| line.malformed(message))?;
            ids.push(token_str(id));
        }

        Ok(Self {
            ids,
            context: builder.finish(),
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
