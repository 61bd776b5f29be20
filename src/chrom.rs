//! Chromosome code vocabulary.
//!
//! Codes are laid out as `0` (unplaced), `1..=autosomes`, then X, Y, XY and
//! MT, then any user-declared extra names in declaration order.

use rustc_hash::FxHashMap;

/// Default human autosome count.
pub const HUMAN_AUTOSOMES: u32 = 22;

/// Largest chromosome code; set keys reserve five digits for it.
pub const MAX_CHROM_CODE: u32 = 99_999;

/// Resolves chromosome tokens to numeric codes.
#[derive(Debug, Clone)]
pub struct ChromResolver {
    autosomes: u32,
    extra_codes: FxHashMap<String, u32>,
    extra_names: Vec<String>,
}

impl Default for ChromResolver {
    fn default() -> Self {
        Self::new(HUMAN_AUTOSOMES)
    }
}

impl ChromResolver {
    /// Resolver for a genome with `autosomes` numbered autosomes.
    pub fn new(autosomes: u32) -> Self {
        Self {
            autosomes,
            extra_codes: FxHashMap::default(),
            extra_names: Vec::new(),
        }
    }

    #[inline]
    pub fn x_code(&self) -> u32 {
        self.autosomes + 1
    }

    #[inline]
    pub fn y_code(&self) -> u32 {
        self.autosomes + 2
    }

    #[inline]
    pub fn xy_code(&self) -> u32 {
        self.autosomes + 3
    }

    #[inline]
    pub fn mt_code(&self) -> u32 {
        self.autosomes + 4
    }

    /// One past the largest valid code.
    #[inline]
    pub fn code_count(&self) -> u32 {
        self.autosomes + 5 + self.extra_names.len() as u32
    }

    /// Declare an extra chromosome name (contig, scaffold). Returns its code;
    /// declaring a name twice returns the existing code. `None` once the code
    /// space is exhausted.
    pub fn add_extra(&mut self, name: &str) -> Option<u32> {
        if let Some(&code) = self.extra_codes.get(name) {
            return Some(code);
        }
        let code = self.code_count();
        if code > MAX_CHROM_CODE {
            return None;
        }
        self.extra_codes.insert(name.to_string(), code);
        self.extra_names.push(name.to_string());
        Some(code)
    }

    /// Resolve a chromosome token.
    pub fn resolve(&self, token: &[u8]) -> Option<u32> {
        if let Some(&code) = std::str::from_utf8(token)
            .ok()
            .and_then(|name| self.extra_codes.get(name))
        {
            return Some(code);
        }

        let bare = strip_chr_prefix(token);
        if bare.is_empty() {
            return None;
        }
        if bare.iter().all(u8::is_ascii_digit) {
            if bare.len() > 4 {
                return None;
            }
            let code = bare
                .iter()
                .fold(0u32, |n, &b| n * 10 + u32::from(b - b'0'));
            return (code <= self.mt_code()).then_some(code);
        }
        if bare.eq_ignore_ascii_case(b"X") {
            Some(self.x_code())
        } else if bare.eq_ignore_ascii_case(b"Y") {
            Some(self.y_code())
        } else if bare.eq_ignore_ascii_case(b"XY") {
            Some(self.xy_code())
        } else if bare.eq_ignore_ascii_case(b"MT") || bare.eq_ignore_ascii_case(b"M") {
            Some(self.mt_code())
        } else {
            None
        }
    }

    /// Display name of a code.
    pub fn name(&self, code: u32) -> String {
        if code <= self.autosomes {
            return code.to_string();
        }
        match code - self.autosomes {
            1 => "X".to_string(),
            2 => "Y".to_string(),
            3 => "XY".to_string(),
            4 => "MT".to_string(),
            n => self
                .extra_names
                .get((n - 5) as usize)
                .cloned()
                .unwrap_or_else(|| code.to_string()),
        }
    }
}

#[inline]
fn strip_chr_prefix(token: &[u8]) -> &[u8] {
    if token.len() > 3 && token[..3].eq_ignore_ascii_case(b"chr") {
        &token[3..]
    } else {
        token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_and_prefixed() {
        let r = ChromResolver::default();
        assert_eq!(r.resolve(b"1"), Some(1));
        assert_eq!(r.resolve(b"chr1"), Some(1));
        assert_eq!(r.resolve(b"CHR22"), Some(22));
        assert_eq!(r.resolve(b"0"), Some(0));
        assert_eq!(r.resolve(b"26"), Some(26));
        assert_eq!(r.resolve(b"27"), None);
        assert_eq!(r.resolve(b"chr"), None);
        assert_eq!(r.resolve(b""), None);
    }

    #[test]
    fn test_sex_and_mito_aliases() {
        let r = ChromResolver::default();
        assert_eq!(r.resolve(b"X"), Some(23));
        assert_eq!(r.resolve(b"chrY"), Some(24));
        assert_eq!(r.resolve(b"xy"), Some(25));
        assert_eq!(r.resolve(b"MT"), Some(26));
        assert_eq!(r.resolve(b"chrM"), Some(26));
        assert_eq!(r.resolve(b"chrQ"), None);
    }

    #[test]
    fn test_extra_names() {
        let mut r = ChromResolver::default();
        let code = r.add_extra("scaffold_12");
        assert_eq!(code, Some(27));
        assert_eq!(r.add_extra("scaffold_12"), Some(27));
        assert_eq!(r.resolve(b"scaffold_12"), Some(27));
        assert_eq!(r.code_count(), 28);
        assert_eq!(r.name(27), "scaffold_12");
    }

    #[test]
    fn test_other_autosome_counts() {
        let r = ChromResolver::new(19);
        assert_eq!(r.resolve(b"X"), Some(20));
        assert_eq!(r.resolve(b"23"), Some(23));
        assert_eq!(r.resolve(b"24"), None);
        assert_eq!(r.name(20), "X");
        assert_eq!(r.name(7), "7");
    }
}
