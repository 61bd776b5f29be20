//! Word-packed bit-vector over variant indices.
//!
//! Bit `i` lives in word `i / 64` at bit `i % 64`. Bits past `len` in the
//! last word are kept clear so that popcounts stay exact.

/// Fixed-length bit-vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitset {
    words: Vec<u64>,
    len: usize,
}

impl Bitset {
    /// Number of 64-bit words needed for `len` bits.
    #[inline]
    pub const fn word_count(len: usize) -> usize {
        len.div_ceil(64)
    }

    /// All bits clear.
    pub fn new(len: usize) -> Self {
        Self {
            words: vec![0; Self::word_count(len)],
            len,
        }
    }

    /// All bits set.
    pub fn full(len: usize) -> Self {
        let mut bits = Self::new(len);
        bits.set_range(0, len);
        bits
    }

    /// Wrap an existing word buffer. Extra words are dropped and stray bits
    /// past `len` are cleared.
    pub fn from_words(mut words: Vec<u64>, len: usize) -> Self {
        words.resize(Self::word_count(len), 0);
        let mut bits = Self { words, len };
        bits.clear_tail();
        bits
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn words(&self) -> &[u64] {
        &self.words
    }

    #[inline]
    pub fn get(&self, idx: usize) -> bool {
        idx < self.len && (self.words[idx / 64] >> (idx % 64)) & 1 != 0
    }

    #[inline]
    pub fn set(&mut self, idx: usize) {
        debug_assert!(idx < self.len);
        self.words[idx / 64] |= 1u64 << (idx % 64);
    }

    #[inline]
    pub fn clear(&mut self, idx: usize) {
        debug_assert!(idx < self.len);
        self.words[idx / 64] &= !(1u64 << (idx % 64));
    }

    /// Set every bit in `[start, end)`. The range is clipped to `len`.
    pub fn set_range(&mut self, start: usize, end: usize) {
        self.apply_range(start, end, |word, mask| *word |= mask);
    }

    /// Clear every bit in `[start, end)`. The range is clipped to `len`.
    pub fn clear_range(&mut self, start: usize, end: usize) {
        self.apply_range(start, end, |word, mask| *word &= !mask);
    }

    fn apply_range(&mut self, start: usize, end: usize, op: impl Fn(&mut u64, u64)) {
        let end = end.min(self.len);
        if start >= end {
            return;
        }
        let first_word = start / 64;
        let last_word = (end - 1) / 64;
        let head = u64::MAX << (start % 64);
        let tail = u64::MAX >> (63 - (end - 1) % 64);
        if first_word == last_word {
            op(&mut self.words[first_word], head & tail);
            return;
        }
        op(&mut self.words[first_word], head);
        for word in &mut self.words[first_word + 1..last_word] {
            op(word, u64::MAX);
        }
        op(&mut self.words[last_word], tail);
    }

    /// Intersect in place with another vector of the same length.
    pub fn and_assign(&mut self, other: &Bitset) {
        debug_assert_eq!(self.len, other.len);
        for (a, b) in self.words.iter_mut().zip(other.words.iter()) {
            *a &= *b;
        }
    }

    /// Union in place with another vector of the same length.
    pub fn or_assign(&mut self, other: &Bitset) {
        debug_assert_eq!(self.len, other.len);
        for (a, b) in self.words.iter_mut().zip(other.words.iter()) {
            *a |= *b;
        }
    }

    /// Popcount.
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Indices of set bits, ascending.
    pub fn iter_ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(wi, &word)| {
            let mut w = word;
            std::iter::from_fn(move || {
                if w == 0 {
                    return None;
                }
                let bit = w.trailing_zeros() as usize;
                w &= w - 1;
                Some(wi * 64 + bit)
            })
        })
    }

    fn clear_tail(&mut self) {
        let rem = self.len % 64;
        if rem != 0 {
            if let Some(last) = self.words.last_mut() {
                *last &= (1u64 << rem) - 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_clear_range_within_word() {
        let mut bits = Bitset::new(10);
        bits.set_range(2, 5);
        assert_eq!(bits.iter_ones().collect::<Vec<_>>(), vec![2, 3, 4]);
        bits.clear_range(3, 4);
        assert_eq!(bits.iter_ones().collect::<Vec<_>>(), vec![2, 4]);
    }

    #[test]
    fn test_range_across_words() {
        let mut bits = Bitset::new(200);
        bits.set_range(60, 130);
        assert_eq!(bits.count_ones(), 70);
        assert!(!bits.get(59));
        assert!(bits.get(60));
        assert!(bits.get(129));
        assert!(!bits.get(130));

        bits.clear_range(64, 128);
        assert_eq!(bits.iter_ones().collect::<Vec<_>>(), vec![60, 61, 62, 63, 128, 129]);
    }

    #[test]
    fn test_range_clipped_to_len() {
        let mut bits = Bitset::new(70);
        bits.set_range(65, 1000);
        assert_eq!(bits.count_ones(), 5);
        bits.set_range(80, 90);
        assert_eq!(bits.count_ones(), 5);
    }

    #[test]
    fn test_full_has_clean_tail() {
        let bits = Bitset::full(67);
        assert_eq!(bits.count_ones(), 67);
        assert_eq!(bits.words()[1], 0b111);
    }

    #[test]
    fn test_and_or() {
        let mut a = Bitset::new(100);
        a.set_range(0, 50);
        let mut b = Bitset::new(100);
        b.set_range(40, 100);

        let mut and = a.clone();
        and.and_assign(&b);
        assert_eq!(and.count_ones(), 10);

        a.or_assign(&b);
        assert_eq!(a.count_ones(), 100);
    }

    #[test]
    fn test_from_words_clears_stray_bits() {
        let bits = Bitset::from_words(vec![u64::MAX, u64::MAX], 3);
        assert_eq!(bits.words().len(), 1);
        assert_eq!(bits.count_ones(), 3);
    }
}
