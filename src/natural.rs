//! Natural ordering for set names.
//!
//! Digit runs compare by numeric value (`set2 < set10`), everything else
//! byte by byte. Runs of equal value but different zero padding are ordered
//! shorter first, so two names compare equal only when their bytes do. That
//! keeps the order total, which binary search over a sorted name table needs.

use std::cmp::Ordering;

/// Compare two byte strings in natural order.
pub fn natural_cmp(a: &[u8], b: &[u8]) -> Ordering {
    let mut i = 0;
    let mut j = 0;
    while i < a.len() && j < b.len() {
        if a[i].is_ascii_digit() && b[j].is_ascii_digit() {
            let a_end = digit_run_end(a, i);
            let b_end = digit_run_end(b, j);
            let cmp = compare_digit_runs(&a[i..a_end], &b[j..b_end]);
            if cmp != Ordering::Equal {
                return cmp;
            }
            i = a_end;
            j = b_end;
        } else {
            let cmp = a[i].cmp(&b[j]);
            if cmp != Ordering::Equal {
                return cmp;
            }
            i += 1;
            j += 1;
        }
    }
    (a.len() - i).cmp(&(b.len() - j))
}

/// Natural comparison for UTF-8 names.
#[inline]
pub fn natural_cmp_str(a: &str, b: &str) -> Ordering {
    natural_cmp(a.as_bytes(), b.as_bytes())
}

#[inline]
fn digit_run_end(s: &[u8], start: usize) -> usize {
    s[start..]
        .iter()
        .position(|b| !b.is_ascii_digit())
        .map_or(s.len(), |p| start + p)
}

/// Numeric comparison of two digit runs of any length, without parsing.
fn compare_digit_runs(a: &[u8], b: &[u8]) -> Ordering {
    let a_sig = strip_leading_zeros(a);
    let b_sig = strip_leading_zeros(b);
    a_sig
        .len()
        .cmp(&b_sig.len())
        .then_with(|| a_sig.cmp(b_sig))
        .then_with(|| a.len().cmp(&b.len()))
}

#[inline]
fn strip_leading_zeros(run: &[u8]) -> &[u8] {
    let zeros = run.iter().take_while(|&&b| b == b'0').count();
    &run[zeros..]
}
