//! LCS-based similarity ratio.
//!
//! Scoring every candidate substring of the reader text against a query is the
//! hot loop of the aligner. For a fixed query the LCS against every prefix of a
//! candidate run is computed in one pass with the bit-parallel recurrence of
//! Hyyrö (2004): the query occupies the bits of `v`, each text character costs
//! one masked add per 64 query characters, and the zero bits of `v` count the
//! LCS so far.

use std::collections::HashMap;

/// Per-character match masks of a query, one bit per query position.
#[derive(Debug, Clone)]
pub struct QueryMasks {
    len: usize,
    words: usize,
    masks: HashMap<char, Vec<u64>>,
}

impl QueryMasks {
    pub fn new(query: &[char]) -> Self {
        let words = query.len().div_ceil(64).max(1);
        let mut masks: HashMap<char, Vec<u64>> = HashMap::new();
        for (i, c) in query.iter().enumerate() {
            let mask = masks.entry(*c).or_insert_with(|| vec![0; words]);
            mask[i / 64] |= 1u64 << (i % 64);
        }
        Self {
            len: query.len(),
            words,
            masks,
        }
    }

    /// Fill `out` so that `out[j]` is the LCS of the query and `text[..=j]`.
    pub fn lcs_prefixes(&self, text: &[char], out: &mut Vec<usize>) {
        out.clear();
        let mut v = vec![u64::MAX; self.words];

        for c in text {
            if let Some(mask) = self.masks.get(c) {
                let mut carry = false;
                for (word, m) in v.iter_mut().zip(mask) {
                    let u = *word & m;
                    let (sum, c1) = word.overflowing_add(u);
                    let (sum, c2) = sum.overflowing_add(carry as u64);
                    carry = c1 || c2;
                    *word = sum | (*word & !m);
                }
            }
            out.push(self.count_matches(&v));
        }
    }

    /// Zero bits of `v` within the query length.
    fn count_matches(&self, v: &[u64]) -> usize {
        let mut zeros = 0;
        for (i, word) in v.iter().enumerate() {
            let bits = (self.len - i * 64).min(64);
            let valid = if bits == 64 { u64::MAX } else { (1u64 << bits) - 1 };
            zeros += (!word & valid).count_ones() as usize;
        }
        zeros
    }
}

/// Similarity ratio `2·LCS / (|a| + |b|)` in `[0, 1]`; two empty inputs score 1.
pub fn lcs_ratio(a: &[char], b: &[char]) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let masks = QueryMasks::new(a);
    let mut prefixes = Vec::with_capacity(b.len());
    masks.lcs_prefixes(b, &mut prefixes);
    let lcs = prefixes.last().copied().unwrap_or(0);
    ratio_from_lcs(lcs, a.len(), b.len())
}

pub(crate) fn ratio_from_lcs(lcs: usize, a_len: usize, b_len: usize) -> f64 {
    (2 * lcs) as f64 / (a_len + b_len) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    /// Textbook O(n·m) LCS for cross-checking.
    fn lcs_table(a: &[char], b: &[char]) -> usize {
        let mut prev = vec![0usize; b.len() + 1];
        for x in a {
            let mut curr = vec![0usize; b.len() + 1];
            for (j, y) in b.iter().enumerate() {
                curr[j + 1] = if x == y {
                    prev[j] + 1
                } else {
                    prev[j + 1].max(curr[j])
                };
            }
            prev = curr;
        }
        prev[b.len()]
    }

    #[test]
    fn test_identical_and_disjoint() {
        assert_eq!(lcs_ratio(&chars("你好"), &chars("你好")), 1.0);
        assert_eq!(lcs_ratio(&chars("abc"), &chars("xyz")), 0.0);
        assert_eq!(lcs_ratio(&chars(""), &chars("")), 1.0);
        assert_eq!(lcs_ratio(&chars("a"), &chars("")), 0.0);
    }

    #[test]
    fn test_partial_overlap() {
        // LCS("你好", "你好啊") = 2 → 4 / 5
        assert!((lcs_ratio(&chars("你好"), &chars("你好啊")) - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_prefix_lengths() {
        let masks = QueryMasks::new(&chars("abcb"));
        let mut out = Vec::new();
        masks.lcs_prefixes(&chars("bdcaba"), &mut out);
        assert_eq!(out, vec![1, 1, 2, 2, 3, 3]);
    }

    #[test]
    fn test_long_query_spans_words() {
        let query: Vec<char> = "葡萄皮".chars().cycle().take(150).collect();
        let mut text = query.clone();
        text.insert(70, 'x');
        text.remove(10);
        assert_eq!(
            lcs_ratio(&query, &text),
            ratio_from_lcs(lcs_table(&query, &text), query.len(), text.len())
        );
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn matches_dynamic_programming(
                a in proptest::collection::vec(prop::sample::select(vec!['a', 'b', 'c', '好']), 1..140),
                b in proptest::collection::vec(prop::sample::select(vec!['a', 'b', 'c', '好']), 1..140),
            ) {
                let masks = QueryMasks::new(&a);
                let mut out = Vec::new();
                masks.lcs_prefixes(&b, &mut out);
                for j in [0, b.len() / 2, b.len() - 1] {
                    prop_assert_eq!(out[j], lcs_table(&a, &b[..=j]));
                }
            }

            #[test]
            fn ratio_is_bounded_and_symmetric(
                a in "[a-d]{1,40}",
                b in "[a-d]{1,40}",
            ) {
                let (a, b) = (chars(&a), chars(&b));
                let ab = lcs_ratio(&a, &b);
                prop_assert!((0.0..=1.0).contains(&ab));
                prop_assert!((ab - lcs_ratio(&b, &a)).abs() < 1e-12);
            }
        }
    }
}
