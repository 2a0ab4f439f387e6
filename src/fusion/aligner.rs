//! Ordered fuzzy substring matching of speaker runs against reader text.
//!
//! Queries are matched in order against the part of the haystack that has not
//! been consumed yet. The cursor only moves forward, so a word spoken by two
//! speakers in a row can never be claimed twice by matching its first
//! occurrence.

use super::similarity::{ratio_from_lcs, QueryMasks};
use super::text::{is_ignorable, NormalizedText};
use tracing::debug;

/// Candidate lengths are searched in `[MIN_LENGTH_RATIO·L, MAX_LENGTH_RATIO·L]`.
const MIN_LENGTH_RATIO: f64 = 0.5;
const MAX_LENGTH_RATIO: f64 = 2.0;

/// Floor for the optional search radius, in normalized characters.
const MIN_SEARCH_RADIUS: usize = 50;

/// With the position guard, matches scoring below this are rejected whatever
/// `min_similarity` says.
const GUARD_MIN_SIMILARITY: f64 = 0.4;
/// With the position guard, a match may start at most this far into the
/// unconsumed text.
const GUARD_MAX_REMAINING_FRACTION: f64 = 0.5;
/// With the position guard and a search radius, a match may start at most this
/// far into the radius.
const GUARD_MAX_RADIUS_FRACTION: f64 = 0.8;

/// A query matched to a substring of the haystack.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchCandidate {
    /// The matched substring, punctuation and emoji preserved.
    pub text: String,
    /// Byte offset of the match in the haystack.
    pub start_offset: usize,
    /// Byte offset just past the match.
    pub end_offset: usize,
    /// Similarity of the normalized query and the core candidate, in `[0, 1]`.
    /// Characters added by boundary snapping are not scored.
    pub similarity: f64,
}

/// Aligner tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignerConfig {
    /// Minimum similarity for a candidate to count as a match.
    pub min_similarity: f64,
    /// After a failed match the cursor moves `L · cursor_advance_factor`
    /// normalized characters, `L` being the normalized query length.
    pub cursor_advance_factor: f64,
    /// When set, a query only searches the first `max(L · factor, 50)`
    /// normalized characters after the cursor.
    pub search_radius_factor: Option<f64>,
    /// Treat repetitive queries ("阿巴阿巴") as unmatched without searching.
    pub repetition_guard: bool,
    /// Reject weak or far-away matches: similarity below 0.4, a start past
    /// half of the unconsumed text, or past 80% of the search radius.
    pub position_guard: bool,
}

impl Default for AlignerConfig {
    fn default() -> Self {
        Self {
            min_similarity: 0.5,
            cursor_advance_factor: 1.2,
            search_radius_factor: None,
            repetition_guard: false,
            position_guard: false,
        }
    }
}

/// A scored candidate in normalized character coordinates.
#[derive(Debug, Clone, Copy)]
struct Scored {
    start: usize,
    len: usize,
    score: f64,
}

/// Why a query found no match.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Miss {
    Repetitive,
    BelowThreshold,
    TooFar,
}

/// Matches an ordered sequence of queries against one haystack.
#[derive(Debug, Clone, Default)]
pub struct FuzzyAligner {
    config: AlignerConfig,
}

impl FuzzyAligner {
    pub fn new(config: AlignerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AlignerConfig {
        &self.config
    }

    /// Match each query in order. Returns one entry per query, `None` when
    /// no candidate reached the similarity threshold.
    ///
    /// For any two matches `i < j`, `matches[i].end_offset <= matches[j].start_offset`.
    /// A match never grows into the text where the next query's own best
    /// candidate begins.
    pub fn align<S: AsRef<str>>(&self, haystack: &str, queries: &[S]) -> Vec<Option<MatchCandidate>> {
        let normalized = NormalizedText::new(haystack);
        let queries: Vec<NormalizedText> = queries.iter().map(|q| NormalizedText::new(q.as_ref())).collect();
        let mut cursor = 0;
        let mut floor = 0;
        let mut results = Vec::with_capacity(queries.len());

        for (i, query) in queries.iter().enumerate() {
            let query_len = query.len();

            if query_len == 0 {
                debug!("Query {} is empty after normalization", i);
                results.push(None);
                continue;
            }

            match self.find(query, &normalized, cursor) {
                Ok(best) => {
                    let core_start = normalized.starts[best.start];
                    let core_end = normalized.ends[best.start + best.len - 1];

                    let next_start = queries.get(i + 1).and_then(|next| {
                        let next_cursor = normalized.index_at_or_after(core_end);
                        self.find(next, &normalized, next_cursor).ok()
                    });
                    let bound = match next_start {
                        Some(next) => Bound::NextMatch(normalized.starts[next.start]),
                        None if i + 1 == queries.len() => Bound::EndOfText,
                        None => Bound::Open,
                    };

                    let (start, end) = snap_to_boundaries(haystack, core_start, core_end, floor, bound, query_len / 2);

                    results.push(Some(MatchCandidate {
                        text: haystack[start..end].to_string(),
                        start_offset: start,
                        end_offset: end,
                        similarity: best.score,
                    }));
                    cursor = normalized.index_at_or_after(end);
                    floor = end;
                }
                Err(miss) => {
                    let advance = (query_len as f64 * self.config.cursor_advance_factor).ceil() as usize;
                    cursor = (cursor + advance).min(normalized.len());
                    floor = normalized.byte_at(cursor).max(floor);
                    debug!("Query {} unmatched ({:?}), cursor advanced {} chars", i, miss, advance);
                    results.push(None);
                }
            }
        }

        results
    }

    /// Best acceptable candidate for `query` at or after normalized index
    /// `cursor`, with every configured guard applied.
    fn find(&self, query: &NormalizedText, haystack: &NormalizedText, cursor: usize) -> Result<Scored, Miss> {
        if query.is_empty() {
            return Err(Miss::BelowThreshold);
        }
        if self.config.repetition_guard && query.is_repetitive() {
            return Err(Miss::Repetitive);
        }

        let remaining = &haystack.chars[cursor..];
        let radius = self.search_radius(query.len());
        let best = self
            .best_candidate(&query.chars, &remaining[..remaining.len().min(radius.unwrap_or(usize::MAX))])
            .filter(|best| best.score >= self.config.min_similarity)
            .ok_or(Miss::BelowThreshold)?;

        if self.config.position_guard {
            if best.score < GUARD_MIN_SIMILARITY {
                return Err(Miss::BelowThreshold);
            }
            if best.start as f64 > remaining.len() as f64 * GUARD_MAX_REMAINING_FRACTION {
                return Err(Miss::TooFar);
            }
            if radius.is_some_and(|r| best.start as f64 > r as f64 * GUARD_MAX_RADIUS_FRACTION) {
                return Err(Miss::TooFar);
            }
        }

        Ok(Scored {
            start: cursor + best.start,
            ..best
        })
    }

    fn search_radius(&self, query_len: usize) -> Option<usize> {
        self.config
            .search_radius_factor
            .map(|factor| ((query_len as f64 * factor).ceil() as usize).max(MIN_SEARCH_RADIUS))
    }

    /// Highest-scoring candidate of `search` for `query`, relative to the
    /// start of `search`. Ties keep the earliest start, then the shortest
    /// length.
    fn best_candidate(&self, query: &[char], search: &[char]) -> Option<Scored> {
        let query_len = query.len();
        let min_len = ((query_len as f64 * MIN_LENGTH_RATIO) as usize).max(1);
        let max_len = ((query_len as f64 * MAX_LENGTH_RATIO) as usize).min(search.len());
        if min_len > max_len {
            return None;
        }

        let masks = QueryMasks::new(query);
        let mut prefixes = Vec::with_capacity(max_len);
        let mut best: Option<Scored> = None;

        for start in 0..=(search.len() - min_len) {
            let available = max_len.min(search.len() - start);
            masks.lcs_prefixes(&search[start..start + available], &mut prefixes);

            for len in min_len..=available {
                let score = ratio_from_lcs(prefixes[len - 1], query_len, len);
                if best.map_or(true, |b| score > b.score) {
                    best = Some(Scored { start, len, score });
                }
            }

            if best.is_some_and(|b| b.score >= 1.0) {
                break;
            }
        }

        best
    }
}

/// How far the end of a match may be widened.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Bound {
    /// The next query's match starts at this byte; reaching it is a boundary.
    NextMatch(usize),
    /// Last query: the end of the haystack is a boundary.
    EndOfText,
    /// Later text may belong to a later speaker; only a separator is a boundary.
    Open,
}

/// Widen `[start, end)` to whole words: the end moves forward to the next
/// separator (or the bound) and then over trailing punctuation or emoji; the
/// start moves back to the previous separator, never past `floor`. Each side
/// moves over at most `limit` content characters, otherwise it stays.
fn snap_to_boundaries(
    haystack: &str,
    start: usize,
    end: usize,
    floor: usize,
    bound: Bound,
    limit: usize,
) -> (usize, usize) {
    let (ceiling, ceiling_is_boundary) = match bound {
        Bound::NextMatch(next) => (next.max(end), true),
        Bound::EndOfText => (haystack.len(), true),
        Bound::Open => (haystack.len(), false),
    };

    let mut new_end = end;
    let mut extended = 0;
    let mut found = false;
    for c in haystack[end..ceiling].chars() {
        if is_ignorable(c) {
            found = true;
            break;
        }
        extended += 1;
        if extended > limit {
            break;
        }
        new_end += c.len_utf8();
    }
    if !found && extended <= limit && ceiling_is_boundary {
        // Reached the bound
        found = true;
    }
    let mut end = if found { new_end } else { end };
    for c in haystack[end..ceiling].chars() {
        if c.is_whitespace() || !is_ignorable(c) {
            break;
        }
        end += c.len_utf8();
    }

    let mut new_start = start;
    let mut retreated = 0;
    let mut found = false;
    for c in haystack[floor..start].chars().rev() {
        if is_ignorable(c) {
            found = true;
            break;
        }
        retreated += 1;
        if retreated > limit {
            break;
        }
        new_start -= c.len_utf8();
    }
    if !found && retreated <= limit {
        // Reached the floor
        found = true;
    }
    let start = if found { new_start } else { start };

    (start, end)
}
