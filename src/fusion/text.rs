//! Text normalization shared by the aligner and the ratio splitter.
//!
//! Matching ignores whitespace, punctuation and emoji, and compares lowercase
//! text. Every normalized character remembers the byte range of the source
//! character it came from, so matches can be cut out of the source text
//! with punctuation and emoji intact.

use regex::Regex;
use std::sync::OnceLock;

/// Whitespace or punctuation, ASCII or CJK/full-width.
pub fn is_separator(c: char) -> bool {
    c.is_whitespace()
        || c.is_ascii_punctuation()
        || matches!(c,
            '\u{00A1}' | '\u{00A7}' | '\u{00AB}' | '\u{00B6}' | '\u{00B7}' | '\u{00BB}' | '\u{00BF}'
            | '\u{2000}'..='\u{206F}'
            | '\u{3000}'..='\u{303F}'
            | '\u{FE30}'..='\u{FE4F}'
            | '\u{FF01}'..='\u{FF0F}'
            | '\u{FF1A}'..='\u{FF20}'
            | '\u{FF3B}'..='\u{FF40}'
            | '\u{FF5B}'..='\u{FF65}')
}

/// Emoji and pictographic symbols (the reader renders emotion and audio
/// events this way).
pub fn is_emoji(c: char) -> bool {
    matches!(c,
        '\u{1F000}'..='\u{1FAFF}'
        | '\u{2600}'..='\u{27BF}'
        | '\u{2B00}'..='\u{2BFF}'
        | '\u{FE0F}'
        | '\u{200D}')
}

/// Characters that carry no content for matching.
pub fn is_ignorable(c: char) -> bool {
    is_separator(c) || is_emoji(c)
}

/// Number of content characters in `text`.
pub fn content_len(text: &str) -> usize {
    text.chars().filter(|c| !is_ignorable(*c)).count()
}

/// Normalized form of `text` as a plain string.
pub fn normalize(text: &str) -> String {
    NormalizedText::new(text).chars.into_iter().collect()
}

/// Remove `<|...|>` control tags and collapse whitespace.
pub fn strip_control_tags(text: &str) -> String {
    static TAG: OnceLock<Regex> = OnceLock::new();
    static SPACE: OnceLock<Regex> = OnceLock::new();

    let tag = TAG.get_or_init(|| Regex::new(r"<\s*\|[^|]*\|\s*>").expect("valid tag pattern"));
    let space = SPACE.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

    let stripped = tag.replace_all(text, "");
    space.replace_all(&stripped, " ").trim().to_string()
}

/// Join segmenter texts, inserting a space only between two alphanumeric
/// ASCII edges (CJK text is joined without separators).
pub fn join_texts<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    let mut joined = String::new();
    for part in parts {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let needs_space = matches!(
            (joined.chars().last(), part.chars().next()),
            (Some(a), Some(b)) if a.is_ascii_alphanumeric() && b.is_ascii_alphanumeric()
        );
        if needs_space {
            joined.push(' ');
        }
        joined.push_str(part);
    }
    joined
}

/// Lowercased content characters of a text with their source byte ranges.
#[derive(Debug, Clone, Default)]
pub struct NormalizedText {
    pub chars: Vec<char>,
    /// Byte offset of the source character for each normalized character.
    pub starts: Vec<usize>,
    /// Byte offset just past the source character.
    pub ends: Vec<usize>,
    source_len: usize,
}

impl NormalizedText {
    pub fn new(text: &str) -> Self {
        let mut normalized = Self {
            source_len: text.len(),
            ..Self::default()
        };

        for (offset, c) in text.char_indices() {
            if is_ignorable(c) {
                continue;
            }
            let end = offset + c.len_utf8();
            for lower in c.to_lowercase() {
                normalized.chars.push(lower);
                normalized.starts.push(offset);
                normalized.ends.push(end);
            }
        }

        normalized
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Byte offset in the source where normalized index `index` begins, or
    /// the source length past the last character.
    pub fn byte_at(&self, index: usize) -> usize {
        self.starts.get(index).copied().unwrap_or(self.source_len)
    }

    /// First normalized index whose source character starts at or after `byte`.
    pub fn index_at_or_after(&self, byte: usize) -> usize {
        self.starts.partition_point(|&start| start < byte)
    }

    /// Whether the text consists of at most two distinct characters repeated
    /// at least four times, a typical segmenter hallucination ("阿巴阿巴").
    pub fn is_repetitive(&self) -> bool {
        if self.chars.len() < 4 {
            return false;
        }
        let mut distinct: Vec<char> = Vec::with_capacity(3);
        for c in &self.chars {
            if !distinct.contains(c) {
                distinct.push(*c);
                if distinct.len() > 2 {
                    return false;
                }
            }
        }
        true
    }
}
