//! Per-window choice of how reader text is attributed to segmenter structure.
//!
//! Each window is classified once by its shape and handled by exactly one
//! branch. Reader failures and unmatched runs degrade to segmenter text.

use super::aligner::FuzzyAligner;
use super::grouping::group_speakers;
use super::text::{content_len, is_ignorable, strip_control_tags};
use super::FusionConfig;
use crate::transcript::{FusedSegment, SegmentSource, Utterance};
use crate::windowing::AlignmentWindow;
use tracing::{debug, warn};

/// Shape of a window, which decides the fusion branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowShape {
    /// Exactly one utterance.
    Single,
    /// Several utterances, all by one speaker.
    SingleSpeaker,
    /// Utterances by more than one speaker.
    MultiSpeaker,
}

impl WindowShape {
    pub fn classify(window: &AlignmentWindow<'_>) -> Self {
        if window.len() <= 1 {
            return WindowShape::Single;
        }
        let first = window.utterances[0].speaker;
        if window.utterances.iter().all(|u| u.speaker == first) {
            WindowShape::SingleSpeaker
        } else {
            WindowShape::MultiSpeaker
        }
    }
}

/// Decides, per window, how reader text maps onto utterances.
#[derive(Debug, Clone)]
pub struct FusionPolicy {
    aligner: FuzzyAligner,
    split_by_text_ratio: bool,
    strip_control_tags: bool,
}

impl FusionPolicy {
    pub fn new(config: &FusionConfig) -> Self {
        Self {
            aligner: FuzzyAligner::new(config.aligner.clone()),
            split_by_text_ratio: config.split_by_text_ratio,
            strip_control_tags: config.strip_control_tags,
        }
    }

    /// Fuse one window. `reader_text` is `None` when the provider failed.
    pub fn fuse(&self, window: &AlignmentWindow<'_>, reader_text: Option<&str>) -> Vec<FusedSegment> {
        if window.is_empty() {
            return Vec::new();
        }

        let text = match reader_text {
            Some(raw) if self.strip_control_tags => strip_control_tags(raw),
            Some(raw) => raw.trim().to_string(),
            None => String::new(),
        };

        if text.is_empty() {
            if reader_text.is_some() {
                warn!(
                    "Reader returned no text for window {}, keeping segmenter text",
                    window.index
                );
            }
            return window.utterances.iter().map(FusedSegment::fallback).collect();
        }

        let shape = WindowShape::classify(window);
        debug!("Window {} classified as {:?}", window.index, shape);

        match shape {
            WindowShape::Single => vec![direct(&window.utterances[0], text)],
            WindowShape::SingleSpeaker if self.split_by_text_ratio => {
                split_by_ratio(window.utterances, &text)
            }
            WindowShape::SingleSpeaker => vec![merged(window, text)],
            WindowShape::MultiSpeaker => self.fuse_speakers(window, &text),
        }
    }

    /// Match each speaker run against the reader text.
    fn fuse_speakers(&self, window: &AlignmentWindow<'_>, text: &str) -> Vec<FusedSegment> {
        let runs = group_speakers(window);
        let queries: Vec<String> = runs.iter().map(|r| r.text()).collect();
        let matches = self.aligner.align(text, &queries);

        runs.iter()
            .zip(queries)
            .zip(matches)
            .map(|((run, query), found)| {
                let (text, source, similarity) = match found {
                    Some(m) => (m.text.trim().to_string(), SegmentSource::Fuzzy, Some(m.similarity)),
                    None => {
                        debug!(
                            "No reader match for speaker {} run at {}ms in window {}",
                            run.speaker,
                            run.start_ms(),
                            window.index
                        );
                        (query, SegmentSource::Fallback, None)
                    }
                };
                FusedSegment {
                    speaker: run.speaker,
                    start_ms: run.start_ms(),
                    end_ms: run.end_ms(),
                    text,
                    source,
                    merged_count: run.len(),
                    similarity,
                }
            })
            .collect()
    }
}

fn direct(utterance: &Utterance, text: String) -> FusedSegment {
    FusedSegment {
        speaker: utterance.speaker,
        start_ms: utterance.start_ms,
        end_ms: utterance.end_ms,
        text,
        source: SegmentSource::Direct,
        merged_count: 1,
        similarity: None,
    }
}

fn merged(window: &AlignmentWindow<'_>, text: String) -> FusedSegment {
    FusedSegment {
        speaker: window.utterances[0].speaker,
        start_ms: window.start_ms(),
        end_ms: window.end_ms(),
        text,
        source: SegmentSource::Merged,
        merged_count: window.len(),
        similarity: None,
    }
}

/// Give each utterance a contiguous slice of `text` proportional to the
/// length of its segmenter text. The last utterance takes the remainder.
fn split_by_ratio(utterances: &[Utterance], text: &str) -> Vec<FusedSegment> {
    let mut weights: Vec<usize> = utterances.iter().map(|u| content_len(&u.text)).collect();
    if weights.iter().all(|w| *w == 0) {
        weights.iter_mut().for_each(|w| *w = 1);
    }
    let total_weight: usize = weights.iter().sum();

    let chars: Vec<(usize, char)> = text.char_indices().collect();
    // content_prefix[i] = content chars in chars[..i]
    let mut content_prefix = Vec::with_capacity(chars.len() + 1);
    content_prefix.push(0);
    for (_, c) in &chars {
        let last = *content_prefix.last().unwrap_or(&0);
        content_prefix.push(last + usize::from(!is_ignorable(*c)));
    }
    let total_content = content_prefix[chars.len()];
    let byte_at = |i: usize| chars.get(i).map(|(b, _)| *b).unwrap_or(text.len());

    let mut cuts = Vec::with_capacity(utterances.len() + 1);
    cuts.push(0);
    let mut cumulative = 0;
    for weight in &weights[..weights.len() - 1] {
        cumulative += weight;
        let prev = *cuts.last().unwrap_or(&0);
        let target = (total_content as f64 * cumulative as f64 / total_weight as f64).round() as usize;
        let ideal = prev + content_prefix[prev..].partition_point(|&n| n < target);
        let ideal = ideal.min(chars.len());
        let tolerance = (target.saturating_sub(content_prefix[prev]) / 4).max(1);
        let cut = nearest_boundary(&chars, ideal, prev, tolerance).unwrap_or(ideal);
        cuts.push(cut);
    }
    cuts.push(chars.len());

    utterances
        .iter()
        .zip(cuts.windows(2))
        .map(|(utterance, bounds)| FusedSegment {
            speaker: utterance.speaker,
            start_ms: utterance.start_ms,
            end_ms: utterance.end_ms,
            text: text[byte_at(bounds[0])..byte_at(bounds[1])].trim().to_string(),
            source: SegmentSource::TextRatio,
            merged_count: 1,
            similarity: None,
        })
        .collect()
}

/// Closest char position to `ideal` (within `tolerance`, after `prev`) that
/// starts a word: preceded by whitespace or punctuation and not followed by
/// more of it.
fn nearest_boundary(chars: &[(usize, char)], ideal: usize, prev: usize, tolerance: usize) -> Option<usize> {
    let is_boundary = |p: usize| {
        p > prev
            && p <= chars.len()
            && is_ignorable(chars[p - 1].1)
            && chars.get(p).is_none_or(|(_, c)| !is_ignorable(*c))
    };

    (0..=tolerance).find_map(|d| {
        let forward = ideal + d;
        if is_boundary(forward) {
            return Some(forward);
        }
        ideal.checked_sub(d).filter(|p| is_boundary(*p))
    })
}
