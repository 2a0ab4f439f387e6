//! Data models for utterances and fused transcripts.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Segmenter Types
// ============================================================================

/// Speaker label assigned by the segmenter's diarization, stable within one file.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SpeakerId(pub u32);

impl std::fmt::Display for SpeakerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for SpeakerId {
    fn from(id: u32) -> Self {
        SpeakerId(id)
    }
}

/// A single utterance from the segmenter, with authoritative timing and speaker.
///
/// Deserializes from FunASR `sentence_info` records as well as the
/// `{start_ms, end_ms, speaker, text}` shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utterance {
    /// Start offset in milliseconds.
    #[serde(alias = "start")]
    pub start_ms: u64,
    /// End offset in milliseconds.
    #[serde(alias = "end")]
    pub end_ms: u64,
    /// Speaker label.
    #[serde(default, alias = "spk", alias = "spk_id")]
    pub speaker: SpeakerId,
    /// Segmenter text (lower fidelity).
    #[serde(default)]
    pub text: String,
}

impl Utterance {
    /// Create a new utterance.
    pub fn new(start_ms: u64, end_ms: u64, speaker: impl Into<SpeakerId>, text: impl Into<String>) -> Self {
        Self {
            start_ms,
            end_ms,
            speaker: speaker.into(),
            text: text.into(),
        }
    }

    /// Duration of this utterance in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}

// ============================================================================
// Fusion Output Types
// ============================================================================

/// Where the text of a fused segment came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentSource {
    /// Single-utterance window, reader text copied whole.
    Direct,
    /// Single-speaker window, reader text attached to the whole window.
    Merged,
    /// Speaker run matched to a substring of the reader text.
    Fuzzy,
    /// Single-speaker window split by segmenter text length.
    TextRatio,
    /// Segmenter text kept because the reader text was unusable.
    Fallback,
}

impl std::fmt::Display for SegmentSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SegmentSource::Direct => write!(f, "direct"),
            SegmentSource::Merged => write!(f, "merged"),
            SegmentSource::Fuzzy => write!(f, "fuzzy"),
            SegmentSource::TextRatio => write!(f, "text_ratio"),
            SegmentSource::Fallback => write!(f, "fallback"),
        }
    }
}

/// One speaker-attributed, time-aligned segment of the fused transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedSegment {
    /// Speaker label (from the segmenter).
    pub speaker: SpeakerId,
    /// Start time in milliseconds (from the segmenter).
    pub start_ms: u64,
    /// End time in milliseconds (from the segmenter).
    pub end_ms: u64,
    /// Segment text.
    pub text: String,
    /// Which fusion branch produced the text.
    pub source: SegmentSource,
    /// Number of segmenter utterances this segment spans.
    pub merged_count: usize,
    /// Match similarity, only for fuzzy segments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
}

impl FusedSegment {
    /// Keep an utterance as-is, tagged as a fallback.
    pub fn fallback(utterance: &Utterance) -> Self {
        Self {
            speaker: utterance.speaker,
            start_ms: utterance.start_ms,
            end_ms: utterance.end_ms,
            text: utterance.text.clone(),
            source: SegmentSource::Fallback,
            merged_count: 1,
            similarity: None,
        }
    }

    /// Duration of this segment in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}

/// The assembled, read-only result of fusing one audio file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusedTranscript {
    media_id: String,
    window_count: usize,
    segments: Vec<FusedSegment>,
}

impl FusedTranscript {
    pub(crate) fn new(media_id: String, window_count: usize, segments: Vec<FusedSegment>) -> Self {
        Self {
            media_id,
            window_count,
            segments,
        }
    }

    /// Identifier of the audio this transcript belongs to.
    pub fn media_id(&self) -> &str {
        &self.media_id
    }

    /// Number of alignment windows the transcript was built from.
    pub fn window_count(&self) -> usize {
        self.window_count
    }

    /// Ordered fused segments.
    pub fn segments(&self) -> &[FusedSegment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// End of the last segment in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        self.segments.last().map(|s| s.end_ms).unwrap_or(0)
    }

    /// Full transcript text, one segment per line.
    pub fn full_text(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Number of segments produced by each fusion branch.
    pub fn source_counts(&self) -> BTreeMap<SegmentSource, usize> {
        let mut counts = BTreeMap::new();
        for segment in &self.segments {
            *counts.entry(segment.source).or_insert(0) += 1;
        }
        counts
    }

    /// Format the transcript with timestamps and speakers for display.
    pub fn format_with_timestamps(&self) -> String {
        self.segments
            .iter()
            .map(|s| {
                format!(
                    "[{} - {}] Speaker {}: {}",
                    format_timestamp(s.start_ms),
                    format_timestamp(s.end_ms),
                    s.speaker,
                    s.text
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Format milliseconds as MM:SS or HH:MM:SS.
pub fn format_timestamp(ms: u64) -> String {
    let total_seconds = ms / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(start_ms: u64, end_ms: u64, text: &str, source: SegmentSource) -> FusedSegment {
        FusedSegment {
            speaker: SpeakerId(1),
            start_ms,
            end_ms,
            text: text.to_string(),
            source,
            merged_count: 1,
            similarity: None,
        }
    }

    #[test]
    fn test_sentence_info_aliases() {
        let json = r#"{"start": 120, "end": 2300, "spk": 2, "text": "你好", "timestamp": [[120, 300]]}"#;
        let utterance: Utterance = serde_json::from_str(json).unwrap();
        assert_eq!(utterance, Utterance::new(120, 2300, 2, "你好"));

        let json = r#"{"start_ms": 0, "end_ms": 10, "speaker": 3, "text": "hi"}"#;
        let utterance: Utterance = serde_json::from_str(json).unwrap();
        assert_eq!(utterance.speaker, SpeakerId(3));
    }

    #[test]
    fn test_missing_speaker_defaults_to_zero() {
        let utterance: Utterance = serde_json::from_str(r#"{"start": 0, "end": 5}"#).unwrap();
        assert_eq!(utterance.speaker, SpeakerId(0));
        assert!(utterance.text.is_empty());
    }

    #[test]
    fn test_source_serializes_snake_case() {
        let json = serde_json::to_string(&SegmentSource::TextRatio).unwrap();
        assert_eq!(json, "\"text_ratio\"");
        assert_eq!(SegmentSource::TextRatio.to_string(), "text_ratio");
    }

    #[test]
    fn test_similarity_omitted_when_absent() {
        let json = serde_json::to_string(&segment(0, 10, "a", SegmentSource::Direct)).unwrap();
        assert!(!json.contains("similarity"));
        assert!(json.contains("\"merged_count\":1"));
    }

    #[test]
    fn test_transcript_accessors() {
        let transcript = FusedTranscript::new(
            "call".to_string(),
            2,
            vec![
                segment(0, 5000, "First", SegmentSource::Direct),
                segment(5000, 9000, "Second", SegmentSource::Fallback),
                segment(9000, 65_000, "Third", SegmentSource::Fallback),
            ],
        );

        assert_eq!(transcript.duration_ms(), 65_000);
        assert_eq!(transcript.full_text(), "First\nSecond\nThird");
        let counts = transcript.source_counts();
        assert_eq!(counts[&SegmentSource::Direct], 1);
        assert_eq!(counts[&SegmentSource::Fallback], 2);
        assert!(transcript
            .format_with_timestamps()
            .starts_with("[00:00 - 00:05] Speaker 1: First"));
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "00:00");
        assert_eq!(format_timestamp(65_000), "01:05");
        assert_eq!(format_timestamp(3_665_000), "01:01:05");
    }
}
