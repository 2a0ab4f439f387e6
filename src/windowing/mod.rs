//! Alignment windows: bounded, utterance-aligned spans of the timeline.
//!
//! The reader is only practical on bounded spans, and the fuzzy aligner's cost
//! grows with the amount of reader text per window, so the utterance sequence is
//! cut into windows before anything else happens.

mod anchor;

pub use anchor::AnchorSegmenter;

use crate::error::{Result, TandemError};
use crate::transcript::{SpeakerId, Utterance};
use std::collections::BTreeSet;

/// A contiguous run of utterances processed as one alignment unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignmentWindow<'a> {
    /// Position of this window in the file, starting at 0.
    pub index: usize,
    /// The utterances of this window, never empty.
    pub utterances: &'a [Utterance],
}

impl<'a> AlignmentWindow<'a> {
    /// Start of the first utterance in milliseconds.
    pub fn start_ms(&self) -> u64 {
        self.utterances.first().map(|u| u.start_ms).unwrap_or(0)
    }

    /// End of the last utterance in milliseconds.
    pub fn end_ms(&self) -> u64 {
        self.utterances.last().map(|u| u.end_ms).unwrap_or(0)
    }

    pub fn duration_ms(&self) -> u64 {
        self.end_ms().saturating_sub(self.start_ms())
    }

    pub fn len(&self) -> usize {
        self.utterances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utterances.is_empty()
    }

    /// Distinct speakers in this window.
    pub fn speakers(&self) -> BTreeSet<SpeakerId> {
        self.utterances.iter().map(|u| u.speaker).collect()
    }
}

/// Window size bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowingConfig {
    /// Duration after which the segmenter starts looking for a cut point.
    pub min_window_ms: u64,
    /// Hard cap on window duration (a single longer utterance is kept whole).
    pub max_window_ms: u64,
    /// Silence between utterances that also counts as a preferred cut point.
    pub silence_gap_ms: Option<u64>,
}

impl Default for WindowingConfig {
    fn default() -> Self {
        Self {
            min_window_ms: 2 * 60 * 1000,
            max_window_ms: 8 * 60 * 1000,
            silence_gap_ms: None,
        }
    }
}

impl WindowingConfig {
    /// Reject bounds the segmenter cannot honor.
    pub fn validate(&self) -> Result<()> {
        if self.max_window_ms == 0 {
            return Err(TandemError::Config(
                "max_window_duration must be greater than zero".to_string(),
            ));
        }
        if self.min_window_ms > self.max_window_ms {
            return Err(TandemError::Config(format!(
                "min_window_duration ({}ms) exceeds max_window_duration ({}ms)",
                self.min_window_ms, self.max_window_ms
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_accessors() {
        let utterances = vec![
            Utterance::new(1000, 3000, 1, "a"),
            Utterance::new(3500, 9000, 2, "b"),
            Utterance::new(9000, 9500, 1, "c"),
        ];
        let window = AlignmentWindow {
            index: 0,
            utterances: &utterances,
        };

        assert_eq!(window.start_ms(), 1000);
        assert_eq!(window.end_ms(), 9500);
        assert_eq!(window.duration_ms(), 8500);
        assert_eq!(window.speakers().len(), 2);
    }

    #[test]
    fn test_config_validation() {
        assert!(WindowingConfig::default().validate().is_ok());

        let inverted = WindowingConfig {
            min_window_ms: 10_000,
            max_window_ms: 5_000,
            silence_gap_ms: None,
        };
        assert!(matches!(inverted.validate(), Err(TandemError::Config(_))));

        let zero = WindowingConfig {
            min_window_ms: 0,
            max_window_ms: 0,
            silence_gap_ms: None,
        };
        assert!(zero.validate().is_err());
    }
}
