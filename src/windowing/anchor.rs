//! Speaker-aware window segmentation.
//!
//! Cuts only at utterance boundaries. Once a window has reached the minimum
//! duration it is closed at the next speaker change (or long silence, when
//! configured); if none arrives before the maximum, it is closed at the last
//! boundary that keeps it within the maximum.

use super::{AlignmentWindow, WindowingConfig};
use crate::error::Result;
use crate::transcript::{Utterance, UtteranceStore};
use tracing::debug;

/// Splits an utterance sequence into alignment windows.
#[derive(Debug, Clone)]
pub struct AnchorSegmenter {
    config: WindowingConfig,
}

impl AnchorSegmenter {
    /// Create a segmenter, rejecting invalid bounds.
    pub fn new(config: WindowingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &WindowingConfig {
        &self.config
    }

    /// Partition the store into windows. Every utterance lands in exactly one
    /// window and windows keep the input order.
    pub fn segment<'a>(&self, store: &'a UtteranceStore) -> Vec<AlignmentWindow<'a>> {
        let utterances = store.as_slice();
        let mut windows = Vec::new();
        let mut start = 0;

        while start < utterances.len() {
            let end = self.next_cut(utterances, start);
            windows.push(AlignmentWindow {
                index: windows.len(),
                utterances: &utterances[start..end],
            });
            start = end;
        }

        debug!(
            "Segmented {} utterances into {} windows",
            utterances.len(),
            windows.len()
        );
        windows
    }

    /// Exclusive end index of the window starting at `start`.
    fn next_cut(&self, utterances: &[Utterance], start: usize) -> usize {
        let window_start = utterances[start].start_ms;
        let mut end = start + 1;

        loop {
            if end == utterances.len() {
                return end;
            }

            let next = &utterances[end];
            if next.end_ms - window_start > self.config.max_window_ms {
                return end;
            }

            let prev = &utterances[end - 1];
            let elapsed = prev.end_ms - window_start;
            if elapsed >= self.config.min_window_ms && self.is_anchor(prev, next) {
                return end;
            }

            end += 1;
        }
    }

    /// Whether the boundary between `prev` and `next` is a preferred cut point.
    fn is_anchor(&self, prev: &Utterance, next: &Utterance) -> bool {
        if prev.speaker != next.speaker {
            return true;
        }
        self.config
            .silence_gap_ms
            .is_some_and(|gap| next.start_ms.saturating_sub(prev.end_ms) >= gap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TandemError;

    fn segmenter(min_ms: u64, max_ms: u64) -> AnchorSegmenter {
        AnchorSegmenter::new(WindowingConfig {
            min_window_ms: min_ms,
            max_window_ms: max_ms,
            silence_gap_ms: None,
        })
        .unwrap()
    }

    fn store(utterances: Vec<Utterance>) -> UtteranceStore {
        UtteranceStore::new(utterances).unwrap()
    }

    fn lengths(windows: &[AlignmentWindow<'_>]) -> Vec<usize> {
        windows.iter().map(|w| w.len()).collect()
    }

    #[test]
    fn test_rejects_inverted_bounds() {
        let err = AnchorSegmenter::new(WindowingConfig {
            min_window_ms: 9000,
            max_window_ms: 1000,
            silence_gap_ms: None,
        })
        .unwrap_err();
        assert!(matches!(err, TandemError::Config(_)));
    }

    #[test]
    fn test_empty_input() {
        let store = store(Vec::new());
        assert!(segmenter(1000, 2000).segment(&store).is_empty());
    }

    #[test]
    fn test_cuts_at_speaker_change_after_min() {
        let store = store(vec![
            Utterance::new(0, 8000, 1, "a"),
            Utterance::new(8000, 12_000, 1, "b"),
            Utterance::new(12_000, 15_000, 1, "c"),
            Utterance::new(15_000, 20_000, 2, "d"),
            Utterance::new(20_000, 30_000, 2, "e"),
        ]);
        let windows = segmenter(10_000, 60_000).segment(&store);

        assert_eq!(lengths(&windows), vec![3, 2]);
        assert_eq!(windows[1].index, 1);
        assert_eq!(windows[1].start_ms(), 15_000);
    }

    #[test]
    fn test_ignores_speaker_change_before_min() {
        let store = store(vec![
            Utterance::new(0, 2000, 1, "a"),
            Utterance::new(2000, 4000, 2, "b"),
            Utterance::new(4000, 6000, 1, "c"),
        ]);
        let windows = segmenter(10_000, 60_000).segment(&store);
        assert_eq!(lengths(&windows), vec![3]);
    }

    #[test]
    fn test_force_cut_without_speaker_change() {
        let utterances = (0..10)
            .map(|i| Utterance::new(i * 5000, (i + 1) * 5000, 1, "x"))
            .collect();
        let store = store(utterances);
        let windows = segmenter(10_000, 20_000).segment(&store);

        assert_eq!(lengths(&windows), vec![4, 4, 2]);
        assert!(windows.iter().all(|w| w.duration_ms() <= 20_000));
    }

    #[test]
    fn test_oversized_utterance_is_its_own_window() {
        let store = store(vec![
            Utterance::new(0, 1000, 1, "short"),
            Utterance::new(1000, 700_000, 1, "very long"),
            Utterance::new(700_000, 701_000, 2, "after"),
        ]);
        let windows = segmenter(120_000, 480_000).segment(&store);

        assert_eq!(lengths(&windows), vec![1, 1, 1]);
        assert_eq!(windows[1].duration_ms(), 699_000);
    }

    #[test]
    fn test_silence_gap_anchor() {
        let store = store(vec![
            Utterance::new(0, 6000, 1, "a"),
            Utterance::new(6000, 11_000, 1, "b"),
            Utterance::new(15_000, 18_000, 1, "c"),
        ]);

        let plain = segmenter(10_000, 60_000).segment(&store);
        assert_eq!(lengths(&plain), vec![3]);

        let with_gap = AnchorSegmenter::new(WindowingConfig {
            min_window_ms: 10_000,
            max_window_ms: 60_000,
            silence_gap_ms: Some(2000),
        })
        .unwrap()
        .segment(&store);
        assert_eq!(lengths(&with_gap), vec![2, 1]);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn utterances_strategy() -> impl Strategy<Value = Vec<Utterance>> {
            proptest::collection::vec((0u64..5000, 1u64..90_000, 0u32..3), 0..60).prop_map(
                |specs| {
                    let mut cursor = 0;
                    specs
                        .into_iter()
                        .map(|(gap, duration, speaker)| {
                            let start = cursor + gap;
                            cursor = start + duration;
                            Utterance::new(start, cursor, speaker, "t")
                        })
                        .collect()
                },
            )
        }

        proptest! {
            #[test]
            fn windows_partition_utterances(
                utterances in utterances_strategy(),
                min_ms in 0u64..200_000,
                extra_ms in 1u64..300_000,
            ) {
                let store = UtteranceStore::new(utterances.clone()).unwrap();
                let windows = segmenter(min_ms, min_ms + extra_ms).segment(&store);

                let flattened: Vec<Utterance> = windows
                    .iter()
                    .flat_map(|w| w.utterances.iter().cloned())
                    .collect();
                prop_assert_eq!(flattened, utterances);

                for (i, window) in windows.iter().enumerate() {
                    prop_assert_eq!(window.index, i);
                    prop_assert!(!window.is_empty());
                }
                for pair in windows.windows(2) {
                    prop_assert!(pair[0].end_ms() <= pair[1].start_ms());
                }
            }

            #[test]
            fn windows_respect_max_duration(
                utterances in utterances_strategy(),
                min_ms in 0u64..200_000,
                extra_ms in 1u64..300_000,
            ) {
                let max_ms = min_ms + extra_ms;
                let store = UtteranceStore::new(utterances).unwrap();
                for window in segmenter(min_ms, max_ms).segment(&store) {
                    prop_assert!(window.duration_ms() <= max_ms || window.len() == 1);
                }
            }
        }
    }
}
