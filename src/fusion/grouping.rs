//! Grouping of consecutive same-speaker utterances within a window.

use super::text::join_texts;
use crate::transcript::{SpeakerId, Utterance};
use crate::windowing::AlignmentWindow;

/// A maximal run of consecutive utterances by one speaker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeakerRun<'a> {
    pub speaker: SpeakerId,
    pub utterances: &'a [Utterance],
}

impl<'a> SpeakerRun<'a> {
    pub fn start_ms(&self) -> u64 {
        self.utterances.first().map(|u| u.start_ms).unwrap_or(0)
    }

    pub fn end_ms(&self) -> u64 {
        self.utterances.last().map(|u| u.end_ms).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.utterances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utterances.is_empty()
    }

    /// Segmenter text of the whole run.
    pub fn text(&self) -> String {
        join_texts(self.utterances.iter().map(|u| u.text.as_str()))
    }
}

/// Split a window into speaker runs, in time order. A speaker that returns
/// after someone else starts a new run.
pub fn group_speakers<'a>(window: &AlignmentWindow<'a>) -> Vec<SpeakerRun<'a>> {
    window
        .utterances
        .chunk_by(|a, b| a.speaker == b.speaker)
        .map(|utterances| SpeakerRun {
            speaker: utterances[0].speaker,
            utterances,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(utterances: &[Utterance]) -> AlignmentWindow<'_> {
        AlignmentWindow {
            index: 0,
            utterances,
        }
    }

    #[test]
    fn test_groups_consecutive_speakers() {
        let utterances = vec![
            Utterance::new(0, 1000, 1, "你"),
            Utterance::new(1000, 2000, 1, "好"),
            Utterance::new(2000, 3000, 2, "再见"),
        ];
        let runs = group_speakers(&window(&utterances));

        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].speaker, SpeakerId(1));
        assert_eq!(runs[0].len(), 2);
        assert_eq!(runs[0].text(), "你好");
        assert_eq!((runs[0].start_ms(), runs[0].end_ms()), (0, 2000));
        assert_eq!(runs[1].text(), "再见");
    }

    #[test]
    fn test_recurring_speaker_starts_new_run() {
        let utterances = vec![
            Utterance::new(0, 1000, 1, "a"),
            Utterance::new(1000, 2000, 2, "b"),
            Utterance::new(2000, 3000, 1, "c"),
        ];
        let speakers: Vec<u32> = group_speakers(&window(&utterances))
            .iter()
            .map(|r| r.speaker.0)
            .collect();
        assert_eq!(speakers, vec![1, 2, 1]);
    }

    #[test]
    fn test_empty_window() {
        assert!(group_speakers(&window(&[])).is_empty());
    }
}
