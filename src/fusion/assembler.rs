//! Reassembly of per-window results, which may complete in any order.

use crate::error::{Result, TandemError};
use crate::transcript::{FusedSegment, FusedTranscript};

/// Collects fused windows by index and concatenates them in window order.
#[derive(Debug)]
pub struct ResultAssembler {
    slots: Vec<Option<Vec<FusedSegment>>>,
}

impl ResultAssembler {
    pub fn new(window_count: usize) -> Self {
        Self {
            slots: vec![None; window_count],
        }
    }

    /// Store the segments of window `index`.
    pub fn insert(&mut self, index: usize, segments: Vec<FusedSegment>) -> Result<()> {
        let window_count = self.slots.len();
        let slot = self.slots.get_mut(index).ok_or_else(|| {
            TandemError::Assembly(format!(
                "window {} out of range ({} windows)",
                index, window_count
            ))
        })?;
        if slot.is_some() {
            return Err(TandemError::Assembly(format!(
                "window {} delivered twice",
                index
            )));
        }
        *slot = Some(segments);
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Concatenate all windows in index order.
    pub fn finish(self, media_id: impl Into<String>) -> Result<FusedTranscript> {
        let window_count = self.slots.len();
        let mut segments = Vec::new();

        for (index, slot) in self.slots.into_iter().enumerate() {
            let window = slot.ok_or_else(|| {
                TandemError::Assembly(format!("window {} never completed", index))
            })?;
            segments.extend(window);
        }

        debug_assert!(
            segments.windows(2).all(|w| w[0].end_ms <= w[1].start_ms),
            "fused segments overlap"
        );

        Ok(FusedTranscript::new(media_id.into(), window_count, segments))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::Utterance;

    fn segment(start_ms: u64, end_ms: u64) -> FusedSegment {
        FusedSegment::fallback(&Utterance::new(start_ms, end_ms, 0, "x"))
    }

    #[test]
    fn test_out_of_order_inserts_are_reordered() {
        let mut assembler = ResultAssembler::new(3);
        assembler.insert(2, vec![segment(20, 30)]).unwrap();
        assembler.insert(0, vec![segment(0, 5), segment(5, 10)]).unwrap();
        assert!(!assembler.is_complete());
        assembler.insert(1, vec![segment(10, 20)]).unwrap();
        assert!(assembler.is_complete());

        let transcript = assembler.finish("media").unwrap();
        let starts: Vec<u64> = transcript.segments().iter().map(|s| s.start_ms).collect();
        assert_eq!(starts, vec![0, 5, 10, 20]);
        assert_eq!(transcript.window_count(), 3);
        assert_eq!(transcript.media_id(), "media");
    }

    #[test]
    fn test_rejects_bad_indices() {
        let mut assembler = ResultAssembler::new(1);
        assert!(assembler.insert(1, vec![]).is_err());
        assembler.insert(0, vec![]).unwrap();
        assert!(matches!(
            assembler.insert(0, vec![]),
            Err(TandemError::Assembly(_))
        ));
    }

    #[test]
    fn test_missing_window_is_an_error() {
        let mut assembler = ResultAssembler::new(2);
        assembler.insert(0, vec![segment(0, 1)]).unwrap();
        assert!(assembler.finish("media").is_err());
    }

    #[test]
    fn test_empty_input() {
        let transcript = ResultAssembler::new(0).finish("empty").unwrap();
        assert!(transcript.is_empty());
        assert_eq!(transcript.window_count(), 0);
    }
}
