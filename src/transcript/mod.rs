//! Transcript data: segmenter utterances in, fused segments out.
//!
//! - [`UtteranceStore`] holds the validated segmenter output for one file.
//! - [`FusedTranscript`] is the read-only result of the fusion engine.
//! - [`format_transcript`] renders a fused transcript for export.

mod format;
mod models;
mod store;

pub use format::{format_transcript, OutputFormat, TranscriptExport};
pub use models::{
    format_timestamp, FusedSegment, FusedTranscript, SegmentSource, SpeakerId, Utterance,
};
pub use store::UtteranceStore;
