//! Immutable, validated utterance sequence for one audio file.

use super::Utterance;
use crate::error::{Result, TandemError};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, instrument};

/// Ordered segmenter utterances, validated on construction.
///
/// Every utterance has `start_ms < end_ms`, and utterances are sorted by start
/// and do not overlap.
#[derive(Debug, Clone, Default)]
pub struct UtteranceStore {
    utterances: Vec<Utterance>,
}

/// Accepted layouts of an utterance file.
#[derive(Deserialize)]
#[serde(untagged)]
enum UtteranceFile {
    List(Vec<Utterance>),
    SentenceInfo { sentence_info: Vec<Utterance> },
}

impl UtteranceStore {
    /// Validate and wrap an utterance list.
    pub fn new(utterances: Vec<Utterance>) -> Result<Self> {
        validate(&utterances)?;
        Ok(Self { utterances })
    }

    /// Parse utterances from JSON: either a bare array or an object with a
    /// `sentence_info` array.
    pub fn from_json(json: &str) -> Result<Self> {
        let utterances = match serde_json::from_str::<UtteranceFile>(json)? {
            UtteranceFile::List(list) => list,
            UtteranceFile::SentenceInfo { sentence_info } => sentence_info,
        };
        Self::new(utterances)
    }

    /// Load utterances from a JSON file.
    #[instrument(fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let store = Self::from_json(&content)?;
        debug!("Loaded {} utterances", store.len());
        Ok(store)
    }

    pub fn as_slice(&self) -> &[Utterance] {
        &self.utterances
    }

    pub fn len(&self) -> usize {
        self.utterances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utterances.is_empty()
    }

    /// Time range `(first start, last end)` covered by the utterances.
    pub fn span(&self) -> Option<(u64, u64)> {
        match (self.utterances.first(), self.utterances.last()) {
            (Some(first), Some(last)) => Some((first.start_ms, last.end_ms)),
            _ => None,
        }
    }
}

fn validate(utterances: &[Utterance]) -> Result<()> {
    for (i, u) in utterances.iter().enumerate() {
        if u.start_ms >= u.end_ms {
            return Err(TandemError::InvalidInput(format!(
                "utterance {} has start {}ms >= end {}ms",
                i, u.start_ms, u.end_ms
            )));
        }
    }

    for (i, pair) in utterances.windows(2).enumerate() {
        let (prev, curr) = (&pair[0], &pair[1]);
        if curr.start_ms < prev.start_ms {
            return Err(TandemError::InvalidInput(format!(
                "utterances are not sorted: {} starts at {}ms before {} at {}ms",
                i + 1,
                curr.start_ms,
                i,
                prev.start_ms
            )));
        }
        if curr.start_ms < prev.end_ms {
            return Err(TandemError::InvalidInput(format!(
                "utterance {} ({}ms) overlaps utterance {} ending at {}ms",
                i + 1,
                curr.start_ms,
                i,
                prev.end_ms
            )));
        }
    }

    Ok(())
}
