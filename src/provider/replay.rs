//! Replay of previously captured reader text.
//!
//! Reader calls are slow. A [`RecordingProvider`] captures every window's text
//! while fusing, and a [`ReplayProvider`] serves it back later so fusion
//! settings can be tuned without running the reader again.

use super::WindowTextProvider;
use crate::error::{Result, TandemError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, instrument};

/// Reader text captured for one window span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayEntry {
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: String,
}

/// Serves captured text by exact window span.
#[derive(Debug, Clone, Default)]
pub struct ReplayProvider {
    entries: HashMap<(u64, u64), String>,
}

impl ReplayProvider {
    pub fn new(entries: impl IntoIterator<Item = ReplayEntry>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|e| ((e.start_ms, e.end_ms), e.text))
                .collect(),
        }
    }

    /// Parse a JSON array of entries, or one entry per line.
    pub fn from_json(content: &str) -> Result<Self> {
        let trimmed = content.trim_start();
        let entries: Vec<ReplayEntry> = if trimmed.starts_with('[') {
            serde_json::from_str(trimmed)?
        } else {
            trimmed
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(serde_json::from_str::<ReplayEntry>)
                .collect::<std::result::Result<_, _>>()?
        };
        Ok(Self::new(entries))
    }

    #[instrument(fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let provider = Self::from_json(&content)?;
        info!("Loaded {} replay entries", provider.len());
        Ok(provider)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl WindowTextProvider for ReplayProvider {
    async fn provide(&self, window_start_ms: u64, window_end_ms: u64) -> Result<String> {
        self.entries
            .get(&(window_start_ms, window_end_ms))
            .cloned()
            .ok_or_else(|| {
                TandemError::Provider(format!(
                    "no replay entry for window {}-{}ms",
                    window_start_ms, window_end_ms
                ))
            })
    }

    fn name(&self) -> &str {
        "replay"
    }
}

/// Wraps a provider and keeps every successful response.
#[derive(Debug)]
pub struct RecordingProvider<P> {
    inner: P,
    recorded: Mutex<Vec<ReplayEntry>>,
}

impl<P: WindowTextProvider> RecordingProvider<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            recorded: Mutex::new(Vec::new()),
        }
    }

    /// Captured entries, sorted by window start.
    pub fn entries(&self) -> Vec<ReplayEntry> {
        let mut entries = match self.recorded.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        entries.sort_by_key(|e| (e.start_ms, e.end_ms));
        entries
    }

    /// Write the captured entries as a JSON array.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let entries = self.entries();
        std::fs::write(path, serde_json::to_string_pretty(&entries)?)?;
        debug!("Saved {} replay entries to {}", entries.len(), path.display());
        Ok(())
    }
}

#[async_trait]
impl<P: WindowTextProvider> WindowTextProvider for RecordingProvider<P> {
    async fn provide(&self, window_start_ms: u64, window_end_ms: u64) -> Result<String> {
        let text = self.inner.provide(window_start_ms, window_end_ms).await?;
        let entry = ReplayEntry {
            start_ms: window_start_ms,
            end_ms: window_end_ms,
            text: text.clone(),
        };
        match self.recorded.lock() {
            Ok(mut guard) => guard.push(entry),
            Err(poisoned) => poisoned.into_inner().push(entry),
        }
        Ok(text)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
