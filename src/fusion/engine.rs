//! Concurrent per-window fusion over one utterance file.

use super::assembler::ResultAssembler;
use super::policy::FusionPolicy;
use super::FusionConfig;
use crate::error::{Result, TandemError};
use crate::provider::WindowTextProvider;
use crate::transcript::{FusedSegment, FusedTranscript, UtteranceStore};
use crate::windowing::{AlignmentWindow, AnchorSegmenter};
use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;
use tracing::{debug, error, info, instrument, warn};

/// Runs the whole pipeline: segment, fetch reader text, fuse, assemble.
///
/// The engine keeps no state between calls to [`FusionEngine::fuse`], so the
/// same input with the same provider output always yields the same transcript.
pub struct FusionEngine<P> {
    config: FusionConfig,
    segmenter: AnchorSegmenter,
    policy: FusionPolicy,
    provider: P,
    progress: Option<ProgressBar>,
}

impl<P: WindowTextProvider> FusionEngine<P> {
    /// Validate `config` and build an engine around `provider`.
    pub fn new(config: FusionConfig, provider: P) -> Result<Self> {
        config.validate()?;
        let segmenter = AnchorSegmenter::new(config.windowing.clone())?;
        let policy = FusionPolicy::new(&config);

        Ok(Self {
            config,
            segmenter,
            policy,
            provider,
            progress: None,
        })
    }

    /// Advance `progress` once per finished window.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// The window plan for `store`, without calling the provider.
    pub fn windows<'a>(&self, store: &'a UtteranceStore) -> Vec<AlignmentWindow<'a>> {
        self.segmenter.segment(store)
    }

    /// Fuse every window of `store`.
    ///
    /// Provider failures never fail the call; only internal assembly errors do.
    #[instrument(skip(self, store), fields(media_id = %media_id, utterances = store.len(), provider = self.provider.name()))]
    pub async fn fuse(&self, media_id: &str, store: &UtteranceStore) -> Result<FusedTranscript> {
        let windows = self.segmenter.segment(store);
        let window_count = windows.len();
        info!(
            "Fusing {} utterances in {} windows ({} concurrent)",
            store.len(),
            window_count,
            self.config.max_concurrent_windows
        );

        if let Some(pb) = &self.progress {
            pb.set_length(window_count as u64);
        }

        let mut assembler = ResultAssembler::new(window_count);
        let mut results = stream::iter(windows)
            .map(|window| async move { (window.index, self.process_window(&window).await) })
            .buffer_unordered(self.config.max_concurrent_windows);

        while let Some((index, segments)) = results.next().await {
            if let Some(pb) = &self.progress {
                pb.inc(1);
            }
            assembler.insert(index, segments)?;
        }

        if !assembler.is_complete() {
            warn!("Window stream ended with windows missing");
        }
        let transcript = assembler.finish(media_id)?;

        for (source, count) in transcript.source_counts() {
            info!("{} segments: {}", source, count);
        }
        info!("Fusion complete: {} segments", transcript.segments().len());

        Ok(transcript)
    }

    async fn process_window(&self, window: &AlignmentWindow<'_>) -> Vec<FusedSegment> {
        debug!(
            "Window {}: {}-{}ms, {} utterances",
            window.index,
            window.start_ms(),
            window.end_ms(),
            window.len()
        );

        let text = match self.fetch_text(window).await {
            Ok(text) => Some(text),
            Err(e) if e.is_recoverable() => {
                warn!(
                    "Provider failed for window {} ({}-{}ms): {}, keeping segmenter text",
                    window.index,
                    window.start_ms(),
                    window.end_ms(),
                    e
                );
                None
            }
            Err(e) => {
                error!(
                    "Provider unusable for window {} ({}-{}ms): {}, keeping segmenter text",
                    window.index,
                    window.start_ms(),
                    window.end_ms(),
                    e
                );
                None
            }
        };

        self.policy.fuse(window, text.as_deref())
    }

    async fn fetch_text(&self, window: &AlignmentWindow<'_>) -> Result<String> {
        let call = self.provider.provide(window.start_ms(), window.end_ms());
        match self.config.provider_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| TandemError::ProviderTimeout(limit.as_millis() as u64))?,
            None => call.await,
        }
    }
}
