//! Transcript fusion: attributes reader text to segmenter speakers and times.
//!
//! # Pipeline
//!
//! 1. The [`AnchorSegmenter`](crate::windowing::AnchorSegmenter) cuts the
//!    utterances into windows.
//! 2. For each window the provider returns the reader text of its span.
//! 3. The [`FusionPolicy`] classifies the window and either copies, merges,
//!    splits by ratio, or aligns speaker runs with the [`FuzzyAligner`].
//! 4. The [`ResultAssembler`] restores window order.
//!
//! Any window whose reader text is missing keeps its segmenter text, so the
//! worst case output is the plain segmenter transcript.

mod aligner;
mod assembler;
mod engine;
mod grouping;
mod policy;
mod similarity;
pub mod text;

pub use aligner::{AlignerConfig, FuzzyAligner, MatchCandidate};
pub use assembler::ResultAssembler;
pub use engine::FusionEngine;
pub use grouping::{group_speakers, SpeakerRun};
pub use policy::{FusionPolicy, WindowShape};
pub use similarity::lcs_ratio;

use crate::error::{Result, TandemError};
use crate::windowing::WindowingConfig;
use std::time::Duration;

/// Core engine configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct FusionConfig {
    pub windowing: WindowingConfig,
    pub aligner: AlignerConfig,
    /// Split single-speaker windows across utterances by text length instead
    /// of emitting one merged segment.
    pub split_by_text_ratio: bool,
    /// Remove `<|...|>` control tags from reader text.
    pub strip_control_tags: bool,
    /// Windows processed concurrently.
    pub max_concurrent_windows: usize,
    /// Upper bound on one provider call.
    pub provider_timeout: Option<Duration>,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            windowing: WindowingConfig::default(),
            aligner: AlignerConfig::default(),
            split_by_text_ratio: false,
            strip_control_tags: true,
            max_concurrent_windows: 2,
            provider_timeout: None,
        }
    }
}

impl FusionConfig {
    pub fn validate(&self) -> Result<()> {
        self.windowing.validate()?;

        let aligner = &self.aligner;
        if !(0.0..=1.0).contains(&aligner.min_similarity) {
            return Err(TandemError::Config(format!(
                "min_similarity must be within [0, 1], got {}",
                aligner.min_similarity
            )));
        }
        if !aligner.cursor_advance_factor.is_finite() || aligner.cursor_advance_factor <= 0.0 {
            return Err(TandemError::Config(format!(
                "cursor_advance_factor must be positive, got {}",
                aligner.cursor_advance_factor
            )));
        }
        if let Some(factor) = aligner.search_radius_factor {
            if !factor.is_finite() || factor <= 0.0 {
                return Err(TandemError::Config(format!(
                    "search_radius_factor must be positive, got {}",
                    factor
                )));
            }
        }
        if self.max_concurrent_windows == 0 {
            return Err(TandemError::Config(
                "max_concurrent_windows must be at least 1".to_string(),
            ));
        }
        if self.provider_timeout.is_some_and(|t| t.is_zero()) {
            return Err(TandemError::Config(
                "provider_timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(FusionConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_values() {
        let bad = [
            FusionConfig {
                windowing: WindowingConfig {
                    min_window_ms: 10,
                    max_window_ms: 5,
                    silence_gap_ms: None,
                },
                ..FusionConfig::default()
            },
            FusionConfig {
                aligner: AlignerConfig {
                    min_similarity: 1.5,
                    ..AlignerConfig::default()
                },
                ..FusionConfig::default()
            },
            FusionConfig {
                aligner: AlignerConfig {
                    cursor_advance_factor: 0.0,
                    ..AlignerConfig::default()
                },
                ..FusionConfig::default()
            },
            FusionConfig {
                aligner: AlignerConfig {
                    search_radius_factor: Some(f64::NAN),
                    ..AlignerConfig::default()
                },
                ..FusionConfig::default()
            },
            FusionConfig {
                max_concurrent_windows: 0,
                ..FusionConfig::default()
            },
            FusionConfig {
                provider_timeout: Some(Duration::ZERO),
                ..FusionConfig::default()
            },
        ];

        for config in bad {
            assert!(matches!(config.validate(), Err(TandemError::Config(_))), "{:?}", config);
        }
    }
}
