//! Tandem - Transcript Fusion
//!
//! Fuses two transcriptions of the same audio into one speaker-attributed,
//! time-aligned transcript.
//!
//! # Overview
//!
//! - The *segmenter* (for example a FunASR pipeline with speaker
//!   diarization) yields utterances with reliable start/end times and
//!   speaker labels, but lower-fidelity text.
//! - The *reader* (for example SenseVoice) yields better text, including
//!   emotion and event markers, but no timing or speakers, and is only
//!   practical on bounded spans.
//!
//! Tandem cuts the utterances into windows, asks the reader for each
//! window's text, and attributes that text back to the segmenter's speakers
//! with ordered fuzzy matching.
//!
//! # Architecture
//!
//! - `config` - Configuration management
//! - `transcript` - Utterances, fused segments and output formats
//! - `windowing` - Speaker-aware window segmentation
//! - `fusion` - Alignment, per-window fusion policy and the engine
//! - `provider` - Reader backends (command, HTTP, replay)
//! - `cli` - Command-line interface
//!
//! # Example
//!
//! ```rust,no_run
//! use tandem::fusion::{FusionConfig, FusionEngine};
//! use tandem::provider::ReplayProvider;
//! use tandem::transcript::UtteranceStore;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = UtteranceStore::load(Path::new("talk.json"))?;
//!     let provider = ReplayProvider::load(Path::new("talk.reader.json"))?;
//!     let engine = FusionEngine::new(FusionConfig::default(), provider)?;
//!
//!     let transcript = engine.fuse("talk", &store).await?;
//!     println!("{}", transcript.format_with_timestamps());
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod fusion;
pub mod provider;
pub mod transcript;
pub mod windowing;

pub use error::{Result, TandemError};
