//! Fuse command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::{FuseArgs, Output};
use crate::config::{ProviderKind, Settings};
use crate::fusion::{FusionConfig, FusionEngine};
use crate::provider::{create_provider, RecordingProvider, WindowTextProvider};
use crate::transcript::{
    format_timestamp, format_transcript, FusedTranscript, OutputFormat, SegmentSource, UtteranceStore,
};
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

/// Run the fuse command.
pub async fn run_fuse(args: &FuseArgs, mut settings: Settings) -> Result<()> {
    let output_format: OutputFormat = args.format.parse().map_err(|e: String| anyhow::anyhow!(e))?;

    apply_overrides(args, &mut settings)?;
    let config = settings.fusion_config()?;

    let audio = args.audio.as_deref().map(Settings::expand_path);
    if let Err(e) = preflight::check(Operation::Fuse, &settings.provider, audio.as_deref()) {
        Output::error(&format!("{}", e));
        Output::info(&format!(
            "Check the [provider] section of {}",
            Settings::default_config_path().display()
        ));
        return Err(e.into());
    }

    let input = Settings::expand_path(&args.input);
    let store = UtteranceStore::load(&input)?;
    let media_id = args.media_id.clone().unwrap_or_else(|| media_id_for(&input));
    Output::info(&format!(
        "Fusing {} utterances from {} ({} provider)",
        store.len(),
        input.display(),
        settings.provider.kind
    ));

    let provider = create_provider(&settings.provider, audio.as_deref())?;
    let transcript = match &args.record {
        Some(record_path) => {
            let recorder = Arc::new(RecordingProvider::new(provider));
            let transcript = run_engine(config, Arc::clone(&recorder), &media_id, &store).await?;
            let record_path = Settings::expand_path(record_path);
            recorder.save(&record_path)?;
            Output::info(&format!("Saved reader responses to {}", record_path.display()));
            transcript
        }
        None => run_engine(config, provider, &media_id, &store).await?,
    };

    let rendered = format_transcript(&transcript, output_format);
    match &args.output {
        Some(path) => {
            let path = Settings::expand_path(path);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, rendered)?;
            Output::success(&format!(
                "Wrote {} segments to {}",
                transcript.segments().len(),
                path.display()
            ));
        }
        None => println!("{}", rendered),
    }

    print_summary(&transcript);
    Ok(())
}

/// Command-line flags take precedence over the configuration file.
fn apply_overrides(args: &FuseArgs, settings: &mut Settings) -> Result<()> {
    if args.split_by_text_ratio {
        settings.fusion.split_by_text_ratio = true;
    }
    if let Some(min_similarity) = args.min_similarity {
        settings.fusion.min_similarity = min_similarity;
    }
    if let Some(kind) = &args.provider {
        settings.provider.kind = kind.parse::<ProviderKind>().map_err(|e| anyhow::anyhow!(e))?;
    }
    if let Some(replay) = &args.replay {
        settings.provider.kind = ProviderKind::Replay;
        settings.provider.replay_file = Some(replay.clone());
    }
    Ok(())
}

async fn run_engine<P: WindowTextProvider>(
    config: FusionConfig,
    provider: P,
    media_id: &str,
    store: &UtteranceStore,
) -> Result<FusedTranscript> {
    let pb = Output::progress_bar(0, "windows");
    let engine = FusionEngine::new(config, provider)?.with_progress(pb.clone());
    let result = engine.fuse(media_id, store).await;
    pb.finish_and_clear();
    Ok(result?)
}

fn media_id_for(input: &Path) -> String {
    input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string()
}

fn print_summary(transcript: &FusedTranscript) {
    Output::kv("Windows", &transcript.window_count().to_string());
    Output::kv("Duration", &format_timestamp(transcript.duration_ms()));
    for (source, count) in transcript.source_counts() {
        Output::kv(&source.to_string(), &count.to_string());
    }
    if transcript.segments().iter().all(|s| s.source == SegmentSource::Fallback) && !transcript.is_empty() {
        Output::warning("The reader produced no usable text; output is the segmenter transcript.");
    }
}
