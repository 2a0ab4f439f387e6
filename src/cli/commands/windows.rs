//! Windows command implementation: prints the window plan.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::fusion::text::join_texts;
use crate::transcript::{format_timestamp, UtteranceStore};
use crate::windowing::{AlignmentWindow, AnchorSegmenter};
use anyhow::Result;

/// Run the windows command.
pub fn run_windows(
    input: &str,
    min_window: Option<f64>,
    max_window: Option<f64>,
    mut settings: Settings,
) -> Result<()> {
    preflight::check(Operation::Windows, &settings.provider, None)?;

    if let Some(seconds) = min_window {
        settings.fusion.min_window_seconds = seconds;
    }
    if let Some(seconds) = max_window {
        settings.fusion.max_window_seconds = seconds;
    }
    let config = settings.fusion_config()?;

    let store = UtteranceStore::load(&Settings::expand_path(input))?;
    let segmenter = AnchorSegmenter::new(config.windowing)?;
    let windows = segmenter.segment(&store);

    if windows.is_empty() {
        Output::warning("No utterances in input.");
        return Ok(());
    }

    Output::header(&format!(
        "{} utterances in {} windows",
        store.len(),
        windows.len()
    ));
    for window in &windows {
        print_window(window);
    }

    let oversized = windows
        .iter()
        .filter(|w| w.duration_ms() > segmenter.config().max_window_ms)
        .count();
    if oversized > 0 {
        Output::warning(&format!(
            "{} single-utterance windows exceed the maximum duration",
            oversized
        ));
    }

    Ok(())
}

fn print_window(window: &AlignmentWindow<'_>) {
    let range = format!(
        "{} - {}",
        format_timestamp(window.start_ms()),
        format_timestamp(window.end_ms())
    );
    let speakers = window
        .speakers()
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(",");
    let text = join_texts(window.utterances.iter().map(|u| u.text.as_str()));

    Output::window(
        window.index,
        &range,
        window.duration_ms(),
        window.len(),
        &speakers,
        &text,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_windows_preview_runs() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("talk.json");
        std::fs::write(
            &input,
            r#"[{"start_ms": 0, "end_ms": 1000, "speaker": 0, "text": "你好"},
                {"start_ms": 1000, "end_ms": 2000, "speaker": 1, "text": "再见"}]"#,
        )
        .unwrap();

        run_windows(input.to_str().unwrap(), Some(0.5), Some(1.0), Settings::default()).unwrap();
    }

    #[test]
    fn test_invalid_bounds() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("talk.json");
        std::fs::write(&input, "[]").unwrap();

        assert!(run_windows(input.to_str().unwrap(), Some(10.0), Some(5.0), Settings::default()).is_err());
    }

    #[test]
    fn test_missing_input() {
        assert!(run_windows("/nonexistent/talk.json", None, None, Settings::default()).is_err());
    }
}
