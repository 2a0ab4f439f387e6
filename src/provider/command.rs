//! Reader text from an external command.

use super::WindowTextProvider;
use crate::error::{Result, TandemError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, instrument};

/// Default padding around a window span, in milliseconds.
pub const DEFAULT_PADDING_MS: u64 = 100;

/// Runs a program once per window and reads the text from its stdout.
///
/// Arguments may contain placeholders, substituted per call:
///
/// - `{audio}`: path of the audio file
/// - `{start_ms}`, `{end_ms}`: padded span in milliseconds
/// - `{start}`, `{end}`: padded span in seconds (`12.345`)
#[derive(Debug, Clone)]
pub struct CommandProvider {
    program: String,
    args: Vec<String>,
    audio: PathBuf,
    padding_ms: u64,
}

impl CommandProvider {
    pub fn new(program: impl Into<String>, args: Vec<String>, audio: &Path) -> Self {
        Self {
            program: program.into(),
            args,
            audio: audio.to_path_buf(),
            padding_ms: DEFAULT_PADDING_MS,
        }
    }

    /// Extend each span by `padding_ms` on both sides (clamped at zero).
    pub fn with_padding_ms(mut self, padding_ms: u64) -> Self {
        self.padding_ms = padding_ms;
        self
    }

    fn render_args(&self, start_ms: u64, end_ms: u64) -> Vec<String> {
        let start_ms = start_ms.saturating_sub(self.padding_ms);
        let end_ms = end_ms.saturating_add(self.padding_ms);
        let audio = self.audio.to_string_lossy();

        self.args
            .iter()
            .map(|arg| {
                arg.replace("{audio}", &audio)
                    .replace("{start_ms}", &start_ms.to_string())
                    .replace("{end_ms}", &end_ms.to_string())
                    .replace("{start}", &format!("{:.3}", start_ms as f64 / 1000.0))
                    .replace("{end}", &format!("{:.3}", end_ms as f64 / 1000.0))
            })
            .collect()
    }
}

#[async_trait]
impl WindowTextProvider for CommandProvider {
    #[instrument(skip(self), fields(program = %self.program))]
    async fn provide(&self, window_start_ms: u64, window_end_ms: u64) -> Result<String> {
        let args = self.render_args(window_start_ms, window_end_ms);
        debug!("Running {} {:?}", self.program, args);

        let result = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await;

        let output = match result {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TandemError::ToolNotFound(self.program.clone()));
            }
            Err(e) => {
                return Err(TandemError::ToolFailed(format!("{} execution failed: {e}", self.program)));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TandemError::ToolFailed(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn name(&self) -> &str {
        "command"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_render_placeholders() {
        let provider = CommandProvider::new(
            "reader",
            args(&["--audio", "{audio}", "{start_ms}-{end_ms}", "{start}", "{end}"]),
            Path::new("/tmp/talk.wav"),
        );
        assert_eq!(
            provider.render_args(50, 2000),
            args(&["--audio", "/tmp/talk.wav", "0-2100", "0.000", "2.100"])
        );

        let unpadded = provider.with_padding_ms(0);
        assert_eq!(unpadded.render_args(1500, 2000)[2], "1500-2000");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_reads_stdout() {
        let provider = CommandProvider::new("echo", args(&["  {start_ms} {end_ms}  "]), Path::new("a.wav"))
            .with_padding_ms(0);
        assert_eq!(provider.provide(0, 1000).await.unwrap(), "0 1000");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit_fails() {
        let provider = CommandProvider::new("false", vec![], Path::new("a.wav"));
        let err = provider.provide(0, 1000).await.unwrap_err();
        assert!(matches!(err, TandemError::ToolFailed(_)));
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn test_missing_program() {
        let provider = CommandProvider::new("tandem-no-such-reader", vec![], Path::new("a.wav"));
        assert!(matches!(
            provider.provide(0, 1000).await,
            Err(TandemError::ToolNotFound(_))
        ));
    }
}
