//! Pre-flight checks before expensive operations.
//!
//! Validates that the reader and its inputs are available before any window
//! is processed, so a misconfiguration is reported once instead of turning
//! every window into a fallback.

use crate::config::{ProviderKind, ProviderSettings, Settings};
use crate::error::{Result, TandemError};
use std::path::{Path, PathBuf};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Fusion calls the configured reader.
    Fuse,
    /// The window preview needs nothing beyond its input.
    Windows,
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation, provider: &ProviderSettings, audio: Option<&Path>) -> Result<()> {
    match operation {
        Operation::Fuse => match provider.kind {
            ProviderKind::Command => {
                check_audio(audio)?;
                let program = provider.command.as_deref().unwrap_or_default();
                if program.is_empty() {
                    return Err(TandemError::Config(
                        "provider.command is not set. Run 'tandem config init' and edit the file.".to_string(),
                    ));
                }
                check_tool(program)?;
            }
            ProviderKind::Http => {
                check_audio(audio)?;
                if provider.endpoint.as_deref().is_none_or(str::is_empty) {
                    return Err(TandemError::Config("provider.endpoint is not set".to_string()));
                }
            }
            ProviderKind::Replay => {
                let file = provider.replay_file.as_deref().unwrap_or_default();
                if !Settings::expand_path(file).is_file() {
                    return Err(TandemError::InvalidInput(format!(
                        "replay file not found: {}",
                        file
                    )));
                }
            }
        },
        Operation::Windows => {
            // No external requirements
        }
    }
    Ok(())
}

fn check_audio(audio: Option<&Path>) -> Result<()> {
    match audio {
        Some(path) if path.is_file() => Ok(()),
        Some(path) => Err(TandemError::InvalidInput(format!(
            "audio file not found: {}",
            path.display()
        ))),
        None => Err(TandemError::InvalidInput(
            "this provider needs an audio file (--audio)".to_string(),
        )),
    }
}

/// Check if an external program can be found.
fn check_tool(program: &str) -> Result<()> {
    if find_program(program).is_some() {
        Ok(())
    } else {
        Err(TandemError::ToolNotFound(program.to_string()))
    }
}

fn find_program(program: &str) -> Option<PathBuf> {
    let candidate = Settings::expand_path(program);
    if candidate.components().count() > 1 {
        return candidate.is_file().then_some(candidate);
    }

    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(program))
        .find(|p| p.is_file())
}
