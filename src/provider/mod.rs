//! Window text providers: sources of reader text for a time span.
//!
//! The fusion engine only sees the [`WindowTextProvider`] trait. Concrete
//! providers run an external command, call an HTTP service, or replay text
//! captured from an earlier run.

mod command;
mod http;
mod replay;

pub use command::CommandProvider;
pub use http::HttpProvider;
pub use replay::{RecordingProvider, ReplayEntry, ReplayProvider};

use crate::config::{ProviderKind, ProviderSettings, Settings};
use crate::error::{Result, TandemError};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

/// Returns the reader's flat text for one window.
#[async_trait]
pub trait WindowTextProvider: Send + Sync {
    /// Text spoken between `window_start_ms` and `window_end_ms`.
    async fn provide(&self, window_start_ms: u64, window_end_ms: u64) -> Result<String>;

    /// Short name for logs.
    fn name(&self) -> &str;
}

#[async_trait]
impl<T: WindowTextProvider + ?Sized> WindowTextProvider for Box<T> {
    async fn provide(&self, window_start_ms: u64, window_end_ms: u64) -> Result<String> {
        (**self).provide(window_start_ms, window_end_ms).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[async_trait]
impl<T: WindowTextProvider + ?Sized> WindowTextProvider for Arc<T> {
    async fn provide(&self, window_start_ms: u64, window_end_ms: u64) -> Result<String> {
        (**self).provide(window_start_ms, window_end_ms).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Build the provider selected in `settings`.
///
/// `audio` is required by the command and HTTP providers; the replay
/// provider ignores it.
pub fn create_provider(
    settings: &ProviderSettings,
    audio: Option<&Path>,
) -> Result<Box<dyn WindowTextProvider>> {
    let require_audio = || {
        audio.ok_or_else(|| {
            TandemError::Config(format!(
                "the {} provider needs an audio file (--audio)",
                settings.kind
            ))
        })
    };

    let provider: Box<dyn WindowTextProvider> = match settings.kind {
        ProviderKind::Command => {
            let program = settings.command.as_deref().filter(|p| !p.is_empty()).ok_or_else(|| {
                TandemError::Config("provider.command is not set".to_string())
            })?;
            Box::new(
                CommandProvider::new(program, settings.args.clone(), require_audio()?)
                    .with_padding_ms(settings.padding_ms),
            )
        }
        ProviderKind::Http => {
            let endpoint = settings.endpoint.as_deref().ok_or_else(|| {
                TandemError::Config("provider.endpoint is not set".to_string())
            })?;
            Box::new(HttpProvider::new(endpoint, require_audio()?)?.with_padding_ms(settings.padding_ms))
        }
        ProviderKind::Replay => {
            let file = settings.replay_file.as_deref().ok_or_else(|| {
                TandemError::Config("provider.replay_file is not set".to_string())
            })?;
            Box::new(ReplayProvider::load(&Settings::expand_path(file))?)
        }
    };

    Ok(provider)
}
