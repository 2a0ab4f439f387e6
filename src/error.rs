//! Error types for Tandem.

use thiserror::Error;

/// Library-level error type for Tandem operations.
///
/// `Config` and `InvalidInput` are fatal and raised before any window is
/// processed. Provider variants never escape the fusion engine: they are
/// logged and turned into a per-window fallback.
#[derive(Error, Debug)]
pub enum TandemError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Window text provider failed: {0}")]
    Provider(String),

    #[error("Window text provider timed out after {0}ms")]
    ProviderTimeout(u64),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),

    #[error("Result assembly failed: {0}")]
    Assembly(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl TandemError {
    /// Whether this error degrades a single window instead of aborting the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            TandemError::Provider(_)
                | TandemError::ProviderTimeout(_)
                | TandemError::ToolFailed(_)
                | TandemError::Http(_)
        )
    }
}

/// Result type alias for Tandem operations.
pub type Result<T> = std::result::Result<T, TandemError>;
