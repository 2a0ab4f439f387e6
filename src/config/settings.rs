//! Configuration settings for Tandem.

use crate::fusion::{AlignerConfig, FusionConfig};
use crate::windowing::WindowingConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub fusion: FusionSettings,
    pub provider: ProviderSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error), used when neither
    /// `RUST_LOG` nor `-v` is given.
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

/// Fusion engine settings, in user-facing units.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FusionSettings {
    /// Window duration after which a cut is looked for, in seconds.
    pub min_window_seconds: f64,
    /// Hard window duration cap, in seconds.
    pub max_window_seconds: f64,
    /// Silence (seconds) that also counts as a cut point. 0 disables.
    pub silence_gap_seconds: f64,
    /// Minimum similarity for a fuzzy match.
    pub min_similarity: f64,
    /// Split single-speaker windows by text length instead of merging.
    pub split_by_text_ratio: bool,
    /// Cursor advance after a failed match, as a multiple of query length.
    pub cursor_advance_factor: f64,
    /// Limit each query's search to `max(L · factor, 50)` characters. 0 disables.
    pub search_radius_factor: f64,
    /// Skip repetitive segmenter text such as "阿巴阿巴".
    pub repetition_guard: bool,
    /// Reject weak matches and matches that start suspiciously far ahead.
    pub position_guard: bool,
    /// Remove `<|...|>` tags from reader output.
    pub strip_control_tags: bool,
    /// Windows fused concurrently.
    pub max_concurrent_windows: usize,
    /// Timeout for one provider call, in seconds. 0 disables.
    pub provider_timeout_seconds: u64,
}

impl Default for FusionSettings {
    fn default() -> Self {
        Self {
            min_window_seconds: 120.0,
            max_window_seconds: 480.0,
            silence_gap_seconds: 0.0,
            min_similarity: 0.5,
            split_by_text_ratio: false,
            cursor_advance_factor: 1.2,
            search_radius_factor: 0.0,
            repetition_guard: false,
            position_guard: false,
            strip_control_tags: true,
            max_concurrent_windows: 2,
            provider_timeout_seconds: 300,
        }
    }
}

/// Reader backend.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// External command, one invocation per window (default).
    #[default]
    Command,
    /// HTTP service.
    Http,
    /// Previously captured text.
    Replay,
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "command" | "cmd" => Ok(ProviderKind::Command),
            "http" | "https" => Ok(ProviderKind::Http),
            "replay" => Ok(ProviderKind::Replay),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::Command => write!(f, "command"),
            ProviderKind::Http => write!(f, "http"),
            ProviderKind::Replay => write!(f, "replay"),
        }
    }
}

/// Window text provider settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    /// Program run by the command provider.
    pub command: Option<String>,
    /// Arguments, with `{audio}`, `{start_ms}`, `{end_ms}`, `{start}` and
    /// `{end}` placeholders.
    pub args: Vec<String>,
    /// Endpoint of the HTTP provider.
    pub endpoint: Option<String>,
    /// Captured text served by the replay provider.
    pub replay_file: Option<String>,
    /// Audio added before and after each window span, in milliseconds.
    pub padding_ms: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Command,
            command: None,
            args: vec![
                "{audio}".to_string(),
                "{start}".to_string(),
                "{end}".to_string(),
            ],
            endpoint: None,
            replay_file: None,
            padding_ms: 100,
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::TandemError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tandem")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Convert to the engine configuration and validate it.
    pub fn fusion_config(&self) -> crate::error::Result<FusionConfig> {
        let f = &self.fusion;
        let config = FusionConfig {
            windowing: WindowingConfig {
                min_window_ms: seconds_to_ms(f.min_window_seconds, "min_window_seconds")?,
                max_window_ms: seconds_to_ms(f.max_window_seconds, "max_window_seconds")?,
                silence_gap_ms: match seconds_to_ms(f.silence_gap_seconds, "silence_gap_seconds")? {
                    0 => None,
                    ms => Some(ms),
                },
            },
            aligner: AlignerConfig {
                min_similarity: f.min_similarity,
                cursor_advance_factor: f.cursor_advance_factor,
                search_radius_factor: (f.search_radius_factor > 0.0).then_some(f.search_radius_factor),
                repetition_guard: f.repetition_guard,
                position_guard: f.position_guard,
            },
            split_by_text_ratio: f.split_by_text_ratio,
            strip_control_tags: f.strip_control_tags,
            max_concurrent_windows: f.max_concurrent_windows,
            provider_timeout: (f.provider_timeout_seconds > 0)
                .then(|| Duration::from_secs(f.provider_timeout_seconds)),
        };
        config.validate()?;
        Ok(config)
    }
}

fn seconds_to_ms(seconds: f64, name: &str) -> crate::error::Result<u64> {
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(crate::error::TandemError::Config(format!(
            "{} must be a non-negative number, got {}",
            name, seconds
        )));
    }
    Ok((seconds * 1000.0).round() as u64)
}
