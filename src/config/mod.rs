//! Configuration module for Tandem.
//!
//! Handles loading and saving application settings.

mod settings;

pub use settings::{FusionSettings, GeneralSettings, ProviderKind, ProviderSettings, Settings};
