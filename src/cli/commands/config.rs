//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::Result;
use std::path::PathBuf;

/// Run the config command. `path` is the file given with `--config`, if any.
pub fn run_config(action: &ConfigAction, settings: Settings, path: Option<PathBuf>) -> Result<()> {
    let config_path = path.unwrap_or_else(Settings::default_config_path);

    match action {
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(&settings)
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }

        ConfigAction::Path => {
            println!("{}", config_path.display());
        }

        ConfigAction::Init { force } => {
            if config_path.exists() && !force {
                Output::warning(&format!(
                    "Config already exists at {}. Use --force to overwrite.",
                    config_path.display()
                ));
                return Ok(());
            }
            Settings::default().save_to(&config_path)?;
            Output::success(&format!("Created default config at {}", config_path.display()));
            Output::info("Set provider.command (or provider.endpoint) before running 'tandem fuse'.");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_does_not_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        run_config(&ConfigAction::Init { force: false }, Settings::default(), Some(path.clone())).unwrap();
        assert_eq!(Settings::load_from(Some(&path)).unwrap(), Settings::default());

        std::fs::write(&path, "[fusion]\nmin_similarity = 0.8\n").unwrap();
        run_config(&ConfigAction::Init { force: false }, Settings::default(), Some(path.clone())).unwrap();
        assert_eq!(Settings::load_from(Some(&path)).unwrap().fusion.min_similarity, 0.8);

        run_config(&ConfigAction::Init { force: true }, Settings::default(), Some(path.clone())).unwrap();
        assert_eq!(Settings::load_from(Some(&path)).unwrap().fusion.min_similarity, 0.5);
    }
}
