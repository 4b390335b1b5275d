// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of PowerPlan.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// TOML settings file for the `powerplan` binary.
///
/// ```toml
/// data_dir = "/var/lib/powerplan"
///
/// [options]
/// b_cap = 17.4
/// heating_enabled = true
/// standard_mode = "Back Up Mode"
/// ```
///
/// Everything under `[options]` goes through the parameter resolver, so
/// unknown keys are ignored and bad values fall back with a warning.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data_dir: Option<PathBuf>,
    pub options: serde_json::Map<String, serde_json::Value>,
}

impl AppConfig {
    /// Loads the settings file; a missing file is not an error, defaults
    /// apply.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "no settings file, using defaults");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("failed to parse settings file {}", path.display()))?;
        info!(path = %path.display(), overrides = config.options.len(), "settings loaded");
        Ok(config)
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| PathBuf::from("data"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = AppConfig::load(Path::new("/nonexistent/powerplan.toml")).unwrap();
        assert!(config.options.is_empty());
        assert_eq!(config.data_dir(), PathBuf::from("data"));
    }

    #[test]
    fn test_options_table_parses_into_override_map() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("powerplan.toml");
        std::fs::write(
            &path,
            r#"
data_dir = "/tmp/plans"

[options]
b_cap = 12.0
heating_enabled = true
standard_mode = "Feedin Priority"
"#,
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.data_dir(), PathBuf::from("/tmp/plans"));
        assert_eq!(config.options["b_cap"], serde_json::json!(12.0));
        assert_eq!(config.options["heating_enabled"], serde_json::json!(true));
        assert_eq!(
            config.options["standard_mode"],
            serde_json::json!("Feedin Priority")
        );
    }

    #[test]
    fn test_malformed_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("powerplan.toml");
        std::fs::write(&path, "data_dir = [broken").unwrap();
        assert!(AppConfig::load(&path).is_err());
    }
}
