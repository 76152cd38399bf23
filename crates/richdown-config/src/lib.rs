//! Configuration for richdown hosts and the CLI.
//!
//! A small TOML file (`richdown.toml`) controlling parse behavior: whether
//! typographic replacements and emoji shortcuts apply, and which custom
//! emoji shortcodes the session's table should carry beyond the standard
//! set.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub parsing: ParsingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ParsingConfig {
    /// Apply typographic replacements (`...` → `…`, `(tm)` → `™`).
    pub typographics: bool,
    /// Expand text smilies (`:)`, `;)`) to emoji.
    pub emoji_shortcuts: bool,
    /// Extra shortcodes recognized alongside the standard emoji table.
    pub custom_emoji: Vec<String>,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            typographics: true,
            emoji_shortcuts: true,
            custom_emoji: Vec::new(),
        }
    }
}

impl Config {
    /// Load from an explicit path. Returns `Ok(None)` when the file does
    /// not exist (defaults apply).
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        Ok(Some(config))
    }

    /// Load from the default location, honoring `RICHDOWN_CONFIG` (with
    /// `~` expansion) as an override.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        Self::load_from_path(Self::config_path())
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("RICHDOWN_CONFIG") {
            return PathBuf::from(shellexpand::tilde(&path).into_owned());
        }
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home)
            .join(".config")
            .join("richdown")
            .join("richdown.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Config::load_from_path(dir.path().join("absent.toml")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("richdown.toml");

        let config = Config {
            parsing: ParsingConfig {
                typographics: false,
                emoji_shortcuts: true,
                custom_emoji: vec!["partyparrot".to_string()],
            },
        };
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_from_path(&path).unwrap().unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn partial_files_fill_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("richdown.toml");
        std::fs::write(&path, "[parsing]\ntypographics = false\n").unwrap();

        let loaded = Config::load_from_path(&path).unwrap().unwrap();
        assert!(!loaded.parsing.typographics);
        assert!(loaded.parsing.emoji_shortcuts);
        assert!(loaded.parsing.custom_emoji.is_empty());
    }

    #[test]
    fn malformed_toml_reports_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("richdown.toml");
        std::fs::write(&path, "not valid toml [[[").unwrap();

        let err = Config::load_from_path(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ConfigParseError { .. }));
        assert!(err.to_string().contains("richdown.toml"));
    }
}
