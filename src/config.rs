use std::fs;
use std::io;
use std::path::Path;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Editor settings
// ─────────────────────────────────────────────────────────────────────────────

/// Knobs for the edit operations. Every field has a default, so a config file
/// only needs to name the settings it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Enter at the end of a heading or blockquote continues with a
    /// paragraph instead of another block of the same kind.
    pub heading_break_creates_paragraph: bool,

    /// Run the similar-element sanitizer after each applied operation.
    pub sanitize_after_edit: bool,

    /// Turn spaces that end up at a line boundary into non-breaking spaces.
    pub nbsp_at_boundaries: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            heading_break_creates_paragraph: true,
            sanitize_after_edit: true,
            nbsp_at_boundaries: true,
        }
    }
}

impl EditorConfig {
    /// Parses TOML text; missing keys keep their defaults.
    pub fn from_toml(text: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn to_toml(&self) -> String {
        // Plain booleans always serialize.
        toml::to_string(self).unwrap_or_default()
    }

    /// Loads settings from `path`.
    ///
    /// A missing file yields the defaults with a warning. An unreadable or
    /// malformed file is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                warn!("Config file {} not found, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(Error::ConfigRead {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        if contents.trim().is_empty() {
            debug!("Config file {} is empty, using defaults", path.display());
            return Ok(Self::default());
        }

        let config = Self::from_toml(&contents).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Loaded editor config from {}: {:?}", path.display(), config);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_everything() {
        let config = EditorConfig::default();
        assert!(config.heading_break_creates_paragraph);
        assert!(config.sanitize_after_edit);
        assert!(config.nbsp_at_boundaries);
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config = EditorConfig::from_toml("nbsp_at_boundaries = false\n").unwrap();
        assert!(!config.nbsp_at_boundaries);
        assert!(config.sanitize_after_edit);
        assert!(config.heading_break_creates_paragraph);
    }

    #[test]
    fn toml_round_trip() {
        let config = EditorConfig {
            heading_break_creates_paragraph: false,
            ..EditorConfig::default()
        };
        let text = config.to_toml();
        assert!(text.contains("heading_break_creates_paragraph = false"));
        assert_eq!(EditorConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn rejects_wrong_types() {
        assert!(EditorConfig::from_toml("sanitize_after_edit = \"yes\"").is_err());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = EditorConfig::load(Path::new("/nonexistent/pure-blocks.toml")).unwrap();
        assert_eq!(config, EditorConfig::default());
    }
}
