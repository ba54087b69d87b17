//! Configuration persistence for Modal
//!
//! Stores segmenter tuning and the cache location in a simple key=value file.

use modal_analysis::{SegmenterConfig, Spelling};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    /// Segmenter tuning
    pub segmenter: SegmenterConfig,
    /// Segment cache database (None = default location)
    pub cache_path: Option<PathBuf>,
}

impl Config {
    /// Load config from the default location
    ///
    /// Returns default config if the file doesn't exist or can't be read.
    pub fn load() -> Self {
        let path = Self::config_path();
        Self::load_from(&path).unwrap_or_else(|e| {
            tracing::debug!("Using default config ({}): {}", path.display(), e);
            Self::default()
        })
    }

    /// Load config from a specific path
    pub fn load_from(path: &Path) -> io::Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    /// Save config to the default location
    pub fn save(&self) -> io::Result<()> {
        let path = Self::config_path();
        self.save_to(&path)
    }

    /// Save config to a specific path
    pub fn save_to(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, self.serialize())
    }

    /// Get the default config file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("modal")
            .join("config.txt")
    }

    /// Segment cache location, falling back to the user cache directory
    pub fn cache_db_path(&self) -> PathBuf {
        self.cache_path.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("modal")
                .join("segments.db")
        })
    }

    /// Parse config from simple key=value format
    fn parse(content: &str) -> Self {
        let mut config = Self::default();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim();

            match key.trim() {
                "min_scoring_notes" => match value.parse::<usize>() {
                    Ok(n) => config.segmenter.min_scoring_notes = n.max(2),
                    Err(_) => tracing::warn!("Ignoring invalid min_scoring_notes '{}'", value),
                },
                "default_spelling" => match Spelling::parse(value) {
                    Some(spelling) => config.segmenter.default_spelling = spelling,
                    None => tracing::warn!("Ignoring invalid default_spelling '{}'", value),
                },
                "merge_single_note_tails" => match value.parse::<bool>() {
                    Ok(merge) => config.segmenter.merge_single_note_tails = merge,
                    Err(_) => {
                        tracing::warn!("Ignoring invalid merge_single_note_tails '{}'", value)
                    }
                },
                "cache_path" => {
                    if !value.is_empty() {
                        config.cache_path = Some(PathBuf::from(value));
                    }
                }
                _ => {} // Ignore unknown keys
            }
        }

        config
    }

    /// Serialize config to simple key=value format
    fn serialize(&self) -> String {
        let mut lines = vec![
            "# Modal Configuration".to_string(),
            format!("min_scoring_notes={}", self.segmenter.min_scoring_notes),
            format!(
                "default_spelling={}",
                self.segmenter.default_spelling.as_str()
            ),
            format!(
                "merge_single_note_tails={}",
                self.segmenter.merge_single_note_tails
            ),
        ];

        if let Some(ref path) = self.cache_path {
            lines.push(format!("cache_path={}", path.display()));
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty() {
        let config = Config::parse("");
        assert_eq!(config, Config::default());
        assert_eq!(config.segmenter.min_scoring_notes, 3);
        assert_eq!(config.segmenter.default_spelling, Spelling::Flats);
    }

    #[test]
    fn test_parse_values() {
        let content = "# Comment\nmin_scoring_notes=4\ndefault_spelling=sharps\n\
                       merge_single_note_tails=false\ncache_path=/tmp/modal.db";
        let config = Config::parse(content);
        assert_eq!(config.segmenter.min_scoring_notes, 4);
        assert_eq!(config.segmenter.default_spelling, Spelling::Sharps);
        assert!(!config.segmenter.merge_single_note_tails);
        assert_eq!(config.cache_path, Some(PathBuf::from("/tmp/modal.db")));
        assert_eq!(config.cache_db_path(), PathBuf::from("/tmp/modal.db"));
    }

    #[test]
    fn test_parse_invalid_values_keep_defaults() {
        let content = "min_scoring_notes=many\ndefault_spelling=both\nunknown=1\nno equals sign";
        let config = Config::parse(content);
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_min_scoring_notes_clamped() {
        let config = Config::parse("min_scoring_notes=1");
        assert_eq!(config.segmenter.min_scoring_notes, 2);
    }

    #[test]
    fn test_serialize_roundtrip() {
        let mut config = Config::default();
        config.segmenter.default_spelling = Spelling::Sharps;
        config.segmenter.merge_single_note_tails = false;
        config.cache_path = Some(PathBuf::from("/test/segments.db"));

        let parsed = Config::parse(&config.serialize());
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_save_and_load_file() {
        let path = std::env::temp_dir()
            .join(format!("modal-config-test-{}", std::process::id()))
            .join("config.txt");
        let mut config = Config::default();
        config.segmenter.min_scoring_notes = 5;

        config.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);

        if let Some(dir) = path.parent() {
            let _ = fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn test_load_missing_file() {
        let path = std::env::temp_dir().join("modal-config-does-not-exist.txt");
        assert!(Config::load_from(&path).is_err());
    }
}
