//! Configuration file handling.
//!
//! Settings live in `~/.config/bookvox/config.toml`; a default file is
//! written on first run. CLI flags override file values, which override the
//! built-in defaults.

use crate::defaults;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Piper voice model name or path.
    pub model: String,
    /// Directory finished audiobooks are written to.
    pub output: String,
    /// Concurrent section conversions; 0 means one worker per section.
    pub threads: usize,
    /// Speak UTF-8 characters instead of transliterating to ASCII.
    pub speak_utf8: bool,
    /// Produce MP3 output (WAV otherwise).
    pub mp3: bool,
    /// Split epubs into chapter-tagged sections.
    pub chapters: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: defaults::DEFAULT_MODEL.to_string(),
            output: defaults::DEFAULT_OUTPUT_DIR.to_string(),
            threads: defaults::DEFAULT_THREADS,
            speak_utf8: false,
            mp3: true,
            chapters: false,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// Missing fields take their default values; invalid TOML is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration, falling back to defaults only when the file does
    /// not exist. Invalid TOML still fails.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(crate::error::BookvoxError::Io(e))
                if e.kind() == std::io::ErrorKind::NotFound =>
            {
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Apply environment variable overrides.
    ///
    /// Supported: `BOOKVOX_MODEL`, `BOOKVOX_OUTPUT`.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(model) = std::env::var("BOOKVOX_MODEL")
            && !model.is_empty()
        {
            self.model = model;
        }

        if let Ok(output) = std::env::var("BOOKVOX_OUTPUT")
            && !output.is_empty()
        {
            self.output = output;
        }

        self
    }

    /// `~/.config/bookvox/config.toml` on Linux.
    pub fn default_path() -> PathBuf {
        app_dir().join("config.toml")
    }

    /// Write a default config file if none exists yet. Returns whether one
    /// was created.
    pub fn write_default_if_missing(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let rendered = toml::to_string_pretty(&Config::default())
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        fs::write(path, rendered)?;
        Ok(true)
    }
}

/// `~/.config/bookvox` - holds the config file and installed voice models.
pub fn app_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join(defaults::APP_DIR)
}

/// Expand a leading `~` to the user's home directory.
///
/// Shells do this for interactive use; doing it here too keeps config-file
/// paths and programmatic callers working the same way.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest.trim_start_matches('/'));
        }
    }
    PathBuf::from(path)
}
