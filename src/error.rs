//! Error types for bookvox.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BookvoxError {
    // Configuration errors - surfaced before any conversion work begins
    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // External tool errors
    #[error("{tool} not found in PATH. Install it with your package manager")]
    ToolNotFound { tool: String },

    #[error("{tool} exited with {status}\nstderr:\n{stderr}")]
    Subprocess {
        tool: String,
        status: String,
        stderr: String,
    },

    // Section content errors
    #[error("No usable text in {name}: {reason}")]
    EmptyContent { name: String, reason: String },

    #[error("Failed to open book: {message}")]
    BookOpen { message: String },

    #[error("No sections of {name} produced any audio")]
    NoAudio { name: String },

    // Voice model errors
    #[error("Voice model '{name}' not found: {message}")]
    ModelNotFound { name: String, message: String },

    #[error("Download of {url} failed: {message}")]
    Download { url: String, message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, BookvoxError>;
