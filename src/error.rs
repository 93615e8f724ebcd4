//! Error handling for Loopcutter
//!
//! Every error carries a stable code and, where the caller can do something
//! about it, a list of recovery suggestions.

use thiserror::Error;

/// Result type alias for Loopcutter operations
pub type Result<T> = std::result::Result<T, LoopError>;

/// Main error type for Loopcutter operations
#[derive(Error, Debug)]
pub enum LoopError {
    // Input Errors
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid audio file: {reason}")]
    InvalidAudio {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    // Core Errors
    #[error("Invalid selection [{start}, {end}): {reason}")]
    InvalidSelection { start: f64, end: f64, reason: String },

    #[error("Cannot export an empty loop collection")]
    EmptyCollection,

    #[error("Malformed source buffer: {reason}")]
    MalformedSourceBuffer { reason: String },

    // Session Errors
    #[error("Unknown target device: {name}")]
    UnknownDevice { name: String },

    #[error("Loop not found: {id}")]
    LoopNotFound { id: String },

    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LoopError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            LoopError::FileNotFound { .. } => "FILE_NOT_FOUND",
            LoopError::InvalidAudio { .. } => "INVALID_AUDIO",
            LoopError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            LoopError::InvalidSelection { .. } => "INVALID_SELECTION",
            LoopError::EmptyCollection => "EMPTY_COLLECTION",
            LoopError::MalformedSourceBuffer { .. } => "MALFORMED_SOURCE_BUFFER",
            LoopError::UnknownDevice { .. } => "UNKNOWN_DEVICE",
            LoopError::LoopNotFound { .. } => "LOOP_NOT_FOUND",
            LoopError::Config { .. } => "CONFIG_ERROR",
            LoopError::Io(_) => "IO_ERROR",
            LoopError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if the caller can recover by adjusting its input and retrying
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            LoopError::FileNotFound { .. }
                | LoopError::InvalidAudio { .. }
                | LoopError::UnsupportedFormat { .. }
                | LoopError::InvalidSelection { .. }
                | LoopError::EmptyCollection
                | LoopError::UnknownDevice { .. }
                | LoopError::Config { .. }
        )
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            LoopError::FileNotFound { .. } => vec![
                "Check the file path is correct",
                "Verify the file hasn't been moved or deleted",
            ],
            LoopError::InvalidAudio { .. } => vec![
                "Try converting the file to WAV format first",
                "Check if the file plays in another application",
            ],
            LoopError::UnsupportedFormat { .. } => vec![
                "Convert to 16-bit or 24-bit PCM WAV",
                "Supported inputs: WAV (8/16/24/32-bit int, 32-bit float)",
            ],
            LoopError::InvalidSelection { .. } => vec![
                "Make sure the selection end is after its start",
                "Widen the selection so it covers at least one sample",
            ],
            LoopError::EmptyCollection => vec!["Collect at least one loop before exporting"],
            LoopError::UnknownDevice { .. } => vec![
                "Run 'loopcutter-cli devices' to list supported targets",
            ],
            LoopError::Config { .. } => vec![
                "Check the configuration file against the documented defaults",
                "Delete the configuration file to fall back to defaults",
            ],
            _ => vec![],
        }
    }
}
