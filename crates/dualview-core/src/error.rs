//! Error types for Dualview Core

use thiserror::Error;

/// Result type alias for controller operations
pub type Result<T> = std::result::Result<T, Error>;

/// Controller error types
#[derive(Error, Debug)]
pub enum Error {
    // Operator input errors
    #[error("Not a recognised video reference: {0}")]
    InvalidVideoReference(String),

    #[error("Invalid scale {0}: must be finite and greater than zero")]
    InvalidScale(f64),

    #[error("Invalid volume {0}: must be between 0 and 100")]
    InvalidVolume(u32),

    #[error("Unknown display: {id}")]
    UnknownDisplay { id: i64 },

    // Local media errors
    #[error("Not a local media URL: {0}")]
    NotAMediaUrl(String),

    #[error("Path cannot be expressed as a media URL: {0}")]
    InvalidMediaPath(String),

    // External dependency errors
    #[error("Embedded player failed to initialize: {0}")]
    EmbedInit(String),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an embedded-player initialization error
    pub fn embed(msg: impl Into<String>) -> Self {
        Error::EmbedInit(msg.into())
    }

    /// Returns true if the surfaces keep running after this error.
    ///
    /// Only configuration and IO failures during bootstrap are fatal; every
    /// runtime condition degrades to a no-op.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Error::InvalidConfig(_) | Error::Io(_) | Error::Json(_))
    }

    /// Returns the error code used in log fields
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::InvalidVideoReference(_) => "INVALID_VIDEO_REF",
            Error::InvalidScale(_) => "INVALID_SCALE",
            Error::InvalidVolume(_) => "INVALID_VOLUME",
            Error::UnknownDisplay { .. } => "UNKNOWN_DISPLAY",
            Error::NotAMediaUrl(_) => "NOT_MEDIA_URL",
            Error::InvalidMediaPath(_) => "INVALID_MEDIA_PATH",
            Error::EmbedInit(_) => "EMBED_INIT",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::Io(_) => "IO",
            Error::Json(_) => "JSON",
        }
    }
}
