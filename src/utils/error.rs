//! Error Handling Module
//!
//! Defines the error type for Caltech dataset operations.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Main error type for Caltech dataset operations
#[derive(Error, Debug)]
pub enum CaltechError {
    /// IO error, propagated unchanged from the filesystem
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decoding error, propagated unchanged from the image crate
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Argument outside its accepted domain
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Sample index outside `[0, len)`
    #[error("Index {index} out of range for dataset of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for CaltechError {
    fn from(err: serde_json::Error) -> Self {
        CaltechError::Serialization(err.to_string())
    }
}

/// Convenience Result type for Caltech dataset operations
pub type Result<T> = std::result::Result<T, CaltechError>;

/// Extension trait for turning foreign errors into configuration errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, msg: &str) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: std::error::Error> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, msg: &str) -> Result<T> {
        self.map_err(|e| CaltechError::Config(format!("{}: {}", msg, e)))
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| CaltechError::Config(format!("{}: {}", f(), e)))
    }
}

impl<T> ResultExt<T> for Option<T> {
    fn context(self, msg: &str) -> Result<T> {
        self.ok_or_else(|| CaltechError::Config(msg.to_string()))
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.ok_or_else(|| CaltechError::Config(f()))
    }
}
