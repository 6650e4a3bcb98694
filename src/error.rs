//! Error types for the touchpoint tracker.
//!
//! The codec and store deliberately have no error paths: malformed wire
//! input degrades to an empty or partial touch list so the response
//! pipeline is never disrupted. The only fallible surface is
//! configuration.

/// Result type for tracker operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Tracker errors with structured context.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Configuration failed validation.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
