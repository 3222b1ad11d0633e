//! Error types shared across the crate.

use thiserror::Error;
use validator::ValidationErrors;

/// Errors raised by the score calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ScoreError {
    /// The raw game number does not name one of the four games.
    #[error("unknown game id {0}")]
    UnknownGame(u8),
}

/// Errors raised while reading the configuration document.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document is not valid JSON for the expected shape.
    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),
    /// The document parsed but its content is unusable.
    #[error("invalid config: {0}")]
    Invalid(#[from] ValidationErrors),
}
