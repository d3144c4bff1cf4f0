//! Error types for the sketch board

use thiserror::Error;

/// Result type alias for board operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving the board
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error (including a missing credential)
    #[error("configuration error: {0}")]
    Config(String),

    /// Empty or malformed canvas capture
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// Vision/chat API failure (network, status, malformed response)
    #[error("inference error: {0}")]
    Inference(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Whether this error should be shown as a configuration notice
    /// rather than as a failed action
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Whether this error came from a remote model or speech call
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::Inference(_) | Self::Tts(_) | Self::Http(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(Error::Config("missing key".to_string()).is_configuration());
        assert!(!Error::Inference("boom".to_string()).is_configuration());
        assert!(Error::Inference("boom".to_string()).is_remote());
        assert!(Error::Tts("boom".to_string()).is_remote());
        assert!(!Error::InvalidImage("empty".to_string()).is_remote());
    }

    #[test]
    fn test_message_is_verbatim() {
        let err = Error::Inference("API error 401: invalid key".to_string());
        assert_eq!(err.to_string(), "inference error: API error 401: invalid key");
    }
}
