//! Error types for Monologue.

use thiserror::Error;

/// Result type alias using Monologue's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Monologue.
#[derive(Error, Debug)]
pub enum Error {
    // Feed ingestion errors
    #[error("Malformed feed: {0}")]
    Parse(String),

    // Playback errors
    #[error("Episode has no playable media URL")]
    NoMediaUrl,

    #[error("Invalid media URL {url:?}: {reason}")]
    InvalidMediaUrl { url: String, reason: String },

    #[error("Decoder error: {0}")]
    Decoder(String),

    #[error("Player has shut down")]
    PlayerClosed,

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns true if this error came from the playback side (media URL
    /// validation or the decoder) rather than feed ingestion.
    pub const fn is_playback(&self) -> bool {
        matches!(
            self,
            Self::NoMediaUrl | Self::InvalidMediaUrl { .. } | Self::Decoder(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_is_playback() {
        assert!(Error::NoMediaUrl.is_playback());
        assert!(Error::Decoder("codec fault".into()).is_playback());
        assert!(!Error::Parse("truncated".into()).is_playback());
    }

    #[test]
    fn test_error_display() {
        let err = Error::Parse("unexpected end of document".into());
        assert_eq!(err.to_string(), "Malformed feed: unexpected end of document");

        let err = Error::InvalidMediaUrl {
            url: "htp:/nope".into(),
            reason: "relative URL without a base".into(),
        };
        assert!(err.to_string().contains("htp:/nope"));
    }
}
