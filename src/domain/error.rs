use thiserror::Error;

/// Domain-level errors for Roundbell.
///
/// These only surface out of the capability ports and adapters. The timer
/// engine itself never returns them: notification failures are caught at the
/// call site and logged, and invalid state transitions are guarded no-ops.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Speech error: {0}")]
    Speech(String),

    #[error("Speech synthesis not supported on this platform")]
    SpeechUnsupported,

    #[error("Audio error: {0}")]
    Audio(String),

    #[error("Audio device error: {message}")]
    AudioDevice { message: String },

    #[error("Haptics error: {0}")]
    Haptics(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        DomainError::Io(err.to_string())
    }
}
