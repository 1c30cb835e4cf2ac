use thiserror::Error;

pub type Result<T, E = VoiceError> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum VoiceError {
    #[error("recognition already started")]
    AlreadyStarted,
    #[error("recognition engine failed to start: {0}")]
    RecognitionStart(String),
    #[error("synthesis engine rejected utterance: {0}")]
    Synthesis(String),
    #[error("engine not available: {0}")]
    Unavailable(&'static str),
}
