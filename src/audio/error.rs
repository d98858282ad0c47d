use thiserror::Error;

/// Failure while decoding, resampling or writing audio.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("audio I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// No decoder could make sense of the input.
    #[error("unsupported or undecodable audio: {0}")]
    Decode(String),

    #[error("WAV encode failed: {0}")]
    Encode(#[from] hound::Error),

    #[error("resampling failed: {0}")]
    Resample(String),
}
