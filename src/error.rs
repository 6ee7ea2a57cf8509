//! Error handling for Soundcut
//!
//! Every failure the engine can raise is a variant of [`SoundcutError`].
//! Transforms fail fast: a call either returns a complete buffer or an error,
//! never a partially processed result.

use thiserror::Error;

/// Result type alias for Soundcut operations
pub type Result<T> = std::result::Result<T, SoundcutError>;

/// Main error type for Soundcut operations
#[derive(Error, Debug)]
pub enum SoundcutError {
    // Input Errors
    #[error("The input '{name}' is empty or could not be read")]
    EmptyOrUnreadableInput { name: String },

    #[error("Unable to decode '{name}': {reason}")]
    DecodeFailed {
        name: String,
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    // Editing Errors
    #[error("No buffers to merge")]
    EmptyInput,

    #[error("Sample range {start}..{end} is outside the buffer (length {len})")]
    OutOfRange { start: i64, end: i64, len: usize },

    #[error("Sample rate mismatch: expected {expected} Hz, found {found} Hz")]
    SampleRateMismatch { expected: u32, found: u32 },

    #[error("Channel count mismatch: expected {expected}, found {found}")]
    ChannelCountMismatch { expected: usize, found: usize },

    #[error("Invalid sample buffer: {reason}")]
    InvalidBuffer { reason: String },

    // Processing Errors
    #[error("Unsupported noise reduction mode: {mode}")]
    UnsupportedMode { mode: String },

    #[error("Invalid parameter '{param}': {value} (expected {expected})")]
    InvalidParameter {
        param: String,
        value: String,
        expected: String,
    },

    #[error("Encoder error: {reason}")]
    Encoder { reason: String },

    // Offload Errors
    #[error("Worker error: {reason}")]
    WorkerError { reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SoundcutError {
    /// Shorthand for an [`SoundcutError::InvalidParameter`]
    pub(crate) fn invalid_param(
        param: &str,
        value: impl ToString,
        expected: &str,
    ) -> Self {
        SoundcutError::InvalidParameter {
            param: param.to_string(),
            value: value.to_string(),
            expected: expected.to_string(),
        }
    }

    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            SoundcutError::EmptyOrUnreadableInput { .. } => "EMPTY_OR_UNREADABLE_INPUT",
            SoundcutError::DecodeFailed { .. } => "DECODE_FAILED",
            SoundcutError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            SoundcutError::EmptyInput => "EMPTY_INPUT",
            SoundcutError::OutOfRange { .. } => "OUT_OF_RANGE",
            SoundcutError::SampleRateMismatch { .. } => "SAMPLE_RATE_MISMATCH",
            SoundcutError::ChannelCountMismatch { .. } => "CHANNEL_COUNT_MISMATCH",
            SoundcutError::InvalidBuffer { .. } => "INVALID_BUFFER",
            SoundcutError::UnsupportedMode { .. } => "UNSUPPORTED_MODE",
            SoundcutError::InvalidParameter { .. } => "INVALID_PARAMETER",
            SoundcutError::Encoder { .. } => "ENCODER_ERROR",
            SoundcutError::WorkerError { .. } => "WORKER_ERROR",
            SoundcutError::Io(_) => "IO_ERROR",
            SoundcutError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if the caller can reasonably retry with different input
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SoundcutError::EmptyOrUnreadableInput { .. }
                | SoundcutError::DecodeFailed { .. }
                | SoundcutError::UnsupportedFormat { .. }
                | SoundcutError::OutOfRange { .. }
                | SoundcutError::SampleRateMismatch { .. }
                | SoundcutError::ChannelCountMismatch { .. }
                | SoundcutError::InvalidParameter { .. }
                | SoundcutError::WorkerError { .. }
        )
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            SoundcutError::EmptyOrUnreadableInput { .. } => vec![
                "Check that the file is not empty",
                "Try selecting the file again",
            ],
            SoundcutError::DecodeFailed { .. } => vec![
                "Try converting the file to WAV format first",
                "Check if the file plays in another application",
                "The file may be corrupted - try re-exporting from source",
            ],
            SoundcutError::UnsupportedFormat { .. } => vec![
                "Supported MP3 bitrates: 64, 128, 192, 256, 320 kbps",
                "Supported MP3 sample rates: 22050, 44100, 48000 Hz",
            ],
            SoundcutError::EmptyInput => vec!["Add at least one track before merging"],
            SoundcutError::OutOfRange { .. } => vec![
                "Keep the selection within the track duration",
            ],
            SoundcutError::SampleRateMismatch { .. }
            | SoundcutError::ChannelCountMismatch { .. } => {
                vec![
                    "Resample the tracks to a common sample rate before merging",
                    "Merge only tracks with the same channel layout",
                ]
            }
            SoundcutError::WorkerError { .. } => vec![
                "Retry the operation",
                "Run the operation on the calling thread instead",
            ],
            _ => vec![],
        }
    }

    /// Get a user-friendly message for this error
    pub fn friendly_message(&self) -> String {
        match self {
            SoundcutError::EmptyOrUnreadableInput { .. } => {
                "The selected file is empty or invalid.".to_string()
            }
            SoundcutError::DecodeFailed { name, .. } => format!(
                "Unable to decode \"{}\". The file may be corrupted or in an unsupported format.",
                name
            ),
            SoundcutError::EmptyInput => "There is nothing to merge yet.".to_string(),
            SoundcutError::OutOfRange { .. } => {
                "The selected region extends past the end of the audio.".to_string()
            }
            _ => self.to_string(),
        }
    }
}
