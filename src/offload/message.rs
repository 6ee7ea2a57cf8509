//! Worker message contract
//!
//! Requests and responses are plain serde values so the same shapes can be
//! carried over an in-process channel or serialized to JSON for a host that
//! runs the worker elsewhere. Sample data moves into the message by value.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dsp::NoiseReduction;
use crate::engine::SampleBuffer;
use crate::error::{Result, SoundcutError};

/// Caller-assigned id matching a response to its request
///
/// Opaque and scoped to one client/worker session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(pub u64);

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One unit of work for the worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerRequest {
    pub id: CorrelationId,
    #[serde(flatten)]
    pub operation: Operation,
}

/// Operations the worker can run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Operation {
    Trim {
        channels: Vec<Vec<f32>>,
        sample_rate: u32,
        start_time: f64,
        end_time: f64,
    },
    Normalize {
        channels: Vec<Vec<f32>>,
        sample_rate: u32,
    },
    EncodeWav {
        channels: Vec<Vec<f32>>,
        sample_rate: u32,
    },
    Denoise {
        channels: Vec<Vec<f32>>,
        sample_rate: u32,
        reduction: NoiseReduction,
    },
}

impl Operation {
    pub fn trim(buffer: SampleBuffer, start_time: f64, end_time: f64) -> Self {
        let sample_rate = buffer.sample_rate();
        Operation::Trim {
            channels: buffer.into_channels(),
            sample_rate,
            start_time,
            end_time,
        }
    }

    pub fn normalize(buffer: SampleBuffer) -> Self {
        let sample_rate = buffer.sample_rate();
        Operation::Normalize {
            channels: buffer.into_channels(),
            sample_rate,
        }
    }

    pub fn encode_wav(buffer: SampleBuffer) -> Self {
        let sample_rate = buffer.sample_rate();
        Operation::EncodeWav {
            channels: buffer.into_channels(),
            sample_rate,
        }
    }

    pub fn denoise(buffer: SampleBuffer, reduction: NoiseReduction) -> Self {
        let sample_rate = buffer.sample_rate();
        Operation::Denoise {
            channels: buffer.into_channels(),
            sample_rate,
            reduction,
        }
    }

    /// Wire tag of this operation
    pub fn tag(&self) -> &'static str {
        match self {
            Operation::Trim { .. } => "trim",
            Operation::Normalize { .. } => "normalize",
            Operation::EncodeWav { .. } => "encodeWav",
            Operation::Denoise { .. } => "denoise",
        }
    }
}

impl WorkerRequest {
    /// Parse a request posted by a host as JSON
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Worker reply, tagged with the id of the request it answers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerResponse {
    pub id: CorrelationId,
    #[serde(flatten)]
    pub payload: ResponsePayload,
}

impl WorkerResponse {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Serialize for a host that reads replies as JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Outcome of one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ResponsePayload {
    /// Transformed sample data
    Result {
        channels: Vec<Vec<f32>>,
        sample_rate: u32,
    },
    /// Encoded WAV file
    WavResult { bytes: Vec<u8> },
    /// Human-readable failure
    Error { message: String },
}

impl ResponsePayload {
    pub fn from_buffer(buffer: SampleBuffer) -> Self {
        let sample_rate = buffer.sample_rate();
        ResponsePayload::Result {
            channels: buffer.into_channels(),
            sample_rate,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ResponsePayload::Error { .. })
    }

    /// Take the sample data out of a `Result` payload
    ///
    /// An `Error` payload becomes `WorkerError` carrying its message.
    pub fn into_buffer(self) -> Result<SampleBuffer> {
        match self {
            ResponsePayload::Result {
                channels,
                sample_rate,
            } => SampleBuffer::from_channels(channels, sample_rate),
            ResponsePayload::WavResult { .. } => Err(SoundcutError::WorkerError {
                reason: "expected sample data, got encoded WAV bytes".to_string(),
            }),
            ResponsePayload::Error { message } => {
                Err(SoundcutError::WorkerError { reason: message })
            }
        }
    }

    /// Take the bytes out of a `WavResult` payload
    pub fn into_wav_bytes(self) -> Result<Vec<u8>> {
        match self {
            ResponsePayload::WavResult { bytes } => Ok(bytes),
            ResponsePayload::Result { .. } => Err(SoundcutError::WorkerError {
                reason: "expected encoded WAV bytes, got sample data".to_string(),
            }),
            ResponsePayload::Error { message } => {
                Err(SoundcutError::WorkerError { reason: message })
            }
        }
    }
}
