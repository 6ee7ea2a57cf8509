//! Soundcut - Audio Buffer Editing and Noise Reduction
//!
//! Soundcut is the processing core of a waveform editor. Callers decode a
//! file into a [`SampleBuffer`], run editing or denoising transforms over it,
//! and export the result as WAV (or MP3 through an external encoder).
//!
//! # Architecture
//!
//! - [`engine`]: the sample buffer, the Buffer Editor (trim, normalize, merge,
//!   resample), the WAV codec and the MP3 export driver
//! - [`dsp`]: the Noise-Reduction Engine (hum, click, de-ess, room tone)
//! - [`offload`]: request/response protocol for running work on a worker thread
//!
//! Every transform is a pure function: it borrows its input and returns a new
//! buffer, leaving the original available for undo.

pub mod dsp;
pub mod engine;
pub mod error;
pub mod offload;

pub use engine::SampleBuffer;
pub use error::{Result, SoundcutError};
