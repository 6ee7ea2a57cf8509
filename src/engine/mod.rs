//! Audio Engine Module
//!
//! Sample storage and the non-realtime editing operations:
//! - Sample buffer and level helpers
//! - Trim, normalize, merge and resample
//! - WAV encoding and container decoding
//! - MP3 export driver

pub mod buffer;
pub mod editor;
pub mod mp3;
pub mod wav;

pub use buffer::{generate_stereo_test_tone, generate_test_tone, SampleBuffer};
pub use editor::{merge, normalize, resample, time_to_sample, trim};
pub use mp3::{
    export_mp3, Mp3Bitrate, Mp3Encoder, Mp3ExportSettings, Mp3SampleRate, Mp3StreamFormat,
};
pub use wav::{
    decode_audio, encode_wav, read_audio_file, write_wav_file, AudioDecoder, HoundDecoder,
};
