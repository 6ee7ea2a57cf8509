//! MP3 export driver
//!
//! The bitstream encoder itself is an external collaborator behind the
//! [`Mp3Encoder`] trait. This module prepares what it consumes: the buffer is
//! resampled to the requested rate, converted to 16-bit PCM with the same
//! clamp-and-scale rule as the WAV codec, and fed in blocks of
//! [`MP3_BLOCK_SIZE`] samples per channel.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::engine::buffer::SampleBuffer;
use crate::engine::editor::resample;
use crate::engine::wav::float_to_i16;
use crate::error::{Result, SoundcutError};

/// Samples per channel handed to the encoder in one call (one MPEG-1 Layer III frame)
pub const MP3_BLOCK_SIZE: usize = 1152;

/// Supported constant bitrates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Mp3Bitrate {
    Kbps64,
    #[default]
    Kbps128,
    Kbps192,
    Kbps256,
    Kbps320,
}

impl Mp3Bitrate {
    /// Bitrate in kilobits per second
    pub fn kbps(self) -> u32 {
        match self {
            Mp3Bitrate::Kbps64 => 64,
            Mp3Bitrate::Kbps128 => 128,
            Mp3Bitrate::Kbps192 => 192,
            Mp3Bitrate::Kbps256 => 256,
            Mp3Bitrate::Kbps320 => 320,
        }
    }
}

impl TryFrom<u32> for Mp3Bitrate {
    type Error = SoundcutError;

    fn try_from(kbps: u32) -> Result<Self> {
        match kbps {
            64 => Ok(Mp3Bitrate::Kbps64),
            128 => Ok(Mp3Bitrate::Kbps128),
            192 => Ok(Mp3Bitrate::Kbps192),
            256 => Ok(Mp3Bitrate::Kbps256),
            320 => Ok(Mp3Bitrate::Kbps320),
            other => Err(SoundcutError::UnsupportedFormat {
                format: format!("{} kbps MP3", other),
            }),
        }
    }
}

impl From<Mp3Bitrate> for u32 {
    fn from(bitrate: Mp3Bitrate) -> u32 {
        bitrate.kbps()
    }
}

/// Supported output sample rates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Mp3SampleRate {
    Hz22050,
    #[default]
    Hz44100,
    Hz48000,
}

impl Mp3SampleRate {
    /// Sample rate in Hz
    pub fn hz(self) -> u32 {
        match self {
            Mp3SampleRate::Hz22050 => 22050,
            Mp3SampleRate::Hz44100 => 44100,
            Mp3SampleRate::Hz48000 => 48000,
        }
    }
}

impl TryFrom<u32> for Mp3SampleRate {
    type Error = SoundcutError;

    fn try_from(hz: u32) -> Result<Self> {
        match hz {
            22050 => Ok(Mp3SampleRate::Hz22050),
            44100 => Ok(Mp3SampleRate::Hz44100),
            48000 => Ok(Mp3SampleRate::Hz48000),
            other => Err(SoundcutError::UnsupportedFormat {
                format: format!("{} Hz MP3", other),
            }),
        }
    }
}

impl From<Mp3SampleRate> for u32 {
    fn from(rate: Mp3SampleRate) -> u32 {
        rate.hz()
    }
}

/// Caller-selected MP3 export options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Mp3ExportSettings {
    pub bitrate: Mp3Bitrate,
    pub sample_rate: Mp3SampleRate,
}

/// Stream parameters the encoder is constructed with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mp3StreamFormat {
    /// 1 (mono) or 2 (stereo)
    pub channels: u16,
    pub sample_rate: u32,
    pub bitrate_kbps: u32,
}

/// External MP3 bitstream encoder
pub trait Mp3Encoder {
    /// Encode one block of up to [`MP3_BLOCK_SIZE`] samples per channel
    ///
    /// `right` is `None` for mono streams. The returned bytes may be empty
    /// while the encoder is buffering.
    fn encode_block(&mut self, left: &[i16], right: Option<&[i16]>) -> Result<Vec<u8>>;

    /// Drain whatever the encoder still holds
    fn flush(&mut self) -> Result<Vec<u8>>;
}

/// Convert one channel to 16-bit PCM
pub fn channel_to_pcm16(samples: &[f32]) -> Vec<i16> {
    samples.iter().map(|&s| float_to_i16(s)).collect()
}

/// Encode `buffer` to an MP3 byte stream
///
/// `make_encoder` receives the stream format and builds the encoder. Mono
/// buffers are encoded as mono; buffers with two or more channels are
/// encoded from their first two channels.
pub fn export_mp3<E, F>(
    buffer: &SampleBuffer,
    settings: Mp3ExportSettings,
    make_encoder: F,
) -> Result<Vec<u8>>
where
    E: Mp3Encoder,
    F: FnOnce(Mp3StreamFormat) -> Result<E>,
{
    let target_rate = settings.sample_rate.hz();
    let resampled;
    let source = if buffer.sample_rate() != target_rate {
        resampled = resample(buffer, target_rate)?;
        &resampled
    } else {
        buffer
    };

    if source.channel_count() > 2 {
        warn!(
            channels = source.channel_count(),
            "MP3 export keeps only the first two channels"
        );
    }

    let left = channel_to_pcm16(source.channel(0));
    let right = (source.channel_count() >= 2).then(|| channel_to_pcm16(source.channel(1)));

    let format = Mp3StreamFormat {
        channels: if right.is_some() { 2 } else { 1 },
        sample_rate: target_rate,
        bitrate_kbps: settings.bitrate.kbps(),
    };
    debug!(?format, frames = left.len(), "exporting MP3");

    let mut encoder = make_encoder(format)?;
    let mut output = Vec::new();

    for (block, left_chunk) in left.chunks(MP3_BLOCK_SIZE).enumerate() {
        let right_chunk = right.as_ref().map(|r| {
            let start = block * MP3_BLOCK_SIZE;
            &r[start..start + left_chunk.len()]
        });
        output.extend(encoder.encode_block(left_chunk, right_chunk)?);
    }

    output.extend(encoder.flush()?);
    Ok(output)
}

// ============================================================================
// Tests
// ============================================================================
