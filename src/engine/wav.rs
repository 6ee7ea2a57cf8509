//! WAV codec
//!
//! Encoding always produces the canonical 44-byte-header, 16-bit PCM,
//! little-endian, frame-interleaved container, whatever the channel count.
//!
//! Decoding is delegated to an [`AudioDecoder`] collaborator. The engine
//! never decompresses MP3/OGG/AAC itself; hosts plug in a platform decoder.
//! [`HoundDecoder`] is the built-in implementation for PCM and float WAV.

use std::io::Cursor;
use std::path::Path;

use hound::{SampleFormat, WavReader};
use tracing::debug;

use crate::engine::buffer::SampleBuffer;
use crate::error::{Result, SoundcutError};

/// Size of the canonical RIFF/WAVE header in bytes
pub const WAV_HEADER_LEN: usize = 44;

const PCM_FORMAT: u16 = 1;
const BITS_PER_SAMPLE: u16 = 16;
const BYTES_PER_SAMPLE: u16 = BITS_PER_SAMPLE / 8;

/// Convert a float sample to 16-bit signed PCM
///
/// The sample is clamped to [-1.0, 1.0]; negative values scale by 32768 and
/// non-negative values by 32767, so both ends of the range map without
/// overflow.
#[inline]
pub fn float_to_i16(sample: f32) -> i16 {
    let s = sample.clamp(-1.0, 1.0);
    if s < 0.0 {
        (s * 32768.0) as i16
    } else {
        (s * 32767.0) as i16
    }
}

/// Inverse of [`float_to_i16`]
#[inline]
pub fn i16_to_float(sample: i16) -> f32 {
    if sample < 0 {
        sample as f32 / 32768.0
    } else {
        sample as f32 / 32767.0
    }
}

/// Encode a buffer as a 16-bit PCM WAV byte stream
///
/// # Errors
/// * `UnsupportedFormat` - if the channel count or data size cannot be
///   described by the 32-bit RIFF header fields
pub fn encode_wav(buffer: &SampleBuffer) -> Result<Vec<u8>> {
    let channel_count = u16::try_from(buffer.channel_count())
        .ok()
        .filter(|&c| c.checked_mul(BYTES_PER_SAMPLE).is_some())
        .ok_or_else(|| SoundcutError::UnsupportedFormat {
            format: format!("{}-channel WAV", buffer.channel_count()),
        })?;

    let block_align = channel_count * BYTES_PER_SAMPLE;
    let byte_rate = buffer
        .sample_rate()
        .checked_mul(block_align as u32)
        .ok_or_else(|| SoundcutError::UnsupportedFormat {
            format: format!("{} Hz sample rate", buffer.sample_rate()),
        })?;

    let data_len = buffer
        .len()
        .checked_mul(block_align as usize)
        .and_then(|len| u32::try_from(len).ok())
        .filter(|len| len.checked_add(36).is_some())
        .ok_or_else(|| SoundcutError::UnsupportedFormat {
            format: "WAV data larger than 4 GiB".to_string(),
        })?;

    debug!(
        channels = channel_count,
        sample_rate = buffer.sample_rate(),
        frames = buffer.len(),
        data_len,
        "encoding WAV"
    );

    let mut bytes = Vec::with_capacity(WAV_HEADER_LEN + data_len as usize);

    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
    bytes.extend_from_slice(b"WAVE");

    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&PCM_FORMAT.to_le_bytes());
    bytes.extend_from_slice(&channel_count.to_le_bytes());
    bytes.extend_from_slice(&buffer.sample_rate().to_le_bytes());
    bytes.extend_from_slice(&byte_rate.to_le_bytes());
    bytes.extend_from_slice(&block_align.to_le_bytes());
    bytes.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_len.to_le_bytes());

    let channels = buffer.channels();
    for frame in 0..buffer.len() {
        for channel in channels {
            bytes.extend_from_slice(&float_to_i16(channel[frame]).to_le_bytes());
        }
    }

    Ok(bytes)
}

/// Encode a buffer and write it to `path`
pub fn write_wav_file(buffer: &SampleBuffer, path: &Path) -> Result<()> {
    let bytes = encode_wav(buffer)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

// ============================================================================
// Decoding
// ============================================================================

/// Decode collaborator turning container bytes into PCM
///
/// Implementations report unparseable input as `DecodeFailed` carrying `name`.
pub trait AudioDecoder {
    /// Decode `bytes`; `name` identifies the source in error messages
    fn decode(&self, name: &str, bytes: &[u8]) -> Result<SampleBuffer>;
}

/// Decode input bytes through `decoder`
///
/// # Errors
/// * `EmptyOrUnreadableInput` - if `bytes` is empty
/// * `DecodeFailed` - if the decoder cannot parse the container
pub fn decode_audio<D: AudioDecoder + ?Sized>(
    decoder: &D,
    name: &str,
    bytes: &[u8],
) -> Result<SampleBuffer> {
    if bytes.is_empty() {
        return Err(SoundcutError::EmptyOrUnreadableInput {
            name: name.to_string(),
        });
    }

    let buffer = decoder.decode(name, bytes)?;
    debug!(
        name,
        channels = buffer.channel_count(),
        sample_rate = buffer.sample_rate(),
        frames = buffer.len(),
        "decoded audio"
    );
    Ok(buffer)
}

/// Read a file from disk and decode it through `decoder`
///
/// # Errors
/// * `EmptyOrUnreadableInput` - if the file cannot be read or is empty
/// * `DecodeFailed` - if the decoder cannot parse the container
pub fn read_audio_file<D: AudioDecoder + ?Sized>(decoder: &D, path: &Path) -> Result<SampleBuffer> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let bytes = std::fs::read(path).map_err(|e| {
        debug!(path = %path.display(), error = %e, "failed to read audio file");
        SoundcutError::EmptyOrUnreadableInput { name: name.clone() }
    })?;

    decode_audio(decoder, &name, &bytes)
}

/// WAV decoder backed by `hound`
///
/// Handles 8/16/24/32-bit integer PCM and 32-bit float WAV files.
#[derive(Debug, Clone, Copy, Default)]
pub struct HoundDecoder;

impl AudioDecoder for HoundDecoder {
    fn decode(&self, name: &str, bytes: &[u8]) -> Result<SampleBuffer> {
        let reader = WavReader::new(Cursor::new(bytes)).map_err(|e| decode_failed(name, e))?;

        let spec = reader.spec();
        let channel_count = spec.channels as usize;
        let interleaved =
            read_samples_as_f32(name, reader, spec.bits_per_sample, spec.sample_format)?;

        SampleBuffer::from_interleaved(&interleaved, channel_count, spec.sample_rate).map_err(
            |e| SoundcutError::DecodeFailed {
                name: name.to_string(),
                reason: e.to_string(),
                source: Some(Box::new(e)),
            },
        )
    }
}

fn decode_failed(name: &str, error: hound::Error) -> SoundcutError {
    SoundcutError::DecodeFailed {
        name: name.to_string(),
        reason: error.to_string(),
        source: Some(Box::new(error)),
    }
}

/// Read samples from a WAV reader and convert to f32
fn read_samples_as_f32<R: std::io::Read>(
    name: &str,
    mut reader: WavReader<R>,
    bits_per_sample: u16,
    sample_format: SampleFormat,
) -> Result<Vec<f32>> {
    match (sample_format, bits_per_sample) {
        (SampleFormat::Float, 32) => reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(|e| decode_failed(name, e)),
        (SampleFormat::Int, 8) => reader
            .samples::<i8>()
            .map(|s| s.map(|v| v as f32 / 128.0))
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(|e| decode_failed(name, e)),
        (SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| s.map(i16_to_float))
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(|e| decode_failed(name, e)),
        (SampleFormat::Int, 24) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f32 / 8388608.0))
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(|e| decode_failed(name, e)),
        (SampleFormat::Int, 32) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f32 / 2147483648.0))
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(|e| decode_failed(name, e)),
        (format, bits) => Err(SoundcutError::DecodeFailed {
            name: name.to_string(),
            reason: format!("unsupported {}-bit {:?} samples", bits, format),
            source: None,
        }),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::buffer::{generate_stereo_test_tone, generate_test_tone};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;
    use test_case::test_case;

    fn read_u16(bytes: &[u8], offset: usize) -> u16 {
        u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
    }

    fn read_u32(bytes: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes([
            bytes[offset],
            bytes[offset + 1],
            bytes[offset + 2],
            bytes[offset + 3],
        ])
    }

    #[test_case(1.0, 32767 ; "positive full scale")]
    #[test_case(-1.0, -32768 ; "negative full scale")]
    #[test_case(2.5, 32767 ; "clamped high")]
    #[test_case(-7.0, -32768 ; "clamped low")]
    #[test_case(0.0, 0 ; "zero")]
    #[test_case(0.5, 16383 ; "half positive truncates")]
    #[test_case(-0.5, -16384 ; "half negative")]
    fn test_float_to_i16(input: f32, expected: i16) {
        assert_eq!(float_to_i16(input), expected);
    }

    #[test]
    fn test_header_layout() {
        let buffer =
            SampleBuffer::from_channels(vec![vec![0.0; 10], vec![0.0; 10]], 44100).unwrap();
        let bytes = encode_wav(&buffer).unwrap();

        assert_eq!(bytes.len(), WAV_HEADER_LEN + 40);
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(read_u32(&bytes, 4), 36 + 40);
        assert_eq!(&bytes[8..12], b"WAVE");
        assert_eq!(&bytes[12..16], b"fmt ");
        assert_eq!(read_u32(&bytes, 16), 16);
        assert_eq!(read_u16(&bytes, 20), 1);
        assert_eq!(read_u16(&bytes, 22), 2);
        assert_eq!(read_u32(&bytes, 24), 44100);
        assert_eq!(read_u32(&bytes, 28), 44100 * 4);
        assert_eq!(read_u16(&bytes, 32), 4);
        assert_eq!(read_u16(&bytes, 34), 16);
        assert_eq!(&bytes[36..40], b"data");
        assert_eq!(read_u32(&bytes, 40), 40);
    }

    #[test]
    fn test_samples_are_frame_interleaved() {
        let buffer =
            SampleBuffer::from_channels(vec![vec![1.0, 0.0], vec![-1.0, 0.5]], 8000).unwrap();
        let bytes = encode_wav(&buffer).unwrap();
        let data = &bytes[WAV_HEADER_LEN..];

        let samples: Vec<i16> = data
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect();
        assert_eq!(samples, vec![32767, -32768, 0, 16383]);
    }

    #[test]
    fn test_header_is_canonical_for_many_channels() {
        let buffer = SampleBuffer::silent(6, 3, 48000).unwrap();
        let bytes = encode_wav(&buffer).unwrap();

        assert_eq!(bytes.len(), WAV_HEADER_LEN + 3 * 6 * 2);
        assert_eq!(read_u16(&bytes, 20), 1);
        assert_eq!(read_u16(&bytes, 22), 6);
        assert_eq!(read_u16(&bytes, 32), 12);
    }

    #[test]
    fn test_empty_buffer_encodes_header_only() {
        let buffer = SampleBuffer::silent(1, 0, 22050).unwrap();
        let bytes = encode_wav(&buffer).unwrap();
        assert_eq!(bytes.len(), WAV_HEADER_LEN);
        assert_eq!(read_u32(&bytes, 4), 36);
        assert_eq!(read_u32(&bytes, 40), 0);
    }

    #[test]
    fn test_round_trip_stereo() {
        let original = generate_stereo_test_tone(440.0, 880.0, 0.25, 48000);
        let bytes = encode_wav(&original).unwrap();
        let decoded = decode_audio(&HoundDecoder, "tone.wav", &bytes).unwrap();

        assert_eq!(decoded.sample_rate(), original.sample_rate());
        assert_eq!(decoded.channel_count(), original.channel_count());
        assert_eq!(decoded.len(), original.len());

        for ch in 0..2 {
            for (orig, dec) in original.channel(ch).iter().zip(decoded.channel(ch)) {
                assert!(
                    (orig - dec).abs() <= 1.0 / 32767.0,
                    "Sample mismatch in channel {}: {} vs {}",
                    ch,
                    orig,
                    dec
                );
            }
        }
    }

    #[test]
    fn test_decode_empty_input() {
        match decode_audio(&HoundDecoder, "empty.wav", &[]) {
            Err(SoundcutError::EmptyOrUnreadableInput { name }) => assert_eq!(name, "empty.wav"),
            other => panic!("Expected EmptyOrUnreadableInput, got: {:?}", other),
        }
    }

    #[test]
    fn test_decode_garbage_names_the_file() {
        match decode_audio(&HoundDecoder, "song.ogg", b"OggS not a wave file") {
            Err(SoundcutError::DecodeFailed { name, .. }) => assert_eq!(name, "song.ogg"),
            other => panic!("Expected DecodeFailed, got: {:?}", other),
        }
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tone.wav");

        let original = generate_test_tone(1000.0, 0.8, 0.2, 44100);
        write_wav_file(&original, &path).unwrap();
        let imported = read_audio_file(&HoundDecoder, &path).unwrap();

        assert_eq!(imported.len(), original.len());
        assert_eq!(imported.sample_rate(), 44100);
    }

    #[test]
    fn test_read_missing_file() {
        let result = read_audio_file(&HoundDecoder, Path::new("/nonexistent/path/audio.wav"));
        match result {
            Err(SoundcutError::EmptyOrUnreadableInput { name }) => assert_eq!(name, "audio.wav"),
            other => panic!("Expected EmptyOrUnreadableInput, got: {:?}", other),
        }
    }
}
