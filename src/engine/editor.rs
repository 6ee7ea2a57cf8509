//! Buffer Editor
//!
//! Pure transforms over [`SampleBuffer`]s: trim, peak-normalize, merge and
//! resample. Every function returns a new buffer and leaves its input intact.

use tracing::debug;

use crate::engine::buffer::{peak, SampleBuffer};
use crate::error::{Result, SoundcutError};

/// Convert a time in seconds to a sample index with `floor(time * rate)`
///
/// Saturates at the `i64` bounds for out-of-range or non-finite input.
#[inline]
pub fn time_to_sample(time_secs: f64, sample_rate: u32) -> i64 {
    (time_secs * sample_rate as f64).floor() as i64
}

/// Extract the region between `start_time` and `end_time` (seconds)
///
/// Output length is `floor(end * rate) - floor(start * rate)`, or zero when
/// that difference is not positive.
///
/// # Errors
/// * `OutOfRange` - if the region starts before 0, ends past the buffer, or
///   either time is not finite
pub fn trim(buffer: &SampleBuffer, start_time: f64, end_time: f64) -> Result<SampleBuffer> {
    let sample_rate = buffer.sample_rate();
    let start_sample = time_to_sample(start_time, sample_rate);
    let end_sample = time_to_sample(end_time, sample_rate);
    let len = buffer.len();

    debug!(
        start_sample,
        end_sample,
        len,
        channels = buffer.channel_count(),
        "trim"
    );

    if !start_time.is_finite() || !end_time.is_finite() {
        return Err(SoundcutError::OutOfRange {
            start: start_sample,
            end: end_sample,
            len,
        });
    }

    if end_sample <= start_sample {
        return buffer.with_channels(vec![Vec::new(); buffer.channel_count()]);
    }

    if start_sample < 0 || end_sample > len as i64 {
        return Err(SoundcutError::OutOfRange {
            start: start_sample,
            end: end_sample,
            len,
        });
    }

    let range = start_sample as usize..end_sample as usize;
    let trimmed = buffer
        .channels()
        .iter()
        .map(|channel| channel[range.clone()].to_vec())
        .collect();

    buffer.with_channels(trimmed)
}

/// Peak-normalize each channel independently to full scale
///
/// An all-silent channel has no defined scale factor and is copied unchanged.
pub fn normalize(buffer: &SampleBuffer) -> Result<SampleBuffer> {
    let normalized = buffer
        .channels()
        .iter()
        .enumerate()
        .map(|(ch, channel)| {
            let channel_peak = peak(channel);
            debug!(channel = ch, peak = channel_peak, "normalize");

            if channel_peak == 0.0 {
                channel.clone()
            } else {
                channel.iter().map(|&s| s / channel_peak).collect()
            }
        })
        .collect();

    buffer.with_channels(normalized)
}

/// Concatenate buffers end to end, in input order
///
/// This is sequential joining (track A followed by track B), not mixing.
///
/// # Errors
/// * `EmptyInput` - if `buffers` is empty
/// * `SampleRateMismatch` / `ChannelCountMismatch` - if the buffers do not
///   share the first buffer's format
pub fn merge(buffers: &[SampleBuffer]) -> Result<SampleBuffer> {
    let Some(first) = buffers.first() else {
        return Err(SoundcutError::EmptyInput);
    };

    let sample_rate = first.sample_rate();
    let channel_count = first.channel_count();

    for buffer in &buffers[1..] {
        if buffer.sample_rate() != sample_rate {
            return Err(SoundcutError::SampleRateMismatch {
                expected: sample_rate,
                found: buffer.sample_rate(),
            });
        }
        if buffer.channel_count() != channel_count {
            return Err(SoundcutError::ChannelCountMismatch {
                expected: channel_count,
                found: buffer.channel_count(),
            });
        }
    }

    let total_length: usize = buffers.iter().map(SampleBuffer::len).sum();
    debug!(
        buffers = buffers.len(),
        total_length, channel_count, "merge"
    );

    let merged = (0..channel_count)
        .map(|ch| {
            let mut channel = Vec::with_capacity(total_length);
            for buffer in buffers {
                channel.extend_from_slice(buffer.channel(ch));
            }
            channel
        })
        .collect();

    first.with_channels(merged)
}

/// Convert a buffer to another sample rate
///
/// Produces `round(len * target_rate / sample_rate)` frames per channel using
/// linear interpolation. Each channel is resampled on its own.
///
/// # Errors
/// * `InvalidParameter` - if `target_rate` is zero
pub fn resample(buffer: &SampleBuffer, target_rate: u32) -> Result<SampleBuffer> {
    if target_rate == 0 {
        return Err(SoundcutError::invalid_param(
            "target_rate",
            target_rate,
            "a positive sample rate",
        ));
    }

    let source_rate = buffer.sample_rate();
    if source_rate == target_rate {
        return Ok(buffer.clone());
    }

    let target_len =
        (buffer.len() as f64 * target_rate as f64 / source_rate as f64).round() as usize;
    debug!(source_rate, target_rate, target_len, "resample");

    let step = source_rate as f64 / target_rate as f64;
    let resampled = buffer
        .channels()
        .iter()
        .map(|channel| resample_linear(channel, step, target_len))
        .collect();

    SampleBuffer::from_channels(resampled, target_rate)
}

/// Linear interpolation resampling
///
/// `step` is the distance in source samples between consecutive output samples.
/// Positions past the last source sample hold its value.
// TODO: band-limit before decimating; linear interpolation aliases when downsampling
fn resample_linear(samples: &[f32], step: f64, target_len: usize) -> Vec<f32> {
    let Some(&last) = samples.last() else {
        return vec![0.0; target_len];
    };

    let source_len = samples.len();
    (0..target_len)
        .map(|i| {
            let src_pos = i as f64 * step;
            let src_idx = src_pos.floor() as usize;
            let frac = (src_pos - src_idx as f64) as f32;

            if src_idx + 1 < source_len {
                samples[src_idx] * (1.0 - frac) + samples[src_idx + 1] * frac
            } else {
                last
            }
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn ramp(len: usize, sample_rate: u32) -> SampleBuffer {
        let channel = (0..len).map(|i| i as f32).collect();
        SampleBuffer::from_channels(vec![channel], sample_rate).unwrap()
    }

    fn mono(samples: &[f32], sample_rate: u32) -> SampleBuffer {
        SampleBuffer::from_channels(vec![samples.to_vec()], sample_rate).unwrap()
    }

    #[test]
    fn test_trim_extracts_sample_range() {
        let buffer = ramp(1000, 100);
        let trimmed = trim(&buffer, 2.0, 5.0).unwrap();

        assert_eq!(trimmed.len(), 300);
        assert_eq!(trimmed.channel(0)[0], 200.0);
        assert_eq!(trimmed.channel(0)[299], 499.0);
        assert_eq!(trimmed.sample_rate(), 100);
    }

    #[test]
    fn test_trim_multichannel() {
        let buffer =
            SampleBuffer::from_channels(vec![vec![0.5; 100], vec![-0.5; 100]], 100).unwrap();
        let trimmed = trim(&buffer, 0.2, 0.8).unwrap();

        assert_eq!(trimmed.channel_count(), 2);
        assert_eq!(trimmed.len(), 60);
        assert_eq!(trimmed.channel(0)[0], 0.5);
        assert_eq!(trimmed.channel(1)[0], -0.5);
    }

    #[test_case(0.5, 0.5 ; "start equals end")]
    #[test_case(0.8, 0.2 ; "start after end")]
    #[test_case(5.0, 1.0 ; "start past the buffer")]
    fn test_trim_empty_region(start: f64, end: f64) {
        let buffer =
            SampleBuffer::from_channels(vec![vec![0.1; 100], vec![0.2; 100]], 100).unwrap();
        let trimmed = trim(&buffer, start, end).unwrap();

        assert_eq!(trimmed.len(), 0);
        assert_eq!(trimmed.channel_count(), 2);
    }

    #[test_case(0.5, 1.5 ; "end past the buffer")]
    #[test_case(-0.1, 0.5 ; "negative start")]
    #[test_case(0.0, f64::INFINITY ; "infinite end")]
    #[test_case(f64::NAN, 0.5 ; "nan start")]
    fn test_trim_out_of_range(start: f64, end: f64) {
        let buffer = ramp(100, 100);
        match trim(&buffer, start, end) {
            Err(SoundcutError::OutOfRange { len, .. }) => assert_eq!(len, 100),
            other => panic!("Expected OutOfRange, got: {:?}", other),
        }
    }

    #[test]
    fn test_trim_leaves_input_untouched() {
        let buffer = ramp(100, 100);
        let before = buffer.clone();
        let _ = trim(&buffer, 0.1, 0.2).unwrap();
        assert_eq!(buffer, before);
    }

    #[test]
    fn test_normalize_scales_peak_to_one() {
        let buffer = mono(&[0.25, -0.5, 0.1, -0.2], 44100);
        let normalized = normalize(&buffer).unwrap();

        let out = normalized.channel(0);
        assert_relative_eq!(out[0], 0.5);
        assert_relative_eq!(out[1], -1.0);
        assert_relative_eq!(out[2], 0.2);
        assert_relative_eq!(out[3], -0.4);
    }

    #[test]
    fn test_normalize_channels_independently() {
        let buffer =
            SampleBuffer::from_channels(vec![vec![0.25, -0.25], vec![0.1, -0.5]], 44100).unwrap();
        let normalized = normalize(&buffer).unwrap();

        assert_relative_eq!(normalized.channel(0)[0], 1.0);
        assert_relative_eq!(normalized.channel(0)[1], -1.0);
        assert_relative_eq!(normalized.channel(1)[0], 0.2);
        assert_relative_eq!(normalized.channel(1)[1], -1.0);
    }

    #[test]
    fn test_normalize_silent_channel_is_unchanged() {
        let buffer =
            SampleBuffer::from_channels(vec![vec![0.0; 8], vec![0.1; 8]], 44100).unwrap();
        let normalized = normalize(&buffer).unwrap();

        assert_eq!(normalized.channel(0), buffer.channel(0));
        assert!(normalized.is_finite());
        assert_relative_eq!(normalized.channel_peak(1), 1.0);
    }

    #[test]
    fn test_normalize_empty_buffer() {
        let buffer = SampleBuffer::silent(1, 0, 44100).unwrap();
        assert!(normalize(&buffer).unwrap().is_empty());
    }

    #[test]
    fn test_merge_sequentially() {
        let a = mono(&[1.0, 2.0, 3.0], 44100);
        let b = mono(&[4.0, 5.0], 44100);

        let merged = merge(&[a, b]).unwrap();
        assert_eq!(merged.len(), 5);
        assert_eq!(merged.channel(0), &[1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_merge_single_buffer_is_identity() {
        let a = ramp(10, 100);
        assert_eq!(merge(std::slice::from_ref(&a)).unwrap(), a);
    }

    #[test]
    fn test_merge_empty_fails() {
        assert!(matches!(merge(&[]), Err(SoundcutError::EmptyInput)));
    }

    #[test]
    fn test_merge_rejects_mismatched_formats() {
        let a = ramp(10, 100);
        let b = ramp(10, 200);
        assert!(matches!(
            merge(&[a.clone(), b]),
            Err(SoundcutError::SampleRateMismatch {
                expected: 100,
                found: 200
            })
        ));

        let stereo = SampleBuffer::silent(2, 10, 100).unwrap();
        assert!(matches!(
            merge(&[a, stereo]),
            Err(SoundcutError::ChannelCountMismatch { .. })
        ));
    }

    #[test_case(48000, 44100, 48000, 44100 ; "down to 44.1k")]
    #[test_case(22050, 48000, 1000, 2177 ; "up to 48k")]
    #[test_case(44100, 22050, 3, 2 ; "odd length rounds")]
    fn test_resample_length(source: u32, target: u32, len: usize, expected: usize) {
        let buffer = SampleBuffer::silent(2, len, source).unwrap();
        let resampled = resample(&buffer, target).unwrap();

        assert_eq!(resampled.len(), expected);
        assert_eq!(resampled.channel_count(), 2);
        assert_eq!(resampled.sample_rate(), target);
    }

    #[test]
    fn test_resample_interpolates_linearly() {
        let buffer = mono(&[0.0, 1.0, 0.0], 100);
        let resampled = resample(&buffer, 200).unwrap();

        assert_eq!(resampled.len(), 6);
        assert_relative_eq!(resampled.channel(0)[1], 0.5);
        assert_relative_eq!(resampled.channel(0)[2], 1.0);
    }

    #[test]
    fn test_resample_keeps_channels_apart() {
        let buffer =
            SampleBuffer::from_channels(vec![vec![0.0; 100], vec![0.7; 100]], 100).unwrap();
        let resampled = resample(&buffer, 300).unwrap();

        assert!(resampled.channel(0).iter().all(|&s| s == 0.0));
        assert!(resampled.channel(1).iter().all(|&s| (s - 0.7).abs() < 1e-6));
    }

    #[test]
    fn test_resample_rejects_zero_rate() {
        let buffer = ramp(10, 100);
        assert!(resample(&buffer, 0).is_err());
    }
}
