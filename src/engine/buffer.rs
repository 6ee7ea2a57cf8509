//! Sample Buffer
//!
//! The one data model every operation reads and writes: a rectangular block
//! of non-interleaved 32-bit float channels plus a sample rate.
//!
//! Buffers are never mutated by the editing or noise-reduction functions.
//! Each transform builds a fresh buffer so callers can keep the input around
//! for undo/redo.

use crate::error::{Result, SoundcutError};

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert decibels to linear amplitude
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Convert linear amplitude to decibels
///
/// Returns `f32::NEG_INFINITY` for zero or negative input.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * linear.log10()
    }
}

/// Peak absolute value of a slice of samples
#[inline]
pub fn peak(samples: &[f32]) -> f32 {
    samples.iter().map(|s| s.abs()).fold(0.0_f32, f32::max)
}

/// Root-mean-square of a slice of samples (0.0 when empty)
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum_squares / samples.len() as f64).sqrt() as f32
}

/// Interleave channels from [[L,L,...], [R,R,...]] to [L,R,L,R,...]
///
/// Frame count is set by the longest channel; shorter channels are padded
/// with silence.
pub fn interleave(channels: &[Vec<f32>]) -> Vec<f32> {
    let frames = channels.iter().map(Vec::len).max().unwrap_or(0);
    let mut result = Vec::with_capacity(frames * channels.len());
    for frame in 0..frames {
        for channel in channels {
            result.push(channel.get(frame).copied().unwrap_or(0.0));
        }
    }
    result
}

/// De-interleave samples from [L,R,L,R,...] to [[L,L,...], [R,R,...]]
///
/// Trailing samples that do not fill a whole frame are dropped.
pub fn deinterleave(samples: &[f32], channel_count: usize) -> Vec<Vec<f32>> {
    if channel_count == 0 {
        return Vec::new();
    }

    let frames = samples.len() / channel_count;
    let mut result = vec![Vec::with_capacity(frames); channel_count];
    for frame in samples.chunks_exact(channel_count) {
        for (ch, &sample) in frame.iter().enumerate() {
            result[ch].push(sample);
        }
    }
    result
}

// ============================================================================
// Sample Buffer
// ============================================================================

/// Multi-channel block of floating-point audio
///
/// Invariants, checked on construction:
/// - `sample_rate > 0`
/// - at least one channel
/// - every channel has the same length
///
/// # Example
/// ```
/// use soundcut::engine::SampleBuffer;
///
/// let buffer = SampleBuffer::silent(2, 48000, 48000).unwrap();
/// assert_eq!(buffer.channel_count(), 2);
/// assert_eq!(buffer.len(), 48000);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    /// Sample data: outer Vec is channels, inner Vec is frames
    samples: Vec<Vec<f32>>,
    /// Sample rate in Hz
    sample_rate: u32,
}

impl SampleBuffer {
    /// Create a zero-filled buffer
    pub fn silent(channel_count: usize, length: usize, sample_rate: u32) -> Result<Self> {
        Self::from_channels(vec![vec![0.0_f32; length]; channel_count], sample_rate)
    }

    /// Build a buffer from per-channel sample vectors, taking ownership of them
    ///
    /// # Errors
    /// * `InvalidBuffer` - zero sample rate, no channels, or channels of unequal length
    pub fn from_channels(samples: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(SoundcutError::InvalidBuffer {
                reason: "sample rate must be positive".to_string(),
            });
        }

        let Some(first) = samples.first() else {
            return Err(SoundcutError::InvalidBuffer {
                reason: "buffer must have at least one channel".to_string(),
            });
        };

        let length = first.len();
        if let Some((ch, channel)) = samples
            .iter()
            .enumerate()
            .find(|(_, channel)| channel.len() != length)
        {
            return Err(SoundcutError::InvalidBuffer {
                reason: format!(
                    "channel {} has {} samples, expected {}",
                    ch,
                    channel.len(),
                    length
                ),
            });
        }

        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Build a buffer from frame-interleaved data
    ///
    /// # Errors
    /// * `InvalidBuffer` - if the data length is not a multiple of `channel_count`
    pub fn from_interleaved(
        interleaved: &[f32],
        channel_count: usize,
        sample_rate: u32,
    ) -> Result<Self> {
        if channel_count == 0 || interleaved.len() % channel_count != 0 {
            return Err(SoundcutError::InvalidBuffer {
                reason: format!(
                    "interleaved data length {} is not divisible by channel count {}",
                    interleaved.len(),
                    channel_count
                ),
            });
        }

        Self::from_channels(deinterleave(interleaved, channel_count), sample_rate)
    }

    /// Build a buffer with the same shape metadata, from channels a transform
    /// has just produced
    pub(crate) fn with_channels(&self, samples: Vec<Vec<f32>>) -> Result<Self> {
        Self::from_channels(samples, self.sample_rate)
    }

    /// Convert the buffer to frame-interleaved order
    pub fn to_interleaved(&self) -> Vec<f32> {
        interleave(&self.samples)
    }

    /// Sample rate in Hz
    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of channels
    #[inline]
    pub fn channel_count(&self) -> usize {
        self.samples.len()
    }

    /// Number of frames per channel
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.first().map(|ch| ch.len()).unwrap_or(0)
    }

    /// Check if the buffer holds no frames
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Duration in seconds
    #[inline]
    pub fn duration_secs(&self) -> f64 {
        self.len() as f64 / self.sample_rate as f64
    }

    /// Immutable access to one channel
    ///
    /// # Panics
    /// Panics if the channel index is out of bounds
    #[inline]
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.samples[index]
    }

    /// All channels, in order
    #[inline]
    pub fn channels(&self) -> &[Vec<f32>] {
        &self.samples
    }

    /// Give up the sample storage without copying it
    pub fn into_channels(self) -> Vec<Vec<f32>> {
        self.samples
    }

    /// Get a sample, or `None` if either index is out of bounds
    #[inline]
    pub fn get_sample(&self, channel: usize, index: usize) -> Option<f32> {
        self.samples
            .get(channel)
            .and_then(|ch| ch.get(index).copied())
    }

    /// Peak absolute value of one channel
    pub fn channel_peak(&self, channel: usize) -> f32 {
        self.samples.get(channel).map(|ch| peak(ch)).unwrap_or(0.0)
    }

    /// RMS level of one channel in dB
    pub fn channel_rms_db(&self, channel: usize) -> f32 {
        linear_to_db(self.samples.get(channel).map(|ch| rms(ch)).unwrap_or(0.0))
    }

    /// Check that every sample is finite
    pub fn is_finite(&self) -> bool {
        self.samples
            .iter()
            .flat_map(|channel| channel.iter())
            .all(|s| s.is_finite())
    }
}

// ============================================================================
// Test signal generators
// ============================================================================

/// Generate a mono sine wave
pub fn generate_test_tone(
    frequency: f32,
    amplitude: f32,
    duration_secs: f32,
    sample_rate: u32,
) -> SampleBuffer {
    let num_samples = (duration_secs * sample_rate as f32) as usize;
    let angular_freq = 2.0 * std::f32::consts::PI * frequency / sample_rate.max(1) as f32;

    let channel = (0..num_samples)
        .map(|i| amplitude * (angular_freq * i as f32).sin())
        .collect();

    SampleBuffer {
        samples: vec![channel],
        sample_rate: sample_rate.max(1),
    }
}

/// Generate a stereo buffer with a different sine wave per channel
pub fn generate_stereo_test_tone(
    freq_left: f32,
    freq_right: f32,
    duration_secs: f32,
    sample_rate: u32,
) -> SampleBuffer {
    let left = generate_test_tone(freq_left, 1.0, duration_secs, sample_rate);
    let right = generate_test_tone(freq_right, 1.0, duration_secs, sample_rate);

    let mut samples = left.into_channels();
    samples.extend(right.into_channels());

    SampleBuffer {
        samples,
        sample_rate: sample_rate.max(1),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_from_channels_rejects_ragged_data() {
        let result = SampleBuffer::from_channels(vec![vec![0.0; 4], vec![0.0; 3]], 44100);
        match result {
            Err(SoundcutError::InvalidBuffer { reason }) => {
                assert!(reason.contains("channel 1"));
            }
            other => panic!("Expected InvalidBuffer, got: {:?}", other),
        }
    }

    #[test]
    fn test_from_channels_rejects_zero_rate_and_no_channels() {
        assert!(SampleBuffer::from_channels(vec![vec![0.0; 4]], 0).is_err());
        assert!(SampleBuffer::from_channels(Vec::new(), 44100).is_err());
    }

    #[test]
    fn test_zero_length_buffer_is_valid() {
        let buffer = SampleBuffer::silent(2, 0, 44100).unwrap();
        assert!(buffer.is_empty());
        assert_eq!(buffer.channel_count(), 2);
        assert_eq!(buffer.duration_secs(), 0.0);
    }

    #[test]
    fn test_interleave_deinterleave_roundtrip() {
        let left = vec![1.0, 2.0, 3.0, 4.0];
        let right = vec![5.0, 6.0, 7.0, 8.0];
        let buffer = SampleBuffer::from_channels(vec![left.clone(), right.clone()], 100).unwrap();

        let interleaved = buffer.to_interleaved();
        assert_eq!(interleaved, vec![1.0, 5.0, 2.0, 6.0, 3.0, 7.0, 4.0, 8.0]);

        let rebuilt = SampleBuffer::from_interleaved(&interleaved, 2, 100).unwrap();
        assert_eq!(rebuilt.channel(0), left.as_slice());
        assert_eq!(rebuilt.channel(1), right.as_slice());
    }

    #[test]
    fn test_interleave_pads_ragged_channels() {
        let interleaved = interleave(&[vec![1.0, 2.0], vec![3.0]]);
        assert_eq!(interleaved, vec![1.0, 3.0, 2.0, 0.0]);
        assert!(interleave(&[]).is_empty());
    }

    #[test]
    fn test_from_interleaved_rejects_partial_frame() {
        assert!(SampleBuffer::from_interleaved(&[0.0, 1.0, 2.0], 2, 100).is_err());
    }

    #[test]
    fn test_peak_and_rms() {
        let buffer = SampleBuffer::from_channels(vec![vec![0.5, -0.5, 0.5, -0.5]], 100).unwrap();
        assert_relative_eq!(buffer.channel_peak(0), 0.5);
        assert_relative_eq!(buffer.channel_rms_db(0), linear_to_db(0.5), epsilon = 1e-4);
        assert_eq!(buffer.channel_peak(7), 0.0);
    }

    #[test]
    fn test_db_conversions() {
        assert_relative_eq!(db_to_linear(0.0), 1.0);
        assert_relative_eq!(db_to_linear(-20.0), 0.1, epsilon = 1e-6);
        assert_relative_eq!(linear_to_db(0.1), -20.0, epsilon = 1e-4);
        assert_eq!(linear_to_db(0.0), f32::NEG_INFINITY);
    }

    #[test]
    fn test_generate_stereo_test_tone() {
        let buffer = generate_stereo_test_tone(440.0, 880.0, 0.5, 48000);
        assert_eq!(buffer.channel_count(), 2);
        assert_eq!(buffer.len(), 24000);
        assert!((buffer.channel(0)[100] - buffer.channel(1)[100]).abs() > 0.01);
    }
}
