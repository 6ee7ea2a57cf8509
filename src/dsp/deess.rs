//! De-essing
//!
//! A high-shelf cut at the sibilance frequency followed by a gentle low-pass
//! at three times that frequency.
//!
//! The shelf gain is `min(0, threshold_db * 0.3)` dB: a more negative
//! threshold cuts harder, a non-negative one leaves the shelf flat.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::biquad::{BiquadCoeffs, FilterCascade};
use crate::engine::SampleBuffer;
use crate::error::{Result, SoundcutError};

/// Ratio between the low-pass corner and the shelf frequency
pub const DEESS_LOWPASS_RATIO: f64 = 3.0;

/// Low-pass resonance in dB
pub const DEESS_LOWPASS_Q_DB: f64 = 0.5;

/// De-essing parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeessParams {
    /// Threshold in dB; mapped to the shelf gain
    pub threshold_db: f32,
    /// Shelf corner frequency in Hz
    pub frequency: f32,
}

impl Default for DeessParams {
    fn default() -> Self {
        Self {
            threshold_db: -20.0,
            frequency: 4000.0,
        }
    }
}

impl DeessParams {
    pub fn validate(&self) -> Result<()> {
        if !self.threshold_db.is_finite() {
            return Err(SoundcutError::invalid_param(
                "deessThreshold",
                self.threshold_db,
                "a finite level in dB",
            ));
        }
        if !self.frequency.is_finite() || self.frequency <= 0.0 {
            return Err(SoundcutError::invalid_param(
                "deessFrequency",
                self.frequency,
                "a positive frequency in Hz",
            ));
        }
        Ok(())
    }

    /// Shelf gain in dB
    pub fn reduction_db(&self) -> f64 {
        (self.threshold_db as f64 * 0.3).min(0.0)
    }

    /// Build the shelf + low-pass cascade for `sample_rate`
    pub fn design(&self, sample_rate: u32) -> FilterCascade {
        let fs = sample_rate as f64;
        let frequency = self.frequency as f64;

        let mut cascade = FilterCascade::new();
        cascade.push(BiquadCoeffs::high_shelf(fs, frequency, self.reduction_db()));
        cascade.push(BiquadCoeffs::low_pass(
            fs,
            frequency * DEESS_LOWPASS_RATIO,
            DEESS_LOWPASS_Q_DB,
        ));
        cascade
    }
}

/// Soften sibilance in every channel
pub fn deess(buffer: &SampleBuffer, params: &DeessParams) -> Result<SampleBuffer> {
    params.validate()?;

    let cascade = params.design(buffer.sample_rate());
    debug!(
        frequency = params.frequency,
        reduction_db = params.reduction_db(),
        stages = cascade.stages().len(),
        "de-essing"
    );

    let filtered = buffer
        .channels()
        .iter()
        .map(|channel| cascade.process_channel(channel))
        .collect();

    buffer.with_channels(filtered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::buffer::{generate_test_tone, rms};
    use approx::assert_relative_eq;
    use test_case::test_case;

    fn settled_ratio(input: &SampleBuffer, output: &SampleBuffer) -> f32 {
        let half = input.len() / 2;
        rms(&output.channel(0)[half..]) / rms(&input.channel(0)[half..])
    }

    #[test_case(-20.0, -6.0 ; "default threshold")]
    #[test_case(-40.0, -12.0 ; "aggressive")]
    #[test_case(10.0, 0.0 ; "positive threshold never boosts")]
    fn test_reduction_mapping(threshold_db: f32, expected: f64) {
        let params = DeessParams {
            threshold_db,
            ..Default::default()
        };
        assert_relative_eq!(params.reduction_db(), expected, epsilon = 1e-9);
    }

    #[test]
    fn test_attenuates_sibilance_band() {
        let tone = generate_test_tone(8000.0, 0.5, 0.5, 48000);
        let out = deess(&tone, &DeessParams::default()).unwrap();
        assert!(settled_ratio(&tone, &out) < 0.75);
    }

    #[test]
    fn test_passes_low_frequencies() {
        let tone = generate_test_tone(200.0, 0.5, 0.5, 48000);
        let out = deess(&tone, &DeessParams::default()).unwrap();

        let ratio = settled_ratio(&tone, &out);
        assert!((0.95..1.05).contains(&ratio), "ratio was {}", ratio);
    }

    #[test]
    fn test_lowpass_above_nyquist_is_skipped() {
        let params = DeessParams::default();
        // 12 kHz low-pass cannot be realized at 22.05 kHz
        assert_eq!(params.design(22050).stages().len(), 1);
        assert_eq!(params.design(48000).stages().len(), 2);
    }

    #[test]
    fn test_preserves_shape() {
        let buffer = SampleBuffer::silent(3, 777, 44100).unwrap();
        let out = deess(&buffer, &DeessParams::default()).unwrap();
        assert_eq!(out.channel_count(), 3);
        assert_eq!(out.len(), 777);
        assert_eq!(out.sample_rate(), 44100);
    }

    #[test]
    fn test_rejects_bad_frequency() {
        let params = DeessParams {
            frequency: 0.0,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }
}
