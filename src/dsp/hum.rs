//! Hum removal
//!
//! A series of narrow notch filters at the mains frequency and its
//! harmonics. Harmonics at or above Nyquist are skipped.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::biquad::{BiquadCoeffs, FilterCascade};
use crate::engine::SampleBuffer;
use crate::error::{Result, SoundcutError};

/// Quality factor of every notch
pub const HUM_NOTCH_Q: f64 = 30.0;

/// Accepted fundamental range in Hz
pub const HUM_FREQUENCY_RANGE: std::ops::RangeInclusive<f32> = 20.0..=1000.0;

/// Upper bound on the number of notches in one cascade
pub const HUM_MAX_HARMONICS: u32 = 64;

/// Hum removal parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HumParams {
    /// Fundamental hum frequency in Hz (50 in Europe, 60 in the US)
    pub frequency: f32,
    /// Number of notches: the fundamental plus `harmonics - 1` overtones
    pub harmonics: u32,
}

impl Default for HumParams {
    fn default() -> Self {
        Self {
            frequency: 60.0,
            harmonics: 4,
        }
    }
}

impl HumParams {
    pub fn validate(&self) -> Result<()> {
        if !HUM_FREQUENCY_RANGE.contains(&self.frequency) {
            return Err(SoundcutError::invalid_param(
                "humFrequency",
                self.frequency,
                "20 to 1000 Hz",
            ));
        }
        if self.harmonics > HUM_MAX_HARMONICS {
            return Err(SoundcutError::invalid_param(
                "humHarmonics",
                self.harmonics,
                "at most 64",
            ));
        }
        Ok(())
    }

    /// Build the notch cascade for `sample_rate`
    ///
    /// At most [`HUM_MAX_HARMONICS`] notches are built, even for unvalidated params.
    pub fn design(&self, sample_rate: u32) -> FilterCascade {
        let fs = sample_rate as f64;
        let nyquist = fs / 2.0;
        let mut cascade = FilterCascade::new();

        for h in 1..=self.harmonics.min(HUM_MAX_HARMONICS) {
            let frequency = self.frequency as f64 * h as f64;
            if frequency >= nyquist {
                warn!(
                    harmonic = h,
                    frequency, sample_rate, "hum harmonic at or above Nyquist, skipping the rest"
                );
                break;
            }
            cascade.push(BiquadCoeffs::notch(fs, frequency, HUM_NOTCH_Q));
        }

        cascade
    }
}

/// Remove mains hum from every channel
pub fn remove_hum(buffer: &SampleBuffer, params: &HumParams) -> Result<SampleBuffer> {
    params.validate()?;

    let cascade = params.design(buffer.sample_rate());
    debug!(
        frequency = params.frequency,
        notches = cascade.stages().len(),
        "hum removal"
    );

    let filtered = buffer
        .channels()
        .iter()
        .map(|channel| cascade.process_channel(channel))
        .collect();

    buffer.with_channels(filtered)
}
