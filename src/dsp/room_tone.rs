//! Room-tone gate
//!
//! A noise gate driven by the local RMS level around each sample, with
//! hysteresis to prevent chattering and linear attack/release ramps to avoid
//! clicks when the gate changes state.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::window::SquareSums;
use crate::engine::SampleBuffer;
use crate::error::{Result, SoundcutError};

/// Half-width of the RMS detector window
pub const GATE_RMS_WINDOW: usize = 256;

/// The gate closes once the level falls below this fraction of the threshold
pub const GATE_HYSTERESIS_RATIO: f64 = 0.5;

/// Gate parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GateParams {
    /// Linear RMS level that opens the gate (0 to 1)
    pub threshold: f64,
    /// Time for the gain to ramp from 0 to 1, in seconds
    pub attack_secs: f64,
    /// Time for the gain to ramp from 1 to 0, in seconds
    pub release_secs: f64,
}

impl Default for GateParams {
    fn default() -> Self {
        Self {
            threshold: 0.02,
            attack_secs: 0.005,
            release_secs: 0.05,
        }
    }
}

impl GateParams {
    /// Validate parameters
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(SoundcutError::invalid_param(
                "gateThreshold",
                self.threshold,
                "0.0 to 1.0",
            ));
        }
        if !self.attack_secs.is_finite() || self.attack_secs < 0.0 {
            return Err(SoundcutError::invalid_param(
                "gateAttack",
                self.attack_secs,
                "a non-negative time in seconds",
            ));
        }
        if !self.release_secs.is_finite() || self.release_secs < 0.0 {
            return Err(SoundcutError::invalid_param(
                "gateRelease",
                self.release_secs,
                "a non-negative time in seconds",
            ));
        }
        Ok(())
    }

    /// Per-sample envelope increments `(attack_step, release_step)`
    ///
    /// Ramps shorter than one sample complete in a single sample.
    fn envelope_steps(&self, sample_rate: u32) -> (f64, f64) {
        let fs = sample_rate as f64;
        let attack_samples = (self.attack_secs * fs).floor().max(1.0);
        let release_samples = (self.release_secs * fs).floor().max(1.0);
        (1.0 / attack_samples, 1.0 / release_samples)
    }
}

/// Gate low-level room noise in every channel
pub fn remove_room_tone(buffer: &SampleBuffer, params: &GateParams) -> Result<SampleBuffer> {
    params.validate()?;

    let (attack_step, release_step) = params.envelope_steps(buffer.sample_rate());
    let open_threshold = params.threshold;
    let close_threshold = open_threshold * GATE_HYSTERESIS_RATIO;

    debug!(
        threshold = open_threshold,
        attack_step, release_step, "room-tone gate"
    );

    let gated = buffer
        .channels()
        .iter()
        .map(|src| {
            let len = src.len();
            let sums = SquareSums::new(src);
            let mut gate_open = false;
            let mut envelope = 0.0_f64;

            src.iter()
                .enumerate()
                .map(|(i, &sample)| {
                    let start = i.saturating_sub(GATE_RMS_WINDOW);
                    let end = (i + GATE_RMS_WINDOW).min(len);
                    let rms = sums.rms(start, end);

                    if rms > open_threshold {
                        gate_open = true;
                    } else if rms < close_threshold {
                        gate_open = false;
                    }

                    envelope = if gate_open {
                        (envelope + attack_step).min(1.0)
                    } else {
                        (envelope - release_step).max(0.0)
                    };

                    (sample as f64 * envelope) as f32
                })
                .collect()
        })
        .collect();

    buffer.with_channels(gated)
}
