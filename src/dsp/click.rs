//! Click repair
//!
//! Flags samples that jump far above the local RMS level and patches them
//! with the mean of the samples four positions either side.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::window::SquareSums;
use crate::engine::SampleBuffer;
use crate::error::{Result, SoundcutError};

/// Half-width of the local RMS window
pub const CLICK_WINDOW: usize = 64;

/// Distance to the samples used to patch a click
pub const CLICK_REPAIR_OFFSET: usize = 4;

/// Thresholds at or below this are treated as silence and never repaired
pub const CLICK_MIN_THRESHOLD: f64 = 0.001;

/// Click repair parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClickParams {
    /// Detection sensitivity, 0 (only huge spikes) to 1 (anything above 2x RMS)
    pub sensitivity: f32,
}

impl Default for ClickParams {
    fn default() -> Self {
        Self { sensitivity: 0.5 }
    }
}

impl ClickParams {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.sensitivity) {
            return Err(SoundcutError::invalid_param(
                "clickSensitivity",
                self.sensitivity,
                "0.0 to 1.0",
            ));
        }
        Ok(())
    }

    /// Multiple of the local RMS a sample must exceed to count as a click
    pub fn threshold_multiplier(&self) -> f64 {
        2.0 + (1.0 - self.sensitivity as f64) * 8.0
    }
}

/// Repair clicks in every channel
pub fn repair_clicks(buffer: &SampleBuffer, params: &ClickParams) -> Result<SampleBuffer> {
    params.validate()?;

    let multiplier = params.threshold_multiplier();
    let repaired = buffer
        .channels()
        .iter()
        .enumerate()
        .map(|(ch, channel)| {
            let (out, count) = repair_channel(channel, multiplier);
            debug!(channel = ch, repaired = count, "click repair");
            out
        })
        .collect();

    buffer.with_channels(repaired)
}

/// Returns the repaired channel and how many samples were replaced
fn repair_channel(src: &[f32], multiplier: f64) -> (Vec<f32>, usize) {
    let mut dst = src.to_vec();
    let len = src.len();
    if len <= 2 * CLICK_WINDOW {
        return (dst, 0);
    }

    let sums = SquareSums::new(src);
    let mut count = 0;

    for i in CLICK_WINDOW..len - CLICK_WINDOW {
        let rms = sums.rms(i - CLICK_WINDOW, i + CLICK_WINDOW);
        let threshold = rms * multiplier;

        if (src[i].abs() as f64) > threshold && threshold > CLICK_MIN_THRESHOLD {
            let before = src[i.saturating_sub(CLICK_REPAIR_OFFSET)];
            let after = src[(i + CLICK_REPAIR_OFFSET).min(len - 1)];
            dst[i] = (before + after) / 2.0;
            count += 1;
        }
    }

    (dst, count)
}
