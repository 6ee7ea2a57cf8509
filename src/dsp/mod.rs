//! Noise-Reduction Engine
//!
//! Four independent denoisers, each a `SampleBuffer -> SampleBuffer`
//! transform applied to every channel on its own:
//! - Hum removal: notch cascade at the mains frequency and harmonics
//! - Click repair: local-RMS spike detection with linear patching
//! - De-essing: high-shelf cut plus gentle low-pass
//! - Room-tone gate: hysteretic RMS gate with attack/release ramps
//!
//! The mode is a closed [`NoiseReduction`] enum carrying its own parameters.
//! Hosts that select modes by name go through [`NoiseReduction::from_tag`],
//! which is where an unknown selector becomes `UnsupportedMode`.

pub mod biquad;
mod click;
mod deess;
mod hum;
mod room_tone;
mod window;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::SampleBuffer;
use crate::error::{Result, SoundcutError};

pub use biquad::{BiquadCoeffs, FilterCascade};
pub use click::{repair_clicks, ClickParams, CLICK_REPAIR_OFFSET, CLICK_WINDOW};
pub use deess::{deess, DeessParams};
pub use hum::{remove_hum, HumParams, HUM_NOTCH_Q};
pub use room_tone::{remove_room_tone, GateParams, GATE_HYSTERESIS_RATIO, GATE_RMS_WINDOW};

/// A noise-reduction mode with its parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum NoiseReduction {
    Hum(HumParams),
    Click(ClickParams),
    Deess(DeessParams),
    Room(GateParams),
}

impl NoiseReduction {
    /// Mode selectors accepted by [`NoiseReduction::from_tag`]
    pub const TAGS: [&'static str; 4] = ["hum", "click", "deess", "room"];

    /// Resolve a mode selector, filling parameters from `options`
    ///
    /// # Errors
    /// * `UnsupportedMode` - if `tag` is not one of [`NoiseReduction::TAGS`]
    pub fn from_tag(tag: &str, options: &NoiseReductionOptions) -> Result<Self> {
        match tag {
            "hum" => Ok(NoiseReduction::Hum(options.hum_params())),
            "click" => Ok(NoiseReduction::Click(options.click_params())),
            "deess" => Ok(NoiseReduction::Deess(options.deess_params())),
            "room" => Ok(NoiseReduction::Room(options.gate_params())),
            other => Err(SoundcutError::UnsupportedMode {
                mode: other.to_string(),
            }),
        }
    }

    /// The selector for this mode
    pub fn tag(&self) -> &'static str {
        match self {
            NoiseReduction::Hum(_) => "hum",
            NoiseReduction::Click(_) => "click",
            NoiseReduction::Deess(_) => "deess",
            NoiseReduction::Room(_) => "room",
        }
    }

    /// Validate the carried parameters
    pub fn validate(&self) -> Result<()> {
        match self {
            NoiseReduction::Hum(p) => p.validate(),
            NoiseReduction::Click(p) => p.validate(),
            NoiseReduction::Deess(p) => p.validate(),
            NoiseReduction::Room(p) => p.validate(),
        }
    }
}

/// Flat, all-optional parameter record as sent by the editor UI
///
/// Any field left out takes its documented default.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NoiseReductionOptions {
    pub hum_frequency: Option<f32>,
    pub hum_harmonics: Option<u32>,
    pub click_sensitivity: Option<f32>,
    pub deess_threshold: Option<f32>,
    pub deess_frequency: Option<f32>,
    pub gate_threshold: Option<f64>,
    pub gate_attack: Option<f64>,
    pub gate_release: Option<f64>,
}

impl NoiseReductionOptions {
    pub fn hum_params(&self) -> HumParams {
        let defaults = HumParams::default();
        HumParams {
            frequency: self.hum_frequency.unwrap_or(defaults.frequency),
            harmonics: self.hum_harmonics.unwrap_or(defaults.harmonics),
        }
    }

    pub fn click_params(&self) -> ClickParams {
        let defaults = ClickParams::default();
        ClickParams {
            sensitivity: self.click_sensitivity.unwrap_or(defaults.sensitivity),
        }
    }

    pub fn deess_params(&self) -> DeessParams {
        let defaults = DeessParams::default();
        DeessParams {
            threshold_db: self.deess_threshold.unwrap_or(defaults.threshold_db),
            frequency: self.deess_frequency.unwrap_or(defaults.frequency),
        }
    }

    pub fn gate_params(&self) -> GateParams {
        let defaults = GateParams::default();
        GateParams {
            threshold: self.gate_threshold.unwrap_or(defaults.threshold),
            attack_secs: self.gate_attack.unwrap_or(defaults.attack_secs),
            release_secs: self.gate_release.unwrap_or(defaults.release_secs),
        }
    }
}

/// Run one noise-reduction mode over `buffer`
///
/// Channel count, sample rate and length are preserved. An empty buffer is
/// returned unchanged.
pub fn reduce_noise(buffer: &SampleBuffer, reduction: &NoiseReduction) -> Result<SampleBuffer> {
    reduction.validate()?;

    if buffer.is_empty() {
        return Ok(buffer.clone());
    }

    debug!(
        mode = reduction.tag(),
        channels = buffer.channel_count(),
        frames = buffer.len(),
        "noise reduction"
    );

    match reduction {
        NoiseReduction::Hum(params) => remove_hum(buffer, params),
        NoiseReduction::Click(params) => repair_clicks(buffer, params),
        NoiseReduction::Deess(params) => deess(buffer, params),
        NoiseReduction::Room(params) => remove_room_tone(buffer, params),
    }
}

/// Resolve `tag` against `options` and run it
pub fn reduce_noise_by_tag(
    buffer: &SampleBuffer,
    tag: &str,
    options: &NoiseReductionOptions,
) -> Result<SampleBuffer> {
    let reduction = NoiseReduction::from_tag(tag, options)?;
    reduce_noise(buffer, &reduction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::buffer::generate_stereo_test_tone;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test]
    fn test_options_defaults() {
        let options = NoiseReductionOptions::default();
        assert_eq!(options.hum_params(), HumParams::default());
        assert_eq!(options.click_params().sensitivity, 0.5);
        assert_eq!(options.deess_params().threshold_db, -20.0);
        assert_eq!(options.deess_params().frequency, 4000.0);
        assert_eq!(options.gate_params().release_secs, 0.05);
    }

    #[test]
    fn test_options_from_ui_json() {
        let options: NoiseReductionOptions =
            serde_json::from_str(r#"{"humFrequency": 50, "gateAttack": 0.01}"#).unwrap();

        let hum = options.hum_params();
        assert_eq!(hum.frequency, 50.0);
        assert_eq!(hum.harmonics, 4);
        assert_eq!(options.gate_params().attack_secs, 0.01);
        assert_eq!(options.gate_params().threshold, 0.02);
    }

    #[test_case("hum")]
    #[test_case("click")]
    #[test_case("deess")]
    #[test_case("room")]
    fn test_from_tag_round_trips(tag: &str) {
        let reduction = NoiseReduction::from_tag(tag, &NoiseReductionOptions::default()).unwrap();
        assert_eq!(reduction.tag(), tag);
    }

    #[test]
    fn test_unknown_tag_is_unsupported() {
        let result = NoiseReduction::from_tag("reverb", &NoiseReductionOptions::default());
        match result {
            Err(SoundcutError::UnsupportedMode { mode }) => assert_eq!(mode, "reverb"),
            other => panic!("Expected UnsupportedMode, got: {:?}", other),
        }
    }

    #[test]
    fn test_tagged_serde() {
        let reduction = NoiseReduction::Deess(DeessParams::default());
        let json = serde_json::to_value(reduction).unwrap();
        assert_eq!(json["mode"], "deess");
        assert_eq!(json["thresholdDb"], -20.0);

        let parsed: NoiseReduction =
            serde_json::from_str(r#"{"mode": "click", "sensitivity": 0.9}"#).unwrap();
        assert_eq!(parsed, NoiseReduction::Click(ClickParams { sensitivity: 0.9 }));
    }

    #[test_case(NoiseReduction::Hum(HumParams::default()) ; "hum")]
    #[test_case(NoiseReduction::Click(ClickParams::default()) ; "click")]
    #[test_case(NoiseReduction::Deess(DeessParams::default()) ; "deess")]
    #[test_case(NoiseReduction::Room(GateParams::default()) ; "room")]
    fn test_every_mode_preserves_shape(reduction: NoiseReduction) {
        let buffer = generate_stereo_test_tone(440.0, 660.0, 0.25, 44100);
        let out = reduce_noise(&buffer, &reduction).unwrap();

        assert_eq!(out.channel_count(), buffer.channel_count());
        assert_eq!(out.len(), buffer.len());
        assert_eq!(out.sample_rate(), buffer.sample_rate());
        assert!(out.is_finite());
    }

    #[test_case(NoiseReduction::Hum(HumParams::default()) ; "hum")]
    #[test_case(NoiseReduction::Click(ClickParams::default()) ; "click")]
    #[test_case(NoiseReduction::Deess(DeessParams::default()) ; "deess")]
    #[test_case(NoiseReduction::Room(GateParams::default()) ; "room")]
    fn test_empty_buffer_is_noop(reduction: NoiseReduction) {
        let buffer = SampleBuffer::silent(2, 0, 44100).unwrap();
        assert_eq!(reduce_noise(&buffer, &reduction).unwrap(), buffer);
    }

    #[test]
    fn test_invalid_parameters_fail_before_processing() {
        let buffer = SampleBuffer::silent(1, 10, 44100).unwrap();
        let reduction = NoiseReduction::Click(ClickParams { sensitivity: -0.2 });
        assert!(matches!(
            reduce_noise(&buffer, &reduction),
            Err(SoundcutError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_input_is_not_mutated() {
        let buffer = generate_stereo_test_tone(60.0, 120.0, 0.1, 48000);
        let before = buffer.clone();
        let _ = reduce_noise_by_tag(&buffer, "hum", &NoiseReductionOptions::default()).unwrap();
        assert_eq!(buffer, before);
    }
}
