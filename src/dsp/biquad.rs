//! Biquad filter design and cascades
//!
//! Coefficients follow the Audio EQ Cookbook with the parameter conventions
//! of the Web Audio `BiquadFilterNode`, so the noise-reduction filters keep
//! the same frequency response the editor has always produced:
//! - notch: `Q` is a linear quality factor
//! - low-pass: `Q` is a resonance in dB
//! - high-shelf: fixed shelf slope `S = 1`, `Q` unused
//!
//! A stage whose frequency is at or above Nyquist (or not positive) is an
//! identity stage.

use std::f64::consts::PI;

/// Biquad filter coefficients
///
/// Transfer function: H(z) = (b0 + b1*z^-1 + b2*z^-2) / (1 + a1*z^-1 + a2*z^-2),
/// already normalized by a0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoeffs {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl Default for BiquadCoeffs {
    fn default() -> Self {
        Self::identity()
    }
}

impl BiquadCoeffs {
    /// Pass-through stage
    pub const fn identity() -> Self {
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
        }
    }

    fn normalized(b0: f64, b1: f64, b2: f64, a0: f64, a1: f64, a2: f64) -> Self {
        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }

    /// Angular frequency of `frequency`, or `None` outside (0, Nyquist)
    fn omega(sample_rate: f64, frequency: f64) -> Option<f64> {
        let nyquist = sample_rate / 2.0;
        (frequency > 0.0 && frequency < nyquist).then(|| 2.0 * PI * frequency / sample_rate)
    }

    /// Narrow band-reject filter centred on `frequency`
    pub fn notch(sample_rate: f64, frequency: f64, q: f64) -> Self {
        let Some(w0) = Self::omega(sample_rate, frequency) else {
            return Self::identity();
        };
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / (2.0 * q.max(1e-4));

        Self::normalized(
            1.0,
            -2.0 * cos_w0,
            1.0,
            1.0 + alpha,
            -2.0 * cos_w0,
            1.0 - alpha,
        )
    }

    /// Boost/cut of `gain_db` above `frequency`
    pub fn high_shelf(sample_rate: f64, frequency: f64, gain_db: f64) -> Self {
        let Some(w0) = Self::omega(sample_rate, frequency) else {
            return Self::identity();
        };
        let a = 10.0_f64.powf(gain_db / 40.0);
        let cos_w0 = w0.cos();
        // S = 1 reduces the cookbook slope term to sqrt(2)
        let alpha = w0.sin() / 2.0 * std::f64::consts::SQRT_2;
        let two_sqrt_a_alpha = 2.0 * a.sqrt() * alpha;

        Self::normalized(
            a * ((a + 1.0) + (a - 1.0) * cos_w0 + two_sqrt_a_alpha),
            -2.0 * a * ((a - 1.0) + (a + 1.0) * cos_w0),
            a * ((a + 1.0) + (a - 1.0) * cos_w0 - two_sqrt_a_alpha),
            (a + 1.0) - (a - 1.0) * cos_w0 + two_sqrt_a_alpha,
            2.0 * ((a - 1.0) - (a + 1.0) * cos_w0),
            (a + 1.0) - (a - 1.0) * cos_w0 - two_sqrt_a_alpha,
        )
    }

    /// Second-order low-pass with resonance `q_db`
    pub fn low_pass(sample_rate: f64, frequency: f64, q_db: f64) -> Self {
        let Some(w0) = Self::omega(sample_rate, frequency) else {
            return Self::identity();
        };
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / (2.0 * 10.0_f64.powf(q_db / 20.0));

        Self::normalized(
            (1.0 - cos_w0) / 2.0,
            1.0 - cos_w0,
            (1.0 - cos_w0) / 2.0,
            1.0 + alpha,
            -2.0 * cos_w0,
            1.0 - alpha,
        )
    }

    /// Check if coefficients represent a bypass (unity gain, no filtering)
    pub fn is_identity(&self) -> bool {
        (self.b0 - 1.0).abs() < 1e-10
            && self.b1.abs() < 1e-10
            && self.b2.abs() < 1e-10
            && self.a1.abs() < 1e-10
            && self.a2.abs() < 1e-10
    }

    /// Magnitude response at `frequency`
    pub fn magnitude_at(&self, sample_rate: f64, frequency: f64) -> f64 {
        let w = 2.0 * PI * frequency / sample_rate;
        let (cos1, sin1) = (w.cos(), w.sin());
        let (cos2, sin2) = ((2.0 * w).cos(), (2.0 * w).sin());

        let num_re = self.b0 + self.b1 * cos1 + self.b2 * cos2;
        let num_im = -(self.b1 * sin1 + self.b2 * sin2);
        let den_re = 1.0 + self.a1 * cos1 + self.a2 * cos2;
        let den_im = -(self.a1 * sin1 + self.a2 * sin2);

        ((num_re * num_re + num_im * num_im) / (den_re * den_re + den_im * den_im)).sqrt()
    }
}

/// Biquad filter state for one channel
#[derive(Debug, Clone, Copy, Default)]
struct BiquadState {
    x1: f64, // x[n-1]
    x2: f64, // x[n-2]
    y1: f64, // y[n-1]
    y2: f64, // y[n-2]
}

impl BiquadState {
    /// Direct Form I
    #[inline]
    fn process(&mut self, input: f64, coeffs: &BiquadCoeffs) -> f64 {
        let output = coeffs.b0 * input + coeffs.b1 * self.x1 + coeffs.b2 * self.x2
            - coeffs.a1 * self.y1
            - coeffs.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }
}

/// Filters applied in series: stage `n` receives the output of stage `n - 1`
#[derive(Debug, Clone, Default)]
pub struct FilterCascade {
    stages: Vec<BiquadCoeffs>,
}

impl FilterCascade {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage; identity stages are dropped
    pub fn push(&mut self, coeffs: BiquadCoeffs) {
        if !coeffs.is_identity() {
            self.stages.push(coeffs);
        }
    }

    pub fn stages(&self) -> &[BiquadCoeffs] {
        &self.stages
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Combined magnitude response at `frequency`
    pub fn magnitude_at(&self, sample_rate: f64, frequency: f64) -> f64 {
        self.stages
            .iter()
            .map(|c| c.magnitude_at(sample_rate, frequency))
            .product()
    }

    /// Filter one channel from silence, returning a new channel
    pub fn process_channel(&self, input: &[f32]) -> Vec<f32> {
        let mut states = vec![BiquadState::default(); self.stages.len()];

        input
            .iter()
            .map(|&sample| {
                let mut value = sample as f64;
                for (state, coeffs) in states.iter_mut().zip(&self.stages) {
                    value = state.process(value, coeffs);
                }
                value as f32
            })
            .collect()
    }
}
