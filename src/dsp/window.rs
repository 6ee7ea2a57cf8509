//! Windowed RMS over a channel
//!
//! Prefix sums of squared samples make every window query O(1), so the
//! sliding-window detectors stay linear in the buffer length.

/// Running sums of squared samples
#[derive(Debug, Clone)]
pub(crate) struct SquareSums {
    prefix: Vec<f64>,
}

impl SquareSums {
    pub(crate) fn new(samples: &[f32]) -> Self {
        let mut prefix = Vec::with_capacity(samples.len() + 1);
        let mut acc = 0.0_f64;
        prefix.push(acc);
        for &s in samples {
            acc += (s as f64) * (s as f64);
            prefix.push(acc);
        }
        Self { prefix }
    }

    /// Sum of squares over `start..end`
    #[inline]
    pub(crate) fn sum(&self, start: usize, end: usize) -> f64 {
        // Subtraction can dip just below zero on near-silent input
        (self.prefix[end] - self.prefix[start]).max(0.0)
    }

    /// RMS over `start..end`; 0.0 for an empty range
    #[inline]
    pub(crate) fn rms(&self, start: usize, end: usize) -> f64 {
        if end <= start {
            return 0.0;
        }
        (self.sum(start, end) / (end - start) as f64).sqrt()
    }
}
