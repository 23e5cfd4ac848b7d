// src/processing/filters/mod.rs
//! Causal IIR filters built from cascaded second-order sections

pub mod butterworth;
pub mod notch;

pub use butterworth::butterworth_bandpass;
pub use notch::iir_notch;

use rustfft::num_complex::Complex64;

/// Stateful filter applied sample by sample
pub trait Filter {
    fn process(&mut self, input: &[f64]) -> Vec<f64>;
    fn reset(&mut self);
    fn get_name(&self) -> &str;
}

/// Biquad in transposed direct form II, `a0` normalized to 1
#[derive(Debug, Clone, PartialEq)]
pub struct SecondOrderSection {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
    z1: f64,
    z2: f64,
}

impl SecondOrderSection {
    pub fn new(b: [f64; 3], a: [f64; 3]) -> Self {
        Self {
            b0: b[0] / a[0],
            b1: b[1] / a[0],
            b2: b[2] / a[0],
            a1: a[1] / a[0],
            a2: a[2] / a[0],
            z1: 0.0,
            z2: 0.0,
        }
    }

    #[inline]
    pub fn process_sample(&mut self, x: f64) -> f64 {
        let y = self.b0 * x + self.z1;
        self.z1 = self.b1 * x - self.a1 * y + self.z2;
        self.z2 = self.b2 * x - self.a2 * y;
        y
    }

    pub fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }

    /// Complex response at `z = e^{jω}`
    pub fn response(&self, omega: f64) -> Complex64 {
        let z1 = Complex64::from_polar(1.0, -omega);
        let z2 = z1 * z1;
        let num = self.b0 + z1 * self.b1 + z2 * self.b2;
        let den = 1.0 + z1 * self.a1 + z2 * self.a2;
        num / den
    }

    /// Multiply the numerator by `gain`
    pub fn scale(&mut self, gain: f64) {
        self.b0 *= gain;
        self.b1 *= gain;
        self.b2 *= gain;
    }
}

/// Cascade of second-order sections
#[derive(Debug, Clone)]
pub struct SosFilter {
    name: String,
    sections: Vec<SecondOrderSection>,
}

impl SosFilter {
    pub fn new(name: impl Into<String>, sections: Vec<SecondOrderSection>) -> Self {
        Self {
            name: name.into(),
            sections,
        }
    }

    pub fn sections(&self) -> &[SecondOrderSection] {
        &self.sections
    }

    /// Overall order of the denominator polynomial
    pub fn order(&self) -> usize {
        2 * self.sections.len()
    }

    /// Magnitude of the cascade response at `freq_hz`
    pub fn magnitude_at(&self, freq_hz: f64, sampling_rate: f64) -> f64 {
        let omega = 2.0 * std::f64::consts::PI * freq_hz / sampling_rate;
        self.sections
            .iter()
            .fold(Complex64::new(1.0, 0.0), |acc, s| acc * s.response(omega))
            .norm()
    }

    /// Filter a whole sequence from rest without touching internal state
    pub fn apply(&self, input: &[f64]) -> Vec<f64> {
        let mut fresh = self.clone();
        fresh.process(input)
    }
}

impl Filter for SosFilter {
    fn process(&mut self, input: &[f64]) -> Vec<f64> {
        input
            .iter()
            .map(|&x| {
                self.sections
                    .iter_mut()
                    .fold(x, |acc, section| section.process_sample(acc))
            })
            .collect()
    }

    fn reset(&mut self) {
        for section in &mut self.sections {
            section.reset();
        }
    }

    fn get_name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_section() {
        let mut section = SecondOrderSection::new([1.0, 0.0, 0.0], [1.0, 0.0, 0.0]);
        let out: Vec<f64> = [1.0, -2.0, 3.5].iter().map(|&x| section.process_sample(x)).collect();
        assert_eq!(out, vec![1.0, -2.0, 3.5]);
    }

    #[test]
    fn test_section_normalizes_a0() {
        let section = SecondOrderSection::new([2.0, 4.0, 2.0], [2.0, 1.0, 0.5]);
        assert_eq!((section.b0, section.b1, section.b2), (1.0, 2.0, 1.0));
        assert_eq!((section.a1, section.a2), (0.5, 0.25));
    }

    #[test]
    fn test_one_pole_impulse_response() {
        // y[n] = x[n] + 0.5 y[n-1]
        let mut filter = SosFilter::new("one-pole", vec![SecondOrderSection::new([1.0, 0.0, 0.0], [1.0, -0.5, 0.0])]);
        let out = filter.process(&[1.0, 0.0, 0.0, 0.0]);
        assert_eq!(out, vec![1.0, 0.5, 0.25, 0.125]);

        filter.reset();
        assert_eq!(filter.process(&[1.0]), vec![1.0]);
        assert_eq!(filter.get_name(), "one-pole");
    }

    #[test]
    fn test_apply_does_not_keep_state() {
        let filter = SosFilter::new("one-pole", vec![SecondOrderSection::new([1.0, 0.0, 0.0], [1.0, -0.5, 0.0])]);
        assert_eq!(filter.apply(&[1.0, 0.0]), filter.apply(&[1.0, 0.0]));
    }
}
