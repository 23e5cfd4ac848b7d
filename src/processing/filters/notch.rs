// src/processing/filters/notch.rs
//! Second-order IIR notch for line-noise removal

use super::{SecondOrderSection, SosFilter};
use crate::config::validate_notch;
use crate::error::EegResult;
use std::f64::consts::PI;

/// Notch at `freq_hz` with bandwidth `freq_hz / quality`.
///
/// Gain is unity at DC and Nyquist and zero at the notch frequency.
pub fn iir_notch(freq_hz: f64, quality: f64, sampling_rate: f64) -> EegResult<SosFilter> {
    validate_notch(freq_hz, quality, sampling_rate)?;

    let w0 = 2.0 * PI * freq_hz / sampling_rate;
    let bandwidth = w0 / quality;
    let gain = 1.0 / (1.0 + (bandwidth / 2.0).tan());
    let cos_w0 = w0.cos();

    let b = [gain, -2.0 * gain * cos_w0, gain];
    let a = [1.0, -2.0 * gain * cos_w0, 2.0 * gain - 1.0];

    Ok(SosFilter::new(
        format!("Notch-{}Hz-Q{}", freq_hz, quality),
        vec![SecondOrderSection::new(b, a)],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::filters::Filter;

    #[test]
    fn test_notch_response() {
        let fs = 256.0;
        let notch = iir_notch(50.0, 30.0, fs).unwrap();
        assert!(notch.magnitude_at(50.0, fs) < 1e-9);
        assert!((notch.magnitude_at(0.0, fs) - 1.0).abs() < 1e-12);
        assert!((notch.magnitude_at(10.0, fs) - 1.0).abs() < 0.01);
        // Half-power points lie half a bandwidth from the center
        let half_power = notch.magnitude_at(50.0 + 50.0 / 30.0 / 2.0, fs);
        assert!((half_power - std::f64::consts::FRAC_1_SQRT_2).abs() < 0.05);
    }

    #[test]
    fn test_removes_line_noise() {
        let fs = 256.0;
        let mut notch = iir_notch(50.0, 30.0, fs).unwrap();
        let hum: Vec<f64> = (0..4096).map(|i| (2.0 * PI * 50.0 * i as f64 / fs).sin()).collect();
        let out = notch.process(&hum);
        let tail_peak = out[3072..].iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        assert!(tail_peak < 0.01, "residual hum {}", tail_peak);
    }

    #[test]
    fn test_rejects_frequency_above_nyquist() {
        assert!(iir_notch(50.0, 30.0, 90.0).unwrap_err().is_configuration());
    }
}
