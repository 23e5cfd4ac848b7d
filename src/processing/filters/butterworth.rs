// src/processing/filters/butterworth.rs
//! Butterworth bandpass design
//!
//! Analog lowpass prototype, lowpass-to-bandpass transform around the prewarped
//! band edges, then the bilinear transform. An order-`N` design yields `N`
//! sections (a `2N`-order filter) with unit gain at the digital center frequency.

use super::{SecondOrderSection, SosFilter};
use crate::config::{validate_band, validate_order};
use crate::error::{EegErrorBuilder, EegResult, PipelineStage};
use rustfft::num_complex::Complex64;
use std::f64::consts::PI;
use tracing::debug;

const REAL_POLE_TOLERANCE: f64 = 1e-12;

/// Design an order-`order` Butterworth bandpass for `[low_hz, high_hz]`
pub fn butterworth_bandpass(order: usize, low_hz: f64, high_hz: f64, sampling_rate: f64) -> EegResult<SosFilter> {
    validate_order(order)?;
    validate_band(low_hz, high_hz, sampling_rate)?;

    let fs2 = 2.0 * sampling_rate;
    let warped_low = fs2 * (PI * low_hz / sampling_rate).tan();
    let warped_high = fs2 * (PI * high_hz / sampling_rate).tan();
    let bandwidth = warped_high - warped_low;
    let center = (warped_low * warped_high).sqrt();

    // Each prototype pole p maps to the two roots of s² − p·bw·s + w0² = 0
    let mut digital_poles = Vec::with_capacity(2 * order);
    for k in 0..order {
        let theta = PI * (2 * k + order + 1) as f64 / (2 * order) as f64;
        let prototype = Complex64::from_polar(1.0, theta);
        let pb = prototype * bandwidth;
        let disc = (pb * pb - 4.0 * center * center).sqrt();
        for s in [(pb + disc) / 2.0, (pb - disc) / 2.0] {
            digital_poles.push((fs2 + s) / (fs2 - s));
        }
    }

    let mut sections = pair_poles(&digital_poles)?;
    if sections.len() != order {
        return Err(EegErrorBuilder::new("butterworth", "pair_poles").numerical(
            PipelineStage::Bandpass,
            format!("expected {} sections, paired {}", order, sections.len()),
        ));
    }

    let digital_center = 2.0 * (center / fs2).atan();
    let response = sections
        .iter()
        .fold(Complex64::new(1.0, 0.0), |acc, s| acc * s.response(digital_center))
        .norm();
    if !response.is_finite() || response <= 0.0 {
        return Err(EegErrorBuilder::new("butterworth", "normalize_gain")
            .numerical(PipelineStage::Bandpass, "degenerate passband response"));
    }
    if let Some(first) = sections.first_mut() {
        first.scale(1.0 / response);
    }

    debug!(order, low_hz, high_hz, sampling_rate, sections = sections.len(), "designed bandpass");
    Ok(SosFilter::new(
        format!("Butterworth-{}-{}Hz", low_hz, high_hz),
        sections,
    ))
}

/// Group poles into biquads. Each section carries one zero at z = 1 and one at
/// z = −1, so every numerator is `1 − z⁻²`.
fn pair_poles(poles: &[Complex64]) -> EegResult<Vec<SecondOrderSection>> {
    let numerator = [1.0, 0.0, -1.0];
    let mut sections = Vec::new();
    let mut real_poles = Vec::new();

    for pole in poles {
        if pole.im > REAL_POLE_TOLERANCE {
            sections.push(SecondOrderSection::new(
                numerator,
                [1.0, -2.0 * pole.re, pole.norm_sqr()],
            ));
        } else if pole.im.abs() <= REAL_POLE_TOLERANCE {
            real_poles.push(pole.re);
        }
    }

    if real_poles.len() % 2 != 0 {
        return Err(EegErrorBuilder::new("butterworth", "pair_poles")
            .numerical(PipelineStage::Bandpass, "odd number of real poles"));
    }
    real_poles.sort_by(|a, b| a.total_cmp(b));
    for pair in real_poles.chunks(2) {
        sections.push(SecondOrderSection::new(
            numerator,
            [1.0, -(pair[0] + pair[1]), pair[0] * pair[1]],
        ));
    }
    Ok(sections)
}
