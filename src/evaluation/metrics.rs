//! Sub-metric computations for the quality evaluator
//!
//! Each function is pure over a flattened `(raw, cleaned)` pair of equal,
//! non-zero length. Ratios carry an epsilon in the denominator and every
//! percentage that feeds a score is clamped to `[0, 100]`.

use crate::analysis::spectral;
use crate::config::constants::{evaluation, numeric::EPSILON};
use crate::config::{EvaluationConfig, FilterConfig};
use crate::processing::pipeline::StepTimings;
use crate::utils::stats;
use rustfft::num_complex::Complex64;
use rustfft::FftPlanner;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Clamp a percentage into `[0, 100]`, mapping NaN to 0
pub fn bounded_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// Clamp a preservation ratio into `[0, 1]`, mapping NaN to 0
fn bounded_ratio(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// `(raw - cleaned) / raw` as a percentage, 0 when the raw quantity is not positive
fn reduction_percent(raw: f64, cleaned: f64) -> f64 {
    if raw > 0.0 {
        (raw - cleaned) / (raw + EPSILON) * 100.0
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Excellent,
    Good,
    Moderate,
    Poor,
}

impl Rating {
    pub fn from_score(score: f64) -> Self {
        if score >= evaluation::RATING_EXCELLENT {
            Rating::Excellent
        } else if score >= evaluation::RATING_GOOD {
            Rating::Good
        } else if score >= evaluation::RATING_MODERATE {
            Rating::Moderate
        } else {
            Rating::Poor
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Rating::Excellent => "excellent",
            Rating::Good => "good",
            Rating::Moderate => "moderate",
            Rating::Poor => "poor",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataInfo {
    pub duration_seconds: f64,
    pub samples: usize,
    pub sampling_rate: f64,
    pub raw_mean: f64,
    pub raw_std: f64,
    pub raw_min: f64,
    pub raw_max: f64,
    pub cleaned_mean: f64,
    pub cleaned_std: f64,
    pub cleaned_min: f64,
    pub cleaned_max: f64,
}

fn min_max(x: &[f64]) -> (f64, f64) {
    x.iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}

pub fn data_info(raw: &[f64], cleaned: &[f64], sampling_rate: f64) -> DataInfo {
    let (raw_min, raw_max) = min_max(raw);
    let (cleaned_min, cleaned_max) = min_max(cleaned);
    DataInfo {
        duration_seconds: raw.len() as f64 / sampling_rate,
        samples: raw.len(),
        sampling_rate,
        raw_mean: stats::mean(raw),
        raw_std: stats::std_dev(raw),
        raw_min,
        raw_max,
        cleaned_mean: stats::mean(cleaned),
        cleaned_std: stats::std_dev(cleaned),
        cleaned_min,
        cleaned_max,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalQualityMetrics {
    pub snr_db: f64,
    pub noise_reduction_percent: f64,
    pub rmse: f64,
    pub correlation: f64,
    pub signal_preservation_score: f64,
    pub dynamic_range_preservation: f64,
    pub quality_score: f64,
    pub quality_rating: Rating,
}

pub fn signal_quality(raw: &[f64], cleaned: &[f64]) -> SignalQualityMetrics {
    let raw_power = stats::variance(raw);
    let cleaned_power = stats::variance(cleaned);
    let noise_power = raw_power - cleaned_power;

    let snr_db = if noise_power > 0.0 {
        10.0 * (cleaned_power / (noise_power + EPSILON)).log10()
    } else if cleaned_power > 0.0 {
        evaluation::SNR_CAP_DB
    } else {
        0.0
    };
    let noise_reduction = if raw_power > 0.0 {
        bounded_percent(noise_power / raw_power * 100.0)
    } else {
        0.0
    };

    let rmse = (raw.iter().zip(cleaned).map(|(r, c)| (r - c).powi(2)).sum::<f64>() / raw.len().max(1) as f64).sqrt();
    let correlation = stats::pearson(raw, cleaned);
    let preservation = bounded_percent(correlation.abs() * 100.0);

    let raw_range = stats::peak_to_peak(raw);
    let range_preservation = if raw_range > 0.0 {
        stats::peak_to_peak(cleaned) / raw_range * 100.0
    } else {
        0.0
    };

    let snr_component = if snr_db.is_nan() { 0.0 } else { snr_db.clamp(0.0, evaluation::SNR_CAP_DB) };
    let quality_score = bounded_percent(
        snr_component / evaluation::SNR_CAP_DB * 40.0 + noise_reduction / 100.0 * 30.0 + preservation / 100.0 * 30.0,
    );

    SignalQualityMetrics {
        snr_db,
        noise_reduction_percent: noise_reduction,
        rmse,
        correlation,
        signal_preservation_score: preservation,
        dynamic_range_preservation: range_preservation,
        quality_score,
        quality_rating: Rating::from_score(quality_score),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandpassEffectiveness {
    pub out_of_band_reduction_percent: f64,
    pub in_band_preservation_percent: f64,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotchEffectiveness {
    pub notch_reduction_percent: f64,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterEffectiveness {
    pub bandpass_effectiveness: BandpassEffectiveness,
    pub notch_effectiveness: NotchEffectiveness,
    pub overall_filter_score: f64,
}

/// Squared magnitude of the one-sided DFT, with its frequency grid
fn power_spectrum(samples: &[f64], sampling_rate: f64) -> (Vec<f64>, Vec<f64>) {
    let n = samples.len();
    if n == 0 {
        return (Vec::new(), Vec::new());
    }
    let mut buffer: Vec<Complex64> = samples.iter().map(|&x| Complex64::new(x, 0.0)).collect();
    FftPlanner::<f64>::new().plan_fft_forward(n).process(&mut buffer);
    let bins = n / 2 + 1;
    let freqs = (0..bins).map(|k| k as f64 * sampling_rate / n as f64).collect();
    let power = buffer[..bins].iter().map(|c| c.norm_sqr()).collect();
    (freqs, power)
}

fn masked_sum(freqs: &[f64], power: &[f64], mask: impl Fn(f64) -> bool) -> f64 {
    freqs.iter().zip(power).filter(|(f, _)| mask(**f)).map(|(_, p)| p).sum()
}

pub fn filter_effectiveness(
    raw: &[f64],
    cleaned: &[f64],
    sampling_rate: f64,
    filter: &FilterConfig,
    config: &EvaluationConfig,
) -> FilterEffectiveness {
    let (freqs, raw_power) = power_spectrum(raw, sampling_rate);
    let (_, cleaned_power) = power_spectrum(cleaned, sampling_rate);
    let (low, high) = (filter.bandpass_low_hz, filter.bandpass_high_hz);

    let in_band = |f: f64| f >= low && f <= high;
    let out_of_band = |f: f64| f < low || f > high;
    let notch = |f: f64| (f - filter.notch_freq_hz).abs() <= config.notch_halfwidth_hz;

    let oob_reduction = bounded_percent(reduction_percent(
        masked_sum(&freqs, &raw_power, out_of_band),
        masked_sum(&freqs, &cleaned_power, out_of_band),
    ));

    let in_band_raw = masked_sum(&freqs, &raw_power, in_band);
    let in_band_preservation = if in_band_raw > 0.0 {
        bounded_percent(masked_sum(&freqs, &cleaned_power, in_band) / (in_band_raw + EPSILON) * 100.0)
    } else {
        0.0
    };

    let notch_reduction = bounded_percent(reduction_percent(
        masked_sum(&freqs, &raw_power, notch),
        masked_sum(&freqs, &cleaned_power, notch),
    ));

    FilterEffectiveness {
        bandpass_effectiveness: BandpassEffectiveness {
            out_of_band_reduction_percent: oob_reduction,
            in_band_preservation_percent: in_band_preservation,
            score: (oob_reduction + in_band_preservation) / 2.0,
        },
        notch_effectiveness: NotchEffectiveness {
            notch_reduction_percent: notch_reduction,
            score: notch_reduction,
        },
        overall_filter_score: (oob_reduction + in_band_preservation + notch_reduction) / 3.0,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyDomainMetrics {
    pub raw_dominant_frequency: f64,
    pub cleaned_dominant_frequency: f64,
    pub frequency_shift_hz: f64,
    pub total_power_preservation: f64,
    pub spectral_correlation: f64,
    pub frequency_stability_score: f64,
}

pub fn frequency_domain(raw: &[f64], cleaned: &[f64], sampling_rate: f64) -> FrequencyDomainMetrics {
    let segment = (raw.len() / evaluation::SEGMENT_DIVISOR).clamp(1, 256);
    let raw_psd = spectral::welch(raw, sampling_rate, segment);
    let cleaned_psd = spectral::welch(cleaned, sampling_rate, segment);

    let raw_dominant = raw_psd.dominant_frequency();
    let cleaned_dominant = cleaned_psd.dominant_frequency();
    let shift = (raw_dominant - cleaned_dominant).abs();

    let raw_total = raw_psd.total_power();
    let power_preservation = if raw_total > 0.0 {
        cleaned_psd.total_power() / (raw_total + EPSILON) * 100.0
    } else {
        0.0
    };

    let top = match (raw_psd.freqs.last(), cleaned_psd.freqs.last()) {
        (Some(a), Some(b)) => a.min(*b),
        _ => 0.0,
    };
    let grid = stats::linspace(0.0, top, evaluation::SPECTRAL_GRID_POINTS);
    let spectral_correlation = stats::pearson(
        &stats::interp(&grid, &raw_psd.freqs, &raw_psd.power),
        &stats::interp(&grid, &cleaned_psd.freqs, &cleaned_psd.power),
    );

    FrequencyDomainMetrics {
        raw_dominant_frequency: raw_dominant,
        cleaned_dominant_frequency: cleaned_dominant,
        frequency_shift_hz: shift,
        total_power_preservation: power_preservation,
        spectral_correlation,
        frequency_stability_score: bounded_percent(
            100.0 - (shift * evaluation::FREQUENCY_SHIFT_PENALTY).min(100.0),
        ),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticalValidation {
    pub variance_ratio: f64,
    pub mean_preservation: f64,
    pub skewness_preservation: f64,
    pub kurtosis_preservation: f64,
    pub statistical_integrity_score: f64,
}

fn preservation_ratio(raw: f64, cleaned: f64) -> f64 {
    bounded_ratio(1.0 - (cleaned - raw).abs() / (raw.abs() + EPSILON))
}

pub fn statistical_validation(raw: &[f64], cleaned: &[f64]) -> StatisticalValidation {
    let mean = preservation_ratio(stats::mean(raw), stats::mean(cleaned));
    let skew = preservation_ratio(stats::skewness(raw), stats::skewness(cleaned));
    let kurt = preservation_ratio(stats::kurtosis(raw), stats::kurtosis(cleaned));
    StatisticalValidation {
        variance_ratio: stats::variance(cleaned) / (stats::variance(raw) + EPSILON),
        mean_preservation: mean * 100.0,
        skewness_preservation: skew * 100.0,
        kurtosis_preservation: kurt * 100.0,
        statistical_integrity_score: (mean + skew + kurt) / 3.0 * 100.0,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtefactMetrics {
    pub artefacts_detected_raw: usize,
    pub artefacts_detected_cleaned: usize,
    pub artefact_reduction_percent: f64,
    pub peak_amplitude_reduction: f64,
    pub artefact_power_reduction: f64,
    pub artefact_removal_score: f64,
}

/// Samples above `3·std(raw)` in both signals, counted and summed in power
pub fn artefact_removal(raw: &[f64], cleaned: &[f64]) -> ArtefactMetrics {
    let threshold = evaluation::ARTIFACT_STD_FACTOR * stats::std_dev(raw);
    let above = |x: &[f64]| -> (usize, f64) {
        x.iter()
            .filter(|v| v.abs() > threshold)
            .fold((0, 0.0), |(count, power), v| (count + 1, power + v * v))
    };
    let (raw_count, raw_power) = above(raw);
    let (cleaned_count, cleaned_power) = above(cleaned);

    let count_reduction = bounded_percent(reduction_percent(raw_count as f64, cleaned_count as f64));
    let peak_reduction = bounded_percent(reduction_percent(stats::max_abs(raw), stats::max_abs(cleaned)));
    let power_reduction = bounded_percent(reduction_percent(raw_power, cleaned_power));

    ArtefactMetrics {
        artefacts_detected_raw: raw_count,
        artefacts_detected_cleaned: cleaned_count,
        artefact_reduction_percent: count_reduction,
        peak_amplitude_reduction: peak_reduction,
        artefact_power_reduction: power_reduction,
        artefact_removal_score: (count_reduction + peak_reduction + power_reduction) / 3.0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthIssue {
    NanValues,
    InfiniteValues,
}

impl fmt::Display for HealthIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HealthIssue::NanValues => "NaN values detected in cleaned data",
            HealthIssue::InfiniteValues => "Infinite values detected in cleaned data",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthWarning {
    OverFiltering,
    UnderFiltering,
    Clipping,
}

impl fmt::Display for HealthWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HealthWarning::OverFiltering => "Possible over-filtering: signal variance reduced by >90%",
            HealthWarning::UnderFiltering => "Possible under-filtering: significant noise may remain",
            HealthWarning::Clipping => "Possible clipping detected in cleaned signal",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Unhealthy => "unhealthy",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineHealth {
    pub health_score: f64,
    pub issues: Vec<HealthIssue>,
    pub warnings: Vec<HealthWarning>,
    pub status: HealthStatus,
}

/// True when a repeated extreme value covers more than 1% of the finite samples
fn looks_clipped(cleaned: &[f64]) -> bool {
    let finite: Vec<f64> = cleaned.iter().copied().filter(|v| v.is_finite()).collect();
    let (lo, hi) = min_max(&finite);
    if finite.is_empty() || hi <= lo {
        return false;
    }
    let limit = finite.len() as f64 * evaluation::CLIPPING_FRACTION;
    [hi, lo].iter().any(|&extreme| {
        let count = finite.iter().filter(|&&v| v == extreme).count();
        count >= 2 && count as f64 > limit
    })
}

pub fn pipeline_health(raw: &[f64], cleaned: &[f64]) -> PipelineHealth {
    let mut issues = Vec::new();
    if cleaned.iter().any(|v| v.is_nan()) {
        issues.push(HealthIssue::NanValues);
    }
    if cleaned.iter().any(|v| v.is_infinite()) {
        issues.push(HealthIssue::InfiniteValues);
    }

    let raw_std = stats::std_dev(raw);
    let residual: Vec<f64> = raw.iter().zip(cleaned).map(|(r, c)| r - c).collect();
    let mut warnings = Vec::new();
    if stats::std_dev(cleaned) < raw_std * evaluation::OVER_FILTER_STD_RATIO {
        warnings.push(HealthWarning::OverFiltering);
    }
    if stats::std_dev(&residual) > raw_std * evaluation::UNDER_FILTER_STD_RATIO {
        warnings.push(HealthWarning::UnderFiltering);
    }
    if looks_clipped(cleaned) {
        warnings.push(HealthWarning::Clipping);
    }

    let health_score = (100.0
        - issues.len() as f64 * evaluation::HEALTH_ISSUE_PENALTY
        - warnings.len() as f64 * evaluation::HEALTH_WARNING_PENALTY)
        .max(0.0);
    let status = if health_score >= evaluation::HEALTHY_SCORE {
        HealthStatus::Healthy
    } else if health_score >= evaluation::DEGRADED_SCORE {
        HealthStatus::Degraded
    } else {
        HealthStatus::Unhealthy
    };

    PipelineHealth {
        health_score,
        issues,
        warnings,
        status,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceMetrics {
    pub total_time: f64,
    pub steps: BTreeMap<String, f64>,
    pub samples_per_second: f64,
    pub efficiency_score: f64,
    pub performance_rating: Rating,
}

pub fn performance(timings: &StepTimings, samples: usize, config: &EvaluationConfig) -> PerformanceMetrics {
    let total_time = timings.total();
    let samples_per_second = if total_time > 0.0 {
        samples as f64 / total_time
    } else {
        0.0
    };
    let efficiency_score = (samples_per_second / config.reference_throughput * 100.0).min(100.0);
    PerformanceMetrics {
        total_time,
        steps: timings.steps().clone(),
        samples_per_second,
        efficiency_score,
        performance_rating: Rating::from_score(efficiency_score),
    }
}
