//! Plain-text rendering of evaluation results

use crate::error::EegResult;
use crate::evaluation::{EvaluationResult, QualityEvaluator};
use crate::processing::pipeline::StepTimings;
use crate::signal::Signal;
use tracing::debug;

/// Deterministic human-readable breakdown of every sub-metric
pub fn render_report(result: &EvaluationResult) -> String {
    let info = &result.data_info;
    let sq = &result.signal_quality_metrics;
    let fe = &result.filter_effectiveness;
    let fd = &result.frequency_domain_metrics;
    let art = &result.artefact_metrics;
    let sv = &result.statistical_validation;
    let health = &result.pipeline_health;

    let mut lines = vec![
        "EEG Pipeline Evaluation Report".to_string(),
        "==============================".to_string(),
        format!("Overall score: {:.1}/100", result.overall_score),
        String::new(),
        "Data Information".to_string(),
        format!("- Duration: {:.2} s", info.duration_seconds),
        format!("- Samples: {}", info.samples),
        format!("- Sampling rate: {:.1} Hz", info.sampling_rate),
        format!("- Raw: mean {:.3}, std {:.3}, range [{:.3}, {:.3}]", info.raw_mean, info.raw_std, info.raw_min, info.raw_max),
        format!(
            "- Cleaned: mean {:.3}, std {:.3}, range [{:.3}, {:.3}]",
            info.cleaned_mean, info.cleaned_std, info.cleaned_min, info.cleaned_max
        ),
        String::new(),
        "Signal Quality".to_string(),
        format!("- SNR: {:.2} dB", sq.snr_db),
        format!("- Noise reduction: {:.2}%", sq.noise_reduction_percent),
        format!("- RMSE: {:.4}", sq.rmse),
        format!("- Correlation: {:.3}", sq.correlation),
        format!("- Signal preservation: {:.2}%", sq.signal_preservation_score),
        format!("- Dynamic range preservation: {:.2}%", sq.dynamic_range_preservation),
        format!("- Quality score: {:.1} ({})", sq.quality_score, sq.quality_rating),
        String::new(),
        "Filter Effectiveness".to_string(),
        format!("- Out-of-band reduction: {:.2}%", fe.bandpass_effectiveness.out_of_band_reduction_percent),
        format!("- In-band preservation: {:.2}%", fe.bandpass_effectiveness.in_band_preservation_percent),
        format!("- Bandpass score: {:.1}", fe.bandpass_effectiveness.score),
        format!("- Notch reduction: {:.2}%", fe.notch_effectiveness.notch_reduction_percent),
        format!("- Overall filter score: {:.1}", fe.overall_filter_score),
        String::new(),
        "Frequency Domain".to_string(),
        format!(
            "- Dominant frequency: {:.2} Hz -> {:.2} Hz (shift {:.2} Hz)",
            fd.raw_dominant_frequency, fd.cleaned_dominant_frequency, fd.frequency_shift_hz
        ),
        format!("- Total power preservation: {:.2}%", fd.total_power_preservation),
        format!("- Spectral correlation: {:.3}", fd.spectral_correlation),
        format!("- Stability score: {:.1}", fd.frequency_stability_score),
        String::new(),
        "Artefact Removal".to_string(),
        format!(
            "- Samples above threshold: {} -> {}",
            art.artefacts_detected_raw, art.artefacts_detected_cleaned
        ),
        format!("- Count reduction: {:.2}%", art.artefact_reduction_percent),
        format!("- Peak amplitude reduction: {:.2}%", art.peak_amplitude_reduction),
        format!("- Artefact power reduction: {:.2}%", art.artefact_power_reduction),
        format!("- Removal score: {:.1}", art.artefact_removal_score),
        String::new(),
        "Statistical Validation".to_string(),
        format!("- Variance ratio: {:.3}", sv.variance_ratio),
        format!("- Mean preservation: {:.2}%", sv.mean_preservation),
        format!("- Skewness preservation: {:.2}%", sv.skewness_preservation),
        format!("- Kurtosis preservation: {:.2}%", sv.kurtosis_preservation),
        format!("- Integrity score: {:.1}", sv.statistical_integrity_score),
        String::new(),
        "Pipeline Health".to_string(),
        format!("- Status: {} ({:.0}/100)", health.status, health.health_score),
    ];
    lines.extend(health.issues.iter().map(|issue| format!("- Issue: {}", issue)));
    lines.extend(health.warnings.iter().map(|warning| format!("- Warning: {}", warning)));

    if let Some(perf) = &result.performance_metrics {
        lines.push(String::new());
        lines.push("Performance".to_string());
        lines.push(format!("- Total time: {:.4} s", perf.total_time));
        lines.extend(perf.steps.iter().map(|(step, secs)| format!("  - {}: {:.4} s", step, secs)));
        lines.push(format!("- Throughput: {:.0} samples/s", perf.samples_per_second));
        lines.push(format!("- Efficiency: {:.1} ({})", perf.efficiency_score, perf.performance_rating));
    }

    lines.join("\n")
}

#[derive(Debug, Clone)]
struct CachedReport {
    fingerprint: u32,
    evaluator: QualityEvaluator,
    raw: Signal,
    cleaned: Signal,
    timings: Option<StepTimings>,
    result: EvaluationResult,
    text: String,
}

impl CachedReport {
    fn matches(
        &self,
        fingerprint: u32,
        evaluator: &QualityEvaluator,
        raw: &Signal,
        cleaned: &Signal,
        timings: Option<&StepTimings>,
    ) -> bool {
        self.fingerprint == fingerprint
            && self.evaluator == *evaluator
            && self.timings.as_ref() == timings
            && self.raw == *raw
            && self.cleaned == *cleaned
    }
}

/// Last evaluation and its rendered report.
///
/// Entries are keyed by the evaluator settings together with the inputs. A
/// CRC32 fingerprint rejects most misses cheaply; a fingerprint match is
/// confirmed against the stored inputs before the report is reused.
/// [`ReportCache::invalidate`] drops the entry outright.
#[derive(Debug, Clone, Default)]
pub struct ReportCache {
    entry: Option<CachedReport>,
}

impl ReportCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// CRC32 over evaluator settings, shapes, sampling rates, sample bits and step timings
    pub fn fingerprint(
        evaluator: &QualityEvaluator,
        raw: &Signal,
        cleaned: &Signal,
        timings: Option<&StepTimings>,
    ) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        let filter = evaluator.filter_config();
        let config = evaluator.config();
        for setting in [
            filter.bandpass_low_hz,
            filter.bandpass_high_hz,
            filter.notch_freq_hz,
            filter.notch_quality,
            config.notch_halfwidth_hz,
            config.reference_throughput,
        ] {
            hasher.update(&setting.to_le_bytes());
        }
        hasher.update(&(filter.filter_order as u64).to_le_bytes());

        for signal in [raw, cleaned] {
            hasher.update(&(signal.sample_count() as u64).to_le_bytes());
            hasher.update(&(signal.channel_count() as u64).to_le_bytes());
            hasher.update(&signal.sampling_rate().to_le_bytes());
            for v in signal.data().iter() {
                hasher.update(&v.to_le_bytes());
            }
        }
        if let Some(timings) = timings {
            for (step, secs) in timings.steps() {
                hasher.update(step.as_bytes());
                hasher.update(&secs.to_le_bytes());
            }
        }
        hasher.finalize()
    }

    /// Cached report for these inputs, evaluating and rendering on a miss
    pub fn report_for(
        &mut self,
        evaluator: &QualityEvaluator,
        raw: &Signal,
        cleaned: &Signal,
        timings: Option<&StepTimings>,
    ) -> EegResult<&str> {
        let fingerprint = Self::fingerprint(evaluator, raw, cleaned, timings);
        let hit = matches!(&self.entry, Some(entry) if entry.matches(fingerprint, evaluator, raw, cleaned, timings));
        if !hit {
            let result = evaluator.evaluate(raw, cleaned, timings)?;
            let text = render_report(&result);
            debug!(fingerprint, "report cache refreshed");
            self.entry = Some(CachedReport {
                fingerprint,
                evaluator: evaluator.clone(),
                raw: raw.clone(),
                cleaned: cleaned.clone(),
                timings: timings.cloned(),
                result,
                text,
            });
        }
        Ok(self.entry.as_ref().map_or("", |entry| entry.text.as_str()))
    }

    pub fn last_result(&self) -> Option<&EvaluationResult> {
        self.entry.as_ref().map(|entry| &entry.result)
    }

    pub fn last_report(&self) -> Option<&str> {
        self.entry.as_ref().map(|entry| entry.text.as_str())
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    pub fn is_empty(&self) -> bool {
        self.entry.is_none()
    }
}
