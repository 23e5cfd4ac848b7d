//! Multi-metric quality evaluation of a cleaning run
//!
//! [`QualityEvaluator`] compares a raw recording with its cleaned counterpart and
//! combines six weighted sub-scores into one overall score in `[0, 100]`.
//! Degenerate input never fails here; it is logged and scored through the
//! epsilon-guarded ratios in [`metrics`].

pub mod metrics;
pub mod report;

pub use metrics::{
    ArtefactMetrics, BandpassEffectiveness, DataInfo, FilterEffectiveness, FrequencyDomainMetrics, HealthIssue,
    HealthStatus, HealthWarning, NotchEffectiveness, PerformanceMetrics, PipelineHealth, Rating,
    SignalQualityMetrics, StatisticalValidation,
};
pub use report::{render_report, ReportCache};

use crate::config::constants::evaluation as weights;
use crate::config::{EvaluationConfig, FilterConfig};
use crate::error::{EegErrorBuilder, EegResult};
use crate::processing::pipeline::StepTimings;
use crate::signal::Signal;
use crate::utils::stats;
use serde::Serialize;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResult {
    pub data_info: DataInfo,
    /// Present only when step timings were supplied
    pub performance_metrics: Option<PerformanceMetrics>,
    pub signal_quality_metrics: SignalQualityMetrics,
    pub filter_effectiveness: FilterEffectiveness,
    pub frequency_domain_metrics: FrequencyDomainMetrics,
    pub statistical_validation: StatisticalValidation,
    pub artefact_metrics: ArtefactMetrics,
    pub pipeline_health: PipelineHealth,
    pub overall_score: f64,
}

impl EvaluationResult {
    /// Weighted sum of the six sub-scores, clamped to `[0, 100]`
    pub fn weighted_score(&self) -> f64 {
        metrics::bounded_percent(
            metrics::bounded_percent(self.signal_quality_metrics.quality_score) * weights::WEIGHT_SIGNAL_QUALITY
                + metrics::bounded_percent(self.filter_effectiveness.overall_filter_score)
                    * weights::WEIGHT_FILTER_EFFECTIVENESS
                + metrics::bounded_percent(self.frequency_domain_metrics.frequency_stability_score)
                    * weights::WEIGHT_FREQUENCY_STABILITY
                + metrics::bounded_percent(self.artefact_metrics.artefact_removal_score)
                    * weights::WEIGHT_ARTIFACT_REMOVAL
                + metrics::bounded_percent(self.statistical_validation.statistical_integrity_score)
                    * weights::WEIGHT_STATISTICAL_INTEGRITY
                + metrics::bounded_percent(self.pipeline_health.health_score) * weights::WEIGHT_PIPELINE_HEALTH,
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QualityEvaluator {
    filter: FilterConfig,
    config: EvaluationConfig,
}

impl QualityEvaluator {
    /// `filter` supplies the pass band and line frequency the cleaning run targeted
    pub fn new(filter: FilterConfig, config: EvaluationConfig) -> EegResult<Self> {
        config.validate()?;
        Ok(Self { filter, config })
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    pub fn filter_config(&self) -> &FilterConfig {
        &self.filter
    }

    /// Evaluate a recording pair. Multichannel signals are concatenated channel by channel.
    pub fn evaluate(
        &self,
        raw: &Signal,
        cleaned: &Signal,
        timings: Option<&StepTimings>,
    ) -> EegResult<EvaluationResult> {
        let builder = || EegErrorBuilder::new("quality_evaluator", "evaluate");
        if raw.sampling_rate() != cleaned.sampling_rate() {
            return Err(builder().invalid_data(
                "signal pair",
                format!("sampling rates differ: {} vs {}", raw.sampling_rate(), cleaned.sampling_rate()),
            ));
        }
        if raw.channel_count() != cleaned.channel_count() {
            return Err(builder().invalid_data(
                "signal pair",
                format!("channel counts differ: {} vs {}", raw.channel_count(), cleaned.channel_count()),
            ));
        }
        self.evaluate_samples(&raw.flatten(), &cleaned.flatten(), raw.sampling_rate(), timings)
    }

    pub fn evaluate_samples(
        &self,
        raw: &[f64],
        cleaned: &[f64],
        sampling_rate: f64,
        timings: Option<&StepTimings>,
    ) -> EegResult<EvaluationResult> {
        let builder = || EegErrorBuilder::new("quality_evaluator", "evaluate_samples");
        if raw.len() != cleaned.len() {
            return Err(builder().invalid_data(
                "signal pair",
                format!("raw has {} samples, cleaned has {}", raw.len(), cleaned.len()),
            ));
        }
        if raw.is_empty() {
            return Err(builder().invalid_data("signal pair", "no samples to evaluate"));
        }
        if !(sampling_rate > 0.0) || !sampling_rate.is_finite() {
            return Err(builder().invalid_data("sampling rate", format!("must be positive, got {}", sampling_rate)));
        }

        if stats::variance(raw) == 0.0 {
            warn!(samples = raw.len(), "raw signal has no variance, evaluation ratios fall back to zero");
        }

        let mut result = EvaluationResult {
            data_info: metrics::data_info(raw, cleaned, sampling_rate),
            performance_metrics: timings.map(|t| metrics::performance(t, raw.len(), &self.config)),
            signal_quality_metrics: metrics::signal_quality(raw, cleaned),
            filter_effectiveness: metrics::filter_effectiveness(raw, cleaned, sampling_rate, &self.filter, &self.config),
            frequency_domain_metrics: metrics::frequency_domain(raw, cleaned, sampling_rate),
            statistical_validation: metrics::statistical_validation(raw, cleaned),
            artefact_metrics: metrics::artefact_removal(raw, cleaned),
            pipeline_health: metrics::pipeline_health(raw, cleaned),
            overall_score: 0.0,
        };
        result.overall_score = result.weighted_score();

        if !result.pipeline_health.issues.is_empty() {
            warn!(issues = result.pipeline_health.issues.len(), "cleaned signal failed health checks");
        }
        debug!(
            overall = result.overall_score,
            status = %result.pipeline_health.status,
            "evaluation complete"
        );
        Ok(result)
    }
}
