// src/config/mod.rs
//! Pipeline configuration
//!
//! Every section deserializes from a partial TOML table: missing keys fall back to
//! the defaults in [`constants`]. [`PipelineConfig::validate`] checks the settings
//! against a concrete sampling rate and must pass before any stage runs.

pub mod constants;
pub mod loader;

pub use constants::*;
pub use loader::{ConfigError, ConfigLoader};

use crate::error::{EegErrorBuilder, EegResult};
use serde::{Deserialize, Serialize};

/// Complete pipeline configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub separation: SeparationConfig,
    #[serde(default)]
    pub gate: GateConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub evaluation: EvaluationConfig,
}

/// Bandpass and notch settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default = "defaults::bandpass_low_hz")]
    pub bandpass_low_hz: f64,

    #[serde(default = "defaults::bandpass_high_hz")]
    pub bandpass_high_hz: f64,

    #[serde(default = "defaults::filter_order")]
    pub filter_order: usize,

    #[serde(default = "defaults::notch_freq_hz")]
    pub notch_freq_hz: f64,

    #[serde(default = "defaults::notch_quality")]
    pub notch_quality: f64,
}

/// Component separation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeparationConfig {
    /// Upper bound on extracted components; `None` uses every channel
    #[serde(default)]
    pub max_components: Option<usize>,

    /// Components with peak-to-peak above `factor × median` are rejected
    #[serde(default = "defaults::rejection_factor")]
    pub rejection_factor: f64,

    #[serde(default = "defaults::max_iterations")]
    pub max_iterations: usize,

    #[serde(default = "defaults::tolerance")]
    pub tolerance: f64,

    /// Seed for the FastICA starting unmixing matrix
    #[serde(default = "defaults::seed")]
    pub seed: u64,
}

/// Blink gate settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "defaults::blink_threshold")]
    pub threshold: f64,
}

/// Spectral analysis settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "defaults::segment_length")]
    pub segment_length: usize,

    #[serde(default = "defaults::artifact_std_factor")]
    pub artifact_std_factor: f64,

    #[serde(default = "defaults::event_gap_seconds")]
    pub event_gap_seconds: f64,
}

/// Quality evaluation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    #[serde(default = "defaults::notch_halfwidth_hz")]
    pub notch_halfwidth_hz: f64,

    /// Throughput in samples per second that earns a full efficiency score
    #[serde(default = "defaults::reference_throughput")]
    pub reference_throughput: f64,
}

/// Default value providers using constants
mod defaults {
    use crate::config::constants::*;

    pub fn bandpass_low_hz() -> f64 { filters::DEFAULT_BANDPASS_LOW_HZ }
    pub fn bandpass_high_hz() -> f64 { filters::DEFAULT_BANDPASS_HIGH_HZ }
    pub fn filter_order() -> usize { filters::DEFAULT_FILTER_ORDER }
    pub fn notch_freq_hz() -> f64 { filters::DEFAULT_NOTCH_FREQ_HZ }
    pub fn notch_quality() -> f64 { filters::DEFAULT_NOTCH_QUALITY }

    pub fn rejection_factor() -> f64 { separation::DEFAULT_REJECTION_FACTOR }
    pub fn max_iterations() -> usize { separation::DEFAULT_MAX_ITERATIONS }
    pub fn tolerance() -> f64 { separation::DEFAULT_TOLERANCE }
    pub fn seed() -> u64 { separation::DEFAULT_SEED }

    pub fn blink_threshold() -> f64 { gate::DEFAULT_BLINK_THRESHOLD }

    pub fn segment_length() -> usize { analysis::DEFAULT_SEGMENT_LENGTH }
    pub fn artifact_std_factor() -> f64 { analysis::DEFAULT_ARTIFACT_STD_FACTOR }
    pub fn event_gap_seconds() -> f64 { analysis::DEFAULT_EVENT_GAP_SECONDS }

    pub fn notch_halfwidth_hz() -> f64 { evaluation::DEFAULT_NOTCH_HALFWIDTH_HZ }
    pub fn reference_throughput() -> f64 { evaluation::DEFAULT_REFERENCE_THROUGHPUT }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            bandpass_low_hz: defaults::bandpass_low_hz(),
            bandpass_high_hz: defaults::bandpass_high_hz(),
            filter_order: defaults::filter_order(),
            notch_freq_hz: defaults::notch_freq_hz(),
            notch_quality: defaults::notch_quality(),
        }
    }
}

impl Default for SeparationConfig {
    fn default() -> Self {
        Self {
            max_components: None,
            rejection_factor: defaults::rejection_factor(),
            max_iterations: defaults::max_iterations(),
            tolerance: defaults::tolerance(),
            seed: defaults::seed(),
        }
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            threshold: defaults::blink_threshold(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            segment_length: defaults::segment_length(),
            artifact_std_factor: defaults::artifact_std_factor(),
            event_gap_seconds: defaults::event_gap_seconds(),
        }
    }
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            notch_halfwidth_hz: defaults::notch_halfwidth_hz(),
            reference_throughput: defaults::reference_throughput(),
        }
    }
}

fn reject(component: &str, reason: String) -> crate::error::EegError {
    EegErrorBuilder::new(component, "validate").configuration(reason)
}

/// Checks the sampling rate itself: finite and positive
pub fn validate_sampling_rate(sampling_rate: f64) -> EegResult<()> {
    if !sampling_rate.is_finite() || sampling_rate <= 0.0 {
        return Err(reject("signal", format!("sampling rate must be positive, got {}", sampling_rate)));
    }
    Ok(())
}

impl FilterConfig {
    /// Checks `0 < low < high < fs/2`, `0 < notch < fs/2`, a positive quality
    /// factor and a supported order
    pub fn validate(&self, sampling_rate: f64) -> EegResult<()> {
        validate_sampling_rate(sampling_rate)?;
        validate_band(self.bandpass_low_hz, self.bandpass_high_hz, sampling_rate)?;
        validate_notch(self.notch_freq_hz, self.notch_quality, sampling_rate)?;
        validate_order(self.filter_order)
    }
}

pub(crate) fn validate_band(low: f64, high: f64, sampling_rate: f64) -> EegResult<()> {
    validate_sampling_rate(sampling_rate)?;
    let nyquist = sampling_rate / 2.0;
    if !(low.is_finite() && high.is_finite()) || low <= 0.0 || low >= high || high >= nyquist {
        return Err(reject(
            "filter_stage",
            format!(
                "bandpass requires 0 < low < high < {} Hz (Nyquist), got low={} high={}",
                nyquist, low, high
            ),
        ));
    }
    Ok(())
}

pub(crate) fn validate_notch(freq: f64, quality: f64, sampling_rate: f64) -> EegResult<()> {
    validate_sampling_rate(sampling_rate)?;
    let nyquist = sampling_rate / 2.0;
    if !freq.is_finite() || freq <= 0.0 || freq >= nyquist {
        return Err(reject(
            "filter_stage",
            format!("notch requires 0 < f < {} Hz (Nyquist), got {}", nyquist, freq),
        ));
    }
    if !quality.is_finite() || quality <= 0.0 {
        return Err(reject("filter_stage", format!("notch quality must be positive, got {}", quality)));
    }
    Ok(())
}

pub(crate) fn validate_order(order: usize) -> EegResult<()> {
    if !(filters::MIN_FILTER_ORDER..=filters::MAX_FILTER_ORDER).contains(&order) {
        return Err(reject(
            "filter_stage",
            format!(
                "filter order must be {}-{}, got {}",
                filters::MIN_FILTER_ORDER,
                filters::MAX_FILTER_ORDER,
                order
            ),
        ));
    }
    Ok(())
}

impl SeparationConfig {
    pub fn validate(&self) -> EegResult<()> {
        if let Some(n) = self.max_components {
            if n < separation::MIN_COMPONENTS {
                return Err(reject(
                    "artifact_separator",
                    format!("max_components must be at least {}, got {}", separation::MIN_COMPONENTS, n),
                ));
            }
        }
        if !self.rejection_factor.is_finite() || self.rejection_factor <= 0.0 {
            return Err(reject(
                "artifact_separator",
                format!("rejection_factor must be positive, got {}", self.rejection_factor),
            ));
        }
        if self.max_iterations == 0 || !(self.tolerance > 0.0) {
            return Err(reject(
                "artifact_separator",
                "max_iterations and tolerance must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl GateConfig {
    pub fn validate(&self) -> EegResult<()> {
        if !self.threshold.is_finite() || self.threshold <= 0.0 {
            return Err(reject("amplitude_gate", format!("threshold must be positive, got {}", self.threshold)));
        }
        Ok(())
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> EegResult<()> {
        if self.segment_length == 0 {
            return Err(reject("spectral_analyzer", "segment_length must be non-zero".to_string()));
        }
        if !(self.artifact_std_factor > 0.0) || !(self.event_gap_seconds >= 0.0) {
            return Err(reject(
                "spectral_analyzer",
                "artifact_std_factor must be positive and event_gap_seconds non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

impl EvaluationConfig {
    pub fn validate(&self) -> EegResult<()> {
        if !(self.notch_halfwidth_hz > 0.0) || !(self.reference_throughput > 0.0) {
            return Err(reject(
                "quality_evaluator",
                "notch_halfwidth_hz and reference_throughput must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl PipelineConfig {
    /// Validate every section against the recording's sampling rate
    pub fn validate(&self, sampling_rate: f64) -> EegResult<()> {
        self.filter.validate(sampling_rate)?;
        self.validate_rate_independent()
    }

    /// Validate the sections that do not depend on a sampling rate
    pub fn validate_rate_independent(&self) -> EegResult<()> {
        self.separation.validate()?;
        self.gate.validate()?;
        self.analysis.validate()?;
        self.evaluation.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.filter.bandpass_low_hz, 1.0);
        assert_eq!(config.filter.bandpass_high_hz, 40.0);
        assert_eq!(config.filter.filter_order, 5);
        assert_eq!(config.filter.notch_freq_hz, 50.0);
        assert_eq!(config.filter.notch_quality, 30.0);
        assert!(!config.gate.enabled);
        assert!(config.validate(256.0).is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: PipelineConfig = toml::from_str(
            r#"
[filter]
notch_freq_hz = 60.0

[separation]
max_components = 4
"#,
        )
        .unwrap();
        assert_eq!(config.filter.notch_freq_hz, 60.0);
        assert_eq!(config.filter.bandpass_high_hz, 40.0);
        assert_eq!(config.separation.max_components, Some(4));
        assert_eq!(config.analysis.segment_length, 256);
    }

    #[test]
    fn test_high_cutoff_above_nyquist_rejected() {
        let config = FilterConfig {
            bandpass_high_hz: 60.0,
            ..FilterConfig::default()
        };
        let err = config.validate(100.0).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("Nyquist"));
    }

    #[test]
    fn test_inverted_band_rejected() {
        assert!(validate_band(10.0, 5.0, 256.0).is_err());
        assert!(validate_band(0.0, 5.0, 256.0).is_err());
        assert!(validate_band(1.0, 40.0, 256.0).is_ok());
    }

    #[test]
    fn test_notch_validation() {
        assert!(validate_notch(50.0, 30.0, 256.0).is_ok());
        assert!(validate_notch(50.0, 30.0, 100.0).is_err());
        assert!(validate_notch(50.0, 0.0, 256.0).is_err());
    }

    #[test]
    fn test_sampling_rate_must_be_positive() {
        assert!(validate_sampling_rate(0.0).is_err());
        assert!(validate_sampling_rate(f64::NAN).is_err());
        assert!(FilterConfig::default().validate(-1.0).is_err());
    }

    #[test]
    fn test_separation_validation() {
        let mut config = SeparationConfig::default();
        assert!(config.validate().is_ok());
        config.max_components = Some(1);
        assert!(config.validate().is_err());
        config.max_components = Some(2);
        config.rejection_factor = 0.0;
        assert!(config.validate().is_err());
    }
}
