//! Comparison of a raw and a cleaned recording in the frequency domain

use crate::analysis::patterns::{Indicator, PatternClassifier, PatternTag};
use crate::analysis::spectral::{self, Band, BandPowerMap};
use crate::config::constants::{analysis, numeric};
use crate::config::AnalysisConfig;
use crate::error::{EegErrorBuilder, EegResult};
use crate::processing::artifacts::count_amplitude_events;
use crate::signal::Signal;
use crate::utils::stats;
use serde::Serialize;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    /// dB, within `[0, 20]`
    pub snr_improvement: f64,
    /// Percent, within `[0, 100]`
    pub noise_reduction: f64,
    pub band_powers: BandPowerMap,
    #[serde(serialize_with = "spectral::serialize_band_or_unknown")]
    pub dominant_band: Option<Band>,
    pub artefacts_detected: usize,
    pub patterns: Vec<PatternTag>,
    pub indicators: Vec<Indicator>,
}

impl AnalysisResult {
    pub fn dominant_band_name(&self) -> &'static str {
        self.dominant_band.map_or("unknown", Band::name)
    }
}

pub struct SpectralAnalyzer {
    config: AnalysisConfig,
    classifier: PatternClassifier,
}

impl SpectralAnalyzer {
    pub fn new(config: AnalysisConfig) -> EegResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            classifier: PatternClassifier::new(),
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze a recording pair. Multichannel signals are concatenated channel by channel.
    pub fn analyze(&self, raw: &Signal, cleaned: &Signal) -> EegResult<AnalysisResult> {
        if raw.sample_count() != cleaned.sample_count() || raw.channel_count() != cleaned.channel_count() {
            return Err(EegErrorBuilder::new("spectral_analyzer", "analyze").invalid_data(
                "signal pair",
                format!(
                    "raw is {}x{}, cleaned is {}x{}",
                    raw.sample_count(),
                    raw.channel_count(),
                    cleaned.sample_count(),
                    cleaned.channel_count()
                ),
            ));
        }
        Ok(self.analyze_samples(&raw.flatten(), &cleaned.flatten(), cleaned.sampling_rate()))
    }

    pub fn analyze_samples(&self, raw: &[f64], cleaned: &[f64], sampling_rate: f64) -> AnalysisResult {
        if stats::variance(cleaned) == 0.0 {
            warn!(samples = cleaned.len(), "cleaned signal has no variance, spectral metrics are degenerate");
        }

        let band_powers = self.band_powers(cleaned, sampling_rate);
        let dominant_band = band_powers.dominant();
        let (patterns, indicators) = self.classifier.classify(&band_powers, dominant_band);

        let gap = (self.config.event_gap_seconds * sampling_rate) as usize;
        let artefacts_detected = count_amplitude_events(cleaned, self.config.artifact_std_factor, gap);

        let result = AnalysisResult {
            snr_improvement: snr_improvement(raw, cleaned),
            noise_reduction: noise_reduction(raw, cleaned),
            band_powers,
            dominant_band,
            artefacts_detected,
            patterns,
            indicators,
        };
        debug!(
            dominant = result.dominant_band_name(),
            snr_db = result.snr_improvement,
            artefacts = result.artefacts_detected,
            "spectral analysis complete"
        );
        result
    }

    /// Band-power percentages from a Welch estimate
    pub fn band_powers(&self, samples: &[f64], sampling_rate: f64) -> BandPowerMap {
        let segment = self.config.segment_length.min(samples.len());
        BandPowerMap::from_psd(&spectral::welch(samples, sampling_rate, segment))
    }
}

/// Variance-ratio SNR gain in dB, clamped to `[0, 20]`; 0 for a silent raw signal
pub fn snr_improvement(raw: &[f64], cleaned: &[f64]) -> f64 {
    let raw_var = stats::variance(raw);
    if !(raw_var > 0.0) {
        return 0.0;
    }
    let clean_var = stats::variance(cleaned);
    let ratio = clean_var / (raw_var - clean_var + numeric::EPSILON);
    if !(ratio > 0.0) {
        return analysis::SNR_MIN_DB;
    }
    (10.0 * ratio.log10()).clamp(analysis::SNR_MIN_DB, analysis::SNR_MAX_DB)
}

/// Percentage of raw variance removed, clamped to `[0, 100]`
pub fn noise_reduction(raw: &[f64], cleaned: &[f64]) -> f64 {
    let raw_var = stats::variance(raw);
    if !(raw_var > 0.0) {
        return 0.0;
    }
    ((raw_var - stats::variance(cleaned)) / raw_var * 100.0).clamp(0.0, 100.0)
}

/// Plain-language paragraph describing an analysis result
pub fn summarize(result: &AnalysisResult) -> String {
    let mut sentences = vec![format!(
        "Signal quality improved by {:.1} dB with {:.1}% noise reduction.",
        result.snr_improvement, result.noise_reduction
    )];

    if let Some(band) = result.dominant_band {
        sentences.push(format!(
            "Dominant frequency band: {} ({:.1}% of total power).",
            band,
            result.band_powers.get(band)
        ));
        let state = match band {
            Band::Alpha => Some("This suggests a relaxed, wakeful state with good attentional capacity."),
            Band::Beta => Some("This indicates active cognitive processing or focused attention."),
            Band::Theta => Some("This may reflect drowsiness, meditation, or memory processing."),
            Band::Delta => Some(
                "Elevated slow-wave activity detected - typical in deep sleep but unusual in waking states.",
            ),
            Band::Gamma => None,
        };
        sentences.extend(state.map(str::to_string));
    }

    if result.indicators.is_empty() {
        sentences.push("No specific indicators identified.".to_string());
    } else {
        sentences.extend(result.indicators.iter().take(2).map(|i| format!("{}.", i.description)));
    }

    sentences.push(match result.artefacts_detected {
        0 => "No significant artefacts detected in the cleaned signal.".to_string(),
        n => format!("{} residual artefact event(s) detected and may require manual review.", n),
    });

    sentences.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::patterns::IndicatorKind;
    use crate::simulation::{Rhythm, SyntheticEeg, SyntheticEegConfig};

    fn analyzer() -> SpectralAnalyzer {
        SpectralAnalyzer::new(AnalysisConfig::default()).unwrap()
    }

    #[test]
    fn test_snr_bounds() {
        let raw = [1.0, -1.0, 1.0, -1.0];
        assert_eq!(snr_improvement(&raw, &raw), 20.0);
        assert_eq!(snr_improvement(&[0.0; 4], &raw), 0.0);
        assert_eq!(snr_improvement(&raw, &[0.0; 4]), 0.0);
        // Cleaned louder than raw drives the ratio negative
        assert_eq!(snr_improvement(&raw, &[2.0, -2.0, 2.0, -2.0]), 0.0);
    }

    #[test]
    fn test_noise_reduction() {
        let raw = [2.0, -2.0, 2.0, -2.0];
        let cleaned = [1.0, -1.0, 1.0, -1.0];
        assert!((noise_reduction(&raw, &cleaned) - 75.0).abs() < 1e-12);
        assert_eq!(noise_reduction(&cleaned, &raw), 0.0);
        assert_eq!(noise_reduction(&[0.0; 4], &raw), 0.0);
    }

    #[test]
    fn test_alpha_recording() {
        let signal = SyntheticEeg::new(SyntheticEegConfig {
            noise_std: 0.1,
            ..SyntheticEegConfig::default()
        })
        .generate()
        .unwrap();
        let result = analyzer().analyze(&signal, &signal).unwrap();

        assert_eq!(result.dominant_band, Some(Band::Alpha));
        assert!(result.band_powers.alpha > 40.0);
        assert!(result.patterns.contains(&PatternTag::StrongAlphaRhythm));
        assert_eq!(result.indicators[0].kind, IndicatorKind::Normal);
        assert_eq!(result.noise_reduction, 0.0);
    }

    #[test]
    fn test_all_zero_recording() {
        let zeros = Signal::from_samples(vec![0.0; 2560], 256.0).unwrap();
        let result = analyzer().analyze(&zeros, &zeros).unwrap();

        assert_eq!(result.snr_improvement, 0.0);
        assert_eq!(result.noise_reduction, 0.0);
        assert_eq!(result.dominant_band, None);
        assert_eq!(result.artefacts_detected, 0);
        assert!(result.patterns.is_empty());

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["dominant_band"], "unknown");
        assert_eq!(json["band_powers"]["alpha"], 0.0);
    }

    #[test]
    fn test_mismatched_pair_is_rejected() {
        let a = Signal::from_samples(vec![0.0; 100], 100.0).unwrap();
        let b = Signal::from_samples(vec![0.0; 50], 100.0).unwrap();
        assert!(analyzer().analyze(&a, &b).is_err());
    }

    #[test]
    fn test_residual_events_counted() {
        let mut cleaned = SyntheticEeg::new(SyntheticEegConfig {
            rhythms: vec![Rhythm { freq_hz: 10.0, amplitude: 1.0 }],
            ..SyntheticEegConfig::default()
        })
        .generate()
        .unwrap()
        .flatten();
        cleaned[300] = 40.0;
        cleaned[2000] = -40.0;
        let result = analyzer().analyze_samples(&cleaned, &cleaned, 256.0);
        assert_eq!(result.artefacts_detected, 2);
    }

    #[test]
    fn test_summary_text() {
        let result = AnalysisResult {
            snr_improvement: 4.26,
            noise_reduction: 62.04,
            band_powers: BandPowerMap {
                delta: 10.0,
                theta: 10.0,
                alpha: 55.0,
                beta: 20.0,
                gamma: 5.0,
            },
            dominant_band: Some(Band::Alpha),
            artefacts_detected: 0,
            patterns: vec![PatternTag::StrongAlphaRhythm],
            indicators: vec![Indicator {
                kind: IndicatorKind::Normal,
                description: "Healthy resting state with strong alpha rhythm".into(),
            }],
        };
        assert_eq!(
            summarize(&result),
            "Signal quality improved by 4.3 dB with 62.0% noise reduction. \
             Dominant frequency band: alpha (55.0% of total power). \
             This suggests a relaxed, wakeful state with good attentional capacity. \
             Healthy resting state with strong alpha rhythm. \
             No significant artefacts detected in the cleaned signal."
        );
    }

    #[test]
    fn test_summary_of_silent_recording() {
        let zeros = vec![0.0; 512];
        let mut result = analyzer().analyze_samples(&zeros, &zeros, 256.0);
        result.indicators.clear();
        result.artefacts_detected = 3;
        assert_eq!(
            summarize(&result),
            "Signal quality improved by 0.0 dB with 0.0% noise reduction. \
             No specific indicators identified. \
             3 residual artefact event(s) detected and may require manual review."
        );
    }
}
