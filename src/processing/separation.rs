//! Independent-component artifact separation
//!
//! The multichannel recording is decomposed with FastICA. Each component's
//! contribution to the channels is its source series times its mixing column, so
//! amplitude statistics are measured on `s_i · ‖a_i‖`, which is free of the
//! scale ambiguity of ICA sources.
//!
//! A component is rejected when its peak-to-peak amplitude exceeds
//! `rejection_factor × median(peak_to_peak)`, the median being the lower median
//! for an even component count. Cleaning subtracts the rejected components'
//! contributions from the recording, so anything outside the component subspace
//! is kept.

use crate::config::{constants::separation, SeparationConfig};
use crate::error::{EegErrorBuilder, EegResult, PipelineStage};
use crate::signal::{Layout, Signal};
use crate::utils::stats;
use linfa::prelude::*;
use linfa_ica::fast_ica::FastIca;
use ndarray::{Array1, Array2, Axis};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Amplitude statistics and verdict for one component
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentReport {
    pub id: usize,
    pub peak_to_peak: f64,
    pub mean_abs: f64,
    pub std: f64,
    pub max_abs: f64,
    pub removed: bool,
    pub reason: String,
}

/// Half-open sample range `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SampleRange {
    pub start: usize,
    pub end: usize,
}

/// Side-channel report of a decomposition, without reconstruction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentDiagnostics {
    pub components: Vec<ComponentReport>,
    pub median_peak_to_peak: f64,
    pub threshold: f64,
    pub removed_count: usize,
    pub sample_range: Option<SampleRange>,
}

struct Decomposition {
    /// `samples × components`
    sources: Array2<f64>,
    /// `channels × components`
    mixing: Array2<f64>,
}

struct Classification {
    reports: Vec<ComponentReport>,
    median_peak_to_peak: f64,
    threshold: f64,
}

/// FastICA-based remover of high-amplitude components
#[derive(Debug, Clone)]
pub struct ArtifactSeparator {
    config: SeparationConfig,
}

impl ArtifactSeparator {
    pub fn new(config: SeparationConfig) -> EegResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SeparationConfig {
        &self.config
    }

    /// Remove outlier components.
    ///
    /// Single-channel input, too few channels, and numerical failure of the
    /// decomposition all return the input unchanged. Configuration errors, such
    /// as asking for more components than channels, are returned.
    pub fn separate(&self, signal: &Signal) -> EegResult<Signal> {
        if signal.layout() == Layout::Single || signal.channel_count() < separation::MIN_COMPONENTS {
            debug!(channels = signal.channel_count(), "separation skipped for single-channel input");
            return Ok(signal.clone());
        }
        match self.try_separate(signal) {
            Ok(cleaned) => Ok(cleaned),
            Err(e) if e.is_recoverable() => {
                warn!(error = %e, "separation failed, returning input unchanged");
                Ok(signal.clone())
            }
            Err(e) => Err(e),
        }
    }

    /// Remove outlier components, surfacing every failure
    pub fn try_separate(&self, signal: &Signal) -> EegResult<Signal> {
        let n_components = self.component_count(signal)?;
        let decomposition = self.decompose(signal.data(), n_components)?;
        let classification = self.classify(&decomposition);

        let removed: Vec<usize> = classification
            .reports
            .iter()
            .filter(|r| r.removed)
            .map(|r| r.id)
            .collect();
        info!(
            components = n_components,
            removed = removed.len(),
            threshold = classification.threshold,
            "component separation complete"
        );
        if removed.is_empty() {
            return Ok(signal.clone());
        }

        let sources = decomposition.sources.select(Axis(1), &removed);
        let mixing = decomposition.mixing.select(Axis(1), &removed);
        let artifact = sources.dot(&mixing.t());
        Ok(signal.with_data(signal.data() - &artifact))
    }

    /// Decompose and classify without reconstructing.
    ///
    /// When a window is given, the matching sample range (clamped to the
    /// recording) is included for audit.
    pub fn diagnose(
        &self,
        signal: &Signal,
        start_s: Option<f64>,
        end_s: Option<f64>,
    ) -> EegResult<ComponentDiagnostics> {
        let sample_range = window_to_range(signal, start_s, end_s)?;
        let n_components = self.component_count(signal)?;
        let decomposition = self.decompose(signal.data(), n_components)?;
        let classification = self.classify(&decomposition);
        let removed_count = classification.reports.iter().filter(|r| r.removed).count();

        Ok(ComponentDiagnostics {
            components: classification.reports,
            median_peak_to_peak: classification.median_peak_to_peak,
            threshold: classification.threshold,
            removed_count,
            sample_range,
        })
    }

    fn component_count(&self, signal: &Signal) -> EegResult<usize> {
        let channels = signal.channel_count();
        if signal.layout() == Layout::Single || channels < separation::MIN_COMPONENTS {
            return Err(EegErrorBuilder::new("artifact_separator", "component_count").insufficient_channels(
                PipelineStage::Separation,
                separation::MIN_COMPONENTS,
                channels,
            ));
        }
        let n_components = self.config.max_components.unwrap_or(channels);
        if n_components > channels {
            return Err(EegErrorBuilder::new("artifact_separator", "component_count").configuration(format!(
                "requested {} components from {} channels",
                n_components, channels
            )));
        }
        if signal.sample_count() <= n_components {
            return Err(EegErrorBuilder::new("artifact_separator", "component_count").insufficient_samples(
                PipelineStage::Separation,
                n_components + 1,
                signal.sample_count(),
            ));
        }
        Ok(n_components)
    }

    fn decompose(&self, data: &Array2<f64>, n_components: usize) -> EegResult<Decomposition> {
        let numerical = |reason: String| {
            EegErrorBuilder::new("artifact_separator", "decompose").numerical(PipelineStage::Separation, reason)
        };
        if data.iter().any(|v| !v.is_finite()) {
            return Err(numerical("input contains non-finite samples".to_string()));
        }

        let means: Array1<f64> = data.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(data.ncols()));
        let centered = data - &means;

        let dataset = DatasetBase::from(centered.clone());
        let ica = FastIca::params()
            .ncomponents(n_components)
            .max_iter(self.config.max_iterations)
            .tol(self.config.tolerance)
            .random_state(self.config.seed as usize);
        let model = ica
            .fit(&dataset)
            .map_err(|e| numerical(format!("FastICA failed: {:?}", e)))?;
        let sources: Array2<f64> = model.predict(&centered);
        if sources.iter().any(|v| !v.is_finite()) {
            return Err(numerical("FastICA produced non-finite sources".to_string()));
        }

        // A = Xcᵀ S (SᵀS)⁻¹
        let gram = sources.t().dot(&sources);
        let gram_inv = invert_matrix(&gram).map_err(numerical)?;
        let mixing = centered.t().dot(&sources).dot(&gram_inv);

        debug!(components = n_components, samples = data.nrows(), "decomposition finished");
        Ok(Decomposition { sources, mixing })
    }

    fn classify(&self, decomposition: &Decomposition) -> Classification {
        let mut reports: Vec<ComponentReport> = decomposition
            .sources
            .axis_iter(Axis(1))
            .zip(decomposition.mixing.axis_iter(Axis(1)))
            .enumerate()
            .map(|(id, (source, column))| {
                let scale = column.dot(&column).sqrt();
                let contribution: Vec<f64> = source.iter().map(|v| v * scale).collect();
                ComponentReport {
                    id,
                    peak_to_peak: stats::peak_to_peak(&contribution),
                    mean_abs: stats::mean_abs(&contribution),
                    std: stats::std_dev(&contribution),
                    max_abs: stats::max_abs(&contribution),
                    removed: false,
                    reason: String::new(),
                }
            })
            .collect();

        let ptp: Vec<f64> = reports.iter().map(|r| r.peak_to_peak).collect();
        let median_peak_to_peak = stats::median_low(&ptp);
        let threshold = self.config.rejection_factor * median_peak_to_peak;

        for report in &mut reports {
            report.removed = report.peak_to_peak > threshold;
            report.reason = if report.removed {
                format!(
                    "peak-to-peak {:.2} exceeds {:.1}x median threshold {:.2}",
                    report.peak_to_peak, self.config.rejection_factor, threshold
                )
            } else {
                format!("peak-to-peak {:.2} within threshold {:.2}", report.peak_to_peak, threshold)
            };
            debug!(component = report.id, ptp = report.peak_to_peak, removed = report.removed, "component classified");
        }

        Classification {
            reports,
            median_peak_to_peak,
            threshold,
        }
    }
}

fn window_to_range(signal: &Signal, start_s: Option<f64>, end_s: Option<f64>) -> EegResult<Option<SampleRange>> {
    if start_s.is_none() && end_s.is_none() {
        return Ok(None);
    }
    let n = signal.sample_count();
    let fs = signal.sampling_rate();
    let start_s = start_s.unwrap_or(0.0);
    let end_s = end_s.unwrap_or(n as f64 / fs);
    if !start_s.is_finite() || !end_s.is_finite() || start_s > end_s {
        return Err(EegErrorBuilder::new("artifact_separator", "diagnose").invalid_data(
            "time window",
            format!("invalid window [{}, {}] s", start_s, end_s),
        ));
    }
    let to_index = |t: f64| ((t * fs).floor().max(0.0) as usize).min(n);
    Ok(Some(SampleRange {
        start: to_index(start_s),
        end: to_index(end_s),
    }))
}

/// Invert a square matrix using Gauss-Jordan elimination with partial pivoting
fn invert_matrix(matrix: &Array2<f64>) -> Result<Array2<f64>, String> {
    let n = matrix.nrows();
    if n != matrix.ncols() {
        return Err("matrix must be square".to_string());
    }

    let mut aug = Array2::<f64>::zeros((n, 2 * n));
    for i in 0..n {
        for j in 0..n {
            aug[[i, j]] = matrix[[i, j]];
        }
        aug[[i, n + i]] = 1.0;
    }

    for i in 0..n {
        let max_row = (i..n)
            .max_by(|&a, &b| aug[[a, i]].abs().total_cmp(&aug[[b, i]].abs()))
            .unwrap_or(i);
        if max_row != i {
            for j in 0..2 * n {
                aug.swap([i, j], [max_row, j]);
            }
        }

        let pivot = aug[[i, i]];
        if pivot.abs() < separation::SINGULAR_PIVOT_THRESHOLD {
            return Err("matrix is singular or nearly singular".to_string());
        }
        for j in 0..2 * n {
            aug[[i, j]] /= pivot;
        }
        for k in 0..n {
            if k != i {
                let factor = aug[[k, i]];
                for j in 0..2 * n {
                    aug[[k, j]] -= factor * aug[[i, j]];
                }
            }
        }
    }

    Ok(aug.slice(ndarray::s![.., n..]).to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use std::f64::consts::PI;

    fn two_channel_with_spikes(seed: u64) -> Signal {
        let fs = 256.0;
        let n = 2560;
        let mut rng = StdRng::seed_from_u64(seed);
        let sine: Vec<f64> = (0..n)
            .map(|i| 10.0 * (2.0 * PI * 10.0 * i as f64 / fs).sin() + rng.gen_range(-0.5..0.5))
            .collect();
        let mut spikes: Vec<f64> = (0..n).map(|_| rng.gen_range(-0.5..0.5)).collect();
        for start in [300, 1200, 2000] {
            for v in &mut spikes[start..start + 20] {
                *v += 150.0;
            }
        }
        Signal::from_channels(vec![sine, spikes], fs).unwrap()
    }

    #[test]
    fn test_single_channel_passthrough_is_identical() {
        let signal = Signal::from_samples((0..512).map(|i| (i as f64).sin()).collect(), 256.0).unwrap();
        let separator = ArtifactSeparator::new(SeparationConfig::default()).unwrap();
        let out = separator.separate(&signal).unwrap();
        assert_eq!(out, signal);
    }

    #[test]
    fn test_diagnose_rejects_single_channel() {
        let signal = Signal::from_samples(vec![0.0; 512], 256.0).unwrap();
        let separator = ArtifactSeparator::new(SeparationConfig::default()).unwrap();
        let err = separator.diagnose(&signal, None, None).unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_too_many_components_is_configuration_error() {
        let signal = two_channel_with_spikes(1);
        let separator = ArtifactSeparator::new(SeparationConfig {
            max_components: Some(3),
            ..SeparationConfig::default()
        })
        .unwrap();
        assert!(separator.diagnose(&signal, None, None).unwrap_err().is_configuration());
        assert!(separator.separate(&signal).unwrap_err().is_configuration());
    }

    #[test]
    fn test_diagnose_flags_spike_component() {
        let signal = two_channel_with_spikes(7);
        let separator = ArtifactSeparator::new(SeparationConfig::default()).unwrap();
        let diagnostics = separator.diagnose(&signal, Some(1.0), Some(2.5)).unwrap();

        assert_eq!(diagnostics.components.len(), 2);
        assert_eq!(diagnostics.removed_count, 1);
        let removed = diagnostics.components.iter().find(|c| c.removed).unwrap();
        assert!(removed.peak_to_peak > 3.0 * diagnostics.median_peak_to_peak);
        assert_eq!(diagnostics.sample_range, Some(SampleRange { start: 256, end: 640 }));
    }

    #[test]
    fn test_separate_reduces_spike_amplitude() {
        let signal = two_channel_with_spikes(11);
        let separator = ArtifactSeparator::new(SeparationConfig::default()).unwrap();
        let cleaned = separator.separate(&signal).unwrap();
        assert_eq!(cleaned.data().dim(), signal.data().dim());
        let raw_peak = stats::max_abs(&signal.channels()[1]);
        let cleaned_peak = stats::max_abs(&cleaned.channels()[1]);
        assert!(cleaned_peak < raw_peak / 2.0, "raw {} cleaned {}", raw_peak, cleaned_peak);
    }

    #[test]
    fn test_same_seed_repeats_exactly() {
        let signal = two_channel_with_spikes(5);
        let separator = ArtifactSeparator::new(SeparationConfig::default()).unwrap();

        let first = separator.separate(&signal).unwrap();
        let second = separator.separate(&signal).unwrap();
        assert_eq!(first.data(), second.data());

        let a = separator.diagnose(&signal, None, None).unwrap();
        let b = separator.diagnose(&signal, None, None).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.removed_count, 1);

        let reseeded = ArtifactSeparator::new(SeparationConfig {
            seed: 7,
            ..SeparationConfig::default()
        })
        .unwrap();
        assert_eq!(reseeded.diagnose(&signal, None, None).unwrap().removed_count, 1);
    }

    #[test]
    fn test_invalid_window() {
        let signal = two_channel_with_spikes(3);
        let separator = ArtifactSeparator::new(SeparationConfig::default()).unwrap();
        assert!(separator.diagnose(&signal, Some(5.0), Some(1.0)).is_err());
    }

    #[test]
    fn test_invert_matrix() {
        let m = array![[4.0, 7.0], [2.0, 6.0]];
        let inv = invert_matrix(&m).unwrap();
        let identity = m.dot(&inv);
        for ((i, j), v) in identity.indexed_iter() {
            let expected = if i == j { 1.0 } else { 0.0 };
            assert!((v - expected).abs() < 1e-12);
        }
        assert!(invert_matrix(&array![[1.0, 2.0], [2.0, 4.0]]).is_err());
    }
}
