//! Amplitude-based artifact detection
//!
//! Two detectors share the same thresholding idea. [`count_amplitude_events`]
//! counts residual outlier events after cleaning; [`AmplitudeGate`] finds blink
//! windows above a fixed threshold and zeroes them before filtering.

use crate::config::GateConfig;
use crate::error::EegResult;
use crate::signal::Signal;
use crate::utils::stats;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Time window of a detected artifact, both ends inclusive
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArtifactWindow {
    pub start_s: f64,
    pub end_s: f64,
}

/// Maximal runs of consecutive flagged indices, as inclusive `(start, end)` pairs
pub fn flagged_runs(mask: &[bool]) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut start = None;
    for (i, &flagged) in mask.iter().enumerate() {
        match (flagged, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                runs.push((s, i - 1));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        runs.push((s, mask.len() - 1));
    }
    runs
}

/// Count outlier events in a sample sequence.
///
/// Samples with `|x| > std_factor · std(x)` are flagged; flagged indices more
/// than `gap_samples` apart start a new event. A zero-variance input flags nothing.
pub fn count_amplitude_events(samples: &[f64], std_factor: f64, gap_samples: usize) -> usize {
    let threshold = std_factor * stats::std_dev(samples);
    if !(threshold > 0.0) {
        return 0;
    }
    let flagged: Vec<usize> = samples
        .iter()
        .enumerate()
        .filter(|(_, v)| v.abs() > threshold)
        .map(|(i, _)| i)
        .collect();
    if flagged.is_empty() {
        return 0;
    }
    1 + flagged.windows(2).filter(|w| w[1] - w[0] > gap_samples).count()
}

/// Blink windows where `|x| > threshold` in a single sample sequence
pub fn detect_blink_windows(samples: &[f64], sampling_rate: f64, threshold: f64) -> Vec<ArtifactWindow> {
    let mask: Vec<bool> = samples.iter().map(|v| v.abs() > threshold).collect();
    to_windows(&flagged_runs(&mask), sampling_rate)
}

fn to_windows(runs: &[(usize, usize)], sampling_rate: f64) -> Vec<ArtifactWindow> {
    runs.iter()
        .map(|&(s, e)| ArtifactWindow {
            start_s: s as f64 / sampling_rate,
            end_s: e as f64 / sampling_rate,
        })
        .collect()
}

/// Zeroes every time point where any channel exceeds a fixed amplitude
#[derive(Debug, Clone)]
pub struct AmplitudeGate {
    threshold: f64,
}

impl AmplitudeGate {
    pub fn new(config: &GateConfig) -> EegResult<Self> {
        config.validate()?;
        Ok(Self {
            threshold: config.threshold,
        })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Detected windows across all channels
    pub fn detect(&self, signal: &Signal) -> Vec<ArtifactWindow> {
        to_windows(&flagged_runs(&self.mask(signal)), signal.sampling_rate())
    }

    /// Gated copy of the signal plus the windows that were zeroed
    pub fn apply(&self, signal: &Signal) -> (Signal, Vec<ArtifactWindow>) {
        let runs = flagged_runs(&self.mask(signal));
        let mut data = signal.data().clone();
        for &(start, end) in &runs {
            data.slice_mut(ndarray::s![start..=end, ..]).fill(0.0);
        }
        if !runs.is_empty() {
            debug!(windows = runs.len(), threshold = self.threshold, "zeroed blink windows");
        }
        (signal.with_data(data), to_windows(&runs, signal.sampling_rate()))
    }

    fn mask(&self, signal: &Signal) -> Vec<bool> {
        signal
            .data()
            .rows()
            .into_iter()
            .map(|row| row.iter().any(|v| v.abs() > self.threshold))
            .collect()
    }
}
