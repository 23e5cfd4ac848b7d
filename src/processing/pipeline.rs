//! Cleaning pipeline orchestration
//!
//! A [`CleaningPipeline`] holds only immutable, validated settings; every run
//! threads its intermediate arrays through local values. One pipeline can be
//! shared across threads, and [`CleaningPipeline::run_batch`] fans independent
//! recordings out over the rayon pool.

use crate::config::PipelineConfig;
use crate::error::EegResult;
use crate::processing::artifacts::{AmplitudeGate, ArtifactWindow};
use crate::processing::filter_stage::FilterStage;
use crate::processing::separation::ArtifactSeparator;
use crate::signal::Signal;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{info, warn};

/// Wall-clock seconds per executed step, keyed by step name
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StepTimings(BTreeMap<String, f64>);

impl StepTimings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, step: impl Into<String>, seconds: f64) {
        self.0.insert(step.into(), seconds);
    }

    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    pub fn steps(&self) -> &BTreeMap<String, f64> {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, f64)> for StepTimings {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Output of one pipeline run
#[derive(Debug, Clone)]
pub struct CleaningOutput {
    pub cleaned: Signal,
    pub timings: StepTimings,
    /// Windows zeroed by the blink gate, empty when the gate is disabled
    pub gated_windows: Vec<ArtifactWindow>,
    /// Filter steps that could not run on this recording and passed it through
    pub skipped_steps: Vec<String>,
}

/// Gate, bandpass, notch, separation
#[derive(Debug, Clone)]
pub struct CleaningPipeline {
    config: PipelineConfig,
    sampling_rate: f64,
    gate: Option<AmplitudeGate>,
    filters: FilterStage,
    separator: ArtifactSeparator,
}

impl CleaningPipeline {
    /// Validate the whole configuration for `sampling_rate` and build every stage
    pub fn new(config: PipelineConfig, sampling_rate: f64) -> EegResult<Self> {
        config.validate(sampling_rate)?;
        let gate = if config.gate.enabled {
            Some(AmplitudeGate::new(&config.gate)?)
        } else {
            None
        };
        Ok(Self {
            filters: FilterStage::new(&config.filter, sampling_rate)?,
            separator: ArtifactSeparator::new(config.separation.clone())?,
            gate,
            sampling_rate,
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    pub fn filter_stage(&self) -> &FilterStage {
        &self.filters
    }

    pub fn separator(&self) -> &ArtifactSeparator {
        &self.separator
    }

    /// Clean one recording
    pub fn run(&self, raw: &Signal) -> EegResult<CleaningOutput> {
        let started = Instant::now();
        let mut timings = StepTimings::new();
        let mut gated_windows = Vec::new();

        let mut current = match &self.gate {
            Some(gate) => {
                let step = Instant::now();
                let (gated, windows) = gate.apply(raw);
                timings.record("gate", step.elapsed().as_secs_f64());
                gated_windows = windows;
                gated
            }
            None => raw.clone(),
        };

        let mut skipped_steps = Vec::new();

        let step = Instant::now();
        let result = self.filters.clean_band(&current);
        current = passthrough_on_recoverable("bandpass", result, current, &mut skipped_steps)?;
        timings.record("bandpass", step.elapsed().as_secs_f64());

        let step = Instant::now();
        let result = self.filters.clean_notch(&current);
        current = passthrough_on_recoverable("notch", result, current, &mut skipped_steps)?;
        timings.record("notch", step.elapsed().as_secs_f64());

        let step = Instant::now();
        current = self.separator.separate(&current)?;
        timings.record("separation", step.elapsed().as_secs_f64());

        info!(
            samples = raw.sample_count(),
            channels = raw.channel_count(),
            gated = gated_windows.len(),
            skipped = skipped_steps.len(),
            elapsed_s = started.elapsed().as_secs_f64(),
            "cleaning pipeline finished"
        );

        Ok(CleaningOutput {
            cleaned: current,
            timings,
            gated_windows,
            skipped_steps,
        })
    }

    /// Clean independent recordings in parallel, one result per input in order
    pub fn run_batch(&self, recordings: &[Signal]) -> Vec<EegResult<CleaningOutput>> {
        recordings.par_iter().map(|raw| self.run(raw)).collect()
    }
}

/// Keep `input` when a step fails recoverably, e.g. on a recording shorter than the filter
fn passthrough_on_recoverable(
    step: &str,
    result: EegResult<Signal>,
    input: Signal,
    skipped: &mut Vec<String>,
) -> EegResult<Signal> {
    match result {
        Ok(output) => Ok(output),
        Err(e) if e.is_recoverable() => {
            warn!(step, error = %e, "step skipped, passing input through");
            skipped.push(step.to_string());
            Ok(input)
        }
        Err(e) => Err(e),
    }
}
