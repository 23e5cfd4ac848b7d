//! Band-limiting stage: bandpass followed by line-noise notch
//!
//! Both filters run causally (single forward pass), so the output carries the
//! filters' phase delay. Every channel starts from rest.

use crate::config::{constants::filters, FilterConfig};
use crate::error::{EegErrorBuilder, EegResult, PipelineStage};
use crate::processing::filters::{butterworth_bandpass, iir_notch, Filter, SosFilter};
use crate::signal::Signal;
use ndarray::{Array2, Axis};
use tracing::debug;

/// Bandpass plus notch designed for one sampling rate
#[derive(Debug, Clone)]
pub struct FilterStage {
    bandpass: SosFilter,
    notch: SosFilter,
    sampling_rate: f64,
}

impl FilterStage {
    /// Validate the configuration and design both filters
    pub fn new(config: &FilterConfig, sampling_rate: f64) -> EegResult<Self> {
        config.validate(sampling_rate)?;
        Ok(Self {
            bandpass: butterworth_bandpass(
                config.filter_order,
                config.bandpass_low_hz,
                config.bandpass_high_hz,
                sampling_rate,
            )?,
            notch: iir_notch(config.notch_freq_hz, config.notch_quality, sampling_rate)?,
            sampling_rate,
        })
    }

    pub fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    /// Bandpass every channel
    pub fn clean_band(&self, signal: &Signal) -> EegResult<Signal> {
        self.check_rate(signal)?;
        apply_per_channel(&self.bandpass, signal, PipelineStage::Bandpass)
    }

    /// Notch every channel
    pub fn clean_notch(&self, signal: &Signal) -> EegResult<Signal> {
        self.check_rate(signal)?;
        apply_per_channel(&self.notch, signal, PipelineStage::Notch)
    }

    /// Bandpass then notch
    pub fn apply(&self, signal: &Signal) -> EegResult<Signal> {
        let banded = self.clean_band(signal)?;
        self.clean_notch(&banded)
    }

    fn check_rate(&self, signal: &Signal) -> EegResult<()> {
        if signal.sampling_rate() != self.sampling_rate {
            return Err(EegErrorBuilder::new("filter_stage", "apply").configuration(format!(
                "stage designed for {} Hz, signal sampled at {} Hz",
                self.sampling_rate,
                signal.sampling_rate()
            )));
        }
        Ok(())
    }
}

fn apply_per_channel(filter: &SosFilter, signal: &Signal, stage: PipelineStage) -> EegResult<Signal> {
    let required = filter.order() + 1;
    if signal.sample_count() < required {
        return Err(EegErrorBuilder::new("filter_stage", "apply_per_channel").insufficient_samples(
            stage,
            required,
            signal.sample_count(),
        ));
    }

    let mut output = Array2::<f64>::zeros(signal.data().raw_dim());
    for (input, mut out) in signal
        .data()
        .axis_iter(Axis(1))
        .zip(output.axis_iter_mut(Axis(1)))
    {
        let samples = input.to_vec();
        for (o, v) in out.iter_mut().zip(filter.apply(&samples)) {
            *o = v;
        }
    }
    debug!(filter = filter.get_name(), channels = signal.channel_count(), "filtered signal");
    Ok(signal.with_data(output))
}

/// Causal Butterworth bandpass of a single sample sequence using the default order.
///
/// Validates `0 < low < high < fs/2` before computing; output length equals input length.
pub fn clean_band(samples: &[f64], low_hz: f64, high_hz: f64, sampling_rate: f64) -> EegResult<Vec<f64>> {
    let filter = butterworth_bandpass(filters::DEFAULT_FILTER_ORDER, low_hz, high_hz, sampling_rate)?;
    ensure_length(samples, filter.order() + 1, PipelineStage::Bandpass)?;
    Ok(filter.apply(samples))
}

/// Causal notch at `line_freq_hz` with the default quality factor
pub fn clean_notch(samples: &[f64], line_freq_hz: f64, sampling_rate: f64) -> EegResult<Vec<f64>> {
    let filter = iir_notch(line_freq_hz, filters::DEFAULT_NOTCH_QUALITY, sampling_rate)?;
    ensure_length(samples, filter.order() + 1, PipelineStage::Notch)?;
    Ok(filter.apply(samples))
}

fn ensure_length(samples: &[f64], required: usize, stage: PipelineStage) -> EegResult<()> {
    if samples.len() < required {
        return Err(EegErrorBuilder::new("filter_stage", "clean").insufficient_samples(stage, required, samples.len()));
    }
    Ok(())
}
