// tests/pipeline_scenarios.rs
//! End-to-end scenarios: cleaning, analysis and evaluation on known recordings

use eeg_core::analysis::{Band, SpectralAnalyzer};
use eeg_core::config::PipelineConfig;
use eeg_core::evaluation::{render_report, QualityEvaluator};
use eeg_core::processing::{clean_band, count_amplitude_events, ArtifactSeparator, CleaningPipeline, FilterStage};
use eeg_core::simulation::{Injection, SyntheticEeg, SyntheticEegConfig};
use eeg_core::{Layout, Signal};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::f64::consts::PI;

fn analyzer(config: &PipelineConfig) -> SpectralAnalyzer {
    SpectralAnalyzer::new(config.analysis.clone()).unwrap()
}

fn evaluator(config: &PipelineConfig) -> QualityEvaluator {
    QualityEvaluator::new(config.filter.clone(), config.evaluation.clone()).unwrap()
}

/// 10 s at 256 Hz: 10 Hz sine, Gaussian noise (σ 0.5), 150 µV spike over samples 500..550
fn alpha_with_spike() -> Signal {
    SyntheticEeg::new(SyntheticEegConfig {
        injections: vec![Injection {
            channel: 0,
            start_sample: 500,
            length: 50,
            amplitude: 150.0,
        }],
        ..SyntheticEegConfig::default()
    })
    .generate()
    .unwrap()
}

/// The single-channel spike is only removed by the amplitude gate; separation
/// has nothing to unmix with one channel, so this scenario enables the gate.
#[test]
fn test_spike_recording_cleans_to_alpha() {
    let mut config = PipelineConfig::default();
    config.gate.enabled = true;
    let raw = alpha_with_spike();

    let pipeline = CleaningPipeline::new(config.clone(), 256.0).unwrap();
    let output = pipeline.run(&raw).unwrap();
    assert_eq!(output.gated_windows.len(), 1);

    let result = analyzer(&config).analyze(&raw, &output.cleaned).unwrap();
    assert_eq!(result.dominant_band, Some(Band::Alpha));
    let alpha = result.band_powers.alpha;
    assert!(result.band_powers.iter().all(|(_, p)| p <= alpha));

    let gap = (config.analysis.event_gap_seconds * 256.0) as usize;
    let raw_events = count_amplitude_events(&raw.flatten(), config.analysis.artifact_std_factor, gap);
    assert!(result.artefacts_detected < raw_events);
}

#[test]
fn test_all_zero_recording_is_not_an_error() {
    let config = PipelineConfig::default();
    let raw = Signal::from_samples(vec![0.0; 2560], 256.0).unwrap();

    let output = CleaningPipeline::new(config.clone(), 256.0).unwrap().run(&raw).unwrap();
    assert!(output.cleaned.flatten().iter().all(|&v| v == 0.0));

    let result = analyzer(&config).analyze(&raw, &output.cleaned).unwrap();
    assert!(result.band_powers.iter().all(|(_, p)| p == 0.0));
    assert_eq!(result.dominant_band, None);
    assert_eq!(result.dominant_band_name(), "unknown");
    assert_eq!(result.artefacts_detected, 0);

    let evaluation = evaluator(&config).evaluate(&raw, &output.cleaned, Some(&output.timings)).unwrap();
    assert!((0.0..=100.0).contains(&evaluation.overall_score));
}

#[test]
fn test_single_channel_separation_is_bit_identical() {
    let raw = alpha_with_spike();
    let separator = ArtifactSeparator::new(Default::default()).unwrap();
    let out = separator.separate(&raw).unwrap();
    assert_eq!(out.layout(), Layout::Single);
    assert_eq!(out, raw);
}

#[test]
fn test_cutoff_above_nyquist_refuses_to_run() {
    let mut config = PipelineConfig::default();
    config.filter.bandpass_high_hz = 60.0;

    assert!(CleaningPipeline::new(config.clone(), 100.0).unwrap_err().is_configuration());
    assert!(FilterStage::new(&config.filter, 100.0).unwrap_err().is_configuration());
    assert!(clean_band(&[0.0; 1000], 1.0, 60.0, 100.0).unwrap_err().is_configuration());
}

#[test]
fn test_diagnose_marks_spike_channel_component() {
    let fs = 256.0;
    let n = 2560;
    let mut rng = StdRng::seed_from_u64(21);
    let sine: Vec<f64> = (0..n)
        .map(|i| 10.0 * (2.0 * PI * 10.0 * i as f64 / fs).sin() + rng.gen_range(-0.5..0.5))
        .collect();
    let mut spikes: Vec<f64> = (0..n).map(|_| rng.gen_range(-0.5..0.5)).collect();
    for start in [200, 900, 1700, 2300] {
        for v in &mut spikes[start..start + 15] {
            *v += 200.0;
        }
    }
    let signal = Signal::from_channels(vec![sine, spikes], fs).unwrap();

    let diagnostics = ArtifactSeparator::new(Default::default())
        .unwrap()
        .diagnose(&signal, None, None)
        .unwrap();
    assert_eq!(diagnostics.removed_count, 1);
    assert!(diagnostics.sample_range.is_none());
    for component in &diagnostics.components {
        assert_eq!(component.removed, component.peak_to_peak > 3.0 * diagnostics.median_peak_to_peak);
    }
}

/// Without the gate, spikes are removed by rejecting their independent component
#[test]
fn test_ungated_pipeline_rejects_spike_component() {
    let fs = 256.0;
    let n = 2560;
    let mut rng = StdRng::seed_from_u64(5);
    let sine: Vec<f64> = (0..n)
        .map(|i| 10.0 * (2.0 * PI * 10.0 * i as f64 / fs).sin() + rng.gen_range(-0.5..0.5))
        .collect();
    let mut spikes: Vec<f64> = (0..n).map(|_| rng.gen_range(-0.5..0.5)).collect();
    for start in [300, 1200, 2000] {
        for v in &mut spikes[start..start + 20] {
            *v += 150.0;
        }
    }
    let raw = Signal::from_channels(vec![sine, spikes], fs).unwrap();

    let config = PipelineConfig::default();
    assert!(!config.gate.enabled);
    let pipeline = CleaningPipeline::new(config, fs).unwrap();

    let diagnostics = pipeline.separator().diagnose(&raw, None, None).unwrap();
    assert_eq!(diagnostics.removed_count, 1);

    let filtered = pipeline.filter_stage().apply(&raw).unwrap();
    let output = pipeline.run(&raw).unwrap();
    assert!(output.gated_windows.is_empty());
    assert!(output.skipped_steps.is_empty());

    let filtered_peak = filtered.channels()[1].iter().fold(0.0f64, |m, v| m.max(v.abs()));
    let cleaned_peak = output.cleaned.channels()[1].iter().fold(0.0f64, |m, v| m.max(v.abs()));
    assert!(cleaned_peak < filtered_peak / 2.0, "filtered {} cleaned {}", filtered_peak, cleaned_peak);
}

#[test]
fn test_short_recording_passes_through() {
    let pipeline = CleaningPipeline::new(PipelineConfig::default(), 256.0).unwrap();
    let raw = Signal::from_samples(vec![0.0; 8], 256.0).unwrap();

    let output = pipeline.run(&raw).unwrap();
    assert_eq!(output.cleaned, raw);
    assert_eq!(output.skipped_steps, vec!["bandpass"]);
}

#[test]
fn test_cleaning_is_repeatable() {
    let raw = SyntheticEeg::new(SyntheticEegConfig {
        channels: 3,
        injections: vec![Injection {
            channel: 1,
            start_sample: 700,
            length: 30,
            amplitude: 150.0,
        }],
        ..SyntheticEegConfig::default()
    })
    .generate()
    .unwrap();
    let pipeline = CleaningPipeline::new(PipelineConfig::default(), 256.0).unwrap();

    let first = pipeline.run(&raw).unwrap();
    let second = pipeline.run(&raw).unwrap();
    assert_eq!(first.cleaned, second.cleaned);
}

#[test]
fn test_unchanged_signal_evaluates_as_healthy() {
    let config = PipelineConfig::default();
    let raw = SyntheticEeg::new(SyntheticEegConfig {
        line_amplitude: 0.5,
        ..SyntheticEegConfig::default()
    })
    .generate()
    .unwrap();

    let result = evaluator(&config).evaluate(&raw, &raw, None).unwrap();
    assert!(result.signal_quality_metrics.noise_reduction_percent.abs() < 1e-9);
    assert!((result.signal_quality_metrics.correlation - 1.0).abs() < 1e-9);
    assert!(result.pipeline_health.issues.is_empty());
    assert!(result.pipeline_health.warnings.is_empty());
    assert!((0.0..=100.0).contains(&result.overall_score));
}

#[test]
fn test_line_noise_removal_is_scored() {
    let config = PipelineConfig::default();
    let raw = SyntheticEeg::new(SyntheticEegConfig {
        line_amplitude: 3.0,
        ..SyntheticEegConfig::default()
    })
    .generate()
    .unwrap();
    let output = CleaningPipeline::new(config.clone(), 256.0).unwrap().run(&raw).unwrap();

    let result = evaluator(&config).evaluate(&raw, &output.cleaned, Some(&output.timings)).unwrap();
    assert!(result.filter_effectiveness.notch_effectiveness.notch_reduction_percent > 90.0);
    assert!(result.signal_quality_metrics.noise_reduction_percent > 50.0);
    assert!(result.performance_metrics.is_some());

    let report = render_report(&result);
    assert!(report.contains("Performance"));
    assert!(report.contains("  - bandpass:"));
}

#[test]
fn test_multichannel_recording_keeps_shape() {
    let config = PipelineConfig::default();
    let raw = SyntheticEeg::new(SyntheticEegConfig {
        channels: 4,
        injections: vec![Injection {
            channel: 2,
            start_sample: 1000,
            length: 40,
            amplitude: 150.0,
        }],
        ..SyntheticEegConfig::default()
    })
    .generate()
    .unwrap();

    let output = CleaningPipeline::new(config.clone(), 256.0).unwrap().run(&raw).unwrap();
    assert_eq!(output.cleaned.data().dim(), raw.data().dim());
    assert_eq!(output.cleaned.layout(), Layout::ChannelsBySamples);
    assert!(!output.cleaned.has_non_finite());

    let evaluation = evaluator(&config).evaluate(&raw, &output.cleaned, Some(&output.timings)).unwrap();
    assert!((0.0..=100.0).contains(&evaluation.overall_score));
    assert!(evaluation.pipeline_health.issues.is_empty());
    assert_eq!(evaluation.data_info.samples, 4 * 2560);
}

#[test]
fn test_batch_keeps_input_order() {
    let config = PipelineConfig::default();
    let pipeline = CleaningPipeline::new(config, 256.0).unwrap();
    let recordings: Vec<Signal> = (0..3)
        .map(|seed| {
            SyntheticEeg::new(SyntheticEegConfig {
                seed,
                duration_s: 2.0 + seed as f64,
                ..SyntheticEegConfig::default()
            })
            .generate()
            .unwrap()
        })
        .collect();

    let outputs = pipeline.run_batch(&recordings);
    for (raw, output) in recordings.iter().zip(outputs) {
        assert_eq!(output.unwrap().cleaned.sample_count(), raw.sample_count());
    }
}
