// demos/pipeline_demo.rs
//! Clean a synthetic recording, analyse it and print the quality report

use eeg_core::config::ConfigLoader;
use eeg_core::simulation::{Injection, SyntheticEeg, SyntheticEegConfig};
use eeg_core::{
    render_report, summarize, validate_signal, CleaningPipeline, QualityEvaluator, SpectralAnalyzer,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("EEG Core Pipeline Demo");
    println!("======================");

    let sampling_rate = 256.0;
    let config = ConfigLoader::new().load_for_rate(sampling_rate)?;
    println!(
        "Bandpass {:.1}-{:.1} Hz, notch {:.1} Hz",
        config.filter.bandpass_low_hz, config.filter.bandpass_high_hz, config.filter.notch_freq_hz
    );

    // Two channels of alpha with line noise and an eye-blink-like offset on the first
    let raw = SyntheticEeg::new(SyntheticEegConfig {
        sampling_rate,
        duration_s: 20.0,
        channels: 2,
        line_amplitude: 2.0,
        injections: vec![Injection {
            channel: 0,
            start_sample: 1200,
            length: 60,
            amplitude: 150.0,
        }],
        ..SyntheticEegConfig::default()
    })
    .generate()?;

    let validation = validate_signal(&raw, None);
    for issue in &validation.issues {
        println!("  ! {}", issue);
    }

    let pipeline = CleaningPipeline::new(config.clone(), sampling_rate)?;
    let output = pipeline.run(&raw)?;
    println!(
        "\nCleaned {} channels x {} samples in {:.4} s",
        output.cleaned.channel_count(),
        output.cleaned.sample_count(),
        output.timings.total()
    );

    let analyzer = SpectralAnalyzer::new(config.analysis.clone())?;
    let analysis = analyzer.analyze(&raw, &output.cleaned)?;
    println!("\n{}", summarize(&analysis));
    println!("\nAnalysis JSON:\n{}", serde_json::to_string_pretty(&analysis)?);

    let evaluator = QualityEvaluator::new(config.filter, config.evaluation)?;
    let evaluation = evaluator.evaluate(&raw, &output.cleaned, Some(&output.timings))?;
    println!("\n{}", render_report(&evaluation));

    Ok(())
}
