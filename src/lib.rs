//! EEG-Core: EEG signal cleaning, spectral analysis and quality evaluation
//!
//! The crate turns a raw recording into a cleaned one and then describes both:
//!
//! - Causal Butterworth bandpass and IIR notch filtering
//! - Independent-component artifact separation with per-component diagnostics
//! - Optional amplitude gating of blink artifacts
//! - Welch spectra, canonical band shares and rule-based pattern labels
//! - A six-part weighted quality score with a plain-text report
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use eeg_core::{CleaningPipeline, PipelineConfig, QualityEvaluator, Signal, SpectralAnalyzer};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let raw = Signal::from_samples(vec![0.0; 2560], 256.0)?;
//!     let config = PipelineConfig::default();
//!
//!     let pipeline = CleaningPipeline::new(config.clone(), raw.sampling_rate())?;
//!     let output = pipeline.run(&raw)?;
//!
//!     let analysis = SpectralAnalyzer::new(config.analysis.clone())?.analyze(&raw, &output.cleaned)?;
//!     println!("{}", eeg_core::summarize(&analysis));
//!
//!     let evaluator = QualityEvaluator::new(config.filter.clone(), config.evaluation.clone())?;
//!     let evaluation = evaluator.evaluate(&raw, &output.cleaned, Some(&output.timings))?;
//!     println!("{}", eeg_core::render_report(&evaluation));
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod analysis;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod processing;
pub mod signal;
pub mod simulation;
pub mod utils;

// Re-export commonly used types for convenience
pub use analysis::{summarize, AnalysisResult, Band, BandPowerMap, PatternClassifier, SpectralAnalyzer};
pub use config::{ConfigLoader, PipelineConfig};
pub use error::{EegError, EegResult};
pub use evaluation::{render_report, EvaluationResult, QualityEvaluator, ReportCache};
pub use processing::{
    ArtifactSeparator, CleaningOutput, CleaningPipeline, ComponentDiagnostics, FilterStage, StepTimings,
};
pub use signal::{revert_window, Layout, Signal};
pub use utils::validation::{validate_signal, ValidationReport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn version_info() -> VersionInfo {
    VersionInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: "EEG signal cleaning, spectral analysis and pipeline quality evaluation".to_string(),
        features: vec![
            "Butterworth bandpass and notch filtering".to_string(),
            "Independent-component artifact separation".to_string(),
            "Welch band-power analysis".to_string(),
            "Weighted pipeline quality evaluation".to_string(),
        ],
    }
}

/// Library version information
#[derive(Debug, Clone)]
pub struct VersionInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub features: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_info() {
        let info = version_info();
        assert_eq!(info.name, NAME);
        assert_eq!(info.version, VERSION);
        assert!(!info.features.is_empty());
    }

    #[test]
    fn test_constants() {
        assert!(!VERSION.is_empty());
        assert_eq!(NAME, "eeg-core");
    }
}
