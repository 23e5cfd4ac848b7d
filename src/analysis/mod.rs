//! Spectral analysis of cleaned recordings
//!
//! Welch power spectra, canonical band shares, rule-based pattern and indicator
//! classification, and the plain-language summary built from them.

pub mod analyzer;
pub mod patterns;
pub mod spectral;

pub use analyzer::{noise_reduction, snr_improvement, summarize, AnalysisResult, SpectralAnalyzer};
pub use patterns::{Condition, Indicator, IndicatorKind, PatternClassifier, PatternTag};
pub use spectral::{welch, Band, BandPowerMap, Psd};
