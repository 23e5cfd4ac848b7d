// src/config/constants.rs
//! Pipeline-wide configuration constants

/// Filtering defaults
pub mod filters {
    pub const DEFAULT_BANDPASS_LOW_HZ: f64 = 1.0;
    pub const DEFAULT_BANDPASS_HIGH_HZ: f64 = 40.0;
    pub const DEFAULT_FILTER_ORDER: usize = 5;
    pub const MIN_FILTER_ORDER: usize = 1;
    pub const MAX_FILTER_ORDER: usize = 10;
    pub const DEFAULT_NOTCH_FREQ_HZ: f64 = 50.0;
    pub const DEFAULT_NOTCH_QUALITY: f64 = 30.0;
}

/// Blind source separation defaults
pub mod separation {
    pub const MIN_COMPONENTS: usize = 2;
    pub const DEFAULT_REJECTION_FACTOR: f64 = 3.0;
    pub const DEFAULT_MAX_ITERATIONS: usize = 200;
    pub const DEFAULT_TOLERANCE: f64 = 1e-4;
    pub const DEFAULT_SEED: u64 = 42;
    pub const SINGULAR_PIVOT_THRESHOLD: f64 = 1e-10;
}

/// Amplitude gate defaults
pub mod gate {
    pub const DEFAULT_BLINK_THRESHOLD: f64 = 120.0;
}

/// Spectral analysis constants
pub mod analysis {
    pub const DEFAULT_SEGMENT_LENGTH: usize = 256;
    pub const DEFAULT_ARTIFACT_STD_FACTOR: f64 = 3.0;
    pub const DEFAULT_EVENT_GAP_SECONDS: f64 = 0.5;
    pub const SNR_MIN_DB: f64 = 0.0;
    pub const SNR_MAX_DB: f64 = 20.0;

    pub const STRONG_ALPHA_PERCENT: f64 = 40.0;
    pub const ELEVATED_THETA_PERCENT: f64 = 30.0;
    pub const HIGH_BETA_PERCENT: f64 = 35.0;
    pub const ELEVATED_DELTA_PERCENT: f64 = 40.0;

    pub const NORMAL_ALPHA_PERCENT: f64 = 35.0;
    pub const COGNITIVE_BETA_PERCENT: f64 = 40.0;
    pub const ANOMALY_DELTA_PERCENT: f64 = 45.0;
    pub const REDUCED_ALPHA_PERCENT: f64 = 15.0;
    pub const NOTABLE_GAMMA_PERCENT: f64 = 15.0;
}

/// Quality evaluation constants
pub mod evaluation {
    pub const DEFAULT_NOTCH_HALFWIDTH_HZ: f64 = 1.0;
    pub const DEFAULT_REFERENCE_THROUGHPUT: f64 = 100_000.0;
    pub const SEGMENT_DIVISOR: usize = 4;
    pub const SPECTRAL_GRID_POINTS: usize = 100;
    pub const SNR_CAP_DB: f64 = 50.0;
    pub const FREQUENCY_SHIFT_PENALTY: f64 = 10.0;
    pub const ARTIFACT_STD_FACTOR: f64 = 3.0;

    pub const WEIGHT_SIGNAL_QUALITY: f64 = 0.30;
    pub const WEIGHT_FILTER_EFFECTIVENESS: f64 = 0.25;
    pub const WEIGHT_FREQUENCY_STABILITY: f64 = 0.15;
    pub const WEIGHT_ARTIFACT_REMOVAL: f64 = 0.15;
    pub const WEIGHT_STATISTICAL_INTEGRITY: f64 = 0.10;
    pub const WEIGHT_PIPELINE_HEALTH: f64 = 0.05;

    pub const HEALTH_ISSUE_PENALTY: f64 = 20.0;
    pub const HEALTH_WARNING_PENALTY: f64 = 5.0;
    pub const OVER_FILTER_STD_RATIO: f64 = 0.1;
    pub const UNDER_FILTER_STD_RATIO: f64 = 0.5;
    pub const CLIPPING_FRACTION: f64 = 0.01;
    pub const HEALTHY_SCORE: f64 = 80.0;
    pub const DEGRADED_SCORE: f64 = 50.0;

    pub const RATING_EXCELLENT: f64 = 80.0;
    pub const RATING_GOOD: f64 = 60.0;
    pub const RATING_MODERATE: f64 = 40.0;
}

/// Numerical guards
pub mod numeric {
    /// Added to every ratio denominator
    pub const EPSILON: f64 = 1e-10;
}

/// Configuration file locations, in increasing precedence
pub mod paths {
    pub const DEFAULT_CONFIG_FILE: &str = "config/default.toml";
    pub const LOCAL_CONFIG_FILE: &str = "config/local.toml";
    pub const ENV_PREFIX: &str = "EEG__";
    pub const ENV_SEPARATOR: &str = "__";
}
