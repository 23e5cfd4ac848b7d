//! Common utility functions for EEG-Core
//!
//! - Descriptive statistics, integration and interpolation over sample slices
//! - Input validation reports for incoming recordings

pub mod stats;
pub mod validation;

pub use validation::{validate_signal, ValidationIssue, ValidationReport};
