//! Input validation for recordings handed to the pipeline
//!
//! Produces a report instead of failing fast so an ingestion front end can show
//! every problem at once. Non-finite samples make a recording invalid; unusual
//! channel labels are reported but tolerated.

use crate::signal::Signal;
use serde::Serialize;
use std::fmt;

/// Electrode label prefixes of the 10-20 system
const STANDARD_LABEL_PREFIXES: [&str; 6] = ["Fp", "F", "C", "P", "O", "T"];

/// Single problem found in a recording
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ValidationIssue {
    NanValues { count: usize },
    InfiniteValues { count: usize },
    ChannelCountMismatch { labels: usize, channels: usize },
    UnusualChannelLabels { labels: Vec<String> },
}

impl ValidationIssue {
    /// Whether the issue makes the recording unusable
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ValidationIssue::NanValues { .. }
                | ValidationIssue::InfiniteValues { .. }
                | ValidationIssue::ChannelCountMismatch { .. }
        )
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::NanValues { count } => write!(f, "Data contains {} NaN values", count),
            ValidationIssue::InfiniteValues { count } => write!(f, "Data contains {} infinite values", count),
            ValidationIssue::ChannelCountMismatch { labels, channels } => {
                write!(f, "{} channel labels supplied for {} channels", labels, channels)
            }
            ValidationIssue::UnusualChannelLabels { labels } => {
                write!(f, "Unusual channel names: {}", labels.join(", "))
            }
        }
    }
}

/// Outcome of [`validate_signal`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub issues: Vec<ValidationIssue>,
}

/// Inspect a recording and its optional channel labels
pub fn validate_signal(signal: &Signal, channel_labels: Option<&[String]>) -> ValidationReport {
    let mut issues = Vec::new();

    let nan_count = signal.data().iter().filter(|v| v.is_nan()).count();
    if nan_count > 0 {
        issues.push(ValidationIssue::NanValues { count: nan_count });
    }
    let inf_count = signal.data().iter().filter(|v| v.is_infinite()).count();
    if inf_count > 0 {
        issues.push(ValidationIssue::InfiniteValues { count: inf_count });
    }

    if let Some(labels) = channel_labels {
        if labels.len() != signal.channel_count() {
            issues.push(ValidationIssue::ChannelCountMismatch {
                labels: labels.len(),
                channels: signal.channel_count(),
            });
        }
        let unusual: Vec<String> = labels
            .iter()
            .filter(|label| !STANDARD_LABEL_PREFIXES.iter().any(|p| label.starts_with(p)))
            .cloned()
            .collect();
        if !unusual.is_empty() {
            issues.push(ValidationIssue::UnusualChannelLabels { labels: unusual });
        }
    }

    ValidationReport {
        valid: !issues.iter().any(ValidationIssue::is_fatal),
        issues,
    }
}
