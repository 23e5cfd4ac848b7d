// src/error.rs
//! Unified error handling for EEG Core
//!
//! Every fallible operation in the crate returns [`EegResult`]. Variants follow the
//! failure categories a caller has to tell apart: a pipeline that refused to run
//! because it was misconfigured, a stage that did not receive enough data, a
//! numerical routine that did not converge, and malformed input.
//!
//! Degenerate but well-formed input (all-zero or constant signals) is never an
//! error. Analysis and evaluation log a warning and fall back to epsilon-guarded
//! defaults instead.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::SystemTime;
use thiserror::Error;

/// Unified error type for the entire EEG pipeline
#[derive(Debug, Clone, Error)]
pub enum EegError {
    /// Invalid cutoff, sampling-rate or component settings. Raised before any computation.
    #[error("[CONFIG] Configuration error in {component}: {reason} ({})", .context.operation)]
    Configuration {
        component: String,
        reason: String,
        context: ErrorContext,
    },

    /// Fewer samples or channels than a stage requires
    #[error("[DATA] {stage} requires at least {required} {unit}, got {actual} ({})", .context.operation)]
    InsufficientData {
        stage: PipelineStage,
        unit: DataUnit,
        required: usize,
        actual: usize,
        context: ErrorContext,
    },

    /// Decomposition non-convergence or rank deficiency
    #[error("[NUMERIC] {stage} numerical failure: {reason} ({})", .context.operation)]
    NumericalFailure {
        stage: PipelineStage,
        reason: String,
        context: ErrorContext,
    },

    /// Malformed input data
    #[error("[DATA] Invalid {data_type}: {reason} ({})", .context.operation)]
    InvalidData {
        data_type: String,
        reason: String,
        context: ErrorContext,
    },
}

/// Pipeline stages for error tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PipelineStage {
    Gate,
    Bandpass,
    Notch,
    Separation,
    Analysis,
    Evaluation,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Gate => "amplitude gate",
            PipelineStage::Bandpass => "bandpass filter",
            PipelineStage::Notch => "notch filter",
            PipelineStage::Separation => "component separation",
            PipelineStage::Analysis => "spectral analysis",
            PipelineStage::Evaluation => "quality evaluation",
        };
        f.write_str(name)
    }
}

/// What an [`EegError::InsufficientData`] count refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DataUnit {
    Samples,
    Channels,
}

impl fmt::Display for DataUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataUnit::Samples => f.write_str("samples"),
            DataUnit::Channels => f.write_str("channels"),
        }
    }
}

/// Error context for debugging and analysis
#[derive(Debug, Clone, Serialize)]
pub struct ErrorContext {
    pub timestamp: SystemTime,
    pub thread_id: Option<String>,
    pub component: String,
    pub operation: String,
    pub file: Option<&'static str>,
    pub line: Option<u32>,
    pub additional_info: BTreeMap<String, String>,
}

impl ErrorContext {
    /// Create a new error context
    pub fn new(component: &str, operation: &str) -> Self {
        Self {
            timestamp: SystemTime::now(),
            thread_id: std::thread::current().name().map(|s| s.to_string()),
            component: component.to_string(),
            operation: operation.to_string(),
            file: None,
            line: None,
            additional_info: BTreeMap::new(),
        }
    }

    /// Create error context with file and line information
    pub fn with_location(component: &str, operation: &str, file: &'static str, line: u32) -> Self {
        let mut context = Self::new(component, operation);
        context.file = Some(file);
        context.line = Some(line);
        context
    }

    /// Add additional information to the context
    pub fn add_info<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.additional_info.insert(key.into(), value.into());
        self
    }
}

/// Macro for creating error context with file and line info
#[macro_export]
macro_rules! error_context {
    ($component:expr, $operation:expr) => {
        $crate::error::ErrorContext::with_location($component, $operation, file!(), line!())
    };
}

impl EegError {
    /// True when the pipeline refused to run because of its settings
    pub fn is_configuration(&self) -> bool {
        matches!(self, EegError::Configuration { .. })
    }

    /// True for failures the cleaning entrypoints absorb as a passthrough
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EegError::InsufficientData { .. } | EegError::NumericalFailure { .. }
        )
    }

    /// Context attached at the failure site
    pub fn context(&self) -> &ErrorContext {
        match self {
            EegError::Configuration { context, .. }
            | EegError::InsufficientData { context, .. }
            | EegError::NumericalFailure { context, .. }
            | EegError::InvalidData { context, .. } => context,
        }
    }
}

impl From<crate::config::ConfigError> for EegError {
    fn from(err: crate::config::ConfigError) -> Self {
        EegError::Configuration {
            component: "config_loader".to_string(),
            reason: err.to_string(),
            context: error_context!("config_loader", "load"),
        }
    }
}

/// Result type alias for EEG operations
pub type EegResult<T> = Result<T, EegError>;

/// Error builder for convenient error construction
pub struct EegErrorBuilder {
    component: String,
    operation: String,
}

impl EegErrorBuilder {
    pub fn new(component: &str, operation: &str) -> Self {
        Self {
            component: component.to_string(),
            operation: operation.to_string(),
        }
    }

    fn context(&self) -> ErrorContext {
        ErrorContext::new(&self.component, &self.operation)
    }

    pub fn configuration(self, reason: impl Into<String>) -> EegError {
        let context = self.context();
        EegError::Configuration {
            component: self.component,
            reason: reason.into(),
            context,
        }
    }

    pub fn insufficient_samples(self, stage: PipelineStage, required: usize, actual: usize) -> EegError {
        EegError::InsufficientData {
            stage,
            unit: DataUnit::Samples,
            required,
            actual,
            context: self.context(),
        }
    }

    pub fn insufficient_channels(self, stage: PipelineStage, required: usize, actual: usize) -> EegError {
        EegError::InsufficientData {
            stage,
            unit: DataUnit::Channels,
            required,
            actual,
            context: self.context(),
        }
    }

    pub fn numerical(self, stage: PipelineStage, reason: impl Into<String>) -> EegError {
        EegError::NumericalFailure {
            stage,
            reason: reason.into(),
            context: self.context(),
        }
    }

    pub fn invalid_data(self, data_type: &str, reason: impl Into<String>) -> EegError {
        EegError::InvalidData {
            data_type: data_type.to_string(),
            reason: reason.into(),
            context: self.context(),
        }
    }
}
