// src/processing/mod.rs
//! Signal cleaning stages for EEG data

pub mod artifacts;
pub mod filter_stage;
pub mod filters;
pub mod pipeline;
pub mod separation;

pub use artifacts::{count_amplitude_events, detect_blink_windows, AmplitudeGate, ArtifactWindow};
pub use filter_stage::{clean_band, clean_notch, FilterStage};
pub use filters::{Filter, SecondOrderSection, SosFilter};
pub use pipeline::{CleaningOutput, CleaningPipeline, StepTimings};
pub use separation::{ArtifactSeparator, ComponentDiagnostics, ComponentReport, SampleRange};
