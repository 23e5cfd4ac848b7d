// tests/config_loading.rs
//! Layered configuration loading: defaults, TOML files, environment overrides

use eeg_core::config::{ConfigLoader, PipelineConfig};
use serial_test::serial;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
#[serial]
fn test_environment_overrides_file_values() {
    let file = write_config("[filter]\nnotch_freq_hz = 50.0\nbandpass_high_hz = 35.0\n");
    std::env::set_var("EEG__FILTER__NOTCH_FREQ_HZ", "60.0");
    std::env::set_var("EEG__GATE__ENABLED", "true");

    let loaded = ConfigLoader::with_paths(vec![file.path().to_path_buf()]).load();

    std::env::remove_var("EEG__FILTER__NOTCH_FREQ_HZ");
    std::env::remove_var("EEG__GATE__ENABLED");

    let config = loaded.unwrap();
    assert_eq!(config.filter.notch_freq_hz, 60.0);
    assert_eq!(config.filter.bandpass_high_hz, 35.0);
    assert!(config.gate.enabled);
    assert_eq!(config.separation, PipelineConfig::default().separation);
}

#[test]
#[serial]
fn test_rate_check_rejects_loaded_band() {
    let file = write_config("[filter]\nbandpass_high_hz = 60.0\n");
    let loader = ConfigLoader::with_paths(vec![file.path().to_path_buf()]);

    assert!(loader.load().is_ok());
    assert!(loader.load_for_rate(256.0).is_ok());
    assert!(loader.load_for_rate(100.0).unwrap_err().is_configuration());
}

#[test]
#[serial]
fn test_exported_config_loads_back() {
    let mut config = PipelineConfig::default();
    config.separation.max_components = Some(4);
    config.analysis.segment_length = 512;

    let file = NamedTempFile::new().unwrap();
    ConfigLoader::export_config(&config, file.path()).unwrap();
    let loaded = ConfigLoader::with_paths(vec![file.path().to_path_buf()]).load().unwrap();
    assert_eq!(loaded, config);
}
