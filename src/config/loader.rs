// src/config/loader.rs
//! Layered configuration loader
//!
//! Layers, lowest precedence first: built-in defaults, each TOML file in the
//! configured order (missing files are skipped), then `EEG__SECTION__KEY`
//! environment variables.

use crate::config::{constants::paths, PipelineConfig};
use crate::error::EegResult;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration loader over a list of TOML files
pub struct ConfigLoader {
    config_paths: Vec<PathBuf>,
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),
    #[error("Configuration parse error: {0}")]
    ParseError(String),
    #[error("Configuration validation error: {0}")]
    ValidationError(String),
    #[error("IO error: {0}")]
    IoError(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl ConfigLoader {
    /// Loader over the default project-relative files
    pub fn new() -> Self {
        Self {
            config_paths: vec![
                PathBuf::from(paths::DEFAULT_CONFIG_FILE),
                PathBuf::from(paths::LOCAL_CONFIG_FILE),
            ],
        }
    }

    /// Create loader with custom paths, later paths taking precedence
    pub fn with_paths(paths: Vec<PathBuf>) -> Self {
        Self { config_paths: paths }
    }

    pub fn config_paths(&self) -> &[PathBuf] {
        &self.config_paths
    }

    /// Merge all layers and deserialize. Rate-independent sections are validated here.
    pub fn load(&self) -> Result<PipelineConfig, ConfigError> {
        let config = self.load_and_merge_configs()?;
        config
            .validate_rate_independent()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        Ok(config)
    }

    /// Load and validate every section against a sampling rate
    pub fn load_for_rate(&self, sampling_rate: f64) -> EegResult<PipelineConfig> {
        let config = self.load()?;
        config.validate(sampling_rate)?;
        Ok(config)
    }

    /// Validate a single file without merging it
    pub fn validate_config_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let value = self.load_config_file(path)?;
        let config: PipelineConfig = value
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError(e.to_string()))?;
        config
            .validate_rate_independent()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))
    }

    /// Write a configuration as pretty TOML
    pub fn export_config<P: AsRef<Path>>(config: &PipelineConfig, path: P) -> Result<(), ConfigError> {
        let toml_content =
            toml::to_string_pretty(config).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    fn load_and_merge_configs(&self) -> Result<PipelineConfig, ConfigError> {
        let mut merged_config = toml::Value::try_from(PipelineConfig::default())
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        for config_path in &self.config_paths {
            match self.load_config_file(config_path) {
                Ok(file_config) => {
                    debug!(path = %config_path.display(), "merging configuration file");
                    merge_toml_values(&mut merged_config, file_config);
                }
                Err(ConfigError::FileNotFound(_)) => continue,
                Err(e) => return Err(e),
            }
        }

        apply_environment_overrides(&mut merged_config, std::env::vars());

        merged_config
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError(format!("Failed to deserialize config: {}", e)))
    }

    fn load_config_file<P: AsRef<Path>>(&self, path: P) -> Result<toml::Value, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn merge_toml_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                if let Some(base_value) = base_table.get_mut(&key) {
                    merge_toml_values(base_value, value);
                } else {
                    base_table.insert(key, value);
                }
            }
        }
        (base_value, overlay_value) => {
            *base_value = overlay_value;
        }
    }
}

fn apply_environment_overrides<I>(config: &mut toml::Value, vars: I)
where
    I: IntoIterator<Item = (String, String)>,
{
    for (key, value) in vars {
        let Some(path) = key.strip_prefix(paths::ENV_PREFIX) else {
            continue;
        };
        let parts: Vec<String> = path
            .split(paths::ENV_SEPARATOR)
            .map(|p| p.to_lowercase())
            .collect();
        if parts.iter().any(|p| p.is_empty()) {
            continue;
        }
        debug!(variable = %key, "applying environment override");
        set_nested_value(config, &parts, parse_env_value(&value));
    }
}

fn parse_env_value(value: &str) -> toml::Value {
    if let Ok(int_val) = value.parse::<i64>() {
        toml::Value::Integer(int_val)
    } else if let Ok(float_val) = value.parse::<f64>() {
        toml::Value::Float(float_val)
    } else if let Ok(bool_val) = value.parse::<bool>() {
        toml::Value::Boolean(bool_val)
    } else {
        toml::Value::String(value.to_string())
    }
}

fn set_nested_value(config: &mut toml::Value, parts: &[String], value: toml::Value) {
    let Some((last, parents)) = parts.split_last() else {
        return;
    };
    let mut current = config;
    for part in parents {
        let toml::Value::Table(table) = current else {
            return;
        };
        current = table
            .entry(part.clone())
            .or_insert_with(|| toml::Value::Table(toml::value::Table::new()));
    }
    if let toml::Value::Table(table) = current {
        table.insert(last.clone(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_missing_files_fall_back_to_defaults() {
        let loader = ConfigLoader::with_paths(vec![PathBuf::from("/nonexistent/eeg.toml")]);
        let config = loader.load().unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn test_later_files_take_precedence() {
        let mut base = NamedTempFile::new().unwrap();
        writeln!(base, "[filter]\nnotch_freq_hz = 60.0\nbandpass_high_hz = 35.0").unwrap();
        let mut local = NamedTempFile::new().unwrap();
        writeln!(local, "[filter]\nbandpass_high_hz = 30.0").unwrap();

        let loader = ConfigLoader::with_paths(vec![base.path().to_path_buf(), local.path().to_path_buf()]);
        let config = loader.load().unwrap();
        assert_eq!(config.filter.notch_freq_hz, 60.0);
        assert_eq!(config.filter.bandpass_high_hz, 30.0);
        assert_eq!(config.filter.bandpass_low_hz, 1.0);
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "[separation]\nmax_components = 1").unwrap();

        let loader = ConfigLoader::new();
        assert!(matches!(
            loader.validate_config_file(temp_file.path()),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_file_check_agrees_with_load() {
        for content in [
            "[gate]\nthreshold = -1.0",
            "[evaluation]\nnotch_halfwidth_hz = 0.0",
            "[analysis]\nsegment_length = 0",
        ] {
            let mut temp_file = NamedTempFile::new().unwrap();
            writeln!(temp_file, "{}", content).unwrap();

            let loader = ConfigLoader::with_paths(vec![temp_file.path().to_path_buf()]);
            assert!(
                matches!(loader.validate_config_file(temp_file.path()), Err(ConfigError::ValidationError(_))),
                "{}",
                content
            );
            assert!(matches!(loader.load(), Err(ConfigError::ValidationError(_))), "{}", content);
        }
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "[filter\nnotch = ").unwrap();
        let loader = ConfigLoader::with_paths(vec![temp_file.path().to_path_buf()]);
        assert!(matches!(loader.load(), Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_environment_override_parsing() {
        let mut value = toml::Value::try_from(PipelineConfig::default()).unwrap();
        apply_environment_overrides(
            &mut value,
            vec![
                ("EEG__FILTER__NOTCH_FREQ_HZ".to_string(), "60".to_string()),
                ("EEG__GATE__ENABLED".to_string(), "true".to_string()),
                ("EEG_IGNORED".to_string(), "1".to_string()),
            ],
        );
        let config: PipelineConfig = value.try_into().unwrap();
        assert_eq!(config.filter.notch_freq_hz, 60.0);
        assert!(config.gate.enabled);
    }

    #[test]
    fn test_rate_validation_surfaces_configuration_error() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "[filter]\nbandpass_high_hz = 60.0").unwrap();
        let loader = ConfigLoader::with_paths(vec![temp_file.path().to_path_buf()]);
        let err = loader.load_for_rate(100.0).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_config_export() {
        let temp_file = NamedTempFile::new().unwrap();
        ConfigLoader::export_config(&PipelineConfig::default(), temp_file.path()).unwrap();

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(content.contains("[filter]"));
        assert!(content.contains("notch_quality"));
    }
}
