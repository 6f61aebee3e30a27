//! Monitor configuration
//!
//! Everything a sink factory needs is passed in explicitly; nothing is read
//! from process-wide state. Configs can be written inline or loaded from the
//! `monitors:` YAML shape below.
//!
//! ```yaml
//! log_dir: ./train_log/run-1
//! printer:
//!   enable_step: false
//!   enable_epoch: true
//!   blacklist: [learning_rate]
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MonitorError, Result};

/// Configuration for the default set of monitors
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Output directory for file-backed sinks; file sinks become no-ops when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,

    /// Console printer settings
    #[serde(default)]
    pub printer: PrinterConfig,
}

/// Console printer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrinterConfig {
    /// Print pending scalars between steps
    #[serde(default)]
    pub enable_step: bool,

    /// Print pending scalars between epochs
    #[serde(default = "default_true")]
    pub enable_epoch: bool,

    /// Only print these names (all names when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whitelist: Option<HashSet<String>>,

    /// Never print these names
    #[serde(default, skip_serializing_if = "HashSet::is_empty")]
    pub blacklist: HashSet<String>,
}

fn default_true() -> bool {
    true
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self {
            enable_step: false,
            enable_epoch: true,
            whitelist: None,
            blacklist: HashSet::new(),
        }
    }
}

impl MonitorConfig {
    /// Config with file sinks writing under `log_dir`
    pub fn with_log_dir(mut self, log_dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(log_dir.into());
        self
    }

    /// Replace the printer settings
    pub fn with_printer(mut self, printer: PrinterConfig) -> Self {
        self.printer = printer;
        self
    }

    /// Parse a config from YAML text
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| MonitorError::ConfigParsing {
            message: format!("Failed to parse YAML monitor config: {e}"),
        })
    }

    /// Load a config from a YAML file
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| MonitorError::io(format!("reading {}", path.display()), e))?;
        Self::from_yaml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_has_no_log_dir() {
        let config = MonitorConfig::default();
        assert!(config.log_dir.is_none());
        assert!(!config.printer.enable_step);
        assert!(config.printer.enable_epoch);
    }

    #[test]
    fn test_from_yaml_str() {
        let yaml = r"
log_dir: /tmp/run-1
printer:
  enable_step: true
  whitelist: [loss, accuracy]
  blacklist: [lr]
";
        let config = MonitorConfig::from_yaml_str(yaml).expect("YAML should parse");
        assert_eq!(config.log_dir, Some(PathBuf::from("/tmp/run-1")));
        assert!(config.printer.enable_step);
        assert!(config.printer.enable_epoch);
        let whitelist = config.printer.whitelist.expect("whitelist should be set");
        assert!(whitelist.contains("loss"));
        assert!(config.printer.blacklist.contains("lr"));
    }

    #[test]
    fn test_from_yaml_str_empty_document_fields() {
        let config = MonitorConfig::from_yaml_str("printer: {}").expect("YAML should parse");
        assert_eq!(config, MonitorConfig::default());
    }

    #[test]
    fn test_from_yaml_str_invalid() {
        let err = MonitorConfig::from_yaml_str("printer: [1, 2").unwrap_err();
        assert!(matches!(err, MonitorError::ConfigParsing { .. }));
    }

    #[test]
    fn test_from_yaml_file() {
        let dir = tempfile::tempdir().expect("temp dir creation should succeed");
        let path = dir.path().join("monitors.yaml");
        fs::write(&path, "log_dir: logs\n").expect("file write should succeed");

        let config = MonitorConfig::from_yaml_file(&path).expect("config should load");
        assert_eq!(config.log_dir, Some(PathBuf::from("logs")));
    }

    #[test]
    fn test_from_yaml_file_missing() {
        let err = MonitorConfig::from_yaml_file("/nonexistent/monitors.yaml").unwrap_err();
        assert!(matches!(err, MonitorError::Io { .. }));
    }

    #[test]
    fn test_builder_methods() {
        let printer = PrinterConfig {
            enable_step: true,
            ..Default::default()
        };
        let config = MonitorConfig::default().with_log_dir("out").with_printer(printer.clone());
        assert_eq!(config.log_dir, Some(PathBuf::from("out")));
        assert_eq!(config.printer, printer);
    }
}
