/*!
 * Configuration types for bacpac-editor
 */

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{EditorError, Result};

/// Main configuration for edit runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Suffix inserted before the extension of the output package
    #[serde(default = "default_output_suffix")]
    pub output_suffix: String,

    /// Extension (without dot) that marks an input as a package container
    #[serde(default = "default_package_extension")]
    pub package_extension: String,

    /// Relative path of the schema model inside the package
    #[serde(default = "default_model_entry")]
    pub model_entry: String,

    /// Relative path of the manifest inside the package
    #[serde(default = "default_manifest_entry")]
    pub manifest_entry: String,

    /// Parent directory for working directories (None = system temp)
    #[serde(default)]
    pub work_dir: Option<PathBuf>,

    /// Log level for diagnostic output
    #[serde(default)]
    pub log_level: LogLevel,

    /// Log file path (None = stdout)
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Enable verbose logging (shorthand for log_level = debug)
    #[serde(default)]
    pub verbose: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            output_suffix: default_output_suffix(),
            package_extension: default_package_extension(),
            model_entry: default_model_entry(),
            manifest_entry: default_manifest_entry(),
            work_dir: None,
            log_level: LogLevel::Info,
            log_file: None,
            verbose: false,
        }
    }
}

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Only errors
    Error,

    /// Warnings and errors
    Warn,

    /// Info, warnings, and errors
    #[default]
    Info,

    /// Debug and above
    Debug,

    /// All messages including traces
    Trace,
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

// Default value functions for serde
fn default_output_suffix() -> String {
    "_modified".to_string()
}

fn default_package_extension() -> String {
    "bacpac".to_string()
}

fn default_model_entry() -> String {
    "model.xml".to_string()
}

fn default_manifest_entry() -> String {
    "origin.xml".to_string()
}

impl EditorConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            EditorError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: EditorConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| EditorError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// URI under which the manifest records the model checksum
    pub fn model_uri(&self) -> String {
        format!("/{}", self.model_entry.trim_start_matches('/'))
    }
}
