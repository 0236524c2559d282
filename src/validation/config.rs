//! Pipeline configuration.
//!
//! Configuration is plain serde data so it can live in a TOML file next to
//! whatever adapter drives the pipeline:
//!
//! ```toml
//! unknown_keys = "reject"
//! report_indent = 2
//! ```

use crate::core::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What a staged parse does with keys the target does not declare.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UnknownKeyPolicy {
    /// Report every undeclared key and leave the target untouched
    #[default]
    Reject,
    /// Stage undeclared string keys and commit them with the rest
    Keep,
}

/// Pipeline options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PipelineConfig {
    /// Handling of undeclared keys in `parse_into`.
    pub unknown_keys: UnknownKeyPolicy,
    /// Spaces before each line of a rendered error report.
    pub report_indent: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            unknown_keys: UnknownKeyPolicy::Reject,
            report_indent: 2,
        }
    }
}

impl PipelineConfig {
    /// Parse configuration from TOML text. Missing keys take defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.unknown_keys, UnknownKeyPolicy::Reject);
        assert_eq!(config.report_indent, 2);
        assert_eq!(PipelineConfig::from_toml_str("").unwrap(), config);
    }

    #[test]
    fn test_from_toml_str() {
        let config = PipelineConfig::from_toml_str("unknown_keys = \"keep\"\nreport_indent = 4\n").unwrap();
        assert_eq!(config.unknown_keys, UnknownKeyPolicy::Keep);
        assert_eq!(config.report_indent, 4);

        assert!(matches!(
            PipelineConfig::from_toml_str("unknown_keys = \"maybe\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "unknown_keys = \"keep\"").unwrap();
        let config = PipelineConfig::from_file(file.path()).unwrap();
        assert_eq!(config.unknown_keys, UnknownKeyPolicy::Keep);
        assert_eq!(config.report_indent, 2);

        let missing = PipelineConfig::from_file("/definitely/not/here.toml");
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }
}
