//! Engine configuration via `reprise.toml`
//!
//! A driver may keep a `reprise.toml` next to its data and load it with
//! [`EngineConfig::from_file`]. Every field has a default, so an empty file
//! is a valid configuration.

use reprise_core::{RepriseError, RepriseResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Config file name conventionally used by drivers.
pub const CONFIG_FILE_NAME: &str = "reprise.toml";

/// Default bound on nested resumes started from inside an activation.
pub const DEFAULT_MAX_RESUME_DEPTH: usize = 64;

/// What happens when a snapshot is resumed while another resume of the same
/// snapshot is still running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReentrancyPolicy {
    /// Reject with `RepriseError::Reentrancy`
    #[default]
    Forbid,
    /// Run the resumes side by side
    Allow,
}

/// Engine configuration loaded from `reprise.toml`.
///
/// # Example
///
/// ```toml
/// # "forbid" (default) or "allow"
/// reentrancy = "forbid"
/// max_resume_depth = 64
/// trace_bindings = false
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Reentrancy policy: `"forbid"` or `"allow"`.
    #[serde(default = "default_reentrancy_str")]
    pub reentrancy: String,
    /// Maximum depth of resumes nested inside running activations.
    #[serde(default = "default_max_resume_depth")]
    pub max_resume_depth: usize,
    /// Include captured bindings in capture logs.
    #[serde(default)]
    pub trace_bindings: bool,
}

fn default_reentrancy_str() -> String {
    "forbid".to_string()
}

fn default_max_resume_depth() -> usize {
    DEFAULT_MAX_RESUME_DEPTH
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reentrancy: default_reentrancy_str(),
            max_resume_depth: default_max_resume_depth(),
            trace_bindings: false,
        }
    }
}

impl EngineConfig {
    /// Config that lets one snapshot be resumed concurrently
    pub fn allowing_reentrancy() -> Self {
        Self {
            reentrancy: "allow".to_string(),
            ..Self::default()
        }
    }

    /// Parse the reentrancy string into a `ReentrancyPolicy`.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not `"forbid"` or `"allow"`.
    pub fn reentrancy_policy(&self) -> RepriseResult<ReentrancyPolicy> {
        match self.reentrancy.as_str() {
            "forbid" => Ok(ReentrancyPolicy::Forbid),
            "allow" => Ok(ReentrancyPolicy::Allow),
            other => Err(RepriseError::invalid_input(format!(
                "Invalid reentrancy policy '{}' in {}. Expected \"forbid\" or \"allow\".",
                other, CONFIG_FILE_NAME
            ))),
        }
    }

    /// Check every field.
    pub fn validate(&self) -> RepriseResult<()> {
        self.reentrancy_policy()?;
        if self.max_resume_depth == 0 {
            return Err(RepriseError::invalid_input(
                "max_resume_depth must be at least 1",
            ));
        }
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Reprise engine configuration
#
# Reentrancy policy: "forbid" (default) or "allow"
#   "forbid" = resuming a snapshot that is already being resumed fails
#   "allow"  = the same snapshot may be resumed concurrently
reentrancy = "forbid"

# Maximum depth of resumes started from inside a running activation.
max_resume_depth = 64

# Log the captured bindings at debug level on every capture (default: false)
trace_bindings = false
"#
    }

    /// Parse and validate config from TOML text.
    pub fn from_toml_str(content: &str) -> RepriseResult<Self> {
        let config: EngineConfig = toml::from_str(content).map_err(|e| {
            RepriseError::invalid_input(format!("Failed to parse engine config: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> RepriseResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content).map_err(|e| match e {
            RepriseError::InvalidInput(msg) => {
                RepriseError::invalid_input(format!("{} ({})", msg, path.display()))
            }
            other => other,
        })
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> RepriseResult<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml())?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> RepriseResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| {
            RepriseError::invalid_input(format!("Failed to serialize config: {}", e))
        })?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.reentrancy, "forbid");
        assert_eq!(config.max_resume_depth, DEFAULT_MAX_RESUME_DEPTH);
        assert!(!config.trace_bindings);
        assert_eq!(config.reentrancy_policy().unwrap(), ReentrancyPolicy::Forbid);
    }

    #[test]
    fn test_default_toml_parses_to_default() {
        let config = EngineConfig::from_toml_str(EngineConfig::default_toml()).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_allow_policy() {
        let config = EngineConfig::from_toml_str("reentrancy = \"allow\"").unwrap();
        assert_eq!(config.reentrancy_policy().unwrap(), ReentrancyPolicy::Allow);
        assert_eq!(
            EngineConfig::allowing_reentrancy().reentrancy_policy().unwrap(),
            ReentrancyPolicy::Allow
        );
    }

    #[test]
    fn test_invalid_policy_rejected() {
        let err = EngineConfig::from_toml_str("reentrancy = \"sometimes\"").unwrap_err();
        assert!(err.to_string().contains("sometimes"));
    }

    #[test]
    fn test_zero_depth_rejected() {
        let err = EngineConfig::from_toml_str("max_resume_depth = 0").unwrap_err();
        assert!(matches!(err, RepriseError::InvalidInput(_)));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        assert!(EngineConfig::from_toml_str("reentrancy = ").is_err());
    }

    #[test]
    fn test_write_default_if_missing_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        EngineConfig::write_default_if_missing(&path).unwrap();
        assert!(path.exists());
        let config = EngineConfig::from_file(&path).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_write_default_if_missing_keeps_existing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "reentrancy = \"allow\"\n").unwrap();

        EngineConfig::write_default_if_missing(&path).unwrap();
        let config = EngineConfig::from_file(&path).unwrap();
        assert_eq!(config.reentrancy, "allow");
    }

    #[test]
    fn test_write_to_file_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let config = EngineConfig {
            reentrancy: "allow".to_string(),
            max_resume_depth: 8,
            trace_bindings: true,
        };
        config.write_to_file(&path).unwrap();
        assert_eq!(EngineConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_from_file_missing_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = EngineConfig::from_file(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, RepriseError::Io(_)));
    }

    #[test]
    fn test_from_file_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "max_resume_depth = 0\n").unwrap();
        let err = EngineConfig::from_file(&path).unwrap_err();
        assert!(err.to_string().contains(CONFIG_FILE_NAME));
    }
}
