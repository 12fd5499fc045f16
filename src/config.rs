use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default project file name looked up by the CLI.
pub const DEFAULT_CONFIG_FILE: &str = "stitchgen.yaml";

#[derive(Debug, Deserialize, Default)]
pub struct ProjectConfig {
    /// Output root, relative to the config file.
    pub output: Option<String>,

    /// Primary placeholder values; each also gets its casing variants.
    #[serde(default)]
    pub placeholders: BTreeMap<String, String>,

    #[serde(default)]
    pub merge: MergeConfig,

    #[serde(default)]
    pub templates: Vec<TemplateSet>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct MergeConfig {
    /// Run the duplicate import / schema entry cleanup after merging.
    #[serde(default = "default_enabled")]
    pub cleanup: bool,
    /// Seed `ADD` markers into marker-less indexer files.
    #[serde(default = "default_enabled")]
    pub seed_indexer_markers: bool,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            cleanup: default_enabled(),
            seed_indexer_markers: default_enabled(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TemplateSet {
    pub name: Option<String>,
    /// Template document, relative to the config file.
    pub path: String,
    /// Output directory for this set, relative to the project output root.
    pub output: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Invalid placeholder assignment '{0}', expected KEY=VALUE")]
    InvalidAssignment(String),
}

impl ProjectConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Template sets that are switched on, with paths resolved against `base`.
    pub fn enabled_templates(&self, base: &Path) -> Vec<(PathBuf, Option<PathBuf>)> {
        self.templates
            .iter()
            .filter(|t| t.enabled)
            .map(|t| (base.join(&t.path), t.output.as_ref().map(PathBuf::from)))
            .collect()
    }
}

/// Parses a `KEY=VALUE` command line assignment.
pub fn parse_assignment(s: &str) -> Result<(String, String), ConfigError> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(ConfigError::InvalidAssignment(s.to_string())),
    }
}
