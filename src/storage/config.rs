//! Configuration handling for ccron
//!
//! Configuration is stored in `.ccron/config.toml` (project) and
//! `~/.config/ccron/config.toml` (global). Dataset paths in the project file
//! are relative to the `.ccron/` directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::DEFAULT_GAP_THRESHOLD;

/// Name of the per-project directory
pub const PROJECT_DIR: &str = ".ccron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Rule selection
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct RulesConfig {
    /// Rule names to skip during `audit`
    pub disabled: Vec<String>,
}

/// Project-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProjectConfig {
    /// Gaps longer than this many days are reported
    pub gap_threshold_days: i64,

    /// Service → coding template table
    pub cross_reference: Option<PathBuf>,

    /// Reference macro-flow template
    pub reference_template: Option<PathBuf>,

    pub rules: RulesConfig,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            gap_threshold_days: DEFAULT_GAP_THRESHOLD,
            cross_reference: None,
            reference_template: None,
            rules: RulesConfig::default(),
        }
    }
}

impl ProjectConfig {
    /// Rejects values no audit could run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gap_threshold_days < 0 {
            return Err(ConfigError::Invalid(format!(
                "gap_threshold_days must not be negative (got {})",
                self.gap_threshold_days
            )));
        }
        Ok(())
    }
}

/// Global user configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GlobalConfig {
    /// Default output format (text or json)
    pub default_format: OutputFormat,

    /// Fallback cross-reference table when a project names none
    pub cross_reference: Option<PathBuf>,

    /// Fallback reference template when a project names none
    pub reference_template: Option<PathBuf>,
}

/// Output format for commands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Combined configuration (global + project)
#[derive(Debug, Clone)]
pub struct Config {
    pub project: ProjectConfig,
    pub global: GlobalConfig,
    pub project_root: Option<PathBuf>,
}

impl Config {
    /// Loads configuration from default locations
    pub fn load() -> Result<Self> {
        let global = Self::load_global()?;
        let (project, project_root) = Self::load_project()?;

        Ok(Self {
            project,
            global,
            project_root,
        })
    }

    /// Loads configuration for a specific project
    pub fn for_project(project_root: &Path) -> Result<Self> {
        let global = Self::load_global()?;
        let project = Self::load_project_config(project_root)?;

        Ok(Self {
            project,
            global,
            project_root: Some(project_root.to_path_buf()),
        })
    }

    /// Loads an explicit project config file in place of the discovered one
    ///
    /// Relative dataset paths resolve against the file's directory.
    pub fn from_file(path: &Path) -> Result<Self> {
        let global = Self::load_global()?;
        let mut project = Self::parse_project_file(path)?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        project.cross_reference = project.cross_reference.map(|p| base.join(p));
        project.reference_template = project.reference_template.map(|p| base.join(p));

        Ok(Self {
            project,
            global,
            project_root: None,
        })
    }

    /// Returns the global config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "ccron", "ccron").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Loads global configuration
    fn load_global() -> Result<GlobalConfig> {
        let config_dir = match Self::global_config_dir() {
            Some(dir) => dir,
            None => return Ok(GlobalConfig::default()),
        };

        let config_path = config_dir.join("config.toml");
        if !config_path.exists() {
            return Ok(GlobalConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read global config: {}", config_path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse global config")
    }

    /// Finds and loads project configuration
    fn load_project() -> Result<(ProjectConfig, Option<PathBuf>)> {
        let project_root = Self::find_project_root();

        match project_root {
            Some(root) => {
                let config = Self::load_project_config(&root)?;
                Ok((config, Some(root)))
            }
            None => Ok((ProjectConfig::default(), None)),
        }
    }

    /// Loads project configuration from a specific root
    fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
        let project_dir = project_root.join(PROJECT_DIR);
        let config_path = project_dir.join("config.toml");

        if !config_path.exists() {
            return Ok(ProjectConfig::default());
        }

        let mut config = Self::parse_project_file(&config_path)?;
        config.cross_reference = config.cross_reference.map(|p| project_dir.join(p));
        config.reference_template = config.reference_template.map(|p| project_dir.join(p));
        Ok(config)
    }

    fn parse_project_file(config_path: &Path) -> Result<ProjectConfig> {
        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read project config: {}", config_path.display()))?;

        let config: ProjectConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse project config")?;
        config.validate()?;
        Ok(config)
    }

    /// Finds the project root by looking for `.ccron/` from the current directory up
    pub fn find_project_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        Self::find_project_root_from(&current)
    }

    /// Finds the project root by looking for `.ccron/` from `start` up
    pub fn find_project_root_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();

        loop {
            if current.join(PROJECT_DIR).is_dir() {
                return Some(current);
            }

            if !current.pop() {
                return None;
            }
        }
    }

    /// Returns true if we're in a ccron project
    pub fn is_in_project(&self) -> bool {
        self.project_root.is_some()
    }

    /// Effective cross-reference table path, project first
    pub fn cross_reference_path(&self) -> Option<&Path> {
        self.project
            .cross_reference
            .as_deref()
            .or(self.global.cross_reference.as_deref())
    }

    /// Effective reference template path, project first
    pub fn reference_template_path(&self) -> Option<&Path> {
        self.project
            .reference_template
            .as_deref()
            .or(self.global.reference_template.as_deref())
    }
}
