//! Project management
//!
//! A project is any directory holding a `.ccron/` folder: the audit settings
//! and, by convention, the reference datasets under `.ccron/reference/`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use super::config::PROJECT_DIR;
use super::Config;

const DEFAULT_CONFIG: &str = r#"# ccron configuration

# Gaps between consecutive occurrences of a service longer than this are reported
gap_threshold_days = 5

# Reference datasets, relative to this directory (.json, .jsonl or .yaml)
# cross_reference = "reference/cross_reference.yaml"
# reference_template = "reference/template.yaml"

[rules]
# Rule names to skip during `ccron audit`
disabled = []
"#;

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Not in a ccron project. Run 'ccron init' first.")]
    NotInProject,
}

/// A ccron project
pub struct Project {
    root: PathBuf,
    config: Config,
}

impl Project {
    /// Opens an existing project at the given path
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        if !root.join(PROJECT_DIR).is_dir() {
            return Err(ProjectError::NotInProject.into());
        }

        let config = Config::for_project(&root)?;

        Ok(Self { root, config })
    }

    /// Initializes a new project at the given path
    ///
    /// Existing files are left untouched, so running it twice is harmless.
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let project_dir = root.join(PROJECT_DIR);

        let reference_dir = project_dir.join("reference");
        fs::create_dir_all(&reference_dir).with_context(|| {
            format!(
                "Failed to create reference directory: {}",
                reference_dir.display()
            )
        })?;

        let config_path = project_dir.join("config.toml");
        if !config_path.exists() {
            fs::write(&config_path, DEFAULT_CONFIG)
                .with_context(|| format!("Failed to write config: {}", config_path.display()))?;
        }

        Self::open(root)
    }

    /// Returns the project root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the .ccron directory path
    pub fn project_dir(&self) -> PathBuf {
        self.root.join(PROJECT_DIR)
    }

    /// Returns the directory conventionally holding the reference datasets
    pub fn reference_dir(&self) -> PathBuf {
        self.project_dir().join("reference")
    }

    /// Returns the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}
