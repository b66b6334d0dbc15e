//! Per-invocation settings shared by the analysis commands
//!
//! Dataset paths come from, in order: command-line flags, the project config
//! (or the file given with `--config`), then the global config.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use super::output::Output;
use crate::domain::{CrossReference, RawRecord};
use crate::storage::{load_cross_reference, read_schedule, Config, DatasetError, ReferenceData};

fn display_path(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| "(not configured)".to_string())
}

pub struct Session {
    config: Config,
    cross_reference: Option<PathBuf>,
    template: Option<PathBuf>,
}

impl Session {
    /// Resolves configuration for this run
    ///
    /// An explicit config file replaces project discovery.
    pub fn load(
        config_file: Option<&Path>,
        cross_reference: Option<PathBuf>,
        template: Option<PathBuf>,
    ) -> Result<Self> {
        let config = match config_file {
            Some(path) => Config::from_file(path)
                .with_context(|| format!("Failed to load config: {}", path.display()))?,
            None => Config::load()?,
        };

        Ok(Self {
            config,
            cross_reference,
            template,
        })
    }

    /// Reports where the configuration came from
    pub fn describe(&self, output: &Output) {
        match &self.config.project_root {
            Some(root) => output.verbose_ctx("config", &format!("Project root: {}", root.display())),
            None => output.verbose_ctx("config", "No project config discovered"),
        }
        output.verbose_ctx(
            "config",
            &format!(
                "Cross-reference: {}, template: {}",
                display_path(self.cross_reference_path()),
                display_path(self.template_path())
            ),
        );
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn cross_reference_path(&self) -> Option<&Path> {
        self.cross_reference
            .as_deref()
            .or_else(|| self.config.cross_reference_path())
    }

    fn template_path(&self) -> Option<&Path> {
        self.template
            .as_deref()
            .or_else(|| self.config.reference_template_path())
    }

    /// Gap threshold from the flag, else the config
    pub fn gap_threshold(&self, flag: Option<i64>) -> Result<i64> {
        let threshold = flag.unwrap_or(self.config.project.gap_threshold_days);
        if threshold < 0 {
            anyhow::bail!("Gap threshold must not be negative (got {})", threshold);
        }
        Ok(threshold)
    }

    /// Rule names disabled in the config
    pub fn disabled_rules(&self) -> &[String] {
        &self.config.project.rules.disabled
    }

    /// Loads the cross-reference table alone
    pub fn cross_reference(&self, output: &Output) -> Result<Arc<CrossReference>> {
        let path = self
            .cross_reference_path()
            .ok_or(DatasetError::NotConfigured("cross-reference table"))?;
        output.verbose_ctx("datasets", &format!("Loading cross-reference: {}", path.display()));

        let table = load_cross_reference(path)?;
        output.verbose_ctx("datasets", &format!("Loaded {} service codings", table.len()));
        Ok(Arc::new(table))
    }

    /// Loads both reference datasets
    pub fn reference_data(&self, output: &Output) -> Result<ReferenceData> {
        let data = ReferenceData::load(self.cross_reference_path(), self.template_path())?;
        output.verbose_ctx(
            "datasets",
            &format!(
                "Loaded {} service codings and {} reference edges (fingerprint {})",
                data.cross_reference.len(),
                data.flow.edge_count(),
                data.fingerprint
            ),
        );
        Ok(data)
    }

    /// Reads the schedule rows from a file or stdin
    pub fn schedule(&self, output: &Output, input: &Path) -> Result<Vec<RawRecord>> {
        let records = read_schedule(input)?;
        output.verbose_ctx(
            "input",
            &format!("Read {} rows from {}", records.len(), input.display()),
        );
        Ok(records)
    }
}
