//! # Storage Layer
//!
//! File access for ccron: configuration, the static reference datasets and
//! schedule input. Nothing here interprets schedule content.
//!
//! ## Formats
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Config | TOML | `.ccron/config.toml`, `~/.config/ccron/config.toml` |
//! | Cross-reference | JSON / JSONL / YAML | configured path |
//! | Reference template | JSON / JSONL / YAML | configured path |
//! | Schedule | JSON array or JSONL | command argument or stdin |
//!
//! ## Project Structure
//!
//! ```text
//! .ccron/
//! ├── config.toml           # Project configuration
//! └── reference/            # Conventional home of the reference datasets
//! ```
//!
//! ## Concurrency Safety
//!
//! Datasets are read under a shared `fs2` lock, released when the file
//! handle drops. Loaded data is immutable and shared through `Arc`.

mod config;
mod datasets;
mod project;

pub use config::{Config, ConfigError, GlobalConfig, OutputFormat, ProjectConfig, RulesConfig, PROJECT_DIR};
pub use datasets::{
    fingerprint, load_cross_reference, load_reference_flow, load_rows, read_schedule,
    DatasetError, DatasetFormat, ReferenceData,
};
pub use project::{Project, ProjectError};
