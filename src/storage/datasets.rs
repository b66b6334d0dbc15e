//! Static reference datasets and schedule input
//!
//! Two datasets drive an audit:
//!
//! | Dataset | Rows | Used by |
//! |---------|------|---------|
//! | Cross-reference | `{service, coding}` | transform pipeline |
//! | Reference template | `{id, activity, description_1/2, relation_1/2}` | macro-flow check |
//!
//! Both may be JSON (array), JSON Lines or YAML, chosen by file extension.
//! Files are read under a shared lock so a concurrent writer never hands us a
//! half-written table. Schedule input is a JSON array or JSON Lines.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fs2::FileExt;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::domain::{CrossReference, CrossReferenceEntry, RawRecord, ReferenceFlow, TemplateRow};

/// Hex digits kept from the dataset hash
const FINGERPRINT_LEN: usize = 12;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("No {0} configured. Pass it on the command line or set it in .ccron/config.toml")]
    NotConfigured(&'static str),

    #[error("Dataset not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Unsupported dataset format for {0} (expected .json, .jsonl or .yaml)")]
    UnsupportedFormat(PathBuf),

    #[error("Failed to parse {path} at row {row}: {message}")]
    Parse {
        path: PathBuf,
        row: usize,
        message: String,
    },
}

/// On-disk encoding of a dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    Json,
    JsonLines,
    Yaml,
}

impl DatasetFormat {
    /// Picks the format from the file extension
    pub fn from_path(path: &Path) -> Result<Self, DatasetError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match ext.as_deref() {
            Some("json") => Ok(Self::Json),
            Some("jsonl") | Some("ndjson") => Ok(Self::JsonLines),
            Some("yaml") | Some("yml") => Ok(Self::Yaml),
            _ => Err(DatasetError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

/// Reads a whole file while holding a shared lock
fn read_locked(path: &Path) -> Result<String, DatasetError> {
    let unreadable = |source| DatasetError::Unreadable {
        path: path.to_path_buf(),
        source,
    };

    if !path.exists() {
        return Err(DatasetError::NotFound(path.to_path_buf()));
    }

    let mut file = File::open(path).map_err(unreadable)?;
    FileExt::lock_shared(&file).map_err(unreadable)?;

    let mut content = String::new();
    file.read_to_string(&mut content).map_err(unreadable)?;

    // Lock is released when file is dropped
    Ok(content)
}

/// Parses rows of `T` from text in the given format
pub fn parse_rows<T: DeserializeOwned>(
    content: &str,
    format: DatasetFormat,
    path: &Path,
) -> Result<Vec<T>, DatasetError> {
    let parse_error = |row: usize, message: String| DatasetError::Parse {
        path: path.to_path_buf(),
        row,
        message,
    };

    match format {
        DatasetFormat::Json => {
            serde_json::from_str(content).map_err(|e| parse_error(e.line(), e.to_string()))
        }
        DatasetFormat::Yaml => serde_yaml::from_str(content).map_err(|e| {
            let row = e.location().map(|l| l.line()).unwrap_or(0);
            parse_error(row, e.to_string())
        }),
        DatasetFormat::JsonLines => content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| {
                serde_json::from_str(line).map_err(|e| parse_error(index + 1, e.to_string()))
            })
            .collect(),
    }
}

/// Loads rows of `T` from a dataset file
pub fn load_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, DatasetError> {
    let format = DatasetFormat::from_path(path)?;
    let content = read_locked(path)?;
    parse_rows(&content, format, path)
}

/// Loads the cross-reference table
pub fn load_cross_reference(path: &Path) -> Result<CrossReference, DatasetError> {
    let entries: Vec<CrossReferenceEntry> = load_rows(path)?;
    Ok(CrossReference::from_entries(entries))
}

/// Loads the reference template into its predecessor graph
pub fn load_reference_flow(path: &Path) -> Result<ReferenceFlow, DatasetError> {
    let rows: Vec<TemplateRow> = load_rows(path)?;
    Ok(ReferenceFlow::from_rows(&rows))
}

/// Short content hash over one or more files, in the given order
pub fn fingerprint(paths: &[&Path]) -> Result<String, DatasetError> {
    let mut hasher = blake3::Hasher::new();
    for path in paths {
        hasher.update(read_locked(path)?.as_bytes());
    }
    Ok(hasher.finalize().to_hex()[..FINGERPRINT_LEN].to_string())
}

/// Read-only reference data shared by every audit
#[derive(Debug, Clone)]
pub struct ReferenceData {
    pub cross_reference: Arc<CrossReference>,
    pub flow: Arc<ReferenceFlow>,
    pub fingerprint: String,
}

impl ReferenceData {
    /// Loads both datasets; either one missing is an error
    pub fn load(
        cross_reference: Option<&Path>,
        template: Option<&Path>,
    ) -> Result<Self, DatasetError> {
        let cross_reference = cross_reference.ok_or(DatasetError::NotConfigured("cross-reference table"))?;
        let template = template.ok_or(DatasetError::NotConfigured("reference template"))?;

        Ok(Self {
            cross_reference: Arc::new(load_cross_reference(cross_reference)?),
            flow: Arc::new(load_reference_flow(template)?),
            fingerprint: fingerprint(&[cross_reference, template])?,
        })
    }
}

/// Reads raw schedule rows from a file, or stdin when the path is `-`
///
/// The content may be a JSON array of objects or one object per line.
pub fn read_schedule(path: &Path) -> Result<Vec<RawRecord>, DatasetError> {
    let content = if path == Path::new("-") {
        let mut content = String::new();
        io::stdin()
            .read_to_string(&mut content)
            .map_err(|source| DatasetError::Unreadable {
                path: path.to_path_buf(),
                source,
            })?;
        content
    } else {
        read_locked(path)?
    };

    let format = if content.trim_start().starts_with('[') {
        DatasetFormat::Json
    } else {
        DatasetFormat::JsonLines
    };
    parse_rows(&content, format, path)
}
