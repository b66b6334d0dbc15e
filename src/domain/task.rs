//! Task domain model
//!
//! A [`Task`] is a normalized schedule row plus every field derived from it by
//! the transform pipeline: hierarchical codes, the service it belongs to and
//! its final coding identifier.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifier assigned to a task by the scheduling tool
pub type TaskId = i64;

/// Deepest outline level that carries a synthetic level label
pub const MAX_LABEL_LEVEL: usize = 7;

/// Classification of a task by the location codes it carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum ServiceType {
    /// Neither a block nor a floor: site-wide work
    #[default]
    Asc,
    /// Block only: foundations and other below-grade work
    Infra,
    /// Floor present: above-grade work
    Supra,
}

impl ServiceType {
    /// Classifies a task by the presence of block and floor codes
    pub fn classify(block_code: Option<&str>, floor_code: Option<&str>) -> Self {
        match (block_code, floor_code) {
            (None, None) => ServiceType::Asc,
            (Some(_), None) => ServiceType::Infra,
            _ => ServiceType::Supra,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Asc => "ASC",
            ServiceType::Infra => "INFRA",
            ServiceType::Supra => "SUPRA",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A normalized, coded schedule task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// 1-based position in the transformed sequence
    pub ordinal: usize,

    pub id: TaskId,
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<bool>,

    /// Raw predecessor field, e.g. `12;14TI+2d`
    #[serde(default)]
    pub predecessors: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outline_number: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outline_level: Option<u32>,

    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub actual_start: Option<NaiveDate>,
    pub actual_end: Option<NaiveDate>,

    pub duration_days: Option<f64>,
    pub work_hours: Option<f64>,
    pub weight: Option<f64>,

    /// Raw module field as exported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_field: Option<String>,

    /// Raw block field as exported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_field: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sap_task_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pep_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grouping: Option<String>,

    pub module_code: Option<String>,
    pub block_code: Option<String>,
    pub floor_code: Option<String>,
    pub is_infra: Option<bool>,

    /// Name with location qualifiers removed
    pub service_name: String,

    /// Synthetic labels for outline levels 1..=7 (index 0 is level 1)
    #[serde(default)]
    pub level_labels: Vec<Option<String>>,

    pub general_id: Option<String>,
    #[serde(default)]
    pub service_type: ServiceType,
    pub coding_template: Option<String>,
    pub coding_id: Option<String>,
}

impl Task {
    /// Creates a task with only identity fields set
    pub fn new(id: TaskId, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            ordinal: 0,
            id,
            service_name: name.clone(),
            name,
            active: None,
            summary: None,
            predecessors: String::new(),
            outline_number: None,
            outline_level: None,
            start: None,
            end: None,
            actual_start: None,
            actual_end: None,
            duration_days: None,
            work_hours: None,
            weight: None,
            module_field: None,
            block_field: None,
            network_id: None,
            sap_task_id: None,
            pep_id: None,
            grouping: None,
            module_code: None,
            block_code: None,
            floor_code: None,
            is_infra: None,
            level_labels: vec![None; MAX_LABEL_LEVEL],
            general_id: None,
            service_type: ServiceType::default(),
            coding_template: None,
            coding_id: None,
        }
    }

    /// Returns true if the task is flagged active in the export
    pub fn is_active(&self) -> bool {
        self.active == Some(true)
    }

    /// Returns true if the task is explicitly marked as a non-summary task
    pub fn is_leaf(&self) -> bool {
        self.summary == Some(false)
    }

    /// Returns true if the task sits at the given outline level
    pub fn at_level(&self, level: u32) -> bool {
        self.outline_level == Some(level)
    }

    /// Planned execution window, when both ends parsed
    pub fn window(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.start?, self.end?))
    }

    /// Label synthesized for an outline level (1-based)
    pub fn level_label(&self, level: usize) -> Option<&str> {
        level
            .checked_sub(1)
            .and_then(|i| self.level_labels.get(i))
            .and_then(|l| l.as_deref())
    }

    /// Returns true if the predecessor field carries no references
    pub fn has_no_predecessors(&self) -> bool {
        let p = self.predecessors.trim();
        p.is_empty() || p.eq_ignore_ascii_case("nan")
    }

    /// General id for display, falling back to the task id
    pub fn display_id(&self) -> String {
        self.general_id
            .clone()
            .unwrap_or_else(|| format!("#{}", self.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_service_type() {
        assert_eq!(ServiceType::classify(None, None), ServiceType::Asc);
        assert_eq!(ServiceType::classify(Some("B.01"), None), ServiceType::Infra);
        assert_eq!(ServiceType::classify(Some("B.01"), Some("P.02")), ServiceType::Supra);
        assert_eq!(ServiceType::classify(None, Some("P.02")), ServiceType::Supra);
    }

    #[test]
    fn service_type_serializes_uppercase() {
        let json = serde_json::to_string(&ServiceType::Supra).unwrap();
        assert_eq!(json, "\"SUPRA\"");
    }

    #[test]
    fn new_task_defaults() {
        let task = Task::new(3, "Alvenaria");
        assert_eq!(task.service_name, "Alvenaria");
        assert_eq!(task.level_labels.len(), MAX_LABEL_LEVEL);
        assert!(!task.is_active());
        assert!(task.has_no_predecessors());
        assert_eq!(task.display_id(), "#3");
    }

    #[test]
    fn window_requires_both_dates() {
        let mut task = Task::new(1, "X");
        task.start = NaiveDate::from_ymd_opt(2024, 1, 1);
        assert_eq!(task.window(), None);
        task.end = NaiveDate::from_ymd_opt(2024, 1, 5);
        assert!(task.window().is_some());
    }

    #[test]
    fn level_label_lookup() {
        let mut task = Task::new(1, "X");
        task.level_labels[2] = Some("Bloco 1".to_string());
        assert_eq!(task.level_label(3), Some("Bloco 1"));
        assert_eq!(task.level_label(0), None);
        assert_eq!(task.level_label(9), None);
    }

    #[test]
    fn nan_predecessors_count_as_empty() {
        let mut task = Task::new(1, "X");
        task.predecessors = "nan".to_string();
        assert!(task.has_no_predecessors());
        task.predecessors = "4".to_string();
        assert!(!task.has_no_predecessors());
    }
}
