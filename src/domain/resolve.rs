//! Final identifier composition
//!
//! The third pipeline pass builds the general id, the service type and the
//! coding id. Coding ids come from a cross-reference table that maps a service
//! name to a coding template such as `XX.YY.01.01.001`.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::cell::Cell;
use super::task::{ServiceType, Task};

/// Placeholder in coding templates that is replaced by the block code
pub const BLOCK_PLACEHOLDER: &str = "XX";

/// Outline level of infrastructure service rows
pub const INFRA_SERVICE_LEVEL: u32 = 6;

/// One row of the cross-reference table
///
/// Cells stay loosely typed: a blank or numeric coding is a lookup miss or a
/// rendered number, never a load failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossReferenceEntry {
    #[serde(alias = "Services", alias = "Serviço")]
    pub service: Cell,

    #[serde(alias = "Codificação")]
    pub coding: Cell,
}

/// Read-only service name → coding template lookup
#[derive(Debug, Clone, Default)]
pub struct CrossReference {
    templates: HashMap<String, String>,
}

impl CrossReference {
    /// Builds the table; the first entry for a service wins
    ///
    /// Rows missing either the service or the coding are skipped.
    pub fn from_entries(entries: impl IntoIterator<Item = CrossReferenceEntry>) -> Self {
        let mut templates = HashMap::new();
        for entry in entries {
            if let (Some(service), Some(coding)) =
                (entry.service.present_text(), entry.coding.present_text())
            {
                templates.entry(service).or_insert(coding);
            }
        }
        Self { templates }
    }

    /// Returns the coding template for a service
    pub fn template(&self, service: &str) -> Option<&str> {
        self.templates.get(service).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// Joins the present location codes, module first
pub fn general_id(module: Option<&str>, block: Option<&str>, floor: Option<&str>) -> Option<String> {
    let parts: Vec<&str> = [module, block, floor].into_iter().flatten().collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("-"))
    }
}

/// Composes `<block>.<floor>.<suffix>` from a general id and a coding template
///
/// The two components after the module lose their dots (`B.01` → `B01`); the
/// suffix is the template's last dot segment.
pub fn compose_coding_id(general_id: &str, has_module: bool, template: &str) -> Option<String> {
    let skip = usize::from(has_module);
    let mut locations = general_id.split('-').skip(skip);
    let block = locations.next()?.replace('.', "");
    let floor = locations.next()?.replace('.', "");
    let suffix = template.rsplit('.').next()?;
    Some(format!("{}.{}.{}", block, floor, suffix))
}

/// Third pipeline pass
#[derive(Debug, Clone)]
pub struct ServiceCodeResolver {
    cross_reference: Arc<CrossReference>,
}

impl ServiceCodeResolver {
    pub fn new(cross_reference: Arc<CrossReference>) -> Self {
        Self { cross_reference }
    }

    /// Sets general id, service type and coding id on every task
    pub fn resolve(&self, tasks: Vec<Task>) -> Vec<Task> {
        tasks.into_iter().map(|task| self.resolve_one(task)).collect()
    }

    fn resolve_one(&self, mut task: Task) -> Task {
        let module = task.module_code.as_deref();
        let block = task.block_code.as_deref();
        let floor = task.floor_code.as_deref();

        task.general_id = general_id(module, block, floor);
        task.service_type = ServiceType::classify(block, floor);

        let template = self
            .cross_reference
            .template(&task.service_name)
            .map(String::from);

        let coding_id = match (&template, task.service_type) {
            (template, ServiceType::Asc) => template.clone(),
            (Some(template), _) => task
                .general_id
                .as_deref()
                .and_then(|id| compose_coding_id(id, module.is_some(), template)),
            (None, _) => None,
        };

        let infra_service = task.is_infra == Some(true) && task.at_level(INFRA_SERVICE_LEVEL);
        task.coding_id = match (&template, block) {
            (Some(template), Some(block)) if infra_service => {
                Some(template.replace(BLOCK_PLACEHOLDER, &block.replace('.', "")))
            }
            _ => coding_id,
        };

        task.coding_template = template;
        task
    }
}
