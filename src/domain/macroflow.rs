//! Macro-flow reconciliation
//!
//! Compares the predecessor logic of a baseline schedule against a reference
//! template. The template says which services must precede each service and
//! with what relation; the baseline is the schedule as actually planned.
//!
//! Services are compared by their location-free key, so `P1 - Alvenaria` in
//! the baseline and `Alvenaria` in the template are the same service. Only the
//! first occurrence of each service (by planned start) is checked.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use super::cell::Cell;
use super::coding::split_location_literal;
use super::predecessor::{parse_predecessors, parse_relation};
use super::task::Task;

/// Service key of a predecessor index that matches no baseline row
pub const NOT_FOUND: &str = "Not Found";

/// Outline level of the service rows that are reconciled
pub const BASELINE_LEVEL: u32 = 7;

/// One row of the reference template
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateRow {
    #[serde(alias = "ID")]
    pub id: Cell,

    #[serde(alias = "Atividade EAP Planejamento")]
    pub activity: Cell,

    #[serde(alias = "Descrição #1")]
    pub description_1: Cell,

    #[serde(alias = "Descrição #2")]
    pub description_2: Cell,

    #[serde(alias = "Tipo #1")]
    pub relation_1: Cell,

    #[serde(alias = "Tipo #2")]
    pub relation_2: Cell,
}

/// Dependency type and lag between two services
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub kind: String,
    pub offset: i64,
}

impl Relation {
    pub fn new(kind: impl Into<String>, offset: i64) -> Self {
        Self {
            kind: kind.into(),
            offset,
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.offset == 0 {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}{:+}d", self.kind, self.offset)
        }
    }
}

/// Predecessor service → relation, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PredecessorMap {
    entries: Vec<(String, Relation)>,
}

impl PredecessorMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the relation for a predecessor; an existing key keeps its position
    pub fn insert(&mut self, service: impl Into<String>, relation: Relation) {
        let service = service.into();
        match self.entries.iter_mut().find(|(key, _)| *key == service) {
            Some((_, existing)) => *existing = relation,
            None => self.entries.push((service, relation)),
        }
    }

    /// Adds a predecessor unless it is already present
    pub fn insert_if_absent(&mut self, service: impl Into<String>, relation: Relation) {
        let service = service.into();
        if !self.contains_key(&service) {
            self.entries.push((service, relation));
        }
    }

    pub fn get(&self, service: &str) -> Option<&Relation> {
        self.entries
            .iter()
            .find(|(key, _)| key == service)
            .map(|(_, relation)| relation)
    }

    pub fn contains_key(&self, service: &str) -> bool {
        self.get(service).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Relation)> {
        self.entries.iter().map(|(key, relation)| (key.as_str(), relation))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for PredecessorMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, relation) in &self.entries {
            map.serialize_entry(key, relation)?;
        }
        map.end()
    }
}

/// Reference predecessor graph built from the template
///
/// Edges point from predecessor to service and keep template order.
#[derive(Debug, Clone, Default)]
pub struct ReferenceFlow {
    graph: DiGraph<String, Relation>,
    node_map: HashMap<String, NodeIndex>,
}

impl ReferenceFlow {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_map: HashMap::new(),
        }
    }

    /// Builds the graph from template rows
    ///
    /// Rows without an identifier or activity are skipped, as are rows where
    /// a predecessor names the service itself.
    pub fn from_rows<'a>(rows: impl IntoIterator<Item = &'a TemplateRow>) -> Self {
        let mut flow = Self::new();

        for row in rows {
            if row.id.is_null() {
                continue;
            }
            let Some(service) = row.activity.present_text().map(|a| split_location_literal(&a))
            else {
                continue;
            };

            let slots = [
                (row.description_1.present_text(), row.relation_1.present_text()),
                (row.description_2.present_text(), row.relation_2.present_text()),
            ]
            .map(|(predecessor, relation)| (predecessor.map(|p| split_location_literal(&p)), relation));

            if slots.iter().any(|(predecessor, _)| predecessor.as_deref() == Some(service.as_str())) {
                continue;
            }

            for (predecessor, relation) in slots {
                if let (Some(predecessor), Some(relation)) = (predecessor, relation) {
                    let (kind, offset) = parse_relation(&relation);
                    flow.add_edge(&predecessor, &service, Relation::new(kind, offset));
                }
            }
        }

        flow
    }

    /// Adds a service node if not already present
    pub fn add_service(&mut self, service: &str) -> NodeIndex {
        if let Some(&idx) = self.node_map.get(service) {
            return idx;
        }
        let idx = self.graph.add_node(service.to_string());
        self.node_map.insert(service.to_string(), idx);
        idx
    }

    /// Adds a predecessor → service edge
    pub fn add_edge(&mut self, predecessor: &str, service: &str, relation: Relation) {
        let from = self.add_service(predecessor);
        let to = self.add_service(service);
        self.graph.add_edge(from, to, relation);
    }

    /// Reference predecessors of a service; the first edge per predecessor wins
    pub fn predecessors_of(&self, service: &str) -> PredecessorMap {
        let mut map = PredecessorMap::new();
        let Some(&idx) = self.node_map.get(service) else {
            return map;
        };

        let mut edges: Vec<_> = self
            .graph
            .edges_directed(idx, Direction::Incoming)
            .collect();
        edges.sort_by_key(|edge| edge.id().index());

        for edge in edges {
            map.insert_if_absent(self.graph[edge.source()].clone(), edge.weight().clone());
        }
        map
    }

    pub fn contains(&self, service: &str) -> bool {
        self.node_map.contains_key(service)
    }

    pub fn service_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

/// Kind of discrepancy between reference and baseline predecessors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchKind {
    Missing,
    Added,
    TypeMismatch,
    OffsetMismatch,
    Substitution,
}

impl MismatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MismatchKind::Missing => "missing",
            MismatchKind::Added => "added",
            MismatchKind::TypeMismatch => "type_mismatch",
            MismatchKind::OffsetMismatch => "offset_mismatch",
            MismatchKind::Substitution => "substitution",
        }
    }
}

impl fmt::Display for MismatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One discrepancy found for a baseline service
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MismatchRecord {
    /// Baseline ordinal of the checked task
    pub ordinal: usize,
    pub service: String,
    pub kind: MismatchKind,
    pub description: String,
    pub reference: PredecessorMap,
    pub baseline: PredecessorMap,
}

/// First occurrence of each service at the baseline level, by planned start
pub fn first_occurrences(tasks: &[Task]) -> Vec<(&Task, String)> {
    let mut level_tasks: Vec<&Task> = tasks.iter().filter(|t| t.at_level(BASELINE_LEVEL)).collect();
    level_tasks.sort_by_key(|t| (t.start.is_none(), t.start));

    let mut seen = HashSet::new();
    level_tasks
        .into_iter()
        .map(|task| (task, split_location_literal(&task.name)))
        .filter(|(_, key)| seen.insert(key.clone()))
        .collect()
}

/// Checks baseline predecessors against the reference flow
#[derive(Debug, Clone)]
pub struct MacroflowReconciler {
    flow: Arc<ReferenceFlow>,
}

impl MacroflowReconciler {
    pub fn new(flow: Arc<ReferenceFlow>) -> Self {
        Self { flow }
    }

    /// Returns every mismatch, ordered by service
    pub fn reconcile(&self, tasks: &[Task]) -> Vec<MismatchRecord> {
        let by_ordinal: HashMap<usize, String> = tasks
            .iter()
            .map(|t| (t.ordinal, split_location_literal(&t.name)))
            .collect();

        let mut records = Vec::new();
        for (task, service) in first_occurrences(tasks) {
            let mut baseline = PredecessorMap::new();
            for token in parse_predecessors(&task.predecessors) {
                let predecessor = by_ordinal
                    .get(&token.index)
                    .cloned()
                    .unwrap_or_else(|| NOT_FOUND.to_string());
                baseline.insert(predecessor, Relation::new(token.relation, token.offset));
            }

            let reference = self.flow.predecessors_of(&service);
            records.extend(compare(task.ordinal, &service, &reference, &baseline));
        }

        records.sort_by(|a, b| a.service.cmp(&b.service));
        records
    }
}

/// Classifies the differences between one node's two predecessor maps
pub fn compare(
    ordinal: usize,
    service: &str,
    reference: &PredecessorMap,
    baseline: &PredecessorMap,
) -> Vec<MismatchRecord> {
    let record = |kind, description| MismatchRecord {
        ordinal,
        service: service.to_string(),
        kind,
        description,
        reference: reference.clone(),
        baseline: baseline.clone(),
    };

    let mut records = Vec::new();
    let mut substituted = false;

    for (key, expected) in reference.iter() {
        match baseline.get(key) {
            None => {
                let replacement = baseline.keys().filter(|k| !reference.contains_key(k)).last();
                match replacement {
                    Some(replacement) => {
                        substituted = true;
                        records.push(record(
                            MismatchKind::Substitution,
                            format!("Predecessor {} replaced by {}.", key, replacement),
                        ));
                    }
                    None => records.push(record(
                        MismatchKind::Missing,
                        format!("Missing predecessor {}.", key),
                    )),
                }
            }
            Some(actual) if actual.kind != expected.kind => records.push(record(
                MismatchKind::TypeMismatch,
                format!("Wrong relation type on predecessor {}.", key),
            )),
            Some(actual) if actual.offset != expected.offset => records.push(record(
                MismatchKind::OffsetMismatch,
                format!("Wrong offset on predecessor {}.", key),
            )),
            Some(_) => {}
        }
    }

    if !substituted {
        for key in baseline.keys() {
            if key != NOT_FOUND && !reference.contains_key(key) {
                records.push(record(
                    MismatchKind::Added,
                    format!("Predecessor {} added to service {}.", key, service),
                ));
            }
        }
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(id: i64, activity: &str, slot_1: Option<(&str, &str)>, slot_2: Option<(&str, &str)>) -> TemplateRow {
        TemplateRow {
            id: Cell::from(id),
            activity: Cell::from(activity),
            description_1: Cell::from(slot_1.map(|(d, _)| d)),
            relation_1: Cell::from(slot_1.map(|(_, r)| r)),
            description_2: Cell::from(slot_2.map(|(d, _)| d)),
            relation_2: Cell::from(slot_2.map(|(_, r)| r)),
        }
    }

    fn baseline_task(ordinal: usize, name: &str, start: &str, predecessors: &str) -> Task {
        let mut task = Task::new(ordinal as i64, name);
        task.ordinal = ordinal;
        task.outline_level = Some(BASELINE_LEVEL);
        task.start = NaiveDate::parse_from_str(start, "%Y-%m-%d").ok();
        task.predecessors = predecessors.to_string();
        task
    }

    fn flow(rows: &[TemplateRow]) -> Arc<ReferenceFlow> {
        Arc::new(ReferenceFlow::from_rows(rows))
    }

    fn kinds(records: &[MismatchRecord]) -> Vec<(&str, MismatchKind)> {
        records.iter().map(|r| (r.service.as_str(), r.kind)).collect()
    }

    #[test]
    fn template_edges() {
        let flow = ReferenceFlow::from_rows(&[
            row(1, "Reboco", Some(("Alvenaria", "TI+2d")), Some(("Instalações", "II"))),
            row(2, "Pintura", Some(("P1 - Reboco", "TI")), None),
        ]);

        assert_eq!(flow.edge_count(), 3);
        let reboco = flow.predecessors_of("Reboco");
        assert_eq!(reboco.get("Alvenaria"), Some(&Relation::new("TI", 2)));
        assert_eq!(reboco.get("Instalações"), Some(&Relation::new("II", 0)));
        assert!(flow.predecessors_of("Pintura").contains_key("Reboco"));
    }

    #[test]
    fn template_skips_rows_without_id_and_self_loops() {
        let mut no_id = row(1, "Reboco", Some(("Alvenaria", "TI")), None);
        no_id.id = Cell::Null;
        let self_loop = row(2, "Pintura", Some(("Pintura", "TI")), Some(("Reboco", "TI")));

        let flow = ReferenceFlow::from_rows(&[no_id, self_loop]);
        assert_eq!(flow.edge_count(), 0);
        assert!(!flow.contains("Pintura"));
    }

    #[test]
    fn slot_without_relation_emits_no_edge() {
        let flow = ReferenceFlow::from_rows(&[row(1, "Reboco", Some(("Alvenaria", "")), None)]);
        assert_eq!(flow.edge_count(), 0);
    }

    #[test]
    fn first_reference_edge_wins() {
        let flow = ReferenceFlow::from_rows(&[
            row(1, "Reboco", Some(("Alvenaria", "TI")), None),
            row(2, "Reboco", Some(("Alvenaria", "II+1")), None),
        ]);
        let reboco = flow.predecessors_of("Reboco");
        assert_eq!(reboco.len(), 1);
        assert_eq!(reboco.get("Alvenaria"), Some(&Relation::new("TI", 0)));
    }

    #[test]
    fn baseline_map_keeps_first_position() {
        let mut map = PredecessorMap::new();
        map.insert("A", Relation::new("TI", 0));
        map.insert("B", Relation::new("TI", 0));
        map.insert("A", Relation::new("II", 1));

        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["A", "B"]);
        assert_eq!(map.get("A"), Some(&Relation::new("II", 1)));
    }

    #[test]
    fn matching_predecessors_produce_nothing() {
        let reconciler = MacroflowReconciler::new(flow(&[row(1, "Reboco", Some(("Alvenaria", "TI")), None)]));
        let tasks = vec![
            baseline_task(1, "P1 - Alvenaria", "2024-01-01", ""),
            baseline_task(2, "P1 - Reboco", "2024-01-10", "1"),
        ];
        assert!(reconciler.reconcile(&tasks).is_empty());
    }

    #[test]
    fn missing_predecessor() {
        let reconciler = MacroflowReconciler::new(flow(&[row(
            1,
            "Reboco",
            Some(("Alvenaria", "TI")),
            Some(("Instalações", "TI")),
        )]));
        let tasks = vec![
            baseline_task(1, "P1 - Alvenaria", "2024-01-01", ""),
            baseline_task(2, "P1 - Reboco", "2024-01-10", "1"),
        ];

        let records = reconciler.reconcile(&tasks);
        assert_eq!(kinds(&records), vec![("Reboco", MismatchKind::Missing)]);
        assert_eq!(records[0].description, "Missing predecessor Instalações.");
    }

    #[test]
    fn substitution_suppresses_added() {
        let reconciler = MacroflowReconciler::new(flow(&[row(1, "Reboco", Some(("Alvenaria", "TI")), None)]));
        let tasks = vec![
            baseline_task(1, "P1 - Chapisco", "2024-01-01", ""),
            baseline_task(2, "P1 - Reboco", "2024-01-10", "1"),
        ];

        let records = reconciler.reconcile(&tasks);
        assert_eq!(kinds(&records), vec![("Reboco", MismatchKind::Substitution)]);
        assert_eq!(records[0].description, "Predecessor Alvenaria replaced by Chapisco.");
    }

    #[test]
    fn blank_predecessors_count_as_unresolved() {
        let reconciler = MacroflowReconciler::new(flow(&[row(1, "Reboco", Some(("Alvenaria", "TI")), None)]));
        let tasks = vec![baseline_task(1, "P1 - Reboco", "2024-01-10", "")];

        let records = reconciler.reconcile(&tasks);
        assert_eq!(kinds(&records), vec![("Reboco", MismatchKind::Substitution)]);
    }

    #[test]
    fn unresolved_index_counts_for_substitution() {
        let reconciler = MacroflowReconciler::new(flow(&[row(1, "Reboco", Some(("Alvenaria", "TI")), None)]));
        let tasks = vec![baseline_task(1, "P1 - Reboco", "2024-01-10", "40")];

        let records = reconciler.reconcile(&tasks);
        assert_eq!(kinds(&records), vec![("Reboco", MismatchKind::Substitution)]);
        assert!(records[0].description.ends_with("replaced by Not Found."));
    }

    #[test]
    fn type_and_offset_mismatches() {
        let reconciler = MacroflowReconciler::new(flow(&[row(
            1,
            "Reboco",
            Some(("Alvenaria", "TI+2d")),
            Some(("Instalações", "TI")),
        )]));
        let tasks = vec![
            baseline_task(1, "P1 - Alvenaria", "2024-01-01", ""),
            baseline_task(2, "P1 - Instalações", "2024-01-02", ""),
            baseline_task(3, "P1 - Reboco", "2024-01-10", "1TI+5d;2II"),
        ];

        let records = reconciler.reconcile(&tasks);
        let reboco: Vec<_> = records.iter().filter(|r| r.service == "Reboco").map(|r| r.kind).collect();
        assert_eq!(reboco, vec![MismatchKind::OffsetMismatch, MismatchKind::TypeMismatch]);
    }

    #[test]
    fn added_predecessor_excludes_not_found() {
        let reconciler = MacroflowReconciler::new(flow(&[]));
        let tasks = vec![
            baseline_task(1, "P1 - Alvenaria", "2024-01-01", ""),
            baseline_task(2, "P1 - Reboco", "2024-01-10", "1;99"),
        ];

        let records = reconciler.reconcile(&tasks);
        assert_eq!(kinds(&records), vec![("Reboco", MismatchKind::Added)]);
        assert_eq!(records[0].description, "Predecessor Alvenaria added to service Reboco.");
    }

    #[test]
    fn only_first_occurrence_is_checked() {
        let reconciler = MacroflowReconciler::new(flow(&[row(1, "Reboco", Some(("Alvenaria", "TI")), None)]));
        let tasks = vec![
            baseline_task(1, "P1 - Alvenaria", "2024-01-01", ""),
            baseline_task(2, "P2 - Reboco", "2024-02-10", ""),
            baseline_task(3, "P1 - Reboco", "2024-01-10", "1"),
        ];
        assert!(reconciler.reconcile(&tasks).is_empty());
    }

    #[test]
    fn undated_tasks_sort_last() {
        let mut undated = baseline_task(1, "P1 - Reboco", "", "");
        undated.start = None;
        let dated = baseline_task(2, "P2 - Reboco", "2024-03-01", "");
        let tasks = vec![undated, dated];

        let first = first_occurrences(&tasks);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].0.ordinal, 2);
    }

    #[test]
    fn records_sorted_by_service() {
        let reconciler = MacroflowReconciler::new(flow(&[
            row(1, "Reboco", Some(("Alvenaria", "TI")), None),
            row(2, "Forro", Some(("Alvenaria", "TI")), None),
        ]));
        let tasks = vec![
            baseline_task(1, "P1 - Reboco", "2024-01-01", ""),
            baseline_task(2, "P1 - Forro", "2024-01-05", ""),
        ];
        let services: Vec<_> = reconciler.reconcile(&tasks).into_iter().map(|r| r.service).collect();
        assert_eq!(services, vec!["Forro", "Reboco"]);
    }

    #[test]
    fn relation_display() {
        assert_eq!(Relation::new("TI", 0).to_string(), "TI");
        assert_eq!(Relation::new("TI", 2).to_string(), "TI+2d");
        assert_eq!(Relation::new("II", -3).to_string(), "II-3d");
    }
}
