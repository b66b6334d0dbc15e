//! Transform pipeline
//!
//! Chains the four transform stages:
//!
//! ```text
//! raw rows → RecordNormalizer → HierarchicalCoder → ForwardPropagator → ServiceCodeResolver
//! ```
//!
//! The pipeline only holds the shared, read-only cross-reference table. Every
//! call builds its own task list, so one pipeline can serve concurrent callers.

use std::sync::Arc;

use super::coding::HierarchicalCoder;
use super::normalize::RecordNormalizer;
use super::propagate::ForwardPropagator;
use super::record::RawRecord;
use super::resolve::{CrossReference, ServiceCodeResolver};
use super::task::Task;

#[derive(Debug, Clone)]
pub struct TransformPipeline {
    normalizer: RecordNormalizer,
    coder: HierarchicalCoder,
    propagator: ForwardPropagator,
    resolver: ServiceCodeResolver,
}

impl TransformPipeline {
    pub fn new(cross_reference: Arc<CrossReference>) -> Self {
        Self {
            normalizer: RecordNormalizer::new(),
            coder: HierarchicalCoder::new(),
            propagator: ForwardPropagator::new(),
            resolver: ServiceCodeResolver::new(cross_reference),
        }
    }

    /// Transforms raw rows into coded tasks, preserving row order
    pub fn run(&self, records: &[RawRecord]) -> Vec<Task> {
        let coded: Vec<Task> = records
            .iter()
            .filter_map(|record| self.normalizer.normalize(record))
            .map(|task| self.coder.code(task))
            .enumerate()
            .map(|(index, mut task)| {
                task.ordinal = index + 1;
                task
            })
            .collect();

        let propagated = self.propagator.propagate(coded);
        self.resolver.resolve(propagated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cell::Cell;
    use crate::domain::resolve::CrossReferenceEntry;
    use crate::domain::task::ServiceType;

    fn record(name: &str, level: i64, outline: &str) -> RawRecord {
        RawRecord {
            outline_number: Cell::from(outline),
            ..RawRecord::named(name, level)
        }
    }

    fn pipeline() -> TransformPipeline {
        TransformPipeline::new(Arc::new(CrossReference::from_entries(vec![
            CrossReferenceEntry {
                service: "Alvenaria".into(),
                coding: "XX.YY.02.01.007".into(),
            },
        ])))
    }

    fn schedule() -> Vec<RawRecord> {
        vec![
            record("Obra", 1, "1"),
            record("Módulo 1", 2, "1.1"),
            record("Bloco 1", 3, "1.1.1"),
            record("Estrutura", 4, "1.1.1.1"),
            record("Alvenaria", 6, "1.1.1.1.1.1"),
            record("P1 - Alvenaria", 7, "1.1.1.1.1.1.1"),
            record("LOJA 1", 7, "1.1.1.1.1.1.2"),
            record("P2 - Alvenaria", 7, "1.1.1.1.1.1.3"),
        ]
    }

    #[test]
    fn end_to_end_coding() {
        let tasks = pipeline().run(&schedule());

        assert_eq!(tasks.len(), 7);
        let p2 = &tasks[6];
        assert_eq!(p2.ordinal, 7);
        assert_eq!(p2.service_name, "Alvenaria");
        assert_eq!(p2.block_code.as_deref(), Some("B.01"));
        assert_eq!(p2.floor_code.as_deref(), Some("P.02"));
        assert_eq!(p2.general_id.as_deref(), Some("M.01-B.01-P.02"));
        assert_eq!(p2.service_type, ServiceType::Supra);
        assert_eq!(p2.coding_id.as_deref(), Some("B01.P02.007"));
        assert_eq!(p2.is_infra, Some(false));
        assert_eq!(p2.level_label(3), Some("Bloco 1"));
    }

    #[test]
    fn module_summary_row_has_no_block() {
        let tasks = pipeline().run(&schedule());
        assert_eq!(tasks[1].name, "Módulo 1");
        assert_eq!(tasks[1].block_code, None);
        assert_eq!(tasks[1].service_type, ServiceType::Asc);
    }

    #[test]
    fn empty_and_filtered_batches() {
        assert!(pipeline().run(&[]).is_empty());
        assert!(pipeline().run(&[RawRecord::named("nan", 1), RawRecord::default()]).is_empty());
    }

    #[test]
    fn repeated_runs_are_identical() {
        let pipeline = pipeline();
        let rows = schedule();
        assert_eq!(pipeline.run(&rows), pipeline.run(&rows));
    }
}
