//! Domain models for ccron
//!
//! Contains the schedule transform and every audit check, without any I/O
//! concerns. Storage loads the inputs; the CLI renders the results.

mod audit;
mod cell;
mod coding;
mod macroflow;
mod normalize;
mod overlap;
mod pipeline;
mod predecessor;
mod propagate;
mod record;
mod resolve;
mod rules;
mod table;
mod task;

pub use audit::{AuditOptions, AuditReport, Auditor, GAPS_CHECK, OVERLAPS_CHECK};
pub use cell::Cell;
pub use coding::{split_location_literal, HierarchicalCoder};
pub use macroflow::{
    MacroflowReconciler, MismatchKind, MismatchRecord, PredecessorMap, ReferenceFlow, Relation,
    TemplateRow, NOT_FOUND,
};
pub use normalize::{RecordNormalizer, DATE_FORMAT};
pub use overlap::{
    is_analyzed, overlaps, Gap, OverlapGapAnalyzer, OverlapGapReport, OverlapPair,
    DEFAULT_GAP_THRESHOLD,
};
pub use pipeline::TransformPipeline;
pub use predecessor::{parse_predecessors, parse_relation, PredecessorToken, TokenError};
pub use propagate::{forward_fill, ForwardPropagator};
pub use record::RawRecord;
pub use resolve::{CrossReference, CrossReferenceEntry, ServiceCodeResolver};
pub use rules::{Rule, RuleSet, TaskRule};
pub use table::{GapRow, OverlapRow, TableFormatter};
pub use task::{ServiceType, Task, TaskId};
