//! Full schedule audit
//!
//! Runs the transform pipeline once and feeds its output to every check:
//! overlap and gap analysis on the active tasks, macro-flow reconciliation
//! and the validation rules on all tasks.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::macroflow::{MacroflowReconciler, MismatchRecord, ReferenceFlow};
use super::overlap::{Gap, OverlapGapAnalyzer, OverlapPair, DEFAULT_GAP_THRESHOLD};
use super::pipeline::TransformPipeline;
use super::record::RawRecord;
use super::resolve::CrossReference;
use super::rules::RuleSet;
use super::table::{GapRow, OverlapRow, TableFormatter};
use super::task::{Task, TaskId};

/// Report key for tasks involved in a long gap
pub const GAPS_CHECK: &str = "gaps";

/// Report key for tasks involved in an overlap
pub const OVERLAPS_CHECK: &str = "overlaps";

/// Tunables for one audit
#[derive(Debug, Clone)]
pub struct AuditOptions {
    /// Date that "today" means for date-based rules
    pub as_of: NaiveDate,
    pub gap_threshold: i64,
    pub disabled_rules: Vec<String>,
}

impl AuditOptions {
    pub fn new(as_of: NaiveDate) -> Self {
        Self {
            as_of,
            gap_threshold: DEFAULT_GAP_THRESHOLD,
            disabled_rules: Vec::new(),
        }
    }
}

/// Everything found by one audit
#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    pub generated_at: DateTime<Utc>,
    pub as_of: NaiveDate,

    /// Fingerprint of the reference datasets the audit ran against
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_fingerprint: Option<String>,

    pub task_count: usize,
    pub active_count: usize,

    /// Flagged task ids per check name
    pub checks: BTreeMap<String, Vec<TaskId>>,

    pub overlaps: Vec<OverlapPair>,
    pub gaps: Vec<Gap>,
    pub overlap_table: Vec<OverlapRow>,
    pub gap_table: Vec<GapRow>,
    pub macroflow: Vec<MismatchRecord>,
}

impl AuditReport {
    /// Number of checks that flagged at least one task
    pub fn failing_checks(&self) -> usize {
        self.checks.values().filter(|ids| !ids.is_empty()).count()
    }

    /// Returns true if nothing was flagged anywhere
    pub fn is_clean(&self) -> bool {
        self.failing_checks() == 0 && self.macroflow.is_empty()
    }
}

/// Runs every check over one schedule
pub struct Auditor {
    pipeline: TransformPipeline,
    analyzer: OverlapGapAnalyzer,
    reconciler: MacroflowReconciler,
    formatter: TableFormatter,
    rules: RuleSet,
    as_of: NaiveDate,
    fingerprint: Option<String>,
}

impl Auditor {
    pub fn new(
        cross_reference: Arc<CrossReference>,
        flow: Arc<ReferenceFlow>,
        options: AuditOptions,
    ) -> Self {
        Self {
            pipeline: TransformPipeline::new(cross_reference),
            analyzer: OverlapGapAnalyzer::new(options.gap_threshold),
            reconciler: MacroflowReconciler::new(flow),
            formatter: TableFormatter::new(),
            rules: RuleSet::standard(options.as_of).without(&options.disabled_rules),
            as_of: options.as_of,
            fingerprint: None,
        }
    }

    /// Tags every report with the fingerprint of the loaded reference data
    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.fingerprint = Some(fingerprint.into());
        self
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Transforms the raw rows and audits the result
    pub fn audit(&self, records: &[RawRecord]) -> AuditReport {
        let tasks = self.pipeline.run(records);
        self.audit_tasks(&tasks)
    }

    /// Audits an already transformed task list
    pub fn audit_tasks(&self, tasks: &[Task]) -> AuditReport {
        let active: Vec<Task> = tasks.iter().filter(|t| t.is_active()).cloned().collect();

        let findings = self.analyzer.analyze(&active);
        let macroflow = self.reconciler.reconcile(tasks);

        let mut checks: BTreeMap<String, Vec<TaskId>> = self
            .rules
            .rules()
            .map(|rule| (rule.name().to_string(), rule.check(tasks)))
            .collect();
        checks.insert(GAPS_CHECK.to_string(), findings.gap_ids());
        checks.insert(OVERLAPS_CHECK.to_string(), findings.overlap_ids());

        AuditReport {
            generated_at: Utc::now(),
            as_of: self.as_of,
            reference_fingerprint: self.fingerprint.clone(),
            task_count: tasks.len(),
            active_count: active.len(),
            checks,
            overlap_table: self.formatter.overlap_rows(&findings.overlaps, tasks),
            gap_table: self.formatter.gap_rows(&findings.gaps, tasks),
            overlaps: findings.overlaps,
            gaps: findings.gaps,
            macroflow,
        }
    }
}
