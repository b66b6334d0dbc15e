//! Schedule validation rules
//!
//! Each rule inspects the transformed task list and returns the ids of the
//! tasks it flags. Rules are pure; the same list can be checked by any number
//! of rules in any order.
//!
//! ## Shipped rules
//!
//! | Name | Flags |
//! |------|-------|
//! | `without_predecessors` | active leaf tasks with no predecessor |
//! | `inactive_with_predecessors` | inactive leaf tasks that still link |
//! | `overdue` | active tasks past their planned end with no actual end |
//! | `actual_start_in_future` | actual start after the audit date |
//! | `actual_end_in_future` | actual end after the audit date |
//! | `zero_duration` | tasks lasting zero days |
//! | `duration_over_21_days` | leaf tasks longer than three weeks |
//! | `incorrect_work` | work hours not equal to 8h per duration day |
//! | `zero_weight` | active leaf tasks without weight |
//! | `apportioned_active` | apportioned tasks left active |
//! | `missing_block_id` ... | unfilled SAP and block columns |
//! | `module_field_missing` | level-6 site rows without a module |
//! | `weight_totals` | sibling weights not summing to 0 or 100 |

use std::collections::HashMap;

use chrono::NaiveDate;

use super::task::{Task, TaskId};

/// Longest acceptable leaf task, in days
pub const MAX_DURATION_DAYS: f64 = 21.0;

/// Hours in one scheduled working day
pub const HOURS_PER_DAY: f64 = 8.0;

/// Name fragments of tasks that legitimately carry no weight
pub const ZERO_WEIGHT_EXEMPT: [&str; 7] = [
    "leg ",
    "iptu",
    "itbi",
    "escritura",
    "inc ",
    "projeto",
    "custo material pp - obra",
];

/// Tasks measured by apportionment that must stay inactive
pub const APPORTIONED_TASKS: [&str; 3] = ["ANDAM JUNTO", "MÃO DE OBRA RATEIO", "HABITE-SE"];

const PRE_PROJECT: &str = "pré projeto";
const PRE_PROJECT_MODULE: &str = "pré projeto módulo";
const OCCUPANCY_PERMIT: &str = "habite-se";
const LABOR_APPORTIONMENT: &str = "mão de obra rateio";

/// A check over the whole task list
pub trait Rule: Send + Sync {
    /// Report key
    fn name(&self) -> &'static str;

    /// One-line explanation shown next to the flagged ids
    fn description(&self) -> &'static str;

    /// Ids of the flagged tasks, in task order
    fn check(&self, tasks: &[Task]) -> Vec<TaskId>;
}

/// A rule that judges every task on its own
pub struct TaskRule {
    name: &'static str,
    description: &'static str,
    predicate: Box<dyn Fn(&Task) -> bool + Send + Sync>,
}

impl TaskRule {
    pub fn new(
        name: &'static str,
        description: &'static str,
        predicate: impl Fn(&Task) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            name,
            description,
            predicate: Box::new(predicate),
        }
    }
}

impl Rule for TaskRule {
    fn name(&self) -> &'static str {
        self.name
    }

    fn description(&self) -> &'static str {
        self.description
    }

    fn check(&self, tasks: &[Task]) -> Vec<TaskId> {
        tasks
            .iter()
            .filter(|task| (self.predicate)(*task))
            .map(|task| task.id)
            .collect()
    }
}

fn is_inactive(task: &Task) -> bool {
    task.active == Some(false)
}

fn level(task: &Task) -> u32 {
    task.outline_level.unwrap_or(0)
}

fn grouping(task: &Task) -> String {
    task.grouping
        .as_deref()
        .map(|g| g.trim().to_lowercase())
        .unwrap_or_default()
}

fn grouping_exempt(task: &Task, exempt: &[&str]) -> bool {
    let grouping = grouping(task);
    exempt.iter().any(|e| *e == grouping)
}

/// Work hours should equal whole duration days times 8
fn work_mismatch(task: &Task) -> bool {
    let Some(duration) = task.duration_days else {
        return false;
    };
    if duration < 0.0 {
        return false;
    }
    let days = duration.trunc();
    let work = task.work_hours.map(f64::trunc).unwrap_or(0.0);
    days > 0.0 && work / HOURS_PER_DAY != days
}

/// Membership is tested against the rendered target list, so any fragment of
/// it (`"JUNTO"`, `"HABITE"`) matches as well
fn is_apportioned(name: &str) -> bool {
    let rendered = format!(
        "[{}]",
        APPORTIONED_TASKS
            .iter()
            .map(|t| format!("'{}'", t))
            .collect::<Vec<_>>()
            .join(", ")
    )
    .to_uppercase();
    rendered.contains(name)
}

pub fn without_predecessors() -> TaskRule {
    TaskRule::new(
        "without_predecessors",
        "Active tasks without predecessors",
        |t| t.is_leaf() && t.is_active() && t.has_no_predecessors(),
    )
}

pub fn inactive_with_predecessors() -> TaskRule {
    TaskRule::new(
        "inactive_with_predecessors",
        "Inactive tasks that still have predecessors",
        |t| t.is_leaf() && is_inactive(t) && !t.has_no_predecessors(),
    )
}

pub fn overdue(as_of: NaiveDate) -> TaskRule {
    TaskRule::new(
        "overdue",
        "Active tasks past their planned end without an actual end",
        move |t| t.is_active() && t.actual_end.is_none() && t.end.is_some_and(|end| end <= as_of),
    )
}

pub fn actual_start_in_future(as_of: NaiveDate) -> TaskRule {
    TaskRule::new(
        "actual_start_in_future",
        "Tasks with an actual start after the audit date",
        move |t| t.actual_start.is_some_and(|d| d > as_of),
    )
}

pub fn actual_end_in_future(as_of: NaiveDate) -> TaskRule {
    TaskRule::new(
        "actual_end_in_future",
        "Tasks with an actual end after the audit date",
        move |t| t.actual_end.is_some_and(|d| d > as_of),
    )
}

pub fn zero_duration() -> TaskRule {
    TaskRule::new("zero_duration", "Tasks with zero duration", |t| {
        t.duration_days == Some(0.0)
    })
}

pub fn duration_over_limit() -> TaskRule {
    TaskRule::new(
        "duration_over_21_days",
        "Tasks longer than 21 days",
        |t| t.is_leaf() && t.duration_days.is_some_and(|d| d > MAX_DURATION_DAYS),
    )
}

pub fn incorrect_work() -> TaskRule {
    TaskRule::new(
        "incorrect_work",
        "Tasks whose work is not 8 hours per duration day",
        |t| t.is_leaf() && t.is_active() && work_mismatch(t),
    )
}

pub fn zero_weight() -> TaskRule {
    TaskRule::new("zero_weight", "Active tasks with zero weight", |t| {
        let name = t.name.to_lowercase();
        t.weight == Some(0.0)
            && t.is_leaf()
            && t.is_active()
            && !ZERO_WEIGHT_EXEMPT.iter().any(|w| name.contains(w))
    })
}

pub fn apportioned_active() -> TaskRule {
    TaskRule::new(
        "apportioned_active",
        "Apportioned tasks (scaffolding, labor apportionment, occupancy permit) left active",
        |t| t.is_active() && is_apportioned(&t.name),
    )
}

pub fn missing_block_id() -> TaskRule {
    TaskRule::new("missing_block_id", "Tasks missing the block id", |t| {
        level(t) >= 3
            && t.block_field.is_none()
            && !grouping_exempt(
                t,
                &[PRE_PROJECT, OCCUPANCY_PERMIT, LABOR_APPORTIONMENT, PRE_PROJECT_MODULE],
            )
    })
}

pub fn missing_pep_id() -> TaskRule {
    TaskRule::new("missing_pep_id", "Tasks missing the SAP PEP element", |t| {
        level(t) >= 3
            && t.pep_id.is_none()
            && !grouping_exempt(t, &[PRE_PROJECT, OCCUPANCY_PERMIT, LABOR_APPORTIONMENT])
    })
}

pub fn missing_network_id() -> TaskRule {
    TaskRule::new(
        "missing_network_id",
        "Tasks missing the SAP network diagram",
        |t| level(t) >= 6 && t.network_id.is_none(),
    )
}

pub fn missing_sap_task_id() -> TaskRule {
    TaskRule::new("missing_sap_task_id", "Tasks missing the SAP task", |t| {
        level(t) >= 5
            && t.sap_task_id.is_none()
            && !grouping_exempt(t, &[PRE_PROJECT, OCCUPANCY_PERMIT, LABOR_APPORTIONMENT])
    })
}

/// Site-wide service rows must name their module once a second module exists
pub struct ModuleFieldRule;

impl ModuleFieldRule {
    const SECOND_MODULE: &'static str = "MÓDULO 02";
    const SITE_PREFIX: &'static str = "1.1.1.";
    const SERVICE_LEVEL: u32 = 6;
}

impl Rule for ModuleFieldRule {
    fn name(&self) -> &'static str {
        "module_field_missing"
    }

    fn description(&self) -> &'static str {
        "Site-wide service tasks without a module in a multi-module project"
    }

    fn check(&self, tasks: &[Task]) -> Vec<TaskId> {
        let candidates: Vec<&Task> = tasks.iter().filter(|t| !is_inactive(t)).collect();

        let multi_module = candidates
            .iter()
            .any(|t| t.name.to_uppercase() == Self::SECOND_MODULE);
        if !multi_module {
            return Vec::new();
        }

        candidates
            .into_iter()
            .filter(|t| {
                t.outline_number
                    .as_deref()
                    .is_some_and(|n| n.starts_with(Self::SITE_PREFIX))
                    && t.at_level(Self::SERVICE_LEVEL)
                    && t.module_field.is_none()
            })
            .map(|t| t.id)
            .collect()
    }
}

/// Weights of sibling tasks sharing an SAP task and block must total 0 or 100
pub struct WeightTotalRule;

impl WeightTotalRule {
    const TOLERANCE: f64 = 1e-6;

    /// Outline number of the parent with the separators dropped
    fn parent_key(outline: &str) -> String {
        let segments: Vec<&str> = outline.split('.').collect();
        segments[..segments.len().saturating_sub(1)].concat()
    }
}

impl Rule for WeightTotalRule {
    fn name(&self) -> &'static str {
        "weight_totals"
    }

    fn description(&self) -> &'static str {
        "Groups whose weights total neither 0 nor 100 (first task of each group)"
    }

    fn check(&self, tasks: &[Task]) -> Vec<TaskId> {
        let mut index: HashMap<(String, &str, &str), usize> = HashMap::new();
        let mut groups: Vec<(TaskId, f64)> = Vec::new();

        for task in tasks {
            let parent = task
                .outline_number
                .as_deref()
                .map(Self::parent_key)
                .unwrap_or_default();
            let (Some(sap_task), Some(block)) = (task.sap_task_id.as_deref(), task.block_field.as_deref())
            else {
                continue;
            };
            if parent.is_empty() || sap_task.is_empty() || block.is_empty() {
                continue;
            }

            let slot = *index.entry((parent, sap_task, block)).or_insert_with(|| {
                groups.push((task.id, 0.0));
                groups.len() - 1
            });
            groups[slot].1 += task.weight.unwrap_or(0.0);
        }

        groups
            .into_iter()
            .filter(|(_, total)| {
                (total - 100.0).abs() > Self::TOLERANCE && total.abs() > Self::TOLERANCE
            })
            .map(|(id, _)| id)
            .collect()
    }
}

/// Ordered collection of enabled rules
pub struct RuleSet {
    rules: Vec<Box<dyn Rule>>,
}

impl RuleSet {
    pub fn new(rules: Vec<Box<dyn Rule>>) -> Self {
        Self { rules }
    }

    /// Every shipped rule, checking dates against `as_of`
    pub fn standard(as_of: NaiveDate) -> Self {
        Self::new(vec![
            Box::new(without_predecessors()),
            Box::new(inactive_with_predecessors()),
            Box::new(overdue(as_of)),
            Box::new(actual_start_in_future(as_of)),
            Box::new(actual_end_in_future(as_of)),
            Box::new(zero_duration()),
            Box::new(duration_over_limit()),
            Box::new(incorrect_work()),
            Box::new(zero_weight()),
            Box::new(apportioned_active()),
            Box::new(missing_block_id()),
            Box::new(missing_pep_id()),
            Box::new(missing_network_id()),
            Box::new(missing_sap_task_id()),
            Box::new(ModuleFieldRule),
            Box::new(WeightTotalRule),
        ])
    }

    /// Drops the named rules
    pub fn without(mut self, disabled: &[String]) -> Self {
        self.rules.retain(|rule| !disabled.iter().any(|d| d == rule.name()));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn rules(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules.iter().map(|r| r.as_ref())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
