//! Tabular views of overlap and gap findings

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use super::overlap::{is_analyzed, Gap, OverlapPair};
use super::task::{Task, TaskId};

/// One overlapping pair with both planned windows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlapRow {
    pub between: String,
    pub service: String,
    pub first_id: TaskId,
    pub second_id: TaskId,
    pub first_start: Option<NaiveDate>,
    pub first_end: Option<NaiveDate>,
    pub second_start: Option<NaiveDate>,
    pub second_end: Option<NaiveDate>,
}

/// One reported gap with both planned windows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GapRow {
    pub between: String,
    pub service: String,
    pub first_id: TaskId,
    pub second_id: TaskId,
    pub first_start: Option<NaiveDate>,
    pub first_end: Option<NaiveDate>,
    pub second_start: Option<NaiveDate>,
    pub second_end: Option<NaiveDate>,
    pub gap_days: i64,
    pub cumulative_days: i64,
}

fn between(first: &Task, second: &Task) -> String {
    format!("{} / {}", first.display_id(), second.display_id())
}

/// Resolves finding ids back to tasks and lays them out as rows
#[derive(Debug, Clone, Copy, Default)]
pub struct TableFormatter;

impl TableFormatter {
    pub fn new() -> Self {
        Self
    }

    /// Overlap rows resolved against every transformed task
    ///
    /// Pairs naming an unknown id are skipped.
    pub fn overlap_rows(&self, pairs: &[OverlapPair], tasks: &[Task]) -> Vec<OverlapRow> {
        let by_id: HashMap<TaskId, &Task> = tasks.iter().map(|t| (t.id, t)).collect();

        pairs
            .iter()
            .filter_map(|pair| {
                let first = by_id.get(&pair.first)?;
                let second = by_id.get(&pair.second)?;
                Some(OverlapRow {
                    between: between(first, second),
                    service: first.service_name.clone(),
                    first_id: first.id,
                    second_id: second.id,
                    first_start: first.start,
                    first_end: first.end,
                    second_start: second.start,
                    second_end: second.end,
                })
            })
            .collect()
    }

    /// Gap rows resolved against the analyzed subset of the tasks
    pub fn gap_rows(&self, gaps: &[Gap], tasks: &[Task]) -> Vec<GapRow> {
        let by_id: HashMap<TaskId, &Task> = tasks
            .iter()
            .filter(|t| is_analyzed(t))
            .map(|t| (t.id, t))
            .collect();

        gaps.iter()
            .filter_map(|gap| {
                let first = by_id.get(&gap.first)?;
                let second = by_id.get(&gap.second)?;
                Some(GapRow {
                    between: between(first, second),
                    service: first.service_name.clone(),
                    first_id: first.id,
                    second_id: second.id,
                    first_start: first.start,
                    first_end: first.end,
                    second_start: second.start,
                    second_end: second.end,
                    gap_days: gap.gap_days,
                    cumulative_days: gap.cumulative_days,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::task::ServiceType;

    fn task(id: TaskId, general_id: &str, service_type: ServiceType) -> Task {
        let mut task = Task::new(id, "Alvenaria");
        task.general_id = Some(general_id.to_string());
        task.service_type = service_type;
        task.start = NaiveDate::from_ymd_opt(2024, 1, id as u32);
        task.end = NaiveDate::from_ymd_opt(2024, 1, id as u32 + 5);
        task
    }

    #[test]
    fn overlap_rows_resolve_ids() {
        let tasks = vec![
            task(1, "M.01-B.01-P.01", ServiceType::Supra),
            task(2, "M.01-B.01-P.02", ServiceType::Supra),
        ];
        let pairs = vec![OverlapPair {
            service: "Alvenaria".into(),
            first: 1,
            second: 2,
            occurrences: 1,
        }];

        let rows = TableFormatter::new().overlap_rows(&pairs, &tasks);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].between, "M.01-B.01-P.01 / M.01-B.01-P.02");
        assert_eq!(rows[0].first_start, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(rows[0].second_end, NaiveDate::from_ymd_opt(2024, 1, 7));
    }

    #[test]
    fn unknown_ids_are_skipped() {
        let tasks = vec![task(1, "M.01", ServiceType::Supra)];
        let pairs = vec![OverlapPair {
            service: "Alvenaria".into(),
            first: 1,
            second: 9,
            occurrences: 1,
        }];
        assert!(TableFormatter::new().overlap_rows(&pairs, &tasks).is_empty());
    }

    #[test]
    fn gap_rows_use_analyzed_subset() {
        let tasks = vec![
            task(1, "M.01-B.01-P.01", ServiceType::Supra),
            task(2, "M.01-B.01-P.02", ServiceType::Supra),
            task(3, "M.01", ServiceType::Asc),
        ];
        let gaps = vec![
            Gap {
                service: "Alvenaria".into(),
                first: 1,
                second: 2,
                gap_days: 9,
                cumulative_days: 9,
            },
            Gap {
                service: "Alvenaria".into(),
                first: 2,
                second: 3,
                gap_days: 7,
                cumulative_days: 16,
            },
        ];

        let rows = TableFormatter::new().gap_rows(&gaps, &tasks);
        assert_eq!(rows.len(), 1);
        assert_eq!((rows[0].gap_days, rows[0].cumulative_days), (9, 9));
    }
}
