//! Overlap and gap detection
//!
//! Occurrences of the same service at different locations (floors, blocks)
//! should run one after another. This module finds occurrences whose planned
//! windows overlap and consecutive occurrences separated by a long idle gap.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::resolve::INFRA_SERVICE_LEVEL;
use super::task::{ServiceType, Task, TaskId};

/// Gaps longer than this many days are reported by default
pub const DEFAULT_GAP_THRESHOLD: i64 = 5;

/// Outline level of site-wide service rows
pub const ASC_SERVICE_LEVEL: u32 = 7;

/// Two occurrences of a service with overlapping planned windows
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OverlapPair {
    pub service: String,
    /// Smaller task id of the pair
    pub first: TaskId,
    /// Larger task id of the pair
    pub second: TaskId,
    /// Distinct overlapping pairs found for the same service
    pub occurrences: usize,
}

impl OverlapPair {
    /// Returns true if the pair involves the given task
    pub fn involves(&self, id: TaskId) -> bool {
        self.first == id || self.second == id
    }
}

/// Idle time between two consecutive occurrences of a service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gap {
    pub service: String,
    pub first: TaskId,
    pub second: TaskId,
    pub gap_days: i64,
    /// Running total of reported gaps within the service
    pub cumulative_days: i64,
}

/// Findings of one analysis run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverlapGapReport {
    pub overlaps: Vec<OverlapPair>,
    pub gaps: Vec<Gap>,
}

impl OverlapGapReport {
    /// Task ids involved in any overlap, in report order
    pub fn overlap_ids(&self) -> Vec<TaskId> {
        let mut seen = BTreeSet::new();
        self.overlaps
            .iter()
            .flat_map(|p| [p.first, p.second])
            .filter(|id| seen.insert(*id))
            .collect()
    }

    /// Task ids involved in any reported gap, in report order
    pub fn gap_ids(&self) -> Vec<TaskId> {
        let mut seen = BTreeSet::new();
        self.gaps
            .iter()
            .flat_map(|g| [g.first, g.second])
            .filter(|id| seen.insert(*id))
            .collect()
    }
}

/// Returns true if the task takes part in overlap and gap analysis
///
/// Infrastructure service rows, anything on a floor, and site-wide service
/// rows are compared; summary levels are not.
pub fn is_analyzed(task: &Task) -> bool {
    (task.is_infra == Some(true) && task.at_level(INFRA_SERVICE_LEVEL))
        || task.service_type == ServiceType::Supra
        || (task.service_type == ServiceType::Asc && task.at_level(ASC_SERVICE_LEVEL))
}

/// Returns true if two tasks' planned windows strictly overlap
///
/// Touching at an endpoint is not an overlap. Tasks without both dates never
/// overlap. Tasks sharing an id are the same task and never overlap, which
/// also covers id-less rows (all id `0`).
pub fn overlaps(a: &Task, b: &Task) -> bool {
    if a.id == b.id {
        return false;
    }
    match (a.window(), b.window()) {
        (Some((start_a, end_a)), Some((start_b, end_b))) => start_a < end_b && start_b < end_a,
        _ => false,
    }
}

/// Detects overlapping and widely spaced occurrences per service
#[derive(Debug, Clone, Copy)]
pub struct OverlapGapAnalyzer {
    gap_threshold: i64,
}

impl Default for OverlapGapAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_GAP_THRESHOLD)
    }
}

impl OverlapGapAnalyzer {
    pub fn new(gap_threshold: i64) -> Self {
        Self { gap_threshold }
    }

    pub fn gap_threshold(&self) -> i64 {
        self.gap_threshold
    }

    /// Runs both checks over every analyzed service group
    pub fn analyze(&self, tasks: &[Task]) -> OverlapGapReport {
        let mut report = OverlapGapReport::default();

        for (service, group) in group_by_service(tasks) {
            if group.len() < 2 {
                continue;
            }
            report.overlaps.extend(find_overlaps(service, &group));
            report.gaps.extend(self.find_gaps(service, &group));
        }

        report
    }

    /// Gaps between consecutive occurrences ordered by planned end
    pub fn find_gaps(&self, service: &str, group: &[&Task]) -> Vec<Gap> {
        let mut dated: Vec<(&Task, _)> = group
            .iter()
            .filter_map(|task| task.window().map(|window| (*task, window)))
            .collect();
        if dated.len() < 2 {
            return Vec::new();
        }
        dated.sort_by_key(|(_, (_, end))| *end);

        let mut cumulative = 0;
        let mut gaps = Vec::new();
        for pair in dated.windows(2) {
            let (current, (_, current_end)) = pair[0];
            let (next, (next_start, _)) = pair[1];

            let gap_days = ((next_start - current_end).num_days() - 1).max(0);
            if gap_days > self.gap_threshold {
                cumulative += gap_days;
                gaps.push(Gap {
                    service: service.to_string(),
                    first: current.id,
                    second: next.id,
                    gap_days,
                    cumulative_days: cumulative,
                });
            }
        }

        gaps
    }
}

/// Groups analyzed tasks by service name, keeping input order within a group
pub fn group_by_service(tasks: &[Task]) -> BTreeMap<&str, Vec<&Task>> {
    let mut groups: BTreeMap<&str, Vec<&Task>> = BTreeMap::new();
    for task in tasks.iter().filter(|t| is_analyzed(t)) {
        if task.service_name.is_empty() {
            continue;
        }
        groups.entry(task.service_name.as_str()).or_default().push(task);
    }
    groups
}

/// Every distinct overlapping pair within one service group
pub fn find_overlaps(service: &str, group: &[&Task]) -> Vec<OverlapPair> {
    let mut pairs = BTreeSet::new();
    for (i, a) in group.iter().enumerate() {
        for b in &group[i + 1..] {
            if overlaps(a, b) {
                pairs.insert((a.id.min(b.id), a.id.max(b.id)));
            }
        }
    }

    let occurrences = pairs.len();
    pairs
        .into_iter()
        .map(|(first, second)| OverlapPair {
            service: service.to_string(),
            first,
            second,
            occurrences,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn supra(id: TaskId, service: &str, start: &str, end: &str) -> Task {
        let mut task = Task::new(id, service);
        task.service_type = ServiceType::Supra;
        task.start = Some(date(start));
        task.end = Some(date(end));
        task
    }

    #[test]
    fn strict_overlap() {
        let a = supra(1, "X", "2024-01-01", "2024-01-10");
        let b = supra(2, "X", "2024-01-05", "2024-01-15");
        assert!(overlaps(&a, &b));
        assert!(overlaps(&b, &a));
    }

    #[test]
    fn a_task_never_overlaps_itself() {
        let a = supra(1, "X", "2024-01-01", "2024-01-10");
        assert!(!overlaps(&a, &a));

        let twin = supra(1, "X", "2024-01-05", "2024-01-15");
        assert!(!overlaps(&a, &twin));
    }

    #[test]
    fn rows_without_ids_yield_no_self_pairs() {
        let a = supra(0, "X", "2024-01-01", "2024-01-10");
        let b = supra(0, "X", "2024-01-05", "2024-01-15");

        let pairs = find_overlaps("X", &[&a, &b]);
        assert!(pairs.iter().all(|p| p.first != p.second));
        assert!(pairs.is_empty());
    }

    #[test]
    fn touching_endpoints_do_not_overlap() {
        let a = supra(1, "X", "2024-01-01", "2024-01-10");
        let b = supra(2, "X", "2024-01-10", "2024-01-20");
        assert!(!overlaps(&a, &b));
        assert!(!overlaps(&b, &a));
    }

    #[test]
    fn undated_tasks_never_overlap() {
        let a = supra(1, "X", "2024-01-01", "2024-01-10");
        let mut b = supra(2, "X", "2024-01-02", "2024-01-05");
        b.start = None;
        assert!(!overlaps(&a, &b));
    }

    #[test]
    fn analysis_subset() {
        let mut infra = Task::new(1, "Fundação");
        infra.is_infra = Some(true);
        infra.outline_level = Some(6);
        assert!(is_analyzed(&infra));

        let mut asc = Task::new(2, "Terraplenagem");
        asc.outline_level = Some(7);
        assert!(is_analyzed(&asc));

        asc.outline_level = Some(6);
        assert!(!is_analyzed(&asc));

        let mut infra_summary = Task::new(3, "Bloco 1");
        infra_summary.is_infra = Some(true);
        infra_summary.service_type = ServiceType::Infra;
        infra_summary.outline_level = Some(3);
        assert!(!is_analyzed(&infra_summary));
    }

    #[test]
    fn overlaps_are_deduplicated_with_counts() {
        let tasks = vec![
            supra(3, "Alvenaria", "2024-01-01", "2024-01-10"),
            supra(1, "Alvenaria", "2024-01-05", "2024-01-12"),
            supra(2, "Alvenaria", "2024-01-08", "2024-01-20"),
            supra(4, "Reboco", "2024-01-01", "2024-01-10"),
        ];

        let report = OverlapGapAnalyzer::default().analyze(&tasks);
        let pairs: Vec<_> = report.overlaps.iter().map(|p| (p.first, p.second)).collect();
        assert_eq!(pairs, vec![(1, 2), (1, 3), (2, 3)]);
        assert!(report.overlaps.iter().all(|p| p.occurrences == 3));
        assert!(report.overlaps.iter().all(|p| p.service == "Alvenaria"));
    }

    #[test]
    fn gap_arithmetic() {
        let tasks = vec![
            supra(1, "Alvenaria", "2023-12-20", "2024-01-01"),
            supra(2, "Alvenaria", "2024-01-10", "2024-01-15"),
        ];

        let report = OverlapGapAnalyzer::new(5).analyze(&tasks);
        assert_eq!(
            report.gaps,
            vec![Gap {
                service: "Alvenaria".into(),
                first: 1,
                second: 2,
                gap_days: 8,
                cumulative_days: 8,
            }]
        );
    }

    #[test]
    fn gaps_at_threshold_are_not_reported() {
        let tasks = vec![
            supra(1, "X", "2024-01-01", "2024-01-01"),
            supra(2, "X", "2024-01-07", "2024-01-08"),
        ];
        // 6 - 1 = 5 days, not above the threshold
        assert!(OverlapGapAnalyzer::new(5).analyze(&tasks).gaps.is_empty());
    }

    #[test]
    fn cumulative_resets_per_service() {
        let tasks = vec![
            supra(1, "A", "2024-01-01", "2024-01-02"),
            supra(2, "A", "2024-01-20", "2024-01-21"),
            supra(3, "A", "2024-02-10", "2024-02-11"),
            supra(4, "B", "2024-01-01", "2024-01-02"),
            supra(5, "B", "2024-01-20", "2024-01-21"),
        ];

        let gaps = OverlapGapAnalyzer::new(5).analyze(&tasks).gaps;
        let summary: Vec<_> = gaps
            .iter()
            .map(|g| (g.service.as_str(), g.gap_days, g.cumulative_days))
            .collect();
        assert_eq!(summary, vec![("A", 17, 17), ("A", 19, 36), ("B", 17, 17)]);
    }

    #[test]
    fn gaps_follow_end_date_order() {
        let tasks = vec![
            supra(2, "A", "2024-02-01", "2024-02-05"),
            supra(1, "A", "2024-01-01", "2024-01-05"),
        ];
        let gaps = OverlapGapAnalyzer::new(5).analyze(&tasks).gaps;
        assert_eq!(gaps.len(), 1);
        assert_eq!((gaps[0].first, gaps[0].second), (1, 2));
    }

    #[test]
    fn singleton_groups_produce_nothing() {
        let tasks = vec![supra(1, "A", "2024-01-01", "2024-01-05")];
        let report = OverlapGapAnalyzer::default().analyze(&tasks);
        assert!(report.overlaps.is_empty());
        assert!(report.gaps.is_empty());
    }

    #[test]
    fn flagged_ids_are_unique() {
        let tasks = vec![
            supra(1, "A", "2024-01-01", "2024-01-10"),
            supra(2, "A", "2024-01-02", "2024-01-10"),
            supra(3, "A", "2024-01-03", "2024-01-10"),
        ];
        let report = OverlapGapAnalyzer::default().analyze(&tasks);
        assert_eq!(report.overlap_ids(), vec![1, 2, 3]);
    }
}
