//! Analysis commands (overlaps, macroflow)
//!
//! Both commands run the transform pipeline first, then one analysis over the
//! resulting tasks. The table printers are shared with `audit`.

use std::path::Path;

use anyhow::Result;

use super::output::{self, Output};
use super::session::Session;
use crate::domain::{
    GapRow, MacroflowReconciler, MismatchRecord, OverlapGapAnalyzer, OverlapRow, PredecessorMap,
    TableFormatter, Task, TransformPipeline,
};

/// Show overlapping occurrences and long gaps per service
pub fn overlaps(
    output: &Output,
    session: &Session,
    input: &Path,
    gap_threshold: Option<i64>,
) -> Result<()> {
    let threshold = session.gap_threshold(gap_threshold)?;
    let cross_reference = session.cross_reference(output)?;
    let records = session.schedule(output, input)?;

    let tasks = TransformPipeline::new(cross_reference).run(&records);
    let active: Vec<Task> = tasks.iter().filter(|t| t.is_active()).cloned().collect();
    output.verbose_ctx(
        "overlaps",
        &format!(
            "Analyzing {} active of {} tasks, gap threshold {} days",
            active.len(),
            tasks.len(),
            threshold
        ),
    );

    let report = OverlapGapAnalyzer::new(threshold).analyze(&active);
    let formatter = TableFormatter::new();
    let overlap_rows = formatter.overlap_rows(&report.overlaps, &tasks);
    let gap_rows = formatter.gap_rows(&report.gaps, &tasks);

    output.verbose_ctx(
        "overlaps",
        &format!("Found {} overlaps and {} gaps", overlap_rows.len(), gap_rows.len()),
    );

    if output.is_json() {
        output.data(&serde_json::json!({
            "gap_threshold": threshold,
            "overlaps": overlap_rows,
            "gaps": gap_rows,
        }));
    } else {
        print_overlap_table(&overlap_rows);
        println!();
        print_gap_table(&gap_rows, threshold);
    }

    Ok(())
}

/// Show predecessor mismatches against the reference template
pub fn macroflow(output: &Output, session: &Session, input: &Path) -> Result<()> {
    let reference = session.reference_data(output)?;
    let records = session.schedule(output, input)?;

    let tasks = TransformPipeline::new(reference.cross_reference).run(&records);
    let records = MacroflowReconciler::new(reference.flow).reconcile(&tasks);
    output.verbose_ctx(
        "macroflow",
        &format!("Reconciled {} tasks, {} mismatches", tasks.len(), records.len()),
    );

    if output.is_json() {
        output.data(&records);
    } else {
        print_mismatches(&records);
    }

    Ok(())
}

pub(super) fn print_overlap_table(rows: &[OverlapRow]) {
    if rows.is_empty() {
        println!("No overlapping services.");
        return;
    }

    println!("Overlaps ({}):", rows.len());
    println!(
        "{:<16} {:<10} {:<10} {:<10} {:<10} SERVICE",
        "BETWEEN", "START 1", "END 1", "START 2", "END 2"
    );
    println!("{}", "-".repeat(80));
    for row in rows {
        println!(
            "{:<16} {:<10} {:<10} {:<10} {:<10} {}",
            row.between,
            output::date(row.first_start),
            output::date(row.first_end),
            output::date(row.second_start),
            output::date(row.second_end),
            output::truncate(&row.service, 30),
        );
    }
}

pub(super) fn print_gap_table(rows: &[GapRow], threshold: i64) {
    if rows.is_empty() {
        println!("No gaps longer than {} days.", threshold);
        return;
    }

    println!("Gaps over {} days ({}):", threshold, rows.len());
    println!(
        "{:<16} {:<10} {:<10} {:>5} {:>6} SERVICE",
        "BETWEEN", "END 1", "START 2", "GAP", "TOTAL"
    );
    println!("{}", "-".repeat(80));
    for row in rows {
        println!(
            "{:<16} {:<10} {:<10} {:>5} {:>6} {}",
            row.between,
            output::date(row.first_end),
            output::date(row.second_start),
            row.gap_days,
            row.cumulative_days,
            output::truncate(&row.service, 30),
        );
    }
}

pub(super) fn print_mismatches(records: &[MismatchRecord]) {
    if records.is_empty() {
        println!("Macro-flow matches the reference template.");
        return;
    }

    println!("Macro-flow mismatches ({}):", records.len());
    println!("{:<6} {:<16} {:<30} DESCRIPTION", "ORD", "KIND", "SERVICE");
    println!("{}", "-".repeat(90));
    for record in records {
        println!(
            "{:<6} {:<16} {:<30} {}",
            record.ordinal,
            record.kind,
            output::truncate(&record.service, 30),
            record.description
        );
        println!("       expected: {}", predecessor_list(&record.reference));
        println!("       found:    {}", predecessor_list(&record.baseline));
    }
}

fn predecessor_list(map: &PredecessorMap) -> String {
    if map.is_empty() {
        return "(none)".to_string();
    }
    map.iter()
        .map(|(service, relation)| format!("{} ({})", service, relation))
        .collect::<Vec<_>>()
        .join(", ")
}
