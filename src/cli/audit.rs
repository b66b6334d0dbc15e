//! Audit command

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};

use super::analyze::{print_gap_table, print_mismatches, print_overlap_table};
use super::output::{self, Output};
use super::session::Session;
use crate::domain::{AuditOptions, Auditor, TaskId, DATE_FORMAT};

/// Flagged ids shown per check before eliding
const MAX_LISTED_IDS: usize = 12;

/// Parses a dd/mm/yyyy reference date, defaulting to today
fn parse_as_of(as_of: Option<&str>) -> Result<NaiveDate> {
    match as_of {
        Some(text) => NaiveDate::parse_from_str(text.trim(), DATE_FORMAT)
            .with_context(|| format!("Invalid --as-of date '{}', expected dd/mm/yyyy", text)),
        None => Ok(Local::now().date_naive()),
    }
}

fn id_list(ids: &[TaskId]) -> String {
    let mut listed: Vec<String> = ids.iter().take(MAX_LISTED_IDS).map(|id| id.to_string()).collect();
    if ids.len() > MAX_LISTED_IDS {
        listed.push(format!("... (+{})", ids.len() - MAX_LISTED_IDS));
    }
    listed.join(", ")
}

/// Run every check and print the combined report
pub fn run(
    output: &Output,
    session: &Session,
    input: &Path,
    as_of: Option<&str>,
    gap_threshold: Option<i64>,
    strict: bool,
) -> Result<()> {
    let as_of = parse_as_of(as_of)?;
    let threshold = session.gap_threshold(gap_threshold)?;
    let reference = session.reference_data(output)?;
    let records = session.schedule(output, input)?;

    let options = AuditOptions {
        as_of,
        gap_threshold: threshold,
        disabled_rules: session.disabled_rules().to_vec(),
    };
    let auditor = Auditor::new(reference.cross_reference, reference.flow, options)
        .with_fingerprint(reference.fingerprint);
    output.verbose_ctx("audit", &format!("Running {} rules", auditor.rules().len()));
    for rule in auditor.rules().rules() {
        output.verbose_ctx("audit", &format!("  {}: {}", rule.name(), rule.description()));
    }

    let report = auditor.audit(&records);
    output.verbose_ctx(
        "audit",
        &format!(
            "{} of {} checks flagged tasks, {} macro-flow mismatches",
            report.failing_checks(),
            report.checks.len(),
            report.macroflow.len()
        ),
    );

    if output.is_json() {
        output.data(&report);
    } else {
        println!(
            "Audit as of {} ({} tasks, {} active)",
            output::date(Some(report.as_of)),
            report.task_count,
            report.active_count
        );
        if let Some(fingerprint) = &report.reference_fingerprint {
            println!("Reference data: {}", fingerprint);
        }
        println!();

        println!("{:<30} {:>7}  IDS", "CHECK", "FLAGGED");
        println!("{}", "-".repeat(80));
        for (name, ids) in &report.checks {
            println!("{:<30} {:>7}  {}", name, ids.len(), id_list(ids));
        }

        println!();
        print_overlap_table(&report.overlap_table);
        println!();
        print_gap_table(&report.gap_table, threshold);
        println!();
        print_mismatches(&report.macroflow);

        println!();
        if report.is_clean() {
            println!("No issues found.");
        } else {
            println!(
                "{} check(s) flagged tasks, {} macro-flow mismatch(es)",
                report.failing_checks(),
                report.macroflow.len()
            );
        }
    }

    if strict && !report.is_clean() {
        anyhow::bail!(
            "Audit flagged {} check(s) and {} macro-flow mismatch(es)",
            report.failing_checks(),
            report.macroflow.len()
        );
    }

    Ok(())
}
