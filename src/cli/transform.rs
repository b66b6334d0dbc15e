//! Transform command

use std::path::Path;

use anyhow::Result;

use super::output::{self, Output};
use super::session::Session;
use crate::domain::TransformPipeline;

/// Prints the normalized and coded task list
pub fn run(output: &Output, session: &Session, input: &Path) -> Result<()> {
    let cross_reference = session.cross_reference(output)?;
    let records = session.schedule(output, input)?;

    let tasks = TransformPipeline::new(cross_reference).run(&records);
    let coded = tasks.iter().filter(|t| t.coding_id.is_some()).count();
    output.verbose_ctx(
        "transform",
        &format!(
            "Transformed {} rows into {} tasks ({} coded)",
            records.len(),
            tasks.len(),
            coded
        ),
    );

    if output.is_json() {
        output.data(&tasks);
        return Ok(());
    }

    if tasks.is_empty() {
        println!("No tasks in input.");
        return Ok(());
    }

    println!("Tasks ({}):", tasks.len());
    println!(
        "{:<6} {:<8} {:<4} {:<10} {:<12} {:<10} {:<10} {:<24} NAME",
        "ORD", "ID", "LVL", "TYPE", "GENERAL ID", "START", "END", "CODING"
    );
    println!("{}", "-".repeat(110));
    for task in &tasks {
        println!(
            "{:<6} {:<8} {:<4} {:<10} {:<12} {:<10} {:<10} {:<24} {}",
            task.ordinal,
            task.id,
            task.outline_level
                .map(|l| l.to_string())
                .unwrap_or_else(|| "-".to_string()),
            task.service_type.as_str(),
            task.general_id.as_deref().unwrap_or("-"),
            output::date(task.start),
            output::date(task.end),
            task.coding_id.as_deref().unwrap_or("-"),
            output::truncate(&task.name, 40),
        );
    }

    output.blank();
    println!("{} of {} task(s) coded", coded, tasks.len());

    Ok(())
}
