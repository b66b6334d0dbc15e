//! Row admission and field cleaning
//!
//! [`RecordNormalizer`] turns a [`RawRecord`] into a [`Task`] carrying typed raw
//! fields. Nothing here fails: unparseable dates and numbers become `None`.

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

use super::cell::Cell;
use super::record::RawRecord;
use super::task::Task;

/// Date format used by the schedule export
pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// Unit suffix accepted after a quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    /// `10d`, `10 dias`
    Days,
    /// `80h`, `80 hrs`
    Hours,
}

impl Unit {
    fn pattern(&self) -> &'static Regex {
        static DAYS: OnceLock<Regex> = OnceLock::new();
        static HOURS: OnceLock<Regex> = OnceLock::new();
        match self {
            Unit::Days => DAYS.get_or_init(|| Regex::new(r"(?i)(.+)d|dia").expect("valid day unit regex")),
            Unit::Hours => HOURS.get_or_init(|| Regex::new(r"(?i)(.+)h").expect("valid hour unit regex")),
        }
    }
}

/// Parses a `dd/mm/yyyy` date, returning `None` on any failure
pub fn parse_date(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::Text(s) => NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok(),
        _ => None,
    }
}

/// Extracts a number from a cell
///
/// Text uses `.` as thousands separator and `,` as decimal mark. With a unit,
/// a trailing unit suffix is stripped before parsing.
pub fn parse_quantity(cell: &Cell, unit: Option<Unit>) -> Option<f64> {
    let value = match cell {
        Cell::Number(n) => Some(*n),
        Cell::Text(s) => {
            let cleaned = s.replace('.', "").trim().replace(',', ".");
            match unit.and_then(|u| u.pattern().captures(&cleaned)) {
                // the bare `dia` alternative matches without a number
                Some(caps) => caps.get(1).and_then(|m| m.as_str().trim().parse::<f64>().ok()),
                None => cleaned.parse::<f64>().ok(),
            }
        }
        _ => None,
    };

    value.filter(|n| n.is_finite())
}

/// Returns the admitted, trimmed task name, or `None` if the row is skipped
///
/// Rows are skipped when the name is blank, equals `nan`, or contains the
/// standalone word `loja` (retail units are scheduled separately).
pub fn admitted_name(cell: &Cell) -> Option<String> {
    let name = cell.text()?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    let lower = name.to_lowercase();
    if lower == "nan" || lower.split_whitespace().any(|word| word == "loja") {
        return None;
    }

    Some(name.to_string())
}

/// Cleans raw rows into tasks
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordNormalizer;

impl RecordNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Normalizes one row; `None` means the row is not admitted
    pub fn normalize(&self, record: &RawRecord) -> Option<Task> {
        let name = admitted_name(&record.name)?;

        let mut task = Task::new(record.id.integer().unwrap_or_default(), name);
        task.active = record.active.flag();
        task.summary = record.summary.flag();
        task.predecessors = record
            .predecessors
            .text()
            .map(|p| p.trim().to_string())
            .unwrap_or_default();
        task.outline_number = record.outline_number.present_text();
        task.outline_level = record
            .outline_level
            .integer()
            .and_then(|l| u32::try_from(l).ok());

        task.start = parse_date(&record.start);
        task.end = parse_date(&record.end);
        task.actual_start = parse_date(&record.actual_start);
        task.actual_end = parse_date(&record.actual_end);

        task.duration_days = parse_quantity(&record.duration, Some(Unit::Days));
        task.work_hours = parse_quantity(&record.work, Some(Unit::Hours));
        task.weight = parse_quantity(&record.weight, None);

        task.module_field = record.module.present_text();
        task.block_field = record.block.present_text();
        task.network_id = record.network_id.present_text();
        task.sap_task_id = record.sap_task_id.present_text();
        task.pep_id = record.pep_id.present_text();
        task.grouping = record.grouping.present_text();

        Some(task)
    }
}
