//! Hierarchical coding of tasks
//!
//! Derives location codes from a task's name and outline position:
//!
//! | Code | Format | Source |
//! |------|--------|--------|
//! | Module | `M.NN` | module field, else 2nd segment of the outline number |
//! | Block | `B.NN` | `BLOCK n` / `BLOCO n` in a level-3 name |
//! | Floor | `P.NN` | `p<digits>` anywhere in the name |
//!
//! Keywords are matched in English and Portuguese since exports use either.

use std::sync::OnceLock;

use regex::Regex;

use super::task::{Task, MAX_LABEL_LEVEL};

const BLOCK_WORDS: [&str; 2] = ["block", "bloco"];
const STRUCTURE_WORDS: [&str; 2] = ["structure", "estrutura"];
const MODULE_WORDS: [&str; 2] = ["MODULE", "MÓDULO"];

fn block_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)BLOC[KO] (\d+)").expect("valid block regex"))
}

fn floor_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)p(\d+)").expect("valid floor regex"))
}

fn floor_prefix_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)(p\d+)\s*-\s*(.+)").expect("valid floor prefix regex"))
}

fn block_prefix_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)BL\s*\d+\s*-\s*(.*)").expect("valid block prefix regex"))
}

fn module_suffix_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\s*-\s*(?:MODULE|MODULO|MÓDULO|TRECHO)\s*\d+")
            .expect("valid module suffix regex")
    })
}

fn padded(prefix: char, digits: &str) -> String {
    format!("{}.{:0>2}", prefix, digits)
}

/// Module code from the explicit module field or the outline number
pub fn module_code(module_field: Option<&str>, outline_number: Option<&str>) -> Option<String> {
    if let Some(field) = module_field {
        let digits: String = field.chars().filter(|c| c.is_ascii_digit()).collect();
        if !digits.is_empty() {
            return Some(padded('M', &digits));
        }
    }

    let outline = outline_number?;
    let mut segments = outline.split('.');
    segments.next();
    segments.next().map(|segment| padded('M', segment))
}

/// Block code for level-3 block summary rows
pub fn block_code(name: &str, level: Option<u32>) -> Option<String> {
    if level != Some(3) {
        return None;
    }
    let upper = name.to_uppercase();
    if MODULE_WORDS.iter().any(|w| upper.contains(w)) {
        return None;
    }
    block_pattern()
        .captures(name)
        .map(|caps| padded('B', &caps[1]))
}

/// Floor code from the first `p<digits>` in the name
pub fn floor_code(name: &str) -> Option<String> {
    floor_pattern()
        .captures(name)
        .map(|caps| padded('P', &caps[1]))
}

/// Infrastructure classification, `None` when the row does not decide it
pub fn infra_flag(name: &str, level: Option<u32>) -> Option<bool> {
    let lower = name.to_lowercase();
    match level {
        Some(3) if BLOCK_WORDS.iter().any(|w| lower.contains(w)) => Some(true),
        Some(4) if STRUCTURE_WORDS.iter().any(|w| lower.contains(w)) => Some(false),
        Some(1) => Some(false),
        _ => None,
    }
}

/// Strips location qualifiers from a task name
///
/// Priority: floor prefix (`P3 - X`), block prefix (`BL2 - X`), module suffix
/// (`X - MODULE 1`). Anything else is returned trimmed.
pub fn service_name(name: &str) -> String {
    if let Some(caps) = floor_prefix_pattern().captures(name) {
        return caps[2].trim().to_string();
    }
    if let Some(caps) = block_prefix_pattern().captures(name) {
        return caps[1].trim().to_string();
    }
    module_suffix_pattern()
        .split(name)
        .next()
        .unwrap_or(name)
        .trim()
        .to_string()
}

/// Splits a `<location> - <service>` literal, keeping the service part
///
/// Only applies when the first ` - ` segment ends in a digit (`P1`, `BL 2`).
/// With several separators the whole tail is kept.
pub fn split_location_literal(text: &str) -> String {
    let segments: Vec<&str> = text.split(" - ").collect();
    let ends_in_digit = segments
        .first()
        .and_then(|s| s.chars().last())
        .is_some_and(|c| c.is_ascii_digit());
    if !ends_in_digit {
        return text.to_string();
    }

    match segments.len() {
        0 | 1 => text.to_string(),
        2 => segments[1].to_string(),
        _ => segments[1..].join(" - "),
    }
}

/// Level labels for a task: its own level and every deeper one carry its service
pub fn level_labels(service: &str, level: Option<u32>) -> Vec<Option<String>> {
    let mut labels = vec![None; MAX_LABEL_LEVEL];
    if let Some(level) = level {
        let from = (level as usize).max(1);
        for label in labels.iter_mut().skip(from - 1) {
            *label = Some(service.to_string());
        }
    }
    labels
}

/// Applies the per-row coding rules
#[derive(Debug, Clone, Copy, Default)]
pub struct HierarchicalCoder;

impl HierarchicalCoder {
    pub fn new() -> Self {
        Self
    }

    /// Returns the task with module, block, floor, infra, service and labels set
    pub fn code(&self, mut task: Task) -> Task {
        let level = task.outline_level;
        task.module_code = module_code(task.module_field.as_deref(), task.outline_number.as_deref());
        task.block_code = block_code(&task.name, level);
        task.floor_code = floor_code(&task.name);
        task.service_name = service_name(&task.name);
        task.is_infra = infra_flag(&task.name, level);
        task.level_labels = level_labels(&task.service_name, level);
        task
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_from_field_is_preferred() {
        assert_eq!(module_code(Some("7"), Some("1.3.1")), Some("M.07".to_string()));
        assert_eq!(module_code(Some("Mod 12"), None), Some("M.12".to_string()));
    }

    #[test]
    fn module_from_outline_number() {
        assert_eq!(module_code(None, Some("1.3.1")), Some("M.03".to_string()));
        assert_eq!(module_code(Some("abc"), Some("1.2")), Some("M.02".to_string()));
        assert_eq!(module_code(None, Some("1")), None);
        assert_eq!(module_code(None, None), None);
    }

    #[test]
    fn block_only_at_level_three() {
        assert_eq!(block_code("BLOCK 3", Some(3)), Some("B.03".to_string()));
        assert_eq!(block_code("Bloco 12", Some(3)), Some("B.12".to_string()));
        assert_eq!(block_code("BLOCK 3", Some(4)), None);
        assert_eq!(block_code("Torre", Some(3)), None);
    }

    #[test]
    fn block_cleared_on_module_rows() {
        assert_eq!(block_code("MÓDULO 1 - BLOCO 2", Some(3)), None);
        assert_eq!(block_code("Module 1 block 2", Some(3)), None);
    }

    #[test]
    fn floor_codes() {
        assert_eq!(floor_code("P2 - Masonry"), Some("P.02".to_string()));
        assert_eq!(floor_code("Alvenaria p10"), Some("P.10".to_string()));
        assert_eq!(floor_code("Fundação"), None);
    }

    #[test]
    fn infra_classification() {
        assert_eq!(infra_flag("Bloco 1", Some(3)), Some(true));
        assert_eq!(infra_flag("Block 1", Some(3)), Some(true));
        assert_eq!(infra_flag("Estrutura", Some(4)), Some(false));
        assert_eq!(infra_flag("Obra", Some(1)), Some(false));
        assert_eq!(infra_flag("Alvenaria", Some(6)), None);
        assert_eq!(infra_flag("Bloco 1", None), None);
    }

    #[test]
    fn service_name_strips_location() {
        assert_eq!(service_name("P2 - Masonry"), "Masonry");
        assert_eq!(service_name("BL 3 - Fundação"), "Fundação");
        assert_eq!(service_name("Terraplenagem - MÓDULO 2"), "Terraplenagem");
        assert_eq!(service_name("Paving - Module 1"), "Paving");
        assert_eq!(service_name("  Alvenaria "), "Alvenaria");
    }

    #[test]
    fn floor_prefix_wins_over_block_prefix() {
        assert_eq!(service_name("BL1 - P2 - Reboco"), "Reboco");
    }

    #[test]
    fn location_literal_split() {
        assert_eq!(split_location_literal("P1 - Alvenaria"), "Alvenaria");
        assert_eq!(split_location_literal("BL 2 - Forro - Gesso"), "Forro - Gesso");
        assert_eq!(split_location_literal("Alvenaria - Externa"), "Alvenaria - Externa");
        assert_eq!(split_location_literal("Pavimento 1"), "Pavimento 1");
        assert_eq!(split_location_literal(""), "");
    }

    #[test]
    fn labels_cover_own_and_deeper_levels() {
        let labels = level_labels("Alvenaria", Some(5));
        assert_eq!(labels[3], None);
        assert_eq!(labels[4].as_deref(), Some("Alvenaria"));
        assert_eq!(labels[6].as_deref(), Some("Alvenaria"));
        assert!(level_labels("X", None).iter().all(Option::is_none));
        assert!(level_labels("X", Some(9)).iter().all(Option::is_none));
    }

    #[test]
    fn coder_sets_all_codes() {
        let mut task = Task::new(1, "P2 - Masonry");
        task.outline_level = Some(7);
        task.outline_number = Some("1.1.2.1.1.1.1".to_string());

        let task = HierarchicalCoder::new().code(task);
        assert_eq!(task.module_code.as_deref(), Some("M.01"));
        assert_eq!(task.floor_code.as_deref(), Some("P.02"));
        assert_eq!(task.block_code, None);
        assert_eq!(task.service_name, "Masonry");
        assert_eq!(task.is_infra, None);
        assert_eq!(task.level_label(7), Some("Masonry"));
    }
}
