//! Loosely typed spreadsheet values
//!
//! Schedule exports mix text, numbers, booleans and empty cells in the same
//! column. [`Cell`] keeps whatever the export produced and offers lenient,
//! non-failing conversions for the normalizer.

use serde::{Deserialize, Serialize};

/// A single exported cell value
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Cell {
    /// Returns true for null cells and blank text
    pub fn is_null(&self) -> bool {
        match self {
            Cell::Null => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Renders the cell as text
    ///
    /// Integral numbers are rendered without a fractional part so that a
    /// module field exported as `7.0` reads as `7`.
    pub fn text(&self) -> Option<String> {
        match self {
            Cell::Null => None,
            Cell::Bool(b) => Some(b.to_string()),
            Cell::Number(n) => Some(format_number(*n)),
            Cell::Text(s) => Some(s.clone()),
        }
    }

    /// Returns trimmed text, treating blanks and the `nan` placeholder as absent
    pub fn present_text(&self) -> Option<String> {
        let text = self.text()?;
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    /// Interprets the cell as a whole number
    pub fn integer(&self) -> Option<i64> {
        match self {
            Cell::Number(n) if n.is_finite() && n.fract() == 0.0 => Some(*n as i64),
            Cell::Text(s) => {
                let s = s.trim();
                s.parse::<i64>().ok().or_else(|| {
                    s.parse::<f64>()
                        .ok()
                        .filter(|n| n.is_finite() && n.fract() == 0.0)
                        .map(|n| n as i64)
                })
            }
            _ => None,
        }
    }

    /// Interprets the cell as a yes/no flag (`Sim`/`Não`, `yes`/`no`, `true`/`false`)
    pub fn flag(&self) -> Option<bool> {
        match self {
            Cell::Bool(b) => Some(*b),
            Cell::Number(n) if *n == 1.0 => Some(true),
            Cell::Number(n) if *n == 0.0 => Some(false),
            Cell::Text(s) => match s.trim().to_lowercase().as_str() {
                "sim" | "s" | "yes" | "y" | "true" | "1" => Some(true),
                "não" | "nao" | "n" | "no" | "false" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Number(value as f64)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Cell::Null)
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_cells_deserialize_from_json_null() {
        let cell: Cell = serde_json::from_str("null").unwrap();
        assert_eq!(cell, Cell::Null);
        assert!(cell.is_null());
    }

    #[test]
    fn mixed_values_deserialize() {
        let cells: Vec<Cell> = serde_json::from_str(r#"[1, "x", true, 2.5]"#).unwrap();
        assert_eq!(
            cells,
            vec![
                Cell::Number(1.0),
                Cell::Text("x".into()),
                Cell::Bool(true),
                Cell::Number(2.5)
            ]
        );
    }

    #[test]
    fn integral_numbers_render_without_fraction() {
        assert_eq!(Cell::Number(7.0).text(), Some("7".to_string()));
        assert_eq!(Cell::Number(7.5).text(), Some("7.5".to_string()));
    }

    #[test]
    fn present_text_drops_placeholders() {
        assert_eq!(Cell::from("  nan ").present_text(), None);
        assert_eq!(Cell::from("   ").present_text(), None);
        assert_eq!(Cell::from(" 12 ").present_text(), Some("12".to_string()));
    }

    #[test]
    fn integer_accepts_text_and_numbers() {
        assert_eq!(Cell::from("42").integer(), Some(42));
        assert_eq!(Cell::from("6.0").integer(), Some(6));
        assert_eq!(Cell::Number(3.0).integer(), Some(3));
        assert_eq!(Cell::Number(3.5).integer(), None);
        assert_eq!(Cell::from("abc").integer(), None);
    }

    #[test]
    fn flags_in_both_languages() {
        assert_eq!(Cell::from("Sim").flag(), Some(true));
        assert_eq!(Cell::from("Não").flag(), Some(false));
        assert_eq!(Cell::from("yes").flag(), Some(true));
        assert_eq!(Cell::Bool(false).flag(), Some(false));
        assert_eq!(Cell::from("maybe").flag(), None);
    }
}
