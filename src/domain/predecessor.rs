//! Predecessor notation
//!
//! Scheduling tools export dependencies as `;`-separated tokens of the form
//! `<index>[relation][±offset][d]`, e.g. `12;14II+2d`. The index is the 1-based
//! row of the predecessor, the relation defaults to `TI` (finish-to-start) and
//! the offset is in days.
//!
//! Reference templates write the relation and offset on their own, e.g. `TI+3d`.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Relation assumed when a token names none
pub const DEFAULT_RELATION: &str = "TI";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Predecessor token has no leading index: {0:?}")]
    MissingIndex(String),

    #[error("Predecessor index out of range: {0:?}")]
    IndexOutOfRange(String),
}

/// One parsed predecessor reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredecessorToken {
    /// 1-based row of the predecessor; 0 never resolves
    pub index: usize,
    pub relation: String,
    pub offset: i64,
}

impl Default for PredecessorToken {
    fn default() -> Self {
        Self {
            index: 0,
            relation: DEFAULT_RELATION.to_string(),
            offset: 0,
        }
    }
}

fn token_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(?P<index>\d+)(?P<relation>[A-Z]+)?(?P<offset>[+-]?\d+)?d?")
            .expect("valid predecessor token regex")
    })
}

impl PredecessorToken {
    /// Parses a single token
    pub fn parse(token: &str) -> Result<Self, TokenError> {
        let token = token.trim();
        let caps = token_pattern()
            .captures(token)
            .ok_or_else(|| TokenError::MissingIndex(token.to_string()))?;

        let index = caps["index"]
            .parse()
            .map_err(|_| TokenError::IndexOutOfRange(token.to_string()))?;
        let relation = caps
            .name("relation")
            .map(|m| m.as_str().to_uppercase())
            .unwrap_or_else(|| DEFAULT_RELATION.to_string());
        let offset = caps
            .name("offset")
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0);

        Ok(Self {
            index,
            relation,
            offset,
        })
    }
}

/// Parses a predecessor field into tokens, in field order
///
/// A blank field yields a single default token. Malformed tokens fall back to
/// the default token instead of failing the row.
pub fn parse_predecessors(field: &str) -> Vec<PredecessorToken> {
    let field = field.trim();
    if field.is_empty() || field.eq_ignore_ascii_case("nan") {
        return vec![PredecessorToken::default()];
    }

    field
        .split(';')
        .map(|token| PredecessorToken::parse(token).unwrap_or_default())
        .collect()
}

/// Splits a template relation such as `TI+3d` or `II-2` into type and offset
///
/// The `+` form is tried before the `-` form. Anything unparsable is kept as
/// the relation type with a zero offset.
pub fn parse_relation(text: &str) -> (String, i64) {
    let signed = |separator: char, sign: i64| {
        let mut parts = text.split(separator);
        let relation = parts.next()?;
        let amount = parts.next()?;
        let amount = amount.strip_suffix('d').unwrap_or(amount);
        let amount: i64 = amount.trim().parse().ok()?;
        Some((relation.to_string(), sign * amount))
    };

    signed('+', 1)
        .or_else(|| signed('-', -1))
        .unwrap_or_else(|| (text.to_string(), 0))
}
