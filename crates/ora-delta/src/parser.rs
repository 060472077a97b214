//! Delta parsing: fenced text → validated deltas
//!
//! [`parse`] never fails as a whole: every fenced block surfaces either as
//! a [`Delta`] or as an [`InvalidDelta`] carrying the raw text and a
//! reason. Malformed siblings do not abort each other.

use crate::delta::{validate_shape, Delta, InvalidDelta, RawDelta};
use crate::fence::extract_blocks;
use crate::repair::repair_json;
use serde_json::Value;

/// One parsed fenced region: valid or rejected
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedDelta {
    /// Parsed and shape-validated
    Valid(Delta),

    /// Rejected, with the raw body retained
    Invalid(InvalidDelta),
}

impl ParsedDelta {
    /// The delta, if valid
    #[inline]
    #[must_use]
    pub fn as_valid(&self) -> Option<&Delta> {
        match self {
            ParsedDelta::Valid(delta) => Some(delta),
            ParsedDelta::Invalid(_) => None,
        }
    }
}

/// Result of scanning one block of free text
#[derive(Debug, Clone, PartialEq)]
pub struct ParseReport {
    /// Per-block results, in document order
    pub deltas: Vec<ParsedDelta>,

    /// Number of fenced regions found
    pub total_blocks: usize,

    /// How many parsed and validated
    pub valid_count: usize,

    /// How many were rejected
    pub invalid_count: usize,
}

impl ParseReport {
    /// Iterate over the valid deltas in document order
    pub fn valid_deltas(&self) -> impl Iterator<Item = &Delta> {
        self.deltas.iter().filter_map(ParsedDelta::as_valid)
    }
}

fn parse_block(body: &str) -> Result<Delta, String> {
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(first_err) => serde_json::from_str(&repair_json(body))
            .map_err(|_| format!("not parseable as JSON: {first_err}"))?,
    };

    if !value.is_object() {
        return Err("delta block is not a JSON object".to_string());
    }

    let raw: RawDelta =
        serde_json::from_value(value).map_err(|e| format!("malformed delta record: {e}"))?;

    validate_shape(raw).map_err(|e| e.to_string())
}

/// Extract and validate every delta block in `text`
#[must_use]
pub fn parse(text: &str) -> ParseReport {
    let blocks = extract_blocks(text);
    let total_blocks = blocks.len();

    let deltas: Vec<ParsedDelta> = blocks
        .into_iter()
        .map(|block| match parse_block(&block.body) {
            Ok(delta) => ParsedDelta::Valid(delta),
            Err(reason) => ParsedDelta::Invalid(InvalidDelta {
                raw: block.body,
                reason,
            }),
        })
        .collect();

    let valid_count = deltas
        .iter()
        .filter(|d| matches!(d, ParsedDelta::Valid(_)))
        .count();

    ParseReport {
        valid_count,
        invalid_count: total_blocks - valid_count,
        total_blocks,
        deltas,
    }
}
