//! Citation token extraction
//!
//! Anchors cite numbered passages in external source material as `§N` or
//! `§N-M`. An anchor containing the word "inference" marks a claim as
//! inferred rather than cited.

use once_cell::sync::Lazy;
use regex::Regex;

static CITATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"§(\d+)(?:-(\d+))?").expect("citation pattern"));

static HYPOTHESIS_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bH\d+\b").expect("id pattern"));

/// One extracted `§N` / `§N-M` citation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Citation {
    /// Source section number
    pub section: u32,

    /// Passage within the section, if given
    pub passage: Option<u32>,
}

/// Extract every citation token from `text`, in order
#[must_use]
pub fn extract_citations(text: &str) -> Vec<Citation> {
    CITATION_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let section = caps.get(1)?.as_str().parse().ok()?;
            let passage = caps.get(2).and_then(|m| m.as_str().parse().ok());
            Some(Citation { section, passage })
        })
        .collect()
}

/// Whether an anchor marks an inference rather than a citation
#[must_use]
pub fn is_inference_marker(anchor: &str) -> bool {
    anchor.to_lowercase().contains("inference")
}

/// Extract hypothesis ids (`H1`, `H2`, ...) mentioned in `text`
#[must_use]
pub fn extract_hypothesis_ids(text: &str) -> Vec<String> {
    HYPOTHESIS_ID_RE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}
