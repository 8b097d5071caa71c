use serde::{Deserialize, Serialize};

use crate::config::{LinkingConfig, ProvenanceStrategy};
use crate::matching::partial_ratio;
use crate::normalize::normalize;
use crate::{DocumentText, PAGE_NOT_FOUND};

/// Where a claim was found. `page_number` is 1-based or [`PAGE_NOT_FOUND`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimProvenance {
    pub page_number: i32,
    /// 1-based line on that page where the claim starts, when known.
    pub line_number: Option<usize>,
}

impl ClaimProvenance {
    pub fn not_found() -> Self {
        Self {
            page_number: PAGE_NOT_FOUND,
            line_number: None,
        }
    }

    pub fn is_found(&self) -> bool {
        self.page_number != PAGE_NOT_FOUND
    }
}

/// Find the 1-based page that contains `claim_text`, or `-1`.
///
/// The first 100 chars of the claim are normalized (lowercase alphanumerics
/// only) and searched for in each normalized page, in page order; the first
/// page containing them wins.
pub fn find_provenance(claim_text: &str, pages: &DocumentText) -> i32 {
    resolve_claim(claim_text, pages).page_number
}

/// Like [`find_provenance`], also reporting the line the claim starts on.
pub fn resolve_claim(claim_text: &str, pages: &DocumentText) -> ClaimProvenance {
    resolve_claim_with_config(claim_text, pages, &LinkingConfig::default())
}

/// Config-aware version of [`resolve_claim`].
pub(crate) fn resolve_claim_with_config(
    claim_text: &str,
    pages: &DocumentText,
    config: &LinkingConfig,
) -> ClaimProvenance {
    let preview: String = claim_text.chars().take(50).collect();

    let found = match config.provenance_strategy {
        ProvenanceStrategy::NormalizedSubstring => {
            by_normalized_substring(claim_text, pages, config.snippet_chars)
        }
        ProvenanceStrategy::FuzzyPartial { threshold } => {
            by_partial_ratio(claim_text, pages, threshold)
        }
    };

    match found {
        Some(provenance) => {
            tracing::debug!(
                claim = %preview,
                page = provenance.page_number,
                "found claim provenance"
            );
            provenance
        }
        None => {
            tracing::warn!(claim = %preview, "could not find provenance for claim");
            ClaimProvenance::not_found()
        }
    }
}

fn by_normalized_substring(
    claim_text: &str,
    pages: &DocumentText,
    snippet_chars: usize,
) -> Option<ClaimProvenance> {
    let snippet: String = claim_text.chars().take(snippet_chars).collect();
    let snippet = normalize(&snippet);
    if snippet.is_empty() {
        return None;
    }

    pages.iter().find_map(|(index, text)| {
        let position = normalize(text).find(&snippet)?;
        Some(ClaimProvenance {
            page_number: page_number(index)?,
            line_number: line_at_normalized_offset(text, position),
        })
    })
}

/// Best-scoring page by partial ratio; ties go to the lowest page index.
fn by_partial_ratio(
    claim_text: &str,
    pages: &DocumentText,
    threshold: f64,
) -> Option<ClaimProvenance> {
    if claim_text.is_empty() {
        return None;
    }
    let claim = claim_text.to_lowercase();

    let mut best: Option<(usize, f64)> = None;
    for (index, text) in pages.iter() {
        if text.is_empty() || page_number(index).is_none() {
            continue;
        }
        let score = partial_ratio(&claim, &text.to_lowercase());
        if best.is_none_or(|(_, s)| score > s) {
            best = Some((index, score));
        }
    }

    match best {
        Some((index, score)) if score > threshold => Some(ClaimProvenance {
            page_number: page_number(index)?,
            line_number: None,
        }),
        Some((_, score)) => {
            tracing::debug!(best_score = score, threshold, "best page below threshold");
            None
        }
        None => None,
    }
}

/// 1-based page number, or `None` when it does not fit the `i32` result.
fn page_number(index: usize) -> Option<i32> {
    let number = index.checked_add(1).and_then(|n| i32::try_from(n).ok());
    if number.is_none() {
        tracing::debug!(page_index = index, "page index too large to report, skipping");
    }
    number
}

/// Map an offset in `normalize(text)` back to a 1-based line of `text`.
fn line_at_normalized_offset(text: &str, offset: usize) -> Option<usize> {
    let mut consumed = 0usize;
    for (i, line) in text.lines().enumerate() {
        consumed += normalize(line).len();
        if consumed > offset {
            return Some(i + 1);
        }
    }
    None
}
