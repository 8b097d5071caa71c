use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::LinkingConfig;
use crate::matching::partial_ratio;
use crate::{Bibliography, CitationLinks};

/// A narrative citation (optional author prefix such as `Smith`, `Jones et al.`
/// or `Lee and Park`, then a year-led parenthetical or a bracketed numeric
/// list), or a parenthetical with a year anywhere inside (`(Smith, 2022)`),
/// which never takes a prefix.
static MENTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:(?P<prefix>\p{Lu}[\p{L}'’\-]+(?:\s+et\s+al\.?|\s+(?:and|&)\s+\p{Lu}[\p{L}'’\-]+)?\s*)?(?:\(\s*(?:19|20)\d{2}[a-z]?\b[^()]*\)|\[\s*\d+(?:\s*[,\-–]\s*\d+)*\s*\]))|\([^()]*?\b(?:19|20)\d{2}[a-z]?\b[^()]*\)",
    )
    .unwrap()
});

/// Capitalized words that open sentences or clauses and are never authors.
const FUNCTION_WORDS: &[&str] = &[
    "additionally",
    "also",
    "and",
    "as",
    "but",
    "conversely",
    "finally",
    "furthermore",
    "hence",
    "however",
    "in",
    "indeed",
    "moreover",
    "notably",
    "previously",
    "recently",
    "see",
    "similarly",
    "thus",
    "therefore",
];

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(?:19|20)\d{2}").unwrap());

static ENUMERATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:\[\d{1,4}\]|\d{1,4}\.)\s*").unwrap());

/// Link in-text citation mentions in `body_text` to bibliography keys.
///
/// A mention is linked to an entry when the entry's author token (text before
/// the first comma, lowercased) partially matches the mention above the
/// threshold. Independently, a mention carrying a year is linked to every
/// entry with that year whose author token has a single word matching the
/// mention. Keys without any mention are left out.
pub fn link_citations(body_text: &str, bibliography: &Bibliography) -> CitationLinks {
    link_citations_with_config(body_text, bibliography, &LinkingConfig::default())
}

/// Config-aware version of [`link_citations`].
pub(crate) fn link_citations_with_config(
    body_text: &str,
    bibliography: &Bibliography,
    config: &LinkingConfig,
) -> CitationLinks {
    let mentions = find_mentions_with_config(body_text, config);
    let mut links = CitationLinks::new();

    if mentions.is_empty() || bibliography.is_empty() {
        tracing::warn!(
            mentions = mentions.len(),
            entries = bibliography.len(),
            "nothing to link"
        );
        return links;
    }

    let threshold = config.link_threshold;
    let prepared: Vec<(&str, String)> = mentions
        .iter()
        .map(|m| (m.as_str(), comparison_text(m)))
        .collect();

    for (key, entry) in bibliography {
        let token = author_token(&entry.full_citation);
        if token.is_empty() {
            continue;
        }

        // Whole author token against each mention
        for (mention, text) in &prepared {
            let score = partial_ratio(&token, text);
            if score > threshold {
                tracing::trace!(key = %key, mention, score, "linked by author");
                links
                    .entry(key.clone())
                    .or_default()
                    .insert(mention.to_string());
            }
        }

        // Year corroboration: any single author word, entries sharing the year
        for (mention, text) in &prepared {
            let shares_year = YEAR_RE
                .find_iter(mention)
                .any(|y| entry.full_citation.contains(y.as_str()));
            if !shares_year {
                continue;
            }
            if token
                .split_whitespace()
                .any(|word| partial_ratio(word, text) > threshold)
            {
                tracing::trace!(key = %key, mention, "linked by year and author word");
                links
                    .entry(key.clone())
                    .or_default()
                    .insert(mention.to_string());
            }
        }
    }

    if links.is_empty() {
        tracing::warn!(
            mentions = mentions.len(),
            "no in-text citations could be linked"
        );
    } else {
        tracing::info!(
            linked = links.len(),
            mentions = mentions.len(),
            "linked in-text citations"
        );
    }
    links
}

/// Distinct citation mentions found in `body_text`.
pub fn find_mentions(body_text: &str) -> BTreeSet<String> {
    find_mentions_with_config(body_text, &LinkingConfig::default())
}

pub(crate) fn find_mentions_with_config(body_text: &str, config: &LinkingConfig) -> BTreeSet<String> {
    let re = config.mention_re.as_ref().unwrap_or(&MENTION_RE);
    re.captures_iter(body_text).filter_map(|caps| mention_text(&caps)).collect()
}

/// The matched mention, minus a `prefix` group that is a function word.
fn mention_text(caps: &regex::Captures) -> Option<String> {
    let whole = caps.get(0)?;
    match caps.name("prefix") {
        Some(prefix) if is_function_word(prefix.as_str()) => {
            let cite = &whole.as_str()[prefix.end() - whole.start()..];
            Some(cite.to_string())
        }
        _ => Some(whole.as_str().to_string()),
    }
}

fn is_function_word(prefix: &str) -> bool {
    prefix
        .split_whitespace()
        .next()
        .is_some_and(|w| FUNCTION_WORDS.contains(&w.to_lowercase().as_str()))
}

/// Lowercased text before the first comma, minus any leading `[n]` / `n.` marker.
pub fn author_token(full_citation: &str) -> String {
    let citation = ENUMERATION_RE.replace(full_citation, "");
    citation
        .split(',')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase()
}

fn comparison_text(mention: &str) -> String {
    mention
        .chars()
        .filter(|c| !matches!(c, '(' | ')' | '[' | ']'))
        .collect::<String>()
        .to_lowercase()
}
