use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::{CollisionPolicy, LinkingConfig, SegmentationStrategy};
use crate::{Bibliography, BibliographyEntry};

/// Name-like text, an optional `(`, then a 4-digit year.
///
/// The name group may not cross digits or brackets, so enumeration markers
/// such as `[1]` never become part of it.
static CITATION_KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?P<name>\p{L}[^\d()\[\]]*?)\s*\(?(?P<year>(?:19|20)\d{2})[a-z]?\b").unwrap()
});

/// Parse a references section into keyed bibliography entries.
///
/// Entries are split on blank lines, fragments of 20 chars or fewer are
/// dropped, and each entry gets a `Surname2022` key, or `ref_<n>` when no
/// author/year pattern is present. A later entry with the same key replaces
/// the earlier one.
pub fn parse_bibliography(references_text: &str) -> Bibliography {
    parse_bibliography_with_config(references_text, &LinkingConfig::default())
}

/// Config-aware version of [`parse_bibliography`].
pub(crate) fn parse_bibliography_with_config(
    references_text: &str,
    config: &LinkingConfig,
) -> Bibliography {
    let key_re = config.citation_key_re.as_ref().unwrap_or(&CITATION_KEY_RE);
    let candidates = segment_entries_with_config(references_text, config);

    let mut bibliography = Bibliography::new();
    let mut ordinal = 0usize;

    for candidate in &candidates {
        let entry = candidate.trim();
        if entry.chars().count() <= config.min_entry_chars {
            tracing::trace!(entry, "dropping short bibliography fragment");
            continue;
        }
        ordinal += 1;

        let key = derive_key_with(entry, key_re).unwrap_or_else(|| format!("ref_{}", ordinal));
        let key = match config.collision_policy {
            CollisionPolicy::Overwrite => {
                if bibliography.contains_key(&key) {
                    tracing::warn!(key = %key, "duplicate citation key, later entry replaces earlier");
                }
                key
            }
            CollisionPolicy::Suffix => disambiguate(&bibliography, key),
        };

        tracing::debug!(key = %key, ordinal, "parsed bibliography entry");
        bibliography.insert(key.clone(), BibliographyEntry::new(key, entry));
    }

    if bibliography.is_empty() {
        tracing::warn!(candidates = candidates.len(), "no bibliography entries parsed");
    } else {
        tracing::info!(entries = bibliography.len(), "parsed bibliography entries");
    }
    bibliography
}

/// Split a references section into raw candidate entries (untrimmed, unfiltered).
pub fn segment_entries(references_text: &str) -> Vec<String> {
    segment_entries_with_config(references_text, &LinkingConfig::default())
}

/// Config-aware version of [`segment_entries`].
pub(crate) fn segment_entries_with_config(
    references_text: &str,
    config: &LinkingConfig,
) -> Vec<String> {
    if config.segmentation == SegmentationStrategy::Markers {
        if let Some(entries) = try_markers(references_text) {
            return entries;
        }
    }
    split_blank_lines(references_text)
}

fn split_blank_lines(text: &str) -> Vec<String> {
    static RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").unwrap());
    RE.split(text).map(|p| p.to_string()).collect()
}

/// Split before each line-leading `[n]` or `n.` marker, keeping the marker.
fn try_markers(text: &str) -> Option<Vec<String>> {
    static RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?m)^[^\S\n]*(?:\[\d{1,4}\]|\d{1,4}\.)[^\S\n]+").unwrap());

    let starts: Vec<usize> = RE.find_iter(text).map(|m| m.start()).collect();
    if starts.len() < 3 {
        return None;
    }

    let mut entries = Vec::with_capacity(starts.len() + 1);
    entries.push(text[..starts[0]].to_string());
    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(text.len());
        entries.push(text[start..end].to_string());
    }
    Some(entries)
}

/// Derive a `Surname2022` key from an entry, if it has an author/year pattern.
///
/// The surname is the name text before its first comma with whitespace removed.
pub fn derive_citation_key(entry: &str) -> Option<String> {
    derive_key_with(entry, &CITATION_KEY_RE)
}

fn derive_key_with(entry: &str, key_re: &Regex) -> Option<String> {
    let caps = key_re.captures(entry)?;
    let name = caps.name("name")?.as_str();
    let year = caps.name("year")?.as_str();

    let before_comma = name.split(',').next().unwrap_or(name);
    let surname: String = before_comma.chars().filter(|c| !c.is_whitespace()).collect();
    let surname = surname.trim_end_matches(['.', ',', ';', ':']);
    if surname.is_empty() {
        return None;
    }
    Some(format!("{}{}", surname, year))
}

/// `Smith2022` → `Smith2022-b` → `Smith2022-c` ...
fn disambiguate(bibliography: &Bibliography, key: String) -> String {
    if !bibliography.contains_key(&key) {
        return key;
    }
    let mut n = 1usize;
    loop {
        let label = if n < 26 {
            char::from(b'a' + n as u8).to_string()
        } else {
            (n + 1).to_string()
        };
        let candidate = format!("{}-{}", key, label);
        if !bibliography.contains_key(&candidate) {
            tracing::debug!(key = %key, disambiguated = %candidate, "citation key collision");
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LinkingConfigBuilder;

    #[test]
    fn test_parse_two_entries() {
        let text = "[1] Smith, J. (2022). Title. J. Sci., 1, 1-10.\n\n[2] Jones, A. (2021). Other. J. Res., 2, 5-9.";
        let bib = parse_bibliography(text);
        assert_eq!(bib.len(), 2);
        assert!(bib.contains_key("Smith2022"));
        assert!(bib.contains_key("Jones2021"));
        assert_eq!(
            bib["Smith2022"].full_citation,
            "[1] Smith, J. (2022). Title. J. Sci., 1, 1-10."
        );
        assert_eq!(bib["Jones2021"].citation_key, "Jones2021");
    }

    #[test]
    fn test_derive_key_forms() {
        assert_eq!(derive_citation_key("Smith, J. (2022). A study."), Some("Smith2022".into()));
        assert_eq!(derive_citation_key("Smith J 2022 A study"), Some("SmithJ2022".into()));
        assert_eq!(
            derive_citation_key("van der Berg, K. (2020a). Dutch things."),
            Some("vanderBerg2020".into())
        );
        assert_eq!(
            derive_citation_key("Jones, A., & Baker, C. (2021). Another Study."),
            Some("Jones2021".into())
        );
        assert_eq!(derive_citation_key("An untitled anonymous manuscript"), None);
        assert_eq!(derive_citation_key("Smith, J. (20221)"), None);
    }

    #[test]
    fn test_short_fragments_dropped() {
        let text = "Short.\n\nexactly twenty chars\n\nSmith, J. (2022). A long enough entry.";
        let bib = parse_bibliography(text);
        assert_eq!(bib.len(), 1);
        for entry in bib.values() {
            assert!(entry.full_citation.trim().chars().count() > 20);
        }
    }

    #[test]
    fn test_fallback_keys_count_surviving_entries() {
        let text = "An anonymous report without any year.\n\nok\n\nSmith, J. (2022). Title of the work.\n\nAnother undated technical memorandum.";
        let bib = parse_bibliography(text);
        let keys: Vec<_> = bib.keys().cloned().collect();
        assert_eq!(keys, vec!["Smith2022", "ref_1", "ref_3"]);
        assert!(bib["ref_1"].full_citation.starts_with("An anonymous"));
        assert!(bib["ref_3"].full_citation.starts_with("Another undated"));
    }

    #[test]
    fn test_collision_overwrites_by_default() {
        let text = "Smith, J. (2022). First paper title.\n\nSmith, J. (2022). Second paper title.";
        let bib = parse_bibliography(text);
        assert_eq!(bib.len(), 1);
        assert!(bib["Smith2022"].full_citation.contains("Second"));
    }

    #[test]
    fn test_collision_suffix_policy() {
        let config = LinkingConfigBuilder::new()
            .collision_policy(CollisionPolicy::Suffix)
            .build()
            .unwrap();
        let text = "Smith, J. (2022). First paper title.\n\nSmith, J. (2022). Second paper title.\n\nSmith, K. (2022). Third paper title.";
        let bib = parse_bibliography_with_config(text, &config);
        assert_eq!(bib.len(), 3);
        assert!(bib["Smith2022"].full_citation.contains("First"));
        assert!(bib["Smith2022-b"].full_citation.contains("Second"));
        assert!(bib["Smith2022-c"].full_citation.contains("Third"));
        assert_eq!(bib["Smith2022-b"].citation_key, "Smith2022-b");
    }

    #[test]
    fn test_year_letter_is_not_part_of_key() {
        let text = "Smith, J. (2022a). First paper title.\n\nSmith, J. (2022b). Second paper title.";
        let bib = parse_bibliography(text);
        assert_eq!(bib.len(), 1);
        assert!(bib["Smith2022"].full_citation.contains("(2022b)"));

        let config = LinkingConfigBuilder::new()
            .collision_policy(CollisionPolicy::Suffix)
            .build()
            .unwrap();
        let bib = parse_bibliography_with_config(text, &config);
        assert!(bib["Smith2022"].full_citation.contains("(2022a)"));
        assert!(bib["Smith2022-b"].full_citation.contains("(2022b)"));
    }

    #[test]
    fn test_blank_lines_with_whitespace() {
        let text = "Smith, J. (2022). First paper title.\n   \n\n  Jones, A. (2021). Second paper title.";
        let entries = segment_entries(text);
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_marker_segmentation() {
        let config = LinkingConfigBuilder::new()
            .segmentation(SegmentationStrategy::Markers)
            .build()
            .unwrap();
        let text = "[1] Smith, J. (2022). A Study of Things.\n[2] Jones, A. (2021). Another Study.\n[3] Miller, K. (2020). Older Research.";
        let bib = parse_bibliography_with_config(text, &config);
        assert_eq!(bib.len(), 3);
        assert!(bib["Miller2020"].full_citation.starts_with("[3] Miller"));

        // Default blank-line strategy sees one entry
        let bib_default = parse_bibliography(text);
        assert_eq!(bib_default.len(), 1);
        assert!(bib_default.contains_key("Smith2022"));
    }

    #[test]
    fn test_marker_segmentation_falls_back() {
        let config = LinkingConfigBuilder::new()
            .segmentation(SegmentationStrategy::Markers)
            .build()
            .unwrap();
        let text = "[1] Smith, J. (2022). A Study of Things.\n[2] Jones, A. (2021). Another Study.\n\nMiller, K. (2020). Older Research.";
        let bib = parse_bibliography_with_config(text, &config);
        assert_eq!(bib.len(), 2);
        assert!(bib.contains_key("Smith2022"));
        assert!(bib.contains_key("Miller2020"));
    }

    #[test]
    fn test_custom_min_entry_chars() {
        let config = LinkingConfigBuilder::new().min_entry_chars(5).build().unwrap();
        let bib = parse_bibliography_with_config("Doe (2019)\n\nx", &config);
        assert_eq!(bib.len(), 1);
        assert!(bib.contains_key("Doe2019"));
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_bibliography("").is_empty());
        assert!(parse_bibliography("\n\n   \n").is_empty());
    }
}
