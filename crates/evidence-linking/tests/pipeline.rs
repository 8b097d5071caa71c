//! End-to-end checks of the public API: section location, bibliography
//! parsing, citation linking and claim provenance, plus the JSON shapes the
//! presentation layer consumes.

use evidence_linking::{
    Bibliography, BibliographyEntry, DocumentText, EvidenceLinker, PAGE_NOT_FOUND, consolidate,
    find_provenance, link_citations, locate_references, parse_bibliography,
};

const MOCK_DOCUMENT: &str = "
Introduction
This is the main body of the paper. We cite Smith (2022) and Jones et al. [2021].
The findings are significant. Another citation is to Miller (2020).

2. Methods
More text here.

REFERENCES
[1] Smith, J. (2022). A Study of Things. Journal of Science, 1(1), 1-10.

[2] Jones, A., & Baker, C. (2021). Another Study. Research Today, 2(3), 20-30.

Miller, K. (2020). Older Research. Legacy Publishing.
    ";

#[test]
fn references_section_splits_body_and_bibliography() {
    let span = locate_references(MOCK_DOCUMENT).expect("references header");
    assert!(span.text.contains("[1] Smith, J. (2022)"));
    assert!(!span.text.contains("Introduction"));
    assert_eq!(MOCK_DOCUMENT[span.start_offset..].trim(), span.text);

    let bibliography = parse_bibliography(&span.text);
    assert_eq!(bibliography.len(), 3);
    for key in ["Smith2022", "Jones2021", "Miller2020"] {
        assert!(bibliography.contains_key(key), "missing {key}");
    }
    assert!(bibliography["Smith2022"].full_citation.starts_with("[1] Smith, J."));

    let body = &MOCK_DOCUMENT[..span.start_offset];
    let links = link_citations(body, &bibliography);
    assert_eq!(links.len(), 3);
    assert!(links["Smith2022"].contains("Smith (2022)"));
    assert!(links["Jones2021"].contains("Jones et al. [2021]"));
    assert!(links["Miller2020"].contains("Miller (2020)"));
}

#[test]
fn no_header_means_no_span() {
    for text in [
        "This document has no references section.",
        "",
        "Methods\nResults\nDiscussion\n",
        "references are listed at the end\n",
    ] {
        assert!(locate_references(text).is_none(), "unexpected span for {text:?}");
    }
}

#[test]
fn bibliography_scenario_two_entries() {
    let text = "[1] Smith, J. (2022). Title. J. Sci., 1, 1-10.\n\n[2] Jones, A. (2021). Other. J. Res., 2, 5-9.";
    let bibliography = parse_bibliography(text);
    let keys: Vec<_> = bibliography.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["Jones2021", "Smith2022"]);
}

#[test]
fn bibliography_never_keeps_short_entries() {
    let text = "tiny\n\n[3]\n\nSmith, J. (2022). Long enough citation text.\n\n  twenty-character xx  \n\nAnonymous undated grey literature report.";
    let bibliography = parse_bibliography(text);
    assert_eq!(bibliography.len(), 2);
    for entry in bibliography.values() {
        assert!(entry.full_citation.trim().chars().count() > 20);
        assert_eq!(entry.full_citation, entry.full_citation.trim());
    }
    assert!(bibliography.contains_key("ref_2"));
}

#[test]
fn citation_linking_scenario() {
    let bibliography: Bibliography = [
        ("Smith2022", "Smith, J. (2022)."),
        ("Jones2021", "Jones, A. (2021)."),
        ("Miller2020", "Miller, K. (2020)."),
    ]
    .into_iter()
    .map(|(k, c)| (k.to_string(), BibliographyEntry::new(k, c)))
    .collect();

    let links = link_citations(
        "We cite Smith (2022) and Jones et al. [2021]. Not Miller.",
        &bibliography,
    );
    let keys: Vec<_> = links.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["Jones2021", "Smith2022"]);
    assert!(links["Smith2022"].contains("Smith (2022)"));
    for (key, mentions) in &links {
        assert!(bibliography.contains_key(key));
        assert!(!mentions.is_empty());
    }
}

#[test]
fn provenance_scenarios() {
    let pages = DocumentText::from_pages([
        (0, "Alpha results were strong."),
        (1, "Beta results were weak."),
    ]);
    assert_eq!(find_provenance("Beta results were weak.", &pages), 2);
    assert_eq!(find_provenance("Delta results were absent.", &pages), PAGE_NOT_FOUND);
    assert_eq!(find_provenance("", &pages), PAGE_NOT_FOUND);
}

#[test]
fn provenance_is_in_range_or_sentinel() {
    let pages = DocumentText::from_pages([(0, "one two three"), (1, "four five"), (2, "six")]);
    for claim in ["one", "five", "six", "seven", "", "two three four"] {
        let page = find_provenance(claim, &pages);
        assert!(
            page == PAGE_NOT_FOUND || (1..=pages.len() as i32).contains(&page),
            "page {page} out of range for {claim:?}"
        );
    }
}

#[test]
fn analysis_serializes_to_expected_shapes() {
    let pages = DocumentText::from_pages([(
        0,
        "We cite Smith (2022) twice: Smith (2022).\nReferences\nSmith, J. (2022). A Study of Things.",
    )]);
    let analysis = EvidenceLinker::new().analyze(&pages);

    let value = serde_json::to_value(&analysis).unwrap();
    assert_eq!(value["references_found"], true);
    assert_eq!(
        value["bibliography"]["Smith2022"]["full_citation"],
        "Smith, J. (2022). A Study of Things."
    );
    assert_eq!(
        value["citation_links"]["Smith2022"],
        serde_json::json!(["Smith (2022)"])
    );

    let json = serde_json::to_string(&analysis).unwrap();
    let back: evidence_linking::DocumentAnalysis = serde_json::from_str(&json).unwrap();
    assert_eq!(back, analysis);
}

#[test]
fn consolidated_offsets_index_with_newlines() {
    let pages = DocumentText::from_pages([
        (0, "Body text citing (Smith, 2022).\n1"),
        (1, "Bibliography\nSmith, J. (2022). A Study of Things."),
    ]);
    let text = consolidate(&pages);
    let span = locate_references(&text.with_newlines).unwrap();
    assert_eq!(text.with_newlines[span.start_offset..].trim(), span.text);
    assert!(!text.flat.contains('\n'));
}
