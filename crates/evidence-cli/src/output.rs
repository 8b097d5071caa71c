use std::io::Write;

use evidence_linking::{ClaimMetrics, ClaimProvenance, DocumentAnalysis, Section};
use owo_colors::OwoColorize;
use serde::Serialize;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// JSON record emitted per claim by the `provenance` subcommand.
#[derive(Debug, Serialize)]
pub struct ProvenanceRecord<'a> {
    pub claim: &'a str,
    pub page_number: i32,
    pub line_number: Option<usize>,
}

fn print_header(w: &mut dyn Write, title: &str, color: ColorMode) -> std::io::Result<()> {
    let sep = "=".repeat(60);
    if color.enabled() {
        writeln!(w, "{}", sep.bold())?;
        writeln!(w, "{}", title.bold())?;
        writeln!(w, "{}", sep.bold())?;
    } else {
        writeln!(w, "{}", sep)?;
        writeln!(w, "{}", title)?;
        writeln!(w, "{}", sep)?;
    }
    Ok(())
}

/// Print the bibliography and citation-link summary for one document.
pub fn print_analysis_summary(
    w: &mut dyn Write,
    doc_name: &str,
    analysis: &DocumentAnalysis,
    color: ColorMode,
) -> std::io::Result<()> {
    print_header(w, &format!("ANALYSIS: {}", doc_name), color)?;

    if !analysis.references_found {
        if color.enabled() {
            writeln!(w, "  {}", "No references section found".yellow())?;
        } else {
            writeln!(w, "  No references section found")?;
        }
        writeln!(w)?;
        return Ok(());
    }

    if let Some(offset) = analysis.references_offset {
        writeln!(w, "  References section at byte {}", offset)?;
    }
    writeln!(w, "  Bibliography entries: {}", analysis.bibliography.len())?;

    let unlinked = analysis
        .bibliography
        .keys()
        .filter(|k| !analysis.citation_links.contains_key(*k))
        .count();
    if color.enabled() {
        writeln!(
            w,
            "  {} {}",
            "Linked:".green(),
            analysis.citation_links.len()
        )?;
    } else {
        writeln!(w, "  Linked: {}", analysis.citation_links.len())?;
    }
    if unlinked > 0 {
        if color.enabled() {
            writeln!(w, "  {} {}", "Never cited:".yellow(), unlinked)?;
        } else {
            writeln!(w, "  Never cited: {}", unlinked)?;
        }
    }
    writeln!(w)?;

    for (key, mentions) in &analysis.citation_links {
        let mentions: Vec<&str> = mentions.iter().map(String::as_str).collect();
        if color.enabled() {
            writeln!(w, "  {} <- {}", key.bold(), mentions.join("; ").dimmed())?;
        } else {
            writeln!(w, "  {} <- {}", key, mentions.join("; "))?;
        }
    }
    if !analysis.citation_links.is_empty() {
        writeln!(w)?;
    }
    Ok(())
}

/// Print one line per claim with the page it was found on.
pub fn print_provenance(
    w: &mut dyn Write,
    claims: &[String],
    resolved: &[ClaimProvenance],
    color: ColorMode,
) -> std::io::Result<()> {
    let total = claims.len();
    for (i, (claim, provenance)) in claims.iter().zip(resolved).enumerate() {
        let short = truncate(claim, 50);
        if provenance.is_found() {
            let location = match provenance.line_number {
                Some(line) => format!("page {}, line {}", provenance.page_number, line),
                None => format!("page {}", provenance.page_number),
            };
            if color.enabled() {
                writeln!(w, "[{}/{}] \"{}\" -> {}", i + 1, total, short, location.green())?;
            } else {
                writeln!(w, "[{}/{}] \"{}\" -> {}", i + 1, total, short, location)?;
            }
        } else if color.enabled() {
            writeln!(w, "[{}/{}] \"{}\" -> {}", i + 1, total, short, "NOT FOUND".red())?;
        } else {
            writeln!(w, "[{}/{}] \"{}\" -> NOT FOUND", i + 1, total, short)?;
        }
    }

    let found = resolved.iter().filter(|p| p.is_found()).count();
    writeln!(w)?;
    writeln!(w, "  Located: {}/{}", found, total)?;
    Ok(())
}

/// Print precision, recall and F1 with the underlying counts.
pub fn print_metrics(
    w: &mut dyn Write,
    metrics: &ClaimMetrics,
    color: ColorMode,
) -> std::io::Result<()> {
    print_header(w, "CLAIM EVALUATION", color)?;
    writeln!(w, "  Precision: {:.3}", metrics.precision)?;
    writeln!(w, "  Recall:    {:.3}", metrics.recall)?;
    if color.enabled() {
        writeln!(w, "  {}  {:.3}", "F1 score:".bold(), metrics.f1_score)?;
    } else {
        writeln!(w, "  F1 score:  {:.3}", metrics.f1_score)?;
    }
    let counts = format!(
        "(TP {}, FP {}, FN {})",
        metrics.true_positives, metrics.false_positives, metrics.false_negatives
    );
    if color.enabled() {
        writeln!(w, "  {}", counts.dimmed())?;
    } else {
        writeln!(w, "  {}", counts)?;
    }
    writeln!(w)?;
    Ok(())
}

/// Print detected section titles with their offsets and sizes.
pub fn print_sections(
    w: &mut dyn Write,
    sections: &[Section],
    color: ColorMode,
) -> std::io::Result<()> {
    if sections.is_empty() {
        if color.enabled() {
            writeln!(w, "{}", "No section headers found".yellow())?;
        } else {
            writeln!(w, "No section headers found")?;
        }
        return Ok(());
    }
    for section in sections {
        let detail = format!(
            "(byte {}, {} chars)",
            section.start_char,
            section.text.chars().count()
        );
        if color.enabled() {
            writeln!(w, "  {} {}", section.title.bold(), detail.dimmed())?;
        } else {
            writeln!(w, "  {} {}", section.title, detail)?;
        }
    }
    writeln!(w)?;
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let head: String = s.chars().take(max).collect();
        format!("{}...", head)
    } else {
        s.to_string()
    }
}
