use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use evidence_linking::config_file::{self, ConfigFile};
use evidence_linking::{DocumentText, EvidenceLinker};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod output;

use output::ColorMode;

/// Evidence Linker - Link citations, bibliography entries and claims to their source text
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to a TOML config file (skips the default config lookup)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Log debug detail to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Locate the references section, parse the bibliography and link in-text citations
    Analyze {
        /// Path to the page-text JSON file
        pages: PathBuf,

        /// Write the JSON result here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Find the page each claim came from
    Provenance {
        /// Path to the page-text JSON file
        pages: PathBuf,

        #[command(flatten)]
        claims: ClaimsArgs,

        /// Write the JSON result here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Score extracted claims against gold-standard claims
    Evaluate {
        /// File with one extracted claim per line
        #[arg(long)]
        extracted: PathBuf,

        /// File with one gold-standard claim per line
        #[arg(long)]
        gold: PathBuf,
    },

    /// List the section headers found in the document
    Sections {
        /// Path to the page-text JSON file
        pages: PathBuf,
    },
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct ClaimsArgs {
    /// Claim text (repeatable)
    #[arg(long = "claim")]
    claim: Vec<String>,

    /// File with one claim per line
    #[arg(long)]
    claims_file: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    let color = ColorMode(!cli.no_color && std::env::var_os("NO_COLOR").is_none());
    let linker = build_linker(cli.config.as_deref())?;

    match cli.command {
        Command::Analyze { pages, output } => analyze(&linker, &pages, output, color),
        Command::Provenance {
            pages,
            claims,
            output,
        } => provenance(&linker, &pages, claims, output, color),
        Command::Evaluate { extracted, gold } => evaluate(&linker, &extracted, &gold, color),
        Command::Sections { pages } => sections(&linker, &pages, color),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn build_linker(config_path: Option<&Path>) -> anyhow::Result<EvidenceLinker> {
    // Explicit --config wins over the CWD/platform cascade
    let file: ConfigFile = match config_path {
        Some(path) => config_file::read_config(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => config_file::load_config(),
    };
    let config = file
        .build_config()
        .context("Invalid linking configuration")?;
    Ok(EvidenceLinker::with_config(config))
}

fn read_pages(path: &Path) -> anyhow::Result<DocumentText> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let pages = DocumentText::from_json_str(&json)
        .with_context(|| format!("Failed to parse page text in {}", path.display()))?;
    if pages.is_empty() {
        tracing::warn!(path = %path.display(), "document has no pages");
    }
    Ok(pages)
}

/// One claim per non-blank line, trimmed.
fn read_lines(path: &Path) -> anyhow::Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

fn write_json<T: serde::Serialize>(value: &T, output: Option<PathBuf>) -> anyhow::Result<()> {
    let mut writer: Box<dyn Write> = if let Some(ref output_path) = output {
        Box::new(
            std::fs::File::create(output_path)
                .with_context(|| format!("Failed to create {}", output_path.display()))?,
        )
    } else {
        Box::new(std::io::stdout())
    };
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)?;
    writer.flush()?;
    if let Some(path) = output {
        tracing::info!(path = %path.display(), "wrote results");
    }
    Ok(())
}

fn analyze(
    linker: &EvidenceLinker,
    pages_path: &Path,
    output: Option<PathBuf>,
    color: ColorMode,
) -> anyhow::Result<()> {
    let pages = read_pages(pages_path)?;
    let analysis = linker.analyze(&pages);

    let mut stderr = std::io::stderr();
    output::print_analysis_summary(&mut stderr, &file_label(pages_path), &analysis, color)?;

    write_json(&analysis, output)
}

fn provenance(
    linker: &EvidenceLinker,
    pages_path: &Path,
    claims: ClaimsArgs,
    output: Option<PathBuf>,
    color: ColorMode,
) -> anyhow::Result<()> {
    let pages = read_pages(pages_path)?;
    let claims = match claims.claims_file {
        Some(path) => read_lines(&path)?,
        None => claims.claim,
    };

    let resolved = linker.resolve_claims(&claims, &pages);

    let mut stderr = std::io::stderr();
    output::print_provenance(&mut stderr, &claims, &resolved, color)?;

    let records: Vec<output::ProvenanceRecord> = claims
        .iter()
        .zip(&resolved)
        .map(|(claim, p)| output::ProvenanceRecord {
            claim,
            page_number: p.page_number,
            line_number: p.line_number,
        })
        .collect();
    write_json(&records, output)
}

fn evaluate(
    linker: &EvidenceLinker,
    extracted_path: &Path,
    gold_path: &Path,
    color: ColorMode,
) -> anyhow::Result<()> {
    let extracted = read_lines(extracted_path)?;
    let gold = read_lines(gold_path)?;
    let metrics = linker.claim_metrics(&extracted, &gold);

    let mut stderr = std::io::stderr();
    output::print_metrics(&mut stderr, &metrics, color)?;

    write_json(&metrics, None)
}

fn sections(linker: &EvidenceLinker, pages_path: &Path, color: ColorMode) -> anyhow::Result<()> {
    let pages = read_pages(pages_path)?;
    let text = linker.consolidate(&pages);
    let sections = linker.detect_sections(&text.with_newlines);

    let mut stderr = std::io::stderr();
    output::print_sections(&mut stderr, &sections, color)?;

    write_json(&sections, None)
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
