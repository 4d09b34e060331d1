//! `refanno export`: load a document, apply review decisions and write it
//! back with provenance entries appended.

use crate::cmd::load_document;
use crate::output::{CliError, OutputMode, pretty_kv, render_error, render_mode};
use anyhow::Context as _;
use chrono::Utc;
use clap::Args;
use refanno_core::AnnotationSession;
use refanno_core::config::EffectiveConfig;
use refanno_core::model::AnnotationState;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// REF document (`.json`) or plain text file to export.
    pub file: PathBuf,

    /// Name recorded in appended history entries.
    ///
    /// Falls back to `REFANNO_ANNOTATOR`, then `[export] default_annotator`
    /// in `.refanno/config.toml`, then `annotator` in the user config.
    #[arg(long)]
    pub annotator: Option<String>,

    /// Write the exported document here instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Review decision to apply before exporting, as `PARAGRAPH:START=STATE`.
    /// May be repeated.
    #[arg(long = "review", value_parser = parse_review)]
    pub reviews: Vec<ReviewDirective>,
}

/// One `--review` decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewDirective {
    pub paragraph: usize,
    pub start: usize,
    pub state: AnnotationState,
}

fn parse_review(raw: &str) -> Result<ReviewDirective, String> {
    let (position, state) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected PARAGRAPH:START=STATE, got '{raw}'"))?;
    let (paragraph, start) = position
        .split_once(':')
        .ok_or_else(|| format!("expected PARAGRAPH:START before '=', got '{position}'"))?;
    let paragraph = paragraph
        .trim()
        .parse()
        .map_err(|e| format!("invalid paragraph index '{paragraph}': {e}"))?;
    let start = start
        .trim()
        .parse()
        .map_err(|e| format!("invalid start offset '{start}': {e}"))?;
    let state = state.trim();
    if state.is_empty() {
        return Err("review state must not be empty".to_string());
    }
    Ok(ReviewDirective {
        paragraph,
        start,
        state: AnnotationState::from(state),
    })
}

#[derive(Debug, Serialize)]
pub struct ExportSummary {
    pub output: String,
    pub annotator: String,
    pub paragraphs: usize,
    pub entities: usize,
    pub reviews_applied: usize,
}

/// Execute `refanno export <file>`.
///
/// # Errors
///
/// Returns an error if no annotator can be resolved, the document cannot be
/// loaded, a review targets a missing paragraph, or the output cannot be
/// written.
pub fn run_export(
    args: &ExportArgs,
    config: &EffectiveConfig,
    output: OutputMode,
) -> anyhow::Result<()> {
    let Some(annotator) = config.resolve_annotator(args.annotator.as_deref()) else {
        render_error(
            output,
            &CliError::with_details(
                "no annotator name available",
                "pass --annotator NAME or set REFANNO_ANNOTATOR",
                "missing_annotator",
            ),
        )?;
        anyhow::bail!("missing annotator");
    };

    let doc = load_document(&args.file, output)?;
    let mut session = match AnnotationSession::with_config(doc, &config.project) {
        Ok(session) => session,
        Err(err) => {
            render_error(output, &CliError::from(&err))?;
            return Err(err.into());
        }
    };

    let mut applied = 0;
    for review in &args.reviews {
        if !session.go_to(review.paragraph) {
            render_error(
                output,
                &CliError::with_details(
                    format!("paragraph {} does not exist", review.paragraph),
                    format!("the document has {} paragraphs", session.paragraph_count()),
                    "paragraph_not_found",
                ),
            )?;
            anyhow::bail!("paragraph {} not found", review.paragraph);
        }
        if session.review_block(review.start, review.state.clone()) {
            applied += 1;
        } else {
            warn!(
                paragraph = review.paragraph,
                start = review.start,
                "no block starts at this offset; review skipped"
            );
        }
    }

    let exported = session.export(&annotator, Utc::now());
    let json = exported.to_json_pretty()?;

    let Some(path) = &args.output else {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        writeln!(out, "{json}")?;
        return Ok(());
    };

    std::fs::write(path, format!("{json}\n"))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), "export written");

    let summary = ExportSummary {
        output: path.display().to_string(),
        annotator,
        paragraphs: exported.annotations.len(),
        entities: exported.entity_count(),
        reviews_applied: applied,
    };
    render_mode(output, &summary, render_text, render_pretty)
}

fn render_text(summary: &ExportSummary, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(
        w,
        "{}\t{}\t{}\t{}",
        summary.output, summary.annotator, summary.paragraphs, summary.entities
    )
}

fn render_pretty(summary: &ExportSummary, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(w, "Exported {}", summary.output)?;
    pretty_kv(w, "Annotator", &summary.annotator)?;
    pretty_kv(w, "Paragraphs", summary.paragraphs.to_string())?;
    pretty_kv(w, "Entities", summary.entities.to_string())?;
    if summary.reviews_applied > 0 {
        pretty_kv(w, "Reviews", summary.reviews_applied.to_string())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn review_directive_parses() {
        let review = parse_review("2:14=Accepted").expect("valid");
        assert_eq!(
            review,
            ReviewDirective {
                paragraph: 2,
                start: 14,
                state: AnnotationState::Accepted,
            }
        );
    }

    #[test]
    fn reviewer_specific_states_pass_through() {
        let review = parse_review("0:0=Disputed").expect("valid");
        assert_eq!(review.state, AnnotationState::Reviewer("Disputed".into()));
    }

    #[test]
    fn malformed_directives_are_rejected() {
        assert!(parse_review("0:0").is_err());
        assert!(parse_review("0=Accepted").is_err());
        assert!(parse_review("x:0=Accepted").is_err());
        assert!(parse_review("0:-1=Accepted").is_err());
        assert!(parse_review("0:0= ").is_err());
    }
}
