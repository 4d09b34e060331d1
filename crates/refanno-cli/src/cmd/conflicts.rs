//! `refanno conflicts`: list groups of overlapping blocks.
//!
//! Loading a document never resolves overlaps, so two reviewers' competing
//! entities both survive and show up here as one group.

use crate::cmd::load_document;
use crate::output::{CliError, OutputMode, pretty_section, render_error, render_mode};
use clap::Args;
use refanno_core::span::{Aggregate, Block};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ConflictsArgs {
    /// REF document (`.json`) to scan.
    pub file: PathBuf,

    /// Only report groups that involve at least two different labels.
    #[arg(long)]
    pub mixed_labels: bool,
}

#[derive(Debug, Serialize)]
pub struct ConflictBlock {
    pub start: usize,
    pub end: usize,
    pub text: String,
    pub label: String,
    pub state: String,
    pub reviewed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotator: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Conflict {
    pub paragraph: usize,
    pub start: usize,
    pub end: usize,
    pub labels: Vec<String>,
    pub blocks: Vec<ConflictBlock>,
}

impl ConflictBlock {
    fn from_block(block: &Block) -> Self {
        Self {
            start: block.start(),
            end: block.end(),
            text: block.text(),
            label: block.label_name().to_string(),
            state: block.state.to_string(),
            reviewed: block.reviewed,
            annotator: block.history().latest().map(|e| e.annotator().to_string()),
        }
    }
}

impl Conflict {
    fn from_aggregate(paragraph: usize, group: &Aggregate<'_>) -> Self {
        Self {
            paragraph,
            start: group.start,
            end: group.end,
            labels: group.label_names().into_iter().map(str::to_string).collect(),
            blocks: group.blocks.iter().map(|b| ConflictBlock::from_block(b)).collect(),
        }
    }
}

/// Execute `refanno conflicts <file>`.
///
/// # Errors
///
/// Returns an error if the file cannot be read, a persisted entity does not
/// fit its paragraph, or output rendering fails.
pub fn run_conflicts(args: &ConflictsArgs, output: OutputMode) -> anyhow::Result<()> {
    let doc = load_document(&args.file, output)?;
    let managers = match doc.build_managers(&doc.label_registry()) {
        Ok(managers) => managers,
        Err(err) => {
            render_error(output, &CliError::from(&err))?;
            return Err(err.into());
        }
    };

    let conflicts: Vec<Conflict> = managers
        .iter()
        .enumerate()
        .flat_map(|(paragraph, manager)| {
            manager
                .aggregates()
                .iter()
                .map(|group| Conflict::from_aggregate(paragraph, group))
                .collect::<Vec<_>>()
        })
        .filter(|c| !args.mixed_labels || c.labels.len() > 1)
        .collect();

    render_mode(output, &conflicts, |c, w| render_text(c, w), |c, w| {
        render_pretty(c, w)
    })
}

fn render_text(conflicts: &[Conflict], w: &mut dyn Write) -> std::io::Result<()> {
    for c in conflicts {
        for b in &c.blocks {
            writeln!(
                w,
                "{}\t{}\t{}\t{}\t{}\t{}",
                c.paragraph, b.start, b.end, b.label, b.state, b.text
            )?;
        }
    }
    Ok(())
}

fn render_pretty(conflicts: &[Conflict], w: &mut dyn Write) -> std::io::Result<()> {
    if conflicts.is_empty() {
        return writeln!(w, "No overlapping annotations.");
    }
    for c in conflicts {
        let heading = format!(
            "Paragraph {} [{}, {}): {}",
            c.paragraph,
            c.start,
            c.end,
            c.labels.join(" / ")
        );
        pretty_section(w, &heading)?;
        for b in &c.blocks {
            let mark = if b.reviewed { "*" } else { " " };
            writeln!(
                w,
                "{mark} {:>4}..{:<4} {:<10} {:<10} {}",
                b.start, b.end, b.label, b.state, b.text
            )?;
        }
        writeln!(w)?;
    }
    Ok(())
}
