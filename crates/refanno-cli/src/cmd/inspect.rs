//! `refanno inspect`: summarise the entities of a REF document.

use crate::cmd::load_document;
use crate::output::{
    CliError, OutputMode, pretty_kv, pretty_rule, pretty_section, render_error, render_mode,
};
use clap::Args;
use refanno_core::span::TokenManager;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// REF document (`.json`) or plain text file to inspect.
    pub file: PathBuf,
}

/// Per-paragraph summary.
#[derive(Debug, Serialize)]
pub struct ParagraphSummary {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub tokens: usize,
    pub entities: usize,
    pub reviewed: usize,
    /// Entity count keyed by state name.
    pub states: BTreeMap<String, usize>,
    /// Number of overlapping block groups.
    pub overlaps: usize,
}

#[derive(Debug, Serialize)]
pub struct InspectReport {
    pub file: String,
    pub labels: Vec<String>,
    pub paragraphs: Vec<ParagraphSummary>,
    pub total_entities: usize,
}

/// Execute `refanno inspect <file>`.
///
/// # Errors
///
/// Returns an error if the file cannot be read, a persisted entity does not
/// fit its paragraph, or output rendering fails.
pub fn run_inspect(args: &InspectArgs, output: OutputMode) -> anyhow::Result<()> {
    let doc = load_document(&args.file, output)?;
    let labels = doc.label_registry();
    let managers = match doc.build_managers(&labels) {
        Ok(managers) => managers,
        Err(err) => {
            render_error(output, &CliError::from(&err))?;
            return Err(err.into());
        }
    };

    let paragraphs: Vec<ParagraphSummary> = doc
        .annotations
        .iter()
        .zip(&managers)
        .enumerate()
        .map(|(index, (record, manager))| summarise(index, record.id.clone(), manager))
        .collect();

    let report = InspectReport {
        file: args.file.display().to_string(),
        labels: labels.all().iter().map(|l| l.name.clone()).collect(),
        total_entities: paragraphs.iter().map(|p| p.entities).sum(),
        paragraphs,
    };

    render_mode(output, &report, render_text, render_pretty)
}

fn summarise(index: usize, id: Option<String>, manager: &TokenManager) -> ParagraphSummary {
    let mut states = BTreeMap::new();
    let mut entities = 0;
    let mut reviewed = 0;
    for block in manager.blocks() {
        entities += 1;
        if block.reviewed {
            reviewed += 1;
        }
        *states.entry(block.state.to_string()).or_insert(0) += 1;
    }
    ParagraphSummary {
        index,
        id,
        tokens: manager.source_len(),
        entities,
        reviewed,
        states,
        overlaps: manager.aggregates().len(),
    }
}

fn states_line(states: &BTreeMap<String, usize>) -> String {
    states
        .iter()
        .map(|(state, count)| format!("{state}={count}"))
        .collect::<Vec<_>>()
        .join(",")
}

fn render_text(report: &InspectReport, w: &mut dyn Write) -> std::io::Result<()> {
    for p in &report.paragraphs {
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}\t{}",
            p.index,
            p.tokens,
            p.entities,
            p.reviewed,
            p.overlaps,
            states_line(&p.states)
        )?;
    }
    Ok(())
}

fn render_pretty(report: &InspectReport, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, &report.file)?;
    pretty_kv(w, "Paragraphs", report.paragraphs.len().to_string())?;
    pretty_kv(w, "Entities", report.total_entities.to_string())?;
    if !report.labels.is_empty() {
        pretty_kv(w, "Labels", report.labels.join(", "))?;
    }
    for p in &report.paragraphs {
        writeln!(w)?;
        match &p.id {
            Some(id) => writeln!(w, "Paragraph {} ({id})", p.index)?,
            None => writeln!(w, "Paragraph {}", p.index)?,
        }
        pretty_rule(w)?;
        pretty_kv(w, "Tokens", p.tokens.to_string())?;
        pretty_kv(w, "Entities", p.entities.to_string())?;
        pretty_kv(w, "Reviewed", p.reviewed.to_string())?;
        pretty_kv(w, "Overlaps", p.overlaps.to_string())?;
        if !p.states.is_empty() {
            pretty_kv(w, "States", states_line(&p.states))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use refanno_core::RefDocument;

    const DOC: &str = r#"{
        "classes": [{"id": 1, "name": "PER", "color": "red-11"}],
        "annotations": [[null, "one two three four", {"entities": [
            [null, 0, 7, [["PER", "Accepted", "2024-01-01T00:00:00Z", "ana"]]],
            [null, 4, 13, [["PER", "Suggested", "2024-01-01T00:00:00Z", "bot"]]]
        ]}]]
    }"#;

    #[test]
    fn summary_counts_states_and_overlaps() {
        let doc = RefDocument::from_json(DOC).expect("parse");
        let managers = doc.build_managers(&doc.label_registry()).expect("fits");
        let summary = summarise(0, None, &managers[0]);
        assert_eq!(summary.tokens, 4);
        assert_eq!(summary.entities, 2);
        assert_eq!(summary.overlaps, 1);
        assert_eq!(states_line(&summary.states), "Accepted=1,Suggested=1");
    }
}
