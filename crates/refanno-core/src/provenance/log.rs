//! Append-only provenance log and the export-time append rule.
//!
//! Entries are never edited or removed. The only way to grow a log from
//! outside the crate is [`ProvenanceLog::record_export`], which evaluates the
//! append rule in priority order:
//!
//! | # | Condition | Appended entry |
//! |---|---|---|
//! | 1 | reviewed, latest by someone else, same label and state | copy of latest, new annotator |
//! | 2 | state is `Candidate`/`Suggested` and the log is empty | current verdict |
//! | 3 | no latest entry, or label/state differ from it | current verdict |
//! | 4 | anything else | nothing |

use serde::{Deserialize, Serialize};

use super::entry::HistoryEntry;
use crate::model::AnnotationState;

/// Why an entry was appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendReason {
    /// A second annotator confirmed the latest verdict.
    Concurrence,
    /// First record of an unreviewed span.
    First,
    /// Label or state changed since the latest entry.
    Change,
}

/// The live label/state/review flag an export is evaluated against.
#[derive(Debug, Clone, Copy)]
pub struct Verdict<'a> {
    pub label: &'a str,
    pub state: &'a AnnotationState,
    pub reviewed: bool,
}

/// Ordered, append-only list of [`HistoryEntry`] values.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProvenanceLog {
    entries: Vec<HistoryEntry>,
}

impl ProvenanceLog {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    #[must_use]
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    #[must_use]
    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Decide whether exporting `verdict` as `annotator` appends an entry.
    #[must_use]
    pub fn decide(&self, verdict: Verdict<'_>, annotator: &str) -> Option<AppendReason> {
        let latest = self.latest();

        let concurs = latest.is_some_and(|latest| {
            verdict.reviewed
                && latest.annotator() != annotator
                && latest.same_verdict(verdict.label, verdict.state)
        });
        if concurs {
            return Some(AppendReason::Concurrence);
        }

        if verdict.state.is_unreviewed() && self.is_empty() {
            return Some(AppendReason::First);
        }

        match latest {
            Some(latest) if latest.same_verdict(verdict.label, verdict.state) => None,
            _ => Some(AppendReason::Change),
        }
    }

    /// Apply the append rule and push the resulting entry, if any.
    pub fn record_export(
        &mut self,
        verdict: Verdict<'_>,
        annotator: &str,
        timestamp: &str,
    ) -> Option<AppendReason> {
        let reason = self.decide(verdict, annotator)?;
        let entry = match (reason, self.latest()) {
            (AppendReason::Concurrence, Some(latest)) => HistoryEntry::new(
                latest.label(),
                latest.state().clone(),
                annotator,
                timestamp,
            ),
            _ => HistoryEntry::new(verdict.label, verdict.state.clone(), annotator, timestamp),
        };
        tracing::trace!(?reason, annotator, state = %entry.state(), "provenance entry appended");
        self.entries.push(entry);
        Some(reason)
    }
}

impl From<Vec<HistoryEntry>> for ProvenanceLog {
    fn from(entries: Vec<HistoryEntry>) -> Self {
        Self { entries }
    }
}
