//! `Entity`: the serializable form of a block.
//!
//! An entity is produced from a live block on export and consumed on load.
//! Loaded entities take their label, state and last annotator from the final
//! history entry; exported entities take them from the block, so edits made
//! since the last export are what the append rule compares against.

use serde::{Deserialize, Serialize};

use super::entry::HistoryEntry;
use super::log::{AppendReason, ProvenanceLog, Verdict};
use crate::model::AnnotationState;
use crate::span::Block;

/// A persisted annotation: range plus provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub id: Option<String>,
    pub start: usize,
    pub end: usize,
    history: ProvenanceLog,
    label_name: String,
    state: AnnotationState,
    annotator: String,
    reviewed: bool,
}

impl Entity {
    /// Build from persisted parts, seeding label/state/annotator from the
    /// last history entry (`Candidate` and empty otherwise).
    #[must_use]
    pub fn from_history(
        id: Option<String>,
        start: usize,
        end: usize,
        history: ProvenanceLog,
    ) -> Self {
        let (label_name, state, annotator) = history.latest().map_or_else(
            || (String::new(), AnnotationState::Candidate, String::new()),
            |latest| {
                (
                    latest.label().to_string(),
                    latest.state().clone(),
                    latest.annotator().to_string(),
                )
            },
        );
        Self {
            id,
            start,
            end,
            history,
            label_name,
            state,
            annotator,
            reviewed: false,
        }
    }

    /// Snapshot a live block as an entity.
    #[must_use]
    pub fn from_block(block: &Block) -> Self {
        Self {
            id: block.entity_id.clone(),
            start: block.start(),
            end: block.end(),
            history: block.history().clone(),
            label_name: block.label_name().to_string(),
            state: block.state.clone(),
            annotator: block
                .history()
                .latest()
                .map(|entry| entry.annotator().to_string())
                .unwrap_or_default(),
            reviewed: block.reviewed,
        }
    }

    /// Override the seeded label/state/review flag (e.g. a reviewer decision
    /// applied to a loaded entity before re-export).
    #[must_use]
    pub fn with_verdict(mut self, label: &str, state: AnnotationState, reviewed: bool) -> Self {
        self.label_name = label.to_string();
        self.state = state;
        self.reviewed = reviewed;
        self
    }

    #[must_use]
    pub const fn history(&self) -> &ProvenanceLog {
        &self.history
    }

    #[must_use]
    pub fn label_name(&self) -> &str {
        &self.label_name
    }

    #[must_use]
    pub const fn state(&self) -> &AnnotationState {
        &self.state
    }

    /// Name of the last annotator to touch this entity.
    #[must_use]
    pub fn annotator(&self) -> &str {
        &self.annotator
    }

    #[must_use]
    pub const fn reviewed(&self) -> bool {
        self.reviewed
    }

    #[must_use]
    pub fn latest_entry(&self) -> Option<&HistoryEntry> {
        self.history.latest()
    }

    /// Apply the export append rule on behalf of `annotator`.
    pub fn record_export(&mut self, annotator: &str, timestamp: &str) -> Option<AppendReason> {
        let verdict = Verdict {
            label: &self.label_name,
            state: &self.state,
            reviewed: self.reviewed,
        };
        let reason = self.history.record_export(verdict, annotator, timestamp);
        if reason.is_some() {
            self.annotator = annotator.to_string();
        }
        reason
    }
}

#[derive(Serialize, Deserialize)]
struct WireEntity(Option<String>, usize, usize, ProvenanceLog);

impl Serialize for Entity {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        WireEntity(self.id.clone(), self.start, self.end, self.history.clone())
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Entity {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let WireEntity(id, start, end, history) = WireEntity::deserialize(deserializer)?;
        Ok(Self::from_history(id, start, end, history))
    }
}
