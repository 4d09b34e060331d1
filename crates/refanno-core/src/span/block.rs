use serde::{Deserialize, Serialize};

use super::token::Token;
use crate::model::{AnnotationState, Label};
use crate::provenance::{AppendReason, Entity, ProvenanceLog, Verdict};

/// Label, state and review flag as they were when a block was created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Baseline {
    pub label: Option<Label>,
    pub state: AnnotationState,
    pub reviewed: bool,
}

/// A labeled annotation owning the tokens it covers.
///
/// `start`/`end` always equal the first token's start and the last token's
/// end; a block is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    start: usize,
    end: usize,
    tokens: Vec<Token>,
    pub label: Option<Label>,
    pub state: AnnotationState,
    pub reviewed: bool,
    history: ProvenanceLog,
    baseline: Baseline,
    /// Id of the persisted entity this block was loaded from, if any.
    pub entity_id: Option<String>,
}

impl Block {
    /// Build a block over `tokens`. Returns `None` when `tokens` is empty.
    #[must_use]
    pub fn new(
        mut tokens: Vec<Token>,
        label: Option<Label>,
        state: AnnotationState,
        history: ProvenanceLog,
    ) -> Option<Self> {
        tokens.sort_by_key(Token::start);
        let start = tokens.first()?.start();
        let end = tokens.iter().map(Token::end).max()?;
        let baseline = Baseline {
            label: label.clone(),
            state: state.clone(),
            reviewed: false,
        };
        Some(Self {
            start,
            end,
            tokens,
            label,
            state,
            reviewed: false,
            history,
            baseline,
            entity_id: None,
        })
    }

    /// Reassemble a block from stored parts without resetting its baseline.
    pub(crate) fn from_parts(parts: BlockParts) -> Option<Self> {
        let BlockParts {
            tokens,
            label,
            state,
            reviewed,
            history,
            baseline,
            entity_id,
        } = parts;
        let mut block = Self::new(tokens, label, state, history)?;
        block.reviewed = reviewed;
        block.baseline = baseline;
        block.entity_id = entity_id;
        Some(block)
    }

    #[must_use]
    pub const fn start(&self) -> usize {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> usize {
        self.end
    }

    #[must_use]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    #[must_use]
    pub const fn history(&self) -> &ProvenanceLog {
        &self.history
    }

    #[must_use]
    pub const fn baseline(&self) -> &Baseline {
        &self.baseline
    }

    /// Label name, or the empty string for unlabeled placeholder blocks.
    #[must_use]
    pub fn label_name(&self) -> &str {
        self.label.as_ref().map_or("", |label| label.name.as_str())
    }

    #[must_use]
    pub fn text(&self) -> String {
        self.tokens
            .iter()
            .map(Token::text)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// `[start, end)` fully contains `[other_start, other_end)`.
    #[must_use]
    pub const fn contains_range(&self, other_start: usize, other_end: usize) -> bool {
        self.start <= other_start && other_end <= self.end
    }

    /// Reset label, state and review flag to the baseline.
    pub fn restore_baseline(&mut self) {
        self.label = self.baseline.label.clone();
        self.state = self.baseline.state.clone();
        self.reviewed = self.baseline.reviewed;
    }

    /// Append to this block's own log per the export rule, then convert.
    pub fn export_entity(
        &mut self,
        annotator: &str,
        timestamp: &str,
    ) -> (Entity, Option<AppendReason>) {
        let label = self.label.as_ref().map_or("", |label| label.name.as_str());
        let verdict = Verdict {
            label,
            state: &self.state,
            reviewed: self.reviewed,
        };
        let reason = self.history.record_export(verdict, annotator, timestamp);
        (Entity::from_block(self), reason)
    }
}

/// Owned pieces of a block, as stored in a snapshot.
pub(crate) struct BlockParts {
    pub tokens: Vec<Token>,
    pub label: Option<Label>,
    pub state: AnnotationState,
    pub reviewed: bool,
    pub history: ProvenanceLog,
    pub baseline: Baseline,
    pub entity_id: Option<String>,
}
