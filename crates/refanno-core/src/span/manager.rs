//! `TokenManager`: the span list of one paragraph and its edit operations.
//!
//! # Block insertion
//!
//! Inserting a block over `[start, end)`:
//!
//! 1. Normalise the endpoints; reject empty or out-of-bounds ranges.
//! 2. Collect every block intersecting the range ("overlapped").
//! 3. Interactive draws mark overlapped blocks `Rejected` + reviewed; manual
//!    imports leave them alone. Either way their tokens are released.
//! 4. Every token intersecting the range joins the new block; the block snaps
//!    outward to the first and last covered token.
//! 5. The overlapped blocks are put back at their original ranges, bare
//!    tokens that now sit inside any block are dropped, and the list is
//!    sorted and de-duplicated.
//! 6. The edit counter is bumped.
//!
//! All work happens on a copy of the list; nothing is committed unless the
//! insertion succeeds.

use tracing::debug;

use super::aggregate::{Aggregate, group_overlapping};
use super::block::Block;
use super::token::Token;
use super::{Span, intersects, sort_spans};
use crate::error::AnnotateError;
use crate::model::{AnnotationState, Label, LabelRegistry};
use crate::provenance::{Entity, ProvenanceLog};
use crate::tokenizer::TokenSpan;

/// A request to place a block over a character range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBlock {
    pub start: usize,
    pub end: usize,
    pub label: Option<Label>,
    pub state: AnnotationState,
    pub history: ProvenanceLog,
    /// Replaying persisted data: overlapped blocks keep their state.
    pub manual_import: bool,
    pub entity_id: Option<String>,
}

impl NewBlock {
    /// An interactive selection, subject to overlap rejection.
    #[must_use]
    pub const fn drawn(
        start: usize,
        end: usize,
        label: Option<Label>,
        state: AnnotationState,
    ) -> Self {
        Self {
            start,
            end,
            label,
            state,
            history: ProvenanceLog::new(),
            manual_import: false,
            entity_id: None,
        }
    }

    /// Replay of a persisted entity; labels are resolved by name.
    #[must_use]
    pub fn imported(entity: &Entity, labels: &LabelRegistry) -> Self {
        Self {
            start: entity.start,
            end: entity.end,
            label: labels.resolve(entity.label_name()),
            state: entity.state().clone(),
            history: entity.history().clone(),
            manual_import: true,
            entity_id: entity.id.clone(),
        }
    }

    #[must_use]
    pub fn with_history(mut self, history: ProvenanceLog) -> Self {
        self.history = history;
        self
    }
}

/// What an insertion did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertOutcome {
    pub start: usize,
    pub end: usize,
    /// Number of tokens the new block owns.
    pub token_count: usize,
    /// Ranges of overlapped blocks that were kept alongside the new one.
    pub overlapped: Vec<(usize, usize)>,
}

/// Span list of a single paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenManager {
    spans: Vec<Span>,
    source: Vec<(usize, usize)>,
    extent: usize,
    edited: u64,
}

impl TokenManager {
    /// Build a manager holding only bare tokens.
    #[must_use]
    pub fn new(tokens: &[TokenSpan]) -> Self {
        let mut spans: Vec<Span> = tokens.iter().map(|t| Span::Token(Token::from(t))).collect();
        sort_spans(&mut spans);
        spans.dedup();
        let source = spans.iter().map(|s| (s.start(), s.end())).collect();
        let extent = spans.iter().map(Span::end).max().unwrap_or(0);
        Self {
            spans,
            source,
            extent,
            edited: 0,
        }
    }

    /// Build a manager and replay persisted entities as manual imports.
    ///
    /// # Errors
    ///
    /// Returns the first [`AnnotateError`] raised by an entity whose range
    /// is invalid for this paragraph.
    pub fn with_entities(
        tokens: &[TokenSpan],
        entities: &[Entity],
        labels: &LabelRegistry,
    ) -> Result<Self, AnnotateError> {
        let mut manager = Self::new(tokens);
        for entity in entities {
            manager.insert_block(NewBlock::imported(entity, labels))?;
        }
        Ok(manager)
    }

    #[must_use]
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// Number of successful edits since construction (or the restored value).
    #[must_use]
    pub const fn edited(&self) -> u64 {
        self.edited
    }

    /// End offset of the last token; selections may not reach past it.
    #[must_use]
    pub const fn extent(&self) -> usize {
        self.extent
    }

    /// Number of tokens the paragraph was built from.
    #[must_use]
    pub fn source_len(&self) -> usize {
        self.source.len()
    }

    /// `[start, end)` of every token the paragraph was built from, in order.
    #[must_use]
    pub fn source_ranges(&self) -> &[(usize, usize)] {
        &self.source
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.spans.iter().filter_map(Span::as_block)
    }

    pub fn bare_tokens(&self) -> impl Iterator<Item = &Token> {
        self.spans.iter().filter_map(Span::as_token)
    }

    /// Every element (token or block) intersecting `[start, end)`.
    #[must_use]
    pub fn blocks_in_range(&self, start: usize, end: usize) -> Vec<&Span> {
        let (start, end) = normalise(start, end);
        self.spans
            .iter()
            .filter(|span| span.intersects(start, end))
            .collect()
    }

    /// Every block intersecting `[start, end)`, or `None` when there is none.
    #[must_use]
    pub fn overlapping(&self, start: usize, end: usize) -> Option<Vec<&Block>> {
        let (start, end) = normalise(start, end);
        let hits: Vec<&Block> = self
            .blocks()
            .filter(|block| intersects(block.start(), block.end(), start, end))
            .collect();
        if hits.is_empty() { None } else { Some(hits) }
    }

    /// The block starting at `start`, preferring a live block over a
    /// rejected one when both share the offset.
    #[must_use]
    pub fn block_at(&self, start: usize) -> Option<&Block> {
        self.block_index(start)
            .and_then(|idx| self.spans[idx].as_block())
    }

    /// Groups of mutually overlapping blocks.
    #[must_use]
    pub fn aggregates(&self) -> Vec<Aggregate<'_>> {
        let blocks: Vec<&Block> = self.blocks().collect();
        group_overlapping(&blocks)
    }

    /// Place a block over a range.
    ///
    /// # Errors
    ///
    /// - [`AnnotateError::EmptyRange`] when `start == end`.
    /// - [`AnnotateError::OutOfBounds`] when the range ends past [`Self::extent`].
    /// - [`AnnotateError::NoTokensCovered`] when the range only spans
    ///   whitespace between tokens.
    pub fn insert_block(&mut self, request: NewBlock) -> Result<InsertOutcome, AnnotateError> {
        let (start, end) = normalise(request.start, request.end);
        if start == end {
            return Err(AnnotateError::EmptyRange { start, end });
        }
        if end > self.extent {
            return Err(AnnotateError::OutOfBounds {
                start,
                end,
                extent: self.extent,
            });
        }

        let mut rest: Vec<Span> = Vec::with_capacity(self.spans.len());
        let mut overlapped: Vec<Block> = Vec::new();
        for span in &self.spans {
            match span {
                Span::Block(block) if span.intersects(start, end) => overlapped.push(block.clone()),
                other => rest.push(other.clone()),
            }
        }
        overlapped.sort_by_key(Block::start);

        for block in &mut overlapped {
            if !request.manual_import {
                block.state = AnnotationState::Rejected;
                block.reviewed = true;
            }
            rest.extend(block.tokens().iter().cloned().map(Span::Token));
        }

        let (covered, mut rest): (Vec<Span>, Vec<Span>) =
            rest.into_iter().partition(|span| span.intersects(start, end));
        let mut tokens: Vec<Token> = covered
            .into_iter()
            .filter_map(|span| match span {
                Span::Token(token) => Some(token),
                Span::Block(_) => None,
            })
            .collect();
        tokens.sort_by_key(Token::start);
        tokens.dedup_by(|a, b| a.same_range(b));

        let token_count = tokens.len();
        let mut block = Block::new(tokens, request.label, request.state, request.history)
            .ok_or(AnnotateError::NoTokensCovered { start, end })?;
        block.entity_id = request.entity_id;

        let outcome = InsertOutcome {
            start: block.start(),
            end: block.end(),
            token_count,
            overlapped: overlapped.iter().map(|b| (b.start(), b.end())).collect(),
        };

        rest.push(Span::Block(block));
        rest.extend(overlapped.into_iter().map(Span::Block));
        self.spans = normalised(rest);
        self.edited += 1;

        debug!(
            start = outcome.start,
            end = outcome.end,
            tokens = outcome.token_count,
            overlapped = outcome.overlapped.len(),
            manual_import = request.manual_import,
            "block inserted"
        );
        Ok(outcome)
    }

    /// Replay one persisted entity (manual import).
    ///
    /// # Errors
    ///
    /// Same as [`Self::insert_block`].
    pub fn import_entity(
        &mut self,
        entity: &Entity,
        labels: &LabelRegistry,
    ) -> Result<InsertOutcome, AnnotateError> {
        self.insert_block(NewBlock::imported(entity, labels))
    }

    /// Remove the block starting at `start`.
    ///
    /// With `reintroduce_tokens` its tokens go back into the list (except
    /// those still inside another block); otherwise they are discarded with
    /// it. Returns the removed block; `None` leaves the list untouched.
    pub fn remove_block(&mut self, start: usize, reintroduce_tokens: bool) -> Option<Block> {
        let idx = self.block_index(start)?;
        let Span::Block(block) = self.spans.remove(idx) else {
            return None;
        };
        if reintroduce_tokens {
            let mut spans = std::mem::take(&mut self.spans);
            spans.extend(block.tokens().iter().cloned().map(Span::Token));
            self.spans = normalised(spans);
        }
        self.edited += 1;
        debug!(start, reintroduce_tokens, "block removed");
        Some(block)
    }

    /// Reset the block at `start` to its baseline label/state/review flag.
    pub fn restore_original(&mut self, start: usize) -> bool {
        let Some(block) = self.block_at_mut(start) else {
            return false;
        };
        block.restore_baseline();
        self.edited += 1;
        debug!(start, "block restored to baseline");
        true
    }

    /// Record a reviewer decision on the block at `start`.
    pub fn review_block(&mut self, start: usize, state: AnnotationState) -> bool {
        let Some(block) = self.block_at_mut(start) else {
            return false;
        };
        debug!(start, from = %block.state, to = %state, "block reviewed");
        block.state = state;
        block.reviewed = true;
        self.edited += 1;
        true
    }

    /// Change the label of the block at `start`.
    pub fn relabel_block(&mut self, start: usize, label: Option<Label>) -> bool {
        let Some(block) = self.block_at_mut(start) else {
            return false;
        };
        block.label = label;
        block.reviewed = true;
        debug!(start, label = block.label_name(), "block relabeled");
        self.edited += 1;
        true
    }

    /// Sort and drop structurally identical entries.
    pub fn dedupe(&mut self) {
        let spans = std::mem::take(&mut self.spans);
        self.spans = normalised(spans);
    }

    /// Convert every block to an entity, appending provenance as
    /// `annotator` per the export rule. Blocks keep the appended entries.
    pub fn export_entities(&mut self, annotator: &str, timestamp: &str) -> Vec<Entity> {
        let mut entities = Vec::new();
        let mut appended = 0usize;
        for span in &mut self.spans {
            if let Span::Block(block) = span {
                let (entity, reason) = block.export_entity(annotator, timestamp);
                appended += usize::from(reason.is_some());
                entities.push(entity);
            }
        }
        debug!(annotator, entities = entities.len(), appended, "entities exported");
        entities
    }

    /// Descriptions of every way the list breaks the partition invariant.
    ///
    /// An empty result means: the list is sorted, bare tokens are disjoint
    /// and outside every block, live (non-rejected) blocks are disjoint, and
    /// every source token is either bare or owned by some block.
    #[must_use]
    pub fn partition_violations(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.spans.windows(2).any(|w| w[0].start() > w[1].start()) {
            problems.push("span list is not sorted by start".to_string());
        }

        let blocks: Vec<&Block> = self.blocks().collect();
        let bare: Vec<&Token> = self.bare_tokens().collect();

        for (i, a) in bare.iter().enumerate() {
            for b in &bare[i + 1..] {
                if intersects(a.start(), a.end(), b.start(), b.end()) {
                    problems.push(format!(
                        "bare tokens [{}, {}) and [{}, {}) overlap",
                        a.start(),
                        a.end(),
                        b.start(),
                        b.end()
                    ));
                }
            }
            if let Some(block) = blocks
                .iter()
                .find(|block| intersects(a.start(), a.end(), block.start(), block.end()))
            {
                problems.push(format!(
                    "bare token [{}, {}) lies inside block [{}, {})",
                    a.start(),
                    a.end(),
                    block.start(),
                    block.end()
                ));
            }
        }

        let live: Vec<&&Block> = blocks.iter().filter(|b| !b.state.is_rejected()).collect();
        for (i, a) in live.iter().enumerate() {
            for b in &live[i + 1..] {
                if intersects(a.start(), a.end(), b.start(), b.end()) {
                    problems.push(format!(
                        "live blocks [{}, {}) and [{}, {}) overlap",
                        a.start(),
                        a.end(),
                        b.start(),
                        b.end()
                    ));
                }
            }
        }

        for &(start, end) in &self.source {
            let owned = bare.iter().any(|t| t.start() == start && t.end() == end)
                || blocks.iter().any(|b| {
                    b.tokens()
                        .iter()
                        .any(|t| t.start() == start && t.end() == end)
                });
            if !owned {
                problems.push(format!("source token [{start}, {end}) is unaccounted for"));
            }
        }

        problems
    }

    #[must_use]
    pub fn is_partitioned(&self) -> bool {
        self.partition_violations().is_empty()
    }

    pub(crate) fn replace_state(&mut self, spans: Vec<Span>, edited: u64) {
        self.spans = spans;
        self.edited = edited;
    }

    fn block_index(&self, start: usize) -> Option<usize> {
        let mut fallback = None;
        for (idx, span) in self.spans.iter().enumerate() {
            match span {
                Span::Block(block) if block.start() == start => {
                    if !block.state.is_rejected() {
                        return Some(idx);
                    }
                    fallback.get_or_insert(idx);
                }
                _ => {}
            }
        }
        fallback
    }

    fn block_at_mut(&mut self, start: usize) -> Option<&mut Block> {
        let idx = self.block_index(start)?;
        match &mut self.spans[idx] {
            Span::Block(block) => Some(block),
            Span::Token(_) => None,
        }
    }
}

const fn normalise(a: usize, b: usize) -> (usize, usize) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Sort, drop bare tokens inside any block, and remove duplicates.
fn normalised(mut spans: Vec<Span>) -> Vec<Span> {
    let block_ranges: Vec<(usize, usize)> = spans
        .iter()
        .filter_map(Span::as_block)
        .map(|b| (b.start(), b.end()))
        .collect();
    spans.retain(|span| match span {
        Span::Token(token) => !block_ranges
            .iter()
            .any(|&(start, end)| start <= token.start() && token.end() <= end),
        Span::Block(_) => true,
    });
    sort_spans(&mut spans);
    let mut unique: Vec<Span> = Vec::with_capacity(spans.len());
    for span in spans {
        if !unique.contains(&span) {
            unique.push(span);
        }
    }
    unique
}
