//! An editing session over one REF document.
//!
//! The session owns the label registry, one [`TokenManager`] per paragraph,
//! the active paragraph index and the undo history. Every edit records an
//! undo snapshot and then mutates; edits that fail leave both the models and
//! the history untouched.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::config::{ProjectConfig, UndoScope};
use crate::document::{DocumentError, ParagraphRecord, RefDocument};
use crate::error::AnnotateError;
use crate::model::{AnnotationState, LabelRegistry};
use crate::provenance::{TIMESTAMP_FORMAT, format_timestamp_with};
use crate::span::{Block, InsertOutcome, NewBlock, TokenManager};
use crate::version::VersionControl;

#[derive(Debug, Clone)]
enum History {
    Document(VersionControl),
    Paragraph(Vec<VersionControl>),
}

#[derive(Debug, Clone)]
pub struct AnnotationSession {
    paragraphs: Vec<ParagraphRecord>,
    labels: LabelRegistry,
    managers: Vec<TokenManager>,
    active: usize,
    history: History,
    timestamp_format: String,
}

impl AnnotationSession {
    /// Open `document` with default settings.
    ///
    /// # Errors
    ///
    /// [`DocumentError::Entity`] when a persisted entity does not fit its
    /// paragraph.
    pub fn open(document: RefDocument) -> Result<Self, DocumentError> {
        Self::with_config(document, &ProjectConfig::default())
    }

    /// Open `document` using the history, export and label settings of
    /// `config`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::open`].
    pub fn with_config(
        document: RefDocument,
        config: &ProjectConfig,
    ) -> Result<Self, DocumentError> {
        let labels = document
            .label_registry()
            .with_palette(config.labels.palette.clone());
        let managers = document.build_managers(&labels)?;
        let max = config.history.max_stack_size;
        let history = match config.history.scope {
            UndoScope::Document => History::Document(VersionControl::new(max)),
            UndoScope::Paragraph => {
                History::Paragraph(managers.iter().map(|_| VersionControl::new(max)).collect())
            }
        };
        let timestamp_format = usable_timestamp_format(&config.export.timestamp_format);
        info!(
            paragraphs = managers.len(),
            labels = labels.len(),
            scope = ?config.history.scope,
            "session opened"
        );
        Ok(Self {
            paragraphs: document.annotations,
            labels,
            managers,
            active: 0,
            history,
            timestamp_format,
        })
    }

    // -- accessors ----------------------------------------------------------

    #[must_use]
    pub const fn labels(&self) -> &LabelRegistry {
        &self.labels
    }

    pub const fn labels_mut(&mut self) -> &mut LabelRegistry {
        &mut self.labels
    }

    #[must_use]
    pub fn managers(&self) -> &[TokenManager] {
        &self.managers
    }

    #[must_use]
    pub fn paragraph_count(&self) -> usize {
        self.managers.len()
    }

    #[must_use]
    pub const fn active_index(&self) -> usize {
        self.active
    }

    #[must_use]
    pub fn active_manager(&self) -> Option<&TokenManager> {
        self.managers.get(self.active)
    }

    #[must_use]
    pub fn active_text(&self) -> Option<&str> {
        self.paragraphs.get(self.active).map(|p| p.text.as_str())
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.active_history().is_some_and(VersionControl::can_undo)
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.active_history().is_some_and(VersionControl::can_redo)
    }

    // -- navigation ---------------------------------------------------------

    /// Move to the next paragraph. Returns `false` at the last one.
    pub fn next_paragraph(&mut self) -> bool {
        if self.active + 1 >= self.managers.len() {
            return false;
        }
        self.active += 1;
        true
    }

    /// Move to the previous paragraph. Returns `false` at the first one.
    pub fn previous_paragraph(&mut self) -> bool {
        if self.active == 0 {
            return false;
        }
        self.active -= 1;
        true
    }

    /// Jump to paragraph `index`. Returns `false` when it does not exist.
    pub fn go_to(&mut self, index: usize) -> bool {
        if index >= self.managers.len() {
            return false;
        }
        self.active = index;
        true
    }

    // -- edits --------------------------------------------------------------

    /// Draw a block over `[start, end)` of the active paragraph with the
    /// current label.
    ///
    /// # Errors
    ///
    /// The [`AnnotateError`] from [`TokenManager::insert_block`]; nothing is
    /// recorded in that case.
    pub fn draw(
        &mut self,
        start: usize,
        end: usize,
        state: AnnotationState,
    ) -> Result<InsertOutcome, AnnotateError> {
        let Some(current) = self.managers.get(self.active) else {
            return Err(AnnotateError::OutOfBounds {
                start,
                end,
                extent: 0,
            });
        };
        let mut edited = current.clone();
        let label = self.labels.current().cloned();
        let outcome = edited.insert_block(NewBlock::drawn(start, end, label, state))?;
        self.record_undo();
        self.managers[self.active] = edited;
        Ok(outcome)
    }

    /// Remove the block starting at `start` from the active paragraph.
    pub fn remove_block(&mut self, start: usize, reintroduce_tokens: bool) -> Option<Block> {
        if !self.has_block(start) {
            return None;
        }
        self.record_undo();
        self.managers[self.active].remove_block(start, reintroduce_tokens)
    }

    /// Record a reviewer decision on a block of the active paragraph.
    pub fn review_block(&mut self, start: usize, state: AnnotationState) -> bool {
        if !self.has_block(start) {
            return false;
        }
        self.record_undo();
        self.managers[self.active].review_block(start, state)
    }

    /// Relabel a block of the active paragraph.
    ///
    /// # Errors
    ///
    /// [`AnnotateError::UnknownLabel`] when `label` is not registered.
    pub fn relabel_block(&mut self, start: usize, label: &str) -> Result<bool, AnnotateError> {
        let label = self
            .labels
            .get_by_name(label)
            .cloned()
            .ok_or_else(|| AnnotateError::UnknownLabel(label.to_string()))?;
        if !self.has_block(start) {
            return Ok(false);
        }
        self.record_undo();
        Ok(self.managers[self.active].relabel_block(start, Some(label)))
    }

    /// Reset a block of the active paragraph to its baseline.
    pub fn restore_original(&mut self, start: usize) -> bool {
        if !self.has_block(start) {
            return false;
        }
        self.record_undo();
        self.managers[self.active].restore_original(start)
    }

    // -- history ------------------------------------------------------------

    /// # Errors
    ///
    /// [`AnnotateError::SerializationMismatch`] if the stored snapshot no
    /// longer fits the models.
    pub fn undo(&mut self) -> Result<bool, AnnotateError> {
        self.step(VersionControl::undo)
    }

    /// # Errors
    ///
    /// Same as [`Self::undo`].
    pub fn redo(&mut self) -> Result<bool, AnnotateError> {
        self.step(VersionControl::redo)
    }

    /// # Errors
    ///
    /// Same as [`Self::undo`].
    pub fn undo_all(&mut self) -> Result<bool, AnnotateError> {
        self.step(VersionControl::undo_all)
    }

    /// # Errors
    ///
    /// Same as [`Self::undo`].
    pub fn redo_all(&mut self) -> Result<bool, AnnotateError> {
        self.step(VersionControl::redo_all)
    }

    // -- export -------------------------------------------------------------

    /// Produce a REF document, appending provenance entries as `annotator`.
    ///
    /// The appended entries stay on the live blocks, so exporting twice as
    /// the same annotator adds nothing the second time.
    pub fn export(&mut self, annotator: &str, now: DateTime<Utc>) -> RefDocument {
        let timestamp = format_timestamp_with(now, &self.timestamp_format)
            .unwrap_or_else(|| now.format(TIMESTAMP_FORMAT).to_string());
        let annotations: Vec<ParagraphRecord> = self
            .paragraphs
            .iter()
            .zip(self.managers.iter_mut())
            .map(|(paragraph, manager)| ParagraphRecord {
                id: paragraph.id.clone(),
                text: paragraph.text.clone(),
                entities: manager.export_entities(annotator, &timestamp),
            })
            .collect();
        let document = RefDocument {
            classes: self.labels.all().to_vec(),
            annotations,
        };
        info!(
            annotator,
            paragraphs = document.annotations.len(),
            entities = document.entity_count(),
            "document exported"
        );
        document
    }

    // -- internals ----------------------------------------------------------

    fn has_block(&self, start: usize) -> bool {
        self.active_manager()
            .is_some_and(|manager| manager.block_at(start).is_some())
    }

    fn active_history(&self) -> Option<&VersionControl> {
        match &self.history {
            History::Document(vc) => Some(vc),
            History::Paragraph(stacks) => stacks.get(self.active),
        }
    }

    fn record_undo(&mut self) {
        match &mut self.history {
            History::Document(vc) => vc.add_undo(&self.managers, self.active),
            History::Paragraph(stacks) => {
                if let Some(vc) = stacks.get_mut(self.active) {
                    vc.add_undo(&self.managers[self.active..=self.active], 0);
                }
            }
        }
    }

    fn step<F>(&mut self, op: F) -> Result<bool, AnnotateError>
    where
        F: FnOnce(
            &mut VersionControl,
            &mut [TokenManager],
            &mut usize,
        ) -> Result<bool, AnnotateError>,
    {
        match &mut self.history {
            History::Document(vc) => op(vc, &mut self.managers, &mut self.active),
            History::Paragraph(stacks) => {
                let Some(vc) = stacks.get_mut(self.active) else {
                    return Ok(false);
                };
                let mut local = 0;
                op(vc, &mut self.managers[self.active..=self.active], &mut local)
            }
        }
    }
}

fn usable_timestamp_format(pattern: &str) -> String {
    if format_timestamp_with(Utc::now(), pattern).is_some() {
        pattern.to_string()
    } else {
        warn!(format = pattern, "unusable timestamp format; falling back to default");
        TIMESTAMP_FORMAT.to_string()
    }
}
