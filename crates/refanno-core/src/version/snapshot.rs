//! Deep, serializable copies of span lists.
//!
//! Every span variant implements [`Freeze`]: `freeze` produces an owned
//! record sharing nothing with the live value, and `thaw` rebuilds a live
//! value from it after checking its shape. A [`Snapshot`] freezes a whole
//! set of paragraph models plus the active paragraph index.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::AnnotateError;
use crate::model::{AnnotationState, Label};
use crate::provenance::ProvenanceLog;
use crate::span::block::BlockParts;
use crate::span::{Baseline, Block, Span, Token, TokenManager};

/// Conversion to and from an independent, serializable copy.
pub trait Freeze: Sized {
    type Frozen: Clone + Serialize + DeserializeOwned;

    fn freeze(&self) -> Self::Frozen;

    /// Rebuild a live value.
    ///
    /// # Errors
    ///
    /// Returns [`AnnotateError::SerializationMismatch`] when the frozen
    /// record does not describe a valid value.
    fn thaw(frozen: &Self::Frozen) -> Result<Self, AnnotateError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrozenToken {
    pub start: usize,
    pub end: usize,
    pub text: String,
    pub state: AnnotationState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrozenBlock {
    pub tokens: Vec<FrozenToken>,
    pub label: Option<Label>,
    pub state: AnnotationState,
    pub reviewed: bool,
    pub history: ProvenanceLog,
    pub baseline: Baseline,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FrozenSpan {
    Token(FrozenToken),
    Block(FrozenBlock),
}

impl Freeze for Token {
    type Frozen = FrozenToken;

    fn freeze(&self) -> FrozenToken {
        FrozenToken {
            start: self.start(),
            end: self.end(),
            text: self.text().to_string(),
            state: self.state().clone(),
        }
    }

    fn thaw(frozen: &FrozenToken) -> Result<Self, AnnotateError> {
        if frozen.start >= frozen.end {
            return Err(AnnotateError::SerializationMismatch(format!(
                "token range [{}, {}) is empty",
                frozen.start, frozen.end
            )));
        }
        Ok(Self::with_state(
            frozen.start,
            frozen.end,
            frozen.text.clone(),
            frozen.state.clone(),
        ))
    }
}

impl Freeze for Block {
    type Frozen = FrozenBlock;

    fn freeze(&self) -> FrozenBlock {
        FrozenBlock {
            tokens: self.tokens().iter().map(Freeze::freeze).collect(),
            label: self.label.clone(),
            state: self.state.clone(),
            reviewed: self.reviewed,
            history: self.history().clone(),
            baseline: self.baseline().clone(),
            entity_id: self.entity_id.clone(),
        }
    }

    fn thaw(frozen: &FrozenBlock) -> Result<Self, AnnotateError> {
        let tokens = frozen
            .tokens
            .iter()
            .map(Token::thaw)
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_parts(BlockParts {
            tokens,
            label: frozen.label.clone(),
            state: frozen.state.clone(),
            reviewed: frozen.reviewed,
            history: frozen.history.clone(),
            baseline: frozen.baseline.clone(),
            entity_id: frozen.entity_id.clone(),
        })
        .ok_or_else(|| AnnotateError::SerializationMismatch("block has no tokens".to_string()))
    }
}

impl Freeze for Span {
    type Frozen = FrozenSpan;

    fn freeze(&self) -> FrozenSpan {
        match self {
            Self::Token(token) => FrozenSpan::Token(token.freeze()),
            Self::Block(block) => FrozenSpan::Block(block.freeze()),
        }
    }

    fn thaw(frozen: &FrozenSpan) -> Result<Self, AnnotateError> {
        Ok(match frozen {
            FrozenSpan::Token(token) => Self::Token(Token::thaw(token)?),
            FrozenSpan::Block(block) => Self::Block(Block::thaw(block)?),
        })
    }
}

/// One paragraph model, frozen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerSnapshot {
    pub extent: usize,
    /// Token ranges the paragraph was built from; restore requires an exact
    /// match.
    pub source: Vec<(usize, usize)>,
    pub edited: u64,
    pub spans: Vec<FrozenSpan>,
}

impl ManagerSnapshot {
    #[must_use]
    pub fn capture(manager: &TokenManager) -> Self {
        Self {
            extent: manager.extent(),
            source: manager.source_ranges().to_vec(),
            edited: manager.edited(),
            spans: manager.spans().iter().map(Freeze::freeze).collect(),
        }
    }

    fn matches(&self, manager: &TokenManager) -> bool {
        self.extent == manager.extent() && self.source == manager.source_ranges()
    }

    fn thaw_spans(&self) -> Result<Vec<Span>, AnnotateError> {
        self.spans.iter().map(Span::thaw).collect()
    }
}

/// Every paragraph model plus the active paragraph index at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub active: usize,
    pub managers: Vec<ManagerSnapshot>,
}

impl Snapshot {
    #[must_use]
    pub fn capture(models: &[TokenManager], active: usize) -> Self {
        Self {
            active,
            managers: models.iter().map(ManagerSnapshot::capture).collect(),
        }
    }

    /// Check that this snapshot was taken from models shaped like `models`.
    ///
    /// # Errors
    ///
    /// [`AnnotateError::SerializationMismatch`] on a paragraph count or
    /// paragraph shape difference.
    pub fn check(&self, models: &[TokenManager]) -> Result<(), AnnotateError> {
        if self.managers.len() != models.len() {
            return Err(AnnotateError::SerializationMismatch(format!(
                "snapshot holds {} paragraphs, {} are loaded",
                self.managers.len(),
                models.len()
            )));
        }
        if let Some(idx) = self
            .managers
            .iter()
            .zip(models)
            .position(|(frozen, live)| !frozen.matches(live))
        {
            return Err(AnnotateError::SerializationMismatch(format!(
                "paragraph {idx} has a different token layout"
            )));
        }
        Ok(())
    }

    /// Thaw every paragraph without touching the live models.
    pub(crate) fn prepare(
        &self,
        models: &[TokenManager],
    ) -> Result<PreparedRestore, AnnotateError> {
        self.check(models)?;
        let spans = self
            .managers
            .iter()
            .map(|frozen| Ok((frozen.thaw_spans()?, frozen.edited)))
            .collect::<Result<Vec<_>, AnnotateError>>()?;
        Ok(PreparedRestore {
            active: self.active,
            spans,
        })
    }

    /// Replace the live models with this snapshot.
    ///
    /// # Errors
    ///
    /// [`AnnotateError::SerializationMismatch`] when the snapshot does not
    /// fit `models`; nothing is modified in that case.
    pub fn restore(
        &self,
        models: &mut [TokenManager],
        active: &mut usize,
    ) -> Result<(), AnnotateError> {
        self.prepare(models)?.apply(models, active);
        Ok(())
    }
}

/// A fully thawed snapshot whose application cannot fail.
pub(crate) struct PreparedRestore {
    active: usize,
    spans: Vec<(Vec<Span>, u64)>,
}

impl PreparedRestore {
    pub(crate) fn apply(self, models: &mut [TokenManager], active: &mut usize) {
        for (model, (spans, edited)) in models.iter_mut().zip(self.spans) {
            model.replace_state(spans, edited);
        }
        *active = self.active;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::NewBlock;
    use crate::tokenizer::span_tokenize;

    fn model() -> TokenManager {
        let mut tm = TokenManager::new(&span_tokenize("one two three four"));
        tm.insert_block(NewBlock::drawn(
            0,
            7,
            Some(Label::new(1, "L1", "red-11")),
            AnnotationState::Candidate,
        ))
        .expect("insert");
        tm
    }

    #[test]
    fn span_freeze_thaw_is_identity() {
        let tm = model();
        for span in tm.spans() {
            assert_eq!(&Span::thaw(&span.freeze()).expect("thaw"), span);
        }
    }

    #[test]
    fn thaw_rejects_malformed_records() {
        let empty_block = FrozenBlock {
            tokens: Vec::new(),
            label: None,
            state: AnnotationState::Candidate,
            reviewed: false,
            history: ProvenanceLog::new(),
            baseline: Baseline {
                label: None,
                state: AnnotationState::Candidate,
                reviewed: false,
            },
            entity_id: None,
        };
        assert!(matches!(
            Block::thaw(&empty_block),
            Err(AnnotateError::SerializationMismatch(_))
        ));

        let inverted = FrozenToken {
            start: 5,
            end: 2,
            text: "x".into(),
            state: AnnotationState::Candidate,
        };
        assert!(Token::thaw(&inverted).is_err());
    }

    #[test]
    fn snapshot_is_isolated_from_later_edits() {
        let mut models = vec![model()];
        let snap = Snapshot::capture(&models, 0);
        models[0]
            .insert_block(NewBlock::drawn(8, 18, None, AnnotationState::Candidate))
            .expect("second");
        assert_eq!(snap.managers[0].edited, 1);
        assert_eq!(snap.managers[0].spans.len(), 3);

        let mut active = 0;
        snap.restore(&mut models, &mut active).expect("restore");
        assert_eq!(models[0], model());
    }

    #[test]
    fn mismatched_shape_is_refused_untouched() {
        let snap = Snapshot::capture(&[model()], 0);
        let mut other = vec![TokenManager::new(&span_tokenize("a b"))];
        let before = other.clone();
        let mut active = 3;
        assert!(matches!(
            snap.restore(&mut other, &mut active),
            Err(AnnotateError::SerializationMismatch(_))
        ));
        assert_eq!(other, before);
        assert_eq!(active, 3);

        let mut two = vec![model(), model()];
        assert!(snap.restore(&mut two, &mut active).is_err());
    }

    #[test]
    fn same_size_paragraph_with_other_tokens_is_refused() {
        // Same extent and token count as "one two three four", different
        // token boundaries.
        let snap = Snapshot::capture(&[model()], 0);
        let mut other = vec![TokenManager::new(&span_tokenize("onetwo th ree four"))];
        assert_eq!(other[0].extent(), model().extent());
        assert_eq!(other[0].source_len(), model().source_len());

        let before = other.clone();
        let mut active = 0;
        assert!(matches!(
            snap.restore(&mut other, &mut active),
            Err(AnnotateError::SerializationMismatch(_))
        ));
        assert_eq!(other, before);
    }

    #[test]
    fn frozen_span_json_is_tagged() {
        let frozen = Snapshot::capture(&[model()], 0);
        let json = serde_json::to_value(&frozen).expect("serialize");
        assert_eq!(json["managers"][0]["spans"][0]["kind"], "block");
        assert_eq!(json["managers"][0]["spans"][1]["kind"], "token");
        let back: Snapshot = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, frozen);
    }
}
