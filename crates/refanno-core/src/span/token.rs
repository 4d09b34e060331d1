use serde::{Deserialize, Serialize};

use crate::model::AnnotationState;
use crate::tokenizer::TokenSpan;

/// Atomic, unlabeled character span `[start, end)` of a paragraph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    start: usize,
    end: usize,
    text: String,
    state: AnnotationState,
}

impl Token {
    #[must_use]
    pub fn new(start: usize, end: usize, text: impl Into<String>) -> Self {
        Self::with_state(start, end, text, AnnotationState::Candidate)
    }

    #[must_use]
    pub fn with_state(
        start: usize,
        end: usize,
        text: impl Into<String>,
        state: AnnotationState,
    ) -> Self {
        Self {
            start,
            end,
            text: text.into(),
            state,
        }
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
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub const fn state(&self) -> &AnnotationState {
        &self.state
    }

    #[must_use]
    pub const fn same_range(&self, other: &Self) -> bool {
        self.start == other.start && self.end == other.end
    }
}

impl From<&TokenSpan> for Token {
    fn from(span: &TokenSpan) -> Self {
        Self::new(span.start, span.end, span.text.clone())
    }
}
