//! Span model: tokens, blocks and the per-paragraph span list.
//!
//! A paragraph's span list is a sequence of [`Span`] values ordered by start
//! offset. Bare tokens stand for unannotated text; blocks own the tokens they
//! cover. Drawing a block over existing blocks rejects them rather than
//! deleting them, so a `Rejected` block may sit over tokens that the newer
//! block also covers. See [`TokenManager`] for the insertion algorithm.

use std::cmp::Ordering;

pub mod aggregate;
pub mod block;
pub mod manager;
pub mod token;

pub use aggregate::Aggregate;
pub use block::{Baseline, Block};
pub use manager::{InsertOutcome, NewBlock, TokenManager};
pub use token::Token;

/// One element of a span list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span {
    Token(Token),
    Block(Block),
}

impl Span {
    #[must_use]
    pub const fn start(&self) -> usize {
        match self {
            Self::Token(token) => token.start(),
            Self::Block(block) => block.start(),
        }
    }

    #[must_use]
    pub const fn end(&self) -> usize {
        match self {
            Self::Token(token) => token.end(),
            Self::Block(block) => block.end(),
        }
    }

    #[must_use]
    pub const fn as_block(&self) -> Option<&Block> {
        match self {
            Self::Block(block) => Some(block),
            Self::Token(_) => None,
        }
    }

    #[must_use]
    pub const fn as_token(&self) -> Option<&Token> {
        match self {
            Self::Token(token) => Some(token),
            Self::Block(_) => None,
        }
    }

    #[must_use]
    pub const fn is_block(&self) -> bool {
        matches!(self, Self::Block(_))
    }

    /// Half-open intersection with `[start, end)`.
    #[must_use]
    pub const fn intersects(&self, start: usize, end: usize) -> bool {
        intersects(self.start(), self.end(), start, end)
    }

    /// List order: start, then end, blocks before bare tokens; among blocks
    /// on the same range live before rejected, then by label and state.
    fn list_order(&self, other: &Self) -> Ordering {
        let key = |span: &Self| (span.start(), span.end(), !span.is_block());
        key(self).cmp(&key(other)).then_with(|| match (self, other) {
            (Self::Block(a), Self::Block(b)) => a
                .state
                .is_rejected()
                .cmp(&b.state.is_rejected())
                .then_with(|| a.label_name().cmp(b.label_name()))
                .then_with(|| a.state.as_str().cmp(b.state.as_str())),
            _ => Ordering::Equal,
        })
    }
}

/// `[a_start, a_end)` and `[b_start, b_end)` share at least one offset.
#[must_use]
pub const fn intersects(a_start: usize, a_end: usize, b_start: usize, b_end: usize) -> bool {
    a_start < b_end && b_start < a_end
}

pub(crate) fn sort_spans(spans: &mut [Span]) {
    spans.sort_by(Span::list_order);
}
